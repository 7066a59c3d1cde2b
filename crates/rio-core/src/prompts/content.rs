//! Practice questions, subject briefings, study schedules and the weekly diplomatic dossier.

/// System instruction for question generation. Answer is a JSON object.
pub const QUESTION_SYSTEM: &str = r#"Você é um elaborador de provas do CACD. NÃO USE markdown. Use APENAS texto simples e parágrafos claros.
Responda SOMENTE com um objeto JSON com os campos: topic (texto), command (texto), lines (número), subject (texto)."#;

pub const QUESTION_USER_TEMPLATE: &str = "Gere uma questão inédita padrão CACD (discursiva) sobre: {subject}. Use comandos complexos que exijam análise histórica ou política profunda.";

pub fn question_user_prompt(subject: &str) -> String {
    QUESTION_USER_TEMPLATE.replace("{subject}", subject)
}

pub const EXPLAIN_SYSTEM: &str = "Você é um mentor experiente do CACD. NÃO USE markdown. Use hifens para listas e texto simples.";

pub const EXPLAIN_USER_TEMPLATE: &str = "Explique de forma estratégica para o CACD o assunto: {subject} - {subtopic}. Foque em conceitos-chave e autores.";

pub fn explain_user_prompt(subject: &str, subtopic: &str) -> String {
    EXPLAIN_USER_TEMPLATE
        .replace("{subject}", subject)
        .replace("{subtopic}", subtopic)
}

pub const SCHEDULE_SYSTEM: &str = "Estrategista de estudos CACD. SEM MARKDOWN. Use MAIÚSCULAS para títulos.";

pub const SCHEDULE_USER_TEMPLATE: &str = "Crie um cronograma de estudos estratégico para o CACD. Dias restantes: {days}. Contexto: {context}.";

pub fn schedule_user_prompt(days_remaining: u32, context: &str) -> String {
    SCHEDULE_USER_TEMPLATE
        .replace("{days}", &days_remaining.to_string())
        .replace("{context}", context)
}

/// System instruction for the dossier. Sources are optional; highlights without a URL
/// inherit the source at the same position.
pub const DOSSIER_SYSTEM: &str = r#"Analista do MRE. SEM MARKDOWN.
Responda SOMENTE com um objeto JSON com os campos:
current (texto), previous (texto), highlights (lista de objetos {text, url}),
sources (lista opcional de objetos {title, uri})."#;

/// Placeholder is the date in `dd/mm/yyyy`.
pub const DOSSIER_USER_TEMPLATE: &str = "Compilado Diplomático Brasileiro. DATA: {date}. Pesquise fatos relevantes para o CACD.";

pub fn dossier_user_prompt(date: &str) -> String {
    DOSSIER_USER_TEMPLATE.replace("{date}", date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_filled() {
        let prompt = schedule_user_prompt(120, "3 de 22 tópicos lidos.");
        assert!(prompt.contains("Dias restantes: 120."));
        assert!(!prompt.contains('{'));
        assert!(explain_user_prompt("Economia", "Keynes").contains("Economia - Keynes"));
    }
}
