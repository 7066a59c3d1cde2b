//! Static exam syllabus (edital) and the subject list.

use crate::shared::{Incidence, SyllabusItem, UserState};

const fn item(
    id: &'static str,
    subject: &'static str,
    topic: &'static str,
    subtopic: &'static str,
    description: &'static str,
    incidence: Incidence,
) -> SyllabusItem {
    SyllabusItem {
        id,
        subject,
        topic,
        subtopic,
        description,
        incidence,
    }
}

pub const SUBJECTS: [&str; 10] = [
    "História do Brasil",
    "História Mundial",
    "Política Internacional",
    "Geografia",
    "Economia",
    "Direito Internacional Público",
    "Direito Interno",
    "Língua Portuguesa",
    "Língua Inglesa",
    "Língua Francesa",
];

pub const SYLLABUS: [SyllabusItem; 22] = [
    item("hb-1", "História do Brasil", "Império", "Política externa do Segundo Reinado",
        "Questão platina, Guerra do Paraguai e relações com a Grã-Bretanha.", Incidence::Alta),
    item("hb-2", "História do Brasil", "República", "Era Rio Branco",
        "Consolidação das fronteiras e aproximação com os Estados Unidos.", Incidence::Alta),
    item("hb-3", "História do Brasil", "República", "Política Externa Independente",
        "Jânio Quadros, San Tiago Dantas e o universalismo.", Incidence::Media),
    item("hm-1", "História Mundial", "Século XIX", "Concerto Europeu",
        "Congresso de Viena e equilíbrio de poder.", Incidence::Media),
    item("hm-2", "História Mundial", "Século XX", "Guerra Fria",
        "Bipolaridade, descolonização e détente.", Incidence::Alta),
    item("hm-3", "História Mundial", "Século XX", "Entreguerras",
        "Liga das Nações, crise de 1929 e ascensão dos totalitarismos.", Incidence::Baixa),
    item("pi-1", "Política Internacional", "Teoria", "Realismo e liberalismo",
        "Principais autores e debates das Relações Internacionais.", Incidence::Media),
    item("pi-2", "Política Internacional", "Brasil", "Multilateralismo brasileiro",
        "Atuação na ONU, OMC e BRICS.", Incidence::Alta),
    item("pi-3", "Política Internacional", "Regional", "Integração sul-americana",
        "Mercosul, Unasul e a Celac.", Incidence::Alta),
    item("geo-1", "Geografia", "Geopolítica", "Amazônia e fronteiras",
        "Ocupação, defesa e cooperação amazônica.", Incidence::Alta),
    item("geo-2", "Geografia", "Geografia econômica", "Agronegócio e energia",
        "Matriz energética e cadeias agroexportadoras.", Incidence::Media),
    item("eco-1", "Economia", "Macroeconomia", "Balanço de pagamentos",
        "Contas externas, câmbio e reservas.", Incidence::Alta),
    item("eco-2", "Economia", "História econômica", "Industrialização por substituição de importações",
        "Do Estado Novo ao II PND.", Incidence::Media),
    item("eco-3", "Economia", "Comércio internacional", "Teorias do comércio",
        "Vantagens comparativas, Heckscher-Ohlin e novas teorias.", Incidence::Baixa),
    item("dip-1", "Direito Internacional Público", "Fontes", "Tratados",
        "Convenção de Viena de 1969 e incorporação no Brasil.", Incidence::Alta),
    item("dip-2", "Direito Internacional Público", "Sujeitos", "Organizações internacionais",
        "Personalidade jurídica e imunidades.", Incidence::Media),
    item("di-1", "Direito Interno", "Constitucional", "Princípios do art. 4º",
        "Princípios das relações internacionais na Constituição de 1988.", Incidence::Alta),
    item("di-2", "Direito Interno", "Administrativo", "Atos administrativos",
        "Atributos, espécies e controle.", Incidence::Baixa),
    item("lp-1", "Língua Portuguesa", "Redação", "Coesão e coerência",
        "Conectores, progressão temática e paralelismo.", Incidence::Alta),
    item("lp-2", "Língua Portuguesa", "Gramática", "Regência e crase",
        "Casos recorrentes nas provas do concurso.", Incidence::Media),
    item("li-1", "Língua Inglesa", "Writing", "Summary",
        "Condensing an article while keeping its argument.", Incidence::Alta),
    item("lf-1", "Língua Francesa", "Traduction", "Version et thème",
        "Tradução de textos diplomáticos.", Incidence::Media),
];

/// Syllabus item by id.
pub fn find(id: &str) -> Option<&'static SyllabusItem> {
    SYLLABUS.iter().find(|item| item.id == id)
}

/// Items of one subject, in syllabus order.
pub fn items_for(subject: &str) -> impl Iterator<Item = &'static SyllabusItem> + '_ {
    SYLLABUS.iter().filter(move |item| item.subject == subject)
}

/// First item of `subject` whose theory is not read yet. The pseudo-subject "Direito"
/// matches every subject whose name contains "Direito".
pub fn next_topic(subject: &str, state: &UserState) -> Option<&'static SyllabusItem> {
    SYLLABUS.iter().find(|item| {
        let matches = if subject == "Direito" {
            item.subject.contains("Direito")
        } else {
            item.subject == subject
        };
        matches
            && !state
                .edital_progress
                .get(item.id)
                .map(|p| p.theory)
                .unwrap_or(false)
    })
}
