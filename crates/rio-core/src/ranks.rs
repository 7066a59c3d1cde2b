//! Diplomatic career ranks and the reward catalogue unlocked by level.

use serde::Serialize;

use crate::shared::UserState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiplomatRank {
    pub level: u32,
    pub title: &'static str,
    pub emoji: &'static str,
}

/// Ranks in ascending level order. Level 7 has no rank of its own.
pub const DIPLOMAT_RANKS: [DiplomatRank; 7] = [
    DiplomatRank { level: 1, title: "Aspirante Felino", emoji: "🐱" },
    DiplomatRank { level: 2, title: "Terceiro Secretário", emoji: "🐈" },
    DiplomatRank { level: 3, title: "Segundo Secretário", emoji: "👔" },
    DiplomatRank { level: 4, title: "Primeiro Secretário", emoji: "📜" },
    DiplomatRank { level: 5, title: "Conselheiro", emoji: "🏛️" },
    DiplomatRank { level: 6, title: "Ministro de 2ª Classe", emoji: "🎖️" },
    DiplomatRank { level: 8, title: "Embaixador Plenipotenciário", emoji: "🌍" },
];

/// Highest rank whose level does not exceed `level`.
pub fn rank_for(level: u32) -> &'static DiplomatRank {
    DIPLOMAT_RANKS
        .iter()
        .rev()
        .find(|r| level >= r.level)
        .unwrap_or(&DIPLOMAT_RANKS[0])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RewardCategory {
    Tecnica,
    Guia,
    Ferramenta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub min_level: u32,
    pub category: RewardCategory,
    pub content: &'static str,
}

pub const REWARDS: [Reward; 3] = [
    Reward {
        id: "connectors",
        name: "Manual de Conectores Diplomáticos",
        description: "Conectores para elevar a coesão do texto ao padrão Rio Branco.",
        min_level: 2,
        category: RewardCategory::Tecnica,
        content: "A despeito de, Por conseguinte, Em que pese a, Concomitantemente: conectores \
                  que sustentam a nota de Português e Estrutura.",
    },
    Reward {
        id: "approved-guide",
        name: "Roteiro dos Guias dos Aprovados",
        description: "Como ler os Guias de Estudo com foco no que a banca cobra.",
        min_level: 4,
        category: RewardCategory::Guia,
        content: "Leia primeiro as respostas nota máxima da sua matéria mais fraca, depois \
                  compare a estrutura com as medianas.",
    },
    Reward {
        id: "timeline-kit",
        name: "Kit de Linhas do Tempo",
        description: "Modelo de cronologia para História do Brasil e Política Externa.",
        min_level: 6,
        category: RewardCategory::Ferramenta,
        content: "Uma coluna por governo, uma linha por tratado, uma cor por paradigma de \
                  inserção internacional.",
    },
];

/// Adds every reward reachable at the current level. Never removes an unlocked reward.
/// Returns the ids unlocked by this call.
pub fn unlock_rewards(state: &mut UserState) -> Vec<&'static str> {
    let mut unlocked = Vec::new();
    for reward in REWARDS.iter().filter(|r| r.min_level <= state.level) {
        if state.unlocked_reward_ids.insert(reward.id.to_string()) {
            unlocked.push(reward.id);
        }
    }
    unlocked
}
