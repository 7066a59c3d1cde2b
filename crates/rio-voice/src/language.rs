//! Conversation language and the mentor persona prompt.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VoiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "pt")]
    Portuguese,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "es")]
    Spanish,
}

impl Language {
    pub const ALL: [Language; 4] = [Self::Portuguese, Self::English, Self::French, Self::Spanish];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Portuguese => "pt",
            Self::English => "en",
            Self::French => "fr",
            Self::Spanish => "es",
        }
    }

    /// Language name as the persona prompt spells it.
    pub fn name_pt(&self) -> &'static str {
        match self {
            Self::Portuguese => "Português",
            Self::English => "Inglês",
            Self::French => "Francês",
            Self::Spanish => "Espanhol",
        }
    }

    /// System instruction for the live mentor in this language.
    pub fn persona_prompt(&self) -> String {
        format!(
            "Você é o Mentor Cat, um diplomata experiente e poliglota. \
             Você deve ajudar o candidato no idioma {}. \
             Seu objetivo é praticar conversação diplomática, corrigir erros gramaticais de forma gentil \
             e sugerir termos mais sofisticados (registro culto). \
             Seja encorajador, use um tom formal mas com a personalidade de um gatinho sábio. \
             Se for Inglês ou Francês, converse majoritariamente nesses idiomas.",
            self.name_pt()
        )
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = VoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pt" | "pt-br" | "portugues" | "português" => Ok(Self::Portuguese),
            "en" | "english" => Ok(Self::English),
            "fr" | "french" | "français" => Ok(Self::French),
            "es" | "spanish" | "español" => Ok(Self::Spanish),
            other => Err(VoiceError::Config(format!("unsupported language: {}", other))),
        }
    }
}
