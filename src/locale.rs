//! Languages and the fixed user-facing texts they select

use serde::{Deserialize, Serialize};

/// Supported interface languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Dutch,
    Romanian,
}

impl Language {
    /// Parse a language code such as `en`, `nl` or `ro`
    ///
    /// Unknown codes fall back to English.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "nl" | "dutch" => Language::Dutch,
            "ro" | "romanian" => Language::Romanian,
            _ => Language::English,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Dutch => "nl",
            Language::Romanian => "ro",
        }
    }

    pub fn messages(self) -> Messages {
        match self {
            Language::English => Messages {
                self_reference: "This note references itself.",
                blank_note: "The note is blank.",
                new_note_title: "New Note",
            },
            Language::Dutch => Messages {
                self_reference: "Deze notitie verwijst naar zichzelf.",
                blank_note: "De notitie is leeg.",
                new_note_title: "Nieuwe notitie",
            },
            Language::Romanian => Messages {
                self_reference: "Această notiță face referire la ea însăși.",
                blank_note: "Notița este goală.",
                new_note_title: "Notiță nouă",
            },
        }
    }
}

/// Fixed texts used by previews and new notes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Messages {
    pub self_reference: &'static str,
    pub blank_note: &'static str,
    pub new_note_title: &'static str,
}

impl Default for Messages {
    fn default() -> Self {
        Language::English.messages()
    }
}
