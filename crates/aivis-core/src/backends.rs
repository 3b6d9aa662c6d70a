//! Supported text-generation backends.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A text-generation backend a project can query.
///
/// The set is closed: any other name stored in a project's backend selection
/// is rejected with [`CoreError::UnknownBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[serde(rename = "chatgpt")]
    ChatGpt,
    Claude,
    Gemini,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::ChatGpt, Backend::Claude, Backend::Gemini];

    /// Stable identifier stored in the database and used in config files.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Backend::ChatGpt => "chatgpt",
            Backend::Claude => "claude",
            Backend::Gemini => "gemini",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Backend::ChatGpt => "ChatGPT",
            Backend::Claude => "Claude",
            Backend::Gemini => "Gemini",
        }
    }

    /// Catalog weight used by the model-coverage factor when a backend is
    /// first registered.
    #[must_use]
    pub fn default_weight(self) -> f64 {
        match self {
            Backend::ChatGpt => 1.0,
            Backend::Claude => 0.9,
            Backend::Gemini => 0.8,
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chatgpt" => Ok(Backend::ChatGpt),
            "claude" => Ok(Backend::Claude),
            "gemini" => Ok(Backend::Gemini),
            _ => Err(CoreError::UnknownBackend(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names_case_insensitively() {
        assert_eq!("chatgpt".parse::<Backend>().unwrap(), Backend::ChatGpt);
        assert_eq!(" Claude ".parse::<Backend>().unwrap(), Backend::Claude);
        assert_eq!("GEMINI".parse::<Backend>().unwrap(), Backend::Gemini);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "llama".parse::<Backend>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownBackend(ref n) if n == "llama"));
    }

    #[test]
    fn name_round_trips_through_from_str() {
        for backend in Backend::ALL {
            assert_eq!(backend.name().parse::<Backend>().unwrap(), backend);
        }
    }

    #[test]
    fn default_weights_match_catalog() {
        assert!((Backend::ChatGpt.default_weight() - 1.0).abs() < f64::EPSILON);
        assert!((Backend::Claude.default_weight() - 0.9).abs() < f64::EPSILON);
        assert!((Backend::Gemini.default_weight() - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn serde_uses_storage_names() {
        let json = serde_json::to_string(&Backend::ChatGpt).unwrap();
        assert_eq!(json, "\"chatgpt\"");
    }
}
