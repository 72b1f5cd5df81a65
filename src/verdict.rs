use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict reported by the domain analysis service.
///
/// The service speaks a closed vocabulary, but anything it sends outside that
/// vocabulary is kept verbatim in `Unrecognized` instead of failing the decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Verdict {
    Safe,
    Suspicious,
    Malicious,
    Unknown,
    Error,
    InvalidFormat,
    Unrecognized(String),
}

/// Display treatment for a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub label: &'static str,
    pub style_class: &'static str,
}

pub const STYLE_DANGER: &str = "danger";
pub const STYLE_WARNING: &str = "warning";
pub const STYLE_SUCCESS: &str = "success";
pub const STYLE_NEUTRAL: &str = "neutral";

const UNKNOWN_CLASSIFICATION: Classification = Classification {
    label: "Unknown",
    style_class: STYLE_NEUTRAL,
};

impl Verdict {
    pub fn from_status(status: &str) -> Self {
        match status.trim().to_ascii_uppercase().as_str() {
            "SAFE" => Verdict::Safe,
            "SUSPICIOUS" => Verdict::Suspicious,
            "MALICIOUS" => Verdict::Malicious,
            "UNKNOWN" => Verdict::Unknown,
            "ERROR" => Verdict::Error,
            "INVALID_FORMAT" => Verdict::InvalidFormat,
            _ => Verdict::Unrecognized(status.to_string()),
        }
    }

    pub fn as_status(&self) -> &str {
        match self {
            Verdict::Safe => "SAFE",
            Verdict::Suspicious => "SUSPICIOUS",
            Verdict::Malicious => "MALICIOUS",
            Verdict::Unknown => "UNKNOWN",
            Verdict::Error => "ERROR",
            Verdict::InvalidFormat => "INVALID_FORMAT",
            Verdict::Unrecognized(raw) => raw,
        }
    }

    /// Confidence carries no meaning for error-type verdicts.
    pub fn shows_confidence(&self) -> bool {
        !matches!(self, Verdict::Error | Verdict::InvalidFormat)
    }

    pub fn classify(&self) -> Classification {
        match self {
            Verdict::Malicious => Classification {
                label: "Malicious",
                style_class: STYLE_DANGER,
            },
            Verdict::Suspicious => Classification {
                label: "Suspicious",
                style_class: STYLE_WARNING,
            },
            Verdict::Safe => Classification {
                label: "Safe",
                style_class: STYLE_SUCCESS,
            },
            Verdict::InvalidFormat => Classification {
                label: "Invalid format",
                style_class: STYLE_NEUTRAL,
            },
            Verdict::Error => Classification {
                label: "Error",
                style_class: STYLE_NEUTRAL,
            },
            Verdict::Unknown | Verdict::Unrecognized(_) => UNKNOWN_CLASSIFICATION,
        }
    }
}

/// Map a raw wire status onto its display treatment. Total over all strings.
pub fn classify(status: &str) -> Classification {
    Verdict::from_status(status).classify()
}

impl From<String> for Verdict {
    fn from(status: String) -> Self {
        Verdict::from_status(&status)
    }
}

impl From<Verdict> for String {
    fn from(verdict: Verdict) -> Self {
        verdict.as_status().to_string()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_status())
    }
}
