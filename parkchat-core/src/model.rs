use serde::{Deserialize, Serialize};

/// Where a piece of upstream data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Live,
    Fallback,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Live => "live",
            Provenance::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an upstream fetch that never fails outright.
///
/// `Fallback` carries substitute data plus the reason the live source could
/// not be used.
#[derive(Debug, Clone, PartialEq)]
pub enum Sourced<T> {
    Live(T),
    Fallback { data: T, reason: String },
}

impl<T> Sourced<T> {
    pub fn fallback(data: T, reason: impl Into<String>) -> Self {
        Sourced::Fallback {
            data,
            reason: reason.into(),
        }
    }

    pub fn data(&self) -> &T {
        match self {
            Sourced::Live(data) | Sourced::Fallback { data, .. } => data,
        }
    }

    pub fn into_data(self) -> T {
        match self {
            Sourced::Live(data) | Sourced::Fallback { data, .. } => data,
        }
    }

    pub fn provenance(&self) -> Provenance {
        match self {
            Sourced::Live(_) => Provenance::Live,
            Sourced::Fallback { .. } => Provenance::Fallback,
        }
    }

    pub fn fallback_reason(&self) -> Option<&str> {
        match self {
            Sourced::Live(_) => None,
            Sourced::Fallback { reason, .. } => Some(reason),
        }
    }
}
