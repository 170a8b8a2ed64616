use std::fmt;

use serde::Serialize;

/// Why an operation was answered by the fallback store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackReason {
    /// No primary backend is configured.
    Unconfigured,
    /// The primary backend did not answer in time.
    Timeout,
    /// The primary backend failed.
    Error,
}

/// Which backend produced a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum ServeMode {
    Primary,
    Fallback { reason: FallbackReason },
}

impl ServeMode {
    pub fn is_primary(&self) -> bool {
        matches!(self, Self::Primary)
    }

    pub fn is_fallback(&self) -> bool {
        !self.is_primary()
    }
}

impl fmt::Display for ServeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Fallback { reason } => {
                let reason = match reason {
                    FallbackReason::Unconfigured => "unconfigured",
                    FallbackReason::Timeout => "timeout",
                    FallbackReason::Error => "error",
                };
                write!(f, "fallback ({reason})")
            }
        }
    }
}

/// A result together with the backend that produced it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Served<T> {
    pub value: T,
    pub mode: ServeMode,
}

impl<T> Served<T> {
    pub fn primary(value: T) -> Self {
        Self {
            value,
            mode: ServeMode::Primary,
        }
    }

    pub fn fallback(value: T, reason: FallbackReason) -> Self {
        Self {
            value,
            mode: ServeMode::Fallback { reason },
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Served<U> {
        Served {
            value: f(self.value),
            mode: self.mode,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }
}
