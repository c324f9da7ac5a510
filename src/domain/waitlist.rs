//! Waitlist subscription kinds.

use serde::{Deserialize, Serialize};

/// Subscription tier. Priority subscribers are notified first and
/// exclusively; main subscribers are fanned out to afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WaitlistKind {
    Main,
    Priority,
}

impl WaitlistKind {
    /// Parses a wire value; an empty value means [`WaitlistKind::Main`],
    /// anything unknown is rejected.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "main" => Some(Self::Main),
            "priority" => Some(Self::Priority),
            _ => None,
        }
    }

    /// Returns the storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Priority => "priority",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_defaults_empty_to_main() {
        assert_eq!(WaitlistKind::parse(""), Some(WaitlistKind::Main));
        assert_eq!(WaitlistKind::parse("main"), Some(WaitlistKind::Main));
        assert_eq!(WaitlistKind::parse("PRIORITY"), Some(WaitlistKind::Priority));
        assert_eq!(WaitlistKind::parse("vip"), None);
    }
}
