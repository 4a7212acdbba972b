const BLOCKED_PREFIX: &str = "BLOCKED:";
const UNKNOWN_REASON: &str = "unknown";

/// Result of one translation attempt for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Translated(String),
    /// The service refused the prompt. The reason is `None` when the
    /// response carried no block reason.
    Blocked(Option<String>),
    /// The request failed, timed out or came back in a shape we could not read.
    Absent,
}

impl Outcome {
    pub fn is_absent(&self) -> bool {
        matches!(self, Outcome::Absent)
    }

    /// Only translated rows count as done; blocked and absent rows are patched.
    pub fn is_successful(&self) -> bool {
        matches!(self, Outcome::Translated(_))
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Translated(_) => OutcomeKind::Translated,
            Outcome::Blocked(_) => OutcomeKind::Blocked,
            Outcome::Absent => OutcomeKind::Absent,
        }
    }

    /// Encodes the outcome as the value of the outcome column.
    pub fn to_cell(&self) -> String {
        match self {
            Outcome::Translated(text) => text.clone(),
            Outcome::Blocked(Some(reason)) => format!("{} {}", BLOCKED_PREFIX, reason),
            Outcome::Blocked(None) => format!("{} {}", BLOCKED_PREFIX, UNKNOWN_REASON),
            Outcome::Absent => String::new(),
        }
    }

    pub fn from_cell(cell: &str) -> Self {
        if cell.is_empty() {
            return Outcome::Absent;
        }

        match cell.strip_prefix(BLOCKED_PREFIX) {
            Some(rest) => {
                let reason = rest.trim();
                // "None" is what files written by older tooling carry.
                if reason.is_empty() || reason == UNKNOWN_REASON || reason == "None" {
                    Outcome::Blocked(None)
                } else {
                    Outcome::Blocked(Some(reason.to_string()))
                }
            }
            None => Outcome::Translated(cell.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Translated,
    Blocked,
    Absent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_encoding() {
        assert_eq!(Outcome::Translated("Szia".into()).to_cell(), "Szia");
        assert_eq!(Outcome::Blocked(Some("SAFETY".into())).to_cell(), "BLOCKED: SAFETY");
        assert_eq!(Outcome::Blocked(None).to_cell(), "BLOCKED: unknown");
        assert_eq!(Outcome::Absent.to_cell(), "");
    }

    #[test]
    fn cell_decoding() {
        assert_eq!(Outcome::from_cell(""), Outcome::Absent);
        assert_eq!(
            Outcome::from_cell("BLOCKED: OTHER"),
            Outcome::Blocked(Some("OTHER".into()))
        );
        assert_eq!(Outcome::from_cell("BLOCKED: unknown"), Outcome::Blocked(None));
        assert_eq!(Outcome::from_cell("BLOCKED: None"), Outcome::Blocked(None));
        assert_eq!(
            Outcome::from_cell("A BLOCKED: szó"),
            Outcome::Translated("A BLOCKED: szó".into())
        );
    }

    #[test]
    fn only_translations_are_successful() {
        assert!(Outcome::Translated("x".into()).is_successful());
        assert!(!Outcome::Blocked(None).is_successful());
        assert!(!Outcome::Absent.is_successful());
    }
}
