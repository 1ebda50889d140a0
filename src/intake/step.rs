//! Dialogue state machine — tracks which field the guided flow is waiting on.

use serde::{Deserialize, Serialize};

use crate::intake::validate::FieldKind;

/// Steps of the guided intake dialogue.
///
/// Progresses linearly: AwaitingName → AwaitingAge → AwaitingWorkplace →
/// AwaitingCitizenship → Completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueStep {
    AwaitingName,
    AwaitingAge,
    AwaitingWorkplace,
    AwaitingCitizenship,
    Completed,
}

impl DialogueStep {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: DialogueStep) -> bool {
        use DialogueStep::*;
        matches!(
            (self, target),
            (AwaitingName, AwaitingAge)
                | (AwaitingAge, AwaitingWorkplace)
                | (AwaitingWorkplace, AwaitingCitizenship)
                | (AwaitingCitizenship, Completed)
        )
    }

    /// Whether this step is terminal (the session collapses into a record).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<DialogueStep> {
        use DialogueStep::*;
        match self {
            AwaitingName => Some(AwaitingAge),
            AwaitingAge => Some(AwaitingWorkplace),
            AwaitingWorkplace => Some(AwaitingCitizenship),
            AwaitingCitizenship => Some(Completed),
            Completed => None,
        }
    }

    /// The field this step collects, if any.
    pub fn field(&self) -> Option<FieldKind> {
        match self {
            Self::AwaitingName => Some(FieldKind::Name),
            Self::AwaitingAge => Some(FieldKind::Age),
            Self::AwaitingWorkplace => Some(FieldKind::Workplace),
            Self::AwaitingCitizenship => Some(FieldKind::Citizenship),
            Self::Completed => None,
        }
    }
}

impl Default for DialogueStep {
    fn default() -> Self {
        Self::AwaitingName
    }
}

impl std::fmt::Display for DialogueStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AwaitingName => "awaiting_name",
            Self::AwaitingAge => "awaiting_age",
            Self::AwaitingWorkplace => "awaiting_workplace",
            Self::AwaitingCitizenship => "awaiting_citizenship",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use DialogueStep::*;
        let transitions = [
            (AwaitingName, AwaitingAge),
            (AwaitingAge, AwaitingWorkplace),
            (AwaitingWorkplace, AwaitingCitizenship),
            (AwaitingCitizenship, Completed),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use DialogueStep::*;
        // Skip steps
        assert!(!AwaitingName.can_transition_to(AwaitingWorkplace));
        assert!(!AwaitingAge.can_transition_to(Completed));
        // Go backward
        assert!(!AwaitingWorkplace.can_transition_to(AwaitingAge));
        // Terminal
        assert!(!Completed.can_transition_to(AwaitingName));
        // Self-transition
        assert!(!AwaitingAge.can_transition_to(AwaitingAge));
    }

    #[test]
    fn next_walks_all_steps() {
        use DialogueStep::*;
        let expected = [AwaitingAge, AwaitingWorkplace, AwaitingCitizenship, Completed];
        let mut current = AwaitingName;
        for expected_next in expected {
            let next = current.next().unwrap();
            assert_eq!(next, expected_next);
            current = next;
        }
        assert!(current.next().is_none());
        assert!(current.is_terminal());
    }

    #[test]
    fn every_non_terminal_step_collects_a_field() {
        use DialogueStep::*;
        for step in [AwaitingName, AwaitingAge, AwaitingWorkplace, AwaitingCitizenship] {
            assert!(step.field().is_some(), "{step} should collect a field");
        }
        assert!(Completed.field().is_none());
    }

    #[test]
    fn display_matches_serde() {
        use DialogueStep::*;
        for step in [
            AwaitingName,
            AwaitingAge,
            AwaitingWorkplace,
            AwaitingCitizenship,
            Completed,
        ] {
            let display = format!("{step}");
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{display}\""), json);
        }
    }
}
