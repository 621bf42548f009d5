// Review moderation value objects

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

pub const FLAGGED_PREFIX: &str = "[FLAGGED] ";
pub const HIDDEN_PREFIX: &str = "[HIDDEN] ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    Flag,
    Unflag,
    Hide,
    Show,
}

impl ModerationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::Flag => "flag",
            ModerationAction::Unflag => "unflag",
            ModerationAction::Hide => "hide",
            ModerationAction::Show => "show",
        }
    }
}

impl TryFrom<&str> for ModerationAction {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_lowercase().as_str() {
            "flag" => Ok(ModerationAction::Flag),
            "unflag" => Ok(ModerationAction::Unflag),
            "hide" => Ok(ModerationAction::Hide),
            "show" => Ok(ModerationAction::Show),
            other => Err(anyhow!("unknown moderation action '{}'", other)),
        }
    }
}

/// Moderation state of a review, kept apart from the author's comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReviewModeration {
    pub flagged: bool,
    pub hidden: bool,
}

impl ReviewModeration {
    pub fn apply(self, action: ModerationAction) -> Self {
        match action {
            ModerationAction::Flag => Self { flagged: true, ..self },
            ModerationAction::Unflag => Self { flagged: false, ..self },
            ModerationAction::Hide => Self { hidden: true, ..self },
            ModerationAction::Show => Self { hidden: false, ..self },
        }
    }

    /// Renders the comment with the legacy `[HIDDEN] ` / `[FLAGGED] ` markers.
    pub fn decorate(&self, comment: &str) -> String {
        let mut out = String::new();
        if self.hidden {
            out.push_str(HIDDEN_PREFIX);
        }
        if self.flagged {
            out.push_str(FLAGGED_PREFIX);
        }
        out.push_str(comment);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_actions_do_not_stack() {
        let state = ReviewModeration::default()
            .apply(ModerationAction::Hide)
            .apply(ModerationAction::Hide);
        assert_eq!(state.decorate("original text"), "[HIDDEN] original text");
    }

    #[test]
    fn show_restores_original_text() {
        let state = ReviewModeration::default()
            .apply(ModerationAction::Hide)
            .apply(ModerationAction::Show);
        assert_eq!(state.decorate("original text"), "original text");
    }

    #[test]
    fn flag_and_hide_are_independent() {
        let state = ReviewModeration::default()
            .apply(ModerationAction::Flag)
            .apply(ModerationAction::Hide)
            .apply(ModerationAction::Unflag);
        assert!(state.hidden);
        assert!(!state.flagged);
    }

    #[test]
    fn parse_action_rejects_unknown() {
        assert_eq!(
            ModerationAction::try_from(" HIDE ").expect("parse"),
            ModerationAction::Hide
        );
        assert!(ModerationAction::try_from("archive").is_err());
    }
}
