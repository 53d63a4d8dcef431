//! Rule enforcement actions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The enforcement action a rule prescribes when its pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    /// Reject the content
    Block,
    /// Let the content through but mark it for review
    Flag,
    /// Explicitly permit the content
    Allow,
}

impl RuleAction {
    /// Severity rank used by hosts that resolve multiple matches:
    /// block > flag > allow.
    pub fn rank(&self) -> u8 {
        match self {
            RuleAction::Block => 2,
            RuleAction::Flag => 1,
            RuleAction::Allow => 0,
        }
    }

    /// Whether two actions are irreconcilable enforcement outcomes.
    ///
    /// Only block vs allow contradicts; flag is compatible with both.
    pub fn contradicts(&self, other: &RuleAction) -> bool {
        matches!(
            (self, other),
            (RuleAction::Block, RuleAction::Allow) | (RuleAction::Allow, RuleAction::Block)
        )
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleAction::Block => "block",
            RuleAction::Flag => "flag",
            RuleAction::Allow => "allow",
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RuleAction {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "block" => Ok(RuleAction::Block),
            "flag" => Ok(RuleAction::Flag),
            "allow" => Ok(RuleAction::Allow),
            _ => Err(crate::Error::parse(format!("Unknown rule action: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contradictions() {
        assert!(RuleAction::Block.contradicts(&RuleAction::Allow));
        assert!(RuleAction::Allow.contradicts(&RuleAction::Block));
        assert!(!RuleAction::Flag.contradicts(&RuleAction::Block));
        assert!(!RuleAction::Flag.contradicts(&RuleAction::Allow));
        assert!(!RuleAction::Block.contradicts(&RuleAction::Block));
    }

    #[test]
    fn test_rank_order() {
        assert!(RuleAction::Block.rank() > RuleAction::Flag.rank());
        assert!(RuleAction::Flag.rank() > RuleAction::Allow.rank());
    }

    #[test]
    fn test_action_from_str() {
        assert_eq!("BLOCK".parse::<RuleAction>().unwrap(), RuleAction::Block);
        assert_eq!("flag".parse::<RuleAction>().unwrap(), RuleAction::Flag);
        assert!("deny".parse::<RuleAction>().is_err());
    }

    #[test]
    fn test_action_serialization() {
        let json = serde_json::to_string(&RuleAction::Allow).unwrap();
        assert_eq!(json, "\"allow\"");
        let parsed: RuleAction = serde_json::from_str("\"block\"").unwrap();
        assert_eq!(parsed, RuleAction::Block);
    }
}
