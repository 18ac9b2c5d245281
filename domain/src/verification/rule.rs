//! Quorum rules for the opt-in majority verifier
//!
//! The default verifiers require unanimous agreement. A [`QuorumRule`]
//! describes how many identical answers the `majority` verifier needs
//! before it accepts the most common one.

use serde::{Deserialize, Serialize};

/// Rule for deciding whether enough submissions agree
///
/// - `Majority`: more than half of the submissions agree (default)
/// - `Unanimous`: every submission agrees
/// - `AtLeast(n)`: at least n submissions agree
/// - `Percentage(p)`: at least p% of the submissions agree
///
/// # Example
///
/// ```
/// use tally_domain::verification::QuorumRule;
///
/// let rule = QuorumRule::Majority;
/// assert!(rule.is_satisfied(2, 3));
/// assert!(!rule.is_satisfied(1, 2));
///
/// assert!(!QuorumRule::Unanimous.is_satisfied(2, 3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuorumRule {
    #[default]
    Majority,
    Unanimous,
    AtLeast(usize),
    Percentage(u8),
}

impl QuorumRule {
    /// Check the rule given the size of the agreeing group and the total
    pub fn is_satisfied(&self, agreeing: usize, total: usize) -> bool {
        if total == 0 || agreeing == 0 {
            return false;
        }
        agreeing >= self.min_agreeing(total)
    }

    /// Smallest agreeing group that satisfies the rule for `total` submissions
    pub fn min_agreeing(&self, total: usize) -> usize {
        match self {
            QuorumRule::Majority => total / 2 + 1,
            QuorumRule::Unanimous => total,
            QuorumRule::AtLeast(n) => *n,
            QuorumRule::Percentage(p) => (total as f64 * (*p as f64 / 100.0)).ceil() as usize,
        }
    }

    pub fn description(&self) -> String {
        match self {
            QuorumRule::Majority => "majority (more than half agree)".to_string(),
            QuorumRule::Unanimous => "unanimous (all agree)".to_string(),
            QuorumRule::AtLeast(n) => format!("at least {} agreeing submissions", n),
            QuorumRule::Percentage(p) => format!("at least {}% agreeing", p),
        }
    }
}

impl std::fmt::Display for QuorumRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::str::FromStr for QuorumRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "majority" => Ok(QuorumRule::Majority),
            "unanimous" => Ok(QuorumRule::Unanimous),
            s if s.starts_with("atleast:") || s.starts_with("at_least:") => {
                let n: usize = s
                    .split(':')
                    .nth(1)
                    .ok_or("Missing number after atleast:")?
                    .parse()
                    .map_err(|_| "Invalid number for atleast")?;
                Ok(QuorumRule::AtLeast(n))
            }
            s if s.starts_with("percentage:") || s.ends_with('%') => {
                let num_str = s.trim_start_matches("percentage:").trim_end_matches('%');
                let p: u8 = num_str.parse().map_err(|_| "Invalid percentage")?;
                if p > 100 {
                    return Err(format!("Percentage out of range: {}", p));
                }
                Ok(QuorumRule::Percentage(p))
            }
            _ => Err(format!(
                "Unknown quorum rule: {}. Valid: majority, unanimous, atleast:N, percentage:N or N%",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_majority_rule() {
        let rule = QuorumRule::Majority;
        assert!(!rule.is_satisfied(1, 3));
        assert!(rule.is_satisfied(2, 3));
        assert!(!rule.is_satisfied(2, 4));
        assert!(rule.is_satisfied(3, 4));
    }

    #[test]
    fn test_unanimous_rule() {
        let rule = QuorumRule::Unanimous;
        assert!(!rule.is_satisfied(2, 3));
        assert!(rule.is_satisfied(3, 3));
    }

    #[test]
    fn test_at_least_and_percentage() {
        assert!(QuorumRule::AtLeast(2).is_satisfied(2, 5));
        assert!(!QuorumRule::AtLeast(2).is_satisfied(1, 5));

        // 5 total: need ceil(3.75) = 4
        assert!(!QuorumRule::Percentage(75).is_satisfied(3, 5));
        assert!(QuorumRule::Percentage(75).is_satisfied(4, 5));
    }

    #[test]
    fn test_empty_groups_never_satisfy() {
        assert!(!QuorumRule::Majority.is_satisfied(0, 0));
        assert!(!QuorumRule::AtLeast(0).is_satisfied(0, 3));
        assert!(!QuorumRule::Percentage(0).is_satisfied(0, 3));
    }

    #[test]
    fn test_parse_rule() {
        assert_eq!("majority".parse::<QuorumRule>(), Ok(QuorumRule::Majority));
        assert_eq!("Unanimous".parse::<QuorumRule>(), Ok(QuorumRule::Unanimous));
        assert_eq!("atleast:3".parse::<QuorumRule>(), Ok(QuorumRule::AtLeast(3)));
        assert_eq!("75%".parse::<QuorumRule>(), Ok(QuorumRule::Percentage(75)));
        assert_eq!(
            "percentage:60".parse::<QuorumRule>(),
            Ok(QuorumRule::Percentage(60))
        );
        assert!("150%".parse::<QuorumRule>().is_err());
        assert!("most".parse::<QuorumRule>().is_err());
    }
}
