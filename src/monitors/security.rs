use crate::{IntegrityChecks, Issue, Severity};

const MAX_SCORE: i64 = 100;

const PRACTICE_BONUS: i64 = 5;

fn penalty(severity: Severity) -> i64 {
    match severity {
        Severity::High => 20,
        Severity::Medium => 10,
        Severity::Low => 5,
    }
}

/// Good practices that were positively verified by the integrity probes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifiedPractices {
    pub authentication_working: bool,
    pub user_enumeration_blocked: bool,
    pub no_pending_updates: bool,
    pub sensitive_files_protected: bool,
}

impl VerifiedPractices {
    fn count(&self) -> i64 {
        [
            self.authentication_working,
            self.user_enumeration_blocked,
            self.no_pending_updates,
            self.sensitive_files_protected,
        ]
        .into_iter()
        .filter(|verified| *verified)
        .count() as i64
    }
}

impl From<&IntegrityChecks> for VerifiedPractices {
    fn from(checks: &IntegrityChecks) -> Self {
        Self {
            authentication_working: checks.authentication_working == Some(true),
            user_enumeration_blocked: checks.user_enumeration_blocked == Some(true),
            // an unknown update count is not a verified zero
            no_pending_updates: checks.plugins_needing_updates == Some(0),
            sensitive_files_protected: checks.sensitive_files_protected == Some(true),
        }
    }
}

/// Fold issues and verified practices into a score clamped to `0..=100`.
pub fn score(issues: &[Issue], practices: VerifiedPractices) -> u8 {
    let penalties: i64 = issues.iter().map(|issue| penalty(issue.severity)).sum();
    let bonus = practices.count() * PRACTICE_BONUS;

    (MAX_SCORE - penalties + bonus).clamp(0, MAX_SCORE) as u8
}
