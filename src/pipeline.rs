use chrono::{DateTime, Duration, Utc};

use crate::models::{CandidateStatus, Phase};

pub const DEFAULT_APPROVAL_THRESHOLD: f64 = 7.0;
pub const DEFAULT_CASE_WINDOW_DAYS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelinePolicy {
    pub approval_threshold: f64,
    pub case_window_days: i64,
}

impl Default for PipelinePolicy {
    fn default() -> Self {
        PipelinePolicy {
            approval_threshold: DEFAULT_APPROVAL_THRESHOLD,
            case_window_days: DEFAULT_CASE_WINDOW_DAYS,
        }
    }
}

/// Result of a status decision. `phase: None` leaves the stored phase as is.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub status: CandidateStatus,
    pub phase: Option<Phase>,
    pub case_deadline: Option<DateTime<Utc>>,
}

impl Transition {
    pub fn sends_case(&self) -> bool {
        self.status == CandidateStatus::CaseSent
    }
}

impl PipelinePolicy {
    /// Decides the outcome of an AI screening score on the 0-10 scale.
    pub fn decide(&self, score: f64, now: DateTime<Utc>) -> Transition {
        if score >= self.approval_threshold {
            Transition {
                status: CandidateStatus::CaseSent,
                phase: Some(Phase::Case),
                case_deadline: Some(case_deadline(now, self.case_window_days)),
            }
        } else {
            Transition {
                status: CandidateStatus::AiRejected,
                phase: Some(Phase::Application),
                case_deadline: None,
            }
        }
    }
}

pub fn case_deadline(now: DateTime<Utc>, window_days: i64) -> DateTime<Utc> {
    now + Duration::days(window_days.max(1))
}

/// Clamps a model score into 0-10. Non-finite values are rejected.
pub fn normalize_score(raw: f64) -> Option<f64> {
    if raw.is_finite() {
        Some(raw.clamp(0.0, 10.0))
    } else {
        None
    }
}

/// Staff-driven move to an arbitrary status, using its advisory phase.
pub fn manual(status: CandidateStatus) -> Transition {
    Transition {
        status,
        phase: status.phase(),
        case_deadline: None,
    }
}

/// Outcome of a peer review on the practical case.
pub fn after_case_review(current: CandidateStatus, recommend_approve: bool) -> Option<Transition> {
    if recommend_approve {
        return Some(Transition {
            status: CandidateStatus::CaseApproved,
            phase: Some(Phase::TechnicalInterview),
            case_deadline: None,
        });
    }
    if current == CandidateStatus::CaseSent {
        return Some(manual(CandidateStatus::CaseReview));
    }
    None
}

pub fn average(scores: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (total, count) = scores
        .into_iter()
        .fold((0.0, 0usize), |(total, count), score| (total + score, count + 1));
    if count == 0 {
        None
    } else {
        Some(total / count as f64)
    }
}

/// Whether a stored status/phase pair agrees with the transition table.
/// Advisory only; nothing in the database enforces it.
pub fn is_consistent(status: CandidateStatus, phase: Phase) -> bool {
    match status {
        CandidateStatus::AiRejected => matches!(phase, Phase::Application | Phase::AiReview),
        CandidateStatus::CaseRejected => matches!(phase, Phase::Case | Phase::CaseReview),
        CandidateStatus::Rejected => true,
        other => other.phase() == Some(phase),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 14, 30, 0).unwrap()
    }

    #[test]
    fn approval_sends_case_with_five_day_deadline() {
        let policy = PipelinePolicy::default();
        for score in [7.0, 7.01, 8.2, 10.0] {
            let transition = policy.decide(score, fixed_now());
            assert_eq!(transition.status, CandidateStatus::CaseSent);
            assert_eq!(transition.phase, Some(Phase::Case));
            assert_eq!(transition.case_deadline, Some(fixed_now() + Duration::days(5)));
            assert!(transition.sends_case());
        }
    }

    #[test]
    fn low_scores_reject_without_deadline() {
        let policy = PipelinePolicy::default();
        for score in [0.0, 4.0, 6.99] {
            let transition = policy.decide(score, fixed_now());
            assert_eq!(transition.status, CandidateStatus::AiRejected);
            assert_eq!(transition.phase, Some(Phase::Application));
            assert_eq!(transition.case_deadline, None);
            assert!(!transition.sends_case());
        }
    }

    #[test]
    fn policy_threshold_is_configurable() {
        let policy = PipelinePolicy {
            approval_threshold: 8.5,
            case_window_days: 3,
        };
        assert_eq!(policy.decide(8.2, fixed_now()).status, CandidateStatus::AiRejected);
        let approved = policy.decide(9.0, fixed_now());
        assert_eq!(approved.case_deadline, Some(fixed_now() + Duration::days(3)));
    }

    #[test]
    fn scores_are_clamped_and_nan_rejected() {
        assert_eq!(normalize_score(12.0), Some(10.0));
        assert_eq!(normalize_score(-1.0), Some(0.0));
        assert_eq!(normalize_score(f64::NAN), None);
    }

    #[test]
    fn case_review_moves_forward() {
        let approved = after_case_review(CandidateStatus::CaseSent, true).unwrap();
        assert_eq!(approved.status, CandidateStatus::CaseApproved);
        assert_eq!(approved.phase, Some(Phase::TechnicalInterview));

        let first_review = after_case_review(CandidateStatus::CaseSent, false).unwrap();
        assert_eq!(first_review.status, CandidateStatus::CaseReview);
        assert!(after_case_review(CandidateStatus::CaseReview, false).is_none());
    }

    #[test]
    fn averages_ignore_empty_input() {
        assert_eq!(average(Vec::<f64>::new()), None);
        let avg = average([8.0, 6.0, 7.0]).unwrap();
        assert!((avg - 7.0).abs() < 0.001);
    }

    #[test]
    fn consistency_follows_transition_table() {
        assert!(is_consistent(CandidateStatus::CaseSent, Phase::Case));
        assert!(!is_consistent(CandidateStatus::CaseSent, Phase::Application));
        assert!(is_consistent(CandidateStatus::AiRejected, Phase::Application));
        assert!(is_consistent(CandidateStatus::Rejected, Phase::PartnersInterview));
    }
}
