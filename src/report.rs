use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Candidate, CandidateStatus, StatusHistoryEntry};
use crate::pipeline::{average, is_consistent};
use crate::status::{describe, describe_phase, style};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub code: &'static str,
    pub label: &'static str,
    pub count: usize,
}

/// Pipeline counts served on the staff dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub total: usize,
    pub by_status: Vec<StatusCount>,
    pub average_ai_score: Option<f64>,
    pub awaiting_case_review: usize,
    pub in_interviews: usize,
    pub hired: usize,
    pub rejected: usize,
}

pub fn summarize(candidates: &[Candidate]) -> PipelineSummary {
    let count = |statuses: &[CandidateStatus]| {
        candidates
            .iter()
            .filter(|c| statuses.contains(&c.status))
            .count()
    };
    let by_status = CandidateStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            code: status.code(),
            label: style(status).label,
            count: count(&[status]),
        })
        .filter(|entry| entry.count > 0)
        .collect();

    PipelineSummary {
        total: candidates.len(),
        by_status,
        average_ai_score: average(candidates.iter().filter_map(|c| c.ai_score)),
        awaiting_case_review: count(&[CandidateStatus::CaseSent, CandidateStatus::CaseReview]),
        in_interviews: count(&[
            CandidateStatus::CaseApproved,
            CandidateStatus::TechnicalInterview,
            CandidateStatus::PartnersInterview,
        ]),
        hired: count(&[CandidateStatus::Hired]),
        rejected: candidates.iter().filter(|c| c.status.is_rejection()).count(),
    }
}

pub fn top_by_ai_score(candidates: &[Candidate], limit: usize) -> Vec<&Candidate> {
    let mut scored: Vec<&Candidate> = candidates.iter().filter(|c| c.ai_score.is_some()).collect();
    scored.sort_by(|a, b| b.ai_score.partial_cmp(&a.ai_score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}

pub fn build_report(
    scope: Option<&str>,
    generated_at: DateTime<Utc>,
    candidates: &[Candidate],
    transitions: &[StatusHistoryEntry],
) -> String {
    let summary = summarize(candidates);
    let mut output = String::new();

    let _ = writeln!(output, "# Recruitment Pipeline Report");
    let _ = writeln!(
        output,
        "Generated for {} on {}",
        scope.unwrap_or("all jobs"),
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Pipeline");

    if summary.total == 0 {
        let _ = writeln!(output, "No applications recorded.");
    } else {
        let _ = writeln!(output, "{} applications", summary.total);
        for entry in summary.by_status.iter() {
            let _ = writeln!(output, "- {}: {}", entry.label, entry.count);
        }
        match summary.average_ai_score {
            Some(avg) => {
                let _ = writeln!(output, "Average AI score: {avg:.1}");
            }
            None => {
                let _ = writeln!(output, "No AI evaluations yet.");
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Candidates");

    let top = top_by_ai_score(candidates, 10);
    if top.is_empty() {
        let _ = writeln!(output, "No evaluated candidates.");
    } else {
        for candidate in top {
            let _ = writeln!(
                output,
                "- {} ({}) score {:.1}, {}",
                candidate.full_name,
                candidate.email,
                candidate.ai_score.unwrap_or_default(),
                style(candidate.status).label
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Transitions");

    if transitions.is_empty() {
        let _ = writeln!(output, "No status changes recorded.");
    } else {
        for entry in transitions.iter().take(10) {
            let from = entry
                .previous_status
                .as_deref()
                .map(|code| describe(code).label)
                .unwrap_or_else(|| "-".into());
            let phase = entry
                .new_phase
                .as_deref()
                .map(describe_phase)
                .unwrap_or_else(|| "-".into());
            let _ = writeln!(
                output,
                "- {} {} -> {} [{}]: {}",
                entry.created_at.format("%Y-%m-%d %H:%M"),
                from,
                describe(&entry.new_status).label,
                phase,
                entry.reason.as_deref().unwrap_or("")
            );
        }
    }

    let mismatched: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| !is_consistent(c.status, c.phase))
        .collect();
    if !mismatched.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Status/Phase Mismatches");
        for candidate in mismatched {
            let _ = writeln!(
                output,
                "- {} ({}): status {} in phase {}",
                candidate.full_name, candidate.id, candidate.status, candidate.phase
            );
        }
    }

    output
}
