//! Rendering of batch reports

use crate::batch::{BatchReport, TaskReport};
use tally_application::VerificationOutcome;

pub fn format_json(report: &BatchReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

pub fn format_text(report: &BatchReport) -> String {
    let mut lines = Vec::new();

    for task in &report.seeded {
        lines.push(format!(
            "seeded #{} {} {}",
            task.id, task.task_type, task.params
        ));
    }

    for task in &report.tasks {
        lines.push(format_task(task));
        for rejected in &task.rejected_submissions {
            lines.push(format!("    rejected submission: {}", rejected));
        }
    }

    let verified = report
        .tasks
        .iter()
        .filter(|t| t.outcome.as_ref().is_some_and(|o| o.is_verified()))
        .count();
    lines.push(format!(
        "{} of {} tasks verified",
        verified,
        report.tasks.len()
    ));

    lines.join("\n")
}

fn format_task(task: &TaskReport) -> String {
    let id = task
        .task_id
        .map(|id| format!("#{}", id))
        .unwrap_or_else(|| "-".to_string());
    let head = format!("{} {}", id, task.task_type);

    let body = match (&task.outcome, &task.error) {
        (_, Some(error)) => format!("error: {}", error),
        (Some(VerificationOutcome::Verified { result, follow_on }), _) => {
            let mut text = format!(
                "verified (confidence {:.2}, {} compared) {}",
                result.confidence, result.submissions, result.value
            );
            if !follow_on.is_empty() {
                let created: Vec<_> = follow_on
                    .iter()
                    .map(|t| format!("#{} {}", t.id, t.task_type))
                    .collect();
                text.push_str(&format!("; follow-on: {}", created.join(", ")));
            }
            text
        }
        (Some(VerificationOutcome::Rejected { confidence, compared }), _) => {
            format!("rejected (confidence {:.2}, {} compared)", confidence, compared)
        }
        (Some(VerificationOutcome::Insufficient { have, need }), _) => {
            format!("insufficient ({} of {} submissions)", have, need)
        }
        (Some(VerificationOutcome::AlreadyVerified { .. }), _) => "already verified".to_string(),
        (None, None) => "not verified".to_string(),
    };

    match &task.replay {
        Some(replay) => format!("{}: {} [replay: {}]", head, body, replay),
        None => format!("{}: {}", head, body),
    }
}
