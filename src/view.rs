use chrono::{DateTime, Duration, Utc};
use std::fmt::Write;

use crate::models::session::{SessionStatus, VotingSession};

pub fn share_percent(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 * 100.0 / total as f64
}

/// `1d 02:03:04` style countdown; zero once elapsed.
pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.num_seconds().max(0);
    let (days, rest) = (secs / 86_400, secs % 86_400);
    let (h, m, s) = (rest / 3600, rest % 3600 / 60, rest % 60);
    if days > 0 {
        format!("{days}d {h:02}:{m:02}:{s:02}")
    } else {
        format!("{h:02}:{m:02}:{s:02}")
    }
}

pub fn render_summary(session: &VotingSession, now: DateTime<Utc>) -> String {
    if session.is_empty() {
        return "No voting session.\n".to_owned();
    }

    let mut out = String::new();
    let status = session.status_at(now);
    let _ = writeln!(out, "{} (#{})", session.title, session.id);
    let _ = writeln!(
        out,
        "Status: {}",
        status.map(|s| s.as_str()).unwrap_or("unscheduled")
    );
    match (status, session.start_time, session.end_time) {
        (Some(SessionStatus::Pending), Some(start), _) => {
            let _ = writeln!(out, "Starts in {}", format_countdown(start - now));
        }
        (Some(SessionStatus::Ongoing), _, Some(end)) => {
            let _ = writeln!(out, "Ends in {}", format_countdown(end - now));
        }
        _ => {}
    }

    let _ = writeln!(out, "Total votes: {}", session.vote_count);
    for c in &session.candidates {
        let _ = writeln!(
            out,
            "  {:>2}. {} - {}: {} ({:.1}%)",
            c.id,
            c.party,
            c.name,
            c.vote_count,
            share_percent(c.vote_count, session.vote_count)
        );
    }
    out
}
