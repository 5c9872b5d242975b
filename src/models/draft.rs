use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

pub const MIN_CANDIDATES: usize = 2;
const MIN_TITLE_LEN: usize = 3;

/// An image picked in the creation form, not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn extension(&self) -> &str {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or("bin")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateDraft {
    pub name: String,
    pub party: String,
    pub image: Option<ImageFile>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DraftIssue {
    pub field: String,
    pub message: String,
}

impl DraftIssue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// In-progress admin input for a new session. Discarded unless submitted.
#[derive(Debug, Clone, Default)]
pub struct SessionDraft {
    pub title: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub candidates: Vec<CandidateDraft>,
}

impl SessionDraft {
    /// Blank draft sized from the store's staging count.
    pub fn with_count(count: usize) -> Self {
        Self {
            candidates: vec![CandidateDraft::default(); count.max(MIN_CANDIDATES)],
            ..Default::default()
        }
    }

    pub fn add_candidate(&mut self, max: usize) -> bool {
        if self.candidates.len() >= max {
            return false;
        }
        self.candidates.push(CandidateDraft::default());
        true
    }

    pub fn remove_candidate(&mut self) -> bool {
        if self.candidates.len() <= MIN_CANDIDATES {
            return false;
        }
        self.candidates.pop();
        true
    }

    pub fn validate(&self, now: DateTime<Utc>, max_candidates: usize) -> Vec<DraftIssue> {
        let mut issues = Vec::new();

        if self.title.trim().chars().count() < MIN_TITLE_LEN {
            issues.push(DraftIssue::new(
                "title",
                "Title must be at least 3 characters",
            ));
        }

        match (self.start, self.end) {
            (Some(start), Some(end)) => {
                if start >= end {
                    issues.push(DraftIssue::new(
                        "endTime",
                        "End time must be after start time",
                    ));
                }
                if start <= now {
                    issues.push(DraftIssue::new(
                        "startTime",
                        "Start time must be in the future",
                    ));
                }
            }
            (start, end) => {
                if start.is_none() {
                    issues.push(DraftIssue::new("startTime", "Start time is required"));
                }
                if end.is_none() {
                    issues.push(DraftIssue::new("endTime", "End time is required"));
                }
            }
        }

        if self.candidates.len() < MIN_CANDIDATES {
            issues.push(DraftIssue::new("candidates", "At least 2 candidates"));
        } else if self.candidates.len() > max_candidates {
            issues.push(DraftIssue::new(
                "candidates",
                format!("At most {max_candidates} candidates"),
            ));
        }

        let mut seen: HashMap<String, usize> = HashMap::new();
        for (idx, candidate) in self.candidates.iter().enumerate() {
            let key = candidate.name.trim().to_lowercase();
            if key.is_empty() {
                issues.push(DraftIssue::new(
                    format!("candidates.{idx}.name"),
                    "Candidate name is required",
                ));
            } else if seen.contains_key(&key) {
                issues.push(DraftIssue::new(
                    format!("candidates.{idx}.name"),
                    "Candidate name must be unique",
                ));
            } else {
                seen.insert(key, idx);
            }

            if candidate.image.is_none() {
                issues.push(DraftIssue::new(
                    format!("candidates.{idx}.image"),
                    "Candidate image is required",
                ));
            }
        }

        issues
    }
}
