use chrono::{DateTime, Utc};

use crate::backend::CandidateMessage;

/// Decision taken for one candidate message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Delete,
    KeepNoVideo,
    KeepReacted,
    KeepRecent,
}

impl Verdict {
    pub fn is_delete(self) -> bool {
        matches!(self, Self::Delete)
    }

    pub fn reason(self) -> &'static str {
        match self {
            Self::Delete => "eligible",
            Self::KeepNoVideo => "no video",
            Self::KeepReacted => "has reactions",
            Self::KeepRecent => "within retention window",
        }
    }
}

/// Deletable iff the message has a video, no reactions, and is strictly
/// older than `cutoff`.
pub fn evaluate(message: &CandidateMessage, cutoff: DateTime<Utc>) -> Verdict {
    if !message.has_video {
        Verdict::KeepNoVideo
    } else if message.has_reactions() {
        Verdict::KeepReacted
    } else if message.date >= cutoff {
        Verdict::KeepRecent
    } else {
        Verdict::Delete
    }
}
