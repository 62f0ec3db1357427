//! Labels and colour tones for status badges.

use serde::Serialize;
use shared::domain::{AcademicYearStatus, ApprovedTopicStatus, SessionStatus, TopicStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Amber,
    Blue,
    Rose,
    Emerald,
    Orange,
    Red,
    Yellow,
    Green,
    Gray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: &'static str,
    pub tone: Tone,
}

const fn badge(label: &'static str, tone: Tone) -> Badge {
    Badge { label, tone }
}

pub fn topic(status: TopicStatus) -> Badge {
    match status {
        TopicStatus::Pending => badge("Pending review", Tone::Amber),
        TopicStatus::NeedsUpdate => badge("Needs update", Tone::Blue),
        TopicStatus::Rejected => badge("Rejected", Tone::Rose),
        TopicStatus::Approved => badge("Approved", Tone::Emerald),
        TopicStatus::Canceled => badge("Canceled", Tone::Gray),
    }
}

pub fn approved_topic(status: ApprovedTopicStatus) -> Badge {
    match status {
        ApprovedTopicStatus::InProgress => badge("In progress", Tone::Blue),
        ApprovedTopicStatus::Completed => badge("Completed", Tone::Emerald),
        ApprovedTopicStatus::NotCompleted => badge("Not completed", Tone::Orange),
        ApprovedTopicStatus::Canceled => badge("Canceled", Tone::Red),
    }
}

pub fn session(status: SessionStatus) -> Badge {
    match status {
        SessionStatus::OnRegistration => badge("Registration open", Tone::Blue),
        SessionStatus::UnderReview => badge("Under review", Tone::Yellow),
        SessionStatus::InProgress => badge("In progress", Tone::Green),
        SessionStatus::Completed => badge("Completed", Tone::Gray),
    }
}

pub fn academic_year(status: AcademicYearStatus) -> Badge {
    match status {
        AcademicYearStatus::Start => badge("Started", Tone::Blue),
        AcademicYearStatus::End => badge("Ended", Tone::Orange),
    }
}

pub fn active(is_active: bool) -> Badge {
    if is_active {
        badge("Enabled", Tone::Green)
    } else {
        badge("Disabled", Tone::Gray)
    }
}
