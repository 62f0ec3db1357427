//! Action gating for topic registrations and approved topics.
//!
//! Every check here is pure: it looks at the statuses the backend reported
//! and answers with a [`Decision`]. Nothing in this crate fails; a request
//! that makes no sense for the current statuses is simply denied.

use serde::Serialize;
use shared::{
    domain::{ApprovedTopicStatus, DocumentType, SessionStatus, TopicStatus},
    protocol::ApprovedTopic,
};
use thiserror::Error;

pub mod badge;
mod transitions;

pub use transitions::{
    next_approved_status, next_topic_status, project_approved, resubmitted,
    ApprovedProjection,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject,
    RequestUpdate,
}

impl ReviewAction {
    pub const ALL: [ReviewAction; 3] = [
        ReviewAction::Approve,
        ReviewAction::Reject,
        ReviewAction::RequestUpdate,
    ];

    /// Registration status the backend is asked to move to.
    pub fn target_status(self) -> TopicStatus {
        match self {
            ReviewAction::Approve => TopicStatus::Approved,
            ReviewAction::Reject => TopicStatus::Rejected,
            ReviewAction::RequestUpdate => TopicStatus::NeedsUpdate,
        }
    }
}

/// Decision on a student's request to join a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberAction {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionAction {
    Complete,
    MarkNotCompleted,
    Cancel,
}

impl ExecutionAction {
    pub const ALL: [ExecutionAction; 3] = [
        ExecutionAction::Complete,
        ExecutionAction::MarkNotCompleted,
        ExecutionAction::Cancel,
    ];

    pub fn target_status(self) -> ApprovedTopicStatus {
        match self {
            ExecutionAction::Complete => ApprovedTopicStatus::Completed,
            ExecutionAction::MarkNotCompleted => ApprovedTopicStatus::NotCompleted,
            ExecutionAction::Cancel => ApprovedTopicStatus::Canceled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    #[error("registration is still open for this session")]
    RegistrationOpen,
    #[error("no session found for this department and academic year")]
    NoSession,
    #[error("registration is closed for this session")]
    RegistrationClosed,
    #[error("topic is already {0}")]
    TopicLocked(TopicStatus),
    #[error("topic is waiting for the proposer to resubmit")]
    AwaitingResubmission,
    #[error("topic is already {0}")]
    TopicFinished(ApprovedTopicStatus),
    #[error("session is under review")]
    SessionUnderReview,
    #[error("code required")]
    CodeRequired,
    #[error("reports can only be submitted while the topic is in progress (currently {0})")]
    NotInProgress(ApprovedTopicStatus),
    #[error("summary required")]
    SummaryRequired,
}

impl DenialReason {
    /// Missing-input denials the user can fix by filling in a field.
    pub fn is_validation(self) -> bool {
        matches!(self, DenialReason::CodeRequired | DenialReason::SummaryRequired)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    Allowed,
    Denied(DenialReason),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allowed)
    }

    pub fn reason(self) -> Option<DenialReason> {
        match self {
            Decision::Allowed => None,
            Decision::Denied(reason) => Some(reason),
        }
    }

    pub fn into_result(self) -> Result<(), DenialReason> {
        match self {
            Decision::Allowed => Ok(()),
            Decision::Denied(reason) => Err(reason),
        }
    }

    fn and_then(self, next: impl FnOnce() -> Decision) -> Decision {
        match self {
            Decision::Allowed => next(),
            denied => denied,
        }
    }
}

/// Approve, reject and request-update on a registration.
///
/// Only `PENDING` registrations can be reviewed, and only once the owning
/// session has left `ON_REGISTRATION`. A missing session denies.
pub fn review_decision(
    _action: ReviewAction,
    topic: TopicStatus,
    session: Option<SessionStatus>,
) -> Decision {
    let topic_check = match topic {
        TopicStatus::Pending => Decision::Allowed,
        TopicStatus::NeedsUpdate => Decision::Denied(DenialReason::AwaitingResubmission),
        locked => Decision::Denied(DenialReason::TopicLocked(locked)),
    };

    topic_check.and_then(|| match session {
        None => Decision::Denied(DenialReason::NoSession),
        Some(SessionStatus::OnRegistration) => Decision::Denied(DenialReason::RegistrationOpen),
        Some(_) => Decision::Allowed,
    })
}

/// Join-request decisions ignore the session entirely.
pub fn member_decision(topic: TopicStatus) -> Decision {
    if topic.is_terminal() {
        Decision::Denied(DenialReason::TopicLocked(topic))
    } else {
        Decision::Allowed
    }
}

/// Proposing or registering a topic needs an open registration window.
pub fn proposal_decision(session: Option<SessionStatus>) -> Decision {
    match session {
        Some(SessionStatus::OnRegistration) => Decision::Allowed,
        Some(_) => Decision::Denied(DenialReason::RegistrationClosed),
        None => Decision::Denied(DenialReason::NoSession),
    }
}

/// The parts of an approved topic the execution rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionSubject<'a> {
    pub status: ApprovedTopicStatus,
    pub code: &'a str,
}

impl<'a> ExecutionSubject<'a> {
    pub fn new(status: ApprovedTopicStatus, code: &'a str) -> Self {
        Self { status, code }
    }
}

impl<'a> From<&'a ApprovedTopic> for ExecutionSubject<'a> {
    fn from(topic: &'a ApprovedTopic) -> Self {
        Self::new(topic.status, &topic.code)
    }
}

pub fn execution_decision(
    action: ExecutionAction,
    subject: &ExecutionSubject<'_>,
    session: Option<SessionStatus>,
) -> Decision {
    if subject.status.is_terminal() {
        return Decision::Denied(DenialReason::TopicFinished(subject.status));
    }
    if session == Some(SessionStatus::UnderReview) {
        return Decision::Denied(DenialReason::SessionUnderReview);
    }
    if action == ExecutionAction::Complete && subject.code.trim().is_empty() {
        return Decision::Denied(DenialReason::CodeRequired);
    }
    Decision::Allowed
}

/// Whether reports can be submitted at all for a topic in `status`.
pub fn upload_window(status: ApprovedTopicStatus) -> Decision {
    match status {
        ApprovedTopicStatus::InProgress => Decision::Allowed,
        other => Decision::Denied(DenialReason::NotInProgress(other)),
    }
}

pub fn upload_decision(
    status: ApprovedTopicStatus,
    document_type: DocumentType,
    summary: Option<&str>,
) -> Decision {
    upload_window(status).and_then(|| {
        let summary_missing = summary.map(str::trim).unwrap_or_default().is_empty();
        if document_type.requires_summary() && summary_missing {
            Decision::Denied(DenialReason::SummaryRequired)
        } else {
            Decision::Allowed
        }
    })
}

/// Everything a reviewer panel needs to know about one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReviewPermissions {
    pub approve: Decision,
    pub reject: Decision,
    pub request_update: Decision,
    pub member_approval: Decision,
}

impl ReviewPermissions {
    pub fn evaluate(topic: TopicStatus, session: Option<SessionStatus>) -> Self {
        Self {
            approve: review_decision(ReviewAction::Approve, topic, session),
            reject: review_decision(ReviewAction::Reject, topic, session),
            request_update: review_decision(ReviewAction::RequestUpdate, topic, session),
            member_approval: member_decision(topic),
        }
    }

    pub fn for_action(&self, action: ReviewAction) -> Decision {
        match action {
            ReviewAction::Approve => self.approve,
            ReviewAction::Reject => self.reject,
            ReviewAction::RequestUpdate => self.request_update,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExecutionPermissions {
    pub complete: Decision,
    pub mark_not_completed: Decision,
    pub cancel: Decision,
    pub upload: Decision,
}

impl ExecutionPermissions {
    pub fn evaluate(subject: &ExecutionSubject<'_>, session: Option<SessionStatus>) -> Self {
        Self {
            complete: execution_decision(ExecutionAction::Complete, subject, session),
            mark_not_completed: execution_decision(
                ExecutionAction::MarkNotCompleted,
                subject,
                session,
            ),
            cancel: execution_decision(ExecutionAction::Cancel, subject, session),
            upload: upload_window(subject.status),
        }
    }

    pub fn for_action(&self, action: ExecutionAction) -> Decision {
        match action {
            ExecutionAction::Complete => self.complete,
            ExecutionAction::MarkNotCompleted => self.mark_not_completed,
            ExecutionAction::Cancel => self.cancel,
        }
    }

    pub fn all_denied(&self) -> bool {
        [self.complete, self.mark_not_completed, self.cancel, self.upload]
            .iter()
            .all(|decision| !decision.is_allowed())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
