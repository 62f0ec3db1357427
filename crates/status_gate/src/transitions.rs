use shared::{
    domain::{ApprovedTopicStatus, TopicId, TopicStatus},
    protocol::TopicRegistration,
};

use crate::{ExecutionAction, ReviewAction};

/// Registration status after a reviewer acts, or `None` when the
/// registration cannot take that transition.
pub fn next_topic_status(current: TopicStatus, action: ReviewAction) -> Option<TopicStatus> {
    match current {
        TopicStatus::Pending => Some(action.target_status()),
        _ => None,
    }
}

/// A registration sent back for changes returns to review once resubmitted.
pub fn resubmitted(current: TopicStatus) -> Option<TopicStatus> {
    match current {
        TopicStatus::NeedsUpdate => Some(TopicStatus::Pending),
        _ => None,
    }
}

pub fn next_approved_status(
    current: ApprovedTopicStatus,
    action: ExecutionAction,
) -> Option<ApprovedTopicStatus> {
    match current {
        ApprovedTopicStatus::InProgress => Some(action.target_status()),
        _ => None,
    }
}

/// Shape of the execution-tracking record an approved registration turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovedProjection {
    pub topic_id: TopicId,
    pub status: ApprovedTopicStatus,
}

pub fn project_approved(registration: &TopicRegistration) -> Option<ApprovedProjection> {
    (registration.status == TopicStatus::Approved).then_some(ApprovedProjection {
        topic_id: registration.id,
        status: ApprovedTopicStatus::InProgress,
    })
}
