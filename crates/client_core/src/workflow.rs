//! Mutations that go through the status gate first.
//!
//! Each function asks the gate before touching the network; a denial comes
//! back as [`ClientError::Denied`] and nothing is sent.

use shared::{
    domain::{DocumentId, DocumentType, SessionStatus, TopicId, UserId},
    protocol::{
        ApprovedTopic, ApprovedTopicDocument, ProposeTopicRequest, TopicRegistration,
        UpdateApprovedTopicRequest, UpdateTopicStatusRequest,
    },
};
use status_gate::{
    execution_decision, member_decision, next_approved_status, next_topic_status,
    proposal_decision, review_decision, upload_decision, DenialReason, ExecutionAction,
    ExecutionSubject, MemberAction, ReviewAction,
};
use tracing::{info, warn};

use crate::{
    academic_year::{fetch_session_status, SessionScope},
    api::{DocumentUpload, ResearchHubClient},
    error::{ClientError, Result},
};

/// Applies a review decision and returns the registration as the server
/// now has it. The session status comes from the topic itself; only when
/// the backend omits it is `scope` used to look the session up, and a
/// topic with no resolvable session is denied. If the server refuses, the
/// local copy is refetched before the error is returned.
pub async fn review_topic(
    client: &ResearchHubClient,
    topic_id: TopicId,
    action: ReviewAction,
    feedback: Option<&str>,
    scope: Option<SessionScope>,
) -> Result<TopicRegistration> {
    let topic = client.get_topic(topic_id).await?;
    let session = topic_session(client, &topic, scope).await?;
    review_decision(action, topic.status, session).into_result()?;
    let target = next_topic_status(topic.status, action)
        .ok_or(DenialReason::TopicLocked(topic.status))?;

    let request = UpdateTopicStatusRequest {
        status: target,
        feedback: feedback
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string),
    };
    if let Err(err) = client.update_topic_status(topic_id, &request).await {
        warn!(%topic_id, ?action, error = %err, "review rejected by server");
        resync(client, topic_id).await;
        return Err(err);
    }

    info!(%topic_id, from = %topic.status, to = %request.status, "topic reviewed");
    client.get_topic(topic_id).await
}

/// Approves or rejects one pending join request.
pub async fn decide_member(
    client: &ResearchHubClient,
    topic_id: TopicId,
    user_id: UserId,
    action: MemberAction,
) -> Result<TopicRegistration> {
    let topic = client.get_topic(topic_id).await?;
    member_decision(topic.status).into_result()?;
    if !topic.pending_members.iter().any(|member| member.id == user_id) {
        return Err(ClientError::Validation(format!(
            "user {user_id} has no pending request on topic {topic_id}"
        )));
    }

    let outcome = match action {
        MemberAction::Approve => client.approve_member(topic_id, user_id).await,
        MemberAction::Reject => client.reject_member(topic_id, user_id).await,
    };
    if let Err(err) = outcome {
        warn!(%topic_id, %user_id, ?action, error = %err, "member decision rejected by server");
        resync(client, topic_id).await;
        return Err(err);
    }

    info!(%topic_id, %user_id, ?action, "member decision applied");
    client.get_topic(topic_id).await
}

/// Moves an approved topic out of `IN_PROGRESS`.
pub async fn execute(
    client: &ResearchHubClient,
    topic: &ApprovedTopic,
    action: ExecutionAction,
    session: Option<SessionStatus>,
) -> Result<ApprovedTopic> {
    execution_decision(action, &ExecutionSubject::from(topic), session).into_result()?;

    let target = next_approved_status(topic.status, action)
        .ok_or(DenialReason::TopicFinished(topic.status))?;
    let updated = client
        .update_approved_topic(topic.id, &UpdateApprovedTopicRequest::with_status(topic, target))
        .await?;
    info!(approved_topic_id = %topic.id, to = %target, "approved topic updated");
    Ok(updated)
}

pub async fn complete_topic(
    client: &ResearchHubClient,
    topic: &ApprovedTopic,
    session: Option<SessionStatus>,
) -> Result<ApprovedTopic> {
    execute(client, topic, ExecutionAction::Complete, session).await
}

pub async fn cancel_topic(
    client: &ResearchHubClient,
    topic: &ApprovedTopic,
    session: Option<SessionStatus>,
) -> Result<ApprovedTopic> {
    execute(client, topic, ExecutionAction::Cancel, session).await
}

pub async fn mark_not_completed(
    client: &ResearchHubClient,
    topic: &ApprovedTopic,
    session: Option<SessionStatus>,
) -> Result<ApprovedTopic> {
    execute(client, topic, ExecutionAction::MarkNotCompleted, session).await
}

/// Submits a report for an approved topic. Scientific articles need a
/// summary; the other report types do not.
pub async fn upload_document(
    client: &ResearchHubClient,
    topic: &ApprovedTopic,
    document_type: DocumentType,
    filename: &str,
    bytes: Vec<u8>,
    summary: Option<&str>,
) -> Result<ApprovedTopicDocument> {
    upload_decision(topic.status, document_type, summary).into_result()?;
    if bytes.is_empty() {
        return Err(ClientError::Validation(format!("{filename} is empty")));
    }

    let document = client
        .upload_document(DocumentUpload {
            topic_id: topic.topic.id,
            document_type,
            filename: filename.to_string(),
            bytes,
            summary: summary.map(str::trim).map(str::to_string),
        })
        .await?;
    info!(
        approved_topic_id = %topic.id,
        document_id = %document.id,
        document_type = %document_type,
        "document uploaded"
    );
    Ok(document)
}

pub async fn update_document_summary(
    client: &ResearchHubClient,
    document_id: DocumentId,
    summary: &str,
) -> Result<ApprovedTopicDocument> {
    let summary = summary.trim();
    if summary.is_empty() {
        return Err(DenialReason::SummaryRequired.into());
    }
    client.update_document_summary(document_id, summary).await
}

/// Registers a new topic while the department's registration is open.
pub async fn propose_topic(
    client: &ResearchHubClient,
    proposal: &ProposeTopicRequest,
    session: Option<SessionStatus>,
) -> Result<()> {
    proposal_decision(session).into_result()?;
    if proposal.title.trim().is_empty() {
        return Err(ClientError::Validation("title is required".to_string()));
    }
    client.propose_topic(proposal).await?;
    info!(title = %proposal.title, "topic proposed");
    Ok(())
}

/// Asks to join a topic as a student member. Allowed only while the
/// topic's session is open for registration.
pub async fn join_topic(
    client: &ResearchHubClient,
    topic_id: TopicId,
    scope: Option<SessionScope>,
) -> Result<()> {
    let topic = client.get_topic(topic_id).await?;
    let session = topic_session(client, &topic, scope).await?;
    proposal_decision(session).into_result()?;
    client.register_topic(topic_id).await?;
    info!(%topic_id, "join request sent");
    Ok(())
}

/// Session status governing `topic`: the one the backend reports on the
/// topic, else the one `scope` resolves to.
pub async fn topic_session(
    client: &ResearchHubClient,
    topic: &TopicRegistration,
    scope: Option<SessionScope>,
) -> Result<Option<SessionStatus>> {
    match (topic.session_status, scope) {
        (Some(status), _) => Ok(Some(status)),
        (None, Some(scope)) => fetch_session_status(client, scope).await,
        (None, None) => Ok(None),
    }
}

async fn resync(client: &ResearchHubClient, topic_id: TopicId) {
    match client.get_topic(topic_id).await {
        Ok(fresh) => info!(%topic_id, status = %fresh.status, "topic resynced"),
        Err(err) => warn!(%topic_id, error = %err, "failed to resync topic after rejection"),
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
