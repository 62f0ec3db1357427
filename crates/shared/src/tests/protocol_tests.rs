use super::*;
use crate::error::ApiError;

const TOPIC_PAGE: &str = r#"{
    "content": [{
        "id": 7,
        "title": "Soil microbiome survey",
        "status": "PENDING",
        "sessionStatus": "UNDER_REVIEW",
        "createdAt": "2024-03-01T09:30:00",
        "studentLeaderName": "Le Van A",
        "pendingMembers": [{"id": 12, "name": "Tran B", "username": "tranb"}]
    }],
    "totalElements": 1,
    "totalPages": 1,
    "page": 0,
    "size": 10
}"#;

#[test]
fn decodes_topic_page_envelope() {
    let page: Page<TopicRegistration> = serde_json::from_str(TOPIC_PAGE).expect("page");
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.total_pages, 1);
    let topic = &page.content[0];
    assert_eq!(topic.id, TopicId(7));
    assert_eq!(topic.status, TopicStatus::Pending);
    assert_eq!(topic.session_status, Some(SessionStatus::UnderReview));
    assert_eq!(topic.pending_members.len(), 1);
    assert!(topic.approved_members.is_empty());
    assert_eq!(topic.pending_members[0].username.as_deref(), Some("tranb"));
}

#[test]
fn decodes_approved_topic_with_legacy_cancel_spelling() {
    let raw = r#"{
        "id": 3,
        "code": "",
        "status": "CANCELLED",
        "createdAt": "2024-05-02T08:00:00.123",
        "topic": {
            "id": 7,
            "title": "Soil microbiome survey",
            "status": "APPROVED",
            "createdAt": "2024-03-01T09:30:00"
        }
    }"#;
    let topic: ApprovedTopic = serde_json::from_str(raw).expect("approved topic");
    assert_eq!(topic.status, ApprovedTopicStatus::Canceled);
    assert_eq!(topic.topic.status, TopicStatus::Approved);
    assert!(topic.code.is_empty());
}

#[test]
fn update_request_keeps_fields_and_swaps_status() {
    let raw = r#"{
        "id": 3,
        "code": "DT-2024-01",
        "prize": "Second",
        "status": "IN_PROGRESS",
        "createdAt": "2024-05-02T08:00:00",
        "topic": {"id": 7, "title": "t", "status": "APPROVED", "createdAt": "2024-03-01T09:30:00"}
    }"#;
    let topic: ApprovedTopic = serde_json::from_str(raw).expect("approved topic");
    let request = UpdateApprovedTopicRequest::with_status(&topic, ApprovedTopicStatus::Completed);
    let json = serde_json::to_value(&request).expect("json");
    assert_eq!(json["code"], "DT-2024-01");
    assert_eq!(json["prize"], "Second");
    assert_eq!(json["status"], "COMPLETED");
    assert!(json.get("fieldResearch").is_none());
}

#[test]
fn api_error_ignores_blank_messages() {
    let err: ApiError = serde_json::from_str(r#"{"message": "   "}"#).expect("body");
    assert_eq!(err.user_message(), None);
    let err: ApiError =
        serde_json::from_str(r#"{"message": "Topic already approved"}"#).expect("body");
    assert_eq!(err.user_message(), Some("Topic already approved"));
}
