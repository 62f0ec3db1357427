use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{
    AcademicYearId, AcademicYearStatus, AnnouncementId, ApprovedTopicId, ApprovedTopicStatus,
    DepartmentId, DocumentId, DocumentType, Role, SessionStatus, TopicId, TopicStatus, UserId,
    YearSessionId,
};

/// Envelope shared by every list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            content: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            page: None,
            size: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub username: String,
}

/// A faculty. Sessions and topics belong to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: DepartmentId,
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentRequest {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicYear {
    pub id: AcademicYearId,
    pub year: i32,
    pub status: AcademicYearStatus,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAcademicYearRequest {
    pub year: i32,
    pub status: AcademicYearStatus,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAcademicYearRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AcademicYearStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSession {
    pub id: YearSessionId,
    pub academic_year_id: AcademicYearId,
    pub department_id: DepartmentId,
    #[serde(default)]
    pub department_name: String,
    #[serde(default)]
    pub year: Option<i32>,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_year_status: Option<AcademicYearStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateYearSessionRequest {
    pub academic_year_id: AcademicYearId,
    pub department_id: DepartmentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateYearSessionRequest {
    pub status: SessionStatus,
}

/// A student, advisor or join requester attached to a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSummary {
    pub id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRegistration {
    pub id: TopicId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub status: TopicStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_status: Option<ApprovedTopicStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_status: Option<SessionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_type: Option<String>,
    #[serde(rename = "createdAt")]
    pub submitted_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisor_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisor_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_leader_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_leader_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_leader_email: Option<String>,
    #[serde(default)]
    pub pending_members: Vec<MemberSummary>,
    #[serde(default)]
    pub approved_members: Vec<MemberSummary>,
    #[serde(default)]
    pub rejected_members: Vec<MemberSummary>,
    #[serde(default)]
    pub advisors: Vec<MemberSummary>,
}

/// Editable fields of a registration. Field names follow the backend's
/// update contract, which differs from the read model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTopicRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTopicStatusRequest {
    pub status: TopicStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Names one user: member decisions and advisor or leader assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDecisionRequest {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeTopicRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisor_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_year_id: Option<AcademicYearId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedTopic {
    pub id: ApprovedTopicId,
    pub topic: TopicRegistration,
    #[serde(default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_research: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_research: Option<String>,
    pub status: ApprovedTopicStatus,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApprovedTopicRequest {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_research: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_research: Option<String>,
    pub status: ApprovedTopicStatus,
}

impl UpdateApprovedTopicRequest {
    /// Carries the topic's current editable fields with a new status.
    pub fn with_status(topic: &ApprovedTopic, status: ApprovedTopicStatus) -> Self {
        Self {
            code: topic.code.clone(),
            prize: topic.prize.clone(),
            field_research: topic.field_research.clone(),
            type_research: topic.type_research.clone(),
            status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedTopicDocument {
    pub id: DocumentId,
    pub document_type: DocumentType,
    pub file_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientific_article_summary: Option<String>,
    pub uploaded_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDocumentSummaryRequest {
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: AnnouncementId,
    pub title: String,
    pub content: String,
    pub publish_datetime: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementRequest {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<DepartmentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_year_id: Option<AcademicYearId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<DepartmentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Body of both user create and user update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub username: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<DepartmentId>,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
