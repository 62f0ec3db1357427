//! Typed access to the ResearchHub REST backend.

use std::time::Duration;

use reqwest::{
    multipart::{Form, Part},
    Client, RequestBuilder, Response,
};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{
        AcademicYearId, AnnouncementId, ApprovedTopicId, ApprovedTopicStatus, DepartmentId,
        DocumentId, DocumentType, Role, SessionStatus, TopicId, TopicStatus, UserId,
        YearSessionId,
    },
    error::ApiError,
    protocol::{
        AcademicYear, Announcement, AnnouncementRequest, ApprovedTopic, ApprovedTopicDocument,
        ChangePasswordRequest, CreateAcademicYearRequest, CreateYearSessionRequest, Department,
        DepartmentRequest, ForgotPasswordRequest, LoginRequest, LoginResponse,
        MemberDecisionRequest, Page, ProposeTopicRequest, TopicRegistration,
        UpdateAcademicYearRequest, UpdateApprovedTopicRequest, UpdateDocumentSummaryRequest,
        UpdateTopicRequest, UpdateTopicStatusRequest, UpdateYearSessionRequest, User,
        UserRequest, YearSession,
    },
};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ClientError, Result};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicYearQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    pub page: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DepartmentQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    pub page: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSessionQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<DepartmentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
    pub page: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TopicStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<DepartmentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year_id: Option<AcademicYearId>,
    pub page: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedTopicQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ApprovedTopicStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<DepartmentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year_id: Option<AcademicYearId>,
    pub page: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year_id: Option<AcademicYearId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<DepartmentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_system: Option<bool>,
    pub page: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<DepartmentId>,
    pub page: u32,
    pub size: u32,
}

/// A report file on its way to `POST /approved-topics/upload`.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    /// Id of the registration, not of the approved-topic record.
    pub topic_id: TopicId,
    pub document_type: DocumentType,
    pub filename: String,
    pub bytes: Vec<u8>,
    pub summary: Option<String>,
}

pub struct ResearchHubClient {
    http: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ResearchHubClient {
    /// `base_url` is the API root, e.g. `http://localhost:8080/api`.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let parsed = Url::parse(base_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    pub async fn clear_token(&self) {
        *self.token.write().await = None;
    }

    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.token.read().await.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        let request = self.authorized(builder).await.build()?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "api request");
        let response = self.http.execute(request).await.map_err(|err| {
            warn!(%method, %url, error = %err, "api request failed to send");
            err
        })?;
        check_status(response).await
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        Ok(self.execute(builder).await?.json().await?)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<()> {
        self.execute(builder).await?;
        Ok(())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        self.fetch(self.http.post(self.url("/auth/login")).json(&LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }))
        .await
    }

    /// Profile of the account the current token belongs to.
    pub async fn me(&self) -> Result<User> {
        self.fetch(self.http.get(self.url("/auth/me"))).await
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<()> {
        self.send(
            self.http
                .post(self.url("/auth/change-password"))
                .json(&ChangePasswordRequest {
                    old_password: old_password.to_string(),
                    new_password: new_password.to_string(),
                }),
        )
        .await
    }

    /// Asks the backend to mail a fresh password. Needs no token.
    pub async fn forgot_password(&self, username: &str) -> Result<()> {
        self.send(
            self.http
                .post(self.url("/auth/forgot-password"))
                .json(&ForgotPasswordRequest {
                    username: username.to_string(),
                }),
        )
        .await
    }

    pub async fn list_departments(&self, query: &DepartmentQuery) -> Result<Page<Department>> {
        self.fetch(self.http.get(self.url("/departments")).query(query))
            .await
    }

    pub async fn create_department(&self, request: &DepartmentRequest) -> Result<Department> {
        self.fetch(self.http.post(self.url("/departments")).json(request))
            .await
    }

    pub async fn update_department(
        &self,
        id: DepartmentId,
        request: &DepartmentRequest,
    ) -> Result<Department> {
        self.fetch(
            self.http
                .put(self.url(&format!("/departments/{id}")))
                .json(request),
        )
        .await
    }

    pub async fn list_academic_years(&self, query: &AcademicYearQuery) -> Result<Page<AcademicYear>> {
        self.fetch(self.http.get(self.url("/academic-years")).query(query))
            .await
    }

    pub async fn create_academic_year(
        &self,
        request: &CreateAcademicYearRequest,
    ) -> Result<AcademicYear> {
        self.fetch(self.http.post(self.url("/academic-years")).json(request))
            .await
    }

    pub async fn update_academic_year(
        &self,
        id: AcademicYearId,
        request: &UpdateAcademicYearRequest,
    ) -> Result<AcademicYear> {
        self.fetch(
            self.http
                .put(self.url(&format!("/academic-years/{id}")))
                .json(request),
        )
        .await
    }

    pub async fn list_year_sessions(&self, query: &YearSessionQuery) -> Result<Page<YearSession>> {
        self.fetch(self.http.get(self.url("/year-sessions")).query(query))
            .await
    }

    pub async fn create_year_session(
        &self,
        request: &CreateYearSessionRequest,
    ) -> Result<YearSession> {
        self.fetch(self.http.post(self.url("/year-sessions")).json(request))
            .await
    }

    pub async fn update_year_session(
        &self,
        id: YearSessionId,
        status: SessionStatus,
    ) -> Result<YearSession> {
        self.fetch(
            self.http
                .put(self.url(&format!("/year-sessions/{id}")))
                .json(&UpdateYearSessionRequest { status }),
        )
        .await
    }

    pub async fn delete_year_session(&self, id: YearSessionId) -> Result<()> {
        self.send(self.http.delete(self.url(&format!("/year-sessions/{id}"))))
            .await
    }

    pub async fn list_topics(&self, query: &TopicQuery) -> Result<Page<TopicRegistration>> {
        self.fetch(self.http.get(self.url("/topics")).query(query))
            .await
    }

    pub async fn get_topic(&self, id: TopicId) -> Result<TopicRegistration> {
        self.fetch(self.http.get(self.url(&format!("/topics/{id}"))))
            .await
    }

    pub async fn update_topic(&self, id: TopicId, request: &UpdateTopicRequest) -> Result<()> {
        self.send(
            self.http
                .put(self.url(&format!("/topics/{id}")))
                .json(request),
        )
        .await
    }

    /// Topics the signed-in user is a member of, in any role.
    pub async fn my_topics(&self) -> Result<Vec<TopicRegistration>> {
        self.fetch(self.http.get(self.url("/topics/my-topics")))
            .await
    }

    /// Files a join request; it shows up in the topic's pending members.
    pub async fn register_topic(&self, id: TopicId) -> Result<()> {
        self.send(self.http.post(self.url(&format!("/topics/{id}/register"))))
            .await
    }

    pub async fn assign_advisor(&self, id: TopicId, user_id: UserId) -> Result<()> {
        self.send(
            self.http
                .put(self.url(&format!("/topics/{id}/assign-advisor")))
                .json(&MemberDecisionRequest { user_id }),
        )
        .await
    }

    pub async fn assign_leader(&self, id: TopicId, user_id: UserId) -> Result<()> {
        self.send(
            self.http
                .put(self.url(&format!("/topics/{id}/assign-leader")))
                .json(&MemberDecisionRequest { user_id }),
        )
        .await
    }

    pub async fn update_topic_status(
        &self,
        id: TopicId,
        request: &UpdateTopicStatusRequest,
    ) -> Result<()> {
        self.send(
            self.http
                .put(self.url(&format!("/topics/{id}/status")))
                .json(request),
        )
        .await
    }

    pub async fn approve_member(&self, id: TopicId, user_id: UserId) -> Result<()> {
        self.send(
            self.http
                .post(self.url(&format!("/topics/{id}/members/approve")))
                .json(&MemberDecisionRequest { user_id }),
        )
        .await
    }

    pub async fn reject_member(&self, id: TopicId, user_id: UserId) -> Result<()> {
        self.send(
            self.http
                .post(self.url(&format!("/topics/{id}/members/reject")))
                .json(&MemberDecisionRequest { user_id }),
        )
        .await
    }

    pub async fn propose_topic(&self, request: &ProposeTopicRequest) -> Result<()> {
        self.send(self.http.post(self.url("/topics")).json(request))
            .await
    }

    pub async fn list_approved_topics(
        &self,
        query: &ApprovedTopicQuery,
    ) -> Result<Page<ApprovedTopic>> {
        self.fetch(self.http.get(self.url("/approved-topics")).query(query))
            .await
    }

    pub async fn update_approved_topic(
        &self,
        id: ApprovedTopicId,
        request: &UpdateApprovedTopicRequest,
    ) -> Result<ApprovedTopic> {
        self.fetch(
            self.http
                .put(self.url(&format!("/approved-topics/{id}")))
                .json(request),
        )
        .await
    }

    pub async fn list_documents(&self, id: ApprovedTopicId) -> Result<Vec<ApprovedTopicDocument>> {
        self.fetch(
            self.http
                .get(self.url(&format!("/approved-topics/{id}/documents"))),
        )
        .await
    }

    pub async fn list_documents_for_topic(
        &self,
        topic_id: TopicId,
    ) -> Result<Vec<ApprovedTopicDocument>> {
        self.fetch(
            self.http
                .get(self.url(&format!("/approved-topics/by-topic/{topic_id}/documents"))),
        )
        .await
    }

    /// Uploading a type the topic already has replaces the earlier file.
    pub async fn upload_document(&self, upload: DocumentUpload) -> Result<ApprovedTopicDocument> {
        let mut form = Form::new()
            .text("topicId", upload.topic_id.to_string())
            .text("type", upload.document_type.as_str())
            .part("file", Part::bytes(upload.bytes).file_name(upload.filename));
        if let Some(summary) = upload.summary.filter(|s| !s.trim().is_empty()) {
            form = form.text("summary", summary);
        }
        self.fetch(
            self.http
                .post(self.url("/approved-topics/upload"))
                .multipart(form),
        )
        .await
    }

    pub async fn update_document_summary(
        &self,
        id: DocumentId,
        summary: &str,
    ) -> Result<ApprovedTopicDocument> {
        self.fetch(
            self.http
                .put(self.url(&format!("/approved-topics/documents/{id}/summary")))
                .json(&UpdateDocumentSummaryRequest {
                    summary: summary.to_string(),
                }),
        )
        .await
    }

    pub async fn delete_document(&self, id: DocumentId) -> Result<()> {
        self.send(
            self.http
                .delete(self.url(&format!("/approved-topics/documents/{id}"))),
        )
        .await
    }

    pub async fn list_announcements(&self, query: &AnnouncementQuery) -> Result<Page<Announcement>> {
        self.fetch(self.http.get(self.url("/announcements")).query(query))
            .await
    }

    pub async fn create_announcement(&self, request: &AnnouncementRequest) -> Result<Announcement> {
        self.fetch(self.http.post(self.url("/announcements")).json(request))
            .await
    }

    pub async fn update_announcement(
        &self,
        id: AnnouncementId,
        request: &AnnouncementRequest,
    ) -> Result<Announcement> {
        self.fetch(
            self.http
                .put(self.url(&format!("/announcements/{id}")))
                .json(request),
        )
        .await
    }

    pub async fn delete_announcement(&self, id: AnnouncementId) -> Result<()> {
        self.send(self.http.delete(self.url(&format!("/announcements/{id}"))))
            .await
    }

    pub async fn list_users(&self, query: &UserQuery) -> Result<Page<User>> {
        self.fetch(self.http.get(self.url("/admin/users")).query(query))
            .await
    }

    pub async fn create_user(&self, request: &UserRequest) -> Result<User> {
        self.fetch(self.http.post(self.url("/admin/users")).json(request))
            .await
    }

    pub async fn update_user(&self, id: UserId, request: &UserRequest) -> Result<User> {
        self.fetch(
            self.http
                .put(self.url(&format!("/admin/users/{id}")))
                .json(request),
        )
        .await
    }

    pub async fn reset_password(&self, id: UserId) -> Result<User> {
        self.fetch(
            self.http
                .post(self.url(&format!("/admin/users/{id}/reset-password"))),
        )
        .await
    }
}

/// Turns a non-success response into [`ClientError::Api`], keeping the
/// body's `message` when the backend sent one.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .ok()
        .and_then(|err| err.user_message().map(str::to_string));
    warn!(%status, %url, message = message.as_deref().unwrap_or(""), "api request rejected");
    Err(ClientError::api(status, message))
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
