use super::*;
use crate::test_support::{page_json, registration_json, spawn_backend, HitCounter};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;

#[tokio::test]
async fn login_posts_credentials_and_decodes_token() {
    let app = Router::new().route(
        "/api/auth/login",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["username"], "lan");
            assert_eq!(body["password"], "secret");
            Json(json!({ "accessToken": "abc.def.ghi", "tokenType": "Bearer" }))
        }),
    );
    let client = ResearchHubClient::new(&spawn_backend(app).await).expect("client");

    let response = client.login("lan", "secret").await.expect("login");
    assert_eq!(response.access_token, "abc.def.ghi");
}

#[tokio::test]
async fn list_requests_carry_bearer_and_camel_case_query() {
    let seen: Arc<Mutex<Option<(HashMap<String, String>, Option<String>)>>> =
        Arc::new(Mutex::new(None));
    let app = Router::new()
        .route(
            "/api/topics",
            get(
                |State(seen): State<Arc<Mutex<Option<(HashMap<String, String>, Option<String>)>>>>,
                 headers: HeaderMap,
                 Query(query): Query<HashMap<String, String>>| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string);
                    *seen.lock().await = Some((query, auth));
                    Json(page_json(vec![registration_json(4, "PENDING", None)]))
                },
            ),
        )
        .with_state(Arc::clone(&seen));
    let client = ResearchHubClient::new(&spawn_backend(app).await).expect("client");
    client.set_token("tok-1").await;

    let page = client
        .list_topics(&TopicQuery {
            keyword: Some("soil".to_string()),
            status: Some(TopicStatus::Pending),
            academic_year_id: Some(AcademicYearId(7)),
            page: 2,
            size: 20,
            ..TopicQuery::default()
        })
        .await
        .expect("list topics");

    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].id, TopicId(4));

    let (query, auth) = seen.lock().await.take().expect("request recorded");
    assert_eq!(query.get("keyword").map(String::as_str), Some("soil"));
    assert_eq!(query.get("status").map(String::as_str), Some("PENDING"));
    assert_eq!(query.get("academicYearId").map(String::as_str), Some("7"));
    assert_eq!(query.get("page").map(String::as_str), Some("2"));
    assert_eq!(query.get("size").map(String::as_str), Some("20"));
    assert!(!query.contains_key("departmentId"));
    assert_eq!(auth.as_deref(), Some("Bearer tok-1"));
}

#[tokio::test]
async fn server_message_is_passed_through_verbatim() {
    let app = Router::new().route(
        "/api/topics/:id/status",
        put(|Path(_id): Path<i64>| async {
            (
                StatusCode::CONFLICT,
                Json(json!({ "code": "TOPIC_LOCKED", "message": "Đề tài đã được duyệt" })),
            )
        }),
    );
    let client = ResearchHubClient::new(&spawn_backend(app).await).expect("client");

    let err = client
        .update_topic_status(
            TopicId(1),
            &UpdateTopicStatusRequest {
                status: TopicStatus::Approved,
                feedback: None,
            },
        )
        .await
        .expect_err("conflict");

    match &err {
        ClientError::Api { status, message } => {
            assert_eq!(*status, StatusCode::CONFLICT);
            assert_eq!(message.as_deref(), Some("Đề tài đã được duyệt"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.user_message(), "Đề tài đã được duyệt");
}

#[tokio::test]
async fn error_without_message_falls_back_to_generic_text() {
    let app = Router::new().route(
        "/api/year-sessions/:id",
        axum::routing::delete(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let client = ResearchHubClient::new(&spawn_backend(app).await).expect("client");

    let err = client
        .delete_year_session(YearSessionId(3))
        .await
        .expect_err("server error");

    assert!(matches!(err, ClientError::Api { message: None, .. }));
    assert_eq!(err.user_message(), crate::error::GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn unauthorized_response_counts_as_auth_failure() {
    let app = Router::new().route(
        "/api/admin/users",
        get(|| async { StatusCode::UNAUTHORIZED }),
    );
    let client = ResearchHubClient::new(&spawn_backend(app).await).expect("client");

    let err = client
        .list_users(&UserQuery::default())
        .await
        .expect_err("unauthorized");

    assert!(err.is_auth());
    assert_eq!(err.user_message(), crate::error::SESSION_EXPIRED_MESSAGE);
}

#[tokio::test]
async fn upload_sends_registration_id_type_and_summary_as_multipart() {
    let fields: Arc<Mutex<HashMap<String, String>>> = Arc::new(Mutex::new(HashMap::new()));
    let app = Router::new()
        .route(
            "/api/approved-topics/upload",
            post(
                |State(fields): State<Arc<Mutex<HashMap<String, String>>>>,
                 mut multipart: Multipart| async move {
                    while let Some(field) = multipart.next_field().await.expect("field") {
                        let name = field.name().unwrap_or_default().to_string();
                        let value = if name == "file" {
                            field.file_name().unwrap_or_default().to_string()
                        } else {
                            field.text().await.expect("text field")
                        };
                        fields.lock().await.insert(name, value);
                    }
                    Json(json!({
                        "id": 90,
                        "documentType": "SCIENTIFIC_ARTICLE",
                        "fileUrl": "/files/90.pdf",
                        "scientificArticleSummary": "Findings",
                        "uploadedAt": "2025-01-05T10:00:00",
                    }))
                },
            ),
        )
        .with_state(Arc::clone(&fields));
    let client = ResearchHubClient::new(&spawn_backend(app).await).expect("client");

    let document = client
        .upload_document(DocumentUpload {
            topic_id: TopicId(12),
            document_type: DocumentType::ScientificArticle,
            filename: "article.pdf".to_string(),
            bytes: b"%PDF".to_vec(),
            summary: Some("Findings".to_string()),
        })
        .await
        .expect("upload");

    assert_eq!(document.id, DocumentId(90));
    let fields = fields.lock().await;
    assert_eq!(fields.get("topicId").map(String::as_str), Some("12"));
    assert_eq!(fields.get("type").map(String::as_str), Some("SCIENTIFIC_ARTICLE"));
    assert_eq!(fields.get("summary").map(String::as_str), Some("Findings"));
    assert_eq!(fields.get("file").map(String::as_str), Some("article.pdf"));
}

#[tokio::test]
async fn blank_summary_is_left_out_of_the_upload_form() {
    let hits = HitCounter::default();
    let app = Router::new()
        .route(
            "/api/approved-topics/upload",
            post(|State(hits): State<HitCounter>, mut multipart: Multipart| async move {
                hits.hit();
                while let Some(field) = multipart.next_field().await.expect("field") {
                    assert_ne!(field.name(), Some("summary"));
                }
                Json(json!({
                    "id": 91,
                    "documentType": "MIDTERM_REPORT",
                    "fileUrl": "/files/91.pdf",
                    "uploadedAt": "2025-01-05T10:00:00",
                }))
            }),
        )
        .with_state(hits.clone());
    let client = ResearchHubClient::new(&spawn_backend(app).await).expect("client");

    client
        .upload_document(DocumentUpload {
            topic_id: TopicId(12),
            document_type: DocumentType::MidtermReport,
            filename: "midterm.pdf".to_string(),
            bytes: b"%PDF".to_vec(),
            summary: Some("   ".to_string()),
        })
        .await
        .expect("upload");

    assert_eq!(hits.count(), 1);
}

#[test]
fn rejects_unparseable_base_url() {
    assert!(matches!(
        ResearchHubClient::new("not a url"),
        Err(ClientError::Url(_))
    ));
}

#[test]
fn trailing_slash_is_trimmed_from_base_url() {
    let client = ResearchHubClient::new("http://localhost:8080/api/").expect("client");
    assert_eq!(client.base_url(), "http://localhost:8080/api");
}

#[tokio::test]
async fn my_topics_and_join_requests_use_their_own_routes() {
    let joined = HitCounter::default();
    let app = Router::new()
        .route(
            "/api/topics/my-topics",
            get(|| async {
                Json(json!([
                    registration_json(4, "APPROVED", Some("IN_PROGRESS")),
                    registration_json(6, "PENDING", Some("ON_REGISTRATION")),
                ]))
            }),
        )
        .route(
            "/api/topics/:id/register",
            post(|State(joined): State<HitCounter>, Path(id): Path<i64>| async move {
                assert_eq!(id, 6);
                joined.hit();
                StatusCode::OK
            }),
        )
        .with_state(joined.clone());
    let client = ResearchHubClient::new(&spawn_backend(app).await).expect("client");

    let mine = client.my_topics().await.expect("my topics");
    assert_eq!(
        mine.iter().map(|topic| topic.id).collect::<Vec<_>>(),
        vec![TopicId(4), TopicId(6)]
    );

    client.register_topic(TopicId(6)).await.expect("register");
    assert_eq!(joined.count(), 1);
}

#[tokio::test]
async fn assignments_send_the_user_id() {
    let seen: Arc<Mutex<Vec<(String, Value)>>> = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route(
            "/api/topics/:id/assign-advisor",
            put(
                |State(seen): State<Arc<Mutex<Vec<(String, Value)>>>>,
                 Json(body): Json<Value>| async move {
                    seen.lock().await.push(("advisor".to_string(), body));
                    StatusCode::OK
                },
            ),
        )
        .route(
            "/api/topics/:id/assign-leader",
            put(
                |State(seen): State<Arc<Mutex<Vec<(String, Value)>>>>,
                 Json(body): Json<Value>| async move {
                    seen.lock().await.push(("leader".to_string(), body));
                    StatusCode::OK
                },
            ),
        )
        .with_state(Arc::clone(&seen));
    let client = ResearchHubClient::new(&spawn_backend(app).await).expect("client");

    client
        .assign_advisor(TopicId(3), UserId(21))
        .await
        .expect("advisor");
    client
        .assign_leader(TopicId(3), UserId(501))
        .await
        .expect("leader");

    let seen = seen.lock().await;
    assert_eq!(seen[0], ("advisor".to_string(), json!({ "userId": 21 })));
    assert_eq!(seen[1], ("leader".to_string(), json!({ "userId": 501 })));
}

#[tokio::test]
async fn departments_list_with_keyword_and_paging() {
    let app = Router::new().route(
        "/api/departments",
        get(|Query(query): Query<HashMap<String, String>>| async move {
            assert_eq!(query.get("keyword").map(String::as_str), Some("it"));
            assert_eq!(query.get("size").map(String::as_str), Some("100"));
            Json(page_json(vec![json!({
                "id": 2,
                "code": "CNTT",
                "name": "Information Technology",
                "userCount": 120,
            })]))
        }),
    );
    let client = ResearchHubClient::new(&spawn_backend(app).await).expect("client");

    let page = client
        .list_departments(&DepartmentQuery {
            keyword: Some("it".to_string()),
            page: 0,
            size: 100,
        })
        .await
        .expect("departments");

    assert_eq!(page.content[0].id, DepartmentId(2));
    assert_eq!(page.content[0].code, "CNTT");
    assert_eq!(page.content[0].user_count, Some(120));
}

#[tokio::test]
async fn account_endpoints_post_the_backend_field_names() {
    let bodies: Arc<Mutex<HashMap<String, Value>>> = Arc::new(Mutex::new(HashMap::new()));
    let app = Router::new()
        .route(
            "/api/auth/me",
            get(|| async {
                Json(json!({
                    "id": 7,
                    "username": "lan",
                    "fullName": "Nguyen Lan",
                    "role": "TEACHER",
                }))
            }),
        )
        .route(
            "/api/auth/change-password",
            post(
                |State(bodies): State<Arc<Mutex<HashMap<String, Value>>>>,
                 Json(body): Json<Value>| async move {
                    bodies.lock().await.insert("change".to_string(), body);
                    "Password changed"
                },
            ),
        )
        .route(
            "/api/auth/forgot-password",
            post(
                |State(bodies): State<Arc<Mutex<HashMap<String, Value>>>>,
                 Json(body): Json<Value>| async move {
                    bodies.lock().await.insert("forgot".to_string(), body);
                    "Mail sent"
                },
            ),
        )
        .with_state(Arc::clone(&bodies));
    let client = ResearchHubClient::new(&spawn_backend(app).await).expect("client");

    let me = client.me().await.expect("profile");
    assert_eq!(me.role, Role::Teacher);
    client
        .change_password("old-secret", "new-secret")
        .await
        .expect("change");
    client.forgot_password("lan").await.expect("forgot");

    let bodies = bodies.lock().await;
    assert_eq!(
        bodies["change"],
        json!({ "oldPassword": "old-secret", "newPassword": "new-secret" })
    );
    assert_eq!(bodies["forgot"], json!({ "username": "lan" }));
}
