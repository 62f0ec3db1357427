//! Fixtures shared by the client_core unit tests.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{SystemTime, UNIX_EPOCH},
};

use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use shared::protocol::{AcademicYear, ApprovedTopic};
use storage::Storage;
use tokio::net::TcpListener;

/// Serves `app` on an ephemeral port and returns the API base url.
pub async fn spawn_backend(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("mock backend addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve mock backend");
    });
    format!("http://{addr}/api")
}

pub async fn memory_storage() -> Storage {
    Storage::new("sqlite::memory:")
        .await
        .expect("open in-memory preference store")
}

/// Counts requests that reached a handler.
#[derive(Clone, Default)]
pub struct HitCounter(Arc<AtomicUsize>);

impl HitCounter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_secs()
}

/// A token shaped like the backend's, signed with a throwaway key.
pub fn token_for(role: &str, username: &str, ttl_secs: i64) -> String {
    let exp = (now_secs() as i64 + ttl_secs).max(0);
    let claims = json!({
        "sub": username,
        "role": role,
        "fullName": format!("{username} full"),
        "exp": exp,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"backend-only-secret"),
    )
    .expect("encode test token")
}

pub fn registration_json(id: i64, status: &str, session: Option<&str>) -> Value {
    json!({
        "id": id,
        "title": format!("Topic {id}"),
        "status": status,
        "sessionStatus": session,
        "createdAt": "2024-10-01T08:30:00",
        "pendingMembers": [
            { "id": 501, "name": "Pending Student" }
        ],
        "approvedMembers": [],
    })
}

pub fn approved_json(id: i64, topic_id: i64, status: &str, code: &str) -> Value {
    json!({
        "id": id,
        "topic": registration_json(topic_id, "APPROVED", Some("IN_PROGRESS")),
        "code": code,
        "status": status,
        "createdAt": "2024-11-02T09:00:00",
    })
}

pub fn approved(id: i64, topic_id: i64, status: &str, code: &str) -> ApprovedTopic {
    serde_json::from_value(approved_json(id, topic_id, status, code)).expect("approved fixture")
}

pub fn academic_year(id: i64, year: i32, is_active: bool) -> AcademicYear {
    serde_json::from_value(json!({
        "id": id,
        "year": year,
        "status": "START",
        "isActive": is_active,
    }))
    .expect("academic year fixture")
}

pub fn page_json(content: Vec<Value>) -> Value {
    let total = content.len();
    json!({
        "content": content,
        "totalElements": total,
        "totalPages": if total == 0 { 0 } else { 1 },
    })
}

/// Academic years served from memory; `None` makes the next fetch fail.
pub struct FixedYears {
    years: tokio::sync::Mutex<Option<Vec<AcademicYear>>>,
}

impl FixedYears {
    pub fn new(years: Vec<AcademicYear>) -> Arc<Self> {
        Arc::new(Self {
            years: tokio::sync::Mutex::new(Some(years)),
        })
    }

    pub async fn replace(&self, years: Option<Vec<AcademicYear>>) {
        *self.years.lock().await = years;
    }
}

#[async_trait::async_trait]
impl crate::academic_year::AcademicYearSource for FixedYears {
    async fn academic_years(&self) -> crate::Result<Vec<AcademicYear>> {
        self.years.lock().await.clone().ok_or_else(|| {
            crate::ClientError::api(
                reqwest::StatusCode::SERVICE_UNAVAILABLE,
                Some("Academic years are unavailable".to_string()),
            )
        })
    }
}
