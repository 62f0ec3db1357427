use super::*;
use crate::{
    academic_year::AcademicYearContext,
    event_channel,
    test_support::{
        academic_year, memory_storage, spawn_backend, token_for, FixedYears, HitCounter,
    },
};
use axum::{extract::State, routing::post, Json, Router};
use serde_json::json;
use shared::domain::AcademicYearId;

async fn manager_for(
    base_url: &str,
    storage: Storage,
) -> (SessionManager, broadcast::Receiver<ClientEvent>) {
    let (events, rx) = event_channel();
    let client = Arc::new(ResearchHubClient::new(base_url).expect("client"));
    let years = Arc::new(AcademicYearContext::new(
        FixedYears::new(vec![academic_year(1, 2024, true)]),
        storage.clone(),
        events.clone(),
    ));
    (SessionManager::new(client, storage, years, events), rx)
}

fn login_backend(token: String, hits: HitCounter) -> Router {
    Router::new()
        .route(
            "/api/auth/login",
            post(move |State(hits): State<HitCounter>| {
                let token = token.clone();
                async move {
                    hits.hit();
                    Json(json!({ "accessToken": token }))
                }
            }),
        )
        .with_state(hits)
}

#[test]
fn claims_accept_prefixed_roles_and_full_name() {
    let token = token_for("ROLE_ASSISTANT", "thu", 600);
    let claims = decode_claims(&token).expect("claims");
    assert_eq!(claims.role, Role::Assistant);
    assert_eq!(claims.sub, "thu");
    assert_eq!(claims.full_name.as_deref(), Some("thu full"));
}

#[test]
fn expired_and_malformed_tokens_are_auth_errors() {
    let expired = token_for("ROLE_STUDENT", "an", -600);
    let err = AuthSession::from_token(expired).expect_err("expired");
    assert!(err.is_auth());

    let err = AuthSession::from_token("not-a-jwt").expect_err("malformed");
    assert!(err.is_auth());
}

#[test]
fn session_resolves_navigation_once_from_role() {
    let session = AuthSession::from_token(token_for("ROLE_TEACHER", "minh", 600)).expect("session");
    assert_eq!(session.role(), Role::Teacher);
    assert_eq!(session.nav().home, "/teacher");
    assert_eq!(session.display_name(), "minh full");
}

#[tokio::test]
async fn login_persists_token_and_announces_role() {
    let hits = HitCounter::default();
    let token = token_for("ROLE_ADMIN", "root", 3600);
    let base = spawn_backend(login_backend(token.clone(), hits.clone())).await;
    let storage = memory_storage().await;
    let (manager, mut rx) = manager_for(&base, storage.clone()).await;

    let session = manager.login("root", "pw").await.expect("login");

    assert_eq!(session.role(), Role::Admin);
    assert_eq!(hits.count(), 1);
    assert!(manager.client().has_token().await);
    assert_eq!(
        storage.auth_token().await.expect("token read").as_deref(),
        Some(token.as_str())
    );
    assert_eq!(
        rx.recv().await.expect("event"),
        ClientEvent::SignedIn {
            username: "root".to_string(),
            role: Role::Admin,
        }
    );
}

#[tokio::test]
async fn blank_credentials_never_reach_the_backend() {
    let hits = HitCounter::default();
    let base = spawn_backend(login_backend(String::new(), hits.clone())).await;
    let (manager, _rx) = manager_for(&base, memory_storage().await).await;

    let err = manager.login("  ", "pw").await.expect_err("blank username");
    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(hits.count(), 0);
}

#[tokio::test]
async fn restore_drops_a_stored_token_that_no_longer_decodes() {
    let storage = memory_storage().await;
    storage
        .set_auth_token(&token_for("ROLE_STUDENT", "an", -600))
        .await
        .expect("seed token");
    let (manager, _rx) = manager_for("http://127.0.0.1:9/api", storage.clone()).await;

    assert!(manager.restore().await.expect("restore").is_none());
    assert!(storage.auth_token().await.expect("token read").is_none());
    assert!(manager.current().await.is_none());
}

#[tokio::test]
async fn restore_picks_up_a_valid_token() {
    let storage = memory_storage().await;
    storage
        .set_auth_token(&token_for("ROLE_STUDENT", "an", 600))
        .await
        .expect("seed token");
    let (manager, _rx) = manager_for("http://127.0.0.1:9/api", storage).await;

    let session = manager.restore().await.expect("restore").expect("session");
    assert_eq!(session.username(), "an");
    assert!(manager.client().has_token().await);
}

#[tokio::test]
async fn logout_clears_token_and_year_context_but_keeps_saved_year() {
    let storage = memory_storage().await;
    storage
        .set_auth_token(&token_for("ROLE_TEACHER", "minh", 600))
        .await
        .expect("seed token");
    let (manager, _rx) = manager_for("http://127.0.0.1:9/api", storage.clone()).await;
    manager.restore().await.expect("restore");
    manager.years().refresh().await.expect("refresh years");
    assert_eq!(manager.years().selected_id().await, Some(AcademicYearId(1)));

    manager.logout().await.expect("logout");

    assert!(manager.current().await.is_none());
    assert!(!manager.client().has_token().await);
    assert!(storage.auth_token().await.expect("token read").is_none());
    assert!(manager.years().selected_id().await.is_none());
    assert!(manager.years().years().await.is_empty());
    assert_eq!(
        storage.selected_academic_year().await.expect("year read"),
        Some(AcademicYearId(1))
    );
    assert!(matches!(
        manager.require().await,
        Err(ClientError::Unauthenticated)
    ));
}
