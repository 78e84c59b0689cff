//! Session persistence and login against a mocked backend.

use assert_matches::assert_matches;
use lot_console::client::ApiClient;
use lot_console::errors::ServiceError;
use lot_console::session::{self, clear_session, load_session, save_session, Session};
use serde_json::json;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn login_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "jwt-abc",
            "user_id": "USR002",
            "username": "line-lead",
            "user_type_id": "UT002"
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn login_then_save_and_reload() {
    let server = login_server().await;
    let client = ApiClient::with_base_url(&server.uri(), Duration::from_secs(5)).unwrap();

    let session = session::login(&client, " line-lead ", "pw").await.unwrap();
    assert_eq!(session.username, "line-lead");
    assert!(session.belongs_to(&server.uri()));

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("session.json");
    save_session(&path, &session).unwrap();

    let loaded = load_session(&path).unwrap().expect("session present");
    assert_eq!(loaded, session);
    assert!(loaded.authorize(client).is_authenticated());
}

#[test]
fn missing_session_file_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    assert_matches!(load_session(&dir.path().join("session.json")), Ok(None));
}

#[test]
fn corrupt_session_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    fs::write(&path, "{not json").unwrap();

    assert_matches!(load_session(&path), Err(ServiceError::SerializationError(_)));
}

#[test]
fn clear_reports_whether_a_file_existed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    let session: Session = serde_json::from_value(json!({
        "api_base_url": "http://localhost:5000",
        "access_token": "jwt",
        "user_id": "USR001",
        "username": "operator",
        "saved_at": "2024-10-01T08:00:00Z"
    }))
    .unwrap();

    save_session(&path, &session).unwrap();
    assert!(clear_session(&path).unwrap());
    assert!(!path.exists());
    assert!(!clear_session(&path).unwrap());
}

#[cfg(unix)]
#[test]
fn saved_token_is_private_to_the_owner() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    fs::write(&path, "{}").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

    let session: Session = serde_json::from_value(json!({
        "api_base_url": "http://localhost:5000",
        "access_token": "jwt",
        "user_id": "USR001",
        "username": "operator",
        "saved_at": "2024-10-01T08:00:00Z"
    }))
    .unwrap();
    save_session(&path, &session).unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    assert_eq!(load_session(&path).unwrap(), Some(session));
}
