use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::client::ApiClient;
use crate::errors::ServiceError;

/// Body of `POST /auth/login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub user_type_id: Option<String>,
}

/// Authenticated operator context, passed explicitly to whatever needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub api_base_url: String,
    pub access_token: String,
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub user_type_id: Option<String>,
    pub saved_at: DateTime<Utc>,
}

impl Session {
    pub fn from_login(api_base_url: impl Into<String>, login: LoginResponse) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            access_token: login.access_token,
            user_id: login.user_id,
            username: login.username,
            user_type_id: login.user_type_id,
            saved_at: Utc::now(),
        }
    }

    /// Whether this session was issued by the backend at `api_base_url`.
    pub fn belongs_to(&self, api_base_url: &str) -> bool {
        self.api_base_url.trim_end_matches('/') == api_base_url.trim_end_matches('/')
    }

    pub fn authorize(&self, client: ApiClient) -> ApiClient {
        client.with_token(self.access_token.clone())
    }
}

/// Authenticates against the backend and returns the resulting session.
pub async fn login(
    client: &ApiClient,
    username: &str,
    password: &str,
) -> Result<Session, ServiceError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(ServiceError::ValidationError(
            "請輸入用戶名和密碼".to_string(),
        ));
    }

    let response = client.login(username, password).await?;
    info!(user_id = %response.user_id, "Operator authenticated");
    Ok(Session::from_login(
        client.base_url().as_str().trim_end_matches('/'),
        response,
    ))
}

/// Writes the session as JSON. On Unix the file is readable by its owner
/// only, since it carries the bearer token.
pub fn save_session(path: &Path, session: &Session) -> Result<(), ServiceError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let payload = serde_json::to_vec_pretty(session)?;
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    // mode() only applies on creation; tighten files left by older versions
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(&payload)?;
    debug!(path = %path.display(), "Session saved");
    Ok(())
}

/// Reads a previously saved session. A missing file is not an error.
pub fn load_session(path: &Path) -> Result<Option<Session>, ServiceError> {
    if !path.exists() {
        return Ok(None);
    }

    let data = fs::read_to_string(path)?;
    let session: Session = serde_json::from_str(&data)?;
    Ok(Some(session))
}

/// Removes the session file, returning whether there was one.
pub fn clear_session(path: &Path) -> Result<bool, ServiceError> {
    if !path.exists() {
        return Ok(false);
    }

    fs::remove_file(path)?;
    debug!(path = %path.display(), "Session cleared");
    Ok(true)
}
