use serde::{Deserialize, Serialize};

/// Shown whenever a request never produced a usable response.
pub const NETWORK_ERROR_MESSAGE: &str = "網絡錯誤，請重試";

/// Error body returned by the inventory backend.
///
/// Handlers answer with either `error` or `message`, sometimes both, and
/// occasionally a `details` string carrying the underlying exception.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// The most specific human readable reason in the body, if any.
    pub fn reason(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or(self.message.as_deref())
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Server error ({status}): {}", message.as_deref().unwrap_or("no reason given"))]
    ServerError {
        status: u16,
        message: Option<String>,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::SerializationError(err.to_string())
        } else {
            ServiceError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<url::ParseError> for ServiceError {
    fn from(err: url::ParseError) -> Self {
        ServiceError::ConfigError(err.to_string())
    }
}

impl ServiceError {
    /// Builds the error for a non-success HTTP status, localizing the
    /// server's reason when it is one the console knows about.
    pub fn from_response(status: u16, body: Option<&ErrorResponse>) -> Self {
        let reason = body.and_then(ErrorResponse::reason).map(localize_server_error);
        match status {
            401 => ServiceError::Unauthorized(reason.unwrap_or_else(|| "請重新登入".to_string())),
            404 => ServiceError::NotFound(reason.unwrap_or_else(|| "資源不存在".to_string())),
            _ => ServiceError::ServerError {
                status,
                message: reason,
            },
        }
    }

    /// Fills in the action-specific text for a server error that carried no
    /// reason of its own.
    pub fn with_fallback(self, fallback: &str) -> Self {
        match self {
            ServiceError::ServerError {
                status,
                message: None,
            } => ServiceError::ServerError {
                status,
                message: Some(fallback.to_string()),
            },
            other => other,
        }
    }

    /// Local validation failure, raised before any request is sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, ServiceError::ValidationError(_))
    }

    /// Message rendered next to the control that triggered the action.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::ValidationError(msg)
            | ServiceError::InvalidOperation(msg)
            | ServiceError::NotFound(msg)
            | ServiceError::Unauthorized(msg) => msg.clone(),
            ServiceError::ServerError { status, message } => message
                .clone()
                .unwrap_or_else(|| format!("HTTP {}", status)),
            ServiceError::NetworkError(_) => NETWORK_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

/// Maps the backend's English business errors onto the operator-facing text.
/// Unrecognized reasons pass through verbatim.
pub fn localize_server_error(raw: &str) -> String {
    match raw.trim() {
        "Item has not been printed yet" => "該物品尚未打印".to_string(),
        "Item is not assigned to this task" => "該物品不屬於此任務".to_string(),
        "Invalid credentials" => "用戶名或密碼錯誤".to_string(),
        other => other.to_string(),
    }
}
