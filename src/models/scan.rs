use serde::{Deserialize, Serialize};

/// Body of `POST /api/scan_item_verify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanVerifyRequest {
    pub item_id: String,
    pub task_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanVerifyResponse {
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Outcome of one scan, from decoded text to verification verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    pub raw_text: String,
    pub item_id: Option<String>,
    pub success: bool,
    pub message: String,
}

impl ScanResult {
    pub fn verified(
        raw_text: impl Into<String>,
        item_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            raw_text: raw_text.into(),
            item_id: Some(item_id.into()),
            success: true,
            message: message.into(),
        }
    }

    pub fn rejected(
        raw_text: impl Into<String>,
        item_id: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            raw_text: raw_text.into(),
            item_id,
            success: false,
            message: message.into(),
        }
    }
}
