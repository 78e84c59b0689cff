use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    #[serde(default)]
    pub material_type: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub current_quantity: Option<Decimal>,
    #[serde(default)]
    pub current_status: Option<String>,
}

/// One ledger entry for an item. Fields the console does not know about are
/// kept in `extra` so they still show up in `--json` output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub old_quantity: Option<Decimal>,
    #[serde(default)]
    pub new_quantity: Option<Decimal>,
    #[serde(default)]
    pub old_status: Option<String>,
    #[serde(default)]
    pub new_status: Option<String>,
    #[serde(default)]
    pub old_location: Option<String>,
    #[serde(default)]
    pub new_location: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /api/item/{itemId}/history`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemHistoryResponse {
    #[serde(default)]
    pub success: bool,
    pub item: HistoryItem,
    #[serde(default)]
    pub blockchain_history: Vec<LedgerTransaction>,
}
