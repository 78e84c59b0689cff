use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

/// Lifecycle of a single labelled item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ItemStatus {
    Available,
    Assigned,
    Used,
    #[serde(other)]
    Unknown,
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::Unknown
    }
}

impl ItemStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ItemStatus::Available => "可用",
            ItemStatus::Assigned => "已分配",
            ItemStatus::Used => "已使用",
            ItemStatus::Unknown => "未知",
        }
    }
}

/// `GET /api/tasks/{taskId}/items/available`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableItemsResponse {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub material_types: Vec<MaterialTypeAvailability>,
}

impl AvailableItemsResponse {
    pub fn material_type(&self, material_type_id: &str) -> Option<&MaterialTypeAvailability> {
        self.material_types
            .iter()
            .find(|mt| mt.material_type_id == material_type_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialTypeAvailability {
    pub material_type_id: String,
    pub material_name: String,
    #[serde(default)]
    pub material_unit: String,
    #[serde(default)]
    pub total_quantity: Decimal,
    #[serde(default)]
    pub lots: Vec<LotAvailability>,
}

impl MaterialTypeAvailability {
    pub fn lot(&self, lot_id: &str) -> Option<&LotAvailability> {
        self.lots.iter().find(|lot| lot.lot_id == lot_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotAvailability {
    pub lot_id: String,
    #[serde(default)]
    pub factory_lot_number: Option<String>,
    #[serde(default)]
    pub total_quantity: Decimal,
    #[serde(default)]
    pub item_count: u32,
    #[serde(default)]
    pub items: Vec<LotItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotItem {
    pub id: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Items of one lot sharing the same per-item quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuantityBucket {
    pub quantity: Decimal,
    pub count: u32,
}

impl LotAvailability {
    fn grouped(&self) -> BTreeMap<Decimal, u32> {
        let mut groups = BTreeMap::new();
        for item in &self.items {
            // normalize so 5 and 5.00 land in the same bucket
            *groups.entry(item.quantity.normalize()).or_insert(0u32) += 1;
        }
        groups
    }

    /// Buckets in ascending quantity order, used for picking.
    pub fn quantity_buckets(&self) -> Vec<QuantityBucket> {
        self.grouped()
            .into_iter()
            .map(|(quantity, count)| QuantityBucket { quantity, count })
            .collect()
    }

    /// Buckets in descending quantity order, used for the read-only summary.
    pub fn quantity_summary(&self) -> Vec<QuantityBucket> {
        let mut buckets = self.quantity_buckets();
        buckets.reverse();
        buckets
    }

    /// How many items of exactly `quantity` the lot holds.
    pub fn bucket_size(&self, quantity: Decimal) -> u32 {
        let quantity = quantity.normalize();
        self.items
            .iter()
            .filter(|item| item.quantity.normalize() == quantity)
            .count() as u32
    }

    pub fn summary_text(&self, unit: &str) -> String {
        self.quantity_summary()
            .iter()
            .map(|b| format!("{}{} × {}", b.quantity, unit, b.count))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
