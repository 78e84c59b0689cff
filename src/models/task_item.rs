use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::availability::ItemStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotInfo {
    pub id: String,
    #[serde(default)]
    pub factory_lot_number: Option<String>,
}

/// An item currently assigned to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskItem {
    pub id: String,
    #[serde(default)]
    pub material_type_id: Option<String>,
    #[serde(default)]
    pub material_type_name: Option<String>,
    #[serde(default)]
    pub material_unit: Option<String>,
    pub quantity: Decimal,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub lot_info: Option<LotInfo>,
    #[serde(default)]
    pub label_count: u32,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl TaskItem {
    /// Labels have been printed at least once, so the item can be scanned.
    pub fn is_printed(&self) -> bool {
        self.label_count > 0
    }
}

/// `GET /api/tasks/{taskId}/items`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskItemsResponse {
    pub task_id: String,
    #[serde(default)]
    pub task_name: Option<String>,
    #[serde(default)]
    pub items: Vec<TaskItem>,
    #[serde(default)]
    pub total_items: u32,
    #[serde(default)]
    pub total_quantity: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn decodes_task_items_payload() {
        let response: TaskItemsResponse = serde_json::from_value(serde_json::json!({
            "task_id": "TSK0002",
            "task_name": "Level 3 cabling",
            "items": [{
                "id": "ITM00031",
                "material_type_id": "MT0001",
                "material_type_name": "Cat6 UTP",
                "material_unit": "m",
                "quantity": 305.0,
                "status": "assigned",
                "parent_id": null,
                "lot_info": {"id": "LOT00004", "factory_lot_number": "F-2024-07"},
                "label_count": 0,
                "created_at": "2024-10-01T09:00:00"
            }],
            "total_items": 1,
            "total_quantity": 305.0
        }))
        .unwrap();

        let item = &response.items[0];
        assert_eq!(item.status, ItemStatus::Assigned);
        assert_eq!(item.quantity, dec!(305));
        assert!(!item.is_printed());
        assert_eq!(item.lot_info.as_ref().map(|l| l.id.as_str()), Some("LOT00004"));
    }
}
