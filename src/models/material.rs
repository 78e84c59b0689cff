use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A category of stock with its unit of measure, e.g. a cable type sold by the metre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialType {
    pub id: String,
    pub material_name: String,
    pub material_unit: String,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Lot row as listed by `GET /api/lots`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotSummary {
    pub id: String,
    pub material_type_id: String,
    #[serde(default)]
    pub material_name: Option<String>,
    #[serde(default)]
    pub material_unit: Option<String>,
    pub factory_lot_number: String,
    #[serde(default)]
    pub carton_count: u32,
    #[serde(default)]
    pub total_items: u32,
    #[serde(default)]
    pub available_items: u32,
    #[serde(default)]
    pub total_quantity: Decimal,
    #[serde(default)]
    pub available_quantity: Decimal,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl LotSummary {
    pub fn unit(&self) -> &str {
        self.material_unit.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn lot_summary_tolerates_extra_fields() {
        let raw = serde_json::json!({
            "id": "LOT00012",
            "material_type_id": "MT0003",
            "material_name": "Cat6 UTP",
            "material_unit": "m",
            "factory_lot_number": "F-2024-118",
            "carton_count": 4,
            "total_items": 40,
            "available_items": 38,
            "total_quantity": 1200.0,
            "available_quantity": 1140.5,
            "carton_ids": ["CTN001"],
            "log_ids": "[]",
            "created_at": "2024-11-03T08:15:42.123456"
        });

        let lot: LotSummary = serde_json::from_value(raw).unwrap();
        assert_eq!(lot.available_quantity, dec!(1140.5));
        assert_eq!(lot.unit(), "m");
        assert!(lot.created_at.is_some());
    }
}
