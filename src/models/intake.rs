use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::services::quantity::{parse_count, parse_quantity};

/// Add-material form state.
///
/// Numeric fields hold already-parsed values; every setter accepts raw
/// operator text and coerces anything unusable to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntakeForm {
    pub material_type_id: String,
    pub factory_lot_number: String,
    pub total_quantity: Decimal,
    pub carton_count: u32,
    pub items_per_carton: u32,
    pub item_quantity: Decimal,
}

impl IntakeForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_material_type_id(&mut self, raw: &str) {
        self.material_type_id = raw.to_string();
    }

    pub fn set_factory_lot_number(&mut self, raw: &str) {
        self.factory_lot_number = raw.to_string();
    }

    pub fn set_total_quantity(&mut self, raw: &str) {
        self.total_quantity = parse_quantity(raw);
    }

    pub fn set_carton_count(&mut self, raw: &str) {
        self.carton_count = parse_count(raw);
    }

    pub fn set_items_per_carton(&mut self, raw: &str) {
        self.items_per_carton = parse_count(raw);
    }

    pub fn set_item_quantity(&mut self, raw: &str) {
        self.item_quantity = parse_quantity(raw);
    }
}

/// Body of `POST /api/add_lot`. Breakdown fields the operator left at
/// zero go out as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddLotRequest {
    pub material_type_id: String,
    pub factory_lot_number: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_quantity: Decimal,
    pub carton_count: Option<u32>,
    pub items_per_carton: Option<u32>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub item_quantity: Option<Decimal>,
}

impl AddLotRequest {
    pub fn from_form(form: &IntakeForm, total_quantity: Decimal) -> Self {
        Self {
            material_type_id: form.material_type_id.trim().to_string(),
            factory_lot_number: form.factory_lot_number.trim().to_string(),
            total_quantity,
            carton_count: Some(form.carton_count).filter(|n| *n > 0),
            items_per_carton: Some(form.items_per_carton).filter(|n| *n > 0),
            item_quantity: Some(form.item_quantity).filter(|q| *q > Decimal::ZERO),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddLotResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub lot_id: String,
    #[serde(default)]
    pub carton_ids: Vec<String>,
    #[serde(default)]
    pub item_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn setters_parse_raw_text() {
        let mut form = IntakeForm::new();
        form.set_total_quantity("120.5");
        form.set_carton_count("3.7");
        form.set_items_per_carton("abc");
        form.set_item_quantity("-2");

        assert_eq!(form.total_quantity, dec!(120.5));
        assert_eq!(form.carton_count, 3);
        assert_eq!(form.items_per_carton, 0);
        assert_eq!(form.item_quantity, Decimal::ZERO);
    }

    #[test]
    fn zero_breakdown_fields_are_sent_as_null() {
        let mut form = IntakeForm::new();
        form.set_material_type_id(" MT0001 ");
        form.set_factory_lot_number("F-77");
        form.set_total_quantity("40");

        let body = serde_json::to_value(AddLotRequest::from_form(&form, dec!(40))).unwrap();
        assert_eq!(
            body,
            json!({
                "material_type_id": "MT0001",
                "factory_lot_number": "F-77",
                "total_quantity": 40.0,
                "carton_count": null,
                "items_per_carton": null,
                "item_quantity": null
            })
        );
    }
}
