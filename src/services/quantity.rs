//! Reconciliation of the three ways an operator can describe one intake:
//! a total, a carton breakdown, or both.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

use crate::models::IntakeForm;

/// Parses operator text into a non-negative quantity.
///
/// Blank, unparseable and negative input all read as zero.
pub fn parse_quantity(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }

    let parsed = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or(Decimal::ZERO);

    if parsed.is_sign_negative() {
        Decimal::ZERO
    } else {
        parsed
    }
}

/// Parses operator text into a count, truncating any fractional part
/// (`"3.7"` reads as 3).
pub fn parse_count(raw: &str) -> u32 {
    parse_quantity(raw).trunc().to_u32().unwrap_or(0)
}

pub fn calculate_total_from_cartons(carton_count: u32, items_per_carton: u32) -> Decimal {
    // u32 * u32 always fits in a Decimal mantissa
    Decimal::from(u64::from(carton_count) * u64::from(items_per_carton))
}

/// Cartons × per-carton × per-item, or `None` when the product does not fit
/// in a `Decimal`.
pub fn calculated_total(
    carton_count: u32,
    items_per_carton: u32,
    item_quantity: Decimal,
) -> Option<Decimal> {
    calculate_total_from_cartons(carton_count, items_per_carton).checked_mul(item_quantity)
}

/// `count` items of `quantity` each, or `None` on overflow.
pub fn items_total(count: u32, quantity: Decimal) -> Option<Decimal> {
    Decimal::from(count).checked_mul(quantity)
}

/// Result of comparing the entered total with the carton breakdown.
///
/// `matched` is `None` while any figure is still zero; there is nothing to
/// compare yet and the indicator stays hidden.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantityMatch {
    pub matched: Option<bool>,
    pub message: String,
}

impl QuantityMatch {
    fn pending() -> Self {
        Self {
            matched: None,
            message: String::new(),
        }
    }
}

pub fn check_quantities_match(
    total_quantity: Decimal,
    carton_count: u32,
    items_per_carton: u32,
    item_quantity: Decimal,
    unit: &str,
) -> QuantityMatch {
    if total_quantity.is_zero()
        || carton_count == 0
        || items_per_carton == 0
        || item_quantity.is_zero()
    {
        return QuantityMatch::pending();
    }

    let Some(calculated) = calculated_total(carton_count, items_per_carton, item_quantity) else {
        return QuantityMatch {
            matched: Some(false),
            message: format!(
                "數量不匹配: 箱數 {} × 每箱 {} × 每件 {} {} 超出可計算範圍",
                carton_count,
                items_per_carton,
                item_quantity.normalize(),
                unit
            ),
        };
    };

    if total_quantity == calculated {
        QuantityMatch {
            matched: Some(true),
            message: format!("數量匹配: {} {}", total_quantity.normalize(), unit),
        }
    } else {
        QuantityMatch {
            matched: Some(false),
            message: format!(
                "數量不匹配: 總數量 {total} {unit} ≠ 箱數 {cartons} × 每箱 {per_carton} × 每件 {each} {unit} = {calculated} {unit}",
                total = total_quantity.normalize(),
                unit = unit,
                cartons = carton_count,
                per_carton = items_per_carton,
                each = item_quantity.normalize(),
                calculated = calculated.normalize(),
            ),
        }
    }
}

/// The quantity actually submitted: the entered total when there is one,
/// otherwise the carton product. The total wins even if the two disagree.
pub fn get_final_quantity(
    total_quantity: Decimal,
    carton_count: u32,
    items_per_carton: u32,
) -> Decimal {
    if total_quantity > Decimal::ZERO {
        total_quantity
    } else {
        calculate_total_from_cartons(carton_count, items_per_carton)
    }
}

pub fn is_form_valid(form: &IntakeForm) -> bool {
    if form.material_type_id.trim().is_empty() || form.factory_lot_number.trim().is_empty() {
        return false;
    }

    let has_total = form.total_quantity > Decimal::ZERO;
    let has_breakdown = form.carton_count > 0
        && form.items_per_carton > 0
        && form.item_quantity > Decimal::ZERO;
    if !has_total && !has_breakdown {
        return false;
    }

    if has_total && form.carton_count > 0 && form.items_per_carton > 0 {
        return calculated_total(form.carton_count, form.items_per_carton, form.item_quantity)
            .map_or(false, |calculated| form.total_quantity == calculated);
    }

    true
}

impl IntakeForm {
    pub fn quantity_match(&self, unit: &str) -> QuantityMatch {
        check_quantities_match(
            self.total_quantity,
            self.carton_count,
            self.items_per_carton,
            self.item_quantity,
            unit,
        )
    }

    pub fn final_quantity(&self) -> Decimal {
        get_final_quantity(self.total_quantity, self.carton_count, self.items_per_carton)
    }

    pub fn is_valid(&self) -> bool {
        is_form_valid(self)
    }
}
