use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::services::quantity::items_total;

/// One lot-level instruction in an assignment batch.
///
/// Items mode hands out `count` whole items of exactly `quantity` each;
/// total mode draws a continuous `quantity` from the lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LotAssignment {
    Items {
        lot_id: String,
        material_type_id: String,
        count: u32,
        #[serde(with = "rust_decimal::serde::float")]
        quantity: Decimal,
    },
    Total {
        lot_id: String,
        material_type_id: String,
        #[serde(with = "rust_decimal::serde::float")]
        quantity: Decimal,
    },
}

impl LotAssignment {
    pub fn lot_id(&self) -> &str {
        match self {
            LotAssignment::Items { lot_id, .. } | LotAssignment::Total { lot_id, .. } => lot_id,
        }
    }

    /// Amount this entry takes out of its lot, or `None` if it does not fit
    /// in a `Decimal`.
    pub fn checked_quantity(&self) -> Option<Decimal> {
        match self {
            LotAssignment::Items {
                count, quantity, ..
            } => items_total(*count, *quantity),
            LotAssignment::Total { quantity, .. } => Some(*quantity),
        }
    }

    /// Amount this entry takes out of its lot, saturating at `Decimal::MAX`.
    pub fn assigned_quantity(&self) -> Decimal {
        self.checked_quantity().unwrap_or(Decimal::MAX)
    }
}

/// Body of `POST /api/tasks/{taskId}/items/assign`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub assignments: Vec<LotAssignment>,
}

impl AllocationRequest {
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn total_quantity(&self) -> Decimal {
        self.assignments
            .iter()
            .map(LotAssignment::assigned_quantity)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Sum of the batch, or `None` if any entry or the sum overflows.
    pub fn checked_total_quantity(&self) -> Option<Decimal> {
        self.assignments.iter().try_fold(Decimal::ZERO, |sum, assignment| {
            sum.checked_add(assignment.checked_quantity()?)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedItem {
    pub item_id: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub lot_id: Option<String>,
    #[serde(default)]
    pub material_type_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignItemsResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub assigned_items: Vec<AssignedItem>,
}
