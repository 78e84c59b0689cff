//! Planning of lot-level allocations for a task.
//!
//! An operator either hands out whole items (`items` mode), picking a
//! quantity bucket and a count per lot, or asks for a total quantity and
//! decides how much to draw from each lot (`total` mode).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};
use tracing::{debug, info, instrument, warn};

use crate::errors::ServiceError;
use crate::gateway::AllocationGateway;
use crate::models::{
    AllocationRequest, AssignItemsResponse, AvailableItemsResponse, LotAssignment,
    LotAvailability, MaterialTypeAvailability, QuantityBucket,
};
use crate::services::quantity::{items_total, parse_count, parse_quantity};

pub const SELECT_MATERIAL_TYPE: &str = "請選擇物料類型";
pub const SELECT_AT_LEAST_ONE_LOT: &str = "請至少選擇一個批次並指定數量";
pub const INVALID_REQUESTED_QUANTITY: &str = "請輸入有效數量";
pub const ASSIGN_FAILED: &str = "分配失敗";
pub const QUANTITY_OUT_OF_RANGE: &str = "分配數量超出可計算範圍";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    SelectingMaterialType,
    SelectingLots,
    Reviewing,
    Submitted,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QuantityMode {
    Items,
    #[default]
    Total,
}

/// Items-mode choice for one lot: `count` items of exactly `quantity` each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BucketSelection {
    pub quantity: Decimal,
    pub count: u32,
}

/// The active mode together with its per-lot selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum AllocationMode {
    Items {
        lots: BTreeMap<String, BucketSelection>,
    },
    Total {
        requested: Option<Decimal>,
        lots: BTreeMap<String, Decimal>,
    },
}

impl AllocationMode {
    fn empty(mode: QuantityMode) -> Self {
        match mode {
            QuantityMode::Items => AllocationMode::Items {
                lots: BTreeMap::new(),
            },
            QuantityMode::Total => AllocationMode::Total {
                requested: None,
                lots: BTreeMap::new(),
            },
        }
    }

    pub fn kind(&self) -> QuantityMode {
        match self {
            AllocationMode::Items { .. } => QuantityMode::Items,
            AllocationMode::Total { .. } => QuantityMode::Total,
        }
    }

    pub fn is_selected(&self, lot_id: &str) -> bool {
        match self {
            AllocationMode::Items { lots } => lots.contains_key(lot_id),
            AllocationMode::Total { lots, .. } => lots.contains_key(lot_id),
        }
    }

    fn deselect(&mut self, lot_id: &str) {
        match self {
            AllocationMode::Items { lots } => {
                lots.remove(lot_id);
            }
            AllocationMode::Total { lots, .. } => {
                lots.remove(lot_id);
            }
        }
    }

    fn selected_quantity(&self) -> Decimal {
        match self {
            AllocationMode::Items { lots } => lots
                .values()
                .map(|s| items_total(s.count, s.quantity).unwrap_or(Decimal::MAX))
                .fold(Decimal::ZERO, Decimal::saturating_add),
            AllocationMode::Total { lots, .. } => lots
                .values()
                .copied()
                .fold(Decimal::ZERO, Decimal::saturating_add),
        }
    }
}

/// Per-task assignment session.
///
/// Availability is read-only here: it is replaced wholesale by
/// [`refresh`](Self::refresh), never adjusted to reflect a pending or
/// completed assignment.
#[derive(Debug, Clone)]
pub struct LotAllocationPlanner {
    task_id: String,
    availability: Vec<MaterialTypeAvailability>,
    material_type_id: Option<String>,
    allocation: AllocationMode,
    phase: SessionPhase,
}

impl LotAllocationPlanner {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            availability: Vec::new(),
            material_type_id: None,
            allocation: AllocationMode::empty(QuantityMode::default()),
            phase: SessionPhase::SelectingMaterialType,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn mode(&self) -> QuantityMode {
        self.allocation.kind()
    }

    pub fn allocation(&self) -> &AllocationMode {
        &self.allocation
    }

    pub fn availability(&self) -> &[MaterialTypeAvailability] {
        &self.availability
    }

    pub fn material_type_id(&self) -> Option<&str> {
        self.material_type_id.as_deref()
    }

    pub fn selected_material_type(&self) -> Option<&MaterialTypeAvailability> {
        let id = self.material_type_id.as_deref()?;
        self.availability.iter().find(|mt| mt.material_type_id == id)
    }

    fn lot(&self, lot_id: &str) -> Option<&LotAvailability> {
        self.selected_material_type().and_then(|mt| mt.lot(lot_id))
    }

    fn require_lot(&self, lot_id: &str) -> Result<&LotAvailability, ServiceError> {
        self.lot(lot_id)
            .ok_or_else(|| ServiceError::NotFound(format!("批次 {} 不在所選物料類型中", lot_id)))
    }

    /// Editing a selection is possible while picking lots, and pulls a
    /// reviewed plan back into picking.
    fn begin_edit(&mut self) -> Result<(), ServiceError> {
        match self.phase {
            SessionPhase::SelectingLots => Ok(()),
            SessionPhase::Reviewing => {
                self.phase = SessionPhase::SelectingLots;
                Ok(())
            }
            SessionPhase::SelectingMaterialType | SessionPhase::Submitted => Err(
                ServiceError::InvalidOperation(SELECT_MATERIAL_TYPE.to_string()),
            ),
        }
    }

    /// Replaces the availability snapshot. Selections on lots that are gone
    /// are dropped and the rest are re-clamped to what is left.
    pub fn load_availability(&mut self, response: AvailableItemsResponse) {
        self.availability = response.material_types;

        let lots: Vec<(String, Decimal, Vec<QuantityBucket>)> = self
            .selected_material_type()
            .map(|mt| {
                mt.lots
                    .iter()
                    .map(|l| (l.lot_id.clone(), l.total_quantity, l.quantity_buckets()))
                    .collect()
            })
            .unwrap_or_default();

        match &mut self.allocation {
            AllocationMode::Items { lots: selected } => {
                selected.retain(|lot_id, selection| {
                    let Some((_, _, buckets)) = lots.iter().find(|(id, _, _)| id == lot_id)
                    else {
                        return false;
                    };
                    let size = buckets
                        .iter()
                        .find(|b| b.quantity == selection.quantity)
                        .map(|b| b.count)
                        .unwrap_or(0);
                    selection.count = selection.count.min(size);
                    true
                });
            }
            AllocationMode::Total { lots: selected, .. } => {
                selected.retain(|lot_id, draw| {
                    let Some((_, max, _)) = lots.iter().find(|(id, _, _)| id == lot_id) else {
                        return false;
                    };
                    *draw = (*draw).min(*max);
                    true
                });
            }
        }
    }

    /// Fetches fresh availability for the task, filtered to the chosen
    /// material type when there is one.
    #[instrument(skip(self, gateway), fields(task_id = %self.task_id))]
    pub async fn refresh(&mut self, gateway: &dyn AllocationGateway) -> Result<(), ServiceError> {
        let response = gateway
            .available_items(&self.task_id, self.material_type_id.as_deref())
            .await?;
        debug!(
            material_types = response.material_types.len(),
            "Loaded availability"
        );
        self.load_availability(response);
        Ok(())
    }

    pub fn select_material_type(&mut self, material_type_id: &str) -> Result<(), ServiceError> {
        if !self
            .availability
            .iter()
            .any(|mt| mt.material_type_id == material_type_id)
        {
            return Err(ServiceError::NotFound(format!(
                "物料類型 {} 沒有可用庫存",
                material_type_id
            )));
        }

        self.material_type_id = Some(material_type_id.to_string());
        self.allocation = AllocationMode::empty(self.mode());
        self.phase = SessionPhase::SelectingLots;
        Ok(())
    }

    /// Returns to material type selection, dropping any lot selection.
    pub fn clear_material_type(&mut self) {
        self.material_type_id = None;
        self.allocation = AllocationMode::empty(self.mode());
        self.phase = SessionPhase::SelectingMaterialType;
    }

    /// Switches between items and total mode. The selection never survives
    /// a switch.
    pub fn set_mode(&mut self, mode: QuantityMode) -> Result<(), ServiceError> {
        if self.phase != SessionPhase::SelectingLots {
            return Err(ServiceError::InvalidOperation(
                "只能在選擇批次時切換模式".to_string(),
            ));
        }
        if self.mode() != mode {
            self.allocation = AllocationMode::empty(mode);
        }
        Ok(())
    }

    pub fn requested_quantity(&self) -> Option<Decimal> {
        match &self.allocation {
            AllocationMode::Total { requested, .. } => *requested,
            AllocationMode::Items { .. } => None,
        }
    }

    pub fn set_requested_quantity(&mut self, raw: &str) -> Result<Option<Decimal>, ServiceError> {
        self.begin_edit()?;
        match &mut self.allocation {
            AllocationMode::Total { requested, .. } => {
                let parsed = parse_quantity(raw);
                *requested = Some(parsed).filter(|q| *q > Decimal::ZERO);
                Ok(*requested)
            }
            AllocationMode::Items { .. } => Err(ServiceError::InvalidOperation(
                "需求數量僅適用於總量模式".to_string(),
            )),
        }
    }

    /// Selects or deselects a lot, returning whether it is now selected.
    /// A total-mode draw starts at `max_quantity`, capped by the request and
    /// by what the lot holds.
    pub fn toggle_lot_selection(
        &mut self,
        lot_id: &str,
        max_quantity: Decimal,
    ) -> Result<bool, ServiceError> {
        self.begin_edit()?;

        if self.allocation.is_selected(lot_id) {
            self.allocation.deselect(lot_id);
            return Ok(false);
        }

        let lot = self.require_lot(lot_id)?;
        let first_bucket = lot.quantity_buckets().first().copied();
        let lot_max = lot.total_quantity;
        match &mut self.allocation {
            AllocationMode::Items { lots } => {
                let bucket = first_bucket.ok_or_else(|| {
                    ServiceError::ValidationError(format!("批次 {} 沒有可用物品", lot_id))
                })?;
                lots.insert(
                    lot_id.to_string(),
                    BucketSelection {
                        quantity: bucket.quantity,
                        count: 0,
                    },
                );
            }
            AllocationMode::Total { requested, lots } => {
                let max_quantity = max_quantity.min(lot_max).max(Decimal::ZERO);
                let draw = max_quantity.min(requested.unwrap_or(max_quantity));
                lots.insert(lot_id.to_string(), draw);
            }
        }
        Ok(true)
    }

    /// Total mode: sets the draw from a lot, clamped to what the lot holds.
    pub fn update_lot_quantity(&mut self, lot_id: &str, raw: &str) -> Result<Decimal, ServiceError> {
        self.begin_edit()?;
        self.require_lot(lot_id)?;
        let max = self.get_lot_max_quantity(lot_id);

        match &mut self.allocation {
            AllocationMode::Total { lots, .. } => {
                let draw = parse_quantity(raw).min(max);
                lots.insert(lot_id.to_string(), draw);
                Ok(draw)
            }
            AllocationMode::Items { .. } => Err(ServiceError::InvalidOperation(
                "批次數量僅適用於總量模式".to_string(),
            )),
        }
    }

    /// Items mode: picks which quantity bucket a lot hands out. The current
    /// count is re-clamped to the new bucket's size.
    pub fn select_lot_bucket(&mut self, lot_id: &str, quantity: Decimal) -> Result<u32, ServiceError> {
        self.begin_edit()?;
        let size = self.require_lot(lot_id)?.bucket_size(quantity);
        if size == 0 {
            return Err(ServiceError::ValidationError(format!(
                "批次 {} 沒有每件 {} 的物品",
                lot_id,
                quantity.normalize()
            )));
        }

        match &mut self.allocation {
            AllocationMode::Items { lots } => {
                let entry = lots.entry(lot_id.to_string()).or_insert(BucketSelection {
                    quantity,
                    count: 0,
                });
                entry.quantity = quantity.normalize();
                entry.count = entry.count.min(size);
                Ok(entry.count)
            }
            AllocationMode::Total { .. } => Err(ServiceError::InvalidOperation(
                "件數僅適用於按件模式".to_string(),
            )),
        }
    }

    /// Items mode: sets how many items of the lot's chosen bucket to hand
    /// out, clamped to the bucket's size.
    pub fn update_lot_count(&mut self, lot_id: &str, raw: &str) -> Result<u32, ServiceError> {
        self.begin_edit()?;
        let lot = self.require_lot(lot_id)?;
        let first_bucket = lot.quantity_buckets().first().copied();
        let current = match &self.allocation {
            AllocationMode::Items { lots } => lots.get(lot_id).map(|s| s.quantity),
            AllocationMode::Total { .. } => {
                return Err(ServiceError::InvalidOperation(
                    "件數僅適用於按件模式".to_string(),
                ))
            }
        };
        let quantity = current
            .or(first_bucket.map(|b| b.quantity))
            .ok_or_else(|| ServiceError::ValidationError(format!("批次 {} 沒有可用物品", lot_id)))?;
        let size = lot.bucket_size(quantity);

        let count = parse_count(raw).min(size);
        if let AllocationMode::Items { lots } = &mut self.allocation {
            lots.insert(lot_id.to_string(), BucketSelection { quantity, count });
        }
        Ok(count)
    }

    /// The lot's available total within the selected material type, or zero
    /// when the lot is unknown.
    pub fn get_lot_max_quantity(&self, lot_id: &str) -> Decimal {
        self.lot(lot_id)
            .map(|lot| lot.total_quantity)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn get_total_selected_quantity(&self) -> Decimal {
        self.allocation.selected_quantity()
    }

    /// Builds the batch the current selection would submit, or the reason it
    /// cannot be submitted yet.
    pub fn build_request(&self) -> Result<AllocationRequest, ServiceError> {
        let material_type = self
            .selected_material_type()
            .ok_or_else(|| ServiceError::ValidationError(SELECT_MATERIAL_TYPE.to_string()))?;
        let material_type_id = material_type.material_type_id.clone();

        let mut assignments = Vec::new();
        match &self.allocation {
            AllocationMode::Items { lots } => {
                for lot in &material_type.lots {
                    let Some(selection) = lots.get(&lot.lot_id) else {
                        continue;
                    };
                    if selection.count > 0 && selection.quantity > Decimal::ZERO {
                        assignments.push(LotAssignment::Items {
                            lot_id: lot.lot_id.clone(),
                            material_type_id: material_type_id.clone(),
                            count: selection.count,
                            quantity: selection.quantity,
                        });
                    }
                }
            }
            AllocationMode::Total { requested, lots } => {
                if requested.map_or(true, |q| q <= Decimal::ZERO) {
                    return Err(ServiceError::ValidationError(
                        INVALID_REQUESTED_QUANTITY.to_string(),
                    ));
                }
                for lot in &material_type.lots {
                    match lots.get(&lot.lot_id) {
                        Some(draw) if *draw > Decimal::ZERO => {
                            assignments.push(LotAssignment::Total {
                                lot_id: lot.lot_id.clone(),
                                material_type_id: material_type_id.clone(),
                                quantity: *draw,
                            });
                        }
                        _ => {}
                    }
                }
            }
        }

        if assignments.is_empty() {
            return Err(ServiceError::ValidationError(
                SELECT_AT_LEAST_ONE_LOT.to_string(),
            ));
        }

        let request = AllocationRequest { assignments };
        let selected = request
            .checked_total_quantity()
            .ok_or_else(|| ServiceError::ValidationError(QUANTITY_OUT_OF_RANGE.to_string()))?;
        if let Some(requested) = self.requested_quantity() {
            if selected != requested {
                return Err(ServiceError::ValidationError(format!(
                    "已選數量 {} 與需求數量 {} 不一致",
                    selected.normalize(),
                    requested.normalize()
                )));
            }
        }

        Ok(request)
    }

    pub fn can_submit(&self) -> bool {
        self.build_request().is_ok()
    }

    /// Freezes the current selection for confirmation.
    pub fn review(&mut self) -> Result<AllocationRequest, ServiceError> {
        let request = self.build_request()?;
        self.phase = SessionPhase::Reviewing;
        Ok(request)
    }

    /// Sends the reviewed selection as one batch. On success the selection
    /// is cleared and availability re-fetched; on failure everything stays
    /// as it was so the operator can correct it.
    #[instrument(skip(self, gateway), fields(task_id = %self.task_id))]
    pub async fn submit(
        &mut self,
        gateway: &dyn AllocationGateway,
    ) -> Result<AssignItemsResponse, ServiceError> {
        let request = self.review()?;

        let response = match gateway.assign_items(&self.task_id, &request).await {
            Ok(response) => response,
            Err(err) => {
                let err = err.with_fallback(ASSIGN_FAILED);
                warn!(error = %err, "Assignment rejected");
                return Err(err);
            }
        };

        info!(
            assignments = request.assignments.len(),
            total_quantity = %request.total_quantity(),
            assigned_items = response.assigned_items.len(),
            "Items assigned to task"
        );

        self.material_type_id = None;
        self.allocation = AllocationMode::empty(self.mode());
        self.phase = SessionPhase::Submitted;

        if let Err(err) = self.refresh(gateway).await {
            warn!(error = %err, "Failed to refresh availability after assignment");
        }

        Ok(response)
    }

    /// Abandons the session's selection without submitting.
    pub fn cancel(&mut self) {
        self.clear_material_type();
    }
}
