// Catalog models
pub mod availability;
pub mod material;

// Request/response payloads for mutating endpoints
pub mod assignment;
pub mod intake;
pub mod scan;

// Read-only views
pub mod history;
pub mod task_item;

pub use availability::{
    AvailableItemsResponse, ItemStatus, LotAvailability, LotItem, MaterialTypeAvailability,
    QuantityBucket,
};
pub use assignment::{AllocationRequest, AssignItemsResponse, AssignedItem, LotAssignment};
pub use history::{HistoryItem, ItemHistoryResponse, LedgerTransaction};
pub use intake::{AddLotRequest, AddLotResponse, IntakeForm};
pub use material::{LotSummary, MaterialType};
pub use scan::{ScanResult, ScanVerifyRequest, ScanVerifyResponse};
pub use task_item::{LotInfo, TaskItem, TaskItemsResponse};
