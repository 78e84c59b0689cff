use async_trait::async_trait;

use crate::errors::ServiceError;
use crate::models::{
    AddLotRequest, AddLotResponse, AllocationRequest, AssignItemsResponse,
    AvailableItemsResponse, ScanVerifyRequest, ScanVerifyResponse,
};

/// Backend calls needed to register a new lot.
#[async_trait]
pub trait IntakeGateway: Send + Sync {
    async fn add_lot(&self, request: &AddLotRequest) -> Result<AddLotResponse, ServiceError>;
}

/// Backend calls needed to plan and submit a task assignment.
#[async_trait]
pub trait AllocationGateway: Send + Sync {
    async fn available_items(
        &self,
        task_id: &str,
        material_type_id: Option<&str>,
    ) -> Result<AvailableItemsResponse, ServiceError>;

    async fn assign_items(
        &self,
        task_id: &str,
        request: &AllocationRequest,
    ) -> Result<AssignItemsResponse, ServiceError>;
}

/// Backend call that checks a scanned item against a task.
#[async_trait]
pub trait VerificationGateway: Send + Sync {
    async fn verify_scan(
        &self,
        request: &ScanVerifyRequest,
    ) -> Result<ScanVerifyResponse, ServiceError>;
}
