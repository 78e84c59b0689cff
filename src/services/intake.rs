use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::errors::ServiceError;
use crate::gateway::IntakeGateway;
use crate::models::{AddLotRequest, AddLotResponse, IntakeForm};
use crate::services::quantity::is_form_valid;

pub const ADD_LOT_SUCCESS: &str = "批次添加成功！";
pub const ADD_LOT_FAILED: &str = "添加失敗";
pub const MISSING_QUANTITY: &str = "請輸入總數量，或同時輸入箱數和每箱件數";
const INCOMPLETE_FORM: &str = "請填寫物料類型和廠商批號，並確認數量一致";

/// Registers newly received material as a lot.
#[derive(Clone)]
pub struct IntakeService {
    gateway: Arc<dyn IntakeGateway>,
}

impl IntakeService {
    pub fn new(gateway: Arc<dyn IntakeGateway>) -> Self {
        Self { gateway }
    }

    /// Builds the request body the form would submit, or the validation
    /// error that blocks it. Never touches the network.
    pub fn prepare(form: &IntakeForm) -> Result<AddLotRequest, ServiceError> {
        let final_quantity = form.final_quantity();
        if final_quantity.is_zero() {
            return Err(ServiceError::ValidationError(MISSING_QUANTITY.to_string()));
        }
        if !is_form_valid(form) {
            return Err(ServiceError::ValidationError(INCOMPLETE_FORM.to_string()));
        }
        Ok(AddLotRequest::from_form(form, final_quantity))
    }

    #[instrument(skip(self, form), fields(material_type_id = %form.material_type_id))]
    pub async fn submit(&self, form: &IntakeForm) -> Result<AddLotResponse, ServiceError> {
        let request = Self::prepare(form)?;

        match self.gateway.add_lot(&request).await {
            Ok(mut response) => {
                info!(
                    lot_id = %response.lot_id,
                    total_quantity = %request.total_quantity,
                    items = response.item_ids.len(),
                    "Lot added"
                );
                response.message = Some(ADD_LOT_SUCCESS.to_string());
                Ok(response)
            }
            Err(err) => {
                let err = err.with_fallback(ADD_LOT_FAILED);
                warn!(error = %err, "Lot intake rejected");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingGateway {
        requests: Mutex<Vec<AddLotRequest>>,
        fail_with: Option<u16>,
    }

    #[async_trait]
    impl IntakeGateway for RecordingGateway {
        async fn add_lot(&self, request: &AddLotRequest) -> Result<AddLotResponse, ServiceError> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(status) = self.fail_with {
                return Err(ServiceError::from_response(status, None));
            }
            Ok(AddLotResponse {
                message: Some("Lot added successfully".into()),
                lot_id: "LOT00021".into(),
                carton_ids: vec!["CTN00101".into()],
                item_ids: vec!["ITM00501".into(), "ITM00502".into()],
            })
        }
    }

    fn filled_form() -> IntakeForm {
        let mut form = IntakeForm::new();
        form.set_material_type_id("MT0002");
        form.set_factory_lot_number("F-2024-33");
        form.set_carton_count("1");
        form.set_items_per_carton("2");
        form.set_item_quantity("50");
        form
    }

    #[tokio::test]
    async fn submits_carton_product_when_total_is_blank() {
        let gateway = Arc::new(RecordingGateway::default());
        let service = IntakeService::new(gateway.clone());

        let response = service.submit(&filled_form()).await.unwrap();
        assert_eq!(response.message.as_deref(), Some(ADD_LOT_SUCCESS));

        let sent = gateway.requests.lock().unwrap();
        assert_eq!(sent[0].total_quantity, dec!(2));
        assert_eq!(sent[0].item_quantity, Some(dec!(50)));
    }

    #[tokio::test]
    async fn empty_quantities_never_reach_the_server() {
        let gateway = Arc::new(RecordingGateway::default());
        let service = IntakeService::new(gateway.clone());

        let mut form = IntakeForm::new();
        form.set_material_type_id("MT0002");
        form.set_factory_lot_number("F-1");

        let err = service.submit(&form).await.unwrap_err();
        assert_eq!(err.user_message(), MISSING_QUANTITY);
        assert!(gateway.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn server_failure_without_reason_uses_generic_text() {
        let gateway = Arc::new(RecordingGateway {
            fail_with: Some(500),
            ..Default::default()
        });
        let service = IntakeService::new(gateway);

        let err = service.submit(&filled_form()).await.unwrap_err();
        assert_eq!(err.user_message(), ADD_LOT_FAILED);
    }
}
