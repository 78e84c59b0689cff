#![allow(dead_code)]

use std::time::Duration;

use lot_console::client::ApiClient;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const TEST_TOKEN: &str = "test-access-token";

/// Mock inventory backend plus a client already pointed at it.
pub struct TestBackend {
    pub server: MockServer,
    pub client: ApiClient,
}

impl TestBackend {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let client = ApiClient::with_base_url(&server.uri(), Duration::from_secs(5))
            .expect("mock server uri is a valid base url")
            .with_token(TEST_TOKEN);
        Self { server, client }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", TEST_TOKEN)
    }
}

/// Availability payload for one material type with the given lots, each
/// described by its item quantities.
pub fn availability_json(material_type_id: &str, lots: &[(&str, &[f64])]) -> Value {
    let lots: Vec<Value> = lots
        .iter()
        .map(|(lot_id, quantities)| {
            let items: Vec<Value> = quantities
                .iter()
                .enumerate()
                .map(|(i, q)| {
                    json!({
                        "id": format!("ITM{}{:02}", &lot_id[3..], i),
                        "quantity": q,
                        "status": "available",
                        "created_at": "2024-09-30T08:00:00"
                    })
                })
                .collect();
            json!({
                "lot_id": lot_id,
                "factory_lot_number": format!("F-{}", lot_id),
                "items": items,
                "total_quantity": quantities.iter().sum::<f64>(),
                "item_count": quantities.len()
            })
        })
        .collect();

    json!({
        "task_id": "TSK0001",
        "project_id": "PRJ001",
        "project_name": "North wing fit-out",
        "material_types": [{
            "material_type_id": material_type_id,
            "material_name": "Cat6 UTP",
            "material_unit": "m",
            "total_quantity": 0.0,
            "lots": lots
        }]
    })
}
