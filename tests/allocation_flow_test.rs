//! End-to-end assignment sessions against a mocked backend.

mod common;

use common::{availability_json, TestBackend};
use lot_console::errors::ServiceError;
use lot_console::gateway::AllocationGateway;
use lot_console::services::allocation::{
    LotAllocationPlanner, QuantityMode, SessionPhase, ASSIGN_FAILED,
};
use rstest::rstest;
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

async fn mount_availability(backend: &TestBackend, lots: &[(&str, &[f64])]) {
    Mock::given(method("GET"))
        .and(path("/api/tasks/TSK0001/items/available"))
        .respond_with(ResponseTemplate::new(200).set_body_json(availability_json("MT001", lots)))
        .mount(&backend.server)
        .await;
}

async fn planner_for(backend: &TestBackend) -> LotAllocationPlanner {
    let mut planner = LotAllocationPlanner::new("TSK0001");
    planner.refresh(&backend.client).await.unwrap();
    planner.select_material_type("MT001").unwrap();
    planner
}

#[tokio::test]
async fn items_mode_submission_refetches_availability() {
    let backend = TestBackend::start().await;
    mount_availability(&backend, &[("LOT1", &[5.0, 5.0, 5.0, 8.0, 8.0])]).await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/TSK0001/items/assign"))
        .and(body_json(json!({
            "assignments": [
                {"lot_id": "LOT1", "material_type_id": "MT001", "count": 3, "quantity": 5.0}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Items assigned successfully",
            "task_id": "TSK0001",
            "assigned_items": [
                {"item_id": "ITM100", "quantity": 5.0, "lot_id": "LOT1", "material_type_id": "MT001"},
                {"item_id": "ITM101", "quantity": 5.0, "lot_id": "LOT1", "material_type_id": "MT001"},
                {"item_id": "ITM102", "quantity": 5.0, "lot_id": "LOT1", "material_type_id": "MT001"}
            ]
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    let mut planner = planner_for(&backend).await;
    planner.set_mode(QuantityMode::Items).unwrap();
    planner.toggle_lot_selection("LOT1", dec!(31)).unwrap();
    assert_eq!(planner.update_lot_count("LOT1", "4").unwrap(), 3);
    assert_eq!(planner.get_total_selected_quantity(), dec!(15));

    let response = planner.submit(&backend.client).await.unwrap();
    assert_eq!(response.assigned_items.len(), 3);
    assert_eq!(planner.phase(), SessionPhase::Submitted);
    assert_eq!(planner.material_type_id(), None);
    assert_eq!(planner.get_total_selected_quantity(), dec!(0));

    // initial load + post-submit refresh
    let requests = backend.server.received_requests().await.unwrap();
    let availability_calls = requests
        .iter()
        .filter(|r| r.method.as_str() == "GET")
        .count();
    assert_eq!(availability_calls, 2);
}

#[tokio::test]
async fn failed_submission_keeps_selection() {
    let backend = TestBackend::start().await;
    mount_availability(&backend, &[("LOT1", &[10.0, 10.0]), ("LOT2", &[10.0])]).await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/TSK0001/items/assign"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&backend.server)
        .await;

    let mut planner = planner_for(&backend).await;
    assert_eq!(planner.mode(), QuantityMode::Total);
    planner.set_requested_quantity("30").unwrap();
    planner.toggle_lot_selection("LOT1", dec!(20)).unwrap();
    planner.toggle_lot_selection("LOT2", dec!(10)).unwrap();

    let err = planner.submit(&backend.client).await.unwrap_err();
    assert_eq!(err.user_message(), ASSIGN_FAILED);
    assert_eq!(planner.phase(), SessionPhase::Reviewing);
    assert_eq!(planner.get_total_selected_quantity(), dec!(30));
    assert!(planner.can_submit());
}

#[rstest]
#[case("20", "9", false)]
#[case("20", "10", true)]
#[case("15", "15", true)]
#[case("25", "5", false)]
#[tokio::test]
async fn total_mode_enables_submit_only_on_exact_sum(
    #[case] first: &str,
    #[case] second: &str,
    #[case] expected: bool,
) {
    let backend = TestBackend::start().await;
    mount_availability(&backend, &[("LOT1", &[20.0]), ("LOT2", &[15.0])]).await;

    let mut planner = planner_for(&backend).await;
    planner.set_mode(QuantityMode::Total).unwrap();
    planner.set_requested_quantity("30").unwrap();
    planner.update_lot_quantity("LOT1", first).unwrap();
    planner.update_lot_quantity("LOT2", second).unwrap();

    assert_eq!(planner.can_submit(), expected);
}

#[tokio::test]
async fn local_validation_never_reaches_the_server() {
    let backend = TestBackend::start().await;
    mount_availability(&backend, &[("LOT1", &[5.0])]).await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/TSK0001/items/assign"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend.server)
        .await;

    let mut planner = planner_for(&backend).await;
    planner.set_mode(QuantityMode::Items).unwrap();
    planner.toggle_lot_selection("LOT1", dec!(5)).unwrap();

    let err = planner.submit(&backend.client).await.unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
    assert_eq!(planner.phase(), SessionPhase::SelectingLots);
}

#[tokio::test]
async fn refresh_uses_material_filter_once_chosen() {
    let backend = TestBackend::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/TSK0001/items/available"))
        .and(query_param("material_type_id", "MT001"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(availability_json("MT001", &[("LOT9", &[2.0])])),
        )
        .expect(1)
        .mount(&backend.server)
        .await;
    mount_availability(&backend, &[("LOT1", &[5.0])]).await;

    let mut planner = planner_for(&backend).await;
    let gateway: &dyn AllocationGateway = &backend.client;
    planner.refresh(gateway).await.unwrap();

    assert_eq!(planner.get_lot_max_quantity("LOT9"), dec!(2));
    assert_eq!(planner.get_lot_max_quantity("LOT1"), dec!(0));
}
