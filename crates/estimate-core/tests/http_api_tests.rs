#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    response::Response,
};
use estimate_tool::{BidRollup, Estimate, EstimateSummary, LineItem, Tag, http_api};
use serde_json::{Value, json};
use tower::util::ServiceExt;

fn new_router() -> axum::Router {
    let estimate = Estimate::new();
    let state = http_api::AppState::new(estimate);
    http_api::router(state)
}

fn json_request(method: &str, uri: &str, body: &impl serde::Serialize) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn line_item_lifecycle_via_http_api() {
    let app = new_router();
    let item = LineItem::priced(1, "Copper pipe", 40.0, 0.1, "FT", 4.0, 3.1);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/items", &item))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: LineItem = read_json(response).await;
    assert!((created.item_cost - 312.4).abs() < 1e-9);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/items", &item))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/items/1/tags",
            &Tag::with_quantity("Copper", 40.0),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/items/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: LineItem = read_json(response).await;
    assert_eq!(fetched.tags, vec![Tag::with_quantity("Copper", 40.0)]);

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/items/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(empty_request("GET", "/items/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = read_json(response).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn update_rejects_mismatched_id() {
    let app = new_router();
    let item = LineItem::priced(2, "PVC", 10.0, 0.0, "FT", 1.0, 1.0);
    let response = app
        .oneshot(json_request("PUT", "/items/1", &item))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(response).await;
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn invalid_item_is_bad_request() {
    let app = new_router();
    let item = LineItem::priced(1, "Bad", -5.0, 0.0, "FT", 1.0, 1.0);
    let response = app
        .oneshot(json_request("POST", "/items", &item))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn filters_items_and_reports_breakdowns() {
    let mut estimate = Estimate::new();
    estimate
        .upsert_item(
            LineItem::priced(1, "Copper pipe", 40.0, 0.1, "FT", 4.0, 3.1)
                .with_tags(vec![Tag::new("Copper"), Tag::new("Plumbing")]),
        )
        .unwrap();
    estimate
        .upsert_item(
            LineItem::priced(2, "PVC drain", 200.0, 0.0, "FT", 1.5, 0.8)
                .with_tags(vec![Tag::new("Plumbing")]),
        )
        .unwrap();
    let app = http_api::router(http_api::AppState::new(estimate));

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/items?tags=Plumbing&sort=item_cost&direction=desc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let items: Vec<LineItem> = read_json(response).await;
    assert_eq!(items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![2, 1]);

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/items?search=copper"))
        .await
        .unwrap();
    let items: Vec<LineItem> = read_json(response).await;
    assert_eq!(items.len(), 1);

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/tags"))
        .await
        .unwrap();
    let tags: Vec<String> = read_json(response).await;
    assert_eq!(tags, vec!["Copper", "Plumbing"]);

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/breakdowns"))
        .await
        .unwrap();
    let breakdowns: Value = read_json(response).await;
    assert_eq!(breakdowns.as_array().map(Vec::len), Some(2));
    assert_eq!(breakdowns[0]["name"], "Copper");

    let response = app
        .oneshot(empty_request("GET", "/items?sort=nope"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rates_and_adjustments_drive_the_bid() {
    let mut estimate = Estimate::new();
    estimate
        .upsert_item(LineItem::priced(1, "Crew", 1.0, 0.0, "LS", 75743.0, 0.0))
        .unwrap();
    estimate
        .upsert_item(LineItem::priced(2, "Material", 1.0, 0.0, "LS", 0.0, 149257.0))
        .unwrap();
    let app = http_api::router(http_api::AppState::new(estimate));

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/adjustments",
            &json!({ "permit": 3550, "equip_rental": 4730, "labeling": 1500 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/bid"))
        .await
        .unwrap();
    let rollup: BidRollup = read_json(response).await;
    assert!((rollup.total_bid - 315671.66).abs() < 1e-6);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/rates",
            &json!({
                "overhead_markup_percentage": 0,
                "labor_markup_percentage": 0,
                "sales_tax_percentage": 0
            }),
        ))
        .await
        .unwrap();
    let rollup: BidRollup = read_json(response).await;
    assert!((rollup.total_bid - (75743.0 + 149257.0 + 3550.0 + 4730.0 + 1500.0)).abs() < 1e-6);
}

#[tokio::test]
async fn commands_endpoint_applies_reducer() {
    let app = new_router();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/commands", &json!({ "command": "add_item" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary: EstimateSummary = read_json(response).await;
    assert_eq!(summary.totals.item_count, 1);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/commands",
            &json!({ "command": "set_field", "id": 1, "field": "description", "value": "Romex" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/commands",
            &json!({ "command": "remove_tag", "id": 1, "name": "Missing" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(empty_request("GET", "/items/1"))
        .await
        .unwrap();
    let item: LineItem = read_json(response).await;
    assert_eq!(item.description, "Romex");
}

#[tokio::test]
async fn column_visibility_and_summary() {
    let app = new_router();

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/columns/wastage", &json!({ "visible": false })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let columns: Value = read_json(response).await;
    assert_eq!(columns[2]["key"], "wastage");
    assert_eq!(columns[2]["visible"], false);

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/columns/tags", &json!({ "visible": false })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(empty_request("GET", "/summary"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary: EstimateSummary = read_json(response).await;
    assert_eq!(summary.totals.item_count, 0);
    assert_eq!(summary.rollup.profit_margin, 0.0);
}
