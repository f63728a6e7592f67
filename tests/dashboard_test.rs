mod common;

use axum::http::{Method, StatusCode};
use common::{decimal_field, read_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

async fn create_sale(app: &TestApp, customer: uuid::Uuid, product: uuid::Uuid, quantity: i32, payment: &str) {
    let response = app
        .request(
            Method::POST,
            "/api/v1/sales",
            Some(json!({
                "customer_id": customer,
                "payment_method": payment,
                "items": [{ "product_id": product, "quantity": quantity }],
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn overview_aggregates_committed_sales() {
    let app = TestApp::new().await;
    let alice = app.seed_customer("Alice Martins").await;
    let bruno = app.seed_customer("Bruno Costa").await;
    let headset = app.seed_product("Wireless Headset", dec!(899.90), 20).await;
    let mouse = app.seed_product("Gaming Mouse", dec!(199.90), 5).await;

    create_sale(&app, alice, headset, 2, "pix").await;
    create_sale(&app, alice, mouse, 1, "pix").await;
    create_sale(&app, bruno, mouse, 2, "card").await;

    let response = app.request(Method::GET, "/api/v1/dashboard", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;

    assert_eq!(body["total_customers"], 2);
    assert_eq!(body["total_products"], 2);
    assert_eq!(body["total_sales"], 3);
    // 2 * 899.90 + 1 * 199.90 + 2 * 199.90
    assert_eq!(decimal_field(&body, "total_revenue"), dec!(2399.50));

    let by_payment = body["sales_by_payment_method"]
        .as_array()
        .expect("payment breakdown");
    assert_eq!(by_payment.len(), 2);

    let monthly = body["monthly_sales"].as_array().expect("monthly buckets");
    assert_eq!(monthly.len(), 1);
    assert_eq!(monthly[0]["sales_count"], 3);

    let recent = body["recent_sales"].as_array().expect("recent sales");
    assert_eq!(recent.len(), 3);
}

#[tokio::test]
async fn top_products_rank_by_units_sold() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Carla Dias").await;
    let cable = app.seed_product("USB Cable", dec!(29.90), 50).await;
    let monitor = app.seed_product("4K Monitor", dec!(1500.00), 10).await;

    create_sale(&app, customer, cable, 7, "cash").await;
    create_sale(&app, customer, monitor, 2, "card").await;

    let response = app
        .request(Method::GET, "/api/v1/dashboard/top-products", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rows = read_json(response).await;
    let rows = rows.as_array().expect("top products");

    assert_eq!(rows[0]["product_name"], "USB Cable");
    assert_eq!(rows[0]["units_sold"], 7);
    assert_eq!(rows[1]["product_name"], "4K Monitor");
    assert_eq!(decimal_field(&rows[1], "revenue"), dec!(3000.00));
}

#[tokio::test]
async fn top_customers_rank_by_revenue() {
    let app = TestApp::new().await;
    let alice = app.seed_customer("Alice Martins").await;
    let bruno = app.seed_customer("Bruno Costa").await;
    let headset = app.seed_product("Wireless Headset", dec!(899.90), 20).await;

    create_sale(&app, alice, headset, 3, "pix").await;
    create_sale(&app, bruno, headset, 1, "card").await;

    let response = app
        .request(Method::GET, "/api/v1/dashboard/top-customers", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rows = read_json(response).await;
    let rows = rows.as_array().expect("top customers");

    assert_eq!(rows[0]["customer_name"], "Alice Martins");
    assert_eq!(decimal_field(&rows[0], "revenue"), dec!(2699.70));
    assert_eq!(rows[1]["customer_name"], "Bruno Costa");
    assert_eq!(decimal_field(&rows[1], "revenue"), dec!(899.90));
}

#[tokio::test]
async fn low_stock_lists_products_under_the_threshold() {
    let app = TestApp::new().await;
    app.seed_product("Plenty", dec!(10.00), 50).await;
    let scarce = app.seed_product("Scarce", dec!(10.00), 3).await;

    let response = app.request(Method::GET, "/api/v1/dashboard", None).await;
    let body = read_json(response).await;

    let low = body["low_stock_products"].as_array().expect("low stock");
    assert_eq!(low.len(), 1);
    assert_eq!(low[0]["id"], scarce.to_string());
    assert_eq!(low[0]["stock"], 3);
}

#[tokio::test]
async fn empty_database_produces_a_zeroed_overview() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/dashboard", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;

    assert_eq!(body["total_sales"], 0);
    assert_eq!(decimal_field(&body, "total_revenue"), dec!(0));
    assert_eq!(decimal_field(&body, "average_ticket"), dec!(0));
    assert!(body["monthly_sales"].as_array().unwrap().is_empty());
    assert!(body["recent_sales"].as_array().unwrap().is_empty());
}
