mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

use salesdesk_api::entities::{sale, sale_item, PaymentMethod};
use salesdesk_api::errors::ServiceError;
use salesdesk_api::services::products::UpdateProductRequest;
use salesdesk_api::services::sales::{CreateSaleRequest, SaleItemRequest, UpdateSaleRequest};

async fn sale_count(app: &TestApp) -> u64 {
    sale::Entity::find()
        .count(app.state.db.as_ref())
        .await
        .expect("count sales")
}

async fn sale_item_count(app: &TestApp) -> u64 {
    sale_item::Entity::find()
        .count(app.state.db.as_ref())
        .await
        .expect("count sale items")
}

#[tokio::test]
async fn single_item_sale_deducts_stock_and_totals() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Alice Martins").await;
    let product_id = app.seed_product("Wireless Headset", dec!(899.90), 15).await;

    let sale = app
        .state
        .services
        .sales
        .create_sale(CreateSaleRequest {
            customer_id,
            payment_method: "pix".to_string(),
            items: vec![SaleItemRequest {
                product_id,
                quantity: 1,
            }],
        })
        .await
        .expect("sale should succeed");

    assert_eq!(sale.total_amount, dec!(899.90));
    assert_eq!(sale.payment_method, PaymentMethod::Pix);
    assert_eq!(sale.customer_name.as_deref(), Some("Alice Martins"));
    assert_eq!(sale.items.len(), 1);
    assert_eq!(sale.items[0].unit_price, dec!(899.90));
    assert_eq!(sale.items[0].subtotal, dec!(899.90));

    assert_eq!(app.product_stock(product_id).await, 14);
}

#[tokio::test]
async fn insufficient_stock_rejects_sale_and_leaves_stock_untouched() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Bruno Costa").await;
    let product_id = app.seed_product("4K Monitor", dec!(1500.00), 2).await;

    let err = app
        .state
        .services
        .sales
        .create_sale(CreateSaleRequest {
            customer_id,
            payment_method: "card".to_string(),
            items: vec![SaleItemRequest {
                product_id,
                quantity: 3,
            }],
        })
        .await
        .expect_err("sale should be rejected");

    match err {
        ServiceError::InsufficientStock(message) => {
            assert!(message.contains("4K Monitor"), "got: {message}");
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    assert_eq!(app.product_stock(product_id).await, 2);
    assert_eq!(sale_count(&app).await, 0);
    assert_eq!(sale_item_count(&app).await, 0);
}

#[tokio::test]
async fn multi_item_sale_sums_subtotals() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Carla Dias").await;
    let mouse = app.seed_product("Gaming Mouse", dec!(199.90), 10).await;
    let headset = app.seed_product("Wireless Headset", dec!(899.90), 5).await;

    let sale = app
        .state
        .services
        .sales
        .create_sale(CreateSaleRequest {
            customer_id,
            payment_method: "cash".to_string(),
            items: vec![
                SaleItemRequest {
                    product_id: mouse,
                    quantity: 2,
                },
                SaleItemRequest {
                    product_id: headset,
                    quantity: 1,
                },
            ],
        })
        .await
        .expect("sale should succeed");

    assert_eq!(sale.total_amount, dec!(1299.70));
    assert_eq!(sale.items.len(), 2);
    assert_eq!(sale.items[0].subtotal, dec!(399.80));
    assert_eq!(sale.items[1].subtotal, dec!(899.90));

    assert_eq!(app.product_stock(mouse).await, 8);
    assert_eq!(app.product_stock(headset).await, 4);
}

#[tokio::test]
async fn deleting_a_sale_restores_stock_exactly_once() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Diego Ramos").await;
    let product_id = app.seed_product("Mechanical Keyboard", dec!(450.00), 8).await;

    let sale = app
        .state
        .services
        .sales
        .create_sale(CreateSaleRequest {
            customer_id,
            payment_method: "transfer".to_string(),
            items: vec![SaleItemRequest {
                product_id,
                quantity: 3,
            }],
        })
        .await
        .expect("sale should succeed");
    assert_eq!(app.product_stock(product_id).await, 5);

    app.state
        .services
        .sales
        .delete_sale(sale.id)
        .await
        .expect("delete should succeed");
    assert_eq!(app.product_stock(product_id).await, 8);
    assert_eq!(sale_item_count(&app).await, 0);

    let err = app
        .state
        .services
        .sales
        .delete_sale(sale.id)
        .await
        .expect_err("second delete should fail");
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(app.product_stock(product_id).await, 8);
}

#[tokio::test]
async fn quantity_equal_to_stock_drains_it_to_zero() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Elisa Nunes").await;
    let product_id = app.seed_product("USB Cable", dec!(29.90), 5).await;

    app.state
        .services
        .sales
        .create_sale(CreateSaleRequest {
            customer_id,
            payment_method: "pix".to_string(),
            items: vec![SaleItemRequest {
                product_id,
                quantity: 5,
            }],
        })
        .await
        .expect("sale draining exact stock should succeed");

    assert_eq!(app.product_stock(product_id).await, 0);

    // One more unit than available must fail.
    let product_id = app.seed_product("HDMI Cable", dec!(49.90), 5).await;
    let err = app
        .state
        .services
        .sales
        .create_sale(CreateSaleRequest {
            customer_id,
            payment_method: "pix".to_string(),
            items: vec![SaleItemRequest {
                product_id,
                quantity: 6,
            }],
        })
        .await
        .expect_err("stock + 1 should fail");
    assert!(matches!(err, ServiceError::InsufficientStock(_)));
    assert_eq!(app.product_stock(product_id).await, 5);
}

#[tokio::test]
async fn failure_on_later_item_rolls_back_earlier_items() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Fernanda Lima").await;
    let in_stock = app.seed_product("Webcam", dec!(350.00), 10).await;
    let scarce = app.seed_product("Docking Station", dec!(1200.00), 1).await;

    let err = app
        .state
        .services
        .sales
        .create_sale(CreateSaleRequest {
            customer_id,
            payment_method: "card".to_string(),
            items: vec![
                SaleItemRequest {
                    product_id: in_stock,
                    quantity: 4,
                },
                SaleItemRequest {
                    product_id: scarce,
                    quantity: 2,
                },
            ],
        })
        .await
        .expect_err("second item should sink the whole sale");

    match err {
        ServiceError::InsufficientStock(message) => {
            assert!(message.contains("Docking Station"), "got: {message}");
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    assert_eq!(app.product_stock(in_stock).await, 10);
    assert_eq!(app.product_stock(scarce).await, 1);
    assert_eq!(sale_count(&app).await, 0);
    assert_eq!(sale_item_count(&app).await, 0);
}

#[tokio::test]
async fn sale_keeps_price_captured_at_sale_time() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Gabriel Souza").await;
    let product_id = app.seed_product("SSD 1TB", dec!(500.00), 10).await;

    let sale = app
        .state
        .services
        .sales
        .create_sale(CreateSaleRequest {
            customer_id,
            payment_method: "pix".to_string(),
            items: vec![SaleItemRequest {
                product_id,
                quantity: 2,
            }],
        })
        .await
        .expect("sale should succeed");

    app.state
        .services
        .products
        .update_product(
            product_id,
            UpdateProductRequest {
                name: "SSD 1TB".to_string(),
                price: dec!(650.00),
                stock: 8,
                category: None,
            },
        )
        .await
        .expect("price update should succeed");

    let reread = app
        .state
        .services
        .sales
        .get_sale(sale.id)
        .await
        .expect("sale still readable");
    assert_eq!(reread.items[0].unit_price, dec!(500.00));
    assert_eq!(reread.total_amount, dec!(1000.00));
}

#[tokio::test]
async fn updating_a_sale_relabels_without_touching_stock_or_total() {
    let app = TestApp::new().await;
    let original_customer = app.seed_customer("Helena Prado").await;
    let new_customer = app.seed_customer("Igor Teles").await;
    let product_id = app.seed_product("Office Chair", dec!(780.00), 6).await;

    let sale = app
        .state
        .services
        .sales
        .create_sale(CreateSaleRequest {
            customer_id: original_customer,
            payment_method: "cash".to_string(),
            items: vec![SaleItemRequest {
                product_id,
                quantity: 2,
            }],
        })
        .await
        .expect("sale should succeed");

    let updated = app
        .state
        .services
        .sales
        .update_sale(
            sale.id,
            UpdateSaleRequest {
                customer_id: new_customer,
                payment_method: "CARD".to_string(),
            },
        )
        .await
        .expect("update should succeed");

    assert_eq!(updated.customer_id, new_customer);
    assert_eq!(updated.customer_name.as_deref(), Some("Igor Teles"));
    assert_eq!(updated.payment_method, PaymentMethod::Card);
    assert_eq!(updated.total_amount, dec!(1560.00));
    assert_eq!(updated.items.len(), 1);
    assert_eq!(app.product_stock(product_id).await, 4);
}

#[tokio::test]
async fn validation_failures_reject_the_whole_request() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Joana Reis").await;
    let product_id = app.seed_product("Desk Lamp", dec!(120.00), 10).await;

    let empty = app
        .state
        .services
        .sales
        .create_sale(CreateSaleRequest {
            customer_id,
            payment_method: "pix".to_string(),
            items: vec![],
        })
        .await
        .expect_err("empty cart must fail");
    assert!(matches!(empty, ServiceError::ValidationError(_)));

    let zero_quantity = app
        .state
        .services
        .sales
        .create_sale(CreateSaleRequest {
            customer_id,
            payment_method: "pix".to_string(),
            items: vec![SaleItemRequest {
                product_id,
                quantity: 0,
            }],
        })
        .await
        .expect_err("zero quantity must fail");
    assert!(matches!(zero_quantity, ServiceError::ValidationError(_)));

    let bad_payment = app
        .state
        .services
        .sales
        .create_sale(CreateSaleRequest {
            customer_id,
            payment_method: "check".to_string(),
            items: vec![SaleItemRequest {
                product_id,
                quantity: 1,
            }],
        })
        .await
        .expect_err("unknown payment method must fail");
    assert!(matches!(bad_payment, ServiceError::ValidationError(_)));

    let ghost_customer = app
        .state
        .services
        .sales
        .create_sale(CreateSaleRequest {
            customer_id: Uuid::new_v4(),
            payment_method: "pix".to_string(),
            items: vec![SaleItemRequest {
                product_id,
                quantity: 1,
            }],
        })
        .await
        .expect_err("unknown customer must fail");
    assert!(matches!(ghost_customer, ServiceError::NotFound(_)));

    let ghost_product = app
        .state
        .services
        .sales
        .create_sale(CreateSaleRequest {
            customer_id,
            payment_method: "pix".to_string(),
            items: vec![SaleItemRequest {
                product_id: Uuid::new_v4(),
                quantity: 1,
            }],
        })
        .await
        .expect_err("unknown product must fail");
    assert!(matches!(ghost_product, ServiceError::NotFound(_)));

    assert_eq!(app.product_stock(product_id).await, 10);
    assert_eq!(sale_count(&app).await, 0);
}

#[tokio::test]
async fn concurrent_sales_for_the_last_unit_admit_exactly_one_winner() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Marina Alves").await;
    let product_id = app.seed_product("Graphics Card", dec!(4200.00), 1).await;

    let request = |qty| CreateSaleRequest {
        customer_id,
        payment_method: "pix".to_string(),
        items: vec![SaleItemRequest {
            product_id,
            quantity: qty,
        }],
    };

    let sales = &app.state.services.sales;
    let (first, second) = tokio::join!(
        sales.create_sale(request(1)),
        sales.create_sale(request(1)),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one sale may claim the last unit");
    assert_eq!(app.product_stock(product_id).await, 0);
    assert_eq!(sale_count(&app).await, 1);
}

#[tokio::test]
async fn deleting_a_sale_skips_products_removed_from_the_catalog() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Lucas Braga").await;
    let kept = app.seed_product("Notebook Stand", dec!(150.00), 10).await;
    let removed = app.seed_product("Phone Case", dec!(59.90), 10).await;

    let sale = app
        .state
        .services
        .sales
        .create_sale(CreateSaleRequest {
            customer_id,
            payment_method: "card".to_string(),
            items: vec![
                SaleItemRequest {
                    product_id: kept,
                    quantity: 2,
                },
                SaleItemRequest {
                    product_id: removed,
                    quantity: 3,
                },
            ],
        })
        .await
        .expect("sale should succeed");

    app.state
        .services
        .products
        .delete_product(removed)
        .await
        .expect("product delete should succeed");

    app.state
        .services
        .sales
        .delete_sale(sale.id)
        .await
        .expect("sale delete should still succeed");

    assert_eq!(app.product_stock(kept).await, 10);
    assert_eq!(sale_count(&app).await, 0);
}
