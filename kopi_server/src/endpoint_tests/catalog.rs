use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use kopi_engine::{
    db_types::{NewProduct, Product, Role, Rupiah, User},
    CatalogApi,
    CatalogError,
};
use mockall::predicate::eq;
use serde_json::{json, Value};

use super::{
    helpers::{bearer, send_request},
    mocks::MockCatalogStore,
};
use crate::routes::{
    AddCategoryRoute,
    AddProductRoute,
    OpenStoreRoute,
    ProductByIdRoute,
    RegisterUserRoute,
    SetProductPriceRoute,
};

fn configure(store: MockCatalogStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(CatalogApi::new(store)))
            .service(RegisterUserRoute::<MockCatalogStore>::new())
            .service(OpenStoreRoute::<MockCatalogStore>::new())
            .service(AddCategoryRoute::<MockCatalogStore>::new())
            .service(AddProductRoute::<MockCatalogStore>::new())
            .service(SetProductPriceRoute::<MockCatalogStore>::new())
            .service(ProductByIdRoute::<MockCatalogStore>::new());
    }
}

fn product_from(id: i64, p: NewProduct) -> Product {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    Product {
        id,
        seller_id: p.seller_id,
        category_id: p.category_id,
        unit_id: p.unit_id,
        name: p.name,
        price: p.price,
        created_at: at,
        updated_at: at,
    }
}

#[actix_web::test]
async fn sellers_cannot_write_the_catalogue() {
    let _ = env_logger::try_init().ok();
    let mut store = MockCatalogStore::new();
    store.expect_insert_product().never();
    let req = TestRequest::post()
        .uri("/catalog/product")
        .insert_header(bearer(3, Role::Seller))
        .set_json(json!({"sellerId": 1, "name": "Kopi Tubruk", "price": 15000}));
    let (status, _) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admin_lists_a_product() {
    let _ = env_logger::try_init().ok();
    let mut store = MockCatalogStore::new();
    store
        .expect_insert_product()
        .withf(|p| p.seller_id == 1 && p.name == "Kopi Tubruk" && p.unit_id == Some(2) && p.category_id.is_none())
        .times(1)
        .returning(|p| Ok(product_from(7, p)));
    let req = TestRequest::post()
        .uri("/catalog/product")
        .insert_header(bearer(1, Role::Admin))
        .set_json(json!({"sellerId": 1, "name": " Kopi Tubruk ", "price": 15000, "unitId": 2}));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::CREATED);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["data"]["id"], 7);
    assert_eq!(body["data"]["price"], 15000);
}

#[actix_web::test]
async fn negative_prices_never_reach_the_database() {
    let _ = env_logger::try_init().ok();
    let mut store = MockCatalogStore::new();
    store.expect_insert_product().never();
    let req = TestRequest::post()
        .uri("/catalog/product")
        .insert_header(bearer(1, Role::Admin))
        .set_json(json!({"sellerId": 1, "name": "Kopi Tubruk", "price": -1}));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("BAD_REQUEST"), "{body}");
}

#[actix_web::test]
async fn product_for_an_unknown_store() {
    let _ = env_logger::try_init().ok();
    let mut store = MockCatalogStore::new();
    store.expect_insert_product().times(1).returning(|p| Err(CatalogError::ProductReferenceNotFound(p.seller_id)));
    let req = TestRequest::post()
        .uri("/catalog/product")
        .insert_header(bearer(1, Role::Admin))
        .set_json(json!({"sellerId": 99, "name": "Kopi Hantu", "price": 1000}));
    let (status, _) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn duplicate_email_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let mut store = MockCatalogStore::new();
    store
        .expect_insert_user()
        .withf(|u| u.email == "budi@example.com" && u.role == Role::User)
        .times(1)
        .returning(|u| Err(CatalogError::DuplicateEmail(u.email)));
    let req = TestRequest::post()
        .uri("/catalog/user")
        .insert_header(bearer(1, Role::Admin))
        .set_json(json!({"name": "Budi", "email": "Budi@Example.com"}));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("budi@example.com already exists"), "{body}");
}

#[actix_web::test]
async fn admin_registers_a_seller() {
    let _ = env_logger::try_init().ok();
    let mut store = MockCatalogStore::new();
    store.expect_insert_user().times(1).returning(|u| {
        Ok(User {
            id: 12,
            name: u.name,
            email: u.email,
            role: u.role,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
        })
    });
    let req = TestRequest::post()
        .uri("/catalog/user")
        .insert_header(bearer(1, Role::Admin))
        .set_json(json!({"name": "Dewi", "email": "dewi@example.com", "role": "seller"}));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::CREATED);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["data"]["id"], 12);
    assert_eq!(body["data"]["role"], "seller");
}

#[actix_web::test]
async fn store_for_an_unknown_user() {
    let _ = env_logger::try_init().ok();
    let mut store = MockCatalogStore::new();
    store.expect_insert_seller().times(1).returning(|user_id, _| Err(CatalogError::UserNotFound(user_id)));
    let req = TestRequest::post()
        .uri("/catalog/seller")
        .insert_header(bearer(1, Role::Admin))
        .set_json(json!({"user_id": 404, "store_name": "Toko Hantu"}));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("User 404 does not exist"), "{body}");
}

#[actix_web::test]
async fn duplicate_category() {
    let _ = env_logger::try_init().ok();
    let mut store = MockCatalogStore::new();
    store
        .expect_insert_category()
        .withf(|name| name.eq("Minuman"))
        .times(1)
        .returning(|name| Err(CatalogError::DuplicateName(format!("Category {name}"))));
    let req = TestRequest::post()
        .uri("/catalog/category")
        .insert_header(bearer(1, Role::Admin))
        .set_json(json!({"name": "Minuman"}));
    let (status, _) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn reprice_a_product() {
    let _ = env_logger::try_init().ok();
    let mut store = MockCatalogStore::new();
    store
        .expect_update_product_price()
        .with(eq(7), eq(Rupiah::from(17_000)))
        .times(1)
        .returning(|id, price| Ok(Some(product_from(id, NewProduct::new(1, "Kopi Tubruk", price)))));
    let req = TestRequest::put()
        .uri("/catalog/product/7/price")
        .insert_header(bearer(1, Role::Admin))
        .set_json(json!({"price": 17000}));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["data"]["price"], 17000);
}

#[actix_web::test]
async fn reprice_a_missing_product() {
    let _ = env_logger::try_init().ok();
    let mut store = MockCatalogStore::new();
    store.expect_update_product_price().with(eq(8), eq(Rupiah::from(17_000))).times(1).returning(|_, _| Ok(None));
    let req = TestRequest::put()
        .uri("/catalog/product/8/price")
        .insert_header(bearer(1, Role::Admin))
        .set_json(json!({"price": 17000}));
    let (status, _) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn products_are_public() {
    let _ = env_logger::try_init().ok();
    let mut store = MockCatalogStore::new();
    store
        .expect_fetch_product()
        .with(eq(7))
        .times(1)
        .returning(|id| Ok(Some(product_from(id, NewProduct::new(1, "Kopi Tubruk", Rupiah::from(15_000))))));
    let req = TestRequest::get().uri("/catalog/product/7");
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["data"]["name"], "Kopi Tubruk");
}
