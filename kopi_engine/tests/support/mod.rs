#![allow(dead_code)]

use kopi_engine::{
    events::EventProducers,
    test_utils::{
        fixtures::{seed_storefront, Storefront},
        prepare_env::{prepare_test_env, random_db_path},
    },
    CartApi,
    CatalogApi,
    OrderFlowApi,
    SqliteDatabase,
    WalletApi,
};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub struct Market {
    pub db: SqliteDatabase,
    pub carts: CartApi<SqliteDatabase>,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub wallet: WalletApi<SqliteDatabase>,
    pub catalog: CatalogApi<SqliteDatabase>,
    pub store: Storefront,
}

pub async fn setup() -> Market {
    setup_with_producers(EventProducers::default()).await
}

pub async fn setup_with_producers(producers: EventProducers) -> Market {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let store = seed_storefront(&db).await;
    Market {
        carts: CartApi::new(db.clone()),
        orders: OrderFlowApi::new(db.clone(), producers),
        wallet: WalletApi::new(db.clone()),
        catalog: CatalogApi::new(db.clone()),
        db,
        store,
    }
}

pub async fn tear_down(market: Market) {
    let Market { mut db, carts, orders, wallet, catalog, .. } = market;
    drop((carts, orders, wallet, catalog));
    let url = db.url().to_string();
    db.close().await;
    if let Err(e) = Sqlite::drop_database(&url).await {
        error!("🚀️ Failed to drop database {url}: {e}");
    }
}
