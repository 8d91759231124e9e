use cucumber::World;
use kopi_engine::{
    db_types::{OrderId, Product, User},
    events::EventProducers,
    test_utils::{
        fixtures::{seed_storefront, Storefront},
        prepare_env::{create_database, random_db_path, run_migrations},
    },
    CartApi,
    OrderFlowApi,
    SqliteDatabase,
    WalletApi,
};
use log::*;

#[derive(Default, Debug, World)]
pub struct KopiWorld {
    pub system: Option<MarketSystem>,
    /// The order most recently placed in this scenario
    pub last_order: Option<OrderId>,
    /// The error message from the last step that was expected to fail
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub struct MarketSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub carts: CartApi<SqliteDatabase>,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub wallet: WalletApi<SqliteDatabase>,
    pub store: Storefront,
}

impl KopiWorld {
    pub fn system(&self) -> &MarketSystem {
        self.system.as_ref().expect("Market not initialised")
    }

    pub fn last_order(&self) -> &OrderId {
        self.last_order.as_ref().expect("No order has been placed")
    }

    pub fn user(&self, name: &str) -> &User {
        let store = &self.system().store;
        [&store.buyer, &store.admin, &store.seller_user, &store.other_seller_user]
            .into_iter()
            .find(|u| u.name == name)
            .unwrap_or_else(|| panic!("No user called {name}"))
    }

    pub fn product(&self, name: &str) -> &Product {
        let store = &self.system().store;
        [&store.tubruk, &store.gula_aren, &store.roti, &store.luwak]
            .into_iter()
            .find(|p| p.name == name)
            .unwrap_or_else(|| panic!("No product called {name}"))
    }
}

impl MarketSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let store = seed_storefront(&db).await;
        Self {
            db_path: url,
            carts: CartApi::new(db.clone()),
            orders: OrderFlowApi::new(db.clone(), EventProducers::default()),
            wallet: WalletApi::new(db.clone()),
            db,
            store,
        }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
