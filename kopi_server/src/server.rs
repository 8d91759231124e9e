use std::{future::Future, pin::Pin, time::Duration};

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use futures::future::{ok, FutureExt};
use kopi_engine::{
    events::{EventHandlers, EventHooks, EventProducers, LedgerInconsistencyEvent, OrderPaidEvent},
    CartApi,
    CatalogApi,
    OrderFlowApi,
    SqliteDatabase,
    WalletApi,
};
use log::*;
use midtrans_tools::MidtransApi;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    helpers::get_remote_ip,
    payment_routes::{PaymentNotificationRoute, PaymentTokenRoute},
    routes::{
        health,
        AddCategoryRoute,
        AddProductRoute,
        AddToCartRoute,
        AddUnitRoute,
        AllOrdersRoute,
        AllTransactionsRoute,
        CancelOrderRoute,
        ClearCartRoute,
        CompleteOrderRoute,
        CreateOrderRoute,
        DecreaseCartItemRoute,
        DeleteOrderRoute,
        DeleteTransactionRoute,
        DeliverOrderRoute,
        IncreaseCartItemRoute,
        MyBalanceRoute,
        MyCartRoute,
        MyOrdersRoute,
        MyTransactionsRoute,
        OpenStoreRoute,
        OrderByIdRoute,
        ProcessOrderRoute,
        ProductByIdRoute,
        RecordTransactionRoute,
        RegisterUserRoute,
        RemoveCartItemRoute,
        SellerOrdersRoute,
        SetProductPriceRoute,
        UpdateCartItemRoute,
        UpdateOrderStatusRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 128;
const MAX_DB_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = MidtransApi::new(config.midtrans_config.api.clone())?;
    let handlers = create_event_handlers();
    let producers = handlers.producers();
    let handles = handlers.start_handlers();
    info!("🚀️ Started {} event handlers", handles.len());
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::InitializeError(e.to_string()))
}

/// The hooks the server installs on the engine. Ledger inconsistencies go to the `kopi::alerts` log target so that
/// they can be routed to whoever reconciles the ledger.
pub fn create_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_ledger_inconsistency(|ev: LedgerInconsistencyEvent| {
        Box::pin(async move {
            error!(
                target: "kopi::alerts",
                "🚨️ Order {} is {} but the wallet ledger has no entry for it. Re-apply the status to retry. Reason: {}",
                ev.order.order_id,
                ev.status,
                ev.reason
            );
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks.on_order_paid(|ev: OrderPaidEvent| {
        Box::pin(async move {
            let order = ev.order;
            info!("💰️ Order {} for user {} has been paid ({})", order.order_id, order.user_id, order.total_amount);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    EventHandlers::new(EVENT_BUFFER_SIZE, hooks)
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: MidtransApi,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let bind_address = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let cart_api = CartApi::new(db.clone());
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone()).with_shipping_policy(config.shipping);
        let wallet_api = WalletApi::new(db.clone());
        let catalog_api = CatalogApi::new(db.clone());
        let options = ServerOptions::from_config(&config);
        let whitelist = config.midtrans_config.whitelist.clone();
        let notification_scope = web::scope("/notification")
            .wrap_fn(move |req, srv| {
                let peer_ip = get_remote_ip(req.request(), options.use_x_forwarded_for, options.use_forwarded);
                let whitelisted = match (peer_ip, &whitelist) {
                    (Some(ip), Some(whitelist)) => {
                        info!("💳️ Payment notification from {ip}");
                        whitelist.contains(&ip)
                    },
                    (_, None) => true,
                    (None, Some(_)) => {
                        warn!("💳️ No IP address found in payment notification request, denying access.");
                        false
                    },
                };
                if whitelisted {
                    srv.call(req).boxed_local()
                } else {
                    warn!("💳️ Payment notification from {peer_ip:?} is not whitelisted. Denying access.");
                    let err = ServerError::InsufficientPermissions("Address is not whitelisted".into());
                    ok(req.error_response(err)).boxed_local()
                }
            })
            .service(PaymentNotificationRoute::<SqliteDatabase, MidtransApi>::new());
        let payment_scope = web::scope("/payment")
            .service(PaymentTokenRoute::<SqliteDatabase, MidtransApi>::new())
            .service(notification_scope);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("kopi::access_log"))
            .app_data(web::Data::new(cart_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(wallet_api))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(config.auth.clone()))
            .app_data(web::Data::new(gateway.clone()))
            .app_data(web::Data::new(config.midtrans_config.api.clone()))
            .app_data(json_config())
            .app_data(query_config())
            .app_data(path_config())
            .service(health)
            // Cart. Static paths go before /cart/{id}
            .service(MyCartRoute::<SqliteDatabase>::new())
            .service(AddToCartRoute::<SqliteDatabase>::new())
            .service(ClearCartRoute::<SqliteDatabase>::new())
            .service(IncreaseCartItemRoute::<SqliteDatabase>::new())
            .service(DecreaseCartItemRoute::<SqliteDatabase>::new())
            .service(UpdateCartItemRoute::<SqliteDatabase>::new())
            .service(RemoveCartItemRoute::<SqliteDatabase>::new())
            // Orders. Static paths go before /order/{id}
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(SellerOrdersRoute::<SqliteDatabase>::new())
            .service(AllOrdersRoute::<SqliteDatabase>::new())
            .service(ProcessOrderRoute::<SqliteDatabase>::new())
            .service(DeliverOrderRoute::<SqliteDatabase>::new())
            .service(CompleteOrderRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(DeleteOrderRoute::<SqliteDatabase>::new())
            // Wallet
            .service(MyTransactionsRoute::<SqliteDatabase>::new())
            .service(MyBalanceRoute::<SqliteDatabase>::new())
            .service(AllTransactionsRoute::<SqliteDatabase>::new())
            .service(RecordTransactionRoute::<SqliteDatabase>::new())
            .service(DeleteTransactionRoute::<SqliteDatabase>::new())
            // Catalogue
            .service(RegisterUserRoute::<SqliteDatabase>::new())
            .service(OpenStoreRoute::<SqliteDatabase>::new())
            .service(AddCategoryRoute::<SqliteDatabase>::new())
            .service(AddUnitRoute::<SqliteDatabase>::new())
            .service(AddProductRoute::<SqliteDatabase>::new())
            .service(SetProductPriceRoute::<SqliteDatabase>::new())
            .service(ProductByIdRoute::<SqliteDatabase>::new())
            .service(payment_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind(bind_address)?
    .run();
    Ok(srv)
}

/// Malformed bodies, queries and paths get the same JSON error envelope as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|e, _| ServerError::InvalidRequest(e.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|e, _| ServerError::InvalidRequest(e.to_string()).into())
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|e, _| ServerError::NoRecordFound(e.to_string()).into())
}
