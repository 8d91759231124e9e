//! Request handler definitions for the cart, order, wallet and catalogue endpoints. The payment endpoints live in
//! [`crate::payment_routes`].
//!
//! Handlers are generic over the backend traits so that the endpoint tests can run them against mocks. Every
//! database call is awaited; nothing in a handler may block the worker thread.
//!
//! Route registration order matters. Static paths such as `/cart/increase` and `/order/user` must be registered
//! before the parameterised paths (`/cart/{id}`, `/order/{id}`) that would otherwise swallow them.
use actix_web::{get, web, HttpResponse, Responder};
use kopi_engine::{
    db_types::{OrderId, OrderStatusType, Role},
    order_objects::{OrderQueryFilter, TransactionQueryFilter},
    CartApi,
    CartManagement,
    CatalogApi,
    CatalogManagement,
    OrderBackend,
    OrderFlowApi,
    StatusUpdate,
    WalletApi,
    WalletLedger,
};
use log::*;

use crate::{
    auth::JwtClaims,
    data_objects::{
        AddToCartRequest,
        BalanceResponse,
        CartItemRequest,
        CreateOrderRequest,
        CreatedResponse,
        DataResponse,
        JsonResponse,
        ManualTransactionRequest,
        NameRequest,
        NewProductRequest,
        NewStoreRequest,
        NewUserRequest,
        OrderListParams,
        PriceUpdate,
        QuantityUpdate,
        StatusUpdateRequest,
        TransactionListParams,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),*]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Cart  ----------------------------------------------------
// Every cart route works on the cart of the authenticated user. Items belonging to other users are reported as not
// found.

route!(my_cart => Get "/cart" impl CartManagement);
pub async fn my_cart<B: CartManagement>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET cart for user {}", claims.id);
    let items = api.cart(claims.id).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(items)))
}

route!(add_to_cart => Post "/cart" impl CartManagement);
/// Adds a product to the cart. If the product is already in the cart, the quantities are added together.
pub async fn add_to_cart<B: CartManagement>(
    claims: JwtClaims,
    body: web::Json<AddToCartRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST add {} x product {} to cart for user {}", req.quantity, req.product_id, claims.id);
    let item = api.add_item(claims.id, req.product_id, req.quantity).await?;
    Ok(HttpResponse::Created().json(DataResponse::new(item)))
}

route!(increase_cart_item => Put "/cart/increase" impl CartManagement);
pub async fn increase_cart_item<B: CartManagement>(
    claims: JwtClaims,
    body: web::Json<CartItemRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item_id = body.item_id;
    debug!("💻️ PUT increase cart item {item_id} for user {}", claims.id);
    let update = api.increment(claims.id, item_id).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(update)))
}

route!(decrease_cart_item => Put "/cart/decrease" impl CartManagement);
/// Decreasing an item with a quantity of 1 removes it from the cart.
pub async fn decrease_cart_item<B: CartManagement>(
    claims: JwtClaims,
    body: web::Json<CartItemRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item_id = body.item_id;
    debug!("💻️ PUT decrease cart item {item_id} for user {}", claims.id);
    let update = api.decrement(claims.id, item_id).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(update)))
}

route!(update_cart_item => Put "/cart/{id}" impl CartManagement);
/// Sets the quantity of a cart item. A quantity of zero or less removes the item.
pub async fn update_cart_item<B: CartManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<QuantityUpdate>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item_id = path.into_inner();
    debug!("💻️ PUT cart item {item_id} quantity to {} for user {}", body.quantity, claims.id);
    let update = api.set_quantity(claims.id, item_id, body.quantity).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(update)))
}

route!(remove_cart_item => Delete "/cart/{id}" impl CartManagement);
pub async fn remove_cart_item<B: CartManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item_id = path.into_inner();
    debug!("💻️ DELETE cart item {item_id} for user {}", claims.id);
    api.remove(claims.id, item_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Item removed from cart")))
}

route!(clear_cart => Delete "/cart" impl CartManagement);
pub async fn clear_cart<B: CartManagement>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ DELETE cart for user {}", claims.id);
    api.clear(claims.id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Cart cleared")))
}

//----------------------------------------------   Orders  ----------------------------------------------------

route!(create_order => Post "/order" impl OrderBackend);
/// Checks out the authenticated user's cart. The new order is `pending` until the payment provider confirms payment.
pub async fn create_order<B: OrderBackend>(
    claims: JwtClaims,
    body: web::Json<CreateOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    if req.shipping_address.trim().is_empty() || req.payment_method.trim().is_empty() {
        return Err(ServerError::InvalidRequest("Shipping address and payment method are required".into()));
    }
    debug!("💻️ POST create order for user {}", claims.id);
    let order = api.checkout(req.into_new_order(claims.id)).await?;
    info!("💻️ Order {} created for user {}", order.order.order_id, claims.id);
    Ok(HttpResponse::Created().json(DataResponse::new(order)))
}

fn status_filter(params: &OrderListParams) -> Result<Option<OrderStatusType>, ServerError> {
    match params.status.as_deref().map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(s) => s.parse::<OrderStatusType>().map(Some).map_err(|_| {
            debug!("💻️ Invalid status filter: {s}");
            ServerError::InvalidStatus(format!("{s} is not a valid order status"))
        }),
    }
}

route!(my_orders => Get "/order/user" impl OrderBackend);
/// The authenticated user's orders, newest first. Supports `page`, `limit` and `status` query parameters.
pub async fn my_orders<B: OrderBackend>(
    claims: JwtClaims,
    query: web::Query<OrderListParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for user {}", claims.id);
    let status = status_filter(&query)?;
    let orders = api.orders_for_user(&claims.requester(), status, query.page_request()).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(orders)))
}

route!(seller_orders => Get "/order/seller" impl OrderBackend where requires [Role::Seller, Role::Admin]);
/// Orders that contain at least one product sold by the authenticated seller.
pub async fn seller_orders<B: OrderBackend>(
    claims: JwtClaims,
    query: web::Query<OrderListParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET seller orders for user {}", claims.id);
    let status = status_filter(&query)?;
    let orders = api.orders_for_seller(&claims.requester(), status, query.page_request()).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(orders)))
}

route!(all_orders => Get "/order/admin" impl OrderBackend where requires [Role::Admin]);
pub async fn all_orders<B: OrderBackend>(
    query: web::Query<OrderListParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let status = status_filter(&query)?;
    let mut filter = OrderQueryFilter::default().with_page(query.page_request());
    filter.status = status;
    debug!("💻️ GET all orders with {filter}");
    let orders = api.search_orders(filter).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(orders)))
}

route!(order_by_id => Get "/order/{id}" impl OrderBackend);
/// Fetches a single order with its items. Users can only see their own orders; admins can see every order.
pub async fn order_by_id<B: OrderBackend>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ GET order {order_id} for user {}", claims.id);
    let order = api.fetch_order(&claims.requester(), &order_id).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(order)))
}

route!(update_order_status => Put "/order/{id}/status" impl OrderBackend where requires [Role::Admin]);
pub async fn update_order_status<B: OrderBackend>(
    path: web::Path<String>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ PUT status of order {order_id} to {}", body.status);
    let update = api.set_status(&order_id, body.status.trim()).await?;
    Ok(status_update_response(update))
}

route!(cancel_order => Put "/order/{id}/cancel" impl OrderBackend);
/// Buyers can cancel their own orders while they are still pending.
pub async fn cancel_order<B: OrderBackend>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ PUT cancel order {order_id} for user {}", claims.id);
    let order = api.cancel_order(&claims.requester(), &order_id).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(order)))
}

route!(process_order => Put "/order/process/{id}" impl OrderBackend where requires [Role::Admin]);
pub async fn process_order<B: OrderBackend>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ PUT process order {order_id}");
    let update = api.mark_processing(&order_id).await?;
    Ok(status_update_response(update))
}

route!(deliver_order => Put "/order/delivered/{id}" impl OrderBackend where requires [Role::Admin]);
pub async fn deliver_order<B: OrderBackend>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ PUT deliver order {order_id}");
    let update = api.mark_delivered(&order_id).await?;
    Ok(status_update_response(update))
}

route!(complete_order => Put "/order/completed/{id}" impl OrderBackend where requires [Role::Admin]);
pub async fn complete_order<B: OrderBackend>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ PUT complete order {order_id}");
    let update = api.mark_completed(&order_id).await?;
    Ok(status_update_response(update))
}

route!(delete_order => Delete "/order/{id}" impl OrderBackend where requires [Role::Admin]);
/// Only cancelled, completed or failed orders can be deleted.
pub async fn delete_order<B: OrderBackend>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ DELETE order {order_id}");
    api.delete_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Order {order_id} deleted"))))
}

fn status_update_response(update: StatusUpdate) -> HttpResponse {
    HttpResponse::Ok().json(DataResponse::new(update.into_order()))
}

//----------------------------------------------   Wallet  ----------------------------------------------------

route!(my_transactions => Get "/wallet/transactions" impl WalletLedger);
pub async fn my_transactions<B: WalletLedger>(
    claims: JwtClaims,
    query: web::Query<TransactionListParams>,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET wallet transactions for user {}", claims.id);
    let transactions = api.transactions_for_user(claims.id, query.page_request()).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(transactions)))
}

route!(my_balance => Get "/wallet/balance" impl WalletLedger);
/// The sum of the user's successful ledger entries. Pending and failed entries do not count.
pub async fn my_balance<B: WalletLedger>(
    claims: JwtClaims,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET wallet balance for user {}", claims.id);
    let balance = api.balance(claims.id).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(BalanceResponse { user_id: claims.id, balance })))
}

route!(all_transactions => Get "/wallet/superadmin" impl WalletLedger where requires [Role::Admin]);
/// Every ledger entry, newest first. `search` filters on the description.
pub async fn all_transactions<B: WalletLedger>(
    query: web::Query<TransactionListParams>,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = query.into_inner();
    let mut filter = TransactionQueryFilter::default().with_page(params.page_request());
    if let Some(search) = params.search.filter(|s| !s.trim().is_empty()) {
        filter = filter.with_search(search.trim());
    }
    debug!("💻️ GET all wallet transactions. Search: {:?}", filter.search);
    let transactions = api.search(filter).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(transactions)))
}

route!(record_transaction => Post "/wallet/transaction" impl OrderBackend where requires [Role::Admin]);
/// Records a manual ledger entry. Entries default to a pending payment. An `order_id` is the public order reference,
/// and an unknown reference is a 404.
pub async fn record_transaction<B: OrderBackend>(
    claims: JwtClaims,
    body: web::Json<ManualTransactionRequest>,
    orders: web::Data<OrderFlowApi<B>>,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let body = body.into_inner();
    let order = match &body.order_id {
        Some(order_id) => Some(orders.fetch_order_header(&claims.requester(), order_id).await?),
        None => None,
    };
    let tx = body.into_transaction(claims.id, order.as_ref());
    info!("💻️ POST manual ledger entry of {} for user {} by admin {}", tx.amount, tx.user_id, claims.id);
    let entry = api.record(tx).await?;
    Ok(HttpResponse::Created().json(DataResponse::new(entry)))
}

route!(delete_transaction => Delete "/wallet/transaction/{id}" impl WalletLedger where requires [Role::Admin]);
pub async fn delete_transaction<B: WalletLedger>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    info!("💻️ DELETE ledger entry {id} by admin {}", claims.id);
    api.delete(id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Transaction {id} deleted"))))
}

//----------------------------------------------   Catalog  ----------------------------------------------------

route!(register_user => Post "/catalog/user" impl CatalogManagement where requires [Role::Admin]);
/// Creates an account. Tokens are issued elsewhere; this only makes the user known to the marketplace.
pub async fn register_user<B: CatalogManagement>(
    claims: JwtClaims,
    body: web::Json<NewUserRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user = api.register_user(body.into_inner().into()).await?;
    info!("💻️ User {} registered by admin {}", user.id, claims.id);
    Ok(HttpResponse::Created().json(DataResponse::new(user)))
}

route!(open_store => Post "/catalog/seller" impl CatalogManagement where requires [Role::Admin]);
pub async fn open_store<B: CatalogManagement>(
    body: web::Json<NewStoreRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let NewStoreRequest { user_id, store_name } = body.into_inner();
    debug!("💻️ POST store {store_name} for user {user_id}");
    let seller = api.open_store(user_id, &store_name).await?;
    Ok(HttpResponse::Created().json(DataResponse::new(seller)))
}

route!(add_category => Post "/catalog/category" impl CatalogManagement where requires [Role::Admin]);
pub async fn add_category<B: CatalogManagement>(
    body: web::Json<NameRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = api.add_category(&body.name).await?;
    Ok(HttpResponse::Created().json(DataResponse::new(CreatedResponse { id })))
}

route!(add_unit => Post "/catalog/unit" impl CatalogManagement where requires [Role::Admin]);
pub async fn add_unit<B: CatalogManagement>(
    body: web::Json<NameRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = api.add_unit(&body.name).await?;
    Ok(HttpResponse::Created().json(DataResponse::new(CreatedResponse { id })))
}

route!(add_product => Post "/catalog/product" impl CatalogManagement where requires [Role::Admin]);
pub async fn add_product<B: CatalogManagement>(
    body: web::Json<NewProductRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product = api.add_product(body.into_inner().into()).await?;
    Ok(HttpResponse::Created().json(DataResponse::new(product)))
}

route!(set_product_price => Put "/catalog/product/{id}/price" impl CatalogManagement where requires [Role::Admin]);
/// Carts pick up the new price immediately. Orders keep the price they were placed at.
pub async fn set_product_price<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<PriceUpdate>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    info!("💻️ PUT price {} for product {product_id} by admin {}", body.price, claims.id);
    let product = api.set_price(product_id, body.price).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(product)))
}

route!(product_by_id => Get "/catalog/product/{id}" impl CatalogManagement);
/// Public. No token is needed to look at a product.
pub async fn product_by_id<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product = api.product(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(product)))
}
