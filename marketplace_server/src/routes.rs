//! Request handler definitions
//!
//! Define each route and its handler here. Handlers only translate between HTTP and the engine APIs; the rules live in
//! the engine. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every backend call here is async, and it must stay that way.
//!
//! Every handler under `/api` extracts the caller's [`JwtClaims`], which the JWT middleware has already validated.
//! Records the caller may not see are reported as missing (404), not as forbidden.
use actix_web::{get, http::header, web, HttpResponse, Responder};
use log::*;
use marketplace_engine::{
    chat_objects::{MarkedRead, PageQuery, SendMessageRequest},
    db_types::Role,
    delivery_objects::{NewDeliveryRequest, RevisionRequest, UpdateDeliveryRequest},
    order_objects::{ModifyOrderRequest, NewOrderRequest},
    payment_objects::{CallbackOutcome, NewPaymentRequest, UpdatePaymentRequest},
    review_objects::{NewReviewRequest, ReviewQuery, UpdateReviewRequest},
    traits::{
        CatalogManagement,
        ChatManagement,
        DeliveryManagement,
        NotificationSink,
        OrderManagement,
        OutboxManagement,
        PaymentManagement,
        PaymentProvider,
        ReviewManagement,
    },
    ChatApi,
    DeliveryApi,
    OrderFlowApi,
    OutboxApi,
    PaymentApi,
    ReviewApi,
};
use mercadopago_tools::WebhookNotification;

use crate::{
    auth::JwtClaims,
    data_objects::{DeliveryOutcome, JsonResponse, OutboxQuery, PreferenceParams, WebhookAck, WebhookQuery},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// Each bound becomes a type parameter of the route, in the order given, and the handler must declare its type
// parameters in that same order.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+ where requires [$($roles:expr),+]) => {
        $crate::route!(@define $name => $method $path impl $($bounds),+);
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+) => {
        $crate::route!(@define $name => $method $path impl $($bounds),+);
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

    (@define $name:ident => $method:ident $path:literal impl $($bounds:ident),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
    };
}

/// What [`OrderFlowApi`] needs from storage
pub trait OrderBackend: OrderManagement + CatalogManagement + ChatManagement + OutboxManagement {}
impl<T> OrderBackend for T where T: OrderManagement + CatalogManagement + ChatManagement + OutboxManagement {}

/// What [`PaymentApi`] needs from storage, including gateway checkouts
pub trait PaymentBackend: OrderManagement + PaymentManagement + CatalogManagement {}
impl<T> PaymentBackend for T where T: OrderManagement + PaymentManagement + CatalogManagement {}

pub trait DeliveryBackend: DeliveryManagement + OrderManagement {}
impl<T> DeliveryBackend for T where T: DeliveryManagement + OrderManagement {}

pub trait ReviewBackend: ReviewManagement + OrderManagement {}
impl<T> ReviewBackend for T where T: ReviewManagement + OrderManagement {}

pub trait OutboxBackend: OutboxManagement + ChatManagement {}
impl<T> OutboxBackend for T where T: OutboxManagement + ChatManagement {}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl OrderBackend);
/// Places an order for a service. The caller becomes the buyer.
///
/// With `asRequest: true` the order starts as `REQUESTED` and waits for the seller to accept the price. Otherwise it
/// starts as `PENDING_PAYMENT`. The order's chat is opened straight away, or by the outbox worker if that fails.
pub async fn create_order<B: OrderBackend>(
    claims: JwtClaims,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST order for service {} from user {}", request.service_id, claims.sub);
    let order = api.create_order(&claims.actor(), request).await.map_err(|e| {
        debug!("💻️ Could not create order. {e}");
        e
    })?;
    Ok(HttpResponse::Created().json(order))
}

route!(my_orders => Get "/orders" impl OrderBackend);
/// Orders where the caller is the buyer or the seller, newest first. Admins see every order.
pub async fn my_orders<B: OrderBackend>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for user {}", claims.sub);
    let orders = api.list_orders(&claims.actor()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl OrderBackend);
pub async fn order_by_id<B: OrderBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order {order_id} for user {}", claims.sub);
    let order = api.fetch_order(&claims.actor(), order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order => Patch "/orders/{id}" impl OrderBackend);
/// Changes the price of a requested order and/or applies a manual status change.
///
/// Only `PENDING_PAYMENT`, `IN_PROGRESS` and `CANCELED` can be set here. The other statuses are reached through
/// payments and deliveries.
pub async fn update_order<B: OrderBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<ModifyOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ PATCH order {order_id} by user {}", claims.sub);
    let order = api.update_order(&claims.actor(), order_id, body.into_inner()).await.map_err(|e| {
        debug!("💻️ Could not update order {order_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(order))
}

route!(delete_order => Delete "/orders/{id}" impl OrderBackend);
/// Removes an order that has not been paid for, along with its chat and payments.
pub async fn delete_order<B: OrderBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    info!("💻️ DELETE order {order_id} by user {}", claims.sub);
    let order = api.delete_order(&claims.actor(), order_id).await.map_err(|e| {
        debug!("💻️ Could not delete order {order_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Order {} deleted", order.id))))
}

route!(approve_request => Patch "/orders/{id}/approve-request" impl OrderBackend);
pub async fn approve_request<B: OrderBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ PATCH approve request on order {order_id} by user {}", claims.sub);
    let order = api.approve_request(&claims.actor(), order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(start_work => Patch "/orders/{id}/start" impl OrderBackend);
pub async fn start_work<B: OrderBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ PATCH start work on order {order_id} by user {}", claims.sub);
    let order = api.start_work(&claims.actor(), order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(cancel_order => Patch "/orders/{id}/cancel" impl OrderBackend);
/// Shorthand for `PATCH /orders/{id}` with `{"status": "CANCELED"}`.
pub async fn cancel_order<B: OrderBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    info!("💻️ PATCH cancel order {order_id} by user {}", claims.sub);
    let order = api.cancel_order(&claims.actor(), order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(create_preference => Post "/payments/mercadopago/preference" impl PaymentBackend, PaymentProvider);
/// Opens a Mercado Pago checkout for an order that is waiting for payment.
///
/// The response carries the `initPoint` URL the buyer must be sent to, and the id of the pending payment that tracks
/// the checkout. The order only becomes `PAID` once the gateway notifies us that the payment was approved.
pub async fn create_preference<B: PaymentBackend, P: PaymentProvider>(
    claims: JwtClaims,
    body: web::Json<PreferenceParams>,
    api: web::Data<PaymentApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let PreferenceParams { order_id } = body.into_inner();
    debug!("💻️ POST checkout preference for order {order_id} by user {}", claims.sub);
    let intent = api.create_intent(&claims.actor(), order_id).await.map_err(|e| {
        warn!("💻️ Could not open a checkout for order {order_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(intent))
}

route!(create_payment => Post "/payments" impl PaymentBackend, PaymentProvider);
/// Records a payment made outside the gateway. The amount and currency must match the order exactly.
pub async fn create_payment<B: PaymentBackend, P: PaymentProvider>(
    claims: JwtClaims,
    body: web::Json<NewPaymentRequest>,
    api: web::Data<PaymentApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST payment for order {} by user {}", request.order_id, claims.sub);
    let payment = api.create_payment(&claims.actor(), request).await?;
    Ok(HttpResponse::Created().json(payment))
}

route!(my_payments => Get "/payments" impl PaymentBackend, PaymentProvider);
pub async fn my_payments<B: PaymentBackend, P: PaymentProvider>(
    claims: JwtClaims,
    api: web::Data<PaymentApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET payments for user {}", claims.sub);
    let payments = api.list_payments(&claims.actor()).await?;
    Ok(HttpResponse::Ok().json(payments))
}

route!(payment_by_id => Get "/payments/{id}" impl PaymentBackend, PaymentProvider);
pub async fn payment_by_id<B: PaymentBackend, P: PaymentProvider>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<PaymentApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = path.into_inner();
    debug!("💻️ GET payment {payment_id} for user {}", claims.sub);
    let payment = api.fetch_payment(&claims.actor(), payment_id).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(update_payment => Patch "/payments/{id}" impl PaymentBackend, PaymentProvider);
/// Admins can correct a payment's status. Completing a payment pays for its order, just like a gateway notification.
pub async fn update_payment<B: PaymentBackend, P: PaymentProvider>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<UpdatePaymentRequest>,
    api: web::Data<PaymentApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = path.into_inner();
    let request = body.into_inner();
    info!("💻️ PATCH payment {payment_id} to {} by user {}", request.status, claims.sub);
    let payment = api.update_payment(&claims.actor(), payment_id, request).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(refund_payment => Post "/payments/{id}/refund" impl PaymentBackend, PaymentProvider);
/// Refunds a completed payment and cancels its order. The refund itself is issued on the gateway by the seller.
pub async fn refund_payment<B: PaymentBackend, P: PaymentProvider>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<PaymentApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = path.into_inner();
    info!("💻️ POST refund for payment {payment_id} by user {}", claims.sub);
    let result = api.process_refund(&claims.actor(), payment_id).await.map_err(|e| {
        debug!("💻️ Could not refund payment {payment_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(mercadopago_webhook => Post "/webhook" impl PaymentBackend, PaymentProvider);
/// Receives Mercado Pago payment notifications.
///
/// The notification is only a pointer: the payment is fetched from the gateway before anything changes. The payment
/// id is read from the `data.id` query parameter first and then the JSON body, the same order the signature covers.
/// The event type prefers the body.
///
/// Mercado Pago retries every notification that is not answered with a 200, so this handler always answers 200 and
/// reports failures as `{"ok": false}`. Signature checks happen in the HMAC middleware before the handler runs.
pub async fn mercadopago_webhook<B: PaymentBackend, P: PaymentProvider>(
    query: web::Query<WebhookQuery>,
    body: web::Bytes,
    api: web::Data<PaymentApi<B, P>>,
) -> HttpResponse {
    let WebhookQuery { event_type, data_id } = query.into_inner();
    let (event_type, data_id) = match serde_json::from_slice::<WebhookNotification>(&body) {
        Ok(notification) => (notification.event_type.or(event_type), data_id.or(Some(notification.data.id))),
        Err(e) => {
            trace!("💻️ Webhook body is not a notification ({e}). Falling back to the query string.");
            (event_type, data_id)
        },
    };
    let Some(data_id) = data_id.filter(|id| !id.trim().is_empty()) else {
        debug!("💻️ Webhook notification without a payment id. Nothing to do.");
        return HttpResponse::Ok().json(WebhookAck { ok: true });
    };
    debug!("💻️ Webhook notification {} for {data_id}", event_type.as_deref().unwrap_or("payment"));
    match api.handle_callback(event_type.as_deref(), &data_id).await {
        Ok(outcome) => {
            match outcome {
                CallbackOutcome::Ignored => trace!("💻️ Notification for {data_id} ignored"),
                CallbackOutcome::UnknownReference(reference) => {
                    warn!("💻️ Gateway payment {data_id} references unknown order '{reference}'")
                },
                CallbackOutcome::NoLocalPayment(order_id) => {
                    warn!("💻️ Gateway payment {data_id} is for order {order_id}, which has no checkout on record")
                },
                CallbackOutcome::Reconciled(r) => {
                    info!("💻️ Gateway payment {data_id} reconciled. Payment {} is {}", r.payment.id, r.payment.status)
                },
            }
            HttpResponse::Ok().json(WebhookAck { ok: true })
        },
        Err(e) => {
            error!("💻️ Could not process the notification for gateway payment {data_id}. {e}");
            HttpResponse::Ok().json(WebhookAck { ok: false })
        },
    }
}

//----------------------------------------------   Deliveries  ----------------------------------------------------
route!(create_delivery => Post "/deliveries" impl DeliveryBackend);
/// The seller hands over finished work. The files are a manifest of uploads already held in external storage.
pub async fn create_delivery<B: DeliveryBackend>(
    claims: JwtClaims,
    body: web::Json<NewDeliveryRequest>,
    api: web::Data<DeliveryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST delivery for order {} by user {}", request.order_id, claims.sub);
    let result = api.create_delivery(&claims.actor(), request).await.map_err(|e| {
        debug!("💻️ Could not create delivery. {e}");
        e
    })?;
    Ok(HttpResponse::Created().json(DeliveryOutcome::from(result)))
}

route!(my_deliveries => Get "/deliveries" impl DeliveryBackend);
pub async fn my_deliveries<B: DeliveryBackend>(
    claims: JwtClaims,
    api: web::Data<DeliveryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET deliveries for user {}", claims.sub);
    let deliveries = api.list_deliveries(&claims.actor()).await?;
    Ok(HttpResponse::Ok().json(deliveries))
}

route!(delivery_by_id => Get "/deliveries/{id}" impl DeliveryBackend);
pub async fn delivery_by_id<B: DeliveryBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<DeliveryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let delivery_id = path.into_inner();
    debug!("💻️ GET delivery {delivery_id} for user {}", claims.sub);
    let delivery = api.fetch_delivery(&claims.actor(), delivery_id).await?;
    Ok(HttpResponse::Ok().json(delivery))
}

route!(deliveries_for_order => Get "/deliveries/order/{order_id}" impl DeliveryBackend);
pub async fn deliveries_for_order<B: DeliveryBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<DeliveryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET deliveries for order {order_id} for user {}", claims.sub);
    let deliveries = api.deliveries_for_order(&claims.actor(), order_id).await?;
    Ok(HttpResponse::Ok().json(deliveries))
}

route!(update_delivery => Patch "/deliveries/{id}" impl DeliveryBackend);
pub async fn update_delivery<B: DeliveryBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<UpdateDeliveryRequest>,
    api: web::Data<DeliveryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let delivery_id = path.into_inner();
    debug!("💻️ PATCH delivery {delivery_id} by user {}", claims.sub);
    let delivery = api.update_delivery(&claims.actor(), delivery_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(delivery))
}

route!(approve_delivery => Post "/deliveries/{id}/approve" impl DeliveryBackend);
/// The buyer accepts the work. The order is complete and can be reviewed.
pub async fn approve_delivery<B: DeliveryBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<DeliveryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let delivery_id = path.into_inner();
    info!("💻️ POST approve delivery {delivery_id} by user {}", claims.sub);
    let result = api.approve_delivery(&claims.actor(), delivery_id).await?;
    Ok(HttpResponse::Ok().json(DeliveryOutcome::from(result)))
}

route!(request_revision => Post "/deliveries/{id}/request-revision" impl DeliveryBackend);
pub async fn request_revision<B: DeliveryBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<RevisionRequest>,
    api: web::Data<DeliveryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let delivery_id = path.into_inner();
    info!("💻️ POST revision request for delivery {delivery_id} by user {}", claims.sub);
    let result = api.request_revision(&claims.actor(), delivery_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(DeliveryOutcome::from(result)))
}

route!(download_file => Get "/deliveries/{id}/files/{file_id}" impl DeliveryBackend);
/// Redirects to the stored file. The bytes never pass through this server.
pub async fn download_file<B: DeliveryBackend>(
    claims: JwtClaims,
    path: web::Path<(i64, String)>,
    api: web::Data<DeliveryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (delivery_id, file_id) = path.into_inner();
    debug!("💻️ GET file {file_id} of delivery {delivery_id} for user {}", claims.sub);
    let file = api.download_file(&claims.actor(), delivery_id, &file_id).await?;
    Ok(HttpResponse::Found().insert_header((header::LOCATION, file.url)).finish())
}

//----------------------------------------------   Chats  ----------------------------------------------------
route!(my_chats => Get "/chats" impl ChatManagement);
/// The caller's inbox: one entry per order chat with the latest message and the unread count.
/// Paged with `?cursor=&limit=`, where `cursor` is the `nextCursor` of the previous page.
pub async fn my_chats<B: ChatManagement>(
    claims: JwtClaims,
    query: web::Query<PageQuery>,
    api: web::Data<ChatApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET chats for user {}", claims.sub);
    let page = api.list_chats(&claims.actor(), query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(chat_by_id => Get "/chats/{id}" impl ChatManagement);
/// A chat and a page of its messages, newest first.
pub async fn chat_by_id<B: ChatManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    query: web::Query<PageQuery>,
    api: web::Data<ChatApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let chat_id = path.into_inner();
    debug!("💻️ GET chat {chat_id} for user {}", claims.sub);
    let thread = api.chat_with_messages(&claims.actor(), chat_id, query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(thread))
}

route!(send_message => Post "/chats/{id}/messages" impl ChatManagement);
pub async fn send_message<B: ChatManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<SendMessageRequest>,
    api: web::Data<ChatApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let chat_id = path.into_inner();
    debug!("💻️ POST message to chat {chat_id} by user {}", claims.sub);
    let message = api.send_message(&claims.actor(), chat_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(message))
}

route!(mark_message_read => Patch "/chats/{id}/messages/{message_id}/read" impl ChatManagement);
pub async fn mark_message_read<B: ChatManagement>(
    claims: JwtClaims,
    path: web::Path<(i64, i64)>,
    api: web::Data<ChatApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (chat_id, message_id) = path.into_inner();
    trace!("💻️ PATCH read message {message_id} in chat {chat_id} by user {}", claims.sub);
    let message = api.mark_message_read(&claims.actor(), chat_id, message_id).await?;
    Ok(HttpResponse::Ok().json(message))
}

route!(mark_all_read => Patch "/chats/{id}/read-all" impl ChatManagement);
pub async fn mark_all_read<B: ChatManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<ChatApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let chat_id = path.into_inner();
    trace!("💻️ PATCH read all messages in chat {chat_id} by user {}", claims.sub);
    let updated = api.mark_all_read(&claims.actor(), chat_id).await?;
    Ok(HttpResponse::Ok().json(MarkedRead { updated }))
}

//----------------------------------------------   Reviews  ----------------------------------------------------
route!(create_review => Post "/reviews" impl ReviewBackend);
/// The buyer rates a completed order. Each order can be reviewed once.
pub async fn create_review<B: ReviewBackend>(
    claims: JwtClaims,
    body: web::Json<NewReviewRequest>,
    api: web::Data<ReviewApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST review for order {} by user {}", request.order_id, claims.sub);
    let review = api.create_review(&claims.actor(), request).await.map_err(|e| {
        debug!("💻️ Could not create review. {e}");
        e
    })?;
    Ok(HttpResponse::Created().json(review))
}

route!(reviews => Get "/reviews" impl ReviewBackend);
/// `?serviceId=` lists a service's reviews and `?userId=` the reviews received by a seller. Without either, the
/// caller gets the reviews they wrote or received.
pub async fn reviews<B: ReviewBackend>(
    claims: JwtClaims,
    query: web::Query<ReviewQuery>,
    api: web::Data<ReviewApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET reviews for user {}", claims.sub);
    let reviews = api.list_reviews(&claims.actor(), query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

route!(review_by_id => Get "/reviews/{id}" impl ReviewBackend);
pub async fn review_by_id<B: ReviewBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<ReviewApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let review_id = path.into_inner();
    debug!("💻️ GET review {review_id} for user {}", claims.sub);
    let review = api.fetch_review(&claims.actor(), review_id).await?;
    Ok(HttpResponse::Ok().json(review))
}

route!(update_review => Patch "/reviews/{id}" impl ReviewBackend);
pub async fn update_review<B: ReviewBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<UpdateReviewRequest>,
    api: web::Data<ReviewApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let review_id = path.into_inner();
    debug!("💻️ PATCH review {review_id} by user {}", claims.sub);
    let review = api.update_review(&claims.actor(), review_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(review))
}

route!(delete_review => Delete "/reviews/{id}" impl ReviewBackend);
pub async fn delete_review<B: ReviewBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<ReviewApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let review_id = path.into_inner();
    info!("💻️ DELETE review {review_id} by user {}", claims.sub);
    let review = api.delete_review(&claims.actor(), review_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Review {} deleted", review.id))))
}

//----------------------------------------------   Admin  ----------------------------------------------------
route!(outbox_tasks => Get "/admin/outbox" impl OutboxBackend, NotificationSink where requires [Role::Admin]);
/// Lists deferred side effects. `?status=pending` (the default) shows what the worker still has to do, and
/// `?status=failed` what it gave up on.
pub async fn outbox_tasks<B: OutboxBackend, N: NotificationSink>(
    query: web::Query<OutboxQuery>,
    api: web::Data<OutboxApi<B, N>>,
) -> Result<HttpResponse, ServerError> {
    let filter = query.into_inner().status.unwrap_or_default();
    debug!("💻️ GET outbox tasks ({filter:?})");
    let tasks = api.list_tasks(filter).await?;
    Ok(HttpResponse::Ok().json(tasks))
}
