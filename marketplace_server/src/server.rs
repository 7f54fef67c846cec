use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use marketplace_engine::{
    events::EventProducers,
    ChatApi,
    DeliveryApi,
    OrderFlowApi,
    OutboxApi,
    PaymentApi,
    ReviewApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::{mercadopago::MercadoPagoProvider, notifications::create_event_handlers},
    middleware::{HmacMiddlewareFactory, JwtMiddlewareFactory},
    outbox_worker::start_outbox_worker,
    routes::{
        health,
        ApproveDeliveryRoute,
        ApproveRequestRoute,
        CancelOrderRoute,
        ChatByIdRoute,
        CreateDeliveryRoute,
        CreateOrderRoute,
        CreatePaymentRoute,
        CreatePreferenceRoute,
        CreateReviewRoute,
        DeleteOrderRoute,
        DeleteReviewRoute,
        DeliveriesForOrderRoute,
        DeliveryByIdRoute,
        DownloadFileRoute,
        MarkAllReadRoute,
        MarkMessageReadRoute,
        MercadopagoWebhookRoute,
        MyChatsRoute,
        MyDeliveriesRoute,
        MyOrdersRoute,
        MyPaymentsRoute,
        OrderByIdRoute,
        OutboxTasksRoute,
        PaymentByIdRoute,
        RefundPaymentRoute,
        RequestRevisionRoute,
        ReviewByIdRoute,
        ReviewsRoute,
        SendMessageRoute,
        StartWorkRoute,
        UpdateDeliveryRoute,
        UpdateOrderRoute,
        UpdatePaymentRoute,
        UpdateReviewRoute,
    },
};

const MAX_DB_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let _outbox = start_outbox_worker(db.clone(), producers.clone(), config.outbox.clone());
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let provider = MercadoPagoProvider::from_config(config.mercadopago.clone());
    info!("💻️ Gateway notifications are expected at {}", config.checkout.notification_url());
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let payments_api =
            PaymentApi::new(db.clone(), provider.clone(), config.checkout.clone(), producers.clone());
        let deliveries_api = DeliveryApi::new(db.clone());
        let chat_api = ChatApi::new(db.clone(), config.chat_limits);
        let reviews_api = ReviewApi::new(db.clone());
        let outbox_api = OutboxApi::new(db.clone(), producers.clone(), config.outbox.retry_policy);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mkt::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(deliveries_api))
            .app_data(web::Data::new(chat_api))
            .app_data(web::Data::new(reviews_api))
            .app_data(web::Data::new(outbox_api));
        // Routes that require authentication
        let auth_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::new(config.auth.clone()))
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(UpdateOrderRoute::<SqliteDatabase>::new())
            .service(DeleteOrderRoute::<SqliteDatabase>::new())
            .service(ApproveRequestRoute::<SqliteDatabase>::new())
            .service(StartWorkRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .service(CreatePreferenceRoute::<SqliteDatabase, MercadoPagoProvider>::new())
            .service(CreatePaymentRoute::<SqliteDatabase, MercadoPagoProvider>::new())
            .service(MyPaymentsRoute::<SqliteDatabase, MercadoPagoProvider>::new())
            .service(PaymentByIdRoute::<SqliteDatabase, MercadoPagoProvider>::new())
            .service(UpdatePaymentRoute::<SqliteDatabase, MercadoPagoProvider>::new())
            .service(RefundPaymentRoute::<SqliteDatabase, MercadoPagoProvider>::new())
            .service(CreateDeliveryRoute::<SqliteDatabase>::new())
            .service(MyDeliveriesRoute::<SqliteDatabase>::new())
            .service(DeliveriesForOrderRoute::<SqliteDatabase>::new())
            .service(DeliveryByIdRoute::<SqliteDatabase>::new())
            .service(UpdateDeliveryRoute::<SqliteDatabase>::new())
            .service(ApproveDeliveryRoute::<SqliteDatabase>::new())
            .service(RequestRevisionRoute::<SqliteDatabase>::new())
            .service(DownloadFileRoute::<SqliteDatabase>::new())
            .service(MyChatsRoute::<SqliteDatabase>::new())
            .service(ChatByIdRoute::<SqliteDatabase>::new())
            .service(SendMessageRoute::<SqliteDatabase>::new())
            .service(MarkMessageReadRoute::<SqliteDatabase>::new())
            .service(MarkAllReadRoute::<SqliteDatabase>::new())
            .service(CreateReviewRoute::<SqliteDatabase>::new())
            .service(ReviewsRoute::<SqliteDatabase>::new())
            .service(ReviewByIdRoute::<SqliteDatabase>::new())
            .service(UpdateReviewRoute::<SqliteDatabase>::new())
            .service(DeleteReviewRoute::<SqliteDatabase>::new())
            .service(OutboxTasksRoute::<SqliteDatabase, EventProducers>::new());
        // Gateway notifications are authenticated by their signature, not by a user token
        let webhook_scope = web::scope("/payments/mercadopago")
            .wrap(HmacMiddlewareFactory::new(
                config.mercadopago.webhook_secret.clone(),
                config.webhook_signature_checks,
            ))
            .service(MercadopagoWebhookRoute::<SqliteDatabase, MercadoPagoProvider>::new());
        app.service(auth_scope).service(health).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
