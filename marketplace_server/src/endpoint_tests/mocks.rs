use chrono::{DateTime, Utc};
use marketplace_engine::{
    db_types::{
        Chat,
        Delivery,
        DeliveryEdit,
        Message,
        NewDelivery,
        NewMessage,
        NewOrder,
        NewPayment,
        NewReview,
        NewService,
        NewUser,
        Order,
        OrderStatusType,
        OutboxPayload,
        OutboxTask,
        Payment,
        PaymentMethod,
        PaymentUpdate,
        ReconciledPayment,
        Review,
        Service,
        User,
    },
    traits::{
        CatalogManagement,
        ChatManagement,
        ChatSummary,
        CheckoutPreference,
        CheckoutRequest,
        DeliveryManagement,
        GatewayPayment,
        MarketplaceError,
        OrderManagement,
        OutboxFilter,
        OutboxManagement,
        PaymentManagement,
        PaymentProvider,
        ProviderError,
        RetryPlan,
        ReviewManagement,
    },
};
use mkt_common::MinorUnits;
use mockall::mock;

mock! {
    pub Marketplace {}
    impl OrderManagement for Marketplace {
        async fn insert_order(&self, order: NewOrder) -> Result<(Order, OutboxTask), MarketplaceError>;
        async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, MarketplaceError>;
        async fn fetch_orders_for_user(&self, user_id: Option<i64>) -> Result<Vec<Order>, MarketplaceError>;
        async fn transition_order(&self, order_id: i64, from: OrderStatusType, to: OrderStatusType) -> Result<Order, MarketplaceError>;
        async fn update_order_amount(&self, order_id: i64, amount: MinorUnits, expected_status: OrderStatusType) -> Result<Order, MarketplaceError>;
        async fn delete_order(&self, order_id: i64, expected_status: OrderStatusType) -> Result<Order, MarketplaceError>;
    }
    impl CatalogManagement for Marketplace {
        async fn fetch_service(&self, service_id: i64) -> Result<Option<Service>, MarketplaceError>;
        async fn insert_service(&self, service: NewService) -> Result<Service, MarketplaceError>;
        async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, MarketplaceError>;
        async fn insert_user(&self, user: NewUser) -> Result<User, MarketplaceError>;
    }
    impl ChatManagement for Marketplace {
        async fn create_chat_for_order(&self, order_id: i64) -> Result<Chat, MarketplaceError>;
        async fn fetch_chat(&self, chat_id: i64) -> Result<Option<Chat>, MarketplaceError>;
        async fn fetch_chats_for_user(&self, user_id: i64, cursor: Option<i64>, limit: i64) -> Result<Vec<ChatSummary>, MarketplaceError>;
        async fn fetch_messages(&self, chat_id: i64, cursor: Option<i64>, limit: i64) -> Result<Vec<Message>, MarketplaceError>;
        async fn fetch_message(&self, chat_id: i64, message_id: i64) -> Result<Option<Message>, MarketplaceError>;
        async fn insert_message(&self, message: NewMessage) -> Result<Message, MarketplaceError>;
        async fn mark_message_read(&self, chat_id: i64, message_id: i64, reader_id: i64) -> Result<Option<Message>, MarketplaceError>;
        async fn mark_all_read(&self, chat_id: i64, reader_id: i64) -> Result<u64, MarketplaceError>;
        async fn unread_count(&self, chat_id: i64, user_id: i64) -> Result<i64, MarketplaceError>;
    }
    impl OutboxManagement for Marketplace {
        async fn enqueue_task(&self, payload: OutboxPayload) -> Result<Option<OutboxTask>, MarketplaceError>;
        async fn fetch_due_tasks(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<OutboxTask>, MarketplaceError>;
        async fn mark_task_processed(&self, task_id: i64) -> Result<(), MarketplaceError>;
        async fn mark_task_failed(&self, task_id: i64, error: &str, plan: RetryPlan) -> Result<OutboxTask, MarketplaceError>;
        async fn fetch_tasks(&self, filter: OutboxFilter) -> Result<Vec<OutboxTask>, MarketplaceError>;
    }
    impl PaymentManagement for Marketplace {
        async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, MarketplaceError>;
        async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, MarketplaceError>;
        async fn fetch_payments_for_user(&self, user_id: Option<i64>) -> Result<Vec<Payment>, MarketplaceError>;
        async fn fetch_latest_payment(&self, order_id: i64, method: PaymentMethod) -> Result<Option<Payment>, MarketplaceError>;
        async fn set_payment_intent_id(&self, payment_id: i64, intent_id: &str) -> Result<Payment, MarketplaceError>;
        async fn reconcile_payment(&self, update: PaymentUpdate) -> Result<ReconciledPayment, MarketplaceError>;
        async fn refund_payment(&self, payment_id: i64, order_status: OrderStatusType) -> Result<(Payment, Order), MarketplaceError>;
    }
    impl DeliveryManagement for Marketplace {
        async fn insert_delivery(&self, delivery: NewDelivery, order_status: OrderStatusType) -> Result<(Delivery, Order), MarketplaceError>;
        async fn approve_delivery(&self, delivery_id: i64) -> Result<(Delivery, Order), MarketplaceError>;
        async fn request_revision(&self, delivery_id: i64, feedback: &str) -> Result<(Delivery, Order), MarketplaceError>;
        async fn update_delivery(&self, delivery_id: i64, edit: DeliveryEdit) -> Result<Delivery, MarketplaceError>;
        async fn fetch_delivery(&self, delivery_id: i64) -> Result<Option<Delivery>, MarketplaceError>;
        async fn fetch_deliveries_for_user(&self, user_id: Option<i64>) -> Result<Vec<Delivery>, MarketplaceError>;
        async fn fetch_deliveries_for_order(&self, order_id: i64) -> Result<Vec<Delivery>, MarketplaceError>;
    }
    impl ReviewManagement for Marketplace {
        async fn insert_review(&self, review: NewReview) -> Result<Review, MarketplaceError>;
        async fn update_review(&self, review_id: i64, rating: Option<i64>, comment: Option<Option<String>>) -> Result<Review, MarketplaceError>;
        async fn delete_review(&self, review_id: i64) -> Result<Review, MarketplaceError>;
        async fn fetch_review(&self, review_id: i64) -> Result<Option<Review>, MarketplaceError>;
        async fn fetch_reviews_for_service(&self, service_id: i64) -> Result<Vec<Review>, MarketplaceError>;
        async fn fetch_reviews_for_seller(&self, seller_id: i64) -> Result<Vec<Review>, MarketplaceError>;
        async fn fetch_reviews_involving(&self, user_id: Option<i64>) -> Result<Vec<Review>, MarketplaceError>;
    }
}

mock! {
    pub Gateway {}
    impl Clone for Gateway {
        fn clone(&self) -> Self;
    }
    impl PaymentProvider for Gateway {
        async fn create_preference(&self, request: &CheckoutRequest) -> Result<CheckoutPreference, ProviderError>;
        async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, ProviderError>;
    }
}
