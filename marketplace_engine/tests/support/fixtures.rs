use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use marketplace_engine::{
    db_types::{NewOrder, NewService, NewUser, Order, Service, User},
    events::EventProducers,
    policy::Actor,
    traits::{
        CatalogManagement,
        CheckoutPreference,
        CheckoutRequest,
        GatewayPayment,
        OrderManagement,
        PaymentProvider,
        ProviderError,
    },
    OrderFlowApi,
    SqliteDatabase,
};

/// A buyer, a seller, an admin and one service owned by the seller.
#[derive(Debug, Clone)]
pub struct Cast {
    pub buyer: User,
    pub seller: User,
    pub admin: User,
    pub stranger: User,
    pub service: Service,
}

impl Cast {
    pub fn buyer(&self) -> Actor {
        Actor::user(self.buyer.id)
    }

    pub fn seller(&self) -> Actor {
        Actor::user(self.seller.id)
    }

    pub fn admin(&self) -> Actor {
        Actor::admin(self.admin.id)
    }

    pub fn stranger(&self) -> Actor {
        Actor::user(self.stranger.id)
    }
}

pub async fn seed_cast(db: &SqliteDatabase) -> Cast {
    let buyer = db.insert_user(NewUser::new("buyer@example.com", "Buyer")).await.expect("Error inserting buyer");
    let seller = db.insert_user(NewUser::new("seller@example.com", "Seller")).await.expect("Error inserting seller");
    let admin = db.insert_user(NewUser::new("admin@example.com", "Admin")).await.expect("Error inserting admin");
    let stranger =
        db.insert_user(NewUser::new("stranger@example.com", "Stranger")).await.expect("Error inserting stranger");
    let service = db
        .insert_service(NewService {
            owner_id: seller.id,
            title: "Mixing and mastering".into(),
            description: Some("One track, two revisions".into()),
            base_price: 150_000.into(),
            currency: "ARS".into(),
        })
        .await
        .expect("Error inserting service");
    Cast { buyer, seller, admin, stranger, service }
}

/// Inserts an order straight into the database, bypassing chat provisioning.
pub async fn insert_order(db: &SqliteDatabase, cast: &Cast, amount: i64) -> Order {
    let order = NewOrder::new(cast.service.id, cast.buyer.id, cast.seller.id, amount.into(), "ARS");
    let (order, _task) = db.insert_order(order).await.expect("Error inserting order");
    order
}

pub fn order_api(db: &SqliteDatabase) -> OrderFlowApi<SqliteDatabase> {
    OrderFlowApi::new(db.clone(), EventProducers::default())
}

/// A scripted payment gateway. Payments are looked up by id from what the test registered.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGateway {
    payments: Arc<Mutex<HashMap<String, GatewayPayment>>>,
    preferences: Arc<Mutex<Vec<CheckoutRequest>>>,
    pub fail_preferences: bool,
}

impl ScriptedGateway {
    pub fn failing() -> Self {
        Self { fail_preferences: true, ..Default::default() }
    }

    pub fn set_payment(&self, id: &str, status: &str, external_reference: Option<&str>) {
        let payment = GatewayPayment {
            id: id.to_string(),
            status: status.to_string(),
            external_reference: external_reference.map(String::from),
        };
        self.payments.lock().unwrap().insert(id.to_string(), payment);
    }

    pub fn checkout_requests(&self) -> Vec<CheckoutRequest> {
        self.preferences.lock().unwrap().clone()
    }
}

impl PaymentProvider for ScriptedGateway {
    async fn create_preference(&self, request: &CheckoutRequest) -> Result<CheckoutPreference, ProviderError> {
        if self.fail_preferences {
            return Err(ProviderError::Unreachable("connection refused".into()));
        }
        let mut requests = self.preferences.lock().unwrap();
        requests.push(request.clone());
        let preference_id = format!("pref-{}-{}", request.order_id, requests.len());
        Ok(CheckoutPreference {
            init_point: format!("https://checkout.example.com/{preference_id}"),
            preference_id,
        })
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, ProviderError> {
        self.payments
            .lock()
            .unwrap()
            .get(payment_id)
            .cloned()
            .ok_or_else(|| ProviderError::Rejected(format!("payment {payment_id} not found")))
    }
}

/// Records a manual payment for the order and settles it, which moves the order to `PAID`.
pub async fn pay_order(db: &SqliteDatabase, order: &Order) -> Order {
    use marketplace_engine::{
        db_types::{NewPayment, PaymentMethod, PaymentStatus, PaymentUpdate},
        traits::PaymentManagement,
    };
    let payment = db
        .insert_payment(NewPayment::for_order(order, PaymentMethod::Manual))
        .await
        .expect("Error inserting payment");
    let update = PaymentUpdate { payment_id: payment.id, status: PaymentStatus::Completed, transaction_id: None };
    let result = db.reconcile_payment(update).await.expect("Error settling payment");
    result.paid_order.expect("Order was not marked paid")
}

pub fn sample_upload(name: &str) -> marketplace_engine::delivery_objects::FileUpload {
    marketplace_engine::delivery_objects::FileUpload {
        filename: name.to_string(),
        mime_type: "audio/wav".into(),
        size: 1_048_576,
        url: format!("https://files.example.com/{name}"),
    }
}

/// Takes a fresh order through payment, delivery and approval.
pub async fn complete_order(db: &SqliteDatabase, cast: &Cast) -> Order {
    use marketplace_engine::{delivery_objects::NewDeliveryRequest, DeliveryApi};
    let order = insert_order(db, cast, 150_000).await;
    let order = pay_order(db, &order).await;
    let api = DeliveryApi::new(db.clone());
    let request = NewDeliveryRequest { order_id: order.id, description: None, files: vec![sample_upload("mix.wav")] };
    let (delivery, _) = api.create_delivery(&cast.seller(), request).await.expect("Error creating delivery");
    let (_, order) = api.approve_delivery(&cast.buyer(), delivery.id).await.expect("Error approving delivery");
    order
}
