use std::time::Duration;

use cucumber::World;
use marketplace_engine::{
    chat_objects::ChatLimits,
    db_types::Order,
    events::EventProducers,
    payment_objects::CheckoutConfig,
    traits::{MarketplaceDatabase, MarketplaceError, OrderManagement},
    ChatApi,
    DeliveryApi,
    OrderFlowApi,
    PaymentApi,
    ReviewApi,
    SqliteDatabase,
};

use crate::support::{
    fixtures::{seed_cast, Cast, ScriptedGateway},
    prepare_env::new_test_db,
};

#[derive(Default, Debug, World)]
pub struct MarketplaceWorld {
    pub system: Option<MarketplaceSystem>,
}

#[derive(Debug)]
pub struct MarketplaceSystem {
    pub db_url: String,
    pub db: SqliteDatabase,
    pub cast: Cast,
    pub gateway: ScriptedGateway,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub payments: PaymentApi<SqliteDatabase, ScriptedGateway>,
    pub deliveries: DeliveryApi<SqliteDatabase>,
    pub chats: ChatApi<SqliteDatabase>,
    pub reviews: ReviewApi<SqliteDatabase>,
    pub order_id: Option<i64>,
    pub delivery_id: Option<i64>,
    pub last_error: Option<MarketplaceError>,
}

impl MarketplaceSystem {
    pub async fn new() -> Self {
        let db = new_test_db().await;
        let db_url = db.url().to_string();
        let cast = seed_cast(&db).await;
        let gateway = ScriptedGateway::default();
        let producers = EventProducers::default();
        let config = CheckoutConfig { gateway_timeout: Duration::from_secs(2), ..CheckoutConfig::default() };
        Self {
            orders: OrderFlowApi::new(db.clone(), producers.clone()),
            payments: PaymentApi::new(db.clone(), gateway.clone(), config, producers),
            deliveries: DeliveryApi::new(db.clone()),
            chats: ChatApi::new(db.clone(), ChatLimits::default()),
            reviews: ReviewApi::new(db.clone()),
            db_url,
            db,
            cast,
            gateway,
            order_id: None,
            delivery_id: None,
            last_error: None,
        }
    }

    pub fn order_id(&self) -> i64 {
        self.order_id.expect("No order has been placed yet")
    }

    pub async fn order(&self) -> Order {
        self.db.fetch_order(self.order_id()).await.expect("Error fetching order").expect("Order does not exist")
    }
}

impl MarketplaceWorld {
    pub fn system(&mut self) -> &mut MarketplaceSystem {
        self.system.as_mut().expect("The marketplace has not been set up")
    }
}
