use std::{
    sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
    },
    time::Duration,
};

use futures_util::FutureExt;
use log::*;
use marketplace_engine::{
    db_types::{NewPayment, OrderStatusType, PaymentMethod, PaymentStatus},
    events::{EventHandlers, EventHooks},
    payment_objects::{CheckoutConfig, UpdatePaymentRequest},
    traits::PaymentManagement,
    OrderFlowApi,
    PaymentApi,
};
use tokio::runtime::Runtime;

use crate::support::{
    fixtures::{insert_order, seed_cast, ScriptedGateway},
    prepare_env::{new_test_db, tear_down},
};

mod support;

#[derive(Default, Clone)]
struct HookCalled {
    called: Arc<AtomicI32>,
}

impl HookCalled {
    pub fn called(&self) {
        let _ = self.called.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> i32 {
        self.called.load(Ordering::SeqCst)
    }
}

#[test]
fn order_paid_and_annulled_hooks() {
    let rt = Runtime::new().unwrap();
    let paid = HookCalled::default();
    let annulled = HookCalled::default();
    let (paid_copy, annulled_copy) = (paid.clone(), annulled.clone());
    rt.block_on(async move {
        let db = new_test_db().await;
        let cast = seed_cast(&db).await;
        let mut hooks = EventHooks::default();
        hooks
            .on_order_paid(move |ev| {
                info!("🪝️ Order {} paid", ev.order.id);
                let hook = paid_copy.clone();
                async move { hook.called() }.boxed()
            })
            .on_order_annulled(move |ev| {
                info!("🪝️ Order {} annulled from {}", ev.order.id, ev.previous_status);
                let hook = annulled_copy.clone();
                async move { hook.called() }.boxed()
            });
        let handlers = EventHandlers::new(10, hooks);
        let producers = handlers.producers();
        handlers.start_handlers().await;

        let orders = OrderFlowApi::new(db.clone(), producers.clone());
        let payments = PaymentApi::new(db.clone(), ScriptedGateway::default(), CheckoutConfig::default(), producers);

        let order = insert_order(&db, &cast, 150_000).await;
        let payment = db.insert_payment(NewPayment::for_order(&order, PaymentMethod::Manual)).await.unwrap();
        let settle = UpdatePaymentRequest { status: PaymentStatus::Completed, transaction_id: None };
        payments.update_payment(&cast.admin(), payment.id, settle.clone()).await.unwrap();
        // Settling again does not pay twice
        payments.update_payment(&cast.admin(), payment.id, settle).await.unwrap();

        let other = insert_order(&db, &cast, 90_000).await;
        let cancelled = orders.cancel_order(&cast.buyer(), other.id).await.expect("Error cancelling order");
        assert_eq!(cancelled.status, OrderStatusType::Canceled);
        payments.process_refund(&cast.seller(), payment.id).await.expect("Error refunding");

        drop(orders);
        drop(payments);
        tokio::time::sleep(Duration::from_millis(300)).await;
        tear_down(db).await;
    });
    assert_eq!(paid.count(), 1);
    assert_eq!(annulled.count(), 2);
    info!("🪝️ test complete");
}
