//! Server-side subscribers to the engine's event hooks.
//!
//! Outbound email and push delivery live outside this service, so the hooks log what they would hand over.
use futures::future::BoxFuture;
use log::*;
use marketplace_engine::events::{EventHandlers, EventHooks, NotificationDispatched, OrderAnnulledEvent};

pub const EVENT_BUFFER_SIZE: usize = 25;

pub fn create_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|ev| {
        info!("📬️ Order {} is paid. The seller ({}) can start work.", ev.order.id, ev.order.seller_id);
        no_op()
    });
    hooks.on_order_annulled(|ev| {
        let OrderAnnulledEvent { order, previous_status } = ev;
        info!("📬️ Order {} was annulled while {previous_status}. It is now {}.", order.id, order.status);
        no_op()
    });
    hooks.on_notification(|ev| {
        let NotificationDispatched { notification } = ev;
        debug!(
            "📣️ {} for user {}: {} ({})",
            notification.event, notification.recipient_id, notification.payload.title, notification.payload.message
        );
        no_op()
    });
    EventHandlers::new(EVENT_BUFFER_SIZE, hooks)
}

fn no_op() -> BoxFuture<'static, ()> {
    Box::pin(async {})
}
