use std::sync::Arc;

use futures_util::future::BoxFuture;
use log::*;

use crate::{
    db_types::Notification,
    events::{EventHandler, EventProducer, Handler, NotificationDispatched, OrderAnnulledEvent, OrderPaidEvent},
    traits::{NotificationError, NotificationSink},
};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_paid_producer: Vec<EventProducer<OrderPaidEvent>>,
    pub order_annulled_producer: Vec<EventProducer<OrderAnnulledEvent>>,
    pub notification_producer: Vec<EventProducer<NotificationDispatched>>,
}

impl EventProducers {
    pub async fn publish_order_paid(&self, event: OrderPaidEvent) {
        for producer in &self.order_paid_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_order_annulled(&self, event: OrderAnnulledEvent) {
        for producer in &self.order_annulled_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

/// The pub-sub hooks double as the notification sink. A notification is delivered once it has been handed to every
/// subscriber; with no subscribers it is only logged.
impl NotificationSink for EventProducers {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        info!(
            "📣️ {} notification for user {} (order {})",
            notification.event, notification.recipient_id, notification.payload.order_id
        );
        if self.notification_producer.iter().any(|p| p.is_closed()) {
            return Err(NotificationError::SinkClosed);
        }
        for producer in &self.notification_producer {
            producer.publish_event(NotificationDispatched::new(notification.clone())).await;
        }
        Ok(())
    }
}

pub struct EventHandlers {
    pub on_order_paid: Option<EventHandler<OrderPaidEvent>>,
    pub on_order_annulled: Option<EventHandler<OrderAnnulledEvent>>,
    pub on_notification: Option<EventHandler<NotificationDispatched>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_paid = hooks.on_order_paid.map(|f| EventHandler::new(buffer_size, f));
        let on_order_annulled = hooks.on_order_annulled.map(|f| EventHandler::new(buffer_size, f));
        let on_notification = hooks.on_notification.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_paid, on_order_annulled, on_notification }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_paid {
            result.order_paid_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_annulled {
            result.order_annulled_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_notification {
            result.notification_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_paid {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_annulled {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_notification {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_paid: Option<Handler<OrderPaidEvent>>,
    pub on_order_annulled: Option<Handler<OrderAnnulledEvent>>,
    pub on_notification: Option<Handler<NotificationDispatched>>,
}

impl EventHooks {
    pub fn on_order_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderPaidEvent) -> BoxFuture<'static, ()>) + Send + Sync + 'static {
        self.on_order_paid = Some(Arc::new(f));
        self
    }

    pub fn on_order_annulled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderAnnulledEvent) -> BoxFuture<'static, ()>) + Send + Sync + 'static {
        self.on_order_annulled = Some(Arc::new(f));
        self
    }

    pub fn on_notification<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(NotificationDispatched) -> BoxFuture<'static, ()>) + Send + Sync + 'static {
        self.on_notification = Some(Arc::new(f));
        self
    }
}
