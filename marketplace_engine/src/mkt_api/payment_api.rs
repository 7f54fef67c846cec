use std::fmt::Debug;

use log::*;
use mkt_common::helpers::truncate_chars;
use tokio::time::timeout;

use crate::{
    db_types::{
        NewPayment,
        Order,
        OrderStatusType,
        Payment,
        PaymentMethod,
        PaymentStatus,
        PaymentUpdate,
        ReconciledPayment,
    },
    events::{EventProducers, OrderAnnulledEvent, OrderPaidEvent},
    lifecycle::REFUNDABLE,
    mkt_api::payment_objects::{
        map_gateway_status,
        CallbackOutcome,
        CheckoutConfig,
        NewPaymentRequest,
        PaymentIntent,
        RefundResult,
        UpdatePaymentRequest,
    },
    policy::{self, Actor},
    traits::{
        CatalogManagement,
        CheckoutRequest,
        MarketplaceError,
        OrderManagement,
        PaymentManagement,
        PaymentProvider,
        ProviderError,
    },
};

const MAX_ITEM_DESCRIPTION: usize = 255;

/// `PaymentApi` opens gateway checkouts for orders and reconciles the gateway's asynchronous notifications.
///
/// Reconciliation is safe under duplicate and out-of-order notifications: the `PENDING_PAYMENT -> PAID` transition is
/// a conditional update, and settled payments are never moved backwards.
pub struct PaymentApi<B, P> {
    db: B,
    provider: P,
    config: CheckoutConfig,
    producers: EventProducers,
}

impl<B, P> Debug for PaymentApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentApi")
    }
}

impl<B, P> PaymentApi<B, P> {
    pub fn new(db: B, provider: P, config: CheckoutConfig, producers: EventProducers) -> Self {
        Self { db, provider, config, producers }
    }
}

impl<B, P> PaymentApi<B, P>
where B: OrderManagement + PaymentManagement
{
    async fn fetch_visible_order(&self, actor: &Actor, order_id: i64) -> Result<Order, MarketplaceError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        policy::view_order(actor, &order).enforce(|| MarketplaceError::OrderNotFound(order_id))?;
        Ok(order)
    }

    /// Fetches a payment together with its order, hiding payments on orders the caller cannot see.
    async fn fetch_payment_and_order(
        &self,
        actor: &Actor,
        payment_id: i64,
    ) -> Result<(Payment, Order), MarketplaceError> {
        let payment = self.db.fetch_payment(payment_id).await?.ok_or(MarketplaceError::PaymentNotFound(payment_id))?;
        let order = self
            .db
            .fetch_order(payment.order_id)
            .await?
            .ok_or(MarketplaceError::PaymentNotFound(payment_id))?;
        policy::view_payment(actor, &order).enforce(|| MarketplaceError::PaymentNotFound(payment_id))?;
        Ok((payment, order))
    }

    pub async fn list_payments(&self, actor: &Actor) -> Result<Vec<Payment>, MarketplaceError> {
        self.db.fetch_payments_for_user(actor.scope()).await
    }

    pub async fn fetch_payment(&self, actor: &Actor, payment_id: i64) -> Result<Payment, MarketplaceError> {
        self.fetch_payment_and_order(actor, payment_id).await.map(|(p, _)| p)
    }

    /// Records a payment made outside the gateway. The payment starts out `pending`; an admin settles it with
    /// [`Self::update_payment`].
    pub async fn create_payment(&self, actor: &Actor, request: NewPaymentRequest) -> Result<Payment, MarketplaceError> {
        let order = self.fetch_visible_order(actor, request.order_id).await?;
        policy::record_payment(actor, &order).enforce(|| MarketplaceError::OrderNotFound(order.id))?;
        require_pending_payment(&order)?;
        request.check_against(&order)?;
        let mut payment = NewPayment::for_order(&order, request.payment_method);
        payment.transaction_id = request.transaction_id;
        payment.description = request.description;
        let payment = self.db.insert_payment(payment).await?;
        info!("💳️ Payment {} recorded for order {} by user {}", payment.id, order.id, actor.user_id);
        Ok(payment)
    }

    /// Changes a payment's status. Completing a payment pays for the order exactly as a gateway notification would.
    pub async fn update_payment(
        &self,
        actor: &Actor,
        payment_id: i64,
        request: UpdatePaymentRequest,
    ) -> Result<Payment, MarketplaceError> {
        let (payment, order) = self.fetch_payment_and_order(actor, payment_id).await?;
        policy::update_payment(actor, &order).enforce(|| MarketplaceError::PaymentNotFound(payment_id))?;
        if payment.status != request.status && !payment.status.can_become(request.status) {
            return Err(MarketplaceError::StatusConflict(format!(
                "Payment {payment_id} is {} and cannot become {}",
                payment.status, request.status
            )));
        }
        let update = PaymentUpdate { payment_id, status: request.status, transaction_id: request.transaction_id };
        let result = self.db.reconcile_payment(update).await?;
        self.publish_reconciliation(&result).await;
        info!("💳️ Payment {payment_id} set to {} by user {}", result.payment.status, actor.user_id);
        Ok(result.payment)
    }

    async fn publish_reconciliation(&self, result: &ReconciledPayment) {
        if let Some(order) = &result.paid_order {
            self.producers.publish_order_paid(OrderPaidEvent::new(order.clone())).await;
        }
        if let Some((order, previous)) = &result.annulled_order {
            self.producers.publish_order_annulled(OrderAnnulledEvent::new(order.clone(), *previous)).await;
        }
    }

    /// Refunds a completed payment and cancels its order, atomically. Only the seller (or an admin) can refund.
    pub async fn process_refund(&self, actor: &Actor, payment_id: i64) -> Result<RefundResult, MarketplaceError> {
        let (payment, order) = self.fetch_payment_and_order(actor, payment_id).await?;
        policy::refund_payment(actor, &order).enforce(|| MarketplaceError::PaymentNotFound(payment_id))?;
        if payment.status != PaymentStatus::Completed {
            return Err(MarketplaceError::StatusConflict(format!(
                "Only completed payments can be refunded. Payment {payment_id} is {}",
                payment.status
            )));
        }
        if !REFUNDABLE.contains(&order.status) {
            return Err(MarketplaceError::IllegalTransition { from: order.status, to: OrderStatusType::Canceled });
        }
        let (payment, updated) = self.db.refund_payment(payment_id, order.status).await?;
        info!("💳️ Payment {payment_id} refunded by user {}. Order {} cancelled.", actor.user_id, updated.id);
        self.producers.publish_order_annulled(OrderAnnulledEvent::new(updated.clone(), order.status)).await;
        Ok(RefundResult { payment, order: updated })
    }
}

impl<B, P> PaymentApi<B, P>
where
    B: OrderManagement + PaymentManagement + CatalogManagement,
    P: PaymentProvider,
{
    /// Opens a gateway checkout for the order.
    ///
    /// A `pending` payment is recorded first. If the gateway fails or does not answer in time, that payment is marked
    /// `failed` so it does not linger as pending. The order status is never changed here.
    pub async fn create_intent(&self, actor: &Actor, order_id: i64) -> Result<PaymentIntent, MarketplaceError> {
        let order = self.fetch_visible_order(actor, order_id).await?;
        policy::create_payment_intent(actor, &order).enforce(|| MarketplaceError::OrderNotFound(order_id))?;
        require_pending_payment(&order)?;
        let service = self
            .db
            .fetch_service(order.service_id)
            .await?
            .ok_or(MarketplaceError::ServiceNotFound(order.service_id))?;
        let payer_email = self.db.fetch_user(order.buyer_id).await?.map(|u| u.email);
        let payment = NewPayment::for_order(&order, PaymentMethod::MercadoPago).with_description(service.title.clone());
        let payment = self.db.insert_payment(payment).await?;
        let request = CheckoutRequest {
            order_id,
            service_id: service.id,
            title: service.title.clone(),
            description: truncate_chars(service.description.as_deref().unwrap_or(&service.title), MAX_ITEM_DESCRIPTION),
            unit_price: order.amount.to_major_units(&order.currency),
            currency: order.currency.clone(),
            payer_email,
            success_url: self.config.back_url("success", order_id),
            failure_url: self.config.back_url("failure", order_id),
            pending_url: self.config.back_url("pending", order_id),
            notification_url: self.config.notification_url(),
        };
        debug!("💳️ Creating checkout for order {order_id}: {} {}", request.unit_price, request.currency);
        let outcome = timeout(self.config.gateway_timeout, self.provider.create_preference(&request)).await;
        let preference = match outcome {
            Ok(Ok(preference)) => preference,
            Ok(Err(e)) => {
                warn!("💳️ The gateway could not create a checkout for order {order_id}. {e}");
                self.fail_payment(payment.id).await;
                return Err(MarketplaceError::GatewayUnavailable(e.to_string()));
            },
            Err(_) => {
                let secs = self.config.gateway_timeout.as_secs();
                warn!("💳️ The gateway did not answer within {secs}s for order {order_id}");
                self.fail_payment(payment.id).await;
                return Err(MarketplaceError::GatewayTimeout(secs));
            },
        };
        let payment = self.db.set_payment_intent_id(payment.id, &preference.preference_id).await?;
        info!("💳️ Checkout {} opened for order {order_id} (payment {})", preference.preference_id, payment.id);
        Ok(PaymentIntent { init_point: preference.init_point, preference_id: preference.preference_id, payment_id: payment.id })
    }

    async fn fail_payment(&self, payment_id: i64) {
        let update = PaymentUpdate { payment_id, status: PaymentStatus::Failed, transaction_id: None };
        if let Err(e) = self.db.reconcile_payment(update).await {
            error!("💳️ Could not mark payment {payment_id} as failed. {e}");
        }
    }

    /// Reconciles a gateway notification.
    ///
    /// The notification only carries the gateway's payment id; everything else is fetched from the gateway. Unknown
    /// references and orders without a gateway payment are soft successes, so that the gateway stops retrying.
    pub async fn handle_callback(
        &self,
        event_type: Option<&str>,
        gateway_payment_id: &str,
    ) -> Result<CallbackOutcome, MarketplaceError> {
        let event_type = event_type.unwrap_or("payment");
        if event_type != "payment" {
            debug!("💳️ Ignoring {event_type} notification for {gateway_payment_id}");
            return Ok(CallbackOutcome::Ignored);
        }
        let gateway_payment = timeout(self.config.gateway_timeout, self.provider.fetch_payment(gateway_payment_id))
            .await
            .map_err(|_| MarketplaceError::GatewayTimeout(self.config.gateway_timeout.as_secs()))?
            .map_err(|e: ProviderError| MarketplaceError::GatewayUnavailable(e.to_string()))?;
        let reference = gateway_payment.external_reference.clone().unwrap_or_default();
        let Ok(order_id) = reference.trim().parse::<i64>() else {
            warn!("💳️ Gateway payment {gateway_payment_id} has an unknown reference: '{reference}'");
            return Ok(CallbackOutcome::UnknownReference(reference));
        };
        let Some(local) = self.db.fetch_latest_payment(order_id, PaymentMethod::MercadoPago).await? else {
            warn!("💳️ Gateway payment {gateway_payment_id} refers to order {order_id}, which has no checkout on record");
            return Ok(CallbackOutcome::NoLocalPayment(order_id));
        };
        let status = map_gateway_status(&gateway_payment.status);
        debug!(
            "💳️ Gateway payment {gateway_payment_id} is '{}'. Applying {status} to payment {}",
            gateway_payment.status, local.id
        );
        let update = PaymentUpdate { payment_id: local.id, status, transaction_id: Some(gateway_payment.id.clone()) };
        let result = self.db.reconcile_payment(update).await?;
        if let Some(order) = &result.paid_order {
            info!("💳️ Order {} paid by gateway payment {gateway_payment_id}", order.id);
        }
        if let Some((order, _)) = &result.annulled_order {
            info!("💳️ Order {} cancelled. Gateway payment {gateway_payment_id} was refunded.", order.id);
        }
        self.publish_reconciliation(&result).await;
        Ok(CallbackOutcome::Reconciled(result))
    }
}

fn require_pending_payment(order: &Order) -> Result<(), MarketplaceError> {
    match order.status {
        OrderStatusType::PendingPayment => Ok(()),
        OrderStatusType::Requested => {
            Err(MarketplaceError::StatusConflict(format!("Order {} needs seller approval first", order.id)))
        },
        status => Err(MarketplaceError::StatusConflict(format!("Order {} is {status} and cannot be paid", order.id))),
    }
}
