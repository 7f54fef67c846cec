use cucumber::{given, then, when};
use marketplace_engine::{
    chat_objects::SendMessageRequest,
    db_types::OrderStatusType,
    delivery_objects::{FileUpload, NewDeliveryRequest, RevisionRequest},
    order_objects::NewOrderRequest,
    policy::Actor,
    review_objects::NewReviewRequest,
    traits::CatalogManagement,
};

use crate::cucumber::{world::MarketplaceSystem, MarketplaceWorld};

fn actor(sys: &MarketplaceSystem, who: &str) -> Actor {
    match who {
        "buyer" => sys.cast.buyer(),
        "seller" => sys.cast.seller(),
        "admin" => sys.cast.admin(),
        "stranger" => sys.cast.stranger(),
        _ => panic!("Unknown actor: {who}"),
    }
}

#[given("a marketplace with a buyer, a seller and a service")]
async fn marketplace(world: &mut MarketplaceWorld) {
    world.system = Some(MarketplaceSystem::new().await);
}

async fn place_order(world: &mut MarketplaceWorld, amount: i64, as_request: bool) {
    let sys = world.system();
    let request = NewOrderRequest {
        service_id: sys.cast.service.id,
        seller_id: sys.cast.seller.id,
        amount,
        currency: "ARS".into(),
        as_request,
    };
    let order = sys.orders.create_order(&sys.cast.buyer(), request).await.expect("Error placing order");
    sys.order_id = Some(order.id);
}

#[when(expr = "the buyer requests a quote for {int} centavos")]
async fn request_quote(world: &mut MarketplaceWorld, amount: i64) {
    place_order(world, amount, true).await;
}

#[when(expr = "the buyer places an order for {int} centavos")]
async fn place_direct_order(world: &mut MarketplaceWorld, amount: i64) {
    place_order(world, amount, false).await;
}

#[when("the seller approves the request")]
async fn approve_request(world: &mut MarketplaceWorld) {
    let sys = world.system();
    sys.orders.approve_request(&sys.cast.seller(), sys.order_id()).await.expect("Error approving request");
}

#[when("the seller starts work")]
async fn start_work(world: &mut MarketplaceWorld) {
    let sys = world.system();
    sys.orders.start_work(&sys.cast.seller(), sys.order_id()).await.expect("Error starting work");
}

#[when("the buyer opens a checkout")]
async fn open_checkout(world: &mut MarketplaceWorld) {
    let sys = world.system();
    let intent = sys.payments.create_intent(&sys.cast.buyer(), sys.order_id()).await.expect("Error opening checkout");
    assert!(intent.init_point.starts_with("https://"));
}

#[when(expr = "the gateway reports payment {word} as {word}")]
async fn gateway_notification(world: &mut MarketplaceWorld, payment_id: String, status: String) {
    let sys = world.system();
    let reference = sys.order_id().to_string();
    sys.gateway.set_payment(&payment_id, &status, Some(&reference));
    sys.payments.handle_callback(Some("payment"), &payment_id).await.expect("Error handling notification");
}

#[when(expr = "the seller delivers {int} file(s)")]
async fn deliver(world: &mut MarketplaceWorld, count: usize) {
    let sys = world.system();
    let files = (1..=count)
        .map(|i| FileUpload {
            filename: format!("take{i}.wav"),
            mime_type: "audio/wav".into(),
            size: 1024,
            url: format!("https://files.example.com/take{i}.wav"),
        })
        .collect();
    let request = NewDeliveryRequest { order_id: sys.order_id(), description: None, files };
    let (delivery, _) = sys.deliveries.create_delivery(&sys.cast.seller(), request).await.expect("Error delivering");
    assert_eq!(delivery.files.len(), count);
    sys.delivery_id = Some(delivery.id);
}

#[when(expr = "the buyer asks for a revision saying {string}")]
async fn ask_for_revision(world: &mut MarketplaceWorld, feedback: String) {
    let sys = world.system();
    let delivery_id = sys.delivery_id.expect("Nothing has been delivered");
    let request = RevisionRequest { feedback };
    sys.deliveries.request_revision(&sys.cast.buyer(), delivery_id, request).await.expect("Error requesting revision");
}

#[when("the buyer approves the latest delivery")]
async fn approve_delivery(world: &mut MarketplaceWorld) {
    let sys = world.system();
    let delivery_id = sys.delivery_id.expect("Nothing has been delivered");
    sys.deliveries.approve_delivery(&sys.cast.buyer(), delivery_id).await.expect("Error approving delivery");
}

#[when(expr = "the {word} says {string}")]
async fn say(world: &mut MarketplaceWorld, who: String, body: String) {
    let sys = world.system();
    let order = sys.order().await;
    let chat_id = order.chat_id.expect("Order has no chat");
    let sender = actor(sys, &who);
    let request = SendMessageRequest { body, attachments: None };
    sys.chats.send_message(&sender, chat_id, request).await.expect("Error sending message");
}

#[when(expr = "the buyer rates the order {int} stars")]
async fn rate_order(world: &mut MarketplaceWorld, rating: i64) {
    let sys = world.system();
    let request = NewReviewRequest { order_id: sys.order_id(), rating, comment: None };
    sys.reviews.create_review(&sys.cast.buyer(), request).await.expect("Error rating order");
}

#[when(expr = "the {word} tries to delete the order")]
async fn try_delete(world: &mut MarketplaceWorld, who: String) {
    let sys = world.system();
    let caller = actor(sys, &who);
    sys.last_error = sys.orders.delete_order(&caller, sys.order_id()).await.err();
}

#[then(expr = "the order status is {word}")]
async fn check_status(world: &mut MarketplaceWorld, status: String) {
    let expected: OrderStatusType = status.parse().expect("Not a valid order status");
    let order = world.system().order().await;
    assert_eq!(order.status, expected);
}

#[then("the order has a chat")]
async fn check_chat(world: &mut MarketplaceWorld) {
    let order = world.system().order().await;
    assert!(order.chat_id.is_some(), "Order {} has no chat", order.id);
}

#[then(expr = "the {word} has {int} unread message(s)")]
async fn check_unread(world: &mut MarketplaceWorld, who: String, count: i64) {
    let sys = world.system();
    let chat_id = sys.order().await.chat_id.expect("Order has no chat");
    let reader = actor(sys, &who);
    let unread = sys.chats.unread_count(&reader, chat_id).await.expect("Error counting unread messages");
    assert_eq!(unread, count);
}

#[then(expr = "the service rating is {float} from {int} review(s)")]
async fn check_rating(world: &mut MarketplaceWorld, avg: f64, count: i64) {
    let sys = world.system();
    let service = sys.db.fetch_service(sys.cast.service.id).await.unwrap().expect("Service does not exist");
    assert!((service.rating_avg - avg).abs() < 1e-9, "Rating is {}", service.rating_avg);
    assert_eq!(service.rating_count, count);
}

#[then("the request fails with a conflict")]
async fn check_conflict(world: &mut MarketplaceWorld) {
    let err = world.system().last_error.take().expect("The request succeeded");
    assert!(err.is_conflict(), "Expected a conflict, got {err}");
}
