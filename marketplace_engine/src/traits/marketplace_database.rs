use crate::traits::{
    CatalogManagement,
    ChatManagement,
    DeliveryManagement,
    MarketplaceError,
    OrderManagement,
    OutboxManagement,
    PaymentManagement,
    ReviewManagement,
};

/// A complete storage backend for the marketplace engine.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase:
    Clone
    + CatalogManagement
    + OrderManagement
    + PaymentManagement
    + DeliveryManagement
    + ChatManagement
    + ReviewManagement
    + OutboxManagement
{
    /// The URL of the database
    fn url(&self) -> &str;

    async fn close(&mut self) -> Result<(), MarketplaceError>;
}
