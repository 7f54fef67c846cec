use crate::{
    db_types::{NewService, NewUser, Service, User},
    traits::MarketplaceError,
};

/// Read access to the catalog and account records the order workflow depends on.
///
/// Catalog and account CRUD are owned by other services. The insert methods exist so that fixtures and
/// administrative tooling can seed a fresh database.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn fetch_service(&self, service_id: i64) -> Result<Option<Service>, MarketplaceError>;

    async fn insert_service(&self, service: NewService) -> Result<Service, MarketplaceError>;

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, MarketplaceError>;

    async fn insert_user(&self, user: NewUser) -> Result<User, MarketplaceError>;
}
