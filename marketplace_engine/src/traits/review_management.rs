use crate::{
    db_types::{NewReview, Review},
    traits::MarketplaceError,
};

/// Review storage.
///
/// Every write recomputes the rating aggregates of the reviewed service and seller inside the same transaction, by a
/// full scan of the remaining reviews.
#[allow(async_fn_in_trait)]
pub trait ReviewManagement {
    /// Stores the review. A second review for the same order fails with [`MarketplaceError::AlreadyExists`].
    async fn insert_review(&self, review: NewReview) -> Result<Review, MarketplaceError>;

    /// Fields that are `None` keep their stored value. A comment of `Some(None)` removes the comment.
    async fn update_review(
        &self,
        review_id: i64,
        rating: Option<i64>,
        comment: Option<Option<String>>,
    ) -> Result<Review, MarketplaceError>;

    async fn delete_review(&self, review_id: i64) -> Result<Review, MarketplaceError>;

    async fn fetch_review(&self, review_id: i64) -> Result<Option<Review>, MarketplaceError>;

    async fn fetch_reviews_for_service(&self, service_id: i64) -> Result<Vec<Review>, MarketplaceError>;

    /// Reviews received by the seller
    async fn fetch_reviews_for_seller(&self, seller_id: i64) -> Result<Vec<Review>, MarketplaceError>;

    /// Reviews the user wrote or that were left on orders where they were a party. `None` returns every review.
    async fn fetch_reviews_involving(&self, user_id: Option<i64>) -> Result<Vec<Review>, MarketplaceError>;
}
