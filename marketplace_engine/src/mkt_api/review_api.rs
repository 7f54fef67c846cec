use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, OrderStatusType, Review},
    mkt_api::review_objects::{NewReviewRequest, ReviewQuery, UpdateReviewRequest},
    policy::{self, Actor},
    traits::{MarketplaceError, OrderManagement, ReviewManagement},
};

/// `ReviewApi` manages buyer reviews of completed orders. The backend keeps the service and seller rating aggregates
/// in step with every write.
pub struct ReviewApi<B> {
    db: B,
}

impl<B> Debug for ReviewApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReviewApi")
    }
}

impl<B> ReviewApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> ReviewApi<B>
where B: ReviewManagement + OrderManagement
{
    /// Leaves a review on a completed order. There can only be one review per order.
    pub async fn create_review(&self, actor: &Actor, request: NewReviewRequest) -> Result<Review, MarketplaceError> {
        let order_id = request.order_id;
        let order = self.db.fetch_order(order_id).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        policy::create_review(actor, &order).enforce(|| MarketplaceError::OrderNotFound(order_id))?;
        if order.status != OrderStatusType::Completed {
            return Err(MarketplaceError::StatusConflict(format!(
                "Order {order_id} is {} and can only be reviewed once it is COMPLETED",
                order.status
            )));
        }
        let review = self.db.insert_review(request.into_new_review(actor.user_id)?).await?;
        info!("⭐️ User {} rated order {order_id} with {} stars", actor.user_id, review.rating);
        Ok(review)
    }

    pub async fn update_review(
        &self,
        actor: &Actor,
        review_id: i64,
        request: UpdateReviewRequest,
    ) -> Result<Review, MarketplaceError> {
        let (rating, comment) = request.into_parts()?;
        let (review, order) = self.fetch_with_order(review_id).await?;
        policy::modify_review(actor, &review, &order).enforce(|| MarketplaceError::ReviewNotFound(review_id))?;
        let review = self.db.update_review(review_id, rating, comment).await?;
        info!("⭐️ Review {review_id} updated by user {}", actor.user_id);
        Ok(review)
    }

    pub async fn delete_review(&self, actor: &Actor, review_id: i64) -> Result<Review, MarketplaceError> {
        let (review, order) = self.fetch_with_order(review_id).await?;
        policy::modify_review(actor, &review, &order).enforce(|| MarketplaceError::ReviewNotFound(review_id))?;
        let review = self.db.delete_review(review_id).await?;
        info!("⭐️ Review {review_id} deleted by user {}", actor.user_id);
        Ok(review)
    }

    pub async fn fetch_review(&self, actor: &Actor, review_id: i64) -> Result<Review, MarketplaceError> {
        let (review, order) = self.fetch_with_order(review_id).await?;
        policy::view_review(actor, &review, &order).enforce(|| MarketplaceError::ReviewNotFound(review_id))?;
        Ok(review)
    }

    /// Reviews are public when listed per service or per seller. With no filter, the caller gets the reviews they
    /// are involved in (admins get all of them).
    pub async fn list_reviews(&self, actor: &Actor, query: ReviewQuery) -> Result<Vec<Review>, MarketplaceError> {
        match query {
            ReviewQuery { service_id: Some(id), .. } => self.reviews_for_service(id).await,
            ReviewQuery { user_id: Some(id), .. } => self.reviews_by_user(id).await,
            ReviewQuery { .. } => self.db.fetch_reviews_involving(actor.scope()).await,
        }
    }

    pub async fn reviews_for_service(&self, service_id: i64) -> Result<Vec<Review>, MarketplaceError> {
        self.db.fetch_reviews_for_service(service_id).await
    }

    /// Reviews the user received as a seller.
    pub async fn reviews_by_user(&self, user_id: i64) -> Result<Vec<Review>, MarketplaceError> {
        self.db.fetch_reviews_for_seller(user_id).await
    }

    async fn fetch_with_order(&self, review_id: i64) -> Result<(Review, Order), MarketplaceError> {
        let review = self.db.fetch_review(review_id).await?.ok_or(MarketplaceError::ReviewNotFound(review_id))?;
        let order =
            self.db.fetch_order(review.order_id).await?.ok_or(MarketplaceError::ReviewNotFound(review_id))?;
        Ok((review, order))
    }
}
