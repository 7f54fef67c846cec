use serde::{Deserialize, Serialize};

use crate::{db_types::NewReview, traits::MarketplaceError};

pub const MAX_COMMENT_CHARS: usize = 1000;

fn check_rating(rating: i64) -> Result<(), MarketplaceError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(MarketplaceError::InvalidRequest(format!("Rating must be between 1 and 5, not {rating}")))
    }
}

/// Trims the comment, treating a blank comment as no comment.
fn clean_comment(comment: Option<String>) -> Result<Option<String>, MarketplaceError> {
    let Some(comment) = comment else { return Ok(None) };
    let comment = comment.trim();
    let len = comment.chars().count();
    if len > MAX_COMMENT_CHARS {
        return Err(MarketplaceError::InvalidRequest(format!(
            "Review comments are limited to {MAX_COMMENT_CHARS} characters. This one has {len}"
        )));
    }
    Ok((!comment.is_empty()).then(|| comment.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReviewRequest {
    pub order_id: i64,
    pub rating: i64,
    pub comment: Option<String>,
}

impl NewReviewRequest {
    pub fn into_new_review(self, user_id: i64) -> Result<NewReview, MarketplaceError> {
        check_rating(self.rating)?;
        let comment = clean_comment(self.comment)?;
        Ok(NewReview { order_id: self.order_id, user_id, rating: self.rating, comment })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

impl UpdateReviewRequest {
    /// Validates the request and returns the cleaned `(rating, comment)` pair.
    ///
    /// A comment that is present but blank comes back as `Some(None)`, which clears the stored comment.
    pub fn into_parts(self) -> Result<(Option<i64>, Option<Option<String>>), MarketplaceError> {
        if self.rating.is_none() && self.comment.is_none() {
            return Err(MarketplaceError::InvalidRequest("Nothing to update".into()));
        }
        if let Some(rating) = self.rating {
            check_rating(rating)?;
        }
        let comment = self.comment.map(|c| clean_comment(Some(c))).transpose()?;
        Ok((self.rating, comment))
    }
}

/// Which reviews `GET /reviews` should return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuery {
    pub service_id: Option<i64>,
    pub user_id: Option<i64>,
}
