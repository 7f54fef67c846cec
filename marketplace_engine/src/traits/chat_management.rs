use crate::{
    db_types::{Chat, Message, NewMessage},
    traits::{ChatSummary, MarketplaceError},
};

#[allow(async_fn_in_trait)]
pub trait ChatManagement {
    /// Returns the chat for the order, creating it if it does not exist yet.
    ///
    /// This is safe to call concurrently for the same order: the unique index on `order_id` guarantees a single chat,
    /// and every caller receives that chat. The order's `chat_id` is stamped if it is not already set.
    async fn create_chat_for_order(&self, order_id: i64) -> Result<Chat, MarketplaceError>;

    async fn fetch_chat(&self, chat_id: i64) -> Result<Option<Chat>, MarketplaceError>;

    /// The user's chats with ids strictly below `cursor` (if given), newest first.
    async fn fetch_chats_for_user(
        &self,
        user_id: i64,
        cursor: Option<i64>,
        limit: i64,
    ) -> Result<Vec<ChatSummary>, MarketplaceError>;

    /// Messages in the chat with ids strictly below `cursor` (if given), newest first.
    async fn fetch_messages(
        &self,
        chat_id: i64,
        cursor: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Message>, MarketplaceError>;

    async fn fetch_message(&self, chat_id: i64, message_id: i64) -> Result<Option<Message>, MarketplaceError>;

    /// Stores the message. Messages with a sender also queue a `CHAT_MESSAGE` notification for the other participant.
    async fn insert_message(&self, message: NewMessage) -> Result<Message, MarketplaceError>;

    /// Sets `read_at` on the message if it is unread and was not sent by `reader_id`. Returns `None` when nothing was
    /// updated.
    async fn mark_message_read(
        &self,
        chat_id: i64,
        message_id: i64,
        reader_id: i64,
    ) -> Result<Option<Message>, MarketplaceError>;

    /// Marks every unread message in the chat sent by someone other than `reader_id` as read. System messages are
    /// left alone. Returns the number of messages updated.
    async fn mark_all_read(&self, chat_id: i64, reader_id: i64) -> Result<u64, MarketplaceError>;

    /// Messages in the chat that were sent by the counterpart and that `user_id` has not read.
    async fn unread_count(&self, chat_id: i64, user_id: i64) -> Result<i64, MarketplaceError>;
}
