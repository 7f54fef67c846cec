use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Chat, Message, NewMessage},
    mkt_api::chat_objects::{paginate, ChatLimits, ChatPage, ChatThread, PageQuery, SendMessageRequest},
    policy::{self, Actor},
    traits::{ChatManagement, MarketplaceError},
};

/// `ChatApi` serves the one conversation each order has between its buyer and seller.
///
/// There is no push delivery. Clients poll with descending-id cursors. Unread counts are always computed from the
/// messages themselves.
pub struct ChatApi<B> {
    db: B,
    limits: ChatLimits,
}

impl<B> Debug for ChatApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChatApi")
    }
}

impl<B> ChatApi<B> {
    pub fn new(db: B, limits: ChatLimits) -> Self {
        Self { db, limits }
    }
}

impl<B> ChatApi<B>
where B: ChatManagement
{
    /// Returns the order's chat, creating it if needed. Idempotent, and safe to call concurrently.
    pub async fn create_chat_for_order(&self, order_id: i64) -> Result<Chat, MarketplaceError> {
        self.db.create_chat_for_order(order_id).await
    }

    pub async fn list_chats(&self, actor: &Actor, page: PageQuery) -> Result<ChatPage, MarketplaceError> {
        let limit = self.limits.chats(page.limit);
        let chats = self.db.fetch_chats_for_user(actor.user_id, page.cursor, limit + 1).await?;
        let (chats, _, next_cursor) = paginate(chats, limit, |c| c.chat.id);
        Ok(ChatPage { chats, next_cursor })
    }

    pub async fn chat_with_messages(
        &self,
        actor: &Actor,
        chat_id: i64,
        page: PageQuery,
    ) -> Result<ChatThread, MarketplaceError> {
        let chat = self.fetch_chat(actor, chat_id).await?;
        let limit = self.limits.messages(page.limit);
        let messages = self.db.fetch_messages(chat_id, page.cursor, limit + 1).await?;
        let (messages, has_more, next_cursor) = paginate(messages, limit, |m| m.id);
        let unread_count = self.db.unread_count(chat_id, actor.user_id).await?;
        Ok(ChatThread { chat, messages, has_more, next_cursor, unread_count })
    }

    pub async fn send_message(
        &self,
        actor: &Actor,
        chat_id: i64,
        request: SendMessageRequest,
    ) -> Result<Message, MarketplaceError> {
        let body = request.body()?;
        self.fetch_chat(actor, chat_id).await?;
        let message = NewMessage { chat_id, sender_id: Some(actor.user_id), body, attachments: request.attachments };
        let message = self.db.insert_message(message).await?;
        debug!("💬️ User {} posted message {} in chat {chat_id}", actor.user_id, message.id);
        Ok(message)
    }

    /// Marks a single message as read. Only the recipient can do this, and only once.
    pub async fn mark_message_read(
        &self,
        actor: &Actor,
        chat_id: i64,
        message_id: i64,
    ) -> Result<Message, MarketplaceError> {
        self.fetch_chat(actor, chat_id).await?;
        let message =
            self.db.fetch_message(chat_id, message_id).await?.ok_or(MarketplaceError::MessageNotFound(message_id))?;
        match message.sender_id {
            None => return Err(MarketplaceError::InvalidRequest("System messages have no read state".into())),
            Some(sender) if sender == actor.user_id => {
                return Err(MarketplaceError::InvalidRequest("You cannot mark your own message as read".into()));
            },
            Some(_) => {},
        }
        if message.is_read() {
            return Err(MarketplaceError::InvalidRequest(format!("Message {message_id} has already been read")));
        }
        // Another request may have marked it in the meantime
        self.db
            .mark_message_read(chat_id, message_id, actor.user_id)
            .await?
            .ok_or_else(|| MarketplaceError::InvalidRequest(format!("Message {message_id} has already been read")))
    }

    /// Marks everything the counterpart sent as read. Returns the number of messages that changed.
    pub async fn mark_all_read(&self, actor: &Actor, chat_id: i64) -> Result<u64, MarketplaceError> {
        self.fetch_chat(actor, chat_id).await?;
        let updated = self.db.mark_all_read(chat_id, actor.user_id).await?;
        trace!("💬️ {updated} messages in chat {chat_id} marked read by user {}", actor.user_id);
        Ok(updated)
    }

    pub async fn unread_count(&self, actor: &Actor, chat_id: i64) -> Result<i64, MarketplaceError> {
        self.fetch_chat(actor, chat_id).await?;
        self.db.unread_count(chat_id, actor.user_id).await
    }

    async fn fetch_chat(&self, actor: &Actor, chat_id: i64) -> Result<Chat, MarketplaceError> {
        let chat = self.db.fetch_chat(chat_id).await?.ok_or(MarketplaceError::ChatNotFound(chat_id))?;
        policy::access_chat(actor, &chat).enforce(|| MarketplaceError::ChatNotFound(chat_id))?;
        Ok(chat)
    }
}
