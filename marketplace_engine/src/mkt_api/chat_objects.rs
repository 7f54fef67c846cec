use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    db_types::{Chat, Message},
    traits::{ChatSummary, MarketplaceError},
};

pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Page sizes for chat listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatLimits {
    pub default_chats: i64,
    pub max_chats: i64,
    pub default_messages: i64,
    pub max_messages: i64,
}

impl Default for ChatLimits {
    fn default() -> Self {
        Self { default_chats: 20, max_chats: 100, default_messages: 50, max_messages: 100 }
    }
}

impl ChatLimits {
    pub fn with_chat_cap(mut self, cap: i64) -> Self {
        self.max_chats = cap.max(1);
        self
    }

    pub fn chats(&self, requested: Option<i64>) -> i64 {
        clamp(requested, self.default_chats, self.max_chats)
    }

    pub fn messages(&self, requested: Option<i64>) -> i64 {
        clamp(requested, self.default_messages, self.max_messages)
    }
}

fn clamp(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested.filter(|n| *n > 0).unwrap_or(default).min(max)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub cursor: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPage {
    pub chats: Vec<ChatSummary>,
    /// Pass this as `cursor` to fetch the next page. `None` on the last page.
    pub next_cursor: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatThread {
    pub chat: Chat,
    /// Newest first
    pub messages: Vec<Message>,
    pub has_more: bool,
    pub next_cursor: Option<i64>,
    pub unread_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub body: String,
    pub attachments: Option<Value>,
}

impl SendMessageRequest {
    /// Returns the trimmed body.
    pub fn body(&self) -> Result<String, MarketplaceError> {
        let body = self.body.trim();
        let len = body.chars().count();
        if len == 0 {
            return Err(MarketplaceError::InvalidRequest("Message cannot be empty".into()));
        }
        if len > MAX_MESSAGE_CHARS {
            return Err(MarketplaceError::InvalidRequest(format!(
                "Message is {len} characters long. The limit is {MAX_MESSAGE_CHARS}"
            )));
        }
        Ok(body.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkedRead {
    pub updated: u64,
}

/// Trims a result set fetched with one extra row down to `limit`, and works out the next cursor.
pub fn paginate<T, F>(mut items: Vec<T>, limit: i64, id_of: F) -> (Vec<T>, bool, Option<i64>)
where F: Fn(&T) -> i64 {
    let limit = usize::try_from(limit).unwrap_or(0);
    let has_more = items.len() > limit;
    items.truncate(limit);
    let next_cursor = if has_more { items.last().map(id_of) } else { None };
    (items, has_more, next_cursor)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn limits_are_clamped() {
        let limits = ChatLimits::default();
        assert_eq!(limits.chats(None), 20);
        assert_eq!(limits.chats(Some(500)), 100);
        assert_eq!(limits.chats(Some(0)), 20);
        assert_eq!(limits.messages(None), 50);
        assert_eq!(limits.messages(Some(7)), 7);
        assert_eq!(limits.with_chat_cap(30).chats(Some(50)), 30);
    }

    #[test]
    fn pagination() {
        let ids = vec![9, 8, 7, 6];
        let (page, has_more, cursor) = paginate(ids.clone(), 3, |i| *i);
        assert_eq!(page, vec![9, 8, 7]);
        assert!(has_more);
        assert_eq!(cursor, Some(7));
        let (page, has_more, cursor) = paginate(ids, 4, |i| *i);
        assert_eq!(page.len(), 4);
        assert!(!has_more);
        assert_eq!(cursor, None);
    }

    #[test]
    fn message_bodies() {
        let req = SendMessageRequest { body: "  hello  ".into(), attachments: None };
        assert_eq!(req.body().unwrap(), "hello");
        let req = SendMessageRequest { body: "   ".into(), attachments: None };
        assert!(req.body().is_err());
        let req = SendMessageRequest { body: "x".repeat(2001), attachments: None };
        assert!(req.body().is_err());
        let req = SendMessageRequest { body: "ñ".repeat(2000), attachments: None };
        assert!(req.body().is_ok());
    }
}
