//! Telegram update handlers.
//!
//! Each handler is a small adapter that:
//! - checks the chat allowlist
//! - routes the text to a notepad request
//! - hands the request to the core `RequestHandler` and replies

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};
use tracing::debug;

use gatherpad_core::domain::{GroupContext, GroupKey};

use crate::dispatch::route;
use crate::router::AppState;

mod notepad;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;
    if !is_chat_allowed(chat_id, &state.cfg.telegram_allowed_chats) {
        debug!(chat_id, "ignoring message from chat outside the allowlist");
        return Ok(());
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some(request) = route(text, state.cfg.commands_enabled, &state.keywords) else {
        return Ok(());
    };

    notepad::run_request(&state, chat_id, group_context(&msg), request).await;
    Ok(())
}

/// An empty allowlist admits every chat.
pub fn is_chat_allowed(chat_id: i64, allowed_chats: &[i64]) -> bool {
    allowed_chats.is_empty() || allowed_chats.contains(&chat_id)
}

/// Notes are keyed by chat id so a renamed group keeps its codes; the title
/// is only used in replies.
fn group_context(msg: &Message) -> GroupContext {
    let chat = &msg.chat;
    let display = chat
        .title()
        .or_else(|| chat.username())
        .or_else(|| chat.first_name())
        .map(str::to_string)
        .unwrap_or_else(|| chat.id.0.to_string());
    GroupContext::new(GroupKey::new(chat.id.0.to_string()), display)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowlist_semantics() {
        assert!(is_chat_allowed(42, &[]));
        assert!(is_chat_allowed(-100, &[1, -100]));
        assert!(!is_chat_allowed(7, &[1, -100]));
    }
}
