use tracing::{info, warn};

use gatherpad_core::domain::{ChatId, GroupContext};

use crate::dispatch::{first_token, help_text, Request};
use crate::router::AppState;

pub(super) async fn run_request(
    state: &AppState,
    chat_id: i64,
    group: GroupContext,
    request: Request,
) {
    let chat = ChatId(chat_id);

    let outcome = match request {
        Request::Help => {
            let body = help_text(state.cfg.commands_enabled, &state.cfg.activation_keywords);
            if let Err(e) = state.messenger.send_text(chat, &body).await {
                warn!(chat_id, "failed to send help: {e}");
            }
            return;
        }
        Request::Intent(intent) => {
            state
                .handler
                .handle_and_reply(&group, intent, state.messenger.as_ref(), chat)
                .await
        }
        Request::Action { action, arg } => {
            let code = first_token(&arg);
            state
                .handler
                .handle_action_and_reply(
                    &group,
                    &action,
                    Some(&code),
                    Some(&arg),
                    state.messenger.as_ref(),
                    chat,
                )
                .await
        }
    };

    info!(
        chat_id,
        group = %group.display_name,
        status = outcome.status.as_str(),
        success = outcome.success,
        "handled notepad request"
    );
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use gatherpad_core::{
        config::{Config, NotepadConfig},
        domain::{GroupKey, MessageId, MessageRef},
        messaging::port::MessagingPort,
    };

    use super::*;
    use crate::dispatch::route;

    #[derive(Default)]
    struct RecordingMessenger {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MessagingPort for RecordingMessenger {
        async fn send_text(&self, chat_id: ChatId, text: &str) -> gatherpad_core::Result<MessageRef> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(1),
            })
        }
    }

    fn state(dir: &tempfile::TempDir, messenger: Arc<RecordingMessenger>) -> AppState {
        let cfg = Arc::new(Config {
            telegram_bot_token: "test".to_string(),
            telegram_allowed_chats: vec![],
            notepad: NotepadConfig {
                enable_timestamp: false,
                ..NotepadConfig::with_data_dir(dir.path())
            },
            commands_enabled: false,
            activation_keywords: vec!["集会码".to_string(), "集会".to_string()],
            audit_log_path: None,
            audit_log_json: true,
        });
        AppState::new(cfg, messenger).unwrap()
    }

    #[tokio::test]
    async fn keyword_actions_register_first_token_and_delete_by_line() {
        let dir = tempfile::tempdir().unwrap();
        let messenger = Arc::new(RecordingMessenger::default());
        let state = state(&dir, messenger.clone());
        let group = || GroupContext::new(GroupKey::new("-7"), "Hunters");

        for text in ["集会码 REG X1 trailing words", "集会码 reg X2", "集会码 DEL 1"] {
            let request = route(text, false, &state.keywords).unwrap();
            run_request(&state, -7, group(), request).await;
        }

        let sent = messenger.sent.lock().unwrap();
        assert_eq!(
            *sent,
            [
                "[Hunters] Gathering code registered: X1",
                "[Hunters] Gathering code registered: X2",
                "[Hunters] Deleted 1 entry. Remaining:\n1. X2",
            ]
        );
    }
}
