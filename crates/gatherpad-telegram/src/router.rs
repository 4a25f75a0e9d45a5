use std::sync::Arc;

use anyhow::Context;
use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use gatherpad_core::{
    audit::AuditLogger, config::Config, handler::RequestHandler, messaging::port::MessagingPort,
    store::NoteStore,
};

use crate::dispatch::KeywordMatcher;
use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub handler: Arc<RequestHandler>,
    pub messenger: Arc<dyn MessagingPort>,
    pub keywords: KeywordMatcher,
}

impl AppState {
    pub fn new(cfg: Arc<Config>, messenger: Arc<dyn MessagingPort>) -> anyhow::Result<Self> {
        let store = Arc::new(NoteStore::from_config(&cfg.notepad));
        let mut handler = RequestHandler::new(store, &cfg.notepad);
        if let Some(path) = &cfg.audit_log_path {
            handler = handler.with_audit(AuditLogger::new(path.clone(), cfg.audit_log_json));
        }

        let keywords = KeywordMatcher::new(&cfg.activation_keywords)
            .context("invalid activation keywords")?;

        Ok(Self {
            cfg,
            handler: Arc::new(handler),
            messenger,
            keywords,
        })
    }
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => info!("gatherpad started: @{}", me.username()),
        Err(e) => warn!("get_me failed: {e}"),
    }
    info!(
        data_dir = %cfg.notepad.data_dir.display(),
        max_entries = cfg.notepad.max_entries,
        commands = cfg.commands_enabled,
        "notepad ready"
    );
    if cfg.telegram_allowed_chats.is_empty() {
        info!("no chat allowlist configured; answering every chat");
    } else {
        info!(chats = cfg.telegram_allowed_chats.len(), "chat allowlist active");
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState::new(cfg, messenger)?);

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use async_trait::async_trait;
    use gatherpad_core::{
        config::NotepadConfig,
        domain::{ChatId, MessageId, MessageRef},
    };

    use super::*;

    struct NullMessenger;

    #[async_trait]
    impl MessagingPort for NullMessenger {
        async fn send_text(&self, chat_id: ChatId, _text: &str) -> gatherpad_core::Result<MessageRef> {
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(1),
            })
        }
    }

    fn config(data_dir: PathBuf, keywords: Vec<String>) -> Arc<Config> {
        Arc::new(Config {
            telegram_bot_token: "test".to_string(),
            telegram_allowed_chats: vec![],
            notepad: NotepadConfig::with_data_dir(data_dir),
            commands_enabled: true,
            activation_keywords: keywords,
            audit_log_path: None,
            audit_log_json: true,
        })
    }

    #[tokio::test]
    async fn app_state_wires_store_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path().join("notes"), vec!["集会码".to_string()]);
        let state = AppState::new(cfg, Arc::new(NullMessenger)).unwrap();

        assert_eq!(state.handler.store().data_dir(), dir.path().join("notes"));
        assert!(state.keywords.parse("集会码").is_some());
    }
}
