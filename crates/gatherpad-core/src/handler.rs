//! Intent dispatch and user-facing replies.
//!
//! The handler is the only place notepad results turn into text. It never
//! returns an error: storage failures become a `StorageFailure` outcome.

use std::sync::Arc;

use tracing::warn;

use crate::{
    audit::{AuditEvent, AuditLogger},
    config::NotepadConfig,
    domain::{ChatId, GroupContext},
    errors::NoteError,
    messaging::port::MessagingPort,
    store::{DeleteResult, DeleteSpec, NoteStore, QueryResult, RegisterOptions},
};

/// A request that the host dispatcher already resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Register(String),
    Query,
    Delete(String),
}

impl Intent {
    /// Resolve the keyword-action form: an action name (`REG`, `QUE`, `DEL`,
    /// any case) plus its optional parameters.
    pub fn from_action(
        action: &str,
        register_code: Option<&str>,
        delete_spec: Option<&str>,
    ) -> Option<Self> {
        match action.trim().to_uppercase().as_str() {
            "REG" => Some(Self::Register(register_code.unwrap_or("").to_string())),
            "QUE" => Some(Self::Query),
            "DEL" => Some(Self::Delete(delete_spec.unwrap_or("").to_string())),
            _ => None,
        }
    }

    fn event_name(&self) -> &'static str {
        match self {
            Self::Register(_) => "register",
            Self::Query => "query",
            Self::Delete(_) => "delete",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Success,
    Empty,
    EmptyInput,
    DuplicateCode,
    InvalidLineSpec,
    EmptyStore,
    NoValidIndices,
    StorageFailure,
    UnknownAction,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Empty => "Empty",
            Self::EmptyInput => "EmptyInput",
            Self::DuplicateCode => "DuplicateCode",
            Self::InvalidLineSpec => "InvalidLineSpec",
            Self::EmptyStore => "EmptyStore",
            Self::NoValidIndices => "NoValidIndices",
            Self::StorageFailure => "StorageFailure",
            Self::UnknownAction => "UnknownAction",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub status: Status,
    pub message: String,
}

impl Outcome {
    fn ok(status: Status, message: String) -> Self {
        Self {
            success: true,
            status,
            message,
        }
    }

    fn fail(status: Status, message: String) -> Self {
        Self {
            success: false,
            status,
            message,
        }
    }
}

pub struct RequestHandler {
    store: Arc<NoteStore>,
    options: RegisterOptions,
    audit: Option<AuditLogger>,
}

impl RequestHandler {
    pub fn new(store: Arc<NoteStore>, cfg: &NotepadConfig) -> Self {
        Self {
            store,
            options: RegisterOptions::from(cfg),
            audit: None,
        }
    }

    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub async fn handle(&self, group: &GroupContext, intent: Intent) -> Outcome {
        let name = &group.display_name;
        let event = intent.event_name();

        let (outcome, detail) = match intent {
            Intent::Register(code) => {
                let out = self.register(group, &code).await;
                (out, Some(code))
            }
            Intent::Query => (self.query(group).await, None),
            Intent::Delete(spec) => {
                let out = self.delete(group, &spec).await;
                (out, Some(spec))
            }
        };

        if outcome.status == Status::StorageFailure {
            warn!(group = %name, event, "notepad storage failure: {}", outcome.message);
        }
        self.record(event, group, &outcome, detail.as_deref());
        outcome
    }

    /// Keyword-action entry point; unknown actions are reported, not dropped.
    pub async fn handle_action(
        &self,
        group: &GroupContext,
        action: &str,
        register_code: Option<&str>,
        delete_spec: Option<&str>,
    ) -> Outcome {
        match Intent::from_action(action, register_code, delete_spec) {
            Some(intent) => self.handle(group, intent).await,
            None => {
                let outcome = Outcome::fail(
                    Status::UnknownAction,
                    format!(
                        "[{}] Unknown gathering code action.",
                        group.display_name
                    ),
                );
                self.record("unknown", group, &outcome, Some(action));
                outcome
            }
        }
    }

    /// Handle `intent` and send the reply to `chat_id`.
    ///
    /// A failed send is logged; the outcome is still returned to the caller.
    pub async fn handle_and_reply(
        &self,
        group: &GroupContext,
        intent: Intent,
        messenger: &dyn MessagingPort,
        chat_id: ChatId,
    ) -> Outcome {
        let outcome = self.handle(group, intent).await;
        reply(messenger, chat_id, &outcome).await;
        outcome
    }

    /// Keyword-action form of [`handle_and_reply`](Self::handle_and_reply).
    pub async fn handle_action_and_reply(
        &self,
        group: &GroupContext,
        action: &str,
        register_code: Option<&str>,
        delete_spec: Option<&str>,
        messenger: &dyn MessagingPort,
        chat_id: ChatId,
    ) -> Outcome {
        let outcome = self
            .handle_action(group, action, register_code, delete_spec)
            .await;
        reply(messenger, chat_id, &outcome).await;
        outcome
    }

    async fn register(&self, group: &GroupContext, code: &str) -> Outcome {
        let name = &group.display_name;
        match self.store.register(&group.key, code, self.options).await {
            Ok(reg) => Outcome::ok(
                Status::Success,
                format!("[{name}] Gathering code registered: {}", reg.code),
            ),
            Err(NoteError::EmptyInput) => Outcome::fail(
                Status::EmptyInput,
                format!("[{name}] Can't remember thin air. Send a code to register."),
            ),
            Err(NoteError::DuplicateCode { line }) => Outcome::fail(
                Status::DuplicateCode,
                format!("[{name}] This gathering code is already registered at line {line}."),
            ),
            Err(e) => storage_failure(name, &e),
        }
    }

    async fn query(&self, group: &GroupContext) -> Outcome {
        let name = &group.display_name;
        match self.store.query(&group.key).await {
            Ok(QueryResult::Empty) => Outcome::ok(Status::Empty, empty_message(name)),
            Ok(QueryResult::Entries(lines)) => Outcome::ok(
                Status::Success,
                format!("[{name}] Gathering codes:\n{}", numbered(&lines)),
            ),
            Err(e) => storage_failure(name, &e),
        }
    }

    async fn delete(&self, group: &GroupContext, raw: &str) -> Outcome {
        let name = &group.display_name;
        let result = match DeleteSpec::parse(raw) {
            Ok(spec) => self.store.delete(&group.key, &spec).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(DeleteResult::All) => Outcome::ok(
                Status::Success,
                format!("[{name}] All gathering codes forgotten."),
            ),
            Ok(DeleteResult::EmptyStore) => Outcome::ok(Status::EmptyStore, empty_message(name)),
            Ok(DeleteResult::Deleted { count, remaining }) if remaining.is_empty() => Outcome::ok(
                Status::Success,
                format!(
                    "[{name}] Deleted {count} {}. No gathering codes left.",
                    plural(count)
                ),
            ),
            Ok(DeleteResult::Deleted { count, remaining }) => Outcome::ok(
                Status::Success,
                format!(
                    "[{name}] Deleted {count} {}. Remaining:\n{}",
                    plural(count),
                    numbered(&remaining)
                ),
            ),
            Err(NoteError::InvalidLineSpec) => Outcome::fail(
                Status::InvalidLineSpec,
                format!("[{name}] Couldn't read any line numbers. Try something like 1,3 or ALL."),
            ),
            Err(NoteError::NoValidIndices { count }) => Outcome::fail(
                Status::NoValidIndices,
                format!("[{name}] Invalid line number. There are currently {count} gathering codes."),
            ),
            Err(e) => storage_failure(name, &e),
        }
    }

    fn record(&self, event: &str, group: &GroupContext, outcome: &Outcome, detail: Option<&str>) {
        let Some(audit) = &self.audit else {
            return;
        };
        let ev = AuditEvent::new(
            event,
            group.key.as_str(),
            outcome.status.as_str(),
            outcome.success,
            detail,
        );
        if let Err(e) = audit.write(ev) {
            warn!(path = %audit.path().display(), "audit write failed: {e}");
        }
    }
}

async fn reply(messenger: &dyn MessagingPort, chat_id: ChatId, outcome: &Outcome) {
    if let Err(e) = messenger.send_text(chat_id, &outcome.message).await {
        warn!(chat_id = chat_id.0, "failed to send notepad reply: {e}");
    }
}

fn storage_failure(name: &str, e: &NoteError) -> Outcome {
    Outcome::fail(
        Status::StorageFailure,
        format!("[{name}] Something went wrong with the gathering codes: {e}"),
    )
}

fn empty_message(name: &str) -> String {
    format!("[{name}] No gathering codes yet. Nobody out hunting?")
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        "entry"
    } else {
        "entries"
    }
}

fn numbered(lines: &[String]) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(i, l)| format!("{}. {l}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
