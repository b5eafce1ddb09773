use anyhow::{bail, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::AiModel;

/// The role of a chat message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One unit of conversation history.
///
/// User content is immutable after creation. Assistant content is
/// append-only while its stream is open and frozen once the stream ends,
/// errors, or is cancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub model: Option<AiModel>,
    pub timestamp: DateTime<Local>,
}

/// Ordered, append-only message history.
///
/// Insertion order is authoritative; timestamps exist only for display.
/// At most one assistant message is open (mid-stream) at a time — the
/// orchestrator serializes turns.
#[derive(Default)]
pub struct Conversation {
    messages: Vec<Message>,
    open: Option<Uuid>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a user message. Always succeeds.
    pub fn append_user(&mut self, text: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.messages.push(Message {
            id,
            role: Role::User,
            content: text.to_string(),
            model: None,
            timestamp: Local::now(),
        });
        id
    }

    /// Append an empty assistant placeholder and mark it open for streaming.
    pub fn begin_assistant(&mut self, model: AiModel) -> Uuid {
        let id = Uuid::new_v4();
        self.messages.push(Message {
            id,
            role: Role::Assistant,
            content: String::new(),
            model: Some(model),
            timestamp: Local::now(),
        });
        self.open = Some(id);
        id
    }

    /// Concatenate a streamed delta onto the open assistant message.
    ///
    /// Failing the lookup means the orchestrator's state machine is
    /// corrupted, so this is a hard error rather than a silent no-op.
    pub fn append_delta(&mut self, id: Uuid, text: &str) -> Result<()> {
        if self.open != Some(id) {
            bail!("appendDelta against message {id} which is not open");
        }
        let message = self
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| anyhow::anyhow!("no message with id {id}"))?;
        message.content.push_str(text);
        Ok(())
    }

    /// Seal the open assistant message, freezing its content.
    pub fn finalize(&mut self, id: Uuid) {
        if self.open == Some(id) {
            self.open = None;
        }
    }

    /// Replace the message's content with a user-visible error string and
    /// seal it. Idempotent.
    pub fn set_error(&mut self, id: Uuid, error_text: &str) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            message.content = error_text.to_string();
        }
        self.finalize(id);
    }

    /// Discard all messages, including any in-flight content. No undo.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.open = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_keep_append_order() {
        let mut conversation = Conversation::new();
        conversation.append_user("first");
        let id = conversation.begin_assistant(AiModel::Flash);
        conversation.append_delta(id, "reply").unwrap();
        conversation.finalize(id);
        conversation.append_user("second");

        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(conversation.messages()[1].content, "reply");
    }

    #[test]
    fn deltas_concatenate_in_order() {
        let mut conversation = Conversation::new();
        let id = conversation.begin_assistant(AiModel::Pro);
        for chunk in ["Hel", "lo", ", ", "world"] {
            conversation.append_delta(id, chunk).unwrap();
        }
        assert_eq!(conversation.messages()[0].content, "Hello, world");
    }

    #[test]
    fn delta_against_unknown_id_errors() {
        let mut conversation = Conversation::new();
        conversation.begin_assistant(AiModel::Flash);
        assert!(conversation.append_delta(Uuid::new_v4(), "x").is_err());
    }

    #[test]
    fn delta_after_finalize_errors() {
        let mut conversation = Conversation::new();
        let id = conversation.begin_assistant(AiModel::Flash);
        conversation.append_delta(id, "done").unwrap();
        conversation.finalize(id);
        assert!(conversation.append_delta(id, "late").is_err());
        assert_eq!(conversation.messages()[0].content, "done");
    }

    #[test]
    fn set_error_replaces_content_and_is_idempotent() {
        let mut conversation = Conversation::new();
        let id = conversation.begin_assistant(AiModel::Flash);
        conversation.append_delta(id, "partial").unwrap();
        conversation.set_error(id, "Error: Failed to fetch response.");
        conversation.set_error(id, "Error: Failed to fetch response.");
        assert_eq!(
            conversation.messages()[0].content,
            "Error: Failed to fetch response."
        );
        assert!(conversation.append_delta(id, "late").is_err());
    }

    #[test]
    fn clear_discards_everything_including_open_message() {
        let mut conversation = Conversation::new();
        conversation.append_user("hi");
        let id = conversation.begin_assistant(AiModel::Flash);
        conversation.append_delta(id, "in flight").unwrap();
        conversation.clear();
        assert!(conversation.is_empty());
        assert!(conversation.append_delta(id, "late").is_err());
    }

    #[test]
    fn user_messages_carry_no_model() {
        let mut conversation = Conversation::new();
        conversation.append_user("hi");
        let id = conversation.begin_assistant(AiModel::DeepThink);
        assert_eq!(conversation.messages()[0].model, None);
        assert_eq!(conversation.messages()[1].model, Some(AiModel::DeepThink));
        conversation.finalize(id);
    }
}
