use std::future::pending;

use anyhow::Result;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use crate::conversation::{Conversation, Message};
use crate::gemini::{GeminiClient, GenerationRequest, StreamEvent};
use crate::lexicon::Lexicon;
use crate::model::AiModel;
use crate::prompt::{self, Persona};

/// Fixed user-visible text that replaces an assistant message when its
/// stream fails. Partial content is discarded, not preserved.
pub const GENERATION_ERROR_TEXT: &str = "Error: Failed to fetch response.";

/// Seam between the orchestrator and the backend, so tests can substitute
/// a scripted stream producer for the real HTTP client.
pub trait GenerationClient {
    fn stream_generate(&self, request: GenerationRequest) -> UnboundedReceiver<StreamEvent>;
}

impl GenerationClient for GeminiClient {
    fn stream_generate(&self, request: GenerationRequest) -> UnboundedReceiver<StreamEvent> {
        GeminiClient::stream_generate(self, request)
    }
}

/// What a call to [`Orchestrator::tick`] did to the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnUpdate {
    /// A delta was appended to the open assistant message.
    Delta,
    /// The stream completed; the turn is over.
    Finished,
    /// The stream failed; the placeholder now holds the error text.
    Failed,
}

struct ActiveTurn {
    message_id: Uuid,
    rx: UnboundedReceiver<StreamEvent>,
}

/// Drives one conversation: composes prompts, resolves models, consumes
/// generation streams, and projects them into the message history.
///
/// One generation is in flight at a time; submission while generating is
/// rejected rather than queued.
pub struct Orchestrator<C: GenerationClient> {
    client: C,
    lexicon: Lexicon,
    conversation: Conversation,
    active: Option<ActiveTurn>,
}

impl<C: GenerationClient> Orchestrator<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            lexicon: Lexicon::sheng(),
            conversation: Conversation::new(),
            active: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn is_generating(&self) -> bool {
        self.active.is_some()
    }

    /// Start a new turn. Returns false (leaving history untouched) when the
    /// input is blank or a generation is already in flight.
    ///
    /// Context and persona are captured here; toggling them later does not
    /// affect the request already being streamed.
    pub fn submit(
        &mut self,
        input: &str,
        model: AiModel,
        context: Option<&str>,
        persona: Persona,
    ) -> bool {
        let input = input.trim();
        if input.is_empty() || self.active.is_some() {
            return false;
        }

        self.conversation.append_user(input);
        let message_id = self.conversation.begin_assistant(model);

        let hints = self.lexicon.annotate(input);
        let payload = prompt::compose(input, context, &hints);
        let (model_id, config) = model.resolve();

        let request = GenerationRequest {
            model_id: model_id.to_string(),
            config,
            payload,
            system_instruction: persona.instruction().to_string(),
        };

        tracing::info!(
            model = model.as_str(),
            persona = persona.as_str(),
            with_context = context.is_some(),
            hints = hints.len(),
            "starting generation turn"
        );

        let rx = self.client.stream_generate(request);
        self.active = Some(ActiveTurn { message_id, rx });
        true
    }

    /// Await the next stream event and apply it to the conversation.
    ///
    /// Pends forever while idle, so the caller can park this in a
    /// `tokio::select!` arm alongside UI events. A store lookup failure
    /// here means the state machine is corrupted and propagates as an
    /// error instead of being swallowed.
    pub async fn tick(&mut self) -> Result<TurnUpdate> {
        let Some(turn) = self.active.as_mut() else {
            pending::<()>().await;
            unreachable!();
        };
        let message_id = turn.message_id;

        match turn.rx.recv().await {
            Some(StreamEvent::Delta(text)) => {
                self.conversation.append_delta(message_id, &text)?;
                Ok(TurnUpdate::Delta)
            }
            Some(StreamEvent::Done) => {
                self.conversation.finalize(message_id);
                self.active = None;
                tracing::info!("generation turn finished");
                Ok(TurnUpdate::Finished)
            }
            Some(StreamEvent::Failed(e)) => {
                tracing::warn!(error = %e, "generation turn failed");
                self.conversation.set_error(message_id, GENERATION_ERROR_TEXT);
                self.active = None;
                Ok(TurnUpdate::Failed)
            }
            // Closed without a terminal signal: indistinguishable from a
            // dead transport, so it is a failure, not an empty success.
            None => {
                tracing::warn!("generation stream closed without terminal signal");
                self.conversation.set_error(message_id, GENERATION_ERROR_TEXT);
                self.active = None;
                Ok(TurnUpdate::Failed)
            }
        }
    }

    /// Abandon the in-flight turn, keeping whatever content has already
    /// streamed in. Dropping the receiver guarantees late deltas can never
    /// land in a later message. No-op while idle.
    pub fn cancel(&mut self) {
        if let Some(turn) = self.active.take() {
            tracing::info!("generation turn cancelled");
            self.conversation.finalize(turn.message_id);
        }
    }

    /// Discard the whole history, aborting any in-flight turn.
    pub fn clear(&mut self) {
        self.active = None;
        self.conversation.clear();
    }
}
