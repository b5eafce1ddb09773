use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, UnboundedReceiver};

use zenith::gemini::{GeminiError, GenerationRequest, StreamEvent};
use zenith::model::AiModel;
use zenith::orchestrator::{
    GenerationClient, Orchestrator, TurnUpdate, GENERATION_ERROR_TEXT,
};
use zenith::prompt::Persona;
use zenith::Role;

/// Scripted stand-in for the Gemini client: each call pops the next script
/// and delivers its events through the channel, recording the request.
#[derive(Clone, Default)]
struct FakeClient {
    scripts: Arc<Mutex<VecDeque<Vec<StreamEvent>>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl FakeClient {
    fn scripted(events: Vec<StreamEvent>) -> Self {
        let client = Self::default();
        client.push_script(events);
        client
    }

    fn push_script(&self, events: Vec<StreamEvent>) {
        self.scripts.lock().unwrap().push_back(events);
    }

    fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl GenerationClient for FakeClient {
    fn stream_generate(&self, request: GenerationRequest) -> UnboundedReceiver<StreamEvent> {
        self.requests.lock().unwrap().push(request);
        let (tx, rx) = mpsc::unbounded_channel();
        // An empty script queue models a stream that closes with no signal.
        if let Some(events) = self.scripts.lock().unwrap().pop_front() {
            for event in events {
                let _ = tx.send(event);
            }
        }
        rx
    }
}

fn api_error() -> GeminiError {
    GeminiError::Api {
        status: reqwest::StatusCode::BAD_GATEWAY,
        body: "upstream unavailable".to_string(),
    }
}

/// Drive the in-flight turn until it finishes or fails.
async fn run_turn(orchestrator: &mut Orchestrator<FakeClient>) -> TurnUpdate {
    loop {
        let update = orchestrator.tick().await.unwrap();
        if update != TurnUpdate::Delta {
            return update;
        }
    }
}

#[tokio::test]
async fn completed_turn_yields_two_messages() {
    let client = FakeClient::scripted(vec![
        StreamEvent::Delta("Hel".to_string()),
        StreamEvent::Delta("lo".to_string()),
        StreamEvent::Done,
    ]);
    let mut orchestrator = Orchestrator::new(client.clone());

    assert!(orchestrator.submit(
        "Summarize this page",
        AiModel::Flash,
        Some("Article about AI."),
        Persona::General,
    ));
    assert!(orchestrator.is_generating());

    assert_eq!(run_turn(&mut orchestrator).await, TurnUpdate::Finished);
    assert!(!orchestrator.is_generating());

    let messages = orchestrator.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].content, "Summarize this page");
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, "Hello");
    assert_eq!(messages[1].model, Some(AiModel::Flash));

    // The composed payload carries context before the prompt and the
    // persona instruction travels separately.
    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.payload.contains("CONTEXT FROM PAGE:"));
    let ctx_pos = request.payload.find("Article about AI.").unwrap();
    let prompt_pos = request.payload.find("Summarize this page").unwrap();
    assert!(ctx_pos < prompt_pos);
    assert_eq!(request.system_instruction, Persona::General.instruction());
    assert_eq!(request.model_id, "gemini-3-flash-preview");
}

#[tokio::test]
async fn content_is_invariant_to_chunking() {
    let mut finals = Vec::new();

    for chunks in [
        vec!["Habari yako, mbogi!"],
        vec!["Habari ", "yako, ", "mbogi!"],
        vec!["H", "abari yako, mbog", "i!"],
    ] {
        let mut events: Vec<StreamEvent> = chunks
            .into_iter()
            .map(|c| StreamEvent::Delta(c.to_string()))
            .collect();
        events.push(StreamEvent::Done);

        let mut orchestrator = Orchestrator::new(FakeClient::scripted(events));
        orchestrator.submit("hello", AiModel::Pro, None, Persona::General);
        run_turn(&mut orchestrator).await;
        finals.push(orchestrator.messages()[1].content.clone());
    }

    assert!(finals.iter().all(|c| c == "Habari yako, mbogi!"));
}

#[tokio::test]
async fn submit_while_generating_is_rejected() {
    let client = FakeClient::scripted(vec![
        StreamEvent::Delta("thinking".to_string()),
        StreamEvent::Done,
    ]);
    let mut orchestrator = Orchestrator::new(client.clone());

    assert!(orchestrator.submit("first", AiModel::Flash, None, Persona::General));
    let count_before = orchestrator.messages().len();

    assert!(!orchestrator.submit("second", AiModel::Flash, None, Persona::General));
    assert_eq!(orchestrator.messages().len(), count_before);
    assert_eq!(client.requests().len(), 1);
}

#[tokio::test]
async fn blank_input_is_rejected() {
    let mut orchestrator = Orchestrator::new(FakeClient::default());
    assert!(!orchestrator.submit("   ", AiModel::Flash, None, Persona::General));
    assert!(orchestrator.messages().is_empty());
    assert!(!orchestrator.is_generating());
}

#[tokio::test]
async fn failure_replaces_partial_content_with_error_text() {
    let client = FakeClient::scripted(vec![
        StreamEvent::Delta("Hel".to_string()),
        StreamEvent::Delta("lo".to_string()),
        StreamEvent::Failed(api_error()),
    ]);
    let mut orchestrator = Orchestrator::new(client);

    orchestrator.submit("first", AiModel::Flash, None, Persona::General);
    assert_eq!(run_turn(&mut orchestrator).await, TurnUpdate::Failed);

    assert!(!orchestrator.is_generating());
    assert_eq!(orchestrator.messages()[1].content, GENERATION_ERROR_TEXT);
}

#[tokio::test]
async fn failure_leaves_prior_turns_untouched() {
    let client = FakeClient::scripted(vec![
        StreamEvent::Delta("All good.".to_string()),
        StreamEvent::Done,
    ]);
    client.push_script(vec![StreamEvent::Failed(api_error())]);
    let mut orchestrator = Orchestrator::new(client);

    orchestrator.submit("first", AiModel::Flash, None, Persona::General);
    run_turn(&mut orchestrator).await;

    orchestrator.submit("second", AiModel::Flash, None, Persona::General);
    assert_eq!(run_turn(&mut orchestrator).await, TurnUpdate::Failed);

    let messages = orchestrator.messages();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[1].content, "All good.");
    assert_eq!(messages[3].content, GENERATION_ERROR_TEXT);

    // Conversation remains usable after a failed turn.
    assert!(!orchestrator.is_generating());
}

#[tokio::test]
async fn stream_closing_without_terminal_signal_is_a_failure() {
    // Script delivers one delta and then the channel just closes: that is
    // indistinguishable from a dead transport, never an empty success.
    let client = FakeClient::scripted(vec![StreamEvent::Delta("Hel".to_string())]);
    let mut orchestrator = Orchestrator::new(client);

    orchestrator.submit("hello", AiModel::Flash, None, Persona::General);
    assert_eq!(run_turn(&mut orchestrator).await, TurnUpdate::Failed);
    assert_eq!(orchestrator.messages()[1].content, GENERATION_ERROR_TEXT);
}

#[tokio::test]
async fn clear_discards_everything_mid_generation() {
    let client = FakeClient::scripted(vec![
        StreamEvent::Delta("in flight".to_string()),
        StreamEvent::Done,
    ]);
    client.push_script(vec![StreamEvent::Done]);
    let mut orchestrator = Orchestrator::new(client);

    orchestrator.submit("hello", AiModel::Flash, None, Persona::General);
    assert_eq!(orchestrator.tick().await.unwrap(), TurnUpdate::Delta);

    orchestrator.clear();
    assert!(orchestrator.messages().is_empty());
    assert!(!orchestrator.is_generating());

    // A fresh turn starts cleanly after the clear.
    assert!(orchestrator.submit("again", AiModel::Flash, None, Persona::General));
    run_turn(&mut orchestrator).await;
    assert_eq!(orchestrator.messages().len(), 2);
}

#[tokio::test]
async fn cancel_keeps_streamed_content_and_returns_to_idle() {
    let client = FakeClient::scripted(vec![
        StreamEvent::Delta("partial ".to_string()),
        StreamEvent::Delta("answer".to_string()),
        StreamEvent::Delta("never seen".to_string()),
        StreamEvent::Done,
    ]);
    let mut orchestrator = Orchestrator::new(client);

    orchestrator.submit("hello", AiModel::Flash, None, Persona::General);
    assert_eq!(orchestrator.tick().await.unwrap(), TurnUpdate::Delta);
    assert_eq!(orchestrator.tick().await.unwrap(), TurnUpdate::Delta);

    orchestrator.cancel();
    assert!(!orchestrator.is_generating());
    assert_eq!(orchestrator.messages()[1].content, "partial answer");

    // Cancel while idle is a no-op.
    orchestrator.cancel();
    assert_eq!(orchestrator.messages().len(), 2);
}

#[tokio::test]
async fn deep_think_resolves_to_pro_with_budget() {
    let client = FakeClient::scripted(vec![StreamEvent::Done]);
    let mut orchestrator = Orchestrator::new(client.clone());

    orchestrator.submit("hard question", AiModel::DeepThink, None, Persona::General);
    run_turn(&mut orchestrator).await;

    let requests = client.requests();
    assert_eq!(requests[0].model_id, "gemini-3-pro-preview");
    assert_eq!(requests[0].config.thinking_budget, Some(16000));
}

#[tokio::test]
async fn slang_prompt_carries_lexical_hints() {
    let client = FakeClient::scripted(vec![StreamEvent::Done]);
    let mut orchestrator = Orchestrator::new(client.clone());

    orchestrator.submit(
        "that's so fiti",
        AiModel::Flash,
        None,
        Persona::SlangAware,
    );
    run_turn(&mut orchestrator).await;

    let request = &client.requests()[0];
    assert!(request.payload.contains("LEXICAL HINTS:"));
    assert!(request.payload.contains("fiti: cool, good, or okay"));
    assert_eq!(request.system_instruction, Persona::SlangAware.instruction());
}

#[tokio::test]
async fn plain_prompt_carries_no_hint_block() {
    let client = FakeClient::scripted(vec![StreamEvent::Done]);
    let mut orchestrator = Orchestrator::new(client.clone());

    orchestrator.submit("nothing special", AiModel::Flash, None, Persona::General);
    run_turn(&mut orchestrator).await;

    assert!(!client.requests()[0].payload.contains("LEXICAL HINTS:"));
}
