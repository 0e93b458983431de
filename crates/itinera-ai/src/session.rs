//! Conversation session management.
//!
//! A `Session` owns the chat history, the itinerary state (through the
//! tool dispatcher), and the bounded request/tool-call/response loop
//! that keeps them in sync with the backend exchange.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use itinera_common::{Activity, Itinerary, Message, MessageRole, SessionId, UserProfile};

use crate::dispatch::{ItineraryCallback, SuggestionsCallback, ToolDispatcher};
use crate::gemini::{GeminiClient, GeminiConfig};
use crate::usage::UsageTracker;
use crate::{AiClient, Role, SessionError, ToolDefinition, WireMessage};

/// Hard cap on tool-call rounds within a single turn.
pub const MAX_TOOL_ROUNDS: u32 = 8;

/// Substitute reply when the backend is unreachable mid-turn.
pub const FALLBACK_REPLY: &str =
    "I'm having trouble connecting to the travel network right now. Please try again.";

/// Shown when the assistant finishes a tool round with no closing text.
const SILENT_UPDATE_REPLY: &str = "I've updated your plan.";

/// Where a turn currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPhase {
    #[default]
    Done,
    AwaitingAssistant,
    DispatchingTools,
    Failed,
}

/// The final outcome of one turn.
#[derive(Debug, Clone)]
pub struct AssistantReply {
    pub text: String,
    /// Snapshot of the suggestion chips attached to this reply.
    pub suggestions: Vec<String>,
}

pub type PendingChoicesCallback = Box<dyn Fn(&[Activity]) + Send + Sync>;

/// Guard that clears the `busy` flag on drop, ensuring it is always released
/// even if the future is cancelled or an early return occurs.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    /// Attempt to acquire the busy lock. Returns `Err` if already busy.
    fn acquire(flag: &'a AtomicBool) -> Result<Self, SessionError> {
        if flag
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(SessionError::Busy);
        }
        Ok(Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A planning conversation with message history and itinerary state.
pub struct Session {
    id: SessionId,
    client: Arc<dyn AiClient>,
    /// System prompt, sent as `systemInstruction` on every exchange.
    system_prompt: Option<String>,
    /// Declared tool set.
    tools: Vec<ToolDefinition>,
    /// Append-only chat history (user / assistant text only).
    messages: Vec<Message>,
    /// Itinerary + suggestion state, mutated only through dispatch.
    dispatcher: ToolDispatcher,
    /// Transient mutually exclusive options awaiting a user pick.
    pending_choices: Vec<Activity>,
    on_pending_choices: Option<PendingChoicesCallback>,
    tracker: UsageTracker,
    max_tool_rounds: u32,
    cancel: CancellationToken,
    phase: TurnPhase,
    /// Whether a turn is currently in flight.
    busy: AtomicBool,
}

impl Session {
    pub fn new(client: Arc<dyn AiClient>) -> Self {
        Self {
            id: SessionId::new(),
            client,
            system_prompt: None,
            tools: Vec::new(),
            messages: Vec::new(),
            dispatcher: ToolDispatcher::new(),
            pending_choices: Vec::new(),
            on_pending_choices: None,
            tracker: UsageTracker::new(),
            max_tool_rounds: MAX_TOOL_ROUNDS,
            cancel: CancellationToken::new(),
            phase: TurnPhase::Done,
            busy: AtomicBool::new(false),
        }
    }

    /// Establish a session against the live Gemini backend with the
    /// concierge prompt and tool set. Fatal when the key is missing; no
    /// retry.
    pub fn initialize(profile: Option<&UserProfile>) -> Result<Self, SessionError> {
        let config = GeminiConfig::from_env()
            .ok_or_else(|| SessionError::Initialization("GEMINI_API_KEY is not set".into()))?;
        Ok(Self::with_config(config, profile))
    }

    /// Like [`Session::initialize`] but with an explicit config.
    pub fn with_config(config: GeminiConfig, profile: Option<&UserProfile>) -> Self {
        Self::new(Arc::new(GeminiClient::new(config)))
            .with_system_prompt(crate::prompt::build_system_prompt(profile))
            .with_tools(crate::tools::planner_tools())
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_max_tool_rounds(mut self, max: u32) -> Self {
        self.max_tool_rounds = max;
        self
    }

    pub fn on_itinerary_update(mut self, callback: ItineraryCallback) -> Self {
        self.dispatcher.set_on_itinerary_update(callback);
        self
    }

    pub fn on_suggestions_update(mut self, callback: SuggestionsCallback) -> Self {
        self.dispatcher.set_on_suggestions_update(callback);
        self
    }

    pub fn on_pending_choices(mut self, callback: PendingChoicesCallback) -> Self {
        self.on_pending_choices = Some(callback);
        self
    }

    /// Send a user message and run the exchange loop until the assistant
    /// produces a final text reply.
    ///
    /// Tool calls within one assistant response are dispatched in
    /// received order and their results sent back as a single follow-up
    /// message, paired by invocation id. Transport failures are absorbed
    /// into a fixed fallback reply; only the busy guard, the round cap,
    /// and cancellation surface as errors.
    pub async fn send_turn(
        &mut self,
        text: impl Into<String>,
    ) -> Result<AssistantReply, SessionError> {
        let _guard = BusyGuard::acquire(&self.busy)?;

        // New turn: stale ephemera must not attach to the next reply.
        self.dispatcher.begin_turn();
        if !self.pending_choices.is_empty() {
            self.pending_choices.clear();
            if let Some(cb) = &self.on_pending_choices {
                cb(&self.pending_choices);
            }
        }

        self.messages.push(Message::user(text.into()));

        // Wire-level exchange for this turn; discarded on failure so the
        // persisted history never carries a half-finished round.
        let mut contents = self.build_contents();
        let mut rounds = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                self.phase = TurnPhase::Failed;
                return Err(SessionError::Cancelled);
            }

            self.phase = TurnPhase::AwaitingAssistant;
            let response = match self.client.send_message(&contents, &self.tools).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(session = %self.id, %err, "backend exchange failed, substituting fallback reply");
                    self.phase = TurnPhase::Failed;
                    self.messages
                        .push(Message::assistant(FALLBACK_REPLY, Vec::new()));
                    return Ok(AssistantReply {
                        text: FALLBACK_REPLY.to_string(),
                        suggestions: Vec::new(),
                    });
                }
            };
            self.tracker.record(&response.usage);

            if response.tool_calls.is_empty() {
                let text = if response.content.is_empty() {
                    SILENT_UPDATE_REPLY.to_string()
                } else {
                    response.content
                };
                let suggestions = self.dispatcher.suggestions().to_vec();
                self.messages
                    .push(Message::assistant(text.clone(), suggestions.clone()));
                self.phase = TurnPhase::Done;
                return Ok(AssistantReply { text, suggestions });
            }

            rounds += 1;
            if rounds > self.max_tool_rounds {
                warn!(session = %self.id, rounds, "tool-call loop cap hit");
                self.phase = TurnPhase::Failed;
                return Err(SessionError::ToolLoopExceeded(self.max_tool_rounds));
            }

            self.phase = TurnPhase::DispatchingTools;
            debug!(
                session = %self.id,
                round = rounds,
                calls = response.tool_calls.len(),
                "dispatching tool batch"
            );
            let results = self.dispatcher.dispatch_batch(&response.tool_calls);
            contents.push(WireMessage::model_turn(
                response.content,
                response.tool_calls,
            ));
            contents.push(WireMessage::tool_results(results));
        }
    }

    /// Offer a transient set of mutually exclusive activity options.
    /// Cleared automatically when the next turn starts.
    pub fn set_pending_choices(&mut self, options: Vec<Activity>) {
        self.pending_choices = options;
        if let Some(cb) = &self.on_pending_choices {
            cb(&self.pending_choices);
        }
    }

    /// Resolve a pending choice by index, clearing the whole set. The
    /// caller phrases the follow-up turn that persists the pick.
    pub fn select_pending_choice(&mut self, index: usize) -> Option<Activity> {
        if index >= self.pending_choices.len() {
            return None;
        }
        let chosen = self.pending_choices.swap_remove(index);
        self.pending_choices.clear();
        if let Some(cb) = &self.on_pending_choices {
            cb(&self.pending_choices);
        }
        Some(chosen)
    }

    pub fn pending_choices(&self) -> &[Activity] {
        &self.pending_choices
    }

    /// Token for aborting in-flight turns before their next round.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Current itinerary snapshot.
    pub fn itinerary(&self) -> &Itinerary {
        self.dispatcher.itinerary()
    }

    /// Suggestion chips for the latest assistant message.
    pub fn suggestions(&self) -> &[String] {
        self.dispatcher.suggestions()
    }

    /// Get the full conversation history.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages in history.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Get the usage tracker.
    pub fn tracker(&self) -> &UsageTracker {
        &self.tracker
    }

    fn build_contents(&self) -> Vec<WireMessage> {
        let mut msgs = Vec::new();
        if let Some(ref system) = self.system_prompt {
            msgs.push(WireMessage::system(system.clone()));
        }
        for message in &self.messages {
            let role = match message.role {
                MessageRole::User => Role::User,
                MessageRole::Assistant => Role::Model,
            };
            msgs.push(WireMessage::text(role, message.text.clone()));
        }
        msgs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{SUGGEST_NEXT_STEPS, UPDATE_ITINERARY};
    use crate::{AiError, AiResponse, Part, TokenUsage, ToolCall};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend double that replays a fixed script and records every
    /// request it receives.
    struct ScriptedClient {
        script: Mutex<VecDeque<Result<AiResponse, AiError>>>,
        requests: Mutex<Vec<Vec<WireMessage>>>,
    }

    impl ScriptedClient {
        fn new(script: Vec<Result<AiResponse, AiError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn request(&self, index: usize) -> Vec<WireMessage> {
            self.requests.lock().unwrap()[index].clone()
        }
    }

    #[async_trait]
    impl AiClient for ScriptedClient {
        async fn send_message(
            &self,
            messages: &[WireMessage],
            _tools: &[ToolDefinition],
        ) -> Result<AiResponse, AiError> {
            self.requests.lock().unwrap().push(messages.to_vec());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AiError::ApiError("script exhausted".into())))
        }
    }

    fn text_response(text: &str) -> Result<AiResponse, AiError> {
        Ok(AiResponse {
            content: text.to_string(),
            tool_calls: Vec::new(),
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 5,
            },
        })
    }

    fn tool_response(calls: Vec<ToolCall>) -> Result<AiResponse, AiError> {
        Ok(AiResponse {
            content: String::new(),
            tool_calls: calls,
            usage: TokenUsage::default(),
        })
    }

    fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }
    }

    #[tokio::test]
    async fn plain_text_turn_appends_history() {
        let client = ScriptedClient::new(vec![text_response("Where would you like to go?")]);
        let mut session = Session::new(client).with_system_prompt("concierge");

        let reply = session.send_turn("Help me plan a trip").await.unwrap();
        assert_eq!(reply.text, "Where would you like to go?");
        assert_eq!(session.message_count(), 2);
        assert_eq!(session.messages()[0].role, MessageRole::User);
        assert_eq!(session.messages()[1].role, MessageRole::Assistant);
        assert_eq!(session.phase(), TurnPhase::Done);
        assert_eq!(session.tracker().exchange_count(), 1);
    }

    #[tokio::test]
    async fn end_to_end_update_turn() {
        let client = ScriptedClient::new(vec![
            tool_response(vec![tool_call(
                "call-1",
                UPDATE_ITINERARY,
                serde_json::json!({
                    "destination": "Paris",
                    "adults": 2,
                    "days": [{
                        "date": "Day 1",
                        "activities": [{ "time": "10:00 AM", "title": "Louvre Museum" }]
                    }],
                    "totalEstimatedCost": "$800"
                }),
            )]),
            text_response("Here's your plan!"),
        ]);
        let mut session = Session::new(client.clone());

        let reply = session
            .send_turn("Plan a 2-day trip to Paris for 2 adults")
            .await
            .unwrap();

        assert_eq!(reply.text, "Here's your plan!");
        assert_eq!(session.itinerary().days.len(), 1);
        assert_eq!(
            session.itinerary().total_estimated_cost.as_deref(),
            Some("$800")
        );
        assert_eq!(session.itinerary().travelers.adults, 2);

        // Second request carries the function round-trip, paired by id.
        let follow_up = client.request(1);
        let last = follow_up.last().unwrap();
        assert_eq!(last.role, Role::User);
        match &last.parts[0] {
            Part::FunctionResponse(result) => {
                assert_eq!(result.id, "call-1");
                assert_eq!(result.name, UPDATE_ITINERARY);
            }
            other => panic!("expected function response, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn suggestions_cleared_on_next_turn() {
        let client = ScriptedClient::new(vec![
            tool_response(vec![tool_call(
                "call-1",
                SUGGEST_NEXT_STEPS,
                serde_json::json!({ "suggestions": ["Swap the hotel", "Add a museum tour"] }),
            )]),
            text_response("How does this look?"),
            // Turn 2 never calls suggestNextSteps.
            text_response("Noted!"),
        ]);
        let mut session = Session::new(client);

        let first = session.send_turn("Plan something").await.unwrap();
        assert_eq!(first.suggestions, ["Swap the hotel", "Add a museum tour"]);
        assert_eq!(session.messages()[1].suggestions.len(), 2);

        let second = session.send_turn("Looks good").await.unwrap();
        assert!(second.suggestions.is_empty());
        assert!(session.suggestions().is_empty());
    }

    #[tokio::test]
    async fn partial_batch_failure_still_updates_and_continues() {
        let client = ScriptedClient::new(vec![
            tool_response(vec![
                tool_call(
                    "call-1",
                    UPDATE_ITINERARY,
                    serde_json::json!({ "destination": "Paris", "days": [] }),
                ),
                tool_call("call-2", "bookHelicopter", serde_json::json!({})),
            ]),
            text_response("Done, though one request was beyond me."),
        ]);
        let mut session = Session::new(client.clone());

        let reply = session.send_turn("Plan and book everything").await.unwrap();
        assert_eq!(reply.text, "Done, though one request was beyond me.");
        assert_eq!(session.itinerary().destination, "Paris");

        // Both calls got answers in the single follow-up message.
        let follow_up = client.request(1);
        let last = follow_up.last().unwrap();
        assert_eq!(last.parts.len(), 2);
        match &last.parts[1] {
            Part::FunctionResponse(result) => {
                assert_eq!(result.id, "call-2");
                assert!(result.response["error"]
                    .as_str()
                    .unwrap()
                    .contains("bookHelicopter"));
            }
            other => panic!("expected function response, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failure_yields_fallback_reply() {
        let client = ScriptedClient::new(vec![Err(AiError::NetworkError("offline".into()))]);
        let mut session = Session::new(client);

        let reply = session.send_turn("Plan a trip").await.unwrap();
        assert_eq!(reply.text, FALLBACK_REPLY);
        assert_eq!(session.phase(), TurnPhase::Failed);
        // History stays ordered: user message then the substitute reply.
        assert_eq!(session.message_count(), 2);
        assert_eq!(session.messages()[1].text, FALLBACK_REPLY);
        // State untouched.
        assert_eq!(session.itinerary(), &Itinerary::new_shell());
    }

    #[tokio::test]
    async fn tool_loop_cap_fails_the_turn() {
        // Backend that requests a tool on every round, forever.
        struct LoopingClient;

        #[async_trait]
        impl AiClient for LoopingClient {
            async fn send_message(
                &self,
                _messages: &[WireMessage],
                _tools: &[ToolDefinition],
            ) -> Result<AiResponse, AiError> {
                tool_response(vec![tool_call(
                    "call-n",
                    UPDATE_ITINERARY,
                    serde_json::json!({ "destination": "Loop", "days": [] }),
                )])
            }
        }

        let mut session = Session::new(Arc::new(LoopingClient)).with_max_tool_rounds(3);
        let err = session.send_turn("Plan forever").await.unwrap_err();
        assert!(matches!(err, SessionError::ToolLoopExceeded(3)));
        assert_eq!(session.phase(), TurnPhase::Failed);
    }

    #[tokio::test]
    async fn cancelled_turn_fails_before_contacting_backend() {
        let client = ScriptedClient::new(vec![text_response("never sent")]);
        let mut session = Session::new(client.clone());
        session.cancel_token().cancel();

        let err = session.send_turn("Plan a trip").await.unwrap_err();
        assert!(matches!(err, SessionError::Cancelled));
        assert!(client.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_final_text_gets_default_reply() {
        let client = ScriptedClient::new(vec![Ok(AiResponse {
            content: String::new(),
            tool_calls: Vec::new(),
            usage: TokenUsage::default(),
        })]);
        let mut session = Session::new(client);
        let reply = session.send_turn("Update it").await.unwrap();
        assert_eq!(reply.text, "I've updated your plan.");
    }

    #[tokio::test]
    async fn pending_choices_cleared_at_turn_start() {
        let client = ScriptedClient::new(vec![text_response("Sure")]);
        let mut session = Session::new(client);

        session.set_pending_choices(vec![Activity {
            id: None,
            time: "7:00 PM".into(),
            end_time: None,
            title: "Le Jules Verne".into(),
            sub_title: None,
            description: String::new(),
            location: "Paris".into(),
            category: itinera_common::ActivityCategory::Dining,
            cost: None,
            notes: None,
            booking_status: None,
            image_query: None,
            is_locked: false,
        }]);
        assert_eq!(session.pending_choices().len(), 1);

        session.send_turn("Actually, something else").await.unwrap();
        assert!(session.pending_choices().is_empty());
    }

    #[test]
    fn select_pending_choice_clears_the_set() {
        let client = ScriptedClient::new(vec![]);
        let mut session = Session::new(client);
        let mut option = Activity {
            id: Some("opt-1".into()),
            time: "7:00 PM".into(),
            end_time: None,
            title: "Le Jules Verne".into(),
            sub_title: None,
            description: String::new(),
            location: "Paris".into(),
            category: itinera_common::ActivityCategory::Dining,
            cost: None,
            notes: None,
            booking_status: None,
            image_query: None,
            is_locked: false,
        };
        session.set_pending_choices(vec![option.clone(), {
            option.id = Some("opt-2".into());
            option.title = "Septime".into();
            option.clone()
        }]);

        let chosen = session.select_pending_choice(0).unwrap();
        assert_eq!(chosen.title, "Le Jules Verne");
        assert!(session.pending_choices().is_empty());
        assert!(session.select_pending_choice(0).is_none());
    }

    #[test]
    fn busy_guard_rejects_second_acquire() {
        let flag = AtomicBool::new(false);
        let guard = BusyGuard::acquire(&flag).unwrap();
        assert!(matches!(
            BusyGuard::acquire(&flag),
            Err(SessionError::Busy)
        ));
        drop(guard);
        assert!(BusyGuard::acquire(&flag).is_ok());
    }

    #[test]
    fn initialize_without_key_is_fatal() {
        std::env::remove_var("GEMINI_API_KEY");
        let err = Session::initialize(None).err().expect("must not initialize");
        assert!(matches!(err, SessionError::Initialization(_)));
    }
}
