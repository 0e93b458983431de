//! Typed tool-call dispatch.
//!
//! Tool arguments arrive as an untyped JSON bag; they are parsed here,
//! at the boundary, into a tagged `ToolRequest` so no string-name
//! branching survives past this point. The dispatcher is the only
//! component allowed to mutate the itinerary or the suggestion channel,
//! and it never touches the chat history.

use serde::Deserialize;
use tracing::{debug, info, warn};

use itinera_common::Itinerary;

use crate::merge::{merge_update, ItineraryUpdate};
use crate::suggestions::SuggestionChannel;
use crate::tools::{SEARCH_FLIGHTS, SUGGEST_NEXT_STEPS, UPDATE_ITINERARY};
use crate::{ToolCall, ToolResult};

/// Raised (and absorbed) when the assistant invokes an undeclared tool.
/// The offending call fails locally; siblings in the batch still run.
#[derive(Debug, thiserror::Error)]
#[error("unknown tool requested: {name}")]
pub struct UnknownToolError {
    pub name: String,
}

/// A tool invocation parsed into its typed payload.
#[derive(Debug)]
pub enum ToolRequest {
    UpdateItinerary(ItineraryUpdate),
    SearchFlights {
        origin: String,
        destination: String,
        date: String,
    },
    SuggestNextSteps {
        suggestions: Vec<String>,
    },
    Unrecognized {
        name: String,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FlightQuery {
    origin: String,
    destination: String,
    date: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SuggestionArgs {
    suggestions: Vec<String>,
}

impl ToolRequest {
    /// Parse a raw call. Malformed arguments degrade to an empty payload
    /// of the right shape rather than failing the call.
    pub fn parse(call: &ToolCall) -> Self {
        match call.name.as_str() {
            UPDATE_ITINERARY => {
                let update = serde_json::from_value(call.arguments.clone()).unwrap_or_else(|e| {
                    debug!(tool = UPDATE_ITINERARY, error = %e, "malformed arguments, defaulting");
                    ItineraryUpdate::default()
                });
                Self::UpdateItinerary(update)
            }
            SEARCH_FLIGHTS => {
                let query: FlightQuery =
                    serde_json::from_value(call.arguments.clone()).unwrap_or_default();
                Self::SearchFlights {
                    origin: query.origin,
                    destination: query.destination,
                    date: query.date,
                }
            }
            SUGGEST_NEXT_STEPS => {
                let args: SuggestionArgs =
                    serde_json::from_value(call.arguments.clone()).unwrap_or_default();
                Self::SuggestNextSteps {
                    suggestions: args.suggestions,
                }
            }
            other => Self::Unrecognized {
                name: other.to_string(),
            },
        }
    }
}

pub type ItineraryCallback = Box<dyn Fn(&Itinerary) + Send + Sync>;
pub type SuggestionsCallback = Box<dyn Fn(&[String]) + Send + Sync>;

/// Resolves one batch of tool calls against the session state.
pub struct ToolDispatcher {
    itinerary: Itinerary,
    suggestions: SuggestionChannel,
    on_itinerary_update: Option<ItineraryCallback>,
    on_suggestions_update: Option<SuggestionsCallback>,
}

impl ToolDispatcher {
    pub fn new() -> Self {
        Self {
            itinerary: Itinerary::new_shell(),
            suggestions: SuggestionChannel::new(),
            on_itinerary_update: None,
            on_suggestions_update: None,
        }
    }

    pub fn set_on_itinerary_update(&mut self, callback: ItineraryCallback) {
        self.on_itinerary_update = Some(callback);
    }

    pub fn set_on_suggestions_update(&mut self, callback: SuggestionsCallback) {
        self.on_suggestions_update = Some(callback);
    }

    pub fn itinerary(&self) -> &Itinerary {
        &self.itinerary
    }

    pub fn suggestions(&self) -> &[String] {
        self.suggestions.current()
    }

    /// Called when a new user turn starts: stale suggestions must not
    /// attach to the next assistant message.
    pub fn begin_turn(&mut self) {
        if !self.suggestions.is_empty() {
            self.suggestions.clear();
            if let Some(cb) = &self.on_suggestions_update {
                cb(self.suggestions.current());
            }
        }
    }

    /// Resolve every call in received order; each gets a result paired
    /// by invocation id. A failing call never blocks its siblings.
    pub fn dispatch_batch(&mut self, calls: &[ToolCall]) -> Vec<ToolResult> {
        calls
            .iter()
            .map(|call| ToolResult {
                id: call.id.clone(),
                name: call.name.clone(),
                response: self.dispatch_one(call),
            })
            .collect()
    }

    fn dispatch_one(&mut self, call: &ToolCall) -> serde_json::Value {
        match ToolRequest::parse(call) {
            ToolRequest::UpdateItinerary(update) => {
                merge_update(&mut self.itinerary, update);
                info!(
                    days = self.itinerary.days.len(),
                    activities = self.itinerary.activity_count(),
                    "itinerary updated"
                );
                if let Some(cb) = &self.on_itinerary_update {
                    cb(&self.itinerary);
                }
                // Always acknowledged: merge failures must not derail the
                // conversation.
                serde_json::json!({ "result": "Itinerary updated successfully on screen." })
            }
            ToolRequest::SearchFlights {
                origin,
                destination,
                date,
            } => {
                debug!(%origin, %destination, %date, "simulated flight search");
                serde_json::json!({
                    "result": "Simulated Search: Delta DL123 ($400), United UA456 ($420)."
                })
            }
            ToolRequest::SuggestNextSteps { suggestions } => {
                if self.suggestions.set(suggestions) {
                    if let Some(cb) = &self.on_suggestions_update {
                        cb(self.suggestions.current());
                    }
                }
                serde_json::json!({ "result": "Suggestions received." })
            }
            ToolRequest::Unrecognized { name } => {
                let err = UnknownToolError { name };
                warn!(%err, "tool call failed");
                serde_json::json!({ "error": err.to_string() })
            }
        }
    }
}

impl Default for ToolDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
