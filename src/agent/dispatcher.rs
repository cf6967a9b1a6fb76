//! Tool dispatcher: explodes structured calls into concurrent search
//! invocations and merges results back per originating call.
//!
//! For every structured call in the assistant message, each of its search
//! queries becomes one [`ToolInvocation`]. All invocations of a round run
//! concurrently; when every one has resolved, results are grouped by call
//! id and exactly one tool message is emitted per call that had at least
//! one query. The responder therefore only ever sees one tool message per
//! structured call, not one per query.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::config::AgentConfig;
use super::message::{Message, StructuredCall, tool_message};
use super::search::SearchProvider;
use crate::error::AgentError;

/// One search query tied to the structured call that requested it.
///
/// Ephemeral; exists only for the duration of one dispatch round.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// ID of the originating structured call.
    pub call_id: String,
    /// The query to execute.
    pub query: String,
}

/// Dispatches one assistant message's structured calls as a concurrent
/// search round.
pub struct ToolDispatcher {
    search: Arc<dyn SearchProvider>,
    max_results: usize,
    max_concurrency: usize,
}

impl ToolDispatcher {
    /// Creates a dispatcher over the given search backend.
    #[must_use]
    pub fn new(search: Arc<dyn SearchProvider>, config: &AgentConfig) -> Self {
        Self {
            search,
            max_results: config.max_results,
            max_concurrency: config.max_concurrency.max(1),
        }
    }

    /// Executes one dispatch round for the given assistant message.
    ///
    /// Guarantees one tool message per structured call with at least one
    /// query, in the calls' original order. A failing query is dropped from
    /// its call's mapping; if every query of a call fails, an empty mapping
    /// is still emitted so the call is never left unacknowledged.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Orchestration`] only on internal task failures;
    /// individual query failures are recovered here.
    pub async fn dispatch(&self, message: &Message) -> Result<Vec<Message>, AgentError> {
        let invocations = explode(&message.structured_calls);
        debug!(
            calls = message.structured_calls.len(),
            invocations = invocations.len(),
            "dispatching search round"
        );

        let outcomes = self.execute_all(invocations).await?;

        // Accumulate {call_id -> {query -> results}} as outcomes arrive.
        let mut grouped: HashMap<String, serde_json::Map<String, serde_json::Value>> =
            HashMap::new();
        for outcome in outcomes {
            let entry = grouped.entry(outcome.call_id).or_default();
            match outcome.result {
                Ok(results) => {
                    let value = serde_json::to_value(&results).map_err(|e| {
                        AgentError::Orchestration {
                            message: format!("failed to serialize search results: {e}"),
                        }
                    })?;
                    entry.insert(outcome.query, value);
                }
                Err(e) => {
                    // Recovered: the query is omitted, the round continues.
                    warn!(query = outcome.query, error = %e, "search invocation failed");
                }
            }
        }

        // One tool message per call with >=1 query, in original call order.
        let mut messages = Vec::new();
        for call in &message.structured_calls {
            if extract_queries(call).is_empty() {
                continue;
            }
            let mapping = grouped.remove(&call.id).unwrap_or_default();
            let content = serde_json::to_string(&serde_json::Value::Object(mapping)).map_err(
                |e| AgentError::Orchestration {
                    message: format!("failed to serialize tool message: {e}"),
                },
            )?;
            messages.push(tool_message(&call.id, content));
        }

        Ok(messages)
    }

    /// Runs all invocations concurrently under the semaphore and waits for
    /// every one to resolve. No mid-round cancellation: a slow query is
    /// bounded by the search backend's per-request timeout.
    async fn execute_all(
        &self,
        invocations: Vec<ToolInvocation>,
    ) -> Result<Vec<InvocationOutcome>, AgentError> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(invocations.len());

        for invocation in invocations {
            let sem = Arc::clone(&semaphore);
            let search = Arc::clone(&self.search);
            let max_results = self.max_results;

            handles.push(tokio::spawn(async move {
                let permit = sem.acquire().await;
                let result = match permit {
                    Ok(_permit) => search.search(&invocation.query, max_results).await,
                    Err(e) => Err(AgentError::Orchestration {
                        message: format!("semaphore acquire failed: {e}"),
                    }),
                };
                InvocationOutcome {
                    call_id: invocation.call_id,
                    query: invocation.query,
                    result,
                }
            }));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for joined in join_all(handles).await {
            let outcome = joined.map_err(|e| AgentError::Orchestration {
                message: format!("search task join failed: {e}"),
            })?;
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}

impl std::fmt::Debug for ToolDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDispatcher")
            .field("search", &self.search.name())
            .field("max_results", &self.max_results)
            .field("max_concurrency", &self.max_concurrency)
            .finish()
    }
}

/// The resolved result of one invocation, tagged for re-association.
struct InvocationOutcome {
    call_id: String,
    query: String,
    result: Result<Vec<super::search::SearchResult>, AgentError>,
}

/// Explodes every call's queries into individual invocations.
fn explode(calls: &[StructuredCall]) -> Vec<ToolInvocation> {
    calls
        .iter()
        .flat_map(|call| {
            extract_queries(call)
                .into_iter()
                .map(|query| ToolInvocation {
                    call_id: call.id.clone(),
                    query,
                })
        })
        .collect()
}

/// Reads `search_queries` out of a call's raw payload.
///
/// Lenient by design: validation already happened at the responder stage,
/// and a call that somehow carries zero queries must produce no tool
/// message rather than block the round.
fn extract_queries(call: &StructuredCall) -> Vec<String> {
    serde_json::from_str::<serde_json::Value>(&call.arguments)
        .ok()
        .and_then(|v| {
            v.get("search_queries").map(|queries| {
                queries
                    .as_array()
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|q| q.as_str().map(ToString::to_string))
                            .collect()
                    })
                    .unwrap_or_default()
            })
        })
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::message::assistant_message;
    use crate::agent::schema::SchemaKind;
    use crate::agent::search::SearchResult;

    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    /// Mock backend that fails any query listed in `failing` and counts
    /// every invocation.
    struct MockSearch {
        failing: HashSet<String>,
        calls: AtomicUsize,
    }

    impl MockSearch {
        fn new(failing: &[&str]) -> Self {
            Self {
                failing: failing.iter().map(ToString::to_string).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SearchProvider for MockSearch {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn search(
            &self,
            query: &str,
            _max_results: usize,
        ) -> Result<Vec<SearchResult>, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(query) {
                return Err(AgentError::ToolInvocation {
                    query: query.to_string(),
                    message: "simulated timeout".to_string(),
                });
            }
            Ok(vec![SearchResult {
                title: format!("result for {query}"),
                url: "https://example.com".to_string(),
                content: "snippet".to_string(),
            }])
        }
    }

    fn config() -> AgentConfig {
        AgentConfig::builder()
            .api_key("k")
            .search_api_key("k")
            .build()
            .unwrap_or_else(|_| unreachable!())
    }

    fn call_with_queries(id: &str, queries: &[&str]) -> StructuredCall {
        StructuredCall {
            id: id.to_string(),
            schema: SchemaKind::AnswerQuestion,
            arguments: serde_json::json!({
                "answer": "a",
                "reflection": {"missing": "", "superfluous": ""},
                "search_queries": queries,
            })
            .to_string(),
        }
    }

    fn mapping_of(msg: &Message) -> serde_json::Map<String, serde_json::Value> {
        serde_json::from_str::<serde_json::Value>(&msg.content)
            .ok()
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_else(|| panic!("tool content is not an object: {}", msg.content))
    }

    #[tokio::test]
    async fn test_one_message_per_call_with_all_queries_merged() {
        let search = Arc::new(MockSearch::new(&[]));
        let dispatcher = ToolDispatcher::new(search, &config());
        let msg = assistant_message(
            String::new(),
            vec![call_with_queries("call_1", &["q1", "q2"])],
        );

        let out = dispatcher
            .dispatch(&msg)
            .await
            .unwrap_or_else(|e| panic!("dispatch failed: {e}"));

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].originating_call_id.as_deref(), Some("call_1"));
        let mapping = mapping_of(&out[0]);
        assert_eq!(mapping.len(), 2);
        assert!(mapping.contains_key("q1"));
        assert!(mapping.contains_key("q2"));
    }

    #[tokio::test]
    async fn test_multiple_calls_produce_one_message_each() {
        let search = Arc::new(MockSearch::new(&[]));
        let dispatcher = ToolDispatcher::new(search, &config());
        let msg = assistant_message(
            String::new(),
            vec![
                call_with_queries("call_a", &["q1"]),
                call_with_queries("call_b", &["q2", "q3"]),
            ],
        );

        let out = dispatcher
            .dispatch(&msg)
            .await
            .unwrap_or_else(|e| panic!("dispatch failed: {e}"));

        assert_eq!(out.len(), 2);
        // Original call order is preserved regardless of completion order
        assert_eq!(out[0].originating_call_id.as_deref(), Some("call_a"));
        assert_eq!(out[1].originating_call_id.as_deref(), Some("call_b"));
        assert_eq!(mapping_of(&out[1]).len(), 2);
    }

    #[tokio::test]
    async fn test_zero_query_call_produces_no_message() {
        let search = Arc::new(MockSearch::new(&[]));
        let dispatcher = ToolDispatcher::new(search, &config());
        let empty = StructuredCall {
            id: "call_empty".to_string(),
            schema: SchemaKind::AnswerQuestion,
            arguments: r#"{"search_queries": []}"#.to_string(),
        };
        let msg = assistant_message(
            String::new(),
            vec![empty, call_with_queries("call_1", &["q1"])],
        );

        let out = dispatcher
            .dispatch(&msg)
            .await
            .unwrap_or_else(|e| panic!("dispatch failed: {e}"));

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].originating_call_id.as_deref(), Some("call_1"));
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_surviving_entries() {
        let search = Arc::new(MockSearch::new(&["q2"]));
        let dispatcher = ToolDispatcher::new(search, &config());
        let msg = assistant_message(
            String::new(),
            vec![call_with_queries("call_1", &["q1", "q2"])],
        );

        let out = dispatcher
            .dispatch(&msg)
            .await
            .unwrap_or_else(|e| panic!("dispatch failed: {e}"));

        assert_eq!(out.len(), 1);
        let mapping = mapping_of(&out[0]);
        assert_eq!(mapping.len(), 1);
        assert!(mapping.contains_key("q1"));
    }

    #[tokio::test]
    async fn test_all_failed_still_emits_empty_mapping() {
        let search = Arc::new(MockSearch::new(&["q1", "q2"]));
        let dispatcher = ToolDispatcher::new(search, &config());
        let msg = assistant_message(
            String::new(),
            vec![call_with_queries("call_1", &["q1", "q2"])],
        );

        let out = dispatcher
            .dispatch(&msg)
            .await
            .unwrap_or_else(|e| panic!("dispatch failed: {e}"));

        // The call is acknowledged even though nothing succeeded
        assert_eq!(out.len(), 1);
        assert!(mapping_of(&out[0]).is_empty());
    }

    #[tokio::test]
    async fn test_mapping_round_trips_through_serialization() {
        let search = Arc::new(MockSearch::new(&[]));
        let dispatcher = ToolDispatcher::new(search, &config());
        let msg = assistant_message(
            String::new(),
            vec![call_with_queries("call_1", &["alpha", "beta"])],
        );

        let out = dispatcher
            .dispatch(&msg)
            .await
            .unwrap_or_else(|e| panic!("dispatch failed: {e}"));

        let mapping = mapping_of(&out[0]);
        let reserialized = serde_json::to_string(&serde_json::Value::Object(mapping.clone()))
            .unwrap_or_default();
        let reparsed: serde_json::Value =
            serde_json::from_str(&reserialized).unwrap_or_else(|e| panic!("reparse failed: {e}"));
        assert_eq!(reparsed.as_object(), Some(&mapping));
    }

    #[test]
    fn test_explode_copies_call_ids() {
        let calls = vec![
            call_with_queries("call_a", &["q1", "q2"]),
            call_with_queries("call_b", &["q3"]),
        ];
        let invocations = explode(&calls);
        assert_eq!(invocations.len(), 3);
        assert_eq!(invocations[0].call_id, "call_a");
        assert_eq!(invocations[2].call_id, "call_b");
        assert_eq!(invocations[2].query, "q3");
    }

    #[test]
    fn test_extract_queries_lenient_on_garbage() {
        let call = StructuredCall {
            id: "call_x".to_string(),
            schema: SchemaKind::AnswerQuestion,
            arguments: "not json".to_string(),
        };
        assert!(extract_queries(&call).is_empty());
    }
}
