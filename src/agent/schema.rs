//! Structured output contract for model responses.
//!
//! Defines the two accepted call shapes — `AnswerQuestion` for the initial
//! draft and `ReviseAnswer` for revisions — and validates raw structured
//! calls into typed payloads. Pure transformation, no side effects; retry
//! policy on failure belongs to the orchestrator.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::message::StructuredCall;
use crate::error::AgentError;

/// Minimum number of search queries per call.
pub const MIN_SEARCH_QUERIES: usize = 1;
/// Maximum number of search queries per call.
pub const MAX_SEARCH_QUERIES: usize = 3;

/// The closed set of output schemas the model may be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaKind {
    /// Initial draft: answer, self-critique, search queries.
    AnswerQuestion,
    /// Revision: draft fields plus supporting citations.
    ReviseAnswer,
}

impl SchemaKind {
    /// Stable wire name sent to the provider as the function name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AnswerQuestion => "AnswerQuestion",
            Self::ReviseAnswer => "ReviseAnswer",
        }
    }

    /// Resolves a wire name back to a schema kind.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "AnswerQuestion" => Some(Self::AnswerQuestion),
            "ReviseAnswer" => Some(Self::ReviseAnswer),
            _ => None,
        }
    }

    /// One-line description sent alongside the function definition.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AnswerQuestion => "Answer the question.",
            Self::ReviseAnswer => "Revise your original answer to your question.",
        }
    }

    /// JSON Schema for this call shape's parameters.
    #[must_use]
    pub fn parameters(self) -> serde_json::Value {
        let mut properties = json!({
            "answer": {
                "type": "string",
                "description": "~250 words detailed answer to the question."
            },
            "reflection": {
                "type": "object",
                "properties": {
                    "missing": {
                        "type": "string",
                        "description": "Critique of what is missing."
                    },
                    "superfluous": {
                        "type": "string",
                        "description": "Critique of what is superfluous."
                    }
                },
                "required": ["missing", "superfluous"]
            },
            "search_queries": {
                "type": "array",
                "items": { "type": "string" },
                "minItems": MIN_SEARCH_QUERIES,
                "maxItems": MAX_SEARCH_QUERIES,
                "description": "1-3 search queries for researching improvements to address the critique of your current answer."
            }
        });
        let mut required = vec!["answer", "reflection", "search_queries"];

        if self == Self::ReviseAnswer {
            if let Some(props) = properties.as_object_mut() {
                props.insert(
                    "references".to_string(),
                    json!({
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Citations motivating your updated answer."
                    }),
                );
            }
            required.push("references");
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false
        })
    }
}

/// Self-critique attached to every draft and revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reflection {
    /// What the current answer fails to cover.
    pub missing: String,
    /// What the current answer includes unnecessarily.
    pub superfluous: String,
}

/// Payload of an `AnswerQuestion` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerQuestion {
    /// The drafted answer (~250 words).
    pub answer: String,
    /// Self-critique of the draft.
    pub reflection: Reflection,
    /// 1-3 queries addressing the critique.
    pub search_queries: Vec<String>,
}

/// Payload of a `ReviseAnswer` call.
///
/// Semantically an [`AnswerQuestion`] extended with supporting evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviseAnswer {
    /// The revised answer incorporating retrieved evidence.
    pub answer: String,
    /// Fresh self-critique of the revision.
    pub reflection: Reflection,
    /// 1-3 queries for the next round.
    pub search_queries: Vec<String>,
    /// Citations pointing at sources actually used.
    pub references: Vec<String>,
}

/// A validated structured call payload.
#[derive(Debug, Clone)]
pub enum ParsedCall {
    /// A validated initial draft.
    Answer(AnswerQuestion),
    /// A validated revision.
    Revision(ReviseAnswer),
}

impl ParsedCall {
    /// The answer text, regardless of schema.
    #[must_use]
    pub fn answer(&self) -> &str {
        match self {
            Self::Answer(a) => &a.answer,
            Self::Revision(r) => &r.answer,
        }
    }

    /// The search queries requested for the next round.
    #[must_use]
    pub fn search_queries(&self) -> &[String] {
        match self {
            Self::Answer(a) => &a.search_queries,
            Self::Revision(r) => &r.search_queries,
        }
    }

    /// Citations, when present (revisions only).
    #[must_use]
    pub fn references(&self) -> &[String] {
        match self {
            Self::Answer(_) => &[],
            Self::Revision(r) => &r.references,
        }
    }
}

/// Validates a raw structured call into a typed payload.
///
/// # Errors
///
/// Returns [`AgentError::SchemaViolation`] when required fields are absent,
/// a field type mismatches, or `search_queries` is empty or longer than
/// [`MAX_SEARCH_QUERIES`].
pub fn parse_call(call: &StructuredCall) -> Result<ParsedCall, AgentError> {
    let parsed = match call.schema {
        SchemaKind::AnswerQuestion => serde_json::from_str::<AnswerQuestion>(&call.arguments)
            .map(ParsedCall::Answer)
            .map_err(|e| violation(&e.to_string(), &call.arguments))?,
        SchemaKind::ReviseAnswer => serde_json::from_str::<ReviseAnswer>(&call.arguments)
            .map(ParsedCall::Revision)
            .map_err(|e| violation(&e.to_string(), &call.arguments))?,
    };

    let count = parsed.search_queries().len();
    if !(MIN_SEARCH_QUERIES..=MAX_SEARCH_QUERIES).contains(&count) {
        return Err(violation(
            &format!(
                "search_queries must contain {MIN_SEARCH_QUERIES}-{MAX_SEARCH_QUERIES} entries, got {count}"
            ),
            &call.arguments,
        ));
    }

    Ok(parsed)
}

fn violation(message: &str, content: &str) -> AgentError {
    AgentError::SchemaViolation {
        message: message.to_string(),
        content: content.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn answer_call(queries: &[&str]) -> StructuredCall {
        let payload = json!({
            "answer": "AI-powered SOC platforms triage alerts autonomously.",
            "reflection": { "missing": "funding data", "superfluous": "none" },
            "search_queries": queries,
        });
        StructuredCall {
            id: "call_1".to_string(),
            schema: SchemaKind::AnswerQuestion,
            arguments: payload.to_string(),
        }
    }

    #[test_case(1; "one query accepted")]
    #[test_case(3; "three queries accepted")]
    fn test_query_count_accepted(n: usize) {
        let queries: Vec<&str> = std::iter::repeat_n("q", n).collect();
        assert!(parse_call(&answer_call(&queries)).is_ok());
    }

    #[test_case(0; "zero queries rejected")]
    #[test_case(4; "four queries rejected")]
    fn test_query_count_rejected(n: usize) {
        let queries: Vec<&str> = std::iter::repeat_n("q", n).collect();
        let err = parse_call(&answer_call(&queries));
        assert!(matches!(err, Err(AgentError::SchemaViolation { .. })));
    }

    #[test]
    fn test_missing_answer_field_rejected() {
        let call = StructuredCall {
            id: "call_1".to_string(),
            schema: SchemaKind::AnswerQuestion,
            arguments: json!({
                "reflection": { "missing": "", "superfluous": "" },
                "search_queries": ["q"],
            })
            .to_string(),
        };
        let err = parse_call(&call);
        match err {
            Err(AgentError::SchemaViolation { message, .. }) => {
                assert!(message.contains("answer"), "got: {message}");
            }
            other => panic!("expected SchemaViolation, got {other:?}"),
        }
    }

    #[test]
    fn test_revise_requires_references() {
        let call = StructuredCall {
            id: "call_2".to_string(),
            schema: SchemaKind::ReviseAnswer,
            arguments: json!({
                "answer": "revised",
                "reflection": { "missing": "", "superfluous": "" },
                "search_queries": ["q"],
            })
            .to_string(),
        };
        assert!(matches!(
            parse_call(&call),
            Err(AgentError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn test_revise_parses_with_references() {
        let call = StructuredCall {
            id: "call_2".to_string(),
            schema: SchemaKind::ReviseAnswer,
            arguments: json!({
                "answer": "revised",
                "reflection": { "missing": "", "superfluous": "" },
                "search_queries": ["q1", "q2"],
                "references": ["https://example.com/report"],
            })
            .to_string(),
        };
        let parsed = parse_call(&call).unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(parsed.answer(), "revised");
        assert_eq!(parsed.search_queries().len(), 2);
        assert_eq!(parsed.references().len(), 1);
    }

    #[test]
    fn test_schema_name_round_trip() {
        for kind in [SchemaKind::AnswerQuestion, SchemaKind::ReviseAnswer] {
            assert_eq!(SchemaKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(SchemaKind::from_name("Unknown"), None);
    }

    #[test]
    fn test_parameters_shape() {
        let params = SchemaKind::ReviseAnswer.parameters();
        assert_eq!(params["type"], "object");
        assert!(params["properties"]["references"].is_object());
        let required = params["required"]
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default();
        assert!(required.iter().any(|v| v == "references"));

        let draft = SchemaKind::AnswerQuestion.parameters();
        assert!(draft["properties"]["references"].is_null());
    }
}
