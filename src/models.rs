// src/models.rs

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One summarized comment, as the generation API is asked to shape it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentSummary {
    /// The username/participant name.
    pub participant: String,
    /// Summary of the participant's argument in short sentences or keywords.
    pub argument: String,
    /// URLs mentioned in the comment, formatted in markdown if long.
    #[serde(default)]
    pub urls: String,
}

/// The structured payload contract for one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSummaryResponse {
    #[serde(default)]
    pub summaries: Vec<CommentSummary>,
}

/// Strict JSON schema sent with every structured request.
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summaries": {
                "type": "array",
                "description": "List of comment summaries from the thread",
                "items": {
                    "type": "object",
                    "properties": {
                        "participant": {
                            "type": "string",
                            "description": "The username/participant name"
                        },
                        "argument": {
                            "type": "string",
                            "description": "Summary of the participant's argument in short sentences or keywords"
                        },
                        "urls": {
                            "type": "string",
                            "description": "URLs mentioned in the comment, formatted in markdown if long"
                        }
                    },
                    "required": ["participant", "argument", "urls"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["summaries"],
        "additionalProperties": false
    })
}
