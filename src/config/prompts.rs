//! System prompts for knowledge extraction.

use chrono::Utc;
use serde_json::{json, Value};

/// Base system prompt for entity/relation extraction.
pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are an expert knowledge extraction assistant. Given a passage of conversational or free-form text, extract the entities it mentions and the relations between them.

Respond with a single JSON object and nothing else, using this shape:
{
  "entities": [{"name": "...", "summary": "..."}],
  "relations": [{"source": "...", "target": "...", "name": "...", "fact": "..."}]
}

Rules:
- Entity names are short noun phrases; summaries are one sentence.
- Relation names are snake_case verbs; facts restate the supporting text.
- Only extract what the passage states. Do not infer or embellish.
- If nothing can be extracted, return {"entities": [], "relations": []}."#;

/// Extraction system prompt with the current date prepended, so temporal
/// statements ("yesterday", "last week") can be anchored.
pub fn get_extraction_prompt() -> String {
    let today = Utc::now().format("%B %d, %Y");
    format!("Today's date is: {today}\n{EXTRACTION_SYSTEM_PROMPT}")
}

/// JSON schema describing the extraction output shape.
pub fn extraction_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "entities": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "summary": {"type": "string"}
                    },
                    "required": ["name"]
                }
            },
            "relations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "source": {"type": "string"},
                        "target": {"type": "string"},
                        "name": {"type": "string"},
                        "fact": {"type": "string"}
                    },
                    "required": ["source", "target", "name"]
                }
            }
        },
        "required": ["entities", "relations"]
    })
}
