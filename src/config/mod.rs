//! Configuration module: prompts used by the extraction pipeline.

mod prompts;

pub use prompts::{extraction_schema, get_extraction_prompt, EXTRACTION_SYSTEM_PROMPT};
