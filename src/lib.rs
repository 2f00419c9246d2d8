// Copyright 2025 Zep Software, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Graph Scribe
//!
//! Episodic knowledge-graph construction with an LLM extraction client.
//!
//! The completion client normalizes responses across model families and
//! recovers from application-level failures by appending corrective
//! feedback to the conversation and retrying within a fixed bound. The
//! graph module stores timestamped episodes and maintains the index
//! catalog the extraction pipeline queries.
//!
//! ## Example
//!
//! ```rust,no_run
//! use graph_scribe::{LlmClient, LlmConfig, Message};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = LlmConfig::default()
//!         .with_base_url("https://api.deepseek.com/v1")
//!         .with_api_key("sk-...")
//!         .with_model_name("deepseek-chat");
//!
//!     let client = LlmClient::new(config);
//!     let conversation = vec![
//!         Message::system("You extract entities from text."),
//!         Message::user("Alice joined Acme Corp in March."),
//!     ];
//!     let response = client.generate_response(conversation, None).await?;
//!
//!     println!("{:?}", response);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod graph;
pub mod model;
pub mod settings;

pub use graph::{
    index_catalog, EpisodeSource, EpisodeStore, EpisodicNode, GraphError, IndexKind, IndexSpec,
    IndexTarget, MemoryGraph, EPISODE_WINDOW_LEN,
};
pub use model::{
    CompletionMessage, CompletionRequest, CompletionTransport, ErrorClass, HttpTransport,
    LlmClient, LlmConfig, LlmResponse, Message, ModelError, ResponseSchema, Role,
};
pub use settings::{Settings, SettingsError};
