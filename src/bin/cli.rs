//! Graph Scribe - episodic knowledge-graph extraction
//!
//! This is the CLI entry point for the graph-scribe tool.
//! Run with: cargo run --bin graph-scribe

use chrono::Utc;
use graph_scribe::config::{extraction_schema, get_extraction_prompt};
use graph_scribe::{
    EpisodeSource, EpisodeStore, EpisodicNode, LlmClient, LlmResponse, MemoryGraph, Message,
    ResponseSchema, Settings, EPISODE_WINDOW_LEN,
};
use std::env;
use std::io::{self, BufRead, Write};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let use_compat = args.iter().any(|arg| arg == "--compat");
    let structured = args.iter().any(|arg| arg == "--structured");

    let settings = Settings::from_env()?;
    let config = if use_compat {
        settings.compatibility_config()
    } else {
        settings.llm_config()
    };

    println!("Graph Scribe - episodic knowledge extraction");
    println!("  Endpoint: {}", config.base_url);
    println!("  Model: {}", config.effective_model());
    println!("  Structured output: {}", structured);
    println!();
    println!("Enter text to extract from. Commands: recent, clear, exit");
    println!();

    let client = LlmClient::new(config);
    let store = MemoryGraph::new();
    store.build_indices().await?;

    let schema = structured.then(|| ResponseSchema::new("extraction", extraction_schema()));
    let system_prompt = get_extraction_prompt();

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        match text {
            "exit" | "quit" => break,
            "recent" => {
                let episodes = store
                    .retrieve_recent_episodes(Utc::now(), EPISODE_WINDOW_LEN)
                    .await?;
                if episodes.is_empty() {
                    println!("No episodes ingested yet.");
                }
                for episode in &episodes {
                    println!(
                        "[{}] {}: {}",
                        episode.valid_at.format("%Y-%m-%d %H:%M"),
                        episode.name,
                        episode.content
                    );
                }
                continue;
            }
            "clear" => {
                store.clear_all().await?;
                println!("Graph cleared.");
                continue;
            }
            _ => {}
        }

        let conversation = vec![
            Message::system(system_prompt.clone()),
            Message::user(text),
        ];

        match client.generate_response(conversation, schema.as_ref()).await {
            Ok(LlmResponse::Structured(map)) => {
                println!("{}", serde_json::to_string_pretty(&map)?);
            }
            Ok(LlmResponse::Message(message)) => {
                println!("{}", message.text());
            }
            Err(e) => {
                eprintln!("Error: {e}");
                continue;
            }
        }

        let name = format!("episode-{}", store.episode_count().await + 1);
        store
            .add_episode(EpisodicNode::new(
                name,
                text,
                EpisodeSource::Message,
                "cli session",
                Utc::now(),
            ))
            .await?;
    }

    Ok(())
}
