//! MindMate terminal front-end.
//!
//! Line-oriented chat with an AI companion. Lines starting with `/` are
//! commands; anything else is sent as a message.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mindmate::services::{insights, top_emotions, EmotionJournal, EmotionSnapshot, TimeRange};
use mindmate::{builtin_roles, find_role, resolve_api_key, ChatSession, ConfigService};
use mindmate_llm::{CancellationToken, GeminiApi, GeminiClient};

#[derive(Parser, Debug)]
#[command(name = "mindmate")]
#[command(about = "Chat with an AI companion and track your emotions.")]
struct Cli {
    /// Role id (therapist, life-coach, friend, motivator)
    #[arg(long)]
    role: Option<String>,
    /// Config file (defaults to ~/.mindmate/config.json)
    #[arg(long, env = "MINDMATE_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    debug: bool,
}

const HELP: &str = "Commands: /analyze  /summary  /save [note]  /journal  /roles  /role <id>  /quit";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let config_service = match &args.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new(),
    }
    .context("failed to load configuration")?;
    let config = config_service.get_config().clone();

    let filter = if args.debug || config.debug_mode {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("debug,reqwest=info,hyper=info,hyper_util=info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn,hyper_util=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let (api_key, source) = resolve_api_key(&config)?;
    info!(config = %config_service.path().display(), key_source = ?source, model = %config.model, "starting MindMate");

    let role_id = args.role.as_deref().unwrap_or(&config.default_role);
    let role = find_role(role_id).with_context(|| format!("unknown role '{}'", role_id))?;

    let client = GeminiClient::new(config.to_gemini_config(api_key))?;
    let api: Arc<dyn GeminiApi> = Arc::new(client);
    let mut session = ChatSession::new(api, role);
    let mut journal = EmotionJournal::new();

    println!("MindMate ({}) - {}", session.role().name, session.role().description);
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "/quit" | "/exit" => break,
            "/help" => println!("{}", HELP),
            "/roles" => {
                for role in builtin_roles() {
                    println!("  {:<12} {} - {}", role.id, role.name, role.description);
                }
            }
            "/role" => match find_role(rest) {
                Some(role) => {
                    println!("Now talking with: {}", role.name);
                    session.set_role(role);
                }
                None => println!("Unknown role '{}'. Try /roles.", rest),
            },
            "/analyze" => match session.analyze_conversation().await {
                Ok(result) => {
                    println!("Dominant emotion: {}", result.dominant_label());
                    for row in insights(&result) {
                        println!("  {:<10} {:>4}", row.display_name, row.percentage);
                    }
                }
                Err(err) => println!("Analysis failed: {}", err),
            },
            "/summary" => match session.summarize().await {
                Ok(summary) => println!("{}", summary),
                Err(err) => println!("Summary failed: {}", err),
            },
            "/save" => {
                let (analysis, summary) =
                    tokio::join!(session.analyze_conversation(), session.summarize());
                match (analysis, summary) {
                    (Ok(analysis), Ok(summary)) => {
                        let snapshot = EmotionSnapshot::new(analysis, summary).with_note(rest);
                        let tags: Vec<&str> = snapshot.tags.iter().map(String::as_str).collect();
                        println!("Saved. Tags: {}", tags.join(", "));
                        journal.add(snapshot);
                    }
                    (Err(err), _) | (_, Err(err)) => println!("Could not save: {}", err),
                }
            }
            "/journal" => {
                let points = journal.data_points(TimeRange::Week, chrono::Utc::now());
                if points.is_empty() {
                    println!("No entries this week.");
                }
                for point in points {
                    let top: Vec<String> = top_emotions(&point.scores, 3)
                        .into_iter()
                        .map(|(label, score)| format!("{} {:.2}", label, score))
                        .collect();
                    println!("  {}  {}", point.timestamp.format("%Y-%m-%d %H:%M"), top.join(", "));
                }
            }
            _ if command.starts_with('/') => println!("Unknown command. {}", HELP),
            _ => {
                let cancel = CancellationToken::new();
                let watcher = tokio::spawn({
                    let cancel = cancel.clone();
                    async move {
                        if tokio::signal::ctrl_c().await.is_ok() {
                            cancel.cancel();
                        }
                    }
                });
                let outcome = session.send_until_cancelled(line, &cancel).await;
                watcher.abort();

                match outcome {
                    Ok(outcome) => {
                        println!("{}", outcome.reply_turn.text().trim_end());
                        if let Some(tag) = outcome.tag {
                            println!("  [{}]", tag.dominant_label());
                        }
                    }
                    Err(err) => println!("{}", err),
                }
            }
        }
    }

    info!("bye");
    Ok(())
}
