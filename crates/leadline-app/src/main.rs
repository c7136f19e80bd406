//! Leadline application binary - composition root.
//!
//! 1. Load configuration from TOML, env and CLI flags
//! 2. Load the knowledge base and build the similarity index
//! 3. Wire the response backends behind a shared rate limiter
//! 4. Open SQLite and build the dialogue orchestrator
//! 5. Serve HTTP, or chat on the console with `--console`

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use leadline_api::state::AppState;
use leadline_chat::{DialogueOrchestrator, LeadNotifier, TracingNotifier, WebhookNotifier};
use leadline_core::{KnowledgeBase, LeadlineConfig};
use leadline_llm::{
    DirectCompletionBackend, FallbackChain, LanguageModel, OllamaClient, Persona, RateLimiter,
    RetrievalAugmentedBackend,
};
use leadline_storage::{Database, SqliteGateway};
use leadline_vector::{HashEmbedding, KnowledgeSearch, OllamaEmbedding};

use cli::CliArgs;

/// Expand ~ to the home directory in a path string.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(path)
    }
}

fn load_knowledge(config: &LeadlineConfig) -> Result<KnowledgeBase, leadline_core::LeadlineError> {
    match config.knowledge.path.as_deref() {
        Some(path) => KnowledgeBase::load(&expand_home(path)),
        None => {
            tracing::info!("Using bundled company data");
            KnowledgeBase::builtin()
        }
    }
}

async fn build_search(
    kb: &KnowledgeBase,
    config: &LeadlineConfig,
) -> Result<KnowledgeSearch, leadline_core::LeadlineError> {
    let emb = &config.embedding;
    match emb.provider.as_str() {
        "ollama" => {
            let embedder = OllamaEmbedding::new(&emb.api_url, &emb.model, emb.dimensions)?;
            KnowledgeSearch::build_or_hash(kb, Box::new(embedder), emb.dimensions).await
        }
        "hash" => KnowledgeSearch::build(kb, HashEmbedding::new(emb.dimensions)).await,
        other => {
            tracing::warn!(provider = other, "Unknown embedding provider, using hashed embeddings");
            KnowledgeSearch::build(kb, HashEmbedding::new(emb.dimensions)).await
        }
    }
}

fn build_notifier(config: &LeadlineConfig) -> Arc<dyn LeadNotifier> {
    match config.notify.webhook_url.as_deref() {
        Some(url) if !url.trim().is_empty() => match WebhookNotifier::new(url.trim()) {
            Ok(notifier) => {
                tracing::info!(url, "Lead webhook enabled");
                Arc::new(notifier)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Lead webhook unavailable, logging leads instead");
                Arc::new(TracingNotifier)
            }
        },
        _ => Arc::new(TracingNotifier),
    }
}

/// Interactive loop on stdin/stdout. `exit` or `quit` ends it.
async fn run_console(
    orchestrator: Arc<DialogueOrchestrator>,
    config: &LeadlineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let assistant = &config.general.assistant_name;
    let session_id = orchestrator.start_session("console");
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let greeting = orchestrator
        .handle(&session_id, &config.chat.session_start_sentinel)
        .await;
    stdout
        .write_all(format!("{assistant}: {}\n\n", greeting.text).as_bytes())
        .await?;

    loop {
        stdout.write_all(b"You: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }
        if input.is_empty() {
            continue;
        }

        let reply = orchestrator.handle(&session_id, input).await;
        stdout
            .write_all(format!("{assistant}: {}\n\n", reply.text).as_bytes())
            .await?;
    }

    stdout.write_all(b"Goodbye!\n").await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = LeadlineConfig::load_or_default(&config_file);
    config.apply_env();
    args.apply(&mut config);

    // Tracing. Logs go to stderr so console chat stays readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Leadline v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Knowledge.
    let kb = Arc::new(load_knowledge(&config)?);
    let search = Arc::new(build_search(&kb, &config).await?);

    // Backends share one rate limiter.
    let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
    let model: Arc<dyn LanguageModel> = Arc::new(OllamaClient::new(&config.llm)?);
    let persona = Persona::new(&config.general.assistant_name, &kb.company.name);
    let retrieval = RetrievalAugmentedBackend::new(
        Arc::clone(&model),
        Arc::clone(&search),
        Arc::clone(&limiter),
        persona.clone(),
        config.embedding.top_k,
    );
    let direct = DirectCompletionBackend::new(model, limiter, persona, config.llm.stream);
    let backends = FallbackChain::pair(Arc::new(retrieval), Arc::new(direct));
    tracing::info!(
        model = %config.llm.model,
        backends = ?backends.backend_names(),
        "Response backends ready"
    );

    // Storage.
    let data_dir = expand_home(&config.general.data_dir);
    let db_path = data_dir.join("leadline.db");
    let db = Arc::new(Database::new(&db_path)?);
    let gateway = Arc::new(SqliteGateway::new(Arc::clone(&db)));

    let orchestrator = Arc::new(
        DialogueOrchestrator::new(
            Arc::clone(&kb),
            backends,
            gateway,
            config.chat.clone(),
            &config.general.assistant_name,
        )
        .with_notifier(build_notifier(&config)),
    );

    if args.console {
        return run_console(orchestrator, &config).await;
    }

    let state = AppState::new(orchestrator, db, config.general.port);
    if let Err(e) = leadline_api::start_server(&config.general.bind_address, state).await {
        tracing::error!(error = %e, "Failed to start API server - is another instance running?");
        tracing::error!("Try: LEADLINE_PORT={} leadline", config.general.port.saturating_add(1));
        return Err(e.into());
    }

    Ok(())
}
