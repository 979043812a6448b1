//! Encounter Sim - terminal harness.
//!
//! Runs one session over stdin:
//!
//! ```text
//! encounter-sim <vignette-id> <difficulty>
//! ```
//!
//! Each line is one trainee turn. `/end` ends the session early.

use std::process::ExitCode;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use encounter_sim::adapters::ai::{
    AnthropicConfig, AnthropicProvider, MockModelProvider, ModelBackend, OpenAIConfig,
    OpenAIProvider, ProviderRouter,
};
use encounter_sim::adapters::storage::{
    FileSessionRepository, FileVignetteStore, InMemorySessionRepository,
};
use encounter_sim::application::{
    EndSessionCommand, EndSessionHandler, SendMessageCommand, SendMessageError,
    SendMessageHandler, StartSessionCommand, StartSessionError, StartSessionHandler,
};
use encounter_sim::config::{AppConfig, LogFormat, LoggingConfig};
use encounter_sim::domain::foundation::{UserId, VignetteId};
use encounter_sim::domain::simulation::{AssessmentSummary, ConversationEngine};
use encounter_sim::domain::vignette::Difficulty;
use encounter_sim::ports::{SessionRepository, VignetteStore};

const END_COMMAND: &str = "/end";

#[tokio::main]
async fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let (Some(vignette_arg), Some(difficulty_arg)) = (args.next(), args.next()) else {
        eprintln!("usage: encounter-sim <vignette-id> <beginner|intermediate|advanced>");
        return ExitCode::from(2);
    };

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {}", err);
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = config.validate() {
        eprintln!("configuration error: {}", err);
        return ExitCode::FAILURE;
    }

    init_tracing(&config.logging);

    match run(config, &vignette_arg, &difficulty_arg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter.as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Registers the scripted backend plus every backend with an API key.
fn build_router(config: &AppConfig) -> ProviderRouter {
    let mut router =
        ProviderRouter::new().with_backend(ModelBackend::Scripted(MockModelProvider::new()));

    if let Some(key) = config.ai.anthropic_key() {
        router = router.with_backend(ModelBackend::Anthropic(AnthropicProvider::new(
            AnthropicConfig::new(key)
                .with_base_url(config.ai.anthropic_base_url.as_str())
                .with_timeout(config.ai.timeout()),
        )));
    }
    if let Some(key) = config.ai.openai_key() {
        router = router.with_backend(ModelBackend::OpenAI(OpenAIProvider::new(
            OpenAIConfig::new(key)
                .with_base_url(config.ai.openai_base_url.as_str())
                .with_timeout(config.ai.timeout()),
        )));
    }

    tracing::info!(backends = ?router.backend_kinds(), "Model backends configured");
    router
}

async fn run(
    config: AppConfig,
    vignette_arg: &str,
    difficulty_arg: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let vignette_id = VignetteId::new(vignette_arg)?;
    let difficulty: Difficulty = difficulty_arg.parse()?;
    let user_id = UserId::new(whoami())?;

    let vignettes: Arc<dyn VignetteStore> =
        Arc::new(FileVignetteStore::new(&config.storage.vignette_dir));
    let sessions: Arc<dyn SessionRepository> = match &config.storage.session_dir {
        Some(dir) => Arc::new(FileSessionRepository::new(dir)),
        None => Arc::new(InMemorySessionRepository::new()),
    };
    let engine = Arc::new(ConversationEngine::new(
        Arc::new(build_router(&config)),
        config.engine.settings(),
    ));

    let start = StartSessionHandler::new(vignettes.clone(), sessions.clone(), engine.clone());
    let send = SendMessageHandler::new(vignettes.clone(), sessions.clone(), engine.clone());
    let end = EndSessionHandler::new(vignettes.clone(), sessions, engine);

    let started = match start
        .handle(StartSessionCommand {
            vignette_id: vignette_id.clone(),
            difficulty,
            user_id,
        })
        .await
    {
        Ok(started) => started,
        Err(StartSessionError::Engine(err)) => return Err(err.user_message().into()),
        Err(err) => return Err(err.into()),
    };

    let vignette = vignettes.get_vignette(&vignette_id).await?;
    let persona = vignette.persona.name.clone();
    let session_id = started.state.session_id;

    println!("{} ({})", vignette.title, difficulty);
    if let Some(line) = started.opening_line {
        println!("{}: {}", persona, line);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == END_COMMAND {
            let ended = end.handle(EndSessionCommand { session_id }).await?;
            print_summary(&ended.summary);
            return Ok(());
        }

        match send
            .handle(SendMessageCommand {
                session_id,
                message: line,
            })
            .await
        {
            Ok(result) => {
                println!("{}: {}", persona, result.turn.response_text);
                if let Some(transition) = &result.turn.phase_transition {
                    println!("  [phase: {}]", transition.to);
                }
                if let Some(summary) = result.summary {
                    print_summary(&summary);
                    return Ok(());
                }
            }
            Err(SendMessageError::Engine(err)) => println!("  [{}]", err.user_message()),
            Err(err) if err.is_retryable() => println!("  [{}]", err),
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

fn print_summary(summary: &AssessmentSummary) {
    println!();
    println!("Debrief");
    match summary.overall {
        Some(overall) => println!("  overall: {:.2}", overall),
        None => println!("  overall: not scored"),
    }
    for line in &summary.dimensions {
        println!(
            "  {}: {:.2} over {} sample(s), confidence {:.2}",
            line.dimension, line.mean, line.samples, line.confidence
        );
    }
    for flag in &summary.flags {
        println!("  critical: {}", flag.description());
    }
}

fn whoami() -> String {
    std::env::var("USER").unwrap_or_else(|_| "trainee".to_string())
}
