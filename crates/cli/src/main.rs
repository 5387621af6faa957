use anyhow::Context;
use careerpath_core::llm::prompt::PromptInput;
use careerpath_core::llm::TextGenerator;
use careerpath_core::recovery::ParseOutcome;
use careerpath_core::service::RecommendationService;
use careerpath_core::storage::recommendations::NewBatch;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod input;

#[derive(Debug, Parser)]
#[command(name = "careerpath_cli")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate recommendations from a JSON file of quiz responses.
    Quiz {
        #[arg(long)]
        responses: PathBuf,

        /// Store the batch in DATABASE_URL.
        #[arg(long)]
        persist: bool,
    },
    /// Generate recommendations from a free-text description.
    Text {
        #[arg(long)]
        input: String,

        /// Store the batch in DATABASE_URL.
        #[arg(long)]
        persist: bool,
    },
    /// Re-run recovery on a saved raw model response. No network access.
    Parse {
        #[arg(long)]
        raw: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = careerpath_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    match args.command {
        Command::Parse { raw } => {
            let text = std::fs::read_to_string(&raw)
                .with_context(|| format!("failed to read {}", raw.display()))?;
            let outcome = careerpath_core::parse_with_outcome(&text);
            print_outcome(None, &outcome)?;
        }
        Command::Quiz { responses, persist } => {
            let responses = input::load_responses(&responses)?;
            let input_json = serde_json::to_value(&responses)?;
            run(&settings, PromptInput::Quiz(&responses), input_json, persist).await?;
        }
        Command::Text { input, persist } => {
            let input_json = serde_json::json!({ "text": input });
            run(&settings, PromptInput::FreeText(&input), input_json, persist).await?;
        }
    }

    Ok(())
}

async fn run(
    settings: &careerpath_core::config::Settings,
    input: PromptInput<'_>,
    input_json: serde_json::Value,
    persist: bool,
) -> anyhow::Result<()> {
    let client = careerpath_core::llm::gemini::GeminiClient::from_settings(settings)?;
    let provider = client.provider();
    let service = RecommendationService::new(client);

    let report = match service.generate(input).await {
        Ok(report) => report,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(source = input.source(), error = %err, "recommendation run failed");
            return Err(err);
        }
    };

    let batch_id = if persist {
        let db_url = settings.require_database_url()?;
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect(db_url)
            .await
            .context("connect DATABASE_URL failed")?;
        careerpath_core::storage::migrate(&pool).await?;

        let batch_id = careerpath_core::storage::recommendations::persist_batch(
            &pool,
            NewBatch {
                source: input.source(),
                input: input_json,
                provider: provider.as_str(),
                outcome: &report.outcome,
                raw_text: Some(&report.raw_text),
            },
        )
        .await?;
        tracing::info!(%batch_id, "persisted recommendation batch");
        Some(batch_id.to_string())
    } else {
        None
    };

    print_outcome(batch_id, &report.outcome)
}

fn print_outcome(batch_id: Option<String>, outcome: &ParseOutcome) -> anyhow::Result<()> {
    let out = serde_json::json!({
        "batch_id": batch_id,
        "strategy": outcome.strategy,
        "recommendations": outcome.batch,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn init_sentry(settings: &careerpath_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
