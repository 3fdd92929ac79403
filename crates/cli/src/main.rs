use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::io::Read;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finsight_core::llm::gemini::GeminiClient;
use finsight_core::llm::LlmClient;
use finsight_core::view::{render_text, Session};

#[derive(Debug, Parser)]
#[command(name = "finsight_cli")]
struct Args {
    /// Text to analyze.
    #[arg(long, conflicts_with_all = ["file", "sample"])]
    text: Option<String>,

    /// Read the text to analyze from a file.
    #[arg(long, conflicts_with = "sample")]
    file: Option<std::path::PathBuf>,

    /// Analyze the built-in sample article.
    #[arg(long)]
    sample: bool,

    /// What to print on success.
    #[arg(long, value_enum, default_value_t = OutputFormat::Dashboard)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Terminal dashboard.
    Dashboard,
    /// Dashboard view model as JSON.
    Json,
    /// Plaintext report, the same text the "copy report" action produces.
    Report,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = finsight_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    settings.log_missing_credentials();
    let client = GeminiClient::from_settings(&settings)?;
    let mut session = Session::new(Arc::new(client));

    if args.sample {
        session.load_sample();
    } else {
        session.set_input(read_input(&args)?);
    }

    let Some(request) = session.begin_submit() else {
        eprintln!("nothing to analyze: input is empty");
        return Ok(());
    };

    let result = session.client().analyze(&request).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(&anyhow::Error::new(err.clone()));
    }
    session.complete(result);

    if let Some(message) = session.error_message() {
        anyhow::bail!(message);
    }

    let output = match args.format {
        OutputFormat::Dashboard => session.dashboard().map(|view| render_text(&view)),
        OutputFormat::Json => session
            .dashboard()
            .map(|view| serde_json::to_string_pretty(&view))
            .transpose()
            .context("failed to serialize dashboard view")?,
        OutputFormat::Report => session.copy_report(std::time::Instant::now()),
    };

    let output = output.context("analysis finished without a result")?;
    println!("{output}");
    Ok(())
}

fn read_input(args: &Args) -> anyhow::Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if let Some(path) = &args.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }

    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf)
}

fn init_sentry(settings: &finsight_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
