use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;

use quillpipe::pipeline::{Pipeline, PipelineEvent};
use quillpipe_local::{default_client, GoogleSearchProvider, OpenAiCompatClient, PageFetcher};

#[derive(Parser, Debug)]
#[command(name = "quillpipe")]
#[command(about = "Research pipeline: plan topics, search, filter pages, stream a report", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the research pipeline and stream the Markdown report to stdout.
    Research(ResearchCmd),
    /// Diagnose configuration issues (never prints secret values).
    Doctor(DoctorCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug)]
struct ResearchCmd {
    /// The research question.
    query: String,
}

#[derive(clap::Args, Debug)]
struct DoctorCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env loading is on by default for interactive use; QUILLPIPE_DOTENV=0
    // keeps spawned/test environments hermetic.
    let dotenv_enabled = std::env::var("QUILLPIPE_DOTENV")
        .map(|v| v.trim() != "0")
        .unwrap_or(true);
    if dotenv_enabled {
        dotenvy::dotenv().ok();
    }

    // Progress and warnings go to stderr; stdout carries only the report.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Research(args) => research(args).await?,
        Commands::Doctor(args) => doctor(args)?,
        Commands::Version(args) => version(args)?,
    }
    Ok(())
}

async fn research(args: ResearchCmd) -> Result<()> {
    let client = default_client()?;
    let llm = Arc::new(
        OpenAiCompatClient::from_env(client.clone()).context("LLM client configuration")?,
    );
    let search = Arc::new(
        GoogleSearchProvider::from_env(client.clone()).context("search provider configuration")?,
    );
    let fetcher = Arc::new(PageFetcher::new(client));

    let pipeline = Pipeline::new(llm, search, fetcher).with_events(Arc::new(log_event));

    let mut stream = pipeline.run(&args.query).await?;
    let mut stdout = std::io::stdout();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("report stream failed")?;
        stdout.write_all(chunk.as_bytes())?;
        stdout.flush()?;
    }
    writeln!(stdout)?;
    Ok(())
}

fn log_event(event: &PipelineEvent) {
    match event {
        PipelineEvent::PlanningStarted => tracing::info!("running search planner"),
        PipelineEvent::TopicsPlanned { topics } => {
            tracing::info!(count = topics.len(), ?topics, "topics planned")
        }
        PipelineEvent::SearchStarted { topic } => tracing::info!(topic, "searching"),
        PipelineEvent::SearchCompleted { topic, results } => {
            tracing::info!(topic, results, "search completed")
        }
        PipelineEvent::FilterStarted { candidates } => {
            tracing::info!(candidates, "filtering results")
        }
        PipelineEvent::FilterCompleted { selected } => {
            tracing::info!(selected, "results selected and enriched")
        }
        PipelineEvent::ReportStarted => tracing::info!("generating report"),
    }
}

fn doctor(args: DoctorCmd) -> Result<()> {
    fn has_env(k: &str) -> bool {
        std::env::var(k).ok().is_some_and(|v| !v.trim().is_empty())
    }

    // Env presence only; never print values.
    let google_key = has_env("QUILLPIPE_GOOGLE_API_KEY") || has_env("GOOGLE_SEARCH_API_KEY");
    let google_cx = has_env("QUILLPIPE_GOOGLE_CX") || has_env("GOOGLE_SEARCH_CX");
    let llm_key = has_env("QUILLPIPE_LLM_API_KEY") || has_env("DEEPINFRA_API_KEY");

    let checks = vec![
        serde_json::json!({
            "name": "google_api_key",
            "ok": google_key,
            "message": if google_key { "search API key is set" } else { "search API key is missing" },
            "hint": if google_key { "" } else { "Set QUILLPIPE_GOOGLE_API_KEY (or GOOGLE_SEARCH_API_KEY)." },
        }),
        serde_json::json!({
            "name": "google_cx",
            "ok": google_cx,
            "message": if google_cx { "search engine id is set" } else { "search engine id is missing" },
            "hint": if google_cx { "" } else { "Set QUILLPIPE_GOOGLE_CX (or GOOGLE_SEARCH_CX)." },
        }),
        serde_json::json!({
            "name": "llm_api_key",
            "ok": llm_key,
            "message": if llm_key { "LLM API key is set" } else { "LLM API key is missing" },
            "hint": if llm_key { "" } else { "Set QUILLPIPE_LLM_API_KEY (or DEEPINFRA_API_KEY)." },
        }),
    ];

    let ok = checks.iter().all(|c| c["ok"].as_bool().unwrap_or(false));
    let payload = serde_json::json!({
        "schema_version": 1,
        "kind": "doctor",
        "ok": ok,
        "name": "quillpipe",
        "version": env!("CARGO_PKG_VERSION"),
        "checks": checks,
    });

    match args.output.to_ascii_lowercase().as_str() {
        "text" => {
            println!("quillpipe {}", env!("CARGO_PKG_VERSION"));
            println!("checks:");
            for c in payload["checks"].as_array().into_iter().flatten() {
                let ok = c["ok"].as_bool().unwrap_or(false);
                println!(
                    "  - {}: {} ({})",
                    c["name"].as_str().unwrap_or(""),
                    if ok { "ok" } else { "FAIL" },
                    c["message"].as_str().unwrap_or(""),
                );
            }
        }
        _ => println!("{}", serde_json::to_string(&payload)?),
    }
    Ok(())
}

fn version(args: VersionCmd) -> Result<()> {
    match args.output.to_ascii_lowercase().as_str() {
        "text" => println!("quillpipe {}", env!("CARGO_PKG_VERSION")),
        _ => println!(
            "{}",
            serde_json::to_string(&serde_json::json!({
                "name": "quillpipe",
                "version": env!("CARGO_PKG_VERSION"),
            }))?
        ),
    }
    Ok(())
}
