use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::{json, Value};
use server::config::{Settings, SETTINGS_FILE, SETTINGS_TEMPLATE};
use server::{create_router, state::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_AGENT_URL: &str = "http://localhost:8000/handle_task";
const DEFAULT_LOG_FILTER: &str =
    "task_publisher=info,server=info,orchestrator=info,github=info,generator=info,tower_http=info";

#[derive(Parser)]
#[command(name = "task-publisher")]
#[command(about = "Generates static web apps from task briefs and publishes them to GitHub Pages", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a settings template to the current directory
    Init,
    /// Run the agent (default)
    Serve {
        /// Overrides PORT and the settings file
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Static frontend served for unknown paths
        #[arg(long)]
        app_dir: Option<PathBuf>,
    },
    /// Post a task submission to a running agent
    Send {
        #[arg(long, default_value = DEFAULT_AGENT_URL)]
        url: String,

        #[arg(long)]
        secret: String,

        #[arg(long)]
        task: String,

        #[arg(long)]
        nonce: String,

        #[arg(long, default_value_t = 1)]
        round: u8,

        #[arg(long)]
        brief: Option<String>,

        #[arg(long)]
        feedback: Option<String>,

        #[arg(long = "check")]
        checks: Vec<String>,

        #[arg(long)]
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init) => init_settings().await,
        Some(Commands::Serve {
            port,
            config,
            app_dir,
        }) => serve(port, config, app_dir).await,
        Some(Commands::Send {
            url,
            secret,
            task,
            nonce,
            round,
            brief,
            feedback,
            checks,
            email,
        }) => {
            let submission = json!({
                "email": email,
                "secret": secret,
                "task": task,
                "round": round,
                "nonce": nonce,
                "brief": brief,
                "checks": checks,
                "evaluation_url": null,
                "attachments": [],
                "evaluation_feedback": feedback,
            });
            send(&url, &submission).await
        }
        None => serve(None, None, None).await,
    }
}

async fn init_settings() -> Result<()> {
    let path = std::env::current_dir()?.join(SETTINGS_FILE);

    if path.exists() {
        bail!("{} already exists, not overwriting", path.display());
    }

    tokio::fs::write(&path, SETTINGS_TEMPLATE)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Created {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set secret, GitHub token and username (or SECRET_KEY, GITHUB_TOKEN, GITHUB_USERNAME)");
    println!("  2. Set OPENAI_API_KEY to generate with the model instead of the fallback files");
    println!("  3. Run 'task-publisher serve'");

    Ok(())
}

async fn serve(
    port: Option<u16>,
    config: Option<PathBuf>,
    app_dir: Option<PathBuf>,
) -> Result<()> {
    init_tracing();

    let mut settings = Settings::load(config.as_deref())?;
    if let Some(port) = port {
        settings.port = port;
    }
    if app_dir.is_some() {
        settings.app_dir = app_dir;
    }

    let state = AppState::from_settings(&settings).context("Failed to start agent")?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", settings.port))
        .await
        .with_context(|| format!("Failed to bind port {}", settings.port))?;

    let agent = &settings.agent;
    println!();
    println!("Task Publisher v{}", env!("CARGO_PKG_VERSION"));
    println!("════════════════════════════════════════");
    println!();
    println!("  Endpoint:      http://localhost:{}/handle_task", settings.port);
    println!("  Swagger UI:    http://localhost:{}/swagger-ui", settings.port);
    println!("  GitHub owner:  {}", agent.github.owner);
    println!("  GitHub token set: {}", presence(!agent.github.token.is_empty()));
    println!("  LLM key set:   {}", presence(agent.llm.api_key.is_some()));
    println!("  LLM model:     {}", agent.llm.model);
    if let Some(dir) = &settings.app_dir {
        println!("  Frontend:      {}", dir.display());
    }
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn send(url: &str, submission: &Value) -> Result<()> {
    println!("Sending round {} for {} to {}", submission["round"], submission["task"], url);

    let response = reqwest::Client::new()
        .post(url)
        .json(submission)
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", url))?;

    let status = response.status();
    let body: Value = response
        .json()
        .await
        .context("Agent answered with a non-JSON body")?;

    let pretty = serde_json::to_string_pretty(&body)?;
    if body.get("error").is_some() {
        println!("{} ({})", "Task failed".red().bold(), status);
        println!("{}", pretty);
        std::process::exit(1);
    }

    println!("{} ({})", "Task accepted".green().bold(), status);
    println!("{}", pretty);
    Ok(())
}

fn presence(set: bool) -> colored::ColoredString {
    if set {
        "yes".green()
    } else {
        "no".yellow()
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();
}
