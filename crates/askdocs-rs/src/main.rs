use anyhow::Context;
use askdocs_rs::config::AskdocsConfig;
use askdocs_rs::core::{AccessGate, ExchangeOutcome, SecretsSource};
use askdocs_rs::tui::{NoticeBus, TuiConfig};
use askdocs_rs::{PASSWORD_ENV, ask_once, build_retrieval_client, fetch_secrets, load_config};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "askdocs", version, about = "Ask questions of a knowledge base")]
struct Cli {
    /// Extra config file layered on top of the discovered ones
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the interactive chat (default)
    Chat,
    /// Ask a single question and print the answer
    Ask {
        /// Access password; falls back to ASKDOCS_PASSWORD
        #[arg(long)]
        password: Option<String>,
        question: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Chat);
    // stderr output would corrupt the alternate screen unless explicitly requested
    if matches!(command, Command::Ask { .. }) || std::env::var_os("RUST_LOG").is_some() {
        askdocs_rs::init_logging();
    }

    let config = load_config(cli.config.as_deref())?;
    let secrets =
        SecretsSource::from_config(&config.secrets).context("invalid secrets provider")?;

    match command {
        Command::Chat => run_chat(&config, secrets).await,
        Command::Ask { password, question } => {
            let password = password
                .or_else(|| std::env::var(PASSWORD_ENV).ok())
                .with_context(|| format!("password required (--password or {PASSWORD_ENV})"))?;
            let secrets = fetch_secrets(&secrets)?;
            run_ask(
                &config,
                AccessGate::new(secrets.access_password),
                &secrets.knowledge_base_id,
                &password,
                &question,
            )
            .await
        }
    }
}

async fn run_chat(config: &AskdocsConfig, secrets: SecretsSource) -> anyhow::Result<()> {
    let retrieval = build_retrieval_client(config)?;
    askdocs_rs::tui::run(
        retrieval,
        NoticeBus::new(64),
        secrets,
        TuiConfig::new(&config.ui),
    )
    .await
}

async fn run_ask(
    config: &AskdocsConfig,
    gate: AccessGate,
    knowledge_base_id: &str,
    password: &str,
    question: &str,
) -> anyhow::Result<()> {
    let retrieval = build_retrieval_client(config)?;
    let report = ask_once(retrieval, gate, knowledge_base_id, password, question).await?;
    for notice in &report.notices {
        eprintln!("{notice}");
    }
    if report.outcome == ExchangeOutcome::Failed {
        anyhow::bail!("no answer could be retrieved");
    }
    println!("{}", report.render());
    Ok(())
}
