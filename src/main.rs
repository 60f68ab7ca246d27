mod chat;
mod cli;
mod config;
mod gemini;
mod tui;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chat::AttachedFile;
use clap::Parser;
use cli::{Cli, Commands};
use config::GeminiConfig;
use gemini::{ChatGateway, GeminiClient};
use std::io::Write;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    let config = GeminiConfig::from_env()?;

    match cli.command {
        Some(Commands::Ask { message, file }) => ask(config, message.join(" "), file).await,
        Some(Commands::Image { prompt, output }) => {
            generate_image(config, prompt.join(" "), output).await
        }
        None => tui::run(config).await,
    }
}

/// Log to a file when CHARTY_LOG names one; stderr would corrupt the
/// alternate-screen TUI.
fn init_tracing() -> Result<()> {
    if let Ok(path) = std::env::var("CHARTY_LOG") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {path}"))?;
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .init();
    }
    Ok(())
}

async fn ask(config: GeminiConfig, prompt: String, file: Option<PathBuf>) -> Result<()> {
    let client = GeminiClient::new(config);
    let session = client.init_chat();
    let attached = file.map(AttachedFile::from_path).transpose()?;

    let mut on_chunk = |fragment: &str| {
        print!("{fragment}");
        let _ = std::io::stdout().flush();
    };
    client
        .stream_chat_response(&session, &prompt, attached.as_ref(), &mut on_chunk)
        .await?;
    println!();
    Ok(())
}

async fn generate_image(config: GeminiConfig, prompt: String, output: PathBuf) -> Result<()> {
    let client = GeminiClient::new(config);
    let data_url = client.generate_image(prompt.trim()).await?;

    let payload = data_url
        .split_once(',')
        .map(|(_, data)| data)
        .unwrap_or(&data_url);
    let bytes = STANDARD
        .decode(payload)
        .context("Image response was not valid base64")?;
    std::fs::write(&output, bytes)
        .with_context(|| format!("Failed to write image to {}", output.display()))?;

    println!("Image written to {}", output.display());
    Ok(())
}
