//! Checks the configured Gemini API key and optionally lists models.
//! Run with: cargo run --bin health-hub-check -- --list-models

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use health_hub_chat::config::AppConfig;
use health_hub_chat::llm::{GeminiClient, TextGenerator};
use health_hub_chat::start_health_hub::init_tracing;

/// Check the Gemini API key used by Health Hub.
#[derive(Debug, Parser)]
#[command(name = "health-hub-check", version)]
struct Args {
    /// Also list the models visible to the key.
    #[arg(long)]
    list_models: bool,

    /// Check against this model instead of the configured one.
    #[arg(long)]
    model: Option<String>,
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    match rt.block_on(run(&args)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: &Args) -> Result<bool> {
    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(model) = &args.model {
        config.gemini = config.gemini.with_model(model.clone());
    }

    let masked = config.gemini.api_key.as_ref().map(|k| k.masked());
    let client = GeminiClient::new(config.gemini).context("failed to create Gemini client")?;

    let Some(masked) = masked else {
        println!("API key not found in environment (set GEMINI_API_KEY)");
        return Ok(false);
    };
    println!("API key: {masked}");
    println!("Model:   {}", client.model());

    let status = client.check_key().await;
    match status.status_code {
        Some(code) => println!("Status:  {code}"),
        None => println!("Status:  no response"),
    }
    if status.valid {
        println!("Result:  {}", status.message);
    } else {
        println!("Result:  FAILED: {}", status.message);
    }

    if args.list_models {
        let models = client
            .list_models()
            .await
            .context("failed to list models")?;
        println!("Available models ({}):", models.len());
        for model in models {
            println!(
                "  {} [{}]",
                model.name,
                model.supported_generation_methods.join(", ")
            );
        }
    }

    Ok(status.valid)
}
