use std::net::SocketAddr;

use anyhow::{anyhow, Context};
use dotenvy::dotenv;
use tracing::{error, info, warn};

mod config;
mod handlers;
mod llm;
mod prompt;
mod state;
mod utils;

use config::{LogSettings, CONFIG};
use prompt::{compose_prompt, PromptComposer};
use state::AppState;
use utils::logging::{init_logging, init_stderr_logging};

const DEFAULT_CLI_INTENSITY: i64 = 50;

#[derive(Debug, PartialEq, Eq)]
struct ComposeArgs {
    feeling: String,
    intensity: i64,
    builtin: bool,
}

fn compose_usage() -> &'static str {
    "Usage: eidetic-studio compose --feeling <text> [--intensity <n>] [--builtin]"
}

fn parse_compose_args(args: &[String]) -> anyhow::Result<Option<ComposeArgs>> {
    if args.get(1).map(|value| value.as_str()) != Some("compose") {
        return Ok(None);
    }

    let mut feeling: Option<String> = None;
    let mut intensity = DEFAULT_CLI_INTENSITY;
    let mut builtin = false;

    let mut index = 2;
    while index < args.len() {
        match args[index].as_str() {
            "--feeling" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --feeling"))?;
                feeling = Some(value.clone());
            }
            "--intensity" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --intensity"))?;
                intensity = value
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| anyhow!("Invalid --intensity value: {value}"))?;
            }
            "--builtin" => {
                builtin = true;
            }
            "--help" | "-h" => {
                return Err(anyhow!(compose_usage()));
            }
            other => {
                return Err(anyhow!(
                    "Unknown compose argument: {other}\n{}",
                    compose_usage()
                ));
            }
        }
        index += 1;
    }

    let feeling = feeling.ok_or_else(|| anyhow!("--feeling is required\n{}", compose_usage()))?;
    Ok(Some(ComposeArgs {
        feeling,
        intensity,
        builtin,
    }))
}

fn run_compose(args: &ComposeArgs) -> String {
    if args.builtin {
        compose_prompt(&args.feeling, args.intensity)
    } else {
        PromptComposer::new(CONFIG.lexicon.clone()).compose(&args.feeling, args.intensity)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Must run before the first `CONFIG` read or lexicon load warnings are lost.
    let log_settings = LogSettings::from_env();
    let args: Vec<String> = std::env::args().collect();
    if let Some(compose_args) = parse_compose_args(&args)? {
        init_stderr_logging(&log_settings);
        println!("{}", run_compose(&compose_args));
        return Ok(());
    }
    if let Some(other) = args.get(1).filter(|value| value.as_str() != "serve") {
        return Err(anyhow!(
            "Unknown command: {other}\nUsage: eidetic-studio [serve]\n{}",
            compose_usage()
        ));
    }

    let _guards = init_logging(&log_settings);
    info!("Starting Eidetic Studio");
    info!(
        "Lexicon: {} somatic / {} emotion rules (override path {})",
        CONFIG.lexicon.somatic.len(),
        CONFIG.lexicon.emotion.len(),
        CONFIG.lexicon_config_path.display()
    );
    if CONFIG.stability_api_key.trim().is_empty() {
        warn!("STABILITY_API_KEY is not set; image generation requests will fail");
    }

    let state = AppState::from_config(&CONFIG);
    let app = handlers::router(state);

    let addr: SocketAddr = format!("{}:{}", CONFIG.bind_address, CONFIG.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid bind address {}:{}",
                CONFIG.bind_address, CONFIG.port
            )
        })?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!("Listening on http://{}", addr);

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
    {
        error!("Server error: {err}");
        return Err(err.into());
    }

    Ok(())
}
