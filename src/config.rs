use std::env;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use tracing::warn;

use crate::prompt::safety::DEFAULT_CRISIS_MESSAGE;
use crate::prompt::{load_lexicon_from_path, Lexicon};

/// Read on its own so logging can start before `CONFIG` loads the lexicon.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub level: String,
    pub dir: PathBuf,
    pub log_prompts: bool,
}

impl LogSettings {
    pub fn from_env() -> Self {
        LogSettings {
            level: env_string("LOG_LEVEL", "info").to_lowercase(),
            dir: PathBuf::from(env_string("LOG_DIR", "logs")),
            log_prompts: env_bool("LOG_PROMPTS", false),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub port: u16,
    pub stability_api_key: String,
    pub stability_api_base: String,
    pub stability_engine: String,
    pub stability_cfg_scale: f32,
    pub stability_width: u32,
    pub stability_height: u32,
    pub stability_steps: u32,
    pub generation_timeout_seconds: u64,
    pub image_proxy_timeout_seconds: u64,
    pub image_proxy_max_bytes: usize,
    pub image_proxy_allowed_hosts: Vec<String>,
    pub enable_crisis_screening: bool,
    pub crisis_message: String,
    pub lexicon_config_path: PathBuf,
    pub lexicon: Lexicon,
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::load);

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_u16(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u16>().ok())
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_csv_lowercase(name: &str, default: &str) -> Vec<String> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty())
        .collect()
}

fn normalize_api_base(value: String) -> String {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        warn!("STABILITY_API_BASE is blank; using https://api.stability.ai");
        return "https://api.stability.ai".to_string();
    }
    trimmed.to_string()
}

fn resolve_lexicon_path() -> PathBuf {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(env_value) = env::var("LEXICON_CONFIG_PATH") {
        let env_path = PathBuf::from(env_value);
        if env_path.is_absolute() {
            candidates.push(env_path);
        } else {
            candidates.push(
                env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join(env_path),
            );
        }
    }
    candidates.push(PathBuf::from("lexicon.json"));
    candidates.push(PathBuf::from("config").join("lexicon.json"));

    for candidate in &candidates {
        if candidate.exists() {
            return candidate.to_path_buf();
        }
    }

    candidates
        .first()
        .cloned()
        .unwrap_or_else(|| PathBuf::from("lexicon.json"))
}

impl Config {
    pub fn load() -> Self {
        let lexicon_config_path = resolve_lexicon_path();
        let lexicon = load_lexicon_from_path(&lexicon_config_path);

        let mut crisis_message = env_string("CRISIS_MESSAGE", DEFAULT_CRISIS_MESSAGE);
        if crisis_message.trim().is_empty() {
            crisis_message = DEFAULT_CRISIS_MESSAGE.to_string();
        }

        Config {
            bind_address: env_string("BIND_ADDRESS", "0.0.0.0"),
            port: env_u16("PORT", 3000),
            stability_api_key: env_string("STABILITY_API_KEY", ""),
            stability_api_base: normalize_api_base(env_string(
                "STABILITY_API_BASE",
                "https://api.stability.ai",
            )),
            stability_engine: env_string("STABILITY_ENGINE", "stable-diffusion-xl-1024-v1-0"),
            stability_cfg_scale: env_f32("STABILITY_CFG_SCALE", 7.0),
            stability_width: env_u32("STABILITY_WIDTH", 1024),
            stability_height: env_u32("STABILITY_HEIGHT", 1024),
            stability_steps: env_u32("STABILITY_STEPS", 30),
            generation_timeout_seconds: env_u64("GENERATION_TIMEOUT_SECONDS", 60),
            image_proxy_timeout_seconds: env_u64("IMAGE_PROXY_TIMEOUT_SECONDS", 20),
            image_proxy_max_bytes: env_usize("IMAGE_PROXY_MAX_BYTES", 15 * 1024 * 1024),
            image_proxy_allowed_hosts: env_csv_lowercase("IMAGE_PROXY_ALLOWED_HOSTS", ""),
            enable_crisis_screening: env_bool("ENABLE_CRISIS_SCREENING", true),
            crisis_message,
            lexicon_config_path,
            lexicon,
        }
    }
}
