use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::llm::media::ProxySettings;
use crate::llm::{ImageGenerator, StabilityClient};
use crate::prompt::{PromptComposer, SafetySettings};

#[derive(Clone)]
pub struct AppState {
    pub composer: Arc<PromptComposer>,
    pub generator: Arc<dyn ImageGenerator>,
    pub safety: Arc<SafetySettings>,
    pub proxy: Arc<ProxySettings>,
}

impl AppState {
    pub fn new(
        composer: PromptComposer,
        generator: Arc<dyn ImageGenerator>,
        safety: SafetySettings,
        proxy: ProxySettings,
    ) -> Self {
        AppState {
            composer: Arc::new(composer),
            generator,
            safety: Arc::new(safety),
            proxy: Arc::new(proxy),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        AppState::new(
            PromptComposer::new(config.lexicon.clone()),
            Arc::new(StabilityClient::from_config(config)),
            SafetySettings {
                enabled: config.enable_crisis_screening,
                message: config.crisis_message.clone(),
            },
            ProxySettings {
                allowed_hosts: config.image_proxy_allowed_hosts.clone(),
                max_bytes: config.image_proxy_max_bytes,
                timeout: Duration::from_secs(config.image_proxy_timeout_seconds.max(1)),
            },
        )
    }
}
