use once_cell::sync::Lazy;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::Duration;

use crate::config::CONFIG;

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(CONFIG.generation_timeout_seconds.max(1)))
        .user_agent(concat!("eidetic-studio/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
});

// Redirects are followed by the image proxy itself so every hop is checked
// against the host allowlist.
static PROXY_HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .redirect(Policy::none())
        .user_agent(concat!("eidetic-studio/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
});

pub fn get_http_client() -> &'static Client {
    &HTTP_CLIENT
}

pub fn get_proxy_http_client() -> &'static Client {
    &PROXY_HTTP_CLIENT
}
