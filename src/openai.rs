//! OpenAI client configuration with sensible defaults.

use crate::config::OpenAISettings;
use crate::error::{DocentError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Environment variable consulted when no key is set in the config file.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Resolve the API key from settings, falling back to the environment.
pub fn resolve_api_key(settings: &OpenAISettings) -> Result<String> {
    if let Some(key) = settings.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        return Ok(key.to_string());
    }

    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        Ok(_) => Err(DocentError::Config(format!(
            "{} is empty. Set it with: export {}='sk-...'",
            API_KEY_ENV, API_KEY_ENV
        ))),
        Err(_) => Err(DocentError::Config(format!(
            "{} not set. Set it with: export {}='sk-...' or add api_key under [openai] in the config file",
            API_KEY_ENV, API_KEY_ENV
        ))),
    }
}

/// Create an OpenAI client from settings.
///
/// The key is read once here; every component built from the returned client shares it.
pub fn create_client(settings: &OpenAISettings) -> Result<Client<OpenAIConfig>> {
    let mut config = OpenAIConfig::new().with_api_key(resolve_api_key(settings)?);
    if let Some(base) = &settings.api_base {
        config = config.with_api_base(base);
    }

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()?;

    Ok(Client::with_config(config).with_http_client(http_client))
}
