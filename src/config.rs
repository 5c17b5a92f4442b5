// Application configuration
//
// Layered: defaults -> optional `onboarding.toml` next to the binary or in
// the CWD -> `ONBOARDING_*` environment overrides (e.g.
// `ONBOARDING_API__BASE_URL=https://api.example.com`).

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoanSettings {
    pub min_amount: f64,
    pub max_amount: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api: ApiSettings,
    pub loan: LoanSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let cfg = Config::builder()
            .set_default("api.base_url", "http://localhost:8080/api")?
            .set_default("api.timeout_secs", 30u64)?
            .set_default("loan.min_amount", 10_000.0)?
            .set_default("loan.max_amount", 5_000_000.0)?
            .add_source(File::with_name("onboarding").required(false))
            .add_source(Environment::with_prefix("ONBOARDING").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app: AppConfig = cfg
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Fail fast on an unusable base URL rather than at the first request.
        Url::parse(&app.api.base_url)
            .with_context(|| format!("Invalid api.base_url: {}", app.api.base_url))?;

        Ok(app)
    }
}
