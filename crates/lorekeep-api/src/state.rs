//! Application state: the wired agent plus loaded settings.

use lorekeep_core::agent::SeriesAgent;
use lorekeep_infra::builder::build_agent;
use lorekeep_infra::config::{default_data_dir, load_settings};
use lorekeep_types::config::AgentConfig;

use crate::cli::Cli;

pub struct AppState {
    pub agent: SeriesAgent,
}

impl AppState {
    /// Load settings, initialize tracing, and build the agent.
    ///
    /// `needs_llm` enables construction-time API key validation for the
    /// commands that call the LLM; read-only commands work without a key.
    pub async fn init(cli: &Cli, needs_llm: bool, filter: &str) -> anyhow::Result<Self> {
        let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
        let settings = load_settings(&data_dir).await;

        lorekeep_observe::tracing_setup::init_tracing(settings.otel, filter)
            .map_err(|e| anyhow::anyhow!("tracing init failed: {e}"))?;

        let mut config = AgentConfig::new(cli.series.clone(), data_dir)
            .with_model(settings.model.clone())
            .with_temperature(settings.temperature);
        if !needs_llm {
            config = config.without_key_validation();
        }

        let agent = build_agent(config).await?;
        Ok(Self { agent })
    }
}
