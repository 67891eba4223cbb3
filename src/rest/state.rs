//! API state management for the REST server.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::images::{provider_from_config, ImageProvider};
use crate::wizard::{FileStore, SessionStore, Wizard};

/// Shared state for the REST API
#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
    /// Provider used by both the stateless endpoint and the wizard
    pub provider: Arc<dyn ImageProvider>,
    pub wizard: Arc<Wizard>,
}

impl ApiState {
    /// Assemble state from explicit parts
    pub fn new(
        config: Config,
        provider: Arc<dyn ImageProvider>,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let wizard = Wizard::open(store, provider.clone()).context("Failed to load session")?;
        Ok(Self {
            config: Arc::new(config),
            provider,
            wizard: Arc::new(wizard),
        })
    }

    /// Provider from `config.images`, session files under the state directory
    pub fn from_config(config: Config) -> Result<Self> {
        let provider =
            provider_from_config(&config.images).context("Failed to build image provider")?;
        let store = Arc::new(FileStore::new(config.state_path()));
        tracing::info!(
            provider = provider.name(),
            configured = provider.is_configured(),
            state = %config.state_path().display(),
            "API state initialized"
        );
        Self::new(config, provider, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageProviderKind;
    use crate::wizard::WizardStep;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_from_config_uses_state_dir() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.images.provider = ImageProviderKind::Placeholder;
        config.paths.state = temp_dir.path().to_string_lossy().to_string();

        let state = ApiState::from_config(config).unwrap();
        assert_eq!(state.provider.name(), "placeholder");

        state.wizard.advance().await.unwrap();
        assert!(temp_dir.path().join("fiabe-step.json").exists());

        let reopened = ApiState::from_config(state.config.as_ref().clone()).unwrap();
        assert_eq!(reopened.wizard.snapshot().await.step, WizardStep::Style);
    }
}
