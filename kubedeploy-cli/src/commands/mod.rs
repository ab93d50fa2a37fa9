pub mod auth;
pub mod deploy;
pub mod endpoint;
pub mod namespace;
pub mod pod;
pub mod watch;
pub mod workload;

use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use kubedeploy_client::{LiveView, ViewStatus};
use std::time::Duration;

/// Namespace selection for one invocation
#[derive(Debug, Clone)]
pub struct NamespaceScope {
    /// `--namespace` as given on the command line
    pub explicit: Option<String>,
    /// Configured default for commands that need exactly one namespace
    pub default: String,
}

impl NamespaceScope {
    /// Filter for list views; no flag means every namespace
    pub fn filter(&self) -> Option<&str> {
        self.explicit.as_deref()
    }

    /// Namespace for single-resource commands
    pub fn target(&self) -> &str {
        self.explicit.as_deref().unwrap_or(&self.default)
    }
}

/// Ask before a destructive action unless `--yes` was given
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }

    use dialoguer::Confirm;
    let confirmed = Confirm::new().with_prompt(prompt).default(false).interact()?;
    Ok(confirmed)
}

pub fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Items of the first completed fetch, or its error
pub async fn settled_items<T: Clone>(mut view: LiveView<T>) -> Result<Vec<T>> {
    let state = view.settled().await?;
    match state.status() {
        ViewStatus::Failed => Err(anyhow!(state.error.unwrap_or_default())),
        _ => Ok(state.data.unwrap_or_default()),
    }
}
