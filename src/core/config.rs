use crate::errors::{HarnessError, Result};
use crate::types::Viewport;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Process-wide harness settings, loaded once and passed to every component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    pub url: String,
    pub current_env: String,
    pub current_driver: String,
    /// Default element wait, in seconds.
    pub configured_wait: f64,
    /// Driver-level implicit wait, in seconds.
    pub implicit_wait: f64,
    #[serde(default)]
    pub flaky_rerun: u32,
    #[serde(default = "default_headless")]
    pub headless: bool,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub chrome_args: Vec<String>,
}

/// Upper bound accepted for `configured_wait` and `implicit_wait`.
pub const MAX_WAIT_SECS: f64 = 86_400.0;

/// Saturating conversion for configs built in code and never validated.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(if value > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

fn default_headless() -> bool {
    true
}

fn default_settle_delay_ms() -> u64 {
    500
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost/".to_string(),
            current_env: "local".to_string(),
            current_driver: "chrome".to_string(),
            configured_wait: 10.0,
            implicit_wait: 10.0,
            flaky_rerun: 0,
            headless: default_headless(),
            settle_delay_ms: default_settle_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            viewport: Viewport::default(),
            chrome_args: vec![],
        }
    }
}

impl HarnessConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: HarnessConfig = serde_yaml::from_str(yaml)
            .map_err(|e| HarnessError::Configuration(format!("invalid harness config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.url).map_err(|e| {
            HarnessError::Configuration(format!("url '{}' is not valid: {}", self.url, e))
        })?;

        for (name, value) in [
            ("configured_wait", self.configured_wait),
            ("implicit_wait", self.implicit_wait),
        ] {
            if !value.is_finite() || !(0.0..=MAX_WAIT_SECS).contains(&value) {
                return Err(HarnessError::Configuration(format!(
                    "{} must be between 0 and {} seconds, got {}",
                    name, MAX_WAIT_SECS, value
                )));
            }
            Duration::try_from_secs_f64(value)
                .map_err(|e| HarnessError::Configuration(format!("{}: {}", name, e)))?;
        }

        if self.poll_interval_ms == 0 {
            return Err(HarnessError::Configuration(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn configured_wait(&self) -> Duration {
        seconds(self.configured_wait)
    }

    pub fn implicit_wait(&self) -> Duration {
        seconds(self.implicit_wait)
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            timeout: self.configured_wait(),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

/// Bounds for a readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    /// Fixed pause before the element condition, absorbing transitions.
    pub settle_delay: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        HarnessConfig::default().wait_policy()
    }
}

impl WaitPolicy {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}
