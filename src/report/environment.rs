//! Fills the `env`, `os` and `browser` entries of an Allure environment file:
//!
//! ```xml
//! <environment>
//!   <parameter name="env"><key>Environment</key><value>qa</value></parameter>
//! </environment>
//! ```

use crate::errors::{HarnessError, Result};
use regex::{Captures, Regex};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentValues {
    pub env: String,
    pub os: String,
    pub browser: String,
}

impl EnvironmentValues {
    /// Values for this host: `os` is the platform and architecture.
    pub fn current(env: impl Into<String>, browser: impl Into<String>) -> Self {
        Self {
            env: env.into(),
            os: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            browser: browser.into(),
        }
    }

    fn for_name(&self, name: &str) -> Option<&str> {
        match name {
            "env" => Some(&self.env),
            "os" => Some(&self.os),
            "browser" => Some(&self.browser),
            _ => None,
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| HarnessError::Configuration(e.to_string()))
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Replaces the `<value>` text of every element whose `name` attribute is
/// `env`, `os` or `browser`. Everything else is left byte-for-byte intact.
pub fn patch_environment(xml: &str, values: &EnvironmentValues) -> Result<String> {
    let named = compile(r#"<([A-Za-z_][\w.-]*)(?:\s[^>]*?)?\sname\s*=\s*["']([^"']*)["'][^>]*>"#)?;
    let value = compile(r"(?s)(<value(?:\s[^>]*)?>)(.*?)(</value>)")?;

    let mut patched = String::with_capacity(xml.len());
    let mut cursor = 0;
    let mut replaced = 0;

    for caps in named.captures_iter(xml) {
        let Some(open) = caps.get(0) else { continue };
        if open.start() < cursor || open.as_str().ends_with("/>") {
            continue;
        }
        let Some(new_text) = values.for_name(&caps[2]) else {
            continue;
        };

        let close = format!("</{}>", &caps[1]);
        let body_start = open.end();
        let body_end = xml[body_start..]
            .find(&close)
            .map(|offset| body_start + offset)
            .ok_or_else(|| {
                HarnessError::Configuration(format!("element '{}' is never closed", &caps[2]))
            })?;

        let escaped = escape_text(new_text);
        let body = value.replace_all(&xml[body_start..body_end], |v: &Captures| {
            format!("{}{}{}", &v[1], escaped, &v[3])
        });

        patched.push_str(&xml[cursor..body_start]);
        patched.push_str(&body);
        cursor = body_end;
        replaced += 1;
    }
    patched.push_str(&xml[cursor..]);

    if replaced == 0 {
        warn!("no env, os or browser entries found in environment file");
    }
    debug!(replaced, "environment entries patched");
    Ok(patched)
}

/// Patches the environment file at `path` in place.
pub async fn write_environment_file(path: impl AsRef<Path>, values: &EnvironmentValues) -> Result<()> {
    let path = path.as_ref();
    let xml = tokio::fs::read_to_string(path).await?;
    let patched = patch_environment(&xml, values)?;
    tokio::fs::write(path, patched).await?;
    Ok(())
}
