//! Project configuration stored in `railsdock.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::plan::PlanOptions;

/// Default file name, looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "railsdock.toml";

/// What happens when a checkpoint commit is rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CheckpointPolicy {
    /// Abort the plan like any other step failure.
    Strict,
    /// Log and record the failure, then continue with the next step.
    #[default]
    BestEffort,
}

/// Which version-control collaborator backs checkpoint steps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VcsKind {
    #[default]
    Git,
    /// Checkpoints succeed without touching version control.
    None,
}

/// railsdock configuration (TOML).
///
/// Missing fields take the defaults below; a missing file is all defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RailsdockConfig {
    /// Ruby version for the base image and the Gemfile `ruby` line.
    pub ruby_version: String,

    /// Bundler version installed in the image.
    pub bundler_version: String,

    /// Debian release suffix of the Ruby base image.
    pub base_image_variant: String,

    pub checkpoints: CheckpointPolicy,

    pub vcs: VcsKind,

    /// Upper bound on each shell step, in seconds.
    pub shell_timeout_secs: u64,
}

impl Default for RailsdockConfig {
    fn default() -> Self {
        let plan = PlanOptions::default();
        Self {
            ruby_version: plan.ruby_version,
            bundler_version: plan.bundler_version,
            base_image_variant: plan.base_image_variant,
            checkpoints: CheckpointPolicy::default(),
            vcs: VcsKind::default(),
            shell_timeout_secs: 10 * 60,
        }
    }
}

impl RailsdockConfig {
    pub fn validate(&self) -> Result<()> {
        validate_version_field("ruby_version", &self.ruby_version)?;
        validate_version_field("bundler_version", &self.bundler_version)?;
        validate_version_field("base_image_variant", &self.base_image_variant)?;
        if self.shell_timeout_secs == 0 {
            return Err(anyhow!("shell_timeout_secs must be > 0"));
        }
        Ok(())
    }

    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            ruby_version: self.ruby_version.clone(),
            bundler_version: self.bundler_version.clone(),
            base_image_variant: self.base_image_variant.clone(),
        }
    }

    pub fn shell_timeout(&self) -> Duration {
        Duration::from_secs(self.shell_timeout_secs)
    }
}

/// Values end up in image tags and shell lines, so keep them to `[0-9A-Za-z.-]`.
fn validate_version_field(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(anyhow!("{name} must not be empty"));
    }
    if value
        .chars()
        .any(|c| !(c.is_ascii_alphanumeric() || c == '.' || c == '-'))
    {
        return Err(anyhow!("{name} must be [0-9A-Za-z.-] only (got '{value}')"));
    }
    Ok(())
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `RailsdockConfig::default()`.
pub fn load_config(path: &Path) -> Result<RailsdockConfig> {
    if !path.exists() {
        let cfg = RailsdockConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: RailsdockConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &RailsdockConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
