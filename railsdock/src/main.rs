//! railsdock CLI.
//!
//! Applies a fixed plan that adds a Dockerfile, a compose file, startup
//! scripts, and a few configuration edits to an existing Rails project,
//! committing along the way.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use minijinja::context;
use railsdock::apply::{ApplyOptions, apply_plan};
use railsdock::assets::{Asset, AssetStore};
use railsdock::core::plan::build_plan;
use railsdock::core::step::Plan;
use railsdock::exit_codes;
use railsdock::io::config::{
    CONFIG_FILE_NAME, CheckpointPolicy, RailsdockConfig, VcsKind, load_config, write_config,
};
use railsdock::io::git::Git;
use railsdock::io::vcs::{NoVcs, VersionControl};
use railsdock::logging;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "railsdock",
    version,
    about = "Scaffold a Docker development environment onto a Rails project"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply the plan to a project root, committing at each checkpoint.
    Apply {
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        versions: VersionArgs,
        /// Abort when a checkpoint commit is rejected instead of warning.
        #[arg(long)]
        strict_checkpoints: bool,
        /// Skip version control entirely (checkpoints become no-ops).
        #[arg(long)]
        no_git: bool,
    },
    /// Print the plan without touching any project.
    Plan {
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        versions: VersionArgs,
        /// Emit the full plan, payloads included, as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Write a default `railsdock.toml` into the project root.
    InitConfig {
        /// Project root.
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Overwrite an existing config file.
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Project root the plan is applied to.
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// Config file (defaults to `<root>/railsdock.toml`; missing means defaults).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct VersionArgs {
    /// Ruby version for the base image and the Gemfile.
    #[arg(long)]
    ruby_version: Option<String>,
    /// Bundler version installed in the image.
    #[arg(long)]
    bundler_version: Option<String>,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Apply {
            target,
            versions,
            strict_checkpoints,
            no_git,
        } => {
            let mut cfg = resolve_config(&target, &versions)?;
            if strict_checkpoints {
                cfg.checkpoints = CheckpointPolicy::Strict;
            }
            if no_git {
                cfg.vcs = VcsKind::None;
            }
            cmd_apply(&target.root, &cfg)
        }
        Command::Plan {
            target,
            versions,
            json,
        } => {
            let cfg = resolve_config(&target, &versions)?;
            cmd_plan(&cfg, json)
        }
        Command::InitConfig { root, force } => cmd_init_config(&root, force),
    }
}

/// Load the config file and layer CLI overrides on top.
fn resolve_config(target: &TargetArgs, versions: &VersionArgs) -> Result<RailsdockConfig> {
    let path = target
        .config
        .clone()
        .unwrap_or_else(|| target.root.join(CONFIG_FILE_NAME));
    debug!(path = %path.display(), "loading config");
    let mut cfg = load_config(&path)?;
    if let Some(ruby) = &versions.ruby_version {
        cfg.ruby_version = ruby.clone();
    }
    if let Some(bundler) = &versions.bundler_version {
        cfg.bundler_version = bundler.clone();
    }
    cfg.validate().context("invalid command-line override")?;
    Ok(cfg)
}

fn cmd_apply(root: &Path, cfg: &RailsdockConfig) -> Result<i32> {
    if !root.is_dir() {
        bail!("project root {} is not a directory", root.display());
    }
    let plan = build_plan(&cfg.plan_options());
    let vcs: Box<dyn VersionControl> = match cfg.vcs {
        VcsKind::Git => Box::new(Git::new(root)),
        VcsKind::None => Box::new(NoVcs),
    };

    let outcome = match apply_plan(root, &plan, vcs.as_ref(), &ApplyOptions::from(cfg)) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("railsdock: {} [{}]", err, err.kind());
            eprintln!(
                "{} was left as-is where step {} stopped; fix the cause and re-run (appended lines will repeat)",
                root.display(),
                err.index + 1
            );
            return Ok(exit_codes::STEP_FAILED);
        }
    };

    for skipped in &outcome.skipped_checkpoints {
        eprintln!(
            "warning: checkpoint \"{}\" (step {}) was not committed: {}",
            skipped.message,
            skipped.index + 1,
            skipped.reason
        );
    }
    let banner = AssetStore::new().render(
        Asset::NextSteps,
        context! { project_dir => root.display().to_string() },
    );
    print!("{banner}");
    Ok(exit_codes::OK)
}

fn cmd_plan(cfg: &RailsdockConfig, json: bool) -> Result<i32> {
    let plan = build_plan(&cfg.plan_options());
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&plan).context("serialize plan")?
        );
    } else {
        print!("{}", render_plan_listing(&plan));
    }
    Ok(exit_codes::OK)
}

fn render_plan_listing(plan: &Plan) -> String {
    let mut out = String::new();
    for (index, step) in plan.steps().iter().enumerate() {
        out.push_str(&format!(
            "{:>2}. {:<12} {}\n",
            index + 1,
            step.kind().as_str(),
            step.describe()
        ));
    }
    out
}

fn cmd_init_config(root: &Path, force: bool) -> Result<i32> {
    let path = root.join(CONFIG_FILE_NAME);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(&path, &RailsdockConfig::default())?;
    println!("{}", path.display());
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use railsdock::core::plan::PlanOptions;

    #[test]
    fn parse_apply_defaults() {
        let cli = Cli::parse_from(["railsdock", "apply"]);
        let Command::Apply {
            target,
            versions,
            strict_checkpoints,
            no_git,
        } = cli.command
        else {
            panic!("expected apply");
        };
        assert_eq!(target.root, PathBuf::from("."));
        assert!(target.config.is_none());
        assert!(versions.ruby_version.is_none());
        assert!(!strict_checkpoints);
        assert!(!no_git);
    }

    #[test]
    fn parse_apply_flags() {
        let cli = Cli::parse_from([
            "railsdock",
            "apply",
            "--root",
            "blog",
            "--ruby-version",
            "3.3.0",
            "--strict-checkpoints",
            "--no-git",
        ]);
        let Command::Apply {
            target,
            versions,
            strict_checkpoints,
            no_git,
        } = cli.command
        else {
            panic!("expected apply");
        };
        assert_eq!(target.root, PathBuf::from("blog"));
        assert_eq!(versions.ruby_version.as_deref(), Some("3.3.0"));
        assert!(strict_checkpoints);
        assert!(no_git);
    }

    #[test]
    fn parse_init_config_force() {
        let cli = Cli::parse_from(["railsdock", "init-config", "--force"]);
        assert!(matches!(cli.command, Command::InitConfig { force: true, .. }));
    }

    #[test]
    fn overrides_replace_file_values() {
        let temp = tempfile::tempdir().expect("tempdir");
        let target = TargetArgs {
            root: temp.path().to_path_buf(),
            config: None,
        };
        let versions = VersionArgs {
            ruby_version: Some("3.3.0".to_string()),
            bundler_version: None,
        };
        let cfg = resolve_config(&target, &versions).expect("config");
        assert_eq!(cfg.ruby_version, "3.3.0");
        assert_eq!(cfg.bundler_version, PlanOptions::default().bundler_version);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let target = TargetArgs {
            root: temp.path().to_path_buf(),
            config: None,
        };
        let versions = VersionArgs {
            ruby_version: Some("3.1 && curl".to_string()),
            bundler_version: None,
        };
        assert!(resolve_config(&target, &versions).is_err());
    }

    #[test]
    fn listing_numbers_every_step() {
        let plan = build_plan(&PlanOptions::default());
        let listing = render_plan_listing(&plan);
        assert_eq!(listing.lines().count(), plan.len());
        assert!(listing.starts_with(" 1. checkpoint   checkpoint \"Initial commit\"\n"));
        assert!(listing.contains("write script/wait-for-tcp.sh (executable)"));
    }
}
