//! Plan builder: the fixed, ordered list of project mutations.

use minijinja::context;

use crate::assets::{Asset, AssetStore};
use crate::core::step::{MatchMode, Plan, Step};

pub const DOCKERFILE_PATH: &str = "Dockerfile";
pub const COMPOSE_PATH: &str = "docker-compose.yml";
pub const WAIT_FOR_TCP_PATH: &str = "script/wait-for-tcp.sh";
pub const START_WEB_PATH: &str = "script/docker-dev-start-web.sh";
pub const RAILSRC_PATH: &str = ".railsrc";
pub const DATABASE_CONFIG_PATH: &str = "config/database.yml";
pub const GEMFILE_PATH: &str = "Gemfile";
pub const PROCFILE_DEV_PATH: &str = "Procfile.dev";
pub const GITIGNORE_PATH: &str = ".gitignore";

/// Entries appended to `.gitignore`: the start script's sentinel files plus macOS noise.
pub const GITIGNORE_ENTRIES: [&str; 3] = [".db-seeded\n", ".db-created\n", ".DS_Store\n"];

const DEVELOPMENT_BLOCK_PATTERN: &str = r"^development:\n  <<: \*default";
const TEST_BLOCK_PATTERN: &str = r"^test:\n  <<: \*default";
const GEMFILE_RUBY_PATTERN: &str = r"^ruby .*$";

/// Framework versions baked into the generated files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOptions {
    pub ruby_version: String,
    pub bundler_version: String,
    /// Debian release suffix of the official Ruby image (e.g. `bullseye`).
    pub base_image_variant: String,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            ruby_version: "3.1.2".to_string(),
            bundler_version: "2.3.22".to_string(),
            base_image_variant: "bullseye".to_string(),
        }
    }
}

impl PlanOptions {
    pub fn base_image(&self) -> String {
        format!("ruby:{}-{}", self.ruby_version, self.base_image_variant)
    }
}

/// Build the plan. Pure and deterministic: equal options give equal plans.
pub fn build_plan(options: &PlanOptions) -> Plan {
    let assets = AssetStore::new();
    let dockerfile = assets.render(
        Asset::Dockerfile,
        context! {
            base_image => options.base_image(),
            bundler_version => options.bundler_version.as_str(),
        },
    );

    let mut steps = vec![
        Step::initial_checkpoint("Initial commit"),
        Step::write(DOCKERFILE_PATH, dockerfile),
        Step::write_executable(WAIT_FOR_TCP_PATH, assets.text(Asset::WaitForTcp)),
        Step::write_executable(START_WEB_PATH, assets.text(Asset::StartWeb)),
        Step::write(COMPOSE_PATH, assets.text(Asset::DockerCompose)),
        Step::checkpoint("Add Docker config to app"),
        Step::write(RAILSRC_PATH, assets.text(Asset::Railsrc)),
        Step::replace(
            DATABASE_CONFIG_PATH,
            DEVELOPMENT_BLOCK_PATTERN,
            assets.text(Asset::DatabaseDevelopment),
            MatchMode::Strict,
        ),
        Step::replace(
            DATABASE_CONFIG_PATH,
            TEST_BLOCK_PATTERN,
            assets.text(Asset::DatabaseTest),
            MatchMode::Strict,
        ),
        // Older Gemfiles do not pin a Ruby version; nothing to rewrite then.
        Step::replace(
            GEMFILE_PATH,
            GEMFILE_RUBY_PATTERN,
            format!("ruby '{}'", options.ruby_version),
            MatchMode::BestEffort,
        ),
        Step::checkpoint(format!("Use Ruby {} in the Gemfile", options.ruby_version)),
        Step::write(PROCFILE_DEV_PATH, assets.text(Asset::ProcfileDev)),
    ];
    steps.extend(
        GITIGNORE_ENTRIES
            .iter()
            .map(|entry| Step::append(GITIGNORE_PATH, *entry)),
    );
    Plan::new(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::step::StepKind;

    #[test]
    fn build_is_deterministic() {
        let options = PlanOptions::default();
        assert_eq!(build_plan(&options), build_plan(&options));
    }

    #[test]
    fn steps_follow_fixed_order() {
        let plan = build_plan(&PlanOptions::default());
        let kinds: Vec<StepKind> = plan.steps().iter().map(Step::kind).collect();
        assert_eq!(
            kinds,
            vec![
                StepKind::Checkpoint,
                StepKind::WriteFile,
                StepKind::WriteFile,
                StepKind::WriteFile,
                StepKind::WriteFile,
                StepKind::Checkpoint,
                StepKind::WriteFile,
                StepKind::ReplaceText,
                StepKind::ReplaceText,
                StepKind::ReplaceText,
                StepKind::Checkpoint,
                StepKind::WriteFile,
                StepKind::AppendFile,
                StepKind::AppendFile,
                StepKind::AppendFile,
            ]
        );
        assert_eq!(
            plan.checkpoint_messages(),
            vec![
                "Initial commit",
                "Add Docker config to app",
                "Use Ruby 3.1.2 in the Gemfile"
            ]
        );
        assert!(matches!(
            plan.steps()[0],
            Step::Checkpoint {
                initialize_repository: true,
                ..
            }
        ));
    }

    #[test]
    fn only_scripts_are_executable() {
        let plan = build_plan(&PlanOptions::default());
        let executables: Vec<&str> = plan
            .steps()
            .iter()
            .filter_map(|step| match step {
                Step::WriteFile {
                    target_path,
                    executable: true,
                    ..
                } => Some(target_path.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(executables, vec![WAIT_FOR_TCP_PATH, START_WEB_PATH]);
    }

    #[test]
    fn versions_flow_into_payloads() {
        let options = PlanOptions {
            ruby_version: "3.3.0".to_string(),
            bundler_version: "2.5.4".to_string(),
            base_image_variant: "bookworm".to_string(),
        };
        let plan = build_plan(&options);

        let Step::WriteFile { content, .. } = &plan.steps()[1] else {
            panic!("expected Dockerfile write");
        };
        assert!(content.starts_with("FROM ruby:3.3.0-bookworm\n"));
        assert!(content.contains("bundler -v 2.5.4"));

        let Step::ReplaceText {
            replacement, mode, ..
        } = &plan.steps()[9]
        else {
            panic!("expected Gemfile replacement");
        };
        assert_eq!(replacement, "ruby '3.3.0'");
        assert_eq!(*mode, MatchMode::BestEffort);
        assert_eq!(plan.checkpoint_messages()[2], "Use Ruby 3.3.0 in the Gemfile");
    }

    #[test]
    fn database_edits_are_strict() {
        let plan = build_plan(&PlanOptions::default());
        let database_modes: Vec<MatchMode> = plan
            .steps()
            .iter()
            .filter_map(|step| match step {
                Step::ReplaceText {
                    target_path, mode, ..
                } if target_path == DATABASE_CONFIG_PATH => Some(*mode),
                _ => None,
            })
            .collect();
        assert_eq!(database_modes, vec![MatchMode::Strict, MatchMode::Strict]);
    }
}
