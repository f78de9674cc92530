//! Compiled-in payload assets.
//!
//! Every file written by the plan lives here as opaque text keyed by an
//! [`Asset`] name. Assets whose file name ends in `.j2` are minijinja templates
//! and are rendered once by the plan builder; everything else is emitted
//! verbatim.

use minijinja::{Environment, UndefinedBehavior, Value};

const DOCKERFILE: &str = include_str!("templates/Dockerfile.j2");
const DOCKER_COMPOSE: &str = include_str!("templates/docker-compose.yml");
const WAIT_FOR_TCP: &str = include_str!("templates/script/wait-for-tcp.sh");
const START_WEB: &str = include_str!("templates/script/docker-dev-start-web.sh");
const RAILSRC: &str = include_str!("templates/railsrc");
const PROCFILE_DEV: &str = include_str!("templates/Procfile.dev");
const DATABASE_DEVELOPMENT: &str = include_str!("templates/database/development.yml");
const DATABASE_TEST: &str = include_str!("templates/database/test.yml");
const NEXT_STEPS: &str = include_str!("templates/next_steps.txt.j2");

/// Logical name of an embedded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Asset {
    Dockerfile,
    DockerCompose,
    WaitForTcp,
    StartWeb,
    Railsrc,
    ProcfileDev,
    DatabaseDevelopment,
    DatabaseTest,
    NextSteps,
}

impl Asset {
    pub const ALL: [Asset; 9] = [
        Asset::Dockerfile,
        Asset::DockerCompose,
        Asset::WaitForTcp,
        Asset::StartWeb,
        Asset::Railsrc,
        Asset::ProcfileDev,
        Asset::DatabaseDevelopment,
        Asset::DatabaseTest,
        Asset::NextSteps,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Asset::Dockerfile => "Dockerfile.j2",
            Asset::DockerCompose => "docker-compose.yml",
            Asset::WaitForTcp => "script/wait-for-tcp.sh",
            Asset::StartWeb => "script/docker-dev-start-web.sh",
            Asset::Railsrc => "railsrc",
            Asset::ProcfileDev => "Procfile.dev",
            Asset::DatabaseDevelopment => "database/development.yml",
            Asset::DatabaseTest => "database/test.yml",
            Asset::NextSteps => "next_steps.txt.j2",
        }
    }

    pub fn source(self) -> &'static str {
        match self {
            Asset::Dockerfile => DOCKERFILE,
            Asset::DockerCompose => DOCKER_COMPOSE,
            Asset::WaitForTcp => WAIT_FOR_TCP,
            Asset::StartWeb => START_WEB,
            Asset::Railsrc => RAILSRC,
            Asset::ProcfileDev => PROCFILE_DEV,
            Asset::DatabaseDevelopment => DATABASE_DEVELOPMENT,
            Asset::DatabaseTest => DATABASE_TEST,
            Asset::NextSteps => NEXT_STEPS,
        }
    }

    pub fn is_template(self) -> bool {
        self.name().ends_with(".j2")
    }
}

/// Template engine over the embedded assets.
pub struct AssetStore {
    env: Environment<'static>,
}

impl Default for AssetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetStore {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        for asset in Asset::ALL {
            if asset.is_template() {
                env.add_template(asset.name(), asset.source())
                    .expect("embedded asset template should be valid");
            }
        }
        Self { env }
    }

    /// Render `asset` with `ctx`. Non-template assets are returned verbatim.
    ///
    /// Panics if a template references a variable missing from `ctx`; callers
    /// pass a fixed context per asset, which the tests below pin down.
    pub fn render(&self, asset: Asset, ctx: Value) -> String {
        if !asset.is_template() {
            return asset.source().to_string();
        }
        self.env
            .get_template(asset.name())
            .and_then(|template| template.render(ctx))
            .expect("embedded asset template should render with its context")
    }

    /// Verbatim text of a non-template asset.
    pub fn text(&self, asset: Asset) -> &'static str {
        asset.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn dockerfile_renders_versions_and_keeps_trailing_newline() {
        let store = AssetStore::new();
        let rendered = store.render(
            Asset::Dockerfile,
            context! { base_image => "ruby:3.1.2-bullseye", bundler_version => "2.3.22" },
        );
        assert!(rendered.starts_with("FROM ruby:3.1.2-bullseye\n"));
        assert!(rendered.contains("gem install bundler -v 2.3.22 &&"));
        assert!(rendered.ends_with("ADD . /app\n"));
    }

    #[test]
    fn next_steps_mentions_project_dir() {
        let store = AssetStore::new();
        let rendered = store.render(Asset::NextSteps, context! { project_dir => "blog" });
        assert!(rendered.contains("`cd` into blog"));
        assert!(rendered.contains("docker-compose run app bash"));
    }

    #[test]
    fn static_assets_are_verbatim() {
        let store = AssetStore::new();
        for asset in Asset::ALL.into_iter().filter(|asset| !asset.is_template()) {
            assert_eq!(store.render(asset, Value::UNDEFINED), asset.source());
            assert!(asset.source().ends_with('\n'), "{} lacks newline", asset.name());
        }
    }

    #[test]
    fn scripts_start_with_shebang() {
        for asset in [Asset::WaitForTcp, Asset::StartWeb] {
            assert!(asset.source().starts_with("#!/usr/bin/env bash\n"));
        }
    }
}
