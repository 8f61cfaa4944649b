use etcetera::BaseStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment, Metadata, Provider,
};

lazy_static::lazy_static! {
    /// Provide a lazyily instantiated static reference to
    /// a config object parsed from canonical locations
    /// so that the CLI has immutable access to it from
    /// anywhere without ever having to parse the config more
    /// than once.
    pub static ref CONFIG: Config = load_config();
}

fn load_config() -> Config {
    Config::figment().extract().unwrap_or_default()
}

const CONFIG_FILE: &str = "ciel.toml";
const ENV_PREFIX: &str = "CIEL_";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Directory under which `ciel/<family>/versions/<version>` trees live.
    pdk_root: PathBuf,
    family: String,
    jobs: usize,
    /// Archive compression, `zstd` or `gzip`.
    compression: String,
    /// Base directory for per-invocation archive scratch space.
    scratch_dir: PathBuf,
    release: Release,
    github: GitHub,
}

/// Where releases are published.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Release {
    owner: String,
    repository: String,
    commitish: String,
    /// The `ghr` executable used to upload assets.
    ghr: PathBuf,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GitHub {
    api: String,
}

impl Config {
    pub fn pdk_root(&self) -> &Path {
        &self.pdk_root
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    pub fn compression(&self) -> &str {
        &self.compression
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    pub fn release(&self) -> &Release {
        &self.release
    }

    pub fn github(&self) -> &GitHub {
        &self.github
    }
}

impl Release {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn commitish(&self) -> &str {
        &self.commitish
    }

    pub fn ghr(&self) -> &Path {
        &self.ghr
    }
}

impl GitHub {
    pub fn api(&self) -> &str {
        &self.api
    }
}

impl Default for Config {
    fn default() -> Self {
        let pdk_root = etcetera::home_dir()
            .map(|home| home.join(".ciel"))
            .unwrap_or_else(|_| PathBuf::from(".ciel"));
        Config {
            pdk_root,
            family: "sky130".into(),
            jobs: 1,
            compression: "zstd".into(),
            scratch_dir: std::env::temp_dir().join("ciel"),
            release: Release::default(),
            github: GitHub::default(),
        }
    }
}

impl Default for Release {
    fn default() -> Self {
        Release {
            owner: "fossi-foundation".into(),
            repository: "ciel-releases".into(),
            commitish: "releases".into(),
            ghr: PathBuf::from("ghr"),
        }
    }
}

impl Default for GitHub {
    fn default() -> Self {
        GitHub {
            api: "https://api.github.com".into(),
        }
    }
}

impl Config {
    pub fn figment() -> Figment {
        let user = etcetera::choose_base_strategy()
            .ok()
            .map(|c| c.config_dir().join(CONFIG_FILE));
        Config::layered(user)
    }

    /// Merge the given TOML files over the defaults, in order, followed by
    /// `CIEL_` prefixed environment variables. Nested keys use `__`, e.g.
    /// `CIEL_RELEASE__OWNER`.
    pub fn layered<I>(files: I) -> Figment
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let fig = files
            .into_iter()
            .fold(Figment::from(Config::default()), |fig, file| {
                fig.admerge(Toml::file(file))
            });

        fig.admerge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

impl Provider for Config {
    fn metadata(&self) -> figment::Metadata {
        Metadata::named("Ciel CLI Config")
    }
    fn data(
        &self,
    ) -> Result<figment::value::Map<figment::Profile, figment::value::Dict>, figment::Error> {
        Serialized::defaults(self).data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_public_release_store() {
        let config = Config::default();
        assert_eq!(config.family(), "sky130");
        assert_eq!(config.jobs(), 1);
        assert_eq!(config.compression(), "zstd");
        assert_eq!(config.release().owner(), "fossi-foundation");
        assert_eq!(config.release().repository(), "ciel-releases");
        assert_eq!(config.release().commitish(), "releases");
        assert!(config.pdk_root().ends_with(".ciel"));
    }

    #[test]
    fn file_and_env_layers_override_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                family = "gf180mcu"
                compression = "gzip"

                [release]
                owner = "someone"
                "#,
            )?;
            jail.set_env("CIEL_JOBS", "8");
            jail.set_env("CIEL_RELEASE__REPOSITORY", "pdk-mirror");

            let config: Config = Config::layered([PathBuf::from(CONFIG_FILE)]).extract()?;

            assert_eq!(config.family(), "gf180mcu");
            assert_eq!(config.compression(), "gzip");
            assert_eq!(config.jobs(), 8);
            assert_eq!(config.release().owner(), "someone");
            assert_eq!(config.release().repository(), "pdk-mirror");
            // untouched keys keep their defaults
            assert_eq!(config.release().commitish(), "releases");
            assert_eq!(config.github().api(), "https://api.github.com");
            Ok(())
        });
    }

    #[test]
    fn missing_files_are_ignored() {
        figment::Jail::expect_with(|_| {
            let config: Config = Config::layered([PathBuf::from("does-not-exist.toml")]).extract()?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }
}
