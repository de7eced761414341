use crate::constants::{self, env};
use crate::error::HarnessError;
use crate::tag::Tag;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;


/// Share, credential and image settings read once from the environment
#[derive(Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub share_name: String,
    pub share_username: String,
    pub share_username2: String,
    pub share_password: String,
    pub share_fqdn: String,
    pub share_ip: String,
    pub tag: Tag,
    pub dependencies_dir: PathBuf,
}

impl HarnessConfig {
    pub fn from_env() -> Result<Self, HarnessError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Every missing variable is reported in a single error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, HarnessError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let missing: Vec<String> = env::REQUIRED
            .into_iter()
            .filter(|&name| lookup(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(HarnessError::MissingEnv(missing));
        }

        let var = |name: &str| lookup(name).unwrap_or_default();

        Ok(Self {
            share_name: var(env::SHARE_NAME),
            share_username: var(env::SHARE_USERNAME),
            share_username2: var(env::SHARE_USERNAME2),
            share_password: var(env::SHARE_PASSWORD),
            share_fqdn: var(env::SHARE_FQDN),
            share_ip: var(env::SHARE_IP),
            tag: var(env::VERSION_TAG).parse()?,
            dependencies_dir: PathBuf::from(var(env::DEPENDENCIES_DIR)),
        })
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = tag;
        self
    }

    /// Local image id built for the configured tag
    pub fn image_id(&self) -> String {
        format!("{}:{}", constants::image::REPOSITORY, self.tag)
    }

    pub fn ip_share_unc(&self) -> String {
        unc(&self.share_ip, &self.share_name)
    }

    pub fn fqdn_share_unc(&self) -> String {
        unc(&self.share_fqdn, &self.share_name)
    }
}

fn unc(host: &str, share: &str) -> String {
    format!("\\\\{}\\{}", host, share)
}

impl fmt::Debug for HarnessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarnessConfig")
            .field("share_name", &self.share_name)
            .field("share_username", &self.share_username)
            .field("share_username2", &self.share_username2)
            .field("share_password", &"********")
            .field("share_fqdn", &self.share_fqdn)
            .field("share_ip", &self.share_ip)
            .field("tag", &self.tag)
            .field("dependencies_dir", &self.dependencies_dir)
            .finish()
    }
}

/// Optional harness settings from `<config dir>/winfs-ci/config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory containing `<tag>/Dockerfile`
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,

    /// Directory containing the per-tag fixture directories
    #[serde(default = "default_fixtures_dir")]
    pub fixtures_dir: PathBuf,

    /// Parallel mounts in the concurrent-access check
    #[serde(default = "default_concurrent_mounts")]
    pub concurrent_mounts: usize,

    #[serde(default)]
    pub timeouts: Timeouts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeouts {
    #[serde(default = "default_build_secs")]
    pub build_secs: u64,

    #[serde(default = "default_mount_secs")]
    pub mount_secs: u64,

    #[serde(default = "default_query_secs")]
    pub query_secs: u64,
}

fn default_images_dir() -> PathBuf {
    PathBuf::from(constants::DEFAULT_IMAGES_DIR)
}

fn default_fixtures_dir() -> PathBuf {
    PathBuf::from(constants::DEFAULT_FIXTURES_DIR)
}

fn default_concurrent_mounts() -> usize {
    constants::DEFAULT_CONCURRENT_MOUNTS
}

fn default_build_secs() -> u64 {
    constants::timeout::BUILD_SECS
}

fn default_mount_secs() -> u64 {
    constants::timeout::MOUNT_SECS
}

fn default_query_secs() -> u64 {
    constants::timeout::QUERY_SECS
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            build_secs: default_build_secs(),
            mount_secs: default_mount_secs(),
            query_secs: default_query_secs(),
        }
    }
}

impl Timeouts {
    pub fn build(&self) -> Duration {
        Duration::from_secs(self.build_secs)
    }

    pub fn mount(&self) -> Duration {
        Duration::from_secs(self.mount_secs)
    }

    pub fn query(&self) -> Duration {
        Duration::from_secs(self.query_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
            fixtures_dir: default_fixtures_dir(),
            concurrent_mounts: default_concurrent_mounts(),
            timeouts: Timeouts::default(),
        }
    }
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("winfs-ci").join("config.toml");
            if config_path.exists() {
                return Self::load_from(&config_path);
            }
        }
        Ok(Settings::default())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }
}
