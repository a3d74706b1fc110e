//! Configuration of the provider binary.

use ::std::{env, time::Duration};

use ::atlas_client::{Credentials, DEFAULT_BASE_URL};
use ::atlas_common::serde::Deserialize;

use crate::{poller::ObservationErrorPolicy, resources::Timeouts};

pub const USERNAME_ENV: &str = "MONGODB_ATLAS_USERNAME";
pub const API_KEY_ENV: &str = "MONGODB_ATLAS_API_KEY";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(crate = "atlas_common::serde")]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Falls back to the `MONGODB_ATLAS_USERNAME` and
    /// `MONGODB_ATLAS_API_KEY` environment variables.
    #[serde(default)]
    pub credentials: Option<CredentialsConfig>,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub observation_error_policy: ObservationErrorPolicy,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            credentials: None,
            timeouts: TimeoutsConfig::default(),
            observation_error_policy: ObservationErrorPolicy::default(),
        }
    }
}

/// Programmatic API key of an Atlas organization or project.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(crate = "atlas_common::serde")]
#[serde(deny_unknown_fields)]
pub struct CredentialsConfig {
    pub username: String,
    pub api_key: String,
}

impl From<CredentialsConfig> for Credentials {
    fn from(value: CredentialsConfig) -> Self {
        Credentials::Basic {
            username: value.username,
            password: Some(value.api_key),
        }
    }
}

/// Overrides of the per kind default timeouts, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(crate = "atlas_common::serde")]
#[serde(deny_unknown_fields)]
pub struct TimeoutsConfig {
    #[serde(default)]
    pub create_secs: Option<u64>,
    #[serde(default)]
    pub update_secs: Option<u64>,
    #[serde(default)]
    pub delete_secs: Option<u64>,
}

impl TimeoutsConfig {
    pub fn apply(&self, defaults: Timeouts) -> Timeouts {
        let pick = |secs: Option<u64>, default| secs.map_or(default, Duration::from_secs);
        Timeouts {
            create: pick(self.create_secs, defaults.create),
            update: pick(self.update_secs, defaults.update),
            delete: pick(self.delete_secs, defaults.delete),
        }
    }
}

impl ProviderConfig {
    /// Credentials from the config file, else from the environment.
    pub fn credentials(&self) -> Option<Credentials> {
        self.credentials_with(|key| env::var(key).ok())
    }

    fn credentials_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<Credentials> {
        if let Some(credentials) = &self.credentials {
            return Some(credentials.clone().into());
        }
        let username = lookup(USERNAME_ENV)?;
        let api_key = lookup(API_KEY_ENV)?;
        Some(Credentials::Basic {
            username,
            password: Some(api_key),
        })
    }
}
