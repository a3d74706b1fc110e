//! Wire representations of the Atlas API resources.
//!
//! Every optional field is skipped when unset, so a payload only carries
//! what the caller filled in. Server managed fields are cleared by setting
//! them to `None` before an update.

use ::serde::{Deserialize, Serialize};

mod alert_configuration;
mod cluster;
mod container;
mod database_user;
mod ip_whitelist;
mod peer;
mod project;

pub use alert_configuration::{AlertConfiguration, Matcher, MetricThreshold, Notification};
pub use cluster::{AutoScaling, Cluster, ProviderSettings, ReplicationSpec};
pub use container::Container;
pub use database_user::{DatabaseUser, Role};
pub use ip_whitelist::WhitelistEntry;
pub use peer::Peer;
pub use project::{PrivateIpMode, Project};

/// Paginated list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub total_count: usize,
}
