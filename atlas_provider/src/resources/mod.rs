//! Resource kinds and the pure translation between their declared
//! configuration and the Atlas wire payloads.

use ::core::fmt::Debug;
use ::std::time::Duration;

use ::atlas_common::{
    error::Result,
    resource::{ObservedState, ResourceIdentity, StateSet},
    serde::{de::DeserializeOwned, Serialize},
};

pub mod alert_configuration;
pub mod cluster;
pub mod container;
pub mod database_user;
pub mod ip_whitelist;
pub mod peer;

pub use alert_configuration::AlertConfigurationResource;
pub use cluster::ClusterResource;
pub use container::ContainerResource;
pub use database_user::DatabaseUserResource;
pub use ip_whitelist::IpWhitelistResource;
pub use peer::PeerResource;

/// How long each lifecycle operation may wait for the remote side to converge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Timeouts {
    pub const fn uniform(timeout: Duration) -> Self {
        Self {
            create: timeout,
            update: timeout,
            delete: timeout,
        }
    }
}

/// States a kind moves through while converging, and the polling cadence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Convergence {
    pub pending: StateSet,
    pub target: StateSet,
    /// Grace period before the first observation.
    pub initial_delay: Duration,
    /// Floor on the time between two observations.
    pub min_interval: Duration,
}

impl Convergence {
    /// Deletion is confirmed only by the synthesized `DELETED` state.
    pub fn deletion(pending: StateSet, initial_delay: Duration, min_interval: Duration) -> Self {
        Self {
            pending,
            target: std::iter::once(ObservedState::DELETED).collect(),
            initial_delay,
            min_interval,
        }
    }
}

/// A kind of Atlas resource managed by the [`crate::reconciler::Reconciler`].
///
/// Implementors are marker types; every function is a pure transform so
/// adapters can be tested without any remote API.
pub trait Resource: Debug + Clone + Default + Send + Sync + 'static {
    /// Human readable kind, used in logs and errors.
    const KIND: &'static str;

    /// Creates and updates of this kind must not run concurrently within one process.
    const SERIALIZE_WRITES: bool = false;

    const DEFAULT_TIMEOUTS: Timeouts = Timeouts::uniform(Duration::ZERO);

    /// Declared configuration.
    type Config: Debug + Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync;
    /// Wire representation exchanged with the API.
    type Remote: Debug + Clone + Send + Sync;
    /// Attributes read back after an operation, computed fields included.
    type Attributes: Debug + Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync;

    fn group_id(config: &Self::Config) -> &str;

    /// Reject configurations Atlas would only refuse after a round trip.
    fn validate(_config: &Self::Config) -> Result<()> {
        Ok(())
    }

    fn create_payload(config: &Self::Config) -> Self::Remote;

    /// Identity of a freshly created resource.
    fn identity_of(config: &Self::Config, created: &Self::Remote) -> Result<ResourceIdentity>;

    /// Pending and target states after a create or an update.
    /// `None` for kinds that are usable as soon as the API accepts them.
    fn convergence() -> Option<Convergence> {
        None
    }

    /// Pending states after a delete. `None` when no polling is needed.
    fn deletion() -> Option<Convergence> {
        None
    }

    /// State label of a snapshot. Kinds without a lifecycle field
    /// report every existing snapshot as `PRESENT`.
    fn state_of(_remote: &Self::Remote) -> ObservedState {
        ObservedState::from_static("PRESENT")
    }

    /// Copy every tracked field that differs between `previous` and `desired`
    /// onto `remote`. Returns whether any field changed.
    fn apply_changes(
        previous: &Self::Config,
        desired: &Self::Config,
        remote: &mut Self::Remote,
    ) -> bool;

    /// Private IP mode the group has to be switched to, given the config
    /// applied before (`None` on create) and the desired one. `None` leaves
    /// the group alone.
    fn private_ip_mode(_previous: Option<&Self::Config>, _desired: &Self::Config) -> Option<bool> {
        None
    }

    /// Remove server managed fields the API refuses to receive back.
    fn clear_read_only(_remote: &mut Self::Remote) {}

    fn attributes(identity: &ResourceIdentity, remote: &Self::Remote) -> Self::Attributes;

    /// Configuration equivalent to a remote snapshot, used after an import.
    fn config_of(identity: &ResourceIdentity, remote: &Self::Remote) -> Self::Config;
}

/// Set `target` to `desired` if it differs from `previous`.
/// Returns whether the field changed.
pub(crate) fn apply_field<T, U>(
    previous: &T,
    desired: &T,
    target: &mut U,
    convert: impl FnOnce(&T) -> U,
) -> bool
where
    T: PartialEq,
{
    if previous == desired {
        false
    } else {
        *target = convert(desired);
        true
    }
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}
