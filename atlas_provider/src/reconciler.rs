//! Drive one resource through create, read, update, delete and import.

use ::core::marker::PhantomData;
use ::std::{sync::Arc, time::Duration};

use ::atlas_common::{
    anyhow::anyhow,
    error::{ProviderError, Result},
    resource::ResourceIdentity,
    serde::{Deserialize, Serialize},
    tokio::sync::{Mutex, MutexGuard},
    tracing::{debug, info},
};

use crate::{
    observer::ResourceObserver,
    poller::{wait_for_state, ObservationErrorPolicy, PollSpec},
    remote_api::RemoteApi,
    resources::{Convergence, Resource, Timeouts},
};

/// Serializes creates and updates of kinds that race remotely.
/// Clones share the same lock.
#[derive(Debug, Clone, Default)]
pub struct CreateLock(Arc<Mutex<()>>);

impl CreateLock {
    pub fn new() -> Self {
        Self::default()
    }

    async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.0.lock().await
    }
}

/// Local view of one managed resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(crate = "atlas_common::serde")]
#[serde(bound = "")]
pub struct TrackedResource<K: Resource> {
    /// `None` until created or imported, and again once deleted.
    pub identity: Option<ResourceIdentity>,
    /// Configuration last applied, the baseline of the next update.
    pub config: Option<K::Config>,
    pub attributes: Option<K::Attributes>,
}

impl<K: Resource> Default for TrackedResource<K> {
    fn default() -> Self {
        Self {
            identity: None,
            config: None,
            attributes: None,
        }
    }
}

impl<K: Resource> TrackedResource<K> {
    pub fn exists(&self) -> bool {
        self.identity.is_some()
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn identity(&self) -> Result<ResourceIdentity> {
        self.identity.clone().ok_or_else(|| {
            ProviderError::illegal_argument(anyhow!("The {} has not been created yet", K::KIND))
        })
    }
}

/// Reconciles resources of kind `K` through the remote API `A`.
pub struct Reconciler<K, A> {
    api: A,
    timeouts: Timeouts,
    observation_policy: ObservationErrorPolicy,
    create_lock: CreateLock,
    _kind: PhantomData<fn() -> K>,
}

impl<K, A> Reconciler<K, A>
where
    K: Resource,
    A: RemoteApi<K>,
{
    pub fn new(api: A) -> Self {
        Self {
            api,
            timeouts: K::DEFAULT_TIMEOUTS,
            observation_policy: ObservationErrorPolicy::default(),
            create_lock: CreateLock::new(),
            _kind: PhantomData,
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_observation_policy(mut self, policy: ObservationErrorPolicy) -> Self {
        self.observation_policy = policy;
        self
    }

    /// Share `lock` with other reconcilers of the same process.
    pub fn with_create_lock(mut self, lock: CreateLock) -> Self {
        self.create_lock = lock;
        self
    }

    /// Create the resource and wait until it is usable.
    ///
    /// The identity is recorded as soon as Atlas accepts the create, so a
    /// failed wait still leaves a resource that can be read or deleted.
    pub async fn create(&self, config: &K::Config, tracked: &mut TrackedResource<K>) -> Result<()> {
        K::validate(config)?;
        let _guard = self.serialize().await;

        let group_id = K::group_id(config);
        info!("Creating {} in group {}", K::KIND, group_id);
        let payload = K::create_payload(config);
        let created = self.api.create(group_id, &payload).await.map_err(|e| {
            ProviderError::operation("create", format!("{} in group {}", K::KIND, group_id), e)
        })?;
        let identity = K::identity_of(config, &created)?;
        tracked.identity = Some(identity.clone());
        tracked.config = Some(config.clone());

        if let Some(enabled) = K::private_ip_mode(None, config) {
            self.switch_private_ip_mode("create", &identity, enabled)
                .await?;
        }

        if let Some(convergence) = K::convergence() {
            self.wait(&identity, convergence, self.timeouts.create)
                .await?;
        }
        tracked.attributes = Some(self.read_back(&identity).await?);
        info!("Created {} {}", K::KIND, identity);
        Ok(())
    }

    /// Refresh the attributes. A resource deleted behind our back is
    /// forgotten without an error.
    pub async fn read(&self, tracked: &mut TrackedResource<K>) -> Result<()> {
        let identity = tracked.identity()?;
        match self.get(&identity).await? {
            Some(remote) => {
                tracked.attributes = Some(K::attributes(&identity, &remote));
            }
            None => {
                info!("{} {} no longer exists, forgetting it", K::KIND, identity);
                tracked.clear();
            }
        }
        Ok(())
    }

    /// Bring the remote resource to `desired`.
    ///
    /// Only tracked fields whose value changed since the last applied
    /// configuration are sent. Nothing is sent, and nothing is polled,
    /// when no field changed.
    pub async fn update(
        &self,
        desired: &K::Config,
        tracked: &mut TrackedResource<K>,
    ) -> Result<()> {
        K::validate(desired)?;
        let identity = tracked.identity()?;
        let _guard = self.serialize().await;
        let mut remote = self.get(&identity).await?.ok_or_else(|| {
            ProviderError::operation(
                "update",
                format!("{} {}", K::KIND, identity),
                ProviderError::not_found(format!("{} {}", K::KIND, identity)),
            )
        })?;
        let previous = tracked
            .config
            .clone()
            .unwrap_or_else(|| K::config_of(&identity, &remote));

        if let Some(enabled) = K::private_ip_mode(Some(&previous), desired) {
            self.switch_private_ip_mode("update", &identity, enabled)
                .await?;
        }

        if !K::apply_changes(&previous, desired, &mut remote) {
            debug!("No field of {} {} to update", K::KIND, identity);
            tracked.config = Some(desired.clone());
            tracked.attributes = Some(K::attributes(&identity, &remote));
            return Ok(());
        }

        info!("Updating {} {}", K::KIND, identity);
        K::clear_read_only(&mut remote);
        self.api
            .update(&identity, &remote)
            .await
            .map_err(|e| ProviderError::operation("update", format!("{} {}", K::KIND, identity), e))?;
        tracked.config = Some(desired.clone());

        if let Some(convergence) = K::convergence() {
            self.wait(&identity, convergence, self.timeouts.update)
                .await?;
        }
        tracked.attributes = Some(self.read_back(&identity).await?);
        Ok(())
    }

    /// Delete the resource. Succeeds only once Atlas no longer knows it.
    pub async fn delete(&self, tracked: &mut TrackedResource<K>) -> Result<()> {
        let identity = tracked.identity()?;
        info!("Deleting {} {}", K::KIND, identity);
        self.api
            .delete(&identity)
            .await
            .map_err(|e| ProviderError::operation("delete", format!("{} {}", K::KIND, identity), e))?;

        if let Some(deletion) = K::deletion() {
            self.wait(&identity, deletion, self.timeouts.delete).await?;
        }
        tracked.clear();
        info!("Deleted {} {}", K::KIND, identity);
        Ok(())
    }

    /// Start tracking an existing resource from its `GROUP-ID` import id.
    pub async fn import(&self, import_id: &str) -> Result<TrackedResource<K>> {
        let identity: ResourceIdentity = import_id.parse()?;
        let remote = self.get(&identity).await?.ok_or_else(|| {
            ProviderError::not_found(format!("{} {}", K::KIND, identity))
        })?;
        info!("Imported {} {}", K::KIND, identity);
        Ok(TrackedResource {
            config: Some(K::config_of(&identity, &remote)),
            attributes: Some(K::attributes(&identity, &remote)),
            identity: Some(identity),
        })
    }

    async fn switch_private_ip_mode(
        &self,
        operation: &'static str,
        identity: &ResourceIdentity,
        enabled: bool,
    ) -> Result<()> {
        info!(
            "Switching private ip mode of group {} to {}",
            identity.group_id(),
            enabled
        );
        self.api
            .switch_private_ip_mode(identity.group_id(), enabled)
            .await
            .map_err(|e| ProviderError::operation(operation, format!("{} {}", K::KIND, identity), e))
    }

    /// Held across the whole write for kinds whose writes race remotely.
    async fn serialize(&self) -> Option<MutexGuard<'_, ()>> {
        if K::SERIALIZE_WRITES {
            Some(self.create_lock.acquire().await)
        } else {
            None
        }
    }

    async fn get(&self, identity: &ResourceIdentity) -> Result<Option<K::Remote>> {
        self.api
            .get(identity)
            .await
            .map_err(|e| ProviderError::operation("read", format!("{} {}", K::KIND, identity), e))
    }

    /// Final read once the remote side converged.
    async fn read_back(&self, identity: &ResourceIdentity) -> Result<K::Attributes> {
        let remote = self.get(identity).await?.ok_or_else(|| {
            ProviderError::operation(
                "read",
                format!("{} {}", K::KIND, identity),
                ProviderError::not_found(format!("{} {}", K::KIND, identity)),
            )
        })?;
        Ok(K::attributes(identity, &remote))
    }

    async fn wait(
        &self,
        identity: &ResourceIdentity,
        convergence: Convergence,
        timeout: Duration,
    ) -> Result<Option<K::Remote>> {
        let observer = ResourceObserver::<K, A>::new(&self.api, identity);
        let spec = PollSpec {
            pending: convergence.pending,
            target: convergence.target,
            timeout,
            min_interval: convergence.min_interval,
            initial_delay: convergence.initial_delay,
            on_observation_error: self.observation_policy,
        };
        wait_for_state(&observer, &spec).await
    }
}
