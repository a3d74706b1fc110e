//! One observation of a remote resource.

use ::core::future::Future;

use ::atlas_common::{
    error::Result,
    resource::{ObservedState, ResourceIdentity},
    tracing::debug,
};

use crate::{remote_api::RemoteApi, resources::Resource};

static DELETED: ObservedState = ObservedState::DELETED;

/// Outcome of one successful observation.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation<T> {
    Present { snapshot: T, state: ObservedState },
    /// The remote answered 404. Reported as [`ObservedState::DELETED`].
    Gone,
}

impl<T> Observation<T> {
    pub fn state(&self) -> &ObservedState {
        match self {
            Self::Present { state, .. } => state,
            Self::Gone => &DELETED,
        }
    }

    pub fn into_snapshot(self) -> Option<T> {
        match self {
            Self::Present { snapshot, .. } => Some(snapshot),
            Self::Gone => None,
        }
    }
}

/// Something the poller can observe repeatedly.
pub trait StateObserver: Send + Sync {
    type Snapshot: Send;

    /// Kind and identity of the observed resource, for logs and errors.
    fn resource(&self) -> String;

    /// Observe the resource once.
    /// # Return
    /// - `Ok(Observation::Present { .. })` with the state label of the snapshot.
    /// - `Ok(Observation::Gone)` if the resource does not exist.
    /// - `Err(_)` for any other failure, transient or not.
    fn observe(&self) -> impl Future<Output = Result<Observation<Self::Snapshot>>> + Send;
}

/// Observes one resource of kind `K` through its remote API.
pub struct ResourceObserver<'a, K, A> {
    api: &'a A,
    identity: &'a ResourceIdentity,
    _kind: ::std::marker::PhantomData<fn() -> K>,
}

impl<'a, K, A> ResourceObserver<'a, K, A>
where
    K: Resource,
    A: RemoteApi<K>,
{
    pub fn new(api: &'a A, identity: &'a ResourceIdentity) -> Self {
        Self {
            api,
            identity,
            _kind: ::std::marker::PhantomData,
        }
    }
}

impl<K, A> StateObserver for ResourceObserver<'_, K, A>
where
    K: Resource,
    A: RemoteApi<K>,
{
    type Snapshot = K::Remote;

    fn resource(&self) -> String {
        format!("{} {}", K::KIND, self.identity)
    }

    async fn observe(&self) -> Result<Observation<K::Remote>> {
        match self.api.get(self.identity).await? {
            Some(snapshot) => {
                let state = K::state_of(&snapshot);
                debug!("{} {} is {}", K::KIND, self.identity, state);
                Ok(Observation::Present { snapshot, state })
            }
            None => {
                debug!("{} {} not found", K::KIND, self.identity);
                Ok(Observation::Gone)
            }
        }
    }
}
