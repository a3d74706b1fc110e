//! The four calls the reconciler needs from Atlas, per resource kind.

use ::core::future::Future;

use ::atlas_client::resource_client::ResourceClient;
use ::atlas_common::{
    anyhow::anyhow,
    error::{ProviderError, Result},
    model::{AlertConfiguration, Cluster, Container, DatabaseUser, Peer, WhitelistEntry},
    resource::ResourceIdentity,
    tracing::debug,
};

use crate::resources::{
    AlertConfigurationResource, ClusterResource, ContainerResource, DatabaseUserResource,
    IpWhitelistResource, PeerResource, Resource,
};

/// Remote CRUD for one kind of resource.
pub trait RemoteApi<K: Resource>: Send + Sync {
    /// Return Ok(None) if the resource does not exist.
    fn get(
        &self,
        identity: &ResourceIdentity,
    ) -> impl Future<Output = Result<Option<K::Remote>>> + Send;

    /// Create the resource in `group_id` and return what Atlas stored.
    fn create(
        &self,
        group_id: &str,
        payload: &K::Remote,
    ) -> impl Future<Output = Result<K::Remote>> + Send;

    fn update(
        &self,
        identity: &ResourceIdentity,
        payload: &K::Remote,
    ) -> impl Future<Output = Result<K::Remote>> + Send;

    /// Ask Atlas to delete the resource. Deletion may complete later.
    fn delete(&self, identity: &ResourceIdentity) -> impl Future<Output = Result<()>> + Send;

    /// Switch the private IP mode of the group. Only kinds whose
    /// [`Resource::private_ip_mode`] asks for it get here.
    fn switch_private_ip_mode(
        &self,
        group_id: &str,
        enabled: bool,
    ) -> impl Future<Output = Result<()>> + Send {
        let group_id = group_id.to_owned();
        async move {
            Err(ProviderError::illegal_argument(anyhow!(
                "Cannot switch private ip mode of group {} to {} through a {}",
                group_id,
                enabled,
                K::KIND
            )))
        }
    }
}

impl RemoteApi<ClusterResource> for ResourceClient {
    async fn get(&self, identity: &ResourceIdentity) -> Result<Option<Cluster>> {
        self.get_cluster(identity.group_id(), identity.id()).await
    }

    async fn create(&self, group_id: &str, payload: &Cluster) -> Result<Cluster> {
        self.create_cluster(group_id, payload).await
    }

    async fn update(&self, identity: &ResourceIdentity, payload: &Cluster) -> Result<Cluster> {
        self.update_cluster(identity.group_id(), identity.id(), payload)
            .await
    }

    async fn delete(&self, identity: &ResourceIdentity) -> Result<()> {
        self.delete_cluster(identity.group_id(), identity.id()).await
    }
}

impl RemoteApi<ContainerResource> for ResourceClient {
    async fn get(&self, identity: &ResourceIdentity) -> Result<Option<Container>> {
        self.get_container(identity.group_id(), identity.id()).await
    }

    async fn create(&self, group_id: &str, payload: &Container) -> Result<Container> {
        self.create_container(group_id, payload).await
    }

    async fn update(&self, identity: &ResourceIdentity, payload: &Container) -> Result<Container> {
        self.update_container(identity.group_id(), identity.id(), payload)
            .await
    }

    async fn delete(&self, identity: &ResourceIdentity) -> Result<()> {
        self.delete_container(identity.group_id(), identity.id())
            .await
    }

    async fn switch_private_ip_mode(&self, group_id: &str, enabled: bool) -> Result<()> {
        let mode = ResourceClient::set_private_ip_mode(self, group_id, enabled).await?;
        debug!("Private ip mode of group {} is now {}", group_id, mode.enabled);
        Ok(())
    }
}

impl RemoteApi<PeerResource> for ResourceClient {
    async fn get(&self, identity: &ResourceIdentity) -> Result<Option<Peer>> {
        self.get_peer(identity.group_id(), identity.id()).await
    }

    async fn create(&self, group_id: &str, payload: &Peer) -> Result<Peer> {
        self.create_peer(group_id, payload).await
    }

    async fn update(&self, identity: &ResourceIdentity, payload: &Peer) -> Result<Peer> {
        self.update_peer(identity.group_id(), identity.id(), payload)
            .await
    }

    async fn delete(&self, identity: &ResourceIdentity) -> Result<()> {
        self.delete_peer(identity.group_id(), identity.id()).await
    }
}

impl RemoteApi<DatabaseUserResource> for ResourceClient {
    async fn get(&self, identity: &ResourceIdentity) -> Result<Option<DatabaseUser>> {
        self.get_database_user(identity.group_id(), identity.id())
            .await
    }

    async fn create(&self, group_id: &str, payload: &DatabaseUser) -> Result<DatabaseUser> {
        self.create_database_user(group_id, payload).await
    }

    async fn update(
        &self,
        identity: &ResourceIdentity,
        payload: &DatabaseUser,
    ) -> Result<DatabaseUser> {
        self.update_database_user(identity.group_id(), identity.id(), payload)
            .await
    }

    async fn delete(&self, identity: &ResourceIdentity) -> Result<()> {
        self.delete_database_user(identity.group_id(), identity.id())
            .await
    }
}

/// Atlas only offers a list POST for whitelist entries, which also
/// overwrites an existing entry with the same CIDR block.
impl RemoteApi<IpWhitelistResource> for ResourceClient {
    async fn get(&self, identity: &ResourceIdentity) -> Result<Option<WhitelistEntry>> {
        self.get_whitelist_entry(identity.group_id(), identity.id())
            .await
    }

    async fn create(&self, group_id: &str, payload: &WhitelistEntry) -> Result<WhitelistEntry> {
        post_whitelist_entry(self, group_id, payload).await
    }

    async fn update(
        &self,
        identity: &ResourceIdentity,
        payload: &WhitelistEntry,
    ) -> Result<WhitelistEntry> {
        post_whitelist_entry(self, identity.group_id(), payload).await
    }

    async fn delete(&self, identity: &ResourceIdentity) -> Result<()> {
        self.delete_whitelist_entry(identity.group_id(), identity.id())
            .await
    }
}

async fn post_whitelist_entry(
    client: &ResourceClient,
    group_id: &str,
    payload: &WhitelistEntry,
) -> Result<WhitelistEntry> {
    let entries = client
        .create_whitelist_entries(group_id, ::std::slice::from_ref(payload))
        .await?;
    debug!(
        "Group {} whitelist has {} entries after the post",
        group_id,
        entries.len()
    );
    entries
        .into_iter()
        .find(|entry| IpWhitelistResource::matches(payload, entry))
        .ok_or_else(|| {
            ProviderError::not_found(format!(
                "whitelist entry {} in group {}",
                payload
                    .cidr_block
                    .as_deref()
                    .or(payload.ip_address.as_deref())
                    .unwrap_or_default(),
                group_id
            ))
        })
}

impl RemoteApi<AlertConfigurationResource> for ResourceClient {
    async fn get(&self, identity: &ResourceIdentity) -> Result<Option<AlertConfiguration>> {
        self.get_alert_configuration(identity.group_id(), identity.id())
            .await
    }

    async fn create(
        &self,
        group_id: &str,
        payload: &AlertConfiguration,
    ) -> Result<AlertConfiguration> {
        self.create_alert_configuration(group_id, payload).await
    }

    async fn update(
        &self,
        identity: &ResourceIdentity,
        payload: &AlertConfiguration,
    ) -> Result<AlertConfiguration> {
        self.update_alert_configuration(identity.group_id(), identity.id(), payload)
            .await
    }

    /// An alert configuration that is already gone counts as deleted.
    async fn delete(&self, identity: &ResourceIdentity) -> Result<()> {
        match self
            .delete_alert_configuration(identity.group_id(), identity.id())
            .await
        {
            Err(err) if err.is_not_found() => {
                debug!("Alert configuration {} was already deleted", identity);
                Ok(())
            }
            other => other,
        }
    }
}
