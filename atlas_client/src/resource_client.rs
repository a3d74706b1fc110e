use ::atlas_common::{
    error::{ProviderError, RemoteApiError, Result},
    model::{
        AlertConfiguration, Cluster, Container, DatabaseUser, Page, Peer, PrivateIpMode, Project,
        WhitelistEntry,
    },
    serde::de::DeserializeOwned,
    serde_json,
    tracing::debug,
};
use ::reqwest::{RequestBuilder, Response, StatusCode, Url};

use crate::Credentials;

/// Client for managing Atlas resources.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    /// Base URL of the Atlas API, e.g. `https://cloud.mongodb.com/api/atlas/v1.0/`.
    base_url: Url,
    /// Credentials for authenticating with the Atlas API.
    credentials: Option<Credentials>,
    /// HTTP client for making requests to the Atlas API.
    client: reqwest::Client,
}

impl ResourceClient {
    /// Create a new `ResourceClient`.
    pub fn new(base_url: &str, credentials: Option<Credentials>) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            ProviderError::illegal_argument(format!("Invalid base url {:?}: {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::illegal_argument(format!(
                "{} cannot be used as a base url",
                base_url
            )));
        }
        Ok(Self {
            base_url,
            credentials,
            client: reqwest::Client::new(),
        })
    }

    pub async fn get_cluster(&self, group_id: &str, name: &str) -> Result<Option<Cluster>> {
        self.get_optional(&["groups", group_id, "clusters", name])
            .await
    }

    pub async fn create_cluster(&self, group_id: &str, cluster: &Cluster) -> Result<Cluster> {
        let url = self.build_url(&["groups", group_id, "clusters"])?;
        Self::receive(self.enable_auth_for_request(self.client.post(url).json(cluster))).await
    }

    pub async fn update_cluster(
        &self,
        group_id: &str,
        name: &str,
        cluster: &Cluster,
    ) -> Result<Cluster> {
        let url = self.build_url(&["groups", group_id, "clusters", name])?;
        Self::receive(self.enable_auth_for_request(self.client.patch(url).json(cluster))).await
    }

    pub async fn delete_cluster(&self, group_id: &str, name: &str) -> Result<()> {
        self.delete(&["groups", group_id, "clusters", name]).await
    }

    pub async fn get_container(&self, group_id: &str, id: &str) -> Result<Option<Container>> {
        self.get_optional(&["groups", group_id, "containers", id])
            .await
    }

    pub async fn create_container(
        &self,
        group_id: &str,
        container: &Container,
    ) -> Result<Container> {
        let url = self.build_url(&["groups", group_id, "containers"])?;
        Self::receive(self.enable_auth_for_request(self.client.post(url).json(container))).await
    }

    pub async fn update_container(
        &self,
        group_id: &str,
        id: &str,
        container: &Container,
    ) -> Result<Container> {
        let url = self.build_url(&["groups", group_id, "containers", id])?;
        Self::receive(self.enable_auth_for_request(self.client.patch(url).json(container))).await
    }

    pub async fn delete_container(&self, group_id: &str, id: &str) -> Result<()> {
        self.delete(&["groups", group_id, "containers", id]).await
    }

    /// Switch private IP mode for every container of the group.
    pub async fn set_private_ip_mode(&self, group_id: &str, enabled: bool) -> Result<PrivateIpMode> {
        let url = self.build_url(&["groups", group_id, "privateIpMode"])?;
        let body = PrivateIpMode { enabled };
        Self::receive(self.enable_auth_for_request(self.client.patch(url).json(&body))).await
    }

    pub async fn get_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        self.get_optional(&["groups", "byName", name]).await
    }

    pub async fn get_peer(&self, group_id: &str, id: &str) -> Result<Option<Peer>> {
        self.get_optional(&["groups", group_id, "peers", id]).await
    }

    pub async fn create_peer(&self, group_id: &str, peer: &Peer) -> Result<Peer> {
        let url = self.build_url(&["groups", group_id, "peers"])?;
        Self::receive(self.enable_auth_for_request(self.client.post(url).json(peer))).await
    }

    pub async fn update_peer(&self, group_id: &str, id: &str, peer: &Peer) -> Result<Peer> {
        let url = self.build_url(&["groups", group_id, "peers", id])?;
        Self::receive(self.enable_auth_for_request(self.client.patch(url).json(peer))).await
    }

    pub async fn delete_peer(&self, group_id: &str, id: &str) -> Result<()> {
        self.delete(&["groups", group_id, "peers", id]).await
    }

    pub async fn get_database_user(
        &self,
        group_id: &str,
        username: &str,
    ) -> Result<Option<DatabaseUser>> {
        self.get_optional(&["groups", group_id, "databaseUsers", "admin", username])
            .await
    }

    pub async fn create_database_user(
        &self,
        group_id: &str,
        user: &DatabaseUser,
    ) -> Result<DatabaseUser> {
        let url = self.build_url(&["groups", group_id, "databaseUsers"])?;
        Self::receive(self.enable_auth_for_request(self.client.post(url).json(user))).await
    }

    pub async fn update_database_user(
        &self,
        group_id: &str,
        username: &str,
        user: &DatabaseUser,
    ) -> Result<DatabaseUser> {
        let url = self.build_url(&["groups", group_id, "databaseUsers", "admin", username])?;
        Self::receive(self.enable_auth_for_request(self.client.patch(url).json(user))).await
    }

    pub async fn delete_database_user(&self, group_id: &str, username: &str) -> Result<()> {
        self.delete(&["groups", group_id, "databaseUsers", "admin", username])
            .await
    }

    /// Get one whitelist entry. `/` in the CIDR block is percent-encoded.
    pub async fn get_whitelist_entry(
        &self,
        group_id: &str,
        cidr_block: &str,
    ) -> Result<Option<WhitelistEntry>> {
        self.get_optional(&["groups", group_id, "whitelist", cidr_block])
            .await
    }

    /// Add entries to the whitelist. Atlas answers with the whole whitelist
    /// of the group, not only the entries that were posted.
    pub async fn create_whitelist_entries(
        &self,
        group_id: &str,
        entries: &[WhitelistEntry],
    ) -> Result<Vec<WhitelistEntry>> {
        let url = self.build_url(&["groups", group_id, "whitelist"])?;
        let page: Page<WhitelistEntry> =
            Self::receive(self.enable_auth_for_request(self.client.post(url).json(entries)))
                .await?;
        Ok(page.results)
    }

    pub async fn delete_whitelist_entry(&self, group_id: &str, cidr_block: &str) -> Result<()> {
        self.delete(&["groups", group_id, "whitelist", cidr_block])
            .await
    }

    pub async fn get_alert_configuration(
        &self,
        group_id: &str,
        id: &str,
    ) -> Result<Option<AlertConfiguration>> {
        self.get_optional(&["groups", group_id, "alertConfigs", id])
            .await
    }

    pub async fn create_alert_configuration(
        &self,
        group_id: &str,
        alert: &AlertConfiguration,
    ) -> Result<AlertConfiguration> {
        let url = self.build_url(&["groups", group_id, "alertConfigs"])?;
        Self::receive(self.enable_auth_for_request(self.client.post(url).json(alert))).await
    }

    pub async fn update_alert_configuration(
        &self,
        group_id: &str,
        id: &str,
        alert: &AlertConfiguration,
    ) -> Result<AlertConfiguration> {
        let url = self.build_url(&["groups", group_id, "alertConfigs", id])?;
        Self::receive(self.enable_auth_for_request(self.client.put(url).json(alert))).await
    }

    pub async fn delete_alert_configuration(&self, group_id: &str, id: &str) -> Result<()> {
        self.delete(&["groups", group_id, "alertConfigs", id])
            .await
    }

    /// GET a resource, returning `Ok(None)` if the server answers 404.
    async fn get_optional<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<Option<T>> {
        let url = self.build_url(segments)?;
        debug!("GET {}", url);
        let response = self
            .enable_auth_for_request(self.client.get(url))
            .send()
            .await
            .map_err(from_reqwest)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check_status(response).await?;
        response.json().await.map(Some).map_err(from_reqwest)
    }

    async fn delete(&self, segments: &[&str]) -> Result<()> {
        let url = self.build_url(segments)?;
        debug!("DELETE {}", url);
        let response = self
            .enable_auth_for_request(self.client.delete(url))
            .send()
            .await
            .map_err(from_reqwest)?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn receive<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await.map_err(from_reqwest)?;
        let response = Self::check_status(response).await?;
        response.json().await.map_err(from_reqwest)
    }

    /// Turn a non-2xx response into [`ProviderError::RemoteApi`], keeping the
    /// detail, reason and error code of the Atlas error body when present.
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let mut error = serde_json::from_str::<RemoteApiError>(&body).unwrap_or_else(|_| {
            RemoteApiError {
                detail: body,
                reason: status.canonical_reason().unwrap_or_default().to_owned(),
                ..Default::default()
            }
        });
        error.status = status.as_u16();
        Err(ProviderError::RemoteApi(error))
    }

    /// Build a full URL from path segments. Each segment is percent-encoded.
    fn build_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ProviderError::illegal_argument(format!(
                    "{} cannot be used as a base url",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Enable authentication for a request builder.
    fn enable_auth_for_request(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(Credentials::Basic { username, password }) => {
                builder.basic_auth(username, password.as_ref())
            }
            Some(Credentials::Bearer { token }) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

fn from_reqwest(err: reqwest::Error) -> ProviderError {
    if err.is_decode() {
        ProviderError::DeserializeError(err.to_string())
    } else {
        ProviderError::transport(err)
    }
}
