//! Read-only lookups of Atlas objects, for callers that need their
//! attributes without tracking them.

use ::core::future::Future;

use ::atlas_client::resource_client::ResourceClient;
use ::atlas_common::{
    error::{ProviderError, Result},
    model::Project,
    resource::ResourceIdentity,
    serde::{Deserialize, Serialize},
    tracing::debug,
};

use crate::{remote_api::RemoteApi, resources::Resource};

/// Finds projects by their unique name.
pub trait ProjectDirectory: Send + Sync {
    /// Return Ok(None) if no project has this name.
    fn project_by_name(&self, name: &str) -> impl Future<Output = Result<Option<Project>>> + Send;
}

impl ProjectDirectory for ResourceClient {
    async fn project_by_name(&self, name: &str) -> Result<Option<Project>> {
        self.get_project_by_name(name).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "atlas_common::serde")]
pub struct ProjectAttributes {
    pub id: String,
    pub name: String,
    pub org_id: Option<String>,
    pub created: Option<String>,
    pub cluster_count: u32,
}

impl From<Project> for ProjectAttributes {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            name: project.name,
            org_id: project.org_id,
            created: project.created,
            cluster_count: project.cluster_count,
        }
    }
}

/// Attributes of an existing resource. A missing one is an error here,
/// unlike a read of a tracked resource.
pub async fn resource<K, A>(api: &A, identity: &ResourceIdentity) -> Result<K::Attributes>
where
    K: Resource,
    A: RemoteApi<K>,
{
    debug!("Looking up {} {}", K::KIND, identity);
    let remote = api
        .get(identity)
        .await
        .map_err(|e| ProviderError::operation("lookup", format!("{} {}", K::KIND, identity), e))?
        .ok_or_else(|| ProviderError::not_found(format!("{} {}", K::KIND, identity)))?;
    Ok(K::attributes(identity, &remote))
}

pub async fn project<D: ProjectDirectory>(directory: &D, name: &str) -> Result<ProjectAttributes> {
    debug!("Looking up project {}", name);
    directory
        .project_by_name(name)
        .await
        .map_err(|e| ProviderError::operation("lookup", format!("project {}", name), e))?
        .map(ProjectAttributes::from)
        .ok_or_else(|| ProviderError::not_found(format!("project {}", name)))
}
