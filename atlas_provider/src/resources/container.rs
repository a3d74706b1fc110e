use ::std::time::Duration;

use ::atlas_common::{
    error::{ProviderError, Result},
    model::Container,
    resource::{ObservedState, ResourceIdentity, StateSet},
    serde::{Deserialize, Serialize},
};

use super::{apply_field, Convergence, Resource, Timeouts};

const GCP: &str = "GCP";
const AWS: &str = "AWS";

/// Containers carry no state label; this is derived from `provisioned`.
const PROVISIONED: ObservedState = ObservedState::from_static("PROVISIONED");
const AVAILABLE: ObservedState = ObservedState::from_static("AVAILABLE");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "atlas_common::serde")]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
    pub group: String,
    pub atlas_cidr_block: String,
    pub provider_name: String,
    /// AWS region of the container.
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub gcp_project_id: Option<String>,
    #[serde(default)]
    pub network_name: Option<String>,
    /// Group wide: switching it affects every container of the group.
    #[serde(default)]
    pub private_ip_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "atlas_common::serde")]
pub struct ContainerAttributes {
    pub identifier: String,
    pub group: String,
    pub atlas_cidr_block: String,
    pub provider_name: String,
    pub region: Option<String>,
    pub vpc_id: Option<String>,
    pub gcp_project_id: Option<String>,
    pub network_name: Option<String>,
    pub provisioned: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerResource;

impl Resource for ContainerResource {
    const KIND: &'static str = "network container";
    const DEFAULT_TIMEOUTS: Timeouts = Timeouts::uniform(Duration::from_secs(40 * 60));

    type Config = ContainerConfig;
    type Remote = Container;
    type Attributes = ContainerAttributes;

    fn group_id(config: &ContainerConfig) -> &str {
        &config.group
    }

    fn create_payload(config: &ContainerConfig) -> Container {
        let mut payload = Container {
            atlas_cidr_block: Some(config.atlas_cidr_block.clone()),
            provider_name: Some(config.provider_name.clone()),
            ..Default::default()
        };
        match config.provider_name.as_str() {
            GCP => {
                payload.gcp_project_id = config.gcp_project_id.clone();
                payload.network_name = config.network_name.clone();
            }
            AWS => payload.region_name = config.region.clone(),
            _ => {}
        }
        payload
    }

    fn identity_of(config: &ContainerConfig, created: &Container) -> Result<ResourceIdentity> {
        let id = created.id.clone().ok_or_else(|| {
            ProviderError::Other(format!(
                "Atlas returned no id for the container {}",
                config.atlas_cidr_block
            ))
        })?;
        ResourceIdentity::new(config.group.clone(), id)
    }

    /// A container is usable as soon as it exists, but Atlas keeps it
    /// around for a while after a delete request.
    fn deletion() -> Option<Convergence> {
        Some(Convergence::deletion(
            [AVAILABLE, PROVISIONED].into_iter().collect::<StateSet>(),
            Duration::ZERO,
            Duration::from_secs(10),
        ))
    }

    fn state_of(remote: &Container) -> ObservedState {
        if remote.provisioned.unwrap_or_default() {
            PROVISIONED
        } else {
            AVAILABLE
        }
    }

    fn apply_changes(
        previous: &ContainerConfig,
        desired: &ContainerConfig,
        remote: &mut Container,
    ) -> bool {
        let mut changed = false;
        changed |= apply_field(
            &previous.atlas_cidr_block,
            &desired.atlas_cidr_block,
            &mut remote.atlas_cidr_block,
            |v| Some(v.clone()),
        );
        changed |= apply_field(
            &previous.provider_name,
            &desired.provider_name,
            &mut remote.provider_name,
            |v| Some(v.clone()),
        );
        changed |= apply_field(&previous.region, &desired.region, &mut remote.region_name, Clone::clone);
        changed |= apply_field(
            &previous.gcp_project_id,
            &desired.gcp_project_id,
            &mut remote.gcp_project_id,
            Clone::clone,
        );
        changed |= apply_field(
            &previous.network_name,
            &desired.network_name,
            &mut remote.network_name,
            Clone::clone,
        );
        changed
    }

    /// Only enabled on create, since a new group starts with the mode off.
    fn private_ip_mode(previous: Option<&ContainerConfig>, desired: &ContainerConfig) -> Option<bool> {
        match previous {
            None => desired.private_ip_mode.then_some(true),
            Some(previous) if previous.private_ip_mode != desired.private_ip_mode => {
                Some(desired.private_ip_mode)
            }
            Some(_) => None,
        }
    }

    fn clear_read_only(remote: &mut Container) {
        remote.id = None;
        remote.provisioned = None;
        remote.vpc_id = None;
    }

    fn attributes(identity: &ResourceIdentity, remote: &Container) -> ContainerAttributes {
        let provider_name = remote.provider_name.clone().unwrap_or_default();
        let (region, vpc_id, gcp_project_id, network_name) = match provider_name.as_str() {
            GCP => (
                None,
                None,
                remote.gcp_project_id.clone(),
                remote.network_name.clone(),
            ),
            _ => (remote.region_name.clone(), remote.vpc_id.clone(), None, None),
        };
        ContainerAttributes {
            identifier: remote
                .id
                .clone()
                .unwrap_or_else(|| identity.id().to_owned()),
            group: identity.group_id().to_owned(),
            atlas_cidr_block: remote.atlas_cidr_block.clone().unwrap_or_default(),
            provider_name,
            region,
            vpc_id,
            gcp_project_id,
            network_name,
            provisioned: remote.provisioned.unwrap_or_default(),
        }
    }

    fn config_of(identity: &ResourceIdentity, remote: &Container) -> ContainerConfig {
        let attributes = Self::attributes(identity, remote);
        ContainerConfig {
            group: attributes.group,
            atlas_cidr_block: attributes.atlas_cidr_block,
            provider_name: attributes.provider_name,
            region: attributes.region,
            gcp_project_id: attributes.gcp_project_id,
            network_name: attributes.network_name,
            private_ip_mode: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aws() -> ContainerConfig {
        ContainerConfig {
            group: "g1".to_owned(),
            atlas_cidr_block: "192.168.240.0/21".to_owned(),
            provider_name: AWS.to_owned(),
            region: Some("US_EAST_1".to_owned()),
            gcp_project_id: Some("ignored".to_owned()),
            network_name: None,
            private_ip_mode: false,
        }
    }

    #[test]
    fn gcp_fields_only_sent_for_gcp() {
        let payload = ContainerResource::create_payload(&aws());
        assert_eq!(payload.gcp_project_id, None);
        assert_eq!(payload.region_name.as_deref(), Some("US_EAST_1"));

        let gcp = ContainerConfig {
            provider_name: GCP.to_owned(),
            region: None,
            gcp_project_id: Some("proj".to_owned()),
            network_name: Some("net".to_owned()),
            ..aws()
        };
        let payload = ContainerResource::create_payload(&gcp);
        assert_eq!(payload.gcp_project_id.as_deref(), Some("proj"));
        assert_eq!(payload.network_name.as_deref(), Some("net"));
        assert_eq!(payload.region_name, None);
    }

    #[test]
    fn derived_state() {
        let mut remote = Container::default();
        assert_eq!(ContainerResource::state_of(&remote), AVAILABLE);
        remote.provisioned = Some(true);
        assert_eq!(ContainerResource::state_of(&remote), PROVISIONED);
        let deletion = ContainerResource::deletion().unwrap();
        assert!(deletion.pending.contains(&PROVISIONED));
        assert!(deletion.target.contains(&ObservedState::DELETED));
    }

    #[test]
    fn no_convergence_wait_after_create() {
        assert_eq!(ContainerResource::convergence(), None);
    }

    #[test]
    fn aws_attributes_hide_gcp_fields() -> atlas_common::anyhow::Result<()> {
        let identity = ResourceIdentity::new("g1", "ct1")?;
        let remote = Container {
            id: Some("ct1".to_owned()),
            provider_name: Some(AWS.to_owned()),
            atlas_cidr_block: Some("192.168.240.0/21".to_owned()),
            region_name: Some("US_EAST_1".to_owned()),
            vpc_id: Some("vpc-1".to_owned()),
            gcp_project_id: Some("stale".to_owned()),
            provisioned: Some(true),
            ..Default::default()
        };
        let attributes = ContainerResource::attributes(&identity, &remote);
        assert_eq!(attributes.vpc_id.as_deref(), Some("vpc-1"));
        assert_eq!(attributes.gcp_project_id, None);
        assert!(attributes.provisioned);
        Ok(())
    }

    #[test]
    fn private_ip_mode_switches() {
        let enabled = ContainerConfig {
            private_ip_mode: true,
            ..aws()
        };
        assert_eq!(ContainerResource::private_ip_mode(None, &aws()), None);
        assert_eq!(ContainerResource::private_ip_mode(None, &enabled), Some(true));
        assert_eq!(ContainerResource::private_ip_mode(Some(&aws()), &enabled), Some(true));
        assert_eq!(ContainerResource::private_ip_mode(Some(&enabled), &aws()), Some(false));
        assert_eq!(ContainerResource::private_ip_mode(Some(&enabled), &enabled), None);

        // not a container field, so no container patch is needed for it
        let mut remote = ContainerResource::create_payload(&aws());
        assert!(!ContainerResource::apply_changes(&aws(), &enabled, &mut remote));
    }

    #[test]
    fn cidr_change_is_tracked() {
        let mut desired = aws();
        desired.atlas_cidr_block = "192.168.248.0/21".to_owned();
        let mut remote = ContainerResource::create_payload(&aws());
        assert!(ContainerResource::apply_changes(&aws(), &desired, &mut remote));
        assert_eq!(remote.atlas_cidr_block.as_deref(), Some("192.168.248.0/21"));
    }
}
