use ::std::time::Duration;

use ::atlas_common::{
    anyhow::anyhow,
    error::{ProviderError, Result},
    model::Peer,
    resource::{ObservedState, ResourceIdentity, StateSet},
    serde::{Deserialize, Serialize},
};

use super::{apply_field, Convergence, Resource, Timeouts};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "atlas_common::serde")]
#[serde(deny_unknown_fields)]
pub struct PeerConfig {
    pub group: String,
    pub container_id: String,
    pub route_table_cidr_block: String,
    pub vpc_id: String,
    pub aws_account_id: String,
    #[serde(default = "default_provider_name")]
    pub provider_name: String,
}

fn default_provider_name() -> String {
    "AWS".to_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "atlas_common::serde")]
pub struct PeerAttributes {
    pub identifier: String,
    pub group: String,
    pub container_id: String,
    pub route_table_cidr_block: String,
    pub vpc_id: String,
    pub aws_account_id: String,
    pub provider_name: String,
    pub connection_id: String,
    pub status_name: String,
    pub error_state_name: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PeerResource;

impl Resource for PeerResource {
    const KIND: &'static str = "peering connection";
    const DEFAULT_TIMEOUTS: Timeouts = Timeouts::uniform(Duration::from_secs(40 * 60));

    type Config = PeerConfig;
    type Remote = Peer;
    type Attributes = PeerAttributes;

    fn group_id(config: &PeerConfig) -> &str {
        &config.group
    }

    fn validate(config: &PeerConfig) -> Result<()> {
        if config.provider_name != "AWS" {
            return Err(ProviderError::illegal_argument(anyhow!(
                "Only AWS peering connections are supported, got provider {:?}",
                config.provider_name
            )));
        }
        Ok(())
    }

    fn create_payload(config: &PeerConfig) -> Peer {
        Peer {
            provider_name: Some(config.provider_name.clone()),
            route_table_cidr_block: Some(config.route_table_cidr_block.clone()),
            vpc_id: Some(config.vpc_id.clone()),
            aws_account_id: Some(config.aws_account_id.clone()),
            container_id: Some(config.container_id.clone()),
            ..Default::default()
        }
    }

    fn identity_of(config: &PeerConfig, created: &Peer) -> Result<ResourceIdentity> {
        let id = created.id.clone().ok_or_else(|| {
            ProviderError::Other(format!(
                "Atlas returned no id for the peering connection to {}",
                config.vpc_id
            ))
        })?;
        ResourceIdentity::new(config.group.clone(), id)
    }

    /// `PENDING_ACCEPTANCE` counts as converged: the peer side has to
    /// accept the request, which may never happen within the timeout.
    fn convergence() -> Option<Convergence> {
        Some(Convergence {
            pending: StateSet::from(["INITIATING", "FINALIZING"]),
            target: StateSet::from(["AVAILABLE", "PENDING_ACCEPTANCE"]),
            initial_delay: Duration::from_secs(30),
            min_interval: Duration::from_secs(10),
        })
    }

    fn deletion() -> Option<Convergence> {
        Some(Convergence::deletion(
            StateSet::from([
                "AVAILABLE",
                "PENDING_ACCEPTANCE",
                "INITIATING",
                "FINALIZING",
                "TERMINATING",
            ]),
            Duration::from_secs(30),
            Duration::from_secs(10),
        ))
    }

    fn state_of(remote: &Peer) -> ObservedState {
        ObservedState::new(remote.status_name.clone().unwrap_or_default())
    }

    fn apply_changes(previous: &PeerConfig, desired: &PeerConfig, remote: &mut Peer) -> bool {
        let mut changed = false;
        changed |= apply_field(
            &previous.route_table_cidr_block,
            &desired.route_table_cidr_block,
            &mut remote.route_table_cidr_block,
            |v| Some(v.clone()),
        );
        changed |= apply_field(
            &previous.aws_account_id,
            &desired.aws_account_id,
            &mut remote.aws_account_id,
            |v| Some(v.clone()),
        );
        changed |= apply_field(
            &previous.vpc_id,
            &desired.vpc_id,
            &mut remote.vpc_id,
            |v| Some(v.clone()),
        );
        changed
    }

    /// Atlas refuses updates that carry the status or the peering ids.
    fn clear_read_only(remote: &mut Peer) {
        remote.id = None;
        remote.status_name = None;
        remote.error_state_name = None;
        remote.connection_id = None;
    }

    fn attributes(identity: &ResourceIdentity, remote: &Peer) -> PeerAttributes {
        PeerAttributes {
            identifier: remote
                .id
                .clone()
                .unwrap_or_else(|| identity.id().to_owned()),
            group: identity.group_id().to_owned(),
            container_id: remote.container_id.clone().unwrap_or_default(),
            route_table_cidr_block: remote.route_table_cidr_block.clone().unwrap_or_default(),
            vpc_id: remote.vpc_id.clone().unwrap_or_default(),
            aws_account_id: remote.aws_account_id.clone().unwrap_or_default(),
            provider_name: remote
                .provider_name
                .clone()
                .unwrap_or_else(default_provider_name),
            connection_id: remote.connection_id.clone().unwrap_or_default(),
            status_name: remote.status_name.clone().unwrap_or_default(),
            error_state_name: remote.error_state_name.clone().unwrap_or_default(),
        }
    }

    fn config_of(identity: &ResourceIdentity, remote: &Peer) -> PeerConfig {
        let attributes = Self::attributes(identity, remote);
        PeerConfig {
            group: attributes.group,
            container_id: attributes.container_id,
            route_table_cidr_block: attributes.route_table_cidr_block,
            vpc_id: attributes.vpc_id,
            aws_account_id: attributes.aws_account_id,
            provider_name: attributes.provider_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::atlas_common::serde_json::{from_value, json};

    fn config() -> PeerConfig {
        from_value(json!({
            "group": "g1",
            "container_id": "ct1",
            "route_table_cidr_block": "10.1.0.0/16",
            "vpc_id": "vpc-123",
            "aws_account_id": "111122223333"
        }))
        .unwrap()
    }

    #[test]
    fn provider_name_defaults_to_aws() {
        assert_eq!(config().provider_name, "AWS");
        assert!(PeerResource::validate(&config()).is_ok());
    }

    #[test]
    fn gcp_peering_is_rejected() {
        let mut config = config();
        config.provider_name = "GCP".to_owned();
        assert!(PeerResource::validate(&config).is_err_and(|e| e
            .to_string()
            .starts_with("Illegal Argument error: Only AWS peering connections")));
    }

    #[test]
    fn identity_requires_server_id() {
        assert!(PeerResource::identity_of(&config(), &Peer::default()).is_err());
        let created = Peer {
            id: Some("p1".to_owned()),
            ..Default::default()
        };
        assert_eq!(
            PeerResource::identity_of(&config(), &created)
                .unwrap()
                .to_string(),
            "g1-p1"
        );
    }

    #[test]
    fn only_tracked_fields_trigger_update() {
        let mut desired = config();
        desired.container_id = "ct2".to_owned();
        let mut remote = Peer::default();
        assert!(!PeerResource::apply_changes(&config(), &desired, &mut remote));

        desired.route_table_cidr_block = "10.2.0.0/16".to_owned();
        assert!(PeerResource::apply_changes(&config(), &desired, &mut remote));
        assert_eq!(remote.route_table_cidr_block.as_deref(), Some("10.2.0.0/16"));
        assert_eq!(remote.vpc_id, None);
    }

    #[test]
    fn state_comes_from_status_name() {
        let remote = Peer {
            status_name: Some("PENDING_ACCEPTANCE".to_owned()),
            ..Default::default()
        };
        let state = PeerResource::state_of(&remote);
        assert!(PeerResource::convergence().unwrap().target.contains(&state));
    }
}
