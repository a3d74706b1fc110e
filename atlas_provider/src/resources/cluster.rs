use ::std::{collections::BTreeMap, time::Duration};

use ::atlas_common::{
    error::Result,
    model::{AutoScaling, Cluster, ProviderSettings, ReplicationSpec},
    resource::{ObservedState, ResourceIdentity, StateSet},
    serde::{Deserialize, Serialize},
};

use super::{apply_field, non_empty, Convergence, Resource, Timeouts};

/// Node layout of one region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(crate = "atlas_common::serde")]
#[serde(deny_unknown_fields)]
pub struct ReplicationSpecConfig {
    pub region: String,
    pub priority: u32,
    pub electable_nodes: u32,
    #[serde(default)]
    pub read_only_nodes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "atlas_common::serde")]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    pub group: String,
    pub name: String,
    #[serde(default)]
    pub mongodb_major_version: Option<String>,
    #[serde(default)]
    pub backup: bool,
    /// Instance size, e.g. `M10`.
    pub size: String,
    pub provider_name: String,
    /// Only for shared tier (`TENANT`) clusters.
    #[serde(default)]
    pub backing_provider: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub disk_size_gb: Option<f64>,
    #[serde(default = "default_replication_factor")]
    pub replication_factor: u32,
    #[serde(default = "default_num_shards")]
    pub num_shards: u32,
    #[serde(default)]
    pub paused: bool,
    #[serde(default = "default_disk_gb_enabled")]
    pub disk_gb_enabled: bool,
    #[serde(default)]
    pub replication_specs: Vec<ReplicationSpecConfig>,
}

fn default_replication_factor() -> u32 {
    3
}

fn default_num_shards() -> u32 {
    1
}

fn default_disk_gb_enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "atlas_common::serde")]
pub struct ClusterAttributes {
    pub identifier: String,
    pub group: String,
    pub name: String,
    pub mongodb_major_version: String,
    pub backup: bool,
    pub size: String,
    pub provider_name: String,
    pub backing_provider: String,
    pub region: String,
    pub disk_size_gb: Option<f64>,
    pub disk_gb_enabled: bool,
    pub replication_factor: u32,
    pub num_shards: u32,
    pub paused: bool,
    pub replication_specs: Vec<ReplicationSpecConfig>,
    pub state: String,
    pub mongodb_version: String,
    pub mongo_uri: String,
    pub mongo_uri_updated: String,
    pub mongo_uri_with_options: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterResource;

impl Resource for ClusterResource {
    const KIND: &'static str = "cluster";
    const DEFAULT_TIMEOUTS: Timeouts = Timeouts::uniform(Duration::from_secs(40 * 60));

    type Config = ClusterConfig;
    type Remote = Cluster;
    type Attributes = ClusterAttributes;

    fn group_id(config: &ClusterConfig) -> &str {
        &config.group
    }

    fn create_payload(config: &ClusterConfig) -> Cluster {
        Cluster {
            name: Some(config.name.clone()),
            mongodb_major_version: config.mongodb_major_version.clone(),
            provider_settings: Some(ProviderSettings {
                provider_name: non_empty(&config.provider_name),
                backing_provider_name: config.backing_provider.clone(),
                region_name: config.region.clone(),
                instance_size_name: non_empty(&config.size),
                ..Default::default()
            }),
            backup_enabled: config.backup,
            replication_factor: Some(config.replication_factor),
            replication_spec: replication_spec_payload(&config.replication_specs),
            disk_size_gb: config.disk_size_gb,
            num_shards: Some(config.num_shards),
            paused: config.paused,
            auto_scaling: Some(AutoScaling {
                disk_gb_enabled: config.disk_gb_enabled,
            }),
            ..Default::default()
        }
    }

    /// Clusters are addressed by name, not by their generated id.
    fn identity_of(config: &ClusterConfig, _created: &Cluster) -> Result<ResourceIdentity> {
        ResourceIdentity::new(config.group.clone(), config.name.clone())
    }

    fn convergence() -> Option<Convergence> {
        Some(Convergence {
            pending: StateSet::from(["CREATING", "UPDATING", "REPAIRING"]),
            target: StateSet::from(["IDLE"]),
            initial_delay: Duration::from_secs(30),
            min_interval: Duration::from_secs(10),
        })
    }

    fn deletion() -> Option<Convergence> {
        Some(Convergence::deletion(
            StateSet::from(["IDLE", "CREATING", "UPDATING", "REPAIRING", "DELETING"]),
            Duration::from_secs(30),
            Duration::from_secs(10),
        ))
    }

    fn state_of(remote: &Cluster) -> ObservedState {
        ObservedState::new(remote.state_name.clone().unwrap_or_default())
    }

    fn apply_changes(previous: &ClusterConfig, desired: &ClusterConfig, remote: &mut Cluster) -> bool {
        let mut changed = false;
        changed |= apply_field(&previous.backup, &desired.backup, &mut remote.backup_enabled, |v| *v);
        changed |= apply_field(
            &previous.size,
            &desired.size,
            &mut remote
                .provider_settings
                .get_or_insert_with(ProviderSettings::default)
                .instance_size_name,
            |v| non_empty(v),
        );
        changed |= apply_field(
            &previous.disk_size_gb,
            &desired.disk_size_gb,
            &mut remote.disk_size_gb,
            |v| *v,
        );
        changed |= apply_field(
            &previous.replication_factor,
            &desired.replication_factor,
            &mut remote.replication_factor,
            |v| Some(*v),
        );
        changed |= apply_field(
            &replication_spec_payload(&previous.replication_specs),
            &replication_spec_payload(&desired.replication_specs),
            &mut remote.replication_spec,
            Clone::clone,
        );
        changed |= apply_field(
            &previous.num_shards,
            &desired.num_shards,
            &mut remote.num_shards,
            |v| Some(*v),
        );
        changed |= apply_field(&previous.paused, &desired.paused, &mut remote.paused, |v| *v);
        changed |= apply_field(
            &previous.disk_gb_enabled,
            &desired.disk_gb_enabled,
            &mut remote.auto_scaling,
            |v| {
                Some(AutoScaling {
                    disk_gb_enabled: *v,
                })
            },
        );
        changed
    }

    fn clear_read_only(remote: &mut Cluster) {
        remote.state_name = None;
        remote.mongodb_version = None;
        remote.mongo_uri = None;
        remote.mongo_uri_with_options = None;
        remote.mongo_uri_updated = None;
    }

    fn attributes(identity: &ResourceIdentity, remote: &Cluster) -> ClusterAttributes {
        let settings = remote.provider_settings.clone().unwrap_or_default();
        ClusterAttributes {
            identifier: remote.id.clone().unwrap_or_default(),
            group: remote
                .group_id
                .clone()
                .unwrap_or_else(|| identity.group_id().to_owned()),
            name: remote
                .name
                .clone()
                .unwrap_or_else(|| identity.id().to_owned()),
            mongodb_major_version: remote.mongodb_major_version.clone().unwrap_or_default(),
            backup: remote.backup_enabled,
            size: settings.instance_size_name.unwrap_or_default(),
            provider_name: settings.provider_name.unwrap_or_default(),
            backing_provider: settings.backing_provider_name.unwrap_or_default(),
            region: settings.region_name.unwrap_or_default(),
            disk_size_gb: remote.disk_size_gb,
            disk_gb_enabled: remote
                .auto_scaling
                .as_ref()
                .is_some_and(|scaling| scaling.disk_gb_enabled),
            replication_factor: remote.replication_factor.unwrap_or_default(),
            num_shards: remote.num_shards.unwrap_or_default(),
            paused: remote.paused,
            replication_specs: replication_specs_of(remote),
            state: remote.state_name.clone().unwrap_or_default(),
            mongodb_version: remote.mongodb_version.clone().unwrap_or_default(),
            mongo_uri: remote.mongo_uri.clone().unwrap_or_default(),
            mongo_uri_updated: remote.mongo_uri_updated.clone().unwrap_or_default(),
            mongo_uri_with_options: remote.mongo_uri_with_options.clone().unwrap_or_default(),
        }
    }

    fn config_of(identity: &ResourceIdentity, remote: &Cluster) -> ClusterConfig {
        let attributes = Self::attributes(identity, remote);
        ClusterConfig {
            group: attributes.group,
            name: attributes.name,
            mongodb_major_version: remote.mongodb_major_version.clone(),
            backup: attributes.backup,
            size: attributes.size,
            provider_name: attributes.provider_name,
            backing_provider: non_empty(&attributes.backing_provider),
            region: non_empty(&attributes.region),
            disk_size_gb: attributes.disk_size_gb,
            replication_factor: attributes.replication_factor,
            num_shards: attributes.num_shards,
            paused: attributes.paused,
            disk_gb_enabled: attributes.disk_gb_enabled,
            replication_specs: attributes.replication_specs,
        }
    }
}

/// Replication specs are keyed by region on the wire, so the declared
/// order does not matter.
fn replication_spec_payload(
    specs: &[ReplicationSpecConfig],
) -> Option<BTreeMap<String, ReplicationSpec>> {
    if specs.is_empty() {
        return None;
    }
    Some(
        specs
            .iter()
            .map(|spec| {
                (
                    spec.region.clone(),
                    ReplicationSpec {
                        priority: spec.priority,
                        electable_nodes: spec.electable_nodes,
                        read_only_nodes: spec.read_only_nodes,
                        analytics_nodes: 0,
                    },
                )
            })
            .collect(),
    )
}

fn replication_specs_of(remote: &Cluster) -> Vec<ReplicationSpecConfig> {
    remote
        .replication_spec
        .iter()
        .flatten()
        .map(|(region, spec)| ReplicationSpecConfig {
            region: region.clone(),
            priority: spec.priority,
            electable_nodes: spec.electable_nodes,
            read_only_nodes: spec.read_only_nodes,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::atlas_common::{
        anyhow,
        serde_json::{self, from_value, json},
    };

    fn config() -> ClusterConfig {
        from_value(json!({
            "group": "g1",
            "name": "main",
            "size": "M10",
            "provider_name": "AWS",
            "region": "US_EAST_1",
            "replication_specs": [
                {"region": "US_WEST_2", "priority": 6, "electable_nodes": 2},
                {"region": "US_EAST_1", "priority": 7, "electable_nodes": 3}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn config_defaults() {
        let config = config();
        assert_eq!(config.replication_factor, 3);
        assert_eq!(config.num_shards, 1);
        assert!(!config.paused);
        assert!(config.disk_gb_enabled);
        assert!(!config.backup);
    }

    #[test]
    fn missing_field_size() {
        let result = from_value::<ClusterConfig>(json!({
            "group": "g1",
            "name": "main",
            "provider_name": "AWS"
        }));
        assert_eq!(result.unwrap_err().to_string(), "missing field `size`");
    }

    #[test]
    fn create_payload_maps_nested_blocks() -> anyhow::Result<()> {
        let payload = ClusterResource::create_payload(&config());
        assert_eq!(
            serde_json::to_value(&payload)?,
            json!({
                "name": "main",
                "backupEnabled": false,
                "providerBackupEnabled": false,
                "replicationFactor": 3,
                "replicationSpec": {
                    "US_EAST_1": {"priority": 7, "electableNodes": 3, "readOnlyNodes": 0, "analyticsNodes": 0},
                    "US_WEST_2": {"priority": 6, "electableNodes": 2, "readOnlyNodes": 0, "analyticsNodes": 0}
                },
                "numShards": 1,
                "paused": false,
                "autoScaling": {"diskGBEnabled": true},
                "providerSettings": {
                    "providerName": "AWS",
                    "regionName": "US_EAST_1",
                    "instanceSizeName": "M10"
                }
            })
        );
        Ok(())
    }

    #[test]
    fn identity_uses_cluster_name() -> anyhow::Result<()> {
        let created = Cluster {
            id: Some("5b0a".to_owned()),
            ..Default::default()
        };
        let identity = ClusterResource::identity_of(&config(), &created)?;
        assert_eq!(identity.to_string(), "g1-main");
        Ok(())
    }

    #[test]
    fn unchanged_config_has_no_changes() {
        let mut remote = ClusterResource::create_payload(&config());
        let before = remote.clone();
        assert!(!ClusterResource::apply_changes(&config(), &config(), &mut remote));
        assert_eq!(remote, before);
    }

    #[test]
    fn reordered_replication_specs_are_not_a_change() {
        let mut desired = config();
        desired.replication_specs.reverse();
        let mut remote = Cluster::default();
        assert!(!ClusterResource::apply_changes(&config(), &desired, &mut remote));
    }

    #[test]
    fn changed_fields_are_copied() {
        let mut desired = config();
        desired.size = "M20".to_owned();
        desired.paused = true;
        let mut remote = Cluster {
            state_name: Some("IDLE".to_owned()),
            ..Default::default()
        };
        assert!(ClusterResource::apply_changes(&config(), &desired, &mut remote));
        assert_eq!(
            remote
                .provider_settings
                .as_ref()
                .and_then(|s| s.instance_size_name.as_deref()),
            Some("M20")
        );
        assert!(remote.paused);
        assert_eq!(remote.num_shards, None);
    }

    #[test]
    fn clear_read_only_fields() {
        let mut remote = Cluster {
            name: Some("main".to_owned()),
            state_name: Some("IDLE".to_owned()),
            mongodb_version: Some("3.6.5".to_owned()),
            mongo_uri: Some("mongodb://a".to_owned()),
            mongo_uri_updated: Some("2018-05-01".to_owned()),
            mongo_uri_with_options: Some("mongodb://a?ssl=true".to_owned()),
            ..Default::default()
        };
        ClusterResource::clear_read_only(&mut remote);
        assert_eq!(
            remote,
            Cluster {
                name: Some("main".to_owned()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn state_comes_from_state_name() {
        let remote = Cluster {
            state_name: Some("REPAIRING".to_owned()),
            ..Default::default()
        };
        assert_eq!(ClusterResource::state_of(&remote).as_str(), "REPAIRING");
    }

    #[test]
    fn imported_config_round_trips_without_changes() -> anyhow::Result<()> {
        let identity = ResourceIdentity::new("g1", "main")?;
        let mut remote = ClusterResource::create_payload(&config());
        remote.group_id = Some("g1".to_owned());
        let imported = ClusterResource::config_of(&identity, &remote);
        assert!(!ClusterResource::apply_changes(&imported, &config(), &mut remote.clone()));
        Ok(())
    }
}
