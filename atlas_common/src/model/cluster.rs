use ::std::collections::BTreeMap;

use ::serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoScaling {
    #[serde(rename = "diskGBEnabled")]
    pub disk_gb_enabled: bool,
}

/// Node layout of one region, keyed by region name in [`Cluster::replication_spec`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationSpec {
    pub priority: u32,
    pub electable_nodes: u32,
    #[serde(default)]
    pub read_only_nodes: u32,
    #[serde(default)]
    pub analytics_nodes: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backing_provider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_size_name: Option<String>,
    #[serde(rename = "diskIOPS", default, skip_serializing_if = "Option::is_none")]
    pub disk_iops: Option<u32>,
    #[serde(rename = "encryptEBSVolume", default, skip_serializing_if = "Option::is_none")]
    pub encrypt_ebs_volume: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "mongoDBVersion", default, skip_serializing_if = "Option::is_none")]
    pub mongodb_version: Option<String>,
    #[serde(rename = "mongoDBMajorVersion", default, skip_serializing_if = "Option::is_none")]
    pub mongodb_major_version: Option<String>,
    #[serde(rename = "mongoURI", default, skip_serializing_if = "Option::is_none")]
    pub mongo_uri: Option<String>,
    #[serde(rename = "mongoURIUpdated", default, skip_serializing_if = "Option::is_none")]
    pub mongo_uri_updated: Option<String>,
    #[serde(rename = "mongoURIWithOptions", default, skip_serializing_if = "Option::is_none")]
    pub mongo_uri_with_options: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srv_address: Option<String>,
    #[serde(rename = "diskSizeGB", default, skip_serializing_if = "Option::is_none")]
    pub disk_size_gb: Option<f64>,
    #[serde(default)]
    pub backup_enabled: bool,
    #[serde(default)]
    pub provider_backup_enabled: bool,
    /// Lifecycle label: CREATING, UPDATING, REPAIRING, IDLE or DELETING.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_factor: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_spec: Option<BTreeMap<String, ReplicationSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_shards: Option<u32>,
    #[serde(default)]
    pub paused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_scaling: Option<AutoScaling>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_settings: Option<ProviderSettings>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::serde_json::json;

    #[test]
    fn deserialize_cluster_response() -> anyhow::Result<()> {
        let cluster: Cluster = serde_json::from_value(json!({
            "id": "5b0a1e7e0f2912c554080ae6",
            "groupId": "5a0a1e7e0f2912c554080adc",
            "name": "main",
            "mongoDBVersion": "3.6.5",
            "mongoURI": "mongodb://main-shard-00-00.mongodb.net:27017",
            "diskSizeGB": 10.5,
            "backupEnabled": true,
            "stateName": "IDLE",
            "replicationSpec": {
                "US_EAST_1": {"priority": 7, "electableNodes": 3, "readOnlyNodes": 0}
            },
            "providerSettings": {"providerName": "AWS", "instanceSizeName": "M10", "diskIOPS": 100}
        }))?;
        assert_eq!(cluster.state_name.as_deref(), Some("IDLE"));
        assert_eq!(cluster.mongodb_version.as_deref(), Some("3.6.5"));
        assert_eq!(cluster.disk_size_gb, Some(10.5));
        assert!(cluster.backup_enabled);
        assert!(!cluster.paused);
        assert_eq!(
            cluster.replication_spec.unwrap()["US_EAST_1"].electable_nodes,
            3
        );
        assert_eq!(cluster.provider_settings.unwrap().disk_iops, Some(100));
        Ok(())
    }

    #[test]
    fn unset_fields_are_not_serialized() -> anyhow::Result<()> {
        let cluster = Cluster {
            name: Some("main".to_owned()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&cluster)?,
            json!({
                "name": "main",
                "backupEnabled": false,
                "providerBackupEnabled": false,
                "paused": false
            })
        );
        Ok(())
    }
}
