use ::serde::{Deserialize, Serialize};

/// An Atlas project. The API calls it a group, and every other resource
/// lives under `groups/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default)]
    pub cluster_count: u32,
}

/// Body and answer of `groups/{id}/privateIpMode`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateIpMode {
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::serde_json::{from_value, json, to_value};

    #[test]
    fn project_from_atlas() -> anyhow::Result<()> {
        let project: Project = from_value(json!({
            "id": "5a0a1e7e0f2912c554080adc",
            "name": "shop",
            "orgId": "5a0a1e7e0f2912c554080ad0",
            "created": "2018-01-05T14:32:06Z",
            "clusterCount": 2,
            "links": []
        }))?;
        assert_eq!(project.org_id.as_deref(), Some("5a0a1e7e0f2912c554080ad0"));
        assert_eq!(project.cluster_count, 2);
        Ok(())
    }

    #[test]
    fn disabled_mode_is_sent_explicitly() -> anyhow::Result<()> {
        assert_eq!(
            to_value(PrivateIpMode { enabled: false })?,
            json!({"enabled": false})
        );
        Ok(())
    }
}
