use ::serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flowdock_api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub victor_ops_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub victor_ops_routing_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ops_genie_api_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricThreshold {
    pub metric_name: String,
    pub operator: String,
    pub threshold: f64,
    pub units: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl MetricThreshold {
    /// Atlas rejects a threshold object without a metric.
    pub fn is_empty(&self) -> bool {
        self.metric_name.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matcher {
    pub field_name: String,
    pub operator: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub event_type_name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<Notification>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "non_empty_threshold"
    )]
    pub metric_threshold: Option<MetricThreshold>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matchers: Vec<Matcher>,
}

/// Atlas answers `"metricThreshold": {}` for non metric alerts.
fn non_empty_threshold<'de, D>(deserializer: D) -> Result<Option<MetricThreshold>, D::Error>
where
    D: ::serde::Deserializer<'de>,
{
    #[derive(Deserialize, Default)]
    #[serde(rename_all = "camelCase", default)]
    struct RawThreshold {
        metric_name: String,
        operator: String,
        threshold: f64,
        units: String,
        mode: Option<String>,
    }

    let raw = Option::<RawThreshold>::deserialize(deserializer)?;
    Ok(raw
        .map(|raw| MetricThreshold {
            metric_name: raw.metric_name,
            operator: raw.operator,
            threshold: raw.threshold,
            units: raw.units,
            mode: raw.mode,
        })
        .filter(|threshold| !threshold.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::serde_json::json;

    #[test]
    fn empty_metric_threshold_is_dropped() -> anyhow::Result<()> {
        let alert: AlertConfiguration = serde_json::from_value(json!({
            "id": "a1",
            "eventTypeName": "NO_PRIMARY",
            "enabled": true,
            "metricThreshold": {},
            "notifications": [{"typeName": "GROUP", "intervalMin": 5}]
        }))?;
        assert_eq!(alert.metric_threshold, None);
        let payload = serde_json::to_value(&alert)?;
        assert!(payload.get("metricThreshold").is_none());
        assert!(payload.get("matchers").is_none());
        Ok(())
    }

    #[test]
    fn metric_threshold_round_trips() -> anyhow::Result<()> {
        let alert: AlertConfiguration = serde_json::from_value(json!({
            "eventTypeName": "OUTSIDE_METRIC_THRESHOLD",
            "metricThreshold": {
                "metricName": "ASSERT_REGULAR",
                "operator": "LESS_THAN",
                "threshold": 99.0,
                "units": "RAW",
                "mode": "AVERAGE"
            }
        }))?;
        let threshold = alert.metric_threshold.unwrap();
        assert_eq!(threshold.metric_name, "ASSERT_REGULAR");
        assert_eq!(threshold.mode.as_deref(), Some("AVERAGE"));
        Ok(())
    }
}
