use ::atlas_common::{
    anyhow::anyhow,
    error::{ProviderError, Result},
    model::{AlertConfiguration, Matcher, MetricThreshold, Notification},
    resource::ResourceIdentity,
    serde::{Deserialize, Serialize},
};

use super::{apply_field, Resource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "atlas_common::serde")]
#[serde(deny_unknown_fields)]
pub struct MatcherConfig {
    pub field_name: String,
    pub operator: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "atlas_common::serde")]
#[serde(deny_unknown_fields)]
pub struct MetricThresholdConfig {
    pub metric_name: String,
    pub operator: String,
    pub threshold: f64,
    pub units: String,
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_mode() -> String {
    "AVERAGE".to_owned()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "atlas_common::serde")]
#[serde(default, deny_unknown_fields)]
pub struct NotificationConfig {
    pub type_name: String,
    pub interval_min: Option<u32>,
    pub delay_min: Option<u32>,
    pub email_enabled: Option<bool>,
    pub sms_enabled: Option<bool>,
    pub username: Option<String>,
    pub team_id: Option<String>,
    pub email_address: Option<String>,
    pub mobile_number: Option<String>,
    pub notification_token: Option<String>,
    pub room_name: Option<String>,
    pub channel_name: Option<String>,
    pub api_token: Option<String>,
    pub org_name: Option<String>,
    pub flow_name: Option<String>,
    pub flowdock_api_token: Option<String>,
    pub service_key: Option<String>,
    pub victor_ops_api_key: Option<String>,
    pub victor_ops_routing_key: Option<String>,
    pub ops_genie_api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "atlas_common::serde")]
#[serde(deny_unknown_fields)]
pub struct AlertConfigurationConfig {
    pub group: String,
    pub event_type_name: String,
    pub enabled: bool,
    #[serde(default)]
    pub matchers: Vec<MatcherConfig>,
    pub notifications: Vec<NotificationConfig>,
    #[serde(default)]
    pub metric_threshold: Option<MetricThresholdConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "atlas_common::serde")]
pub struct AlertConfigurationAttributes {
    pub identifier: String,
    pub group: String,
    pub event_type_name: String,
    pub enabled: bool,
    pub matchers: Vec<MatcherConfig>,
    pub notifications: Vec<NotificationConfig>,
    pub metric_threshold: Option<MetricThresholdConfig>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlertConfigurationResource;

impl Resource for AlertConfigurationResource {
    const KIND: &'static str = "alert configuration";

    type Config = AlertConfigurationConfig;
    type Remote = AlertConfiguration;
    type Attributes = AlertConfigurationAttributes;

    fn group_id(config: &AlertConfigurationConfig) -> &str {
        &config.group
    }

    fn validate(config: &AlertConfigurationConfig) -> Result<()> {
        if config.notifications.is_empty() {
            return Err(ProviderError::illegal_argument(anyhow!(
                "An alert configuration needs at least one notification"
            )));
        }
        Ok(())
    }

    fn create_payload(config: &AlertConfigurationConfig) -> AlertConfiguration {
        AlertConfiguration {
            id: None,
            group_id: None,
            event_type_name: config.event_type_name.clone(),
            enabled: config.enabled,
            notifications: config.notifications.iter().map(Notification::from).collect(),
            metric_threshold: threshold_payload(&config.metric_threshold),
            matchers: config.matchers.iter().map(Matcher::from).collect(),
        }
    }

    fn identity_of(
        config: &AlertConfigurationConfig,
        created: &AlertConfiguration,
    ) -> Result<ResourceIdentity> {
        let id = created.id.clone().ok_or_else(|| {
            ProviderError::Other(format!(
                "Atlas returned no id for the {} alert configuration",
                config.event_type_name
            ))
        })?;
        ResourceIdentity::new(config.group.clone(), id)
    }

    fn apply_changes(
        previous: &AlertConfigurationConfig,
        desired: &AlertConfigurationConfig,
        remote: &mut AlertConfiguration,
    ) -> bool {
        let mut changed = false;
        changed |= apply_field(
            &previous.event_type_name,
            &desired.event_type_name,
            &mut remote.event_type_name,
            Clone::clone,
        );
        changed |= apply_field(&previous.enabled, &desired.enabled, &mut remote.enabled, |v| *v);
        changed |= apply_field(
            &previous.notifications,
            &desired.notifications,
            &mut remote.notifications,
            |notifications| notifications.iter().map(Notification::from).collect(),
        );
        changed |= apply_field(
            &previous.matchers,
            &desired.matchers,
            &mut remote.matchers,
            |matchers| matchers.iter().map(Matcher::from).collect(),
        );
        changed |= apply_field(
            &previous.metric_threshold,
            &desired.metric_threshold,
            &mut remote.metric_threshold,
            threshold_payload,
        );
        changed
    }

    /// The whole configuration is replaced on update, without its ids.
    fn clear_read_only(remote: &mut AlertConfiguration) {
        remote.id = None;
        remote.group_id = None;
    }

    fn attributes(
        identity: &ResourceIdentity,
        remote: &AlertConfiguration,
    ) -> AlertConfigurationAttributes {
        AlertConfigurationAttributes {
            identifier: remote
                .id
                .clone()
                .unwrap_or_else(|| identity.id().to_owned()),
            group: identity.group_id().to_owned(),
            event_type_name: remote.event_type_name.clone(),
            enabled: remote.enabled,
            matchers: remote.matchers.iter().map(MatcherConfig::from).collect(),
            notifications: remote
                .notifications
                .iter()
                .map(NotificationConfig::from)
                .collect(),
            metric_threshold: remote
                .metric_threshold
                .as_ref()
                .map(MetricThresholdConfig::from),
        }
    }

    fn config_of(
        identity: &ResourceIdentity,
        remote: &AlertConfiguration,
    ) -> AlertConfigurationConfig {
        let attributes = Self::attributes(identity, remote);
        AlertConfigurationConfig {
            group: attributes.group,
            event_type_name: attributes.event_type_name,
            enabled: attributes.enabled,
            matchers: attributes.matchers,
            notifications: attributes.notifications,
            metric_threshold: attributes.metric_threshold,
        }
    }
}

/// An empty threshold is left out of the payload altogether.
fn threshold_payload(threshold: &Option<MetricThresholdConfig>) -> Option<MetricThreshold> {
    threshold
        .as_ref()
        .map(|threshold| MetricThreshold {
            metric_name: threshold.metric_name.clone(),
            operator: threshold.operator.clone(),
            threshold: threshold.threshold,
            units: threshold.units.clone(),
            mode: Some(threshold.mode.clone()),
        })
        .filter(|threshold| !threshold.is_empty())
}

impl From<&MatcherConfig> for Matcher {
    fn from(value: &MatcherConfig) -> Self {
        Self {
            field_name: value.field_name.clone(),
            operator: value.operator.clone(),
            value: value.value.clone(),
        }
    }
}

impl From<&Matcher> for MatcherConfig {
    fn from(value: &Matcher) -> Self {
        Self {
            field_name: value.field_name.clone(),
            operator: value.operator.clone(),
            value: value.value.clone(),
        }
    }
}

impl From<&MetricThreshold> for MetricThresholdConfig {
    fn from(value: &MetricThreshold) -> Self {
        Self {
            metric_name: value.metric_name.clone(),
            operator: value.operator.clone(),
            threshold: value.threshold,
            units: value.units.clone(),
            mode: value.mode.clone().unwrap_or_else(default_mode),
        }
    }
}

macro_rules! convert_notification {
    ($from: ty => $to: ty, $($field: ident),*) => {
        impl From<&$from> for $to {
            fn from(value: &$from) -> Self {
                Self {
                    $($field: value.$field.clone(),)*
                }
            }
        }
    };
}

convert_notification!(NotificationConfig => Notification, type_name, interval_min, delay_min,
    email_enabled, sms_enabled, username, team_id, email_address, mobile_number,
    notification_token, room_name, channel_name, api_token, org_name, flow_name,
    flowdock_api_token, service_key, victor_ops_api_key, victor_ops_routing_key,
    ops_genie_api_key);
convert_notification!(Notification => NotificationConfig, type_name, interval_min, delay_min,
    email_enabled, sms_enabled, username, team_id, email_address, mobile_number,
    notification_token, room_name, channel_name, api_token, org_name, flow_name,
    flowdock_api_token, service_key, victor_ops_api_key, victor_ops_routing_key,
    ops_genie_api_key);
