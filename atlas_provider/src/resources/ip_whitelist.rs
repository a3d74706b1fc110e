use ::atlas_common::{
    anyhow::anyhow,
    error::{ProviderError, Result},
    model::WhitelistEntry,
    resource::ResourceIdentity,
    serde::{Deserialize, Serialize},
    tracing::debug,
};

use super::{apply_field, non_empty, Resource};

/// A whitelist entry is declared with either a CIDR block or a single IP
/// address. Both identify the entry, so changing them means a new resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "atlas_common::serde")]
#[serde(deny_unknown_fields)]
pub struct IpWhitelistConfig {
    pub group: String,
    #[serde(default)]
    pub cidr_block: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "atlas_common::serde")]
pub struct IpWhitelistAttributes {
    pub group: String,
    pub cidr_block: String,
    pub ip_address: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IpWhitelistResource;

impl IpWhitelistResource {
    /// Whether `entry` from the list Atlas returns after a create is the
    /// one described by `requested`.
    pub fn matches(requested: &WhitelistEntry, entry: &WhitelistEntry) -> bool {
        match (&requested.cidr_block, &requested.ip_address) {
            (Some(cidr), _) => entry.cidr_block.as_ref() == Some(cidr),
            (None, Some(ip)) => entry.ip_address.as_ref() == Some(ip),
            (None, None) => false,
        }
    }
}

impl Resource for IpWhitelistResource {
    const KIND: &'static str = "ip whitelist entry";
    /// Concurrent whitelist posts on one group overwrite each other remotely.
    const SERIALIZE_WRITES: bool = true;

    type Config = IpWhitelistConfig;
    type Remote = WhitelistEntry;
    type Attributes = IpWhitelistAttributes;

    fn group_id(config: &IpWhitelistConfig) -> &str {
        &config.group
    }

    fn validate(config: &IpWhitelistConfig) -> Result<()> {
        let cidr = config.cidr_block.as_deref().and_then(non_empty);
        let ip = config.ip_address.as_deref().and_then(non_empty);
        if cidr.is_none() && ip.is_none() {
            return Err(ProviderError::illegal_argument(anyhow!(
                "An ip whitelist entry needs a cidr_block or an ip_address"
            )));
        }
        Ok(())
    }

    /// The CIDR block wins when both are given; the IP address is dropped.
    fn create_payload(config: &IpWhitelistConfig) -> WhitelistEntry {
        let cidr_block = config.cidr_block.as_deref().and_then(non_empty);
        let mut ip_address = config.ip_address.as_deref().and_then(non_empty);
        if cidr_block.is_some() && ip_address.is_some() {
            debug!(
                "Both cidr block {:?} and ip address {:?} given, keeping the cidr block",
                cidr_block, ip_address
            );
            ip_address = None;
        }
        WhitelistEntry {
            cidr_block,
            ip_address,
            comment: config.comment.clone(),
            group_id: Some(config.group.clone()),
        }
    }

    /// Entries are keyed by CIDR block, even when created from an IP.
    fn identity_of(config: &IpWhitelistConfig, created: &WhitelistEntry) -> Result<ResourceIdentity> {
        let cidr_block = created.cidr_block.clone().ok_or_else(|| {
            ProviderError::Other(format!(
                "Atlas returned a whitelist entry without cidr block for {:?}",
                config
            ))
        })?;
        ResourceIdentity::new(config.group.clone(), cidr_block)
    }

    fn apply_changes(
        previous: &IpWhitelistConfig,
        desired: &IpWhitelistConfig,
        remote: &mut WhitelistEntry,
    ) -> bool {
        apply_field(&previous.comment, &desired.comment, &mut remote.comment, Clone::clone)
    }

    /// Atlas echoes `ipAddress` next to the `{ip}/32` block it derived, and
    /// refuses a post carrying both.
    fn clear_read_only(remote: &mut WhitelistEntry) {
        if remote.cidr_block.is_some() {
            remote.ip_address = None;
        }
    }

    fn attributes(identity: &ResourceIdentity, remote: &WhitelistEntry) -> IpWhitelistAttributes {
        IpWhitelistAttributes {
            group: remote
                .group_id
                .clone()
                .unwrap_or_else(|| identity.group_id().to_owned()),
            cidr_block: remote
                .cidr_block
                .clone()
                .unwrap_or_else(|| identity.id().to_owned()),
            ip_address: remote.ip_address.clone(),
            comment: remote.comment.clone(),
        }
    }

    fn config_of(identity: &ResourceIdentity, remote: &WhitelistEntry) -> IpWhitelistConfig {
        let attributes = Self::attributes(identity, remote);
        IpWhitelistConfig {
            group: attributes.group,
            cidr_block: Some(attributes.cidr_block),
            ip_address: None,
            comment: attributes.comment,
        }
    }
}
