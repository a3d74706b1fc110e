//! Identity and state vocabulary shared by every resource kind.

use ::core::fmt::Display;
use ::std::{borrow::Cow, collections::BTreeSet, fmt, str::FromStr};

use ::anyhow::anyhow;
use ::serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};

/// Stable key of a remote resource: the project (group) it lives in and
/// its name or server assigned id. Never changes once assigned.
#[derive(Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceIdentity {
    group_id: Cow<'static, str>,
    id: Cow<'static, str>,
}

impl ResourceIdentity {
    pub fn new(
        group_id: impl Into<Cow<'static, str>>,
        id: impl Into<Cow<'static, str>>,
    ) -> Result<Self> {
        let group_id = group_id.into();
        let id = id.into();
        if group_id.is_empty() {
            return Err(ProviderError::illegal_argument(anyhow!(
                "Group id cannot be empty."
            )));
        }
        if id.is_empty() {
            return Err(ProviderError::illegal_argument(anyhow!(
                "Resource id cannot be empty."
            )));
        }
        Ok(Self { group_id, id })
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Name or id of the resource inside its group.
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Import ids have the form `{group id}-{name or id}`.
/// Group ids never contain `-`, so only the first one separates the parts.
impl FromStr for ResourceIdentity {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('-') {
            Some((group_id, id)) => Self::new(group_id.to_owned(), id.to_owned()),
            None => Err(ProviderError::illegal_argument(anyhow!(
                "Invalid import id {:?}, use the format {{group id}}-{{name or id}}",
                s
            ))),
        }
    }
}

impl Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.group_id, self.id)
    }
}

impl TryFrom<String> for ResourceIdentity {
    type Error = ProviderError;
    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ResourceIdentity> for String {
    fn from(value: ResourceIdentity) -> Self {
        value.to_string()
    }
}

/// State label reported by the remote API, e.g. `CREATING` or `IDLE`.
/// The vocabulary is owned by the remote side, so this stays an open string.
#[derive(Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Clone)]
pub struct ObservedState(Cow<'static, str>);

impl ObservedState {
    /// Synthesized locally when the remote answers 404.
    pub const DELETED: Self = Self::from_static("DELETED");

    pub const fn from_static(state: &'static str) -> Self {
        Self(Cow::Borrowed(state))
    }

    pub fn new(state: impl Into<Cow<'static, str>>) -> Self {
        Self(state.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ObservedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Set of states a poll accepts as pending or as target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSet(BTreeSet<ObservedState>);

impl StateSet {
    pub fn contains(&self, state: &ObservedState) -> bool {
        self.0.contains(state)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObservedState> {
        self.0.iter()
    }

    pub fn union(&self, other: &StateSet) -> StateSet {
        self.0.union(&other.0).cloned().collect()
    }
}

impl<const N: usize> From<[&'static str; N]> for StateSet {
    fn from(states: [&'static str; N]) -> Self {
        states.into_iter().map(ObservedState::from_static).collect()
    }
}

impl FromIterator<ObservedState> for StateSet {
    fn from_iter<I: IntoIterator<Item = ObservedState>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Display for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, state) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(state.as_str())?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::serde_json::json;

    #[test]
    fn parse_import_id() -> anyhow::Result<()> {
        let identity: ResourceIdentity = "5a0a1e7e0f2912c554080adc-my-cluster".parse()?;
        assert_eq!(identity.group_id(), "5a0a1e7e0f2912c554080adc");
        assert_eq!(identity.id(), "my-cluster");
        Ok(())
    }

    #[test]
    fn import_id_keeps_cidr_slash() -> anyhow::Result<()> {
        let identity: ResourceIdentity = "abc-10.0.0.0/16".parse()?;
        assert_eq!(identity.id(), "10.0.0.0/16");
        Ok(())
    }

    #[test]
    fn import_id_without_separator_is_rejected() {
        let result = "5a0a1e7e0f2912c554080adc".parse::<ResourceIdentity>();
        assert!(result.is_err_and(|e| e
            .to_string()
            .starts_with("Illegal Argument error: Invalid import id")));
    }

    #[test]
    fn identity_parts_cannot_be_empty() {
        assert!("-cluster".parse::<ResourceIdentity>().is_err());
        assert!("group-".parse::<ResourceIdentity>().is_err());
        assert!(ResourceIdentity::new("", "x").is_err());
    }

    #[test]
    fn identity_serializes_as_import_id() -> anyhow::Result<()> {
        let identity = ResourceIdentity::new("g1", "peer-1")?;
        assert_eq!(serde_json::to_value(&identity)?, json!("g1-peer-1"));
        let back: ResourceIdentity = serde_json::from_value(json!("g1-peer-1"))?;
        assert_eq!(back, identity);
        Ok(())
    }

    #[test]
    fn state_set_membership() {
        let pending = StateSet::from(["CREATING", "UPDATING", "REPAIRING"]);
        assert!(pending.contains(&ObservedState::new("UPDATING".to_owned())));
        assert!(!pending.contains(&ObservedState::from_static("IDLE")));
        assert!(!pending.contains(&ObservedState::DELETED));
        assert_eq!(pending.to_string(), "{CREATING, REPAIRING, UPDATING}");
    }

    #[test]
    fn state_set_union() {
        let a = StateSet::from(["IDLE"]);
        let b = StateSet::from(["IDLE", "DELETING"]);
        assert_eq!(a.union(&b), StateSet::from(["DELETING", "IDLE"]));
    }
}
