//! Files the binary works on: a manifest declaring one resource, and a
//! state file tracking it between invocations.

use ::std::{fs::File, io::BufReader, path::Path};

use ::atlas_common::{
    anyhow::anyhow,
    error::{ProviderError, Result},
    serde::{Deserialize, Serialize},
    serde_json,
};
use ::clap::ValueEnum;

use crate::{
    reconciler::TrackedResource,
    resources::{
        AlertConfigurationResource, ClusterResource, ContainerResource, DatabaseUserResource,
        IpWhitelistResource, PeerResource, Resource,
    },
};

/// A resource kind whose tracked state can be stored in a [`StateFile`].
pub trait ManagedKind: Resource {
    const VARIANT: ResourceKind;

    fn into_state(tracked: TrackedResource<Self>) -> StateFile;

    fn from_state(state: StateFile) -> Result<TrackedResource<Self>>;
}

macro_rules! managed_kinds {
    ($($variant: ident => $kind: ty),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
        pub enum ResourceKind {
            $($variant,)*
        }

        /// Declared configuration of one resource, tagged by kind.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(crate = "atlas_common::serde")]
        #[serde(tag = "kind", content = "config", rename_all = "snake_case")]
        pub enum Manifest {
            $($variant(<$kind as Resource>::Config),)*
        }

        impl Manifest {
            pub fn kind(&self) -> ResourceKind {
                match self {
                    $(Self::$variant(_) => ResourceKind::$variant,)*
                }
            }
        }

        /// Tracked state of one resource, tagged by kind.
        #[derive(Debug, Clone, Serialize, Deserialize)]
        #[serde(crate = "atlas_common::serde")]
        #[serde(tag = "kind", content = "state", rename_all = "snake_case")]
        pub enum StateFile {
            $($variant(TrackedResource<$kind>),)*
        }

        impl StateFile {
            pub fn kind(&self) -> ResourceKind {
                match self {
                    $(Self::$variant(_) => ResourceKind::$variant,)*
                }
            }
        }

        $(
            impl ManagedKind for $kind {
                const VARIANT: ResourceKind = ResourceKind::$variant;

                fn into_state(tracked: TrackedResource<Self>) -> StateFile {
                    StateFile::$variant(tracked)
                }

                fn from_state(state: StateFile) -> Result<TrackedResource<Self>> {
                    match state {
                        StateFile::$variant(tracked) => Ok(tracked),
                        other => Err(ProviderError::illegal_argument(anyhow!(
                            "State file tracks a {:?}, not a {:?}",
                            other.kind(),
                            Self::VARIANT
                        ))),
                    }
                }
            }
        )*
    };
}

managed_kinds! {
    Cluster => ClusterResource,
    NetworkContainer => ContainerResource,
    NetworkPeering => PeerResource,
    DatabaseUser => DatabaseUserResource,
    IpWhitelist => IpWhitelistResource,
    AlertConfiguration => AlertConfigurationResource,
}

pub fn read_manifest(path: impl AsRef<Path>) -> Result<Manifest> {
    read_json(path.as_ref())
}

pub fn read_state(path: impl AsRef<Path>) -> Result<StateFile> {
    read_json(path.as_ref())
}

pub fn write_state(path: impl AsRef<Path>, state: &StateFile) -> Result<()> {
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, state)?;
    Ok(())
}

fn read_json<T: ::atlas_common::serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| {
        ProviderError::illegal_argument(anyhow!("cannot open {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
