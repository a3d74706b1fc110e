//! Command line surface of the provider binary.

use ::std::path::PathBuf;

use ::atlas_client::resource_client::ResourceClient;
use ::atlas_common::{
    anyhow::anyhow,
    config::Args,
    error::{ProviderError, Result},
    resource::ResourceIdentity,
    serde::Serialize,
    serde_json,
    tracing::info,
};
use ::clap::{Parser, Subcommand};

use crate::{
    config::ProviderConfig,
    lookup,
    manifest::{read_manifest, read_state, write_state, ManagedKind, Manifest, ResourceKind, StateFile},
    reconciler::{CreateLock, Reconciler, TrackedResource},
    remote_api::RemoteApi,
    resources::{
        AlertConfigurationResource, ClusterResource, ContainerResource, DatabaseUserResource,
        IpWhitelistResource, PeerResource,
    },
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub args: Args,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create the resource declared in a manifest and write its state file.
    Create {
        #[arg(long)]
        manifest: PathBuf,
        #[arg(long)]
        state: PathBuf,
    },
    /// Refresh the attributes in a state file.
    Read {
        #[arg(long)]
        state: PathBuf,
    },
    /// Apply a changed manifest to a tracked resource.
    Update {
        #[arg(long)]
        manifest: PathBuf,
        #[arg(long)]
        state: PathBuf,
    },
    /// Delete a tracked resource.
    Delete {
        #[arg(long)]
        state: PathBuf,
    },
    /// Start tracking an existing resource, given as `GROUP-ID`.
    Import {
        #[arg(long, value_enum)]
        kind: ResourceKind,
        #[arg(long)]
        id: String,
        #[arg(long)]
        state: PathBuf,
    },
    /// Print the attributes of an untracked Atlas object as JSON.
    Lookup {
        #[command(subcommand)]
        target: LookupTarget,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum LookupTarget {
    /// A network container, by group and container id.
    Container {
        #[arg(long)]
        group: String,
        #[arg(long)]
        id: String,
    },
    /// A project, by name.
    Project {
        #[arg(long)]
        name: String,
    },
}

/// Everything one invocation shares across kinds.
pub struct Provider {
    client: ResourceClient,
    config: ProviderConfig,
    create_lock: CreateLock,
}

impl Provider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = ResourceClient::new(&config.base_url, config.credentials())?;
        Ok(Self {
            client,
            config,
            create_lock: CreateLock::new(),
        })
    }

    fn reconciler<K>(&self) -> Reconciler<K, ResourceClient>
    where
        K: ManagedKind,
        ResourceClient: RemoteApi<K>,
    {
        Reconciler::new(self.client.clone())
            .with_timeouts(self.config.timeouts.apply(K::DEFAULT_TIMEOUTS))
            .with_observation_policy(self.config.observation_error_policy)
            .with_create_lock(self.create_lock.clone())
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Create { manifest, state } => {
                let manifest = read_manifest(&manifest)?;
                info!("Create {:?} from manifest", manifest.kind());
                match manifest {
                    Manifest::Cluster(config) => self.create::<ClusterResource>(config, state).await,
                    Manifest::NetworkContainer(config) => {
                        self.create::<ContainerResource>(config, state).await
                    }
                    Manifest::NetworkPeering(config) => self.create::<PeerResource>(config, state).await,
                    Manifest::DatabaseUser(config) => {
                        self.create::<DatabaseUserResource>(config, state).await
                    }
                    Manifest::IpWhitelist(config) => {
                        self.create::<IpWhitelistResource>(config, state).await
                    }
                    Manifest::AlertConfiguration(config) => {
                        self.create::<AlertConfigurationResource>(config, state).await
                    }
                }
            }
            Command::Read { state } => match read_state(&state)? {
                StateFile::Cluster(tracked) => self.read::<ClusterResource>(tracked, state).await,
                StateFile::NetworkContainer(tracked) => {
                    self.read::<ContainerResource>(tracked, state).await
                }
                StateFile::NetworkPeering(tracked) => self.read::<PeerResource>(tracked, state).await,
                StateFile::DatabaseUser(tracked) => {
                    self.read::<DatabaseUserResource>(tracked, state).await
                }
                StateFile::IpWhitelist(tracked) => {
                    self.read::<IpWhitelistResource>(tracked, state).await
                }
                StateFile::AlertConfiguration(tracked) => {
                    self.read::<AlertConfigurationResource>(tracked, state).await
                }
            },
            Command::Update { manifest, state } => match read_manifest(&manifest)? {
                Manifest::Cluster(config) => self.update::<ClusterResource>(config, state).await,
                Manifest::NetworkContainer(config) => {
                    self.update::<ContainerResource>(config, state).await
                }
                Manifest::NetworkPeering(config) => self.update::<PeerResource>(config, state).await,
                Manifest::DatabaseUser(config) => {
                    self.update::<DatabaseUserResource>(config, state).await
                }
                Manifest::IpWhitelist(config) => {
                    self.update::<IpWhitelistResource>(config, state).await
                }
                Manifest::AlertConfiguration(config) => {
                    self.update::<AlertConfigurationResource>(config, state).await
                }
            },
            Command::Delete { state } => match read_state(&state)? {
                StateFile::Cluster(tracked) => self.delete::<ClusterResource>(tracked, state).await,
                StateFile::NetworkContainer(tracked) => {
                    self.delete::<ContainerResource>(tracked, state).await
                }
                StateFile::NetworkPeering(tracked) => {
                    self.delete::<PeerResource>(tracked, state).await
                }
                StateFile::DatabaseUser(tracked) => {
                    self.delete::<DatabaseUserResource>(tracked, state).await
                }
                StateFile::IpWhitelist(tracked) => {
                    self.delete::<IpWhitelistResource>(tracked, state).await
                }
                StateFile::AlertConfiguration(tracked) => {
                    self.delete::<AlertConfigurationResource>(tracked, state).await
                }
            },
            Command::Import { kind, id, state } => match kind {
                ResourceKind::Cluster => self.import::<ClusterResource>(&id, state).await,
                ResourceKind::NetworkContainer => self.import::<ContainerResource>(&id, state).await,
                ResourceKind::NetworkPeering => self.import::<PeerResource>(&id, state).await,
                ResourceKind::DatabaseUser => self.import::<DatabaseUserResource>(&id, state).await,
                ResourceKind::IpWhitelist => self.import::<IpWhitelistResource>(&id, state).await,
                ResourceKind::AlertConfiguration => {
                    self.import::<AlertConfigurationResource>(&id, state).await
                }
            },
            Command::Lookup { target } => match target {
                LookupTarget::Container { group, id } => {
                    let identity = ResourceIdentity::new(group, id)?;
                    print_json(
                        &lookup::resource::<ContainerResource, _>(&self.client, &identity).await?,
                    )
                }
                LookupTarget::Project { name } => {
                    print_json(&lookup::project(&self.client, &name).await?)
                }
            },
        }
    }

    /// The state file is written even when the create fails, so a
    /// resource Atlas accepted is never lost track of.
    async fn create<K>(&self, config: K::Config, state: PathBuf) -> Result<()>
    where
        K: ManagedKind,
        ResourceClient: RemoteApi<K>,
    {
        if read_state(&state).is_ok_and(Self::tracks_resource::<K>) {
            return Err(ProviderError::illegal_argument(anyhow!(
                "{} already tracks a {}",
                state.display(),
                K::KIND
            )));
        }
        let mut tracked = TrackedResource::<K>::default();
        let outcome = self.reconciler::<K>().create(&config, &mut tracked).await;
        write_state(&state, &K::into_state(tracked))?;
        outcome
    }

    async fn read<K>(&self, mut tracked: TrackedResource<K>, state: PathBuf) -> Result<()>
    where
        K: ManagedKind,
        ResourceClient: RemoteApi<K>,
    {
        self.reconciler::<K>().read(&mut tracked).await?;
        write_state(&state, &K::into_state(tracked))
    }

    async fn update<K>(&self, config: K::Config, state: PathBuf) -> Result<()>
    where
        K: ManagedKind,
        ResourceClient: RemoteApi<K>,
    {
        let mut tracked = K::from_state(read_state(&state)?)?;
        let outcome = self.reconciler::<K>().update(&config, &mut tracked).await;
        write_state(&state, &K::into_state(tracked))?;
        outcome
    }

    async fn delete<K>(&self, mut tracked: TrackedResource<K>, state: PathBuf) -> Result<()>
    where
        K: ManagedKind,
        ResourceClient: RemoteApi<K>,
    {
        self.reconciler::<K>().delete(&mut tracked).await?;
        write_state(&state, &K::into_state(tracked))
    }

    async fn import<K>(&self, import_id: &str, state: PathBuf) -> Result<()>
    where
        K: ManagedKind,
        ResourceClient: RemoteApi<K>,
    {
        let tracked = self.reconciler::<K>().import(import_id).await?;
        write_state(&state, &K::into_state(tracked))
    }

    fn tracks_resource<K: ManagedKind>(state: StateFile) -> bool {
        K::from_state(state).is_ok_and(|tracked| tracked.exists())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_import() {
        let cli = Cli::parse_from([
            "atlas_provider",
            "--config-path",
            "provider.json",
            "import",
            "--kind",
            "database-user",
            "--id",
            "5a0a1e7e0f2912c554080adc-app",
            "--state",
            "user.json",
        ]);
        assert_eq!(cli.args.config_path, "provider.json");
        assert_eq!(
            cli.command,
            Command::Import {
                kind: ResourceKind::DatabaseUser,
                id: "5a0a1e7e0f2912c554080adc-app".to_owned(),
                state: PathBuf::from("user.json"),
            }
        );
    }

    #[test]
    fn parse_project_lookup() {
        let cli = Cli::parse_from([
            "atlas_provider",
            "--config-path",
            "provider.json",
            "lookup",
            "project",
            "--name",
            "shop",
        ]);
        assert_eq!(
            cli.command,
            Command::Lookup {
                target: LookupTarget::Project {
                    name: "shop".to_owned()
                }
            }
        );
    }
}
