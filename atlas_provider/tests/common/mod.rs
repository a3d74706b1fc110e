#![allow(dead_code)]

use ::atlas_common::{
    error::Result,
    model::{Cluster, Container, DatabaseUser, Peer, Project, WhitelistEntry},
    resource::{ObservedState, ResourceIdentity},
    serde_json::{from_value, json},
};
use ::atlas_provider::{
    lookup::ProjectDirectory,
    observer::{Observation, StateObserver},
    remote_api::RemoteApi,
    resources::{
        cluster::ClusterConfig, ClusterResource, ContainerResource, DatabaseUserResource,
        IpWhitelistResource, PeerResource,
    },
};
use ::mockall::{mock, Sequence};

mock! {
    pub Observer {}
    impl StateObserver for Observer {
        type Snapshot = String;
        fn resource(&self) -> String;
        async fn observe(&self) -> Result<Observation<String>>;
    }
}

mock! {
    pub ClusterApi {}
    impl RemoteApi<ClusterResource> for ClusterApi {
        async fn get(&self, identity: &ResourceIdentity) -> Result<Option<Cluster>>;
        async fn create(&self, group_id: &str, payload: &Cluster) -> Result<Cluster>;
        async fn update(&self, identity: &ResourceIdentity, payload: &Cluster) -> Result<Cluster>;
        async fn delete(&self, identity: &ResourceIdentity) -> Result<()>;
    }
}

mock! {
    pub ContainerApi {}
    impl RemoteApi<ContainerResource> for ContainerApi {
        async fn get(&self, identity: &ResourceIdentity) -> Result<Option<Container>>;
        async fn create(&self, group_id: &str, payload: &Container) -> Result<Container>;
        async fn update(&self, identity: &ResourceIdentity, payload: &Container) -> Result<Container>;
        async fn delete(&self, identity: &ResourceIdentity) -> Result<()>;
        async fn switch_private_ip_mode(&self, group_id: &str, enabled: bool) -> Result<()>;
    }
}

mock! {
    pub PeerApi {}
    impl RemoteApi<PeerResource> for PeerApi {
        async fn get(&self, identity: &ResourceIdentity) -> Result<Option<Peer>>;
        async fn create(&self, group_id: &str, payload: &Peer) -> Result<Peer>;
        async fn update(&self, identity: &ResourceIdentity, payload: &Peer) -> Result<Peer>;
        async fn delete(&self, identity: &ResourceIdentity) -> Result<()>;
    }
}

mock! {
    pub DatabaseUserApi {}
    impl RemoteApi<DatabaseUserResource> for DatabaseUserApi {
        async fn get(&self, identity: &ResourceIdentity) -> Result<Option<DatabaseUser>>;
        async fn create(&self, group_id: &str, payload: &DatabaseUser) -> Result<DatabaseUser>;
        async fn update(&self, identity: &ResourceIdentity, payload: &DatabaseUser) -> Result<DatabaseUser>;
        async fn delete(&self, identity: &ResourceIdentity) -> Result<()>;
    }
}

mock! {
    pub WhitelistApi {}
    impl RemoteApi<IpWhitelistResource> for WhitelistApi {
        async fn get(&self, identity: &ResourceIdentity) -> Result<Option<WhitelistEntry>>;
        async fn create(&self, group_id: &str, payload: &WhitelistEntry) -> Result<WhitelistEntry>;
        async fn update(&self, identity: &ResourceIdentity, payload: &WhitelistEntry) -> Result<WhitelistEntry>;
        async fn delete(&self, identity: &ResourceIdentity) -> Result<()>;
    }
}

mock! {
    pub Projects {}
    impl ProjectDirectory for Projects {
        async fn project_by_name(&self, name: &str) -> Result<Option<Project>>;
    }
}

pub const GROUP: &str = "5a0a1e7e0f2912c554080adc";

/// An observer reporting `states` in order, each snapshot being its state.
pub fn observer_with_states(states: &[&'static str]) -> MockObserver {
    let mut observer = MockObserver::new();
    observer
        .expect_resource()
        .return_const("cluster test".to_owned());
    let mut seq = Sequence::new();
    for state in states {
        let state = *state;
        observer
            .expect_observe()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move || {
                Ok(Observation::Present {
                    snapshot: state.to_owned(),
                    state: ObservedState::from_static(state),
                })
            });
    }
    observer
}

pub fn cluster_config() -> ClusterConfig {
    from_value(json!({
        "group": GROUP,
        "name": "orders",
        "size": "M10",
        "provider_name": "AWS",
        "region": "US_EAST_1",
        "disk_size_gb": 40.0
    }))
    .unwrap()
}

pub fn cluster_in_state(state: &str) -> Cluster {
    Cluster {
        id: Some("5a0a1e7e0f2912c554080ae6".to_owned()),
        group_id: Some(GROUP.to_owned()),
        name: Some("orders".to_owned()),
        state_name: Some(state.to_owned()),
        mongodb_version: Some("4.0.3".to_owned()),
        ..Default::default()
    }
}

/// Expect `states` from consecutive gets of a cluster, in sequence.
pub fn expect_cluster_states(api: &mut MockClusterApi, seq: &mut Sequence, states: &[&str]) {
    for state in states {
        let cluster = cluster_in_state(state);
        api.expect_get()
            .times(1)
            .in_sequence(seq)
            .returning(move |_| Ok(Some(cluster.clone())));
    }
}

pub fn identity(id: &'static str) -> ResourceIdentity {
    ResourceIdentity::new(GROUP, id).unwrap()
}
