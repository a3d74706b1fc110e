use ::atlas_common::{
    error::ProviderError,
    model::{Container, Project},
    tokio,
};
use ::atlas_provider::{lookup, resources::ContainerResource};

mod common;
use common::{identity, MockContainerApi, MockProjects, GROUP};

#[tokio::test]
async fn container_lookup() {
    let mut api = MockContainerApi::new();
    api.expect_get()
        .times(1)
        .withf(|identity| identity.group_id() == GROUP && identity.id() == "5a0a1e7e0f2912c554080ae7")
        .returning(|_| {
            Ok(Some(Container {
                id: Some("5a0a1e7e0f2912c554080ae7".to_owned()),
                provider_name: Some("GCP".to_owned()),
                atlas_cidr_block: Some("10.8.0.0/18".to_owned()),
                gcp_project_id: Some("atlas-gcp".to_owned()),
                network_name: Some("nt-1".to_owned()),
                provisioned: Some(false),
                ..Default::default()
            }))
        });
    api.expect_switch_private_ip_mode().never();

    let attributes =
        lookup::resource::<ContainerResource, _>(&api, &identity("5a0a1e7e0f2912c554080ae7"))
            .await
            .unwrap();
    assert_eq!(attributes.identifier, "5a0a1e7e0f2912c554080ae7");
    assert_eq!(attributes.network_name.as_deref(), Some("nt-1"));
    assert_eq!(attributes.region, None);
    assert!(!attributes.provisioned);
}

#[tokio::test]
async fn missing_container_is_an_error() {
    let mut api = MockContainerApi::new();
    api.expect_get().times(1).returning(|_| Ok(None));
    let err = lookup::resource::<ContainerResource, _>(&api, &identity("ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::NotFound(_)));
}

#[tokio::test]
async fn project_lookup_by_name() {
    let mut projects = MockProjects::new();
    projects
        .expect_project_by_name()
        .times(1)
        .withf(|name| name.to_string() == "shop")
        .returning(|_| {
            Ok(Some(Project {
                id: GROUP.to_owned(),
                name: "shop".to_owned(),
                org_id: Some("5a0a1e7e0f2912c554080ad0".to_owned()),
                created: Some("2018-01-05T14:32:06Z".to_owned()),
                cluster_count: 3,
            }))
        });

    let project = lookup::project(&projects, "shop").await.unwrap();
    assert_eq!(project.id, GROUP);
    assert_eq!(project.cluster_count, 3);
}

#[tokio::test]
async fn project_lookup_errors_name_the_project() {
    let mut projects = MockProjects::new();
    projects
        .expect_project_by_name()
        .returning(|_| Err(ProviderError::transport("connection refused")));
    let err = lookup::project(&projects, "shop").await.unwrap_err();
    assert!(err.to_string().contains("project shop"), "{err}");
    assert!(err.is_transient());

    let mut projects = MockProjects::new();
    projects.expect_project_by_name().returning(|_| Ok(None));
    assert!(lookup::project(&projects, "shop")
        .await
        .unwrap_err()
        .is_not_found());
}
