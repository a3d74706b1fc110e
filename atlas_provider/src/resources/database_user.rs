use ::atlas_common::{
    error::Result,
    model::{DatabaseUser, Role},
    resource::ResourceIdentity,
    serde::{Deserialize, Serialize},
    time::OffsetDateTime,
};

use super::{apply_field, Resource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "atlas_common::serde")]
#[serde(deny_unknown_fields)]
pub struct RoleConfig {
    pub name: String,
    pub database: String,
    #[serde(default)]
    pub collection: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "atlas_common::serde")]
#[serde(deny_unknown_fields)]
pub struct DatabaseUserConfig {
    pub group: String,
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    /// Authentication database.
    #[serde(default = "default_database")]
    pub database: String,
    pub roles: Vec<RoleConfig>,
    /// Atlas removes the user after this date.
    #[serde(default, with = "atlas_common::time::serde::rfc3339::option")]
    pub delete_after_date: Option<OffsetDateTime>,
}

fn default_database() -> String {
    "admin".to_owned()
}

/// Everything but the password, which Atlas never returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "atlas_common::serde")]
pub struct DatabaseUserAttributes {
    pub group: String,
    pub username: String,
    pub database: String,
    pub roles: Vec<RoleConfig>,
    #[serde(default, with = "atlas_common::time::serde::rfc3339::option")]
    pub delete_after_date: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseUserResource;

impl Resource for DatabaseUserResource {
    const KIND: &'static str = "database user";

    type Config = DatabaseUserConfig;
    type Remote = DatabaseUser;
    type Attributes = DatabaseUserAttributes;

    fn group_id(config: &DatabaseUserConfig) -> &str {
        &config.group
    }

    fn create_payload(config: &DatabaseUserConfig) -> DatabaseUser {
        DatabaseUser {
            group_id: Some(config.group.clone()),
            username: config.username.clone(),
            password: config.password.clone(),
            database_name: Some(config.database.clone()),
            delete_after_date: config.delete_after_date,
            roles: roles_payload(&config.roles),
        }
    }

    fn identity_of(config: &DatabaseUserConfig, _created: &DatabaseUser) -> Result<ResourceIdentity> {
        ResourceIdentity::new(config.group.clone(), config.username.clone())
    }

    fn apply_changes(
        previous: &DatabaseUserConfig,
        desired: &DatabaseUserConfig,
        remote: &mut DatabaseUser,
    ) -> bool {
        let mut changed = false;
        changed |= apply_field(&previous.password, &desired.password, &mut remote.password, Clone::clone);
        changed |= apply_field(&previous.roles, &desired.roles, &mut remote.roles, |roles| {
            roles_payload(roles)
        });
        changed |= apply_field(
            &previous.delete_after_date,
            &desired.delete_after_date,
            &mut remote.delete_after_date,
            |date| *date,
        );
        changed
    }

    fn attributes(identity: &ResourceIdentity, remote: &DatabaseUser) -> DatabaseUserAttributes {
        DatabaseUserAttributes {
            group: remote
                .group_id
                .clone()
                .unwrap_or_else(|| identity.group_id().to_owned()),
            username: remote.username.clone(),
            database: remote
                .database_name
                .clone()
                .unwrap_or_else(default_database),
            roles: remote
                .roles
                .iter()
                .map(|role| RoleConfig {
                    name: role.role_name.clone(),
                    database: role.database_name.clone(),
                    collection: role.collection_name.clone(),
                })
                .collect(),
            delete_after_date: remote.delete_after_date,
        }
    }

    fn config_of(identity: &ResourceIdentity, remote: &DatabaseUser) -> DatabaseUserConfig {
        let attributes = Self::attributes(identity, remote);
        DatabaseUserConfig {
            group: attributes.group,
            username: attributes.username,
            password: None,
            database: attributes.database,
            roles: attributes.roles,
            delete_after_date: attributes.delete_after_date,
        }
    }
}

fn roles_payload(roles: &[RoleConfig]) -> Vec<Role> {
    roles
        .iter()
        .map(|role| Role {
            role_name: role.name.clone(),
            database_name: role.database.clone(),
            collection_name: role.collection.clone(),
        })
        .collect()
}
