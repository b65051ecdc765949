//! azurerm_cosmosdb_sql_role_definition

use std::collections::HashMap;

use async_trait::async_trait;
use stratus_core::provider::{ProviderError, ProviderResult};
use stratus_core::resource::{Resource, ResourceId, State, Value};
use stratus_core::schema::ResourceSchema;
use stratus_core::timeouts::OperationContext;

use super::{
    ResourceHandler, Session, call_optional, delete_tolerant, ensure_absent, gone, lock_account,
    mutate, refreshed, tag,
};
use crate::fields::{self, Fields, string_or_empty};
use crate::ids::SqlRoleDefinitionId;
use crate::schemas::cosmosdb::sql_role_definition_schema;
use crate::sdk::rbacs::{
    Permission, RoleDefinitionType, SqlRoleDefinitionCreateUpdateParameters,
    SqlRoleDefinitionGetResults, SqlRoleDefinitionResource,
};

const TYPE_NAME: &str = "azurerm_cosmosdb_sql_role_definition";

// =============================================================================
// Flatten / Expand
// =============================================================================

pub fn expand_permissions(fields: &Fields<'_>) -> Vec<Permission> {
    fields
        .blocks("permissions")
        .iter()
        .map(|block| Permission {
            data_actions: Some(block.strings("data_actions")),
            not_data_actions: None,
        })
        .collect()
}

/// Always a list; every `data_actions` set is sorted
pub fn flatten_permissions(permissions: Option<&[Permission]>) -> Value {
    Value::List(
        permissions
            .unwrap_or_default()
            .iter()
            .map(|p| {
                fields::block([(
                    "data_actions",
                    fields::sorted_set(p.data_actions.iter().flatten().cloned()),
                )])
            })
            .collect(),
    )
}

/// Attributes shared by the resource and the data source
pub(crate) fn flatten_role_definition(
    id: &SqlRoleDefinitionId,
    definition: &SqlRoleDefinitionGetResults,
) -> HashMap<String, Value> {
    let mut attrs = HashMap::new();
    attrs.insert(
        "role_definition_id".to_string(),
        Value::string(&id.role_definition_id),
    );
    attrs.insert(
        "resource_group_name".to_string(),
        Value::string(&id.resource_group_name),
    );
    attrs.insert(
        "account_name".to_string(),
        Value::string(&id.database_account_name),
    );

    let props = definition.properties.as_ref();
    attrs.insert(
        "name".to_string(),
        string_or_empty(props.and_then(|p| p.role_name.as_deref())),
    );
    attrs.insert(
        "type".to_string(),
        string_or_empty(props.and_then(|p| p.role_type).map(|t| t.as_str())),
    );
    attrs.insert(
        "assignable_scopes".to_string(),
        fields::sorted_set(
            props
                .and_then(|p| p.assignable_scopes.clone())
                .unwrap_or_default(),
        ),
    );
    attrs.insert(
        "permissions".to_string(),
        flatten_permissions(props.and_then(|p| p.permissions.as_deref())),
    );
    attrs
}

// =============================================================================
// Handler
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SqlRoleDefinitionConfig {
    /// Generated when the caller leaves it out
    pub role_definition_id: String,
    pub resource_group_name: String,
    pub account_name: String,
    pub name: String,
    pub role_type: RoleDefinitionType,
    pub assignable_scopes: Vec<String>,
    pub permissions: Vec<Permission>,
}

impl SqlRoleDefinitionConfig {
    pub fn from_attributes(attrs: &HashMap<String, Value>) -> ProviderResult<Self> {
        let fields = Fields::new(attrs);
        let role_type = match fields.str("type") {
            Some(s) => RoleDefinitionType::parse(s).ok_or_else(|| {
                ProviderError::validation(format!("unknown role definition type {:?}", s))
            })?,
            None => RoleDefinitionType::CustomRole,
        };
        Ok(Self {
            role_definition_id: fields
                .str("role_definition_id")
                .map(str::to_string)
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            resource_group_name: fields.required_str("resource_group_name")?.to_string(),
            account_name: fields.required_str("account_name")?.to_string(),
            name: fields.required_str("name")?.to_string(),
            role_type,
            assignable_scopes: fields.strings("assignable_scopes"),
            permissions: expand_permissions(&fields),
        })
    }

    pub fn id(&self, subscription_id: &str) -> SqlRoleDefinitionId {
        SqlRoleDefinitionId::new(
            subscription_id,
            &self.resource_group_name,
            &self.account_name,
            &self.role_definition_id,
        )
    }

    fn parameters(&self) -> SqlRoleDefinitionCreateUpdateParameters {
        SqlRoleDefinitionCreateUpdateParameters {
            properties: Some(SqlRoleDefinitionResource {
                role_name: Some(self.name.clone()),
                role_type: Some(self.role_type),
                assignable_scopes: Some(self.assignable_scopes.clone()),
                permissions: Some(self.permissions.clone()),
            }),
        }
    }
}

pub struct CosmosDbSqlRoleDefinition;

impl CosmosDbSqlRoleDefinition {
    async fn read_id(
        &self,
        session: &Session,
        ctx: &OperationContext,
        rid: &ResourceId,
        id: &SqlRoleDefinitionId,
    ) -> ProviderResult<State> {
        match call_optional(ctx, id, session.clients.rbacs.sql_role_definition_get(id)).await? {
            Some(definition) => Ok(State::existing(rid.clone(), flatten_role_definition(id, &definition))
                .with_identifier(id.to_string())),
            None => Ok(gone(rid, id)),
        }
    }

    async fn write(
        &self,
        session: &Session,
        ctx: &OperationContext,
        rid: &ResourceId,
        id: &SqlRoleDefinitionId,
        config: &SqlRoleDefinitionConfig,
    ) -> ProviderResult<State> {
        mutate(
            ctx,
            id,
            session
                .clients
                .rbacs
                .sql_role_definition_create_update(id, &config.parameters()),
        )
        .await?;
        let state = self.read_id(session, ctx, rid, id).await?;
        refreshed(state, ctx, id)
    }
}

#[async_trait]
impl ResourceHandler for CosmosDbSqlRoleDefinition {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        sql_role_definition_schema()
    }

    async fn create(
        &self,
        session: &Session,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let config = SqlRoleDefinitionConfig::from_attributes(&resource.attributes)?;
        let id = config.id(&session.subscription_id);

        let _guard = lock_account(ctx, &config.account_name).await?;
        ensure_absent(
            ctx,
            TYPE_NAME,
            &id,
            session.clients.rbacs.sql_role_definition_get(&id),
        )
        .await?;
        self.write(session, ctx, &resource.id, &id, &config).await
    }

    async fn read(
        &self,
        session: &Session,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<State> {
        let definition_id =
            SqlRoleDefinitionId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        self.read_id(session, ctx, id, &definition_id).await
    }

    async fn update(
        &self,
        session: &Session,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
        _from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let definition_id =
            SqlRoleDefinitionId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        let mut config = SqlRoleDefinitionConfig::from_attributes(&to.attributes)?;
        config.role_definition_id = definition_id.role_definition_id.clone();

        let _guard = lock_account(ctx, &definition_id.database_account_name).await?;
        self.write(session, ctx, id, &definition_id, &config).await
    }

    async fn delete(
        &self,
        session: &Session,
        ctx: &OperationContext,
        identifier: &str,
    ) -> ProviderResult<()> {
        let id = SqlRoleDefinitionId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        let _guard = lock_account(ctx, &id.database_account_name).await?;
        delete_tolerant(
            ctx,
            &id,
            session.clients.rbacs.sql_role_definition_delete(&id),
        )
        .await
    }

    async fn exists(
        &self,
        session: &Session,
        ctx: &OperationContext,
        identifier: &str,
    ) -> ProviderResult<bool> {
        let id = SqlRoleDefinitionId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        let definition =
            call_optional(ctx, &id, session.clients.rbacs.sql_role_definition_get(&id)).await?;
        Ok(definition.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use stratus_core::provider::{ErrorKind, Operation};

    use crate::resources::testing::{ACCOUNT, ctx, resource, session};
    use crate::sdk::fake::{FakeArm, LroMode};

    const DEFINITION: &str = "c3ce1661-d0b9-4476-b0ba-0058c60a0d5e";

    fn permissions(actions: &[&[&str]]) -> Value {
        Value::List(
            actions
                .iter()
                .map(|a| fields::block([("data_actions", Value::string_list(a.iter().copied()))]))
                .collect(),
        )
    }

    fn definition(actions: &[&[&str]]) -> Resource {
        resource(
            TYPE_NAME,
            vec![
                ("role_definition_id", Value::string(DEFINITION)),
                ("resource_group_name", Value::string("rg1")),
                ("account_name", Value::string("acct1")),
                ("name", Value::string("acctestsqlrole")),
                ("type", Value::string("CustomRole")),
                ("assignable_scopes", Value::string_list([ACCOUNT])),
                ("permissions", permissions(actions)),
            ],
        )
    }

    #[test]
    fn permissions_round_trip() {
        let mut attrs = HashMap::new();
        attrs.insert(
            "permissions".to_string(),
            permissions(&[&["a", "b"], &["c"]]),
        );
        let expanded = expand_permissions(&Fields::new(&attrs));
        assert_eq!(flatten_permissions(Some(&expanded)), attrs["permissions"]);
    }

    #[test]
    fn flatten_missing_permissions_is_empty() {
        assert_eq!(flatten_permissions(None), Value::List(vec![]));
        assert_eq!(flatten_permissions(Some(&[])), Value::List(vec![]));
    }

    #[test]
    fn flatten_sorts_data_actions() {
        let permission = Permission {
            data_actions: Some(vec!["z".to_string(), "a".to_string()]),
            not_data_actions: None,
        };
        assert_eq!(
            flatten_permissions(Some(&[permission])),
            permissions(&[&["a", "z"]])
        );
    }

    #[test]
    fn type_defaults_to_custom_role() {
        let mut desired = definition(&[&["a"]]);
        desired.attributes.remove("type");
        desired.attributes.remove("role_definition_id");
        let config = SqlRoleDefinitionConfig::from_attributes(&desired.attributes).unwrap();
        assert_eq!(config.role_type, RoleDefinitionType::CustomRole);
        assert!(uuid::Uuid::parse_str(&config.role_definition_id).is_ok());
    }

    #[tokio::test]
    async fn lifecycle() {
        let fake = FakeArm::new().with_lro(LroMode::Async);
        let session = session(&fake);
        let desired = definition(&[&[
            "Microsoft.DocumentDB/databaseAccounts/sqlDatabases/containers/items/read",
            "Microsoft.DocumentDB/databaseAccounts/readMetadata",
        ]]);

        let from = CosmosDbSqlRoleDefinition
            .create(&session, &ctx(Operation::Create), &desired)
            .await
            .unwrap();
        let identifier = format!("{}/sqlRoleDefinitions/{}", ACCOUNT, DEFINITION);
        assert_eq!(from.identifier.as_deref(), Some(identifier.as_str()));
        assert_eq!(
            from.attributes["permissions"],
            permissions(&[&[
                "Microsoft.DocumentDB/databaseAccounts/readMetadata",
                "Microsoft.DocumentDB/databaseAccounts/sqlDatabases/containers/items/read",
            ]])
        );

        let err = CosmosDbSqlRoleDefinition
            .create(&session, &ctx(Operation::Create), &desired)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);

        let mut renamed = desired.clone();
        renamed
            .attributes
            .insert("name".to_string(), Value::string("renamed"));
        let state = CosmosDbSqlRoleDefinition
            .update(
                &session,
                &ctx(Operation::Update),
                &from.id,
                &identifier,
                &from,
                &renamed,
            )
            .await
            .unwrap();
        assert_eq!(state.attributes["name"], Value::string("renamed"));
        assert_eq!(fake.count(Method::PUT, DEFINITION), 2);

        for _ in 0..2 {
            CosmosDbSqlRoleDefinition
                .delete(&session, &ctx(Operation::Delete), &identifier)
                .await
                .unwrap();
        }
    }
}
