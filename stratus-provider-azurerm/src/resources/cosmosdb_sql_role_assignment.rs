//! azurerm_cosmosdb_sql_role_assignment
//!
//! Every mutation holds the account lock: the service rejects concurrent
//! RBAC writes against one database account.

use std::collections::HashMap;

use async_trait::async_trait;
use stratus_core::provider::ProviderResult;
use stratus_core::resource::{Resource, ResourceId, State, Value};
use stratus_core::schema::ResourceSchema;
use stratus_core::timeouts::OperationContext;

use super::{
    ResourceHandler, Session, call_optional, delete_tolerant, ensure_absent, gone, lock_account,
    mutate, refreshed, tag,
};
use crate::fields::{Fields, string_or_empty};
use crate::ids::{SqlRoleAssignmentId, SqlRoleDefinitionId};
use crate::schemas::cosmosdb::sql_role_assignment_schema;
use crate::sdk::rbacs::{SqlRoleAssignmentCreateUpdateParameters, SqlRoleAssignmentResource};

const TYPE_NAME: &str = "azurerm_cosmosdb_sql_role_assignment";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlRoleAssignmentConfig {
    /// Generated when the caller leaves it out
    pub name: String,
    pub resource_group_name: String,
    pub account_name: String,
    pub principal_id: String,
    pub role_definition_id: SqlRoleDefinitionId,
    pub scope: String,
}

impl SqlRoleAssignmentConfig {
    pub fn from_attributes(attrs: &HashMap<String, Value>) -> ProviderResult<Self> {
        let fields = Fields::new(attrs);
        Ok(Self {
            name: fields
                .str("name")
                .map(str::to_string)
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            resource_group_name: fields.required_str("resource_group_name")?.to_string(),
            account_name: fields.required_str("account_name")?.to_string(),
            principal_id: fields.required_str("principal_id")?.to_string(),
            role_definition_id: SqlRoleDefinitionId::parse(
                fields.required_str("role_definition_id")?,
            )?,
            scope: fields.required_str("scope")?.to_string(),
        })
    }

    pub fn id(&self, subscription_id: &str) -> SqlRoleAssignmentId {
        SqlRoleAssignmentId::new(
            subscription_id,
            &self.resource_group_name,
            &self.account_name,
            &self.name,
        )
    }

    fn parameters(&self) -> SqlRoleAssignmentCreateUpdateParameters {
        SqlRoleAssignmentCreateUpdateParameters {
            properties: Some(SqlRoleAssignmentResource {
                principal_id: Some(self.principal_id.clone()),
                role_definition_id: Some(self.role_definition_id.to_string()),
                scope: Some(self.scope.clone()),
            }),
        }
    }
}

pub struct CosmosDbSqlRoleAssignment;

impl CosmosDbSqlRoleAssignment {
    async fn read_id(
        &self,
        session: &Session,
        ctx: &OperationContext,
        rid: &ResourceId,
        id: &SqlRoleAssignmentId,
    ) -> ProviderResult<State> {
        let Some(assignment) =
            call_optional(ctx, id, session.clients.rbacs.sql_role_assignment_get(id)).await?
        else {
            return Ok(gone(rid, id));
        };

        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::string(&id.role_assignment_id));
        attrs.insert(
            "resource_group_name".to_string(),
            Value::string(&id.resource_group_name),
        );
        attrs.insert(
            "account_name".to_string(),
            Value::string(&id.database_account_name),
        );
        if let Some(props) = &assignment.properties {
            attrs.insert(
                "principal_id".to_string(),
                string_or_empty(props.principal_id.as_deref()),
            );
            attrs.insert(
                "role_definition_id".to_string(),
                string_or_empty(props.role_definition_id.as_deref()),
            );
            attrs.insert("scope".to_string(), string_or_empty(props.scope.as_deref()));
        }
        Ok(State::existing(rid.clone(), attrs).with_identifier(id.to_string()))
    }

    async fn write(
        &self,
        session: &Session,
        ctx: &OperationContext,
        rid: &ResourceId,
        id: &SqlRoleAssignmentId,
        config: &SqlRoleAssignmentConfig,
    ) -> ProviderResult<State> {
        mutate(
            ctx,
            id,
            session
                .clients
                .rbacs
                .sql_role_assignment_create_update(id, &config.parameters()),
        )
        .await?;
        let state = self.read_id(session, ctx, rid, id).await?;
        refreshed(state, ctx, id)
    }
}

#[async_trait]
impl ResourceHandler for CosmosDbSqlRoleAssignment {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        sql_role_assignment_schema()
    }

    async fn create(
        &self,
        session: &Session,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let config = SqlRoleAssignmentConfig::from_attributes(&resource.attributes)?;
        let id = config.id(&session.subscription_id);

        let _guard = lock_account(ctx, &config.account_name).await?;
        ensure_absent(
            ctx,
            TYPE_NAME,
            &id,
            session.clients.rbacs.sql_role_assignment_get(&id),
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
        let assignment_id =
            SqlRoleAssignmentId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        self.read_id(session, ctx, id, &assignment_id).await
    }

    /// Only the role definition can change in place
    async fn update(
        &self,
        session: &Session,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
        _from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let assignment_id =
            SqlRoleAssignmentId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        let mut config = SqlRoleAssignmentConfig::from_attributes(&to.attributes)?;
        config.name = assignment_id.role_assignment_id.clone();

        let _guard = lock_account(ctx, &assignment_id.database_account_name).await?;
        self.write(session, ctx, id, &assignment_id, &config).await
    }

    async fn delete(
        &self,
        session: &Session,
        ctx: &OperationContext,
        identifier: &str,
    ) -> ProviderResult<()> {
        let id = SqlRoleAssignmentId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        let _guard = lock_account(ctx, &id.database_account_name).await?;
        delete_tolerant(
            ctx,
            &id,
            session.clients.rbacs.sql_role_assignment_delete(&id),
        )
        .await
    }

    async fn exists(
        &self,
        session: &Session,
        ctx: &OperationContext,
        identifier: &str,
    ) -> ProviderResult<bool> {
        let id = SqlRoleAssignmentId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        let assignment =
            call_optional(ctx, &id, session.clients.rbacs.sql_role_assignment_get(&id)).await?;
        Ok(assignment.is_some())
    }
}
