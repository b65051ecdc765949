//! azurerm_cosmosdb_sql_stored_procedure

use std::collections::HashMap;

use async_trait::async_trait;
use stratus_core::provider::ProviderResult;
use stratus_core::resource::{Resource, ResourceId, State, Value};
use stratus_core::schema::ResourceSchema;
use stratus_core::timeouts::OperationContext;

use super::{
    ResourceHandler, Session, call_optional, delete_tolerant, ensure_absent, gone, mutate,
    refreshed, tag,
};
use crate::fields::{Fields, string_or_empty};
use crate::ids::{ContainerId, StoredProcedureId};
use crate::schemas::cosmosdb::sql_stored_procedure_schema;
use crate::sdk::cosmosdb::{SqlStoredProcedureCreateUpdateParameters, SqlStoredProcedureResource};

const TYPE_NAME: &str = "azurerm_cosmosdb_sql_stored_procedure";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStoredProcedureConfig {
    pub name: String,
    pub resource_group_name: String,
    pub account_name: String,
    pub database_name: String,
    pub container_name: String,
    pub body: String,
}

impl SqlStoredProcedureConfig {
    pub fn from_attributes(attrs: &HashMap<String, Value>) -> ProviderResult<Self> {
        let fields = Fields::new(attrs);
        Ok(Self {
            name: fields.required_str("name")?.to_string(),
            resource_group_name: fields.required_str("resource_group_name")?.to_string(),
            account_name: fields.required_str("account_name")?.to_string(),
            database_name: fields.required_str("database_name")?.to_string(),
            container_name: fields.required_str("container_name")?.to_string(),
            body: fields.required_str("body")?.to_string(),
        })
    }

    pub fn id(&self, subscription_id: &str) -> StoredProcedureId {
        ContainerId::new(
            subscription_id,
            &self.resource_group_name,
            &self.account_name,
            &self.database_name,
            &self.container_name,
        )
        .stored_procedure(&self.name)
    }
}

pub struct CosmosDbSqlStoredProcedure;

impl CosmosDbSqlStoredProcedure {
    async fn read_id(
        &self,
        session: &Session,
        ctx: &OperationContext,
        rid: &ResourceId,
        id: &StoredProcedureId,
    ) -> ProviderResult<State> {
        let Some(procedure) =
            call_optional(ctx, id, session.clients.cosmos.sql_stored_procedure_get(id)).await?
        else {
            return Ok(gone(rid, id));
        };

        let mut attrs: HashMap<String, Value> = [
            ("name", &id.stored_procedure_name),
            ("resource_group_name", &id.resource_group_name),
            ("account_name", &id.database_account_name),
            ("database_name", &id.sql_database_name),
            ("container_name", &id.container_name),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::string(v)))
        .collect();
        if let Some(resource) = procedure.resource() {
            attrs.insert("body".to_string(), string_or_empty(resource.body.as_deref()));
        }
        Ok(State::existing(rid.clone(), attrs).with_identifier(id.to_string()))
    }

    async fn write(
        &self,
        session: &Session,
        ctx: &OperationContext,
        rid: &ResourceId,
        config: &SqlStoredProcedureConfig,
    ) -> ProviderResult<State> {
        let id = config.id(&session.subscription_id);
        let parameters = SqlStoredProcedureCreateUpdateParameters::new(SqlStoredProcedureResource {
            id: config.name.clone(),
            body: Some(config.body.clone()),
        });
        mutate(
            ctx,
            &id,
            session
                .clients
                .cosmos
                .sql_stored_procedure_create_update(&id, &parameters),
        )
        .await?;
        let state = self.read_id(session, ctx, rid, &id).await?;
        refreshed(state, ctx, &id)
    }
}

#[async_trait]
impl ResourceHandler for CosmosDbSqlStoredProcedure {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        sql_stored_procedure_schema()
    }

    async fn create(
        &self,
        session: &Session,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let config = SqlStoredProcedureConfig::from_attributes(&resource.attributes)?;
        let id = config.id(&session.subscription_id);
        ensure_absent(
            ctx,
            TYPE_NAME,
            &id,
            session.clients.cosmos.sql_stored_procedure_get(&id),
        )
        .await?;
        self.write(session, ctx, &resource.id, &config).await
    }

    async fn read(
        &self,
        session: &Session,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<State> {
        let procedure_id =
            StoredProcedureId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        self.read_id(session, ctx, id, &procedure_id).await
    }

    async fn update(
        &self,
        session: &Session,
        ctx: &OperationContext,
        id: &ResourceId,
        _identifier: &str,
        _from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let config = SqlStoredProcedureConfig::from_attributes(&to.attributes)?;
        self.write(session, ctx, id, &config).await
    }

    async fn delete(
        &self,
        session: &Session,
        ctx: &OperationContext,
        identifier: &str,
    ) -> ProviderResult<()> {
        let id = StoredProcedureId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        delete_tolerant(
            ctx,
            &id,
            session.clients.cosmos.sql_stored_procedure_delete(&id),
        )
        .await
    }

    async fn exists(
        &self,
        session: &Session,
        ctx: &OperationContext,
        identifier: &str,
    ) -> ProviderResult<bool> {
        let id = StoredProcedureId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        let procedure =
            call_optional(ctx, &id, session.clients.cosmos.sql_stored_procedure_get(&id)).await?;
        Ok(procedure.is_some())
    }
}
