//! azurerm_cosmosdb_sql_function

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
use crate::ids::{ContainerId, UserDefinedFunctionId};
use crate::schemas::cosmosdb::sql_function_schema;
use crate::sdk::cosmosdb::{
    SqlUserDefinedFunctionCreateUpdateParameters, SqlUserDefinedFunctionResource,
};

const TYPE_NAME: &str = "azurerm_cosmosdb_sql_function";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFunctionConfig {
    pub name: String,
    pub container_id: ContainerId,
    pub body: String,
}

impl SqlFunctionConfig {
    pub fn from_attributes(attrs: &HashMap<String, Value>) -> ProviderResult<Self> {
        let fields = Fields::new(attrs);
        Ok(Self {
            name: fields.required_str("name")?.to_string(),
            container_id: ContainerId::parse(fields.required_str("container_id")?)?,
            body: fields.required_str("body")?.to_string(),
        })
    }

    pub fn id(&self) -> UserDefinedFunctionId {
        self.container_id.user_defined_function(&self.name)
    }
}

pub struct CosmosDbSqlFunction;

impl CosmosDbSqlFunction {
    async fn read_id(
        &self,
        session: &Session,
        ctx: &OperationContext,
        rid: &ResourceId,
        id: &UserDefinedFunctionId,
    ) -> ProviderResult<State> {
        let Some(function) = call_optional(
            ctx,
            id,
            session.clients.cosmos.sql_user_defined_function_get(id),
        )
        .await?
        else {
            return Ok(gone(rid, id));
        };

        let mut attrs = HashMap::new();
        attrs.insert(
            "name".to_string(),
            Value::string(&id.user_defined_function_name),
        );
        attrs.insert(
            "container_id".to_string(),
            Value::String(id.container().to_string()),
        );
        if let Some(resource) = function.resource() {
            attrs.insert("body".to_string(), string_or_empty(resource.body.as_deref()));
        }
        Ok(State::existing(rid.clone(), attrs).with_identifier(id.to_string()))
    }

    async fn write(
        &self,
        session: &Session,
        ctx: &OperationContext,
        rid: &ResourceId,
        config: &SqlFunctionConfig,
    ) -> ProviderResult<State> {
        let id = config.id();
        let parameters =
            SqlUserDefinedFunctionCreateUpdateParameters::new(SqlUserDefinedFunctionResource {
                id: config.name.clone(),
                body: Some(config.body.clone()),
            });
        mutate(
            ctx,
            &id,
            session
                .clients
                .cosmos
                .sql_user_defined_function_create_update(&id, &parameters),
        )
        .await?;
        let state = self.read_id(session, ctx, rid, &id).await?;
        refreshed(state, ctx, &id)
    }
}

#[async_trait]
impl ResourceHandler for CosmosDbSqlFunction {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        sql_function_schema()
    }

    async fn create(
        &self,
        session: &Session,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let config = SqlFunctionConfig::from_attributes(&resource.attributes)?;
        let id = config.id();
        ensure_absent(
            ctx,
            TYPE_NAME,
            &id,
            session.clients.cosmos.sql_user_defined_function_get(&id),
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
        let function_id =
            UserDefinedFunctionId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        self.read_id(session, ctx, id, &function_id).await
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
        let config = SqlFunctionConfig::from_attributes(&to.attributes)?;
        self.write(session, ctx, id, &config).await
    }

    async fn delete(
        &self,
        session: &Session,
        ctx: &OperationContext,
        identifier: &str,
    ) -> ProviderResult<()> {
        let id = UserDefinedFunctionId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        delete_tolerant(
            ctx,
            &id,
            session.clients.cosmos.sql_user_defined_function_delete(&id),
        )
        .await
    }

    async fn exists(
        &self,
        session: &Session,
        ctx: &OperationContext,
        identifier: &str,
    ) -> ProviderResult<bool> {
        let id = UserDefinedFunctionId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        let function = call_optional(
            ctx,
            &id,
            session.clients.cosmos.sql_user_defined_function_get(&id),
        )
        .await?;
        Ok(function.is_some())
    }
}
