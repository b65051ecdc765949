//! azurerm_cosmosdb_sql_trigger

use std::collections::HashMap;

use async_trait::async_trait;
use stratus_core::provider::{ProviderError, ProviderResult};
use stratus_core::resource::{Resource, ResourceId, State, Value};
use stratus_core::schema::ResourceSchema;
use stratus_core::timeouts::OperationContext;

use super::{
    ResourceHandler, Session, call_optional, delete_tolerant, ensure_absent, gone, mutate,
    refreshed, tag,
};
use crate::fields::{Fields, string_or_empty};
use crate::ids::{ContainerId, TriggerId};
use crate::schemas::cosmosdb::sql_trigger_schema;
use crate::sdk::cosmosdb::{
    SqlTriggerCreateUpdateParameters, SqlTriggerResource, TriggerOperation, TriggerType,
};

const TYPE_NAME: &str = "azurerm_cosmosdb_sql_trigger";

fn trigger_type(s: &str) -> Option<TriggerType> {
    match s {
        "Pre" => Some(TriggerType::Pre),
        "Post" => Some(TriggerType::Post),
        _ => None,
    }
}

fn trigger_type_name(t: TriggerType) -> &'static str {
    match t {
        TriggerType::Pre => "Pre",
        TriggerType::Post => "Post",
    }
}

fn trigger_operation(s: &str) -> Option<TriggerOperation> {
    match s {
        "All" => Some(TriggerOperation::All),
        "Create" => Some(TriggerOperation::Create),
        "Update" => Some(TriggerOperation::Update),
        "Delete" => Some(TriggerOperation::Delete),
        "Replace" => Some(TriggerOperation::Replace),
        _ => None,
    }
}

fn trigger_operation_name(op: TriggerOperation) -> &'static str {
    match op {
        TriggerOperation::All => "All",
        TriggerOperation::Create => "Create",
        TriggerOperation::Update => "Update",
        TriggerOperation::Delete => "Delete",
        TriggerOperation::Replace => "Replace",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlTriggerConfig {
    pub name: String,
    pub container_id: ContainerId,
    pub body: String,
    pub operation: TriggerOperation,
    pub trigger_type: TriggerType,
}

impl SqlTriggerConfig {
    pub fn from_attributes(attrs: &HashMap<String, Value>) -> ProviderResult<Self> {
        let fields = Fields::new(attrs);
        let operation = fields.required_str("operation")?;
        let trigger_kind = fields.required_str("type")?;
        Ok(Self {
            name: fields.required_str("name")?.to_string(),
            container_id: ContainerId::parse(fields.required_str("container_id")?)?,
            body: fields.required_str("body")?.to_string(),
            operation: trigger_operation(operation).ok_or_else(|| {
                ProviderError::validation(format!("unknown trigger operation {:?}", operation))
            })?,
            trigger_type: trigger_type(trigger_kind).ok_or_else(|| {
                ProviderError::validation(format!("unknown trigger type {:?}", trigger_kind))
            })?,
        })
    }

    pub fn id(&self) -> TriggerId {
        self.container_id.trigger(&self.name)
    }

    fn parameters(&self) -> SqlTriggerCreateUpdateParameters {
        SqlTriggerCreateUpdateParameters::new(SqlTriggerResource {
            id: self.name.clone(),
            body: Some(self.body.clone()),
            trigger_type: Some(self.trigger_type),
            trigger_operation: Some(self.operation),
        })
    }
}

pub struct CosmosDbSqlTrigger;

impl CosmosDbSqlTrigger {
    async fn read_id(
        &self,
        session: &Session,
        ctx: &OperationContext,
        rid: &ResourceId,
        id: &TriggerId,
    ) -> ProviderResult<State> {
        let Some(trigger) =
            call_optional(ctx, id, session.clients.cosmos.sql_trigger_get(id)).await?
        else {
            return Ok(gone(rid, id));
        };

        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::string(&id.trigger_name));
        attrs.insert(
            "container_id".to_string(),
            Value::String(id.container().to_string()),
        );
        if let Some(resource) = trigger.resource() {
            attrs.insert("body".to_string(), string_or_empty(resource.body.as_deref()));
            attrs.insert(
                "operation".to_string(),
                string_or_empty(resource.trigger_operation.map(trigger_operation_name)),
            );
            attrs.insert(
                "type".to_string(),
                string_or_empty(resource.trigger_type.map(trigger_type_name)),
            );
        }
        Ok(State::existing(rid.clone(), attrs).with_identifier(id.to_string()))
    }

    /// Create and update share the same PUT
    async fn write(
        &self,
        session: &Session,
        ctx: &OperationContext,
        rid: &ResourceId,
        config: &SqlTriggerConfig,
    ) -> ProviderResult<State> {
        let id = config.id();
        mutate(
            ctx,
            &id,
            session
                .clients
                .cosmos
                .sql_trigger_create_update(&id, &config.parameters()),
        )
        .await?;
        let state = self.read_id(session, ctx, rid, &id).await?;
        refreshed(state, ctx, &id)
    }
}

#[async_trait]
impl ResourceHandler for CosmosDbSqlTrigger {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        sql_trigger_schema()
    }

    async fn create(
        &self,
        session: &Session,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let config = SqlTriggerConfig::from_attributes(&resource.attributes)?;
        let id = config.id();
        ensure_absent(ctx, TYPE_NAME, &id, session.clients.cosmos.sql_trigger_get(&id)).await?;
        self.write(session, ctx, &resource.id, &config).await
    }

    async fn read(
        &self,
        session: &Session,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<State> {
        let trigger_id = TriggerId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        self.read_id(session, ctx, id, &trigger_id).await
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
        let config = SqlTriggerConfig::from_attributes(&to.attributes)?;
        self.write(session, ctx, id, &config).await
    }

    async fn delete(
        &self,
        session: &Session,
        ctx: &OperationContext,
        identifier: &str,
    ) -> ProviderResult<()> {
        let id = TriggerId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        delete_tolerant(ctx, &id, session.clients.cosmos.sql_trigger_delete(&id)).await
    }

    async fn exists(
        &self,
        session: &Session,
        ctx: &OperationContext,
        identifier: &str,
    ) -> ProviderResult<bool> {
        let id = TriggerId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        let trigger = call_optional(ctx, &id, session.clients.cosmos.sql_trigger_get(&id)).await?;
        Ok(trigger.is_some())
    }
}
