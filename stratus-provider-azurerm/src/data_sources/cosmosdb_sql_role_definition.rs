//! data "azurerm_cosmosdb_sql_role_definition"

use async_trait::async_trait;
use stratus_core::provider::ProviderResult;
use stratus_core::resource::{Resource, State};
use stratus_core::schema::ResourceSchema;
use stratus_core::timeouts::OperationContext;

use super::{DataSourceHandler, missing};
use crate::fields::Fields;
use crate::ids::SqlRoleDefinitionId;
use crate::resources::cosmosdb_sql_role_definition::flatten_role_definition;
use crate::resources::{Session, call_optional};
use crate::schemas::cosmosdb::sql_role_definition_data_source_schema;

pub struct CosmosDbSqlRoleDefinitionDataSource;

#[async_trait]
impl DataSourceHandler for CosmosDbSqlRoleDefinitionDataSource {
    fn type_name(&self) -> &'static str {
        "azurerm_cosmosdb_sql_role_definition"
    }

    fn schema(&self) -> ResourceSchema {
        sql_role_definition_data_source_schema()
    }

    async fn read(
        &self,
        session: &Session,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let fields = Fields::new(&resource.attributes);
        let id = SqlRoleDefinitionId::new(
            &session.subscription_id,
            fields.required_str("resource_group_name")?,
            fields.required_str("account_name")?,
            fields.required_str("role_definition_id")?,
        );

        let Some(definition) = call_optional(
            ctx,
            &id,
            session.clients.rbacs.sql_role_definition_get(&id),
        )
        .await?
        else {
            return Err(missing(ctx, "SQL role definition", &id));
        };

        let attrs = flatten_role_definition(&id, &definition);
        Ok(State::existing(resource.id.clone(), attrs).with_identifier(id.to_string()))
    }
}
