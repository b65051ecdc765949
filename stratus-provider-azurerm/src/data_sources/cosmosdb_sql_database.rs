//! data "azurerm_cosmosdb_sql_database"

use async_trait::async_trait;
use stratus_core::provider::ProviderResult;
use stratus_core::resource::{Resource, State};
use stratus_core::schema::ResourceSchema;
use stratus_core::timeouts::OperationContext;

use super::{DataSourceHandler, missing};
use crate::fields::Fields;
use crate::ids::SqlDatabaseId;
use crate::resources::Session;
use crate::resources::cosmosdb_sql_database::read_database;
use crate::schemas::cosmosdb::sql_database_data_source_schema;

pub struct CosmosDbSqlDatabaseDataSource;

#[async_trait]
impl DataSourceHandler for CosmosDbSqlDatabaseDataSource {
    fn type_name(&self) -> &'static str {
        "azurerm_cosmosdb_sql_database"
    }

    fn schema(&self) -> ResourceSchema {
        sql_database_data_source_schema()
    }

    async fn read(
        &self,
        session: &Session,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let fields = Fields::new(&resource.attributes);
        let id = SqlDatabaseId::new(
            &session.subscription_id,
            fields.required_str("resource_group_name")?,
            fields.required_str("account_name")?,
            fields.required_str("name")?,
        );

        match read_database(session, ctx, &id).await? {
            Some(attrs) => {
                Ok(State::existing(resource.id.clone(), attrs).with_identifier(id.to_string()))
            }
            None => Err(missing(ctx, "SQL database", &id)),
        }
    }
}
