//! Data source handlers
//!
//! Read-only lookups of objects this provider does not manage. A data source
//! that matches nothing is an error rather than an empty state.

pub mod cosmosdb_restorable_database_accounts;
pub mod cosmosdb_sql_database;
pub mod cosmosdb_sql_role_definition;

use std::fmt::Display;

use async_trait::async_trait;
use stratus_core::provider::{ProviderError, ProviderResult};
use stratus_core::resource::{Resource, State};
use stratus_core::schema::ResourceSchema;
use stratus_core::timeouts::{OperationContext, ResourceTimeouts};

use crate::resources::Session;

#[async_trait]
pub trait DataSourceHandler: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> ResourceSchema;

    fn timeouts(&self) -> ResourceTimeouts {
        ResourceTimeouts::default()
    }

    /// Look up the object described by `resource`'s arguments
    async fn read(
        &self,
        session: &Session,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> ProviderResult<State>;
}

/// All data sources of this provider
pub fn handlers() -> Vec<Box<dyn DataSourceHandler>> {
    vec![
        Box::new(cosmosdb_sql_database::CosmosDbSqlDatabaseDataSource),
        Box::new(cosmosdb_sql_role_definition::CosmosDbSqlRoleDefinitionDataSource),
        Box::new(
            cosmosdb_restorable_database_accounts::CosmosDbRestorableDatabaseAccountsDataSource,
        ),
    ]
}

/// Error for a lookup that found nothing
pub(crate) fn missing(
    ctx: &OperationContext,
    what: &str,
    identifier: &(dyn Display + Sync),
) -> ProviderError {
    ProviderError::not_found(format!("{} was not found", what))
        .during(ctx.operation())
        .with_identifier(identifier.to_string())
}
