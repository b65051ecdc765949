//! Resource handlers
//!
//! One module per resource type. A handler parses its typed configuration
//! from an already validated attribute map, talks to the service through
//! [`Session`], drives every long-running operation to completion within
//! the [`OperationContext`] it is given, and reads the result back.

pub mod cosmosdb_sql_database;
pub mod cosmosdb_sql_function;
pub mod cosmosdb_sql_role_assignment;
pub mod cosmosdb_sql_role_definition;
pub mod cosmosdb_sql_stored_procedure;
pub mod cosmosdb_sql_trigger;
pub mod hdinsight_hadoop_cluster;
pub mod mssql_server_transparent_data_encryption;

use std::fmt::Display;
use std::future::Future;

use async_trait::async_trait;
use stratus_core::locks::{self, NamedLockGuard};
use stratus_core::provider::{ProviderError, ProviderResult};
use stratus_core::resource::{Resource, ResourceId, State};
use stratus_core::schema::ResourceSchema;
use stratus_core::timeouts::{OperationContext, ResourceTimeouts};

use crate::sdk::{ApiError, Clients, Poller};

/// Lock kind shared by everything that mutates a database account's RBAC
pub const COSMOS_DB_ACCOUNT_RESOURCE_NAME: &str = "azurerm_cosmosdb_account";

/// Subscription and service clients a handler acts through
#[derive(Debug, Clone)]
pub struct Session {
    pub clients: Clients,
    pub subscription_id: String,
}

/// CRUD for one resource type
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> ResourceSchema;

    fn timeouts(&self) -> ResourceTimeouts {
        ResourceTimeouts::default()
    }

    /// Create the remote object and return its state
    ///
    /// Fails with `AlreadyExists` when the object is already there.
    async fn create(
        &self,
        session: &Session,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> ProviderResult<State>;

    /// Read the remote object; gone objects yield `State::not_found`
    async fn read(
        &self,
        session: &Session,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<State>;

    async fn update(
        &self,
        session: &Session,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State>;

    /// Delete the remote object; an object that is already gone is not an error
    async fn delete(
        &self,
        session: &Session,
        ctx: &OperationContext,
        identifier: &str,
    ) -> ProviderResult<()>;

    /// Whether the remote object exists
    async fn exists(
        &self,
        session: &Session,
        ctx: &OperationContext,
        identifier: &str,
    ) -> ProviderResult<bool>;
}

/// All resource handlers of this provider
pub fn handlers() -> Vec<Box<dyn ResourceHandler>> {
    vec![
        Box::new(cosmosdb_sql_database::CosmosDbSqlDatabase),
        Box::new(cosmosdb_sql_trigger::CosmosDbSqlTrigger),
        Box::new(cosmosdb_sql_stored_procedure::CosmosDbSqlStoredProcedure),
        Box::new(cosmosdb_sql_function::CosmosDbSqlFunction),
        Box::new(cosmosdb_sql_role_assignment::CosmosDbSqlRoleAssignment),
        Box::new(cosmosdb_sql_role_definition::CosmosDbSqlRoleDefinition),
        Box::new(mssql_server_transparent_data_encryption::MsSqlServerTransparentDataEncryption),
        Box::new(hdinsight_hadoop_cluster::HdInsightHadoopCluster),
    ]
}

// =============================================================================
// Helpers
// =============================================================================

/// Attach the operation and remote identifier to an error
pub(crate) fn tag(
    err: impl Into<ProviderError>,
    ctx: &OperationContext,
    identifier: &(dyn Display + Sync),
) -> ProviderError {
    err.into()
        .during(ctx.operation())
        .with_identifier(identifier.to_string())
}

/// Run one client call within the deadline of `ctx`
pub(crate) async fn call<T, F>(
    ctx: &OperationContext,
    identifier: &(dyn Display + Sync),
    fut: F,
) -> ProviderResult<T>
where
    F: Future<Output = Result<T, ApiError>>,
{
    match ctx.run(fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(tag(e, ctx, identifier)),
        Err(interrupted) => Err(tag(interrupted, ctx, identifier)),
    }
}

/// Like [`call`], mapping a 404 to `None`
pub(crate) async fn call_optional<T, F>(
    ctx: &OperationContext,
    identifier: &(dyn Display + Sync),
    fut: F,
) -> ProviderResult<Option<T>>
where
    F: Future<Output = Result<T, ApiError>>,
{
    match call(ctx, identifier, fut).await {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Drive `poller` to a terminal state
pub(crate) async fn wait(
    ctx: &OperationContext,
    identifier: &(dyn Display + Sync),
    poller: Poller,
) -> ProviderResult<()> {
    let outcome = poller.wait(ctx).await.map_err(|e| tag(e, ctx, identifier))?;
    outcome.into_result().map_err(|e| tag(e, ctx, identifier))
}

/// Issue a mutating call and wait for it to finish
pub(crate) async fn mutate<F>(
    ctx: &OperationContext,
    identifier: &(dyn Display + Sync),
    fut: F,
) -> ProviderResult<()>
where
    F: Future<Output = Result<Poller, ApiError>>,
{
    let poller = call(ctx, identifier, fut).await?;
    wait(ctx, identifier, poller).await
}

/// Fail with `AlreadyExists` unless `probe` comes back 404
///
/// Any other probe failure is returned as-is; it never means "go ahead".
pub(crate) async fn ensure_absent<T, F>(
    ctx: &OperationContext,
    resource_type: &str,
    identifier: &(dyn Display + Sync),
    probe: F,
) -> ProviderResult<()>
where
    F: Future<Output = Result<T, ApiError>>,
{
    match call_optional(ctx, identifier, probe).await? {
        Some(_) => Err(ProviderError::already_exists(resource_type, identifier.to_string())
            .during(ctx.operation())),
        None => Ok(()),
    }
}

/// Delete, treating an object that is already gone as deleted
pub(crate) async fn delete_tolerant<F>(
    ctx: &OperationContext,
    identifier: &(dyn Display + Sync),
    fut: F,
) -> ProviderResult<()>
where
    F: Future<Output = Result<Poller, ApiError>>,
{
    match call(ctx, identifier, fut).await {
        Ok(poller) => wait(ctx, identifier, poller).await,
        Err(e) if e.is_not_found() => {
            log::warn!("{} was already gone", identifier);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// State for an object that disappeared remotely
pub(crate) fn gone(id: &ResourceId, identifier: &(dyn Display + Sync)) -> State {
    log::info!("{} was not found - removing from state", identifier);
    State::not_found(id.clone())
}

/// The state read back after a mutation; the object has to be there
pub(crate) fn refreshed(
    state: State,
    ctx: &OperationContext,
    identifier: &(dyn Display + Sync),
) -> ProviderResult<State> {
    if state.exists {
        Ok(state)
    } else {
        Err(tag(
            ProviderError::not_found("the object could not be read back after it was written"),
            ctx,
            identifier,
        ))
    }
}

/// Serialize mutations under one database account
pub(crate) async fn lock_account(
    ctx: &OperationContext,
    account_name: &str,
) -> ProviderResult<NamedLockGuard> {
    ctx.run(locks::by_name(account_name, COSMOS_DB_ACCOUNT_RESOURCE_NAME))
        .await
        .map_err(|e| ProviderError::from(e).during(ctx.operation()))
}
