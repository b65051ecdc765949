//! azurerm_cosmosdb_sql_database

use std::collections::HashMap;

use async_trait::async_trait;
use stratus_core::provider::{ErrorKind, ProviderError, ProviderResult};
use stratus_core::resource::{Resource, ResourceId, State, Value};
use stratus_core::schema::ResourceSchema;
use stratus_core::timeouts::OperationContext;

use super::{
    ResourceHandler, Session, call, call_optional, delete_tolerant, ensure_absent, gone, mutate,
    refreshed, tag,
};
use crate::common::is_serverless_capacity_mode;
use crate::common::throughput::{
    Throughput, check_for_change_from_autoscale_and_manual, flatten_throughput,
    has_throughput_change,
};
use crate::fields::Fields;
use crate::ids::SqlDatabaseId;
use crate::schemas::cosmosdb::sql_database_schema;
use crate::sdk::cosmosdb::{
    SqlDatabaseCreateUpdateParameters, SqlDatabaseCreateUpdateProperties, SqlDatabaseResource,
};

const TYPE_NAME: &str = "azurerm_cosmosdb_sql_database";

/// Typed configuration of a SQL database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlDatabaseConfig {
    pub name: String,
    pub resource_group_name: String,
    pub account_name: String,
    pub throughput: Throughput,
}

impl SqlDatabaseConfig {
    pub fn from_attributes(attrs: &HashMap<String, Value>) -> ProviderResult<Self> {
        let fields = Fields::new(attrs);
        Ok(Self {
            name: fields.required_str("name")?.to_string(),
            resource_group_name: fields.required_str("resource_group_name")?.to_string(),
            account_name: fields.required_str("account_name")?.to_string(),
            throughput: Throughput::from_fields(&fields),
        })
    }

    pub fn id(&self, subscription_id: &str) -> SqlDatabaseId {
        SqlDatabaseId::new(
            subscription_id,
            &self.resource_group_name,
            &self.account_name,
            &self.name,
        )
    }

    fn parameters(&self, with_options: bool) -> SqlDatabaseCreateUpdateParameters {
        SqlDatabaseCreateUpdateParameters {
            properties: SqlDatabaseCreateUpdateProperties {
                resource: SqlDatabaseResource {
                    id: self.name.clone(),
                },
                options: if with_options {
                    self.throughput.expand_options()
                } else {
                    None
                },
            },
        }
    }
}

pub struct CosmosDbSqlDatabase;

/// Read a database and the throughput it is provisioned with
///
/// Shared with the data source, which treats a missing database as an error.
pub(crate) async fn read_database(
    session: &Session,
    ctx: &OperationContext,
    id: &SqlDatabaseId,
) -> ProviderResult<Option<HashMap<String, Value>>> {
    let cosmos = &session.clients.cosmos;
    let Some(database) = call_optional(ctx, id, cosmos.sql_database_get(id)).await? else {
        return Ok(None);
    };
    let account = call(ctx, id, cosmos.database_accounts_get(&id.account())).await?;

    let name = database
        .properties
        .as_ref()
        .and_then(|p| p.resource.as_ref())
        .map(|r| r.id.clone())
        .unwrap_or_else(|| id.sql_database_name.clone());

    let mut attrs = HashMap::new();
    attrs.insert("name".to_string(), Value::String(name));
    attrs.insert(
        "resource_group_name".to_string(),
        Value::string(&id.resource_group_name),
    );
    attrs.insert(
        "account_name".to_string(),
        Value::string(&id.database_account_name),
    );

    let throughput = if is_serverless_capacity_mode(&account) {
        None
    } else {
        call_optional(ctx, id, cosmos.sql_database_throughput_get(id)).await?
    };
    flatten_throughput(throughput.as_ref(), &mut attrs);

    Ok(Some(attrs))
}

impl CosmosDbSqlDatabase {
    async fn read_id(
        &self,
        session: &Session,
        ctx: &OperationContext,
        rid: &ResourceId,
        id: &SqlDatabaseId,
    ) -> ProviderResult<State> {
        match read_database(session, ctx, id).await? {
            Some(attrs) => Ok(State::existing(rid.clone(), attrs).with_identifier(id.to_string())),
            None => Ok(gone(rid, id)),
        }
    }
}

#[async_trait]
impl ResourceHandler for CosmosDbSqlDatabase {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        sql_database_schema()
    }

    async fn create(
        &self,
        session: &Session,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let config = SqlDatabaseConfig::from_attributes(&resource.attributes)?;
        let id = config.id(&session.subscription_id);
        let cosmos = &session.clients.cosmos;

        ensure_absent(ctx, TYPE_NAME, &id, cosmos.sql_database_get(&id)).await?;
        mutate(
            ctx,
            &id,
            cosmos.sql_database_create_update(&id, &config.parameters(true)),
        )
        .await?;

        let state = self.read_id(session, ctx, &resource.id, &id).await?;
        refreshed(state, ctx, &id)
    }

    async fn read(
        &self,
        session: &Session,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<State> {
        let database_id = SqlDatabaseId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        self.read_id(session, ctx, id, &database_id).await
    }

    async fn update(
        &self,
        session: &Session,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let config = SqlDatabaseConfig::from_attributes(&to.attributes)?;
        let database_id = SqlDatabaseId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        let cosmos = &session.clients.cosmos;

        let previous = Throughput::from_fields(&Fields::new(&from.attributes));
        check_for_change_from_autoscale_and_manual(&previous, &config.throughput)
            .map_err(|e| tag(e, ctx, &database_id))?;

        mutate(
            ctx,
            &database_id,
            cosmos.sql_database_create_update(&database_id, &config.parameters(false)),
        )
        .await?;

        if has_throughput_change(&previous, &config.throughput) {
            let parameters = config.throughput.expand_update();
            match call(
                ctx,
                &database_id,
                cosmos.sql_database_throughput_update(&database_id, &parameters),
            )
            .await
            {
                Ok(poller) => super::wait(ctx, &database_id, poller).await?,
                Err(e) if e.is_not_found() => {
                    return Err(tag(
                        ProviderError::new(
                            ErrorKind::Remote,
                            "throughput can only be changed on a database that was created with throughput",
                        )
                        .with_cause(e),
                        ctx,
                        &database_id,
                    ));
                }
                Err(e) => return Err(e),
            }
        }

        let state = self.read_id(session, ctx, id, &database_id).await?;
        refreshed(state, ctx, &database_id)
    }

    async fn delete(
        &self,
        session: &Session,
        ctx: &OperationContext,
        identifier: &str,
    ) -> ProviderResult<()> {
        let id = SqlDatabaseId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        delete_tolerant(ctx, &id, session.clients.cosmos.sql_database_delete(&id)).await
    }

    async fn exists(
        &self,
        session: &Session,
        ctx: &OperationContext,
        identifier: &str,
    ) -> ProviderResult<bool> {
        let id = SqlDatabaseId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        let database = call_optional(ctx, &id, session.clients.cosmos.sql_database_get(&id)).await?;
        Ok(database.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use reqwest::Method;
    use stratus_core::provider::Operation;

    use crate::fields::single_block;
    use crate::resources::testing::{ACCOUNT, ctx, insert_account, resource, session};
    use crate::sdk::HttpResponse;
    use crate::sdk::fake::{FakeArm, LroMode};

    fn database(throughput: Option<(&'static str, Value)>) -> Resource {
        let mut attrs = vec![
            ("name", Value::string("db1")),
            ("resource_group_name", Value::string("rg1")),
            ("account_name", Value::string("acct1")),
        ];
        attrs.extend(throughput);
        resource(TYPE_NAME, attrs)
    }

    fn db_path() -> String {
        format!("{}/sqlDatabases/db1", ACCOUNT)
    }

    #[tokio::test]
    async fn create_with_manual_throughput() {
        let fake = FakeArm::new();
        insert_account(&fake, false);
        let session = session(&fake);

        let state = CosmosDbSqlDatabase
            .create(
                &session,
                &ctx(Operation::Create),
                &database(Some(("throughput", Value::Int(400)))),
            )
            .await
            .unwrap();

        assert_eq!(state.identifier.as_deref(), Some(db_path().as_str()));
        assert_eq!(state.attributes["throughput"], Value::Int(400));
        assert_eq!(state.attributes["autoscale_settings"], Value::List(vec![]));
        assert_eq!(state.attributes["name"], Value::string("db1"));
    }

    #[tokio::test]
    async fn create_with_autoscale_keeps_only_the_ceiling() {
        let fake = FakeArm::new().with_lro(LroMode::Async);
        insert_account(&fake, false);
        let session = session(&fake);
        let autoscale = single_block([("max_throughput", Value::Int(4000))]);

        let state = CosmosDbSqlDatabase
            .create(
                &session,
                &ctx(Operation::Create),
                &database(Some(("autoscale_settings", autoscale.clone()))),
            )
            .await
            .unwrap();

        assert!(!state.attributes.contains_key("throughput"));
        assert_eq!(state.attributes["autoscale_settings"], autoscale);
    }

    #[tokio::test]
    async fn create_twice_is_already_exists() {
        let fake = FakeArm::new();
        insert_account(&fake, false);
        let session = session(&fake);
        let db = database(None);

        CosmosDbSqlDatabase
            .create(&session, &ctx(Operation::Create), &db)
            .await
            .unwrap();
        let err = CosmosDbSqlDatabase
            .create(&session, &ctx(Operation::Create), &db)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::AlreadyExists);
        assert_eq!(err.identifier.as_deref(), Some(db_path().as_str()));
        assert_eq!(fake.count(Method::PUT, "/sqlDatabases/db1"), 1);
    }

    #[tokio::test]
    async fn failed_existence_probe_stops_create() {
        let fake = FakeArm::new();
        insert_account(&fake, false);
        fake.respond(Method::GET, db_path(), HttpResponse::new(500));
        let session = session(&fake);

        let err = CosmosDbSqlDatabase
            .create(&session, &ctx(Operation::Create), &database(None))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Remote);
        assert_eq!(fake.count(Method::PUT, "/sqlDatabases/db1"), 0);
    }

    #[tokio::test]
    async fn serverless_account_skips_throughput_read() {
        let fake = FakeArm::new();
        insert_account(&fake, true);
        let session = session(&fake);

        let state = CosmosDbSqlDatabase
            .create(&session, &ctx(Operation::Create), &database(None))
            .await
            .unwrap();

        assert_eq!(fake.count(Method::GET, "/throughputSettings/default"), 0);
        assert!(!state.attributes.contains_key("throughput"));
        assert_eq!(state.attributes["autoscale_settings"], Value::List(vec![]));
    }

    #[tokio::test]
    async fn missing_throughput_settings_read_as_empty() {
        let fake = FakeArm::new();
        insert_account(&fake, false);
        let session = session(&fake);

        let state = CosmosDbSqlDatabase
            .create(&session, &ctx(Operation::Create), &database(None))
            .await
            .unwrap();

        assert_eq!(fake.count(Method::GET, "/throughputSettings/default"), 1);
        assert!(!state.attributes.contains_key("throughput"));
    }

    #[tokio::test]
    async fn update_changes_throughput() {
        let fake = FakeArm::new();
        insert_account(&fake, false);
        let session = session(&fake);
        let from = CosmosDbSqlDatabase
            .create(
                &session,
                &ctx(Operation::Create),
                &database(Some(("throughput", Value::Int(400)))),
            )
            .await
            .unwrap();

        let state = CosmosDbSqlDatabase
            .update(
                &session,
                &ctx(Operation::Update),
                &from.id,
                &db_path(),
                &from,
                &database(Some(("throughput", Value::Int(700)))),
            )
            .await
            .unwrap();

        assert_eq!(state.attributes["throughput"], Value::Int(700));
        assert_eq!(fake.count(Method::PUT, "/throughputSettings/default"), 1);
    }

    #[tokio::test]
    async fn update_rejects_switch_to_autoscale() {
        let fake = FakeArm::new();
        insert_account(&fake, false);
        let session = session(&fake);
        let from = CosmosDbSqlDatabase
            .create(
                &session,
                &ctx(Operation::Create),
                &database(Some(("throughput", Value::Int(400)))),
            )
            .await
            .unwrap();
        let puts = fake.count(Method::PUT, "");

        let err = CosmosDbSqlDatabase
            .update(
                &session,
                &ctx(Operation::Update),
                &from.id,
                &db_path(),
                &from,
                &database(Some((
                    "autoscale_settings",
                    single_block([("max_throughput", Value::Int(4000))]),
                ))),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(fake.count(Method::PUT, ""), puts);
    }

    #[tokio::test]
    async fn throughput_on_database_created_without_it() {
        let fake = FakeArm::new();
        insert_account(&fake, false);
        let session = session(&fake);
        let from = CosmosDbSqlDatabase
            .create(&session, &ctx(Operation::Create), &database(None))
            .await
            .unwrap();
        fake.respond(
            Method::PUT,
            format!("{}/throughputSettings/default", db_path()),
            HttpResponse::new(404),
        );

        let err = CosmosDbSqlDatabase
            .update(
                &session,
                &ctx(Operation::Update),
                &from.id,
                &db_path(),
                &from,
                &database(Some(("throughput", Value::Int(400)))),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Remote);
        assert!(err.message.contains("created with throughput"));
    }

    #[tokio::test]
    async fn delete_twice_succeeds() {
        let fake = FakeArm::new().with_lro(LroMode::Async);
        insert_account(&fake, false);
        let session = session(&fake);
        CosmosDbSqlDatabase
            .create(&session, &ctx(Operation::Create), &database(None))
            .await
            .unwrap();

        for _ in 0..2 {
            CosmosDbSqlDatabase
                .delete(&session, &ctx(Operation::Delete), &db_path())
                .await
                .unwrap();
        }
        let state = CosmosDbSqlDatabase
            .read(
                &session,
                &ctx(Operation::Read),
                &ResourceId::new(TYPE_NAME, "test"),
                &db_path(),
            )
            .await
            .unwrap();
        assert!(!state.exists);
        assert!(
            !CosmosDbSqlDatabase
                .exists(&session, &ctx(Operation::Read), &db_path())
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn read_rejects_malformed_identifier() {
        let fake = FakeArm::new();
        let err = CosmosDbSqlDatabase
            .read(
                &session(&fake),
                &ctx(Operation::Read),
                &ResourceId::new(TYPE_NAME, "test"),
                "/subscriptions/x/resourceGroups/rg1",
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidIdentifier);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_operation_times_out() {
        let fake = FakeArm::new().with_lro(LroMode::Never);
        insert_account(&fake, false);
        let session = session(&fake);
        let ctx = OperationContext::new(
            Operation::Create,
            Duration::from_secs(120),
            Duration::from_secs(10),
        );
        let start = tokio::time::Instant::now();

        let err = CosmosDbSqlDatabase
            .create(&session, &ctx, &database(None))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Timeout);
        assert_eq!(err.operation, Some(Operation::Create));
        assert!(start.elapsed() <= Duration::from_secs(120));
    }
}
