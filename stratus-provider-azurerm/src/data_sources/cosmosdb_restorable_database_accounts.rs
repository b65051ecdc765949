//! data "azurerm_cosmosdb_restorable_database_accounts"
//!
//! Every restorable instance of a database account name in one location.

use async_trait::async_trait;
use stratus_core::provider::ProviderResult;
use stratus_core::resource::{Resource, State, Value};
use stratus_core::schema::ResourceSchema;
use stratus_core::timeouts::OperationContext;

use super::DataSourceHandler;
use crate::fields::{Fields, block, string_or_empty};
use crate::ids::LocationId;
use crate::resources::{Session, call};
use crate::schemas::cosmosdb::restorable_database_accounts_data_source_schema;
use crate::schemas::types::normalize_location;
use crate::sdk::restorables::{RestorableDatabaseAccountGetResult, RestorableLocationResource};

fn flatten_restorable_location(location: &RestorableLocationResource) -> Value {
    block([
        (
            "creation_time",
            string_or_empty(location.creation_time.as_deref()),
        ),
        (
            "deletion_time",
            string_or_empty(location.deletion_time.as_deref()),
        ),
        ("location", string_or_empty(location.location_name.as_deref())),
        (
            "regional_database_account_instance_id",
            string_or_empty(location.regional_database_account_instance_id.as_deref()),
        ),
    ])
}

fn flatten_account(account: &RestorableDatabaseAccountGetResult) -> Value {
    let props = account.properties.as_ref();
    let locations = props
        .and_then(|p| p.restorable_locations.as_deref())
        .unwrap_or_default()
        .iter()
        .map(flatten_restorable_location)
        .collect();
    block([
        ("id", string_or_empty(account.id.as_deref())),
        (
            "api_type",
            string_or_empty(props.and_then(|p| p.api_type.as_deref())),
        ),
        (
            "creation_time",
            string_or_empty(props.and_then(|p| p.creation_time.as_deref())),
        ),
        (
            "deletion_time",
            string_or_empty(props.and_then(|p| p.deletion_time.as_deref())),
        ),
        ("restorable_locations", Value::List(locations)),
    ])
}

pub fn flatten_accounts(accounts: &[RestorableDatabaseAccountGetResult]) -> Value {
    Value::List(accounts.iter().map(flatten_account).collect())
}

pub struct CosmosDbRestorableDatabaseAccountsDataSource;

#[async_trait]
impl DataSourceHandler for CosmosDbRestorableDatabaseAccountsDataSource {
    fn type_name(&self) -> &'static str {
        "azurerm_cosmosdb_restorable_database_accounts"
    }

    fn schema(&self) -> ResourceSchema {
        restorable_database_accounts_data_source_schema()
    }

    /// Matching nothing yields an empty `accounts` list
    async fn read(
        &self,
        session: &Session,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let fields = Fields::new(&resource.attributes);
        let name = fields.required_str("name")?;
        let location = normalize_location(fields.required_str("location")?);
        let location_id = LocationId::new(&session.subscription_id, &location);

        let accounts = call(
            ctx,
            &location_id,
            session
                .clients
                .restorables
                .restorable_database_accounts_list_by_location_complete_matching_predicate(
                    &location_id,
                    |account| account.account_name() == Some(name),
                ),
        )
        .await?;
        log::debug!(
            "{} restorable instance(s) of {} in {}",
            accounts.len(),
            name,
            location
        );

        let mut attrs = resource.attributes.clone();
        attrs.insert("location".to_string(), Value::String(location));
        attrs.insert("accounts".to_string(), flatten_accounts(&accounts));
        let identifier = location_id.restorable_database_account("read");
        Ok(State::existing(resource.id.clone(), attrs).with_identifier(identifier.to_string()))
    }
}
