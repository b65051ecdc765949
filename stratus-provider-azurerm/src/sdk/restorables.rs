//! Restorable Cosmos DB accounts (`Microsoft.DocumentDB`, 2023-04-15)

use serde::{Deserialize, Serialize};

use super::client::ArmClient;
use super::cosmosdb::API_VERSION;
use super::error::ApiError;
use crate::ids::LocationId;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorableLocationResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regional_database_account_instance_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorableDatabaseAccountProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restorable_locations: Option<Vec<RestorableLocationResource>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestorableDatabaseAccountGetResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<RestorableDatabaseAccountProperties>,
}

impl RestorableDatabaseAccountGetResult {
    pub fn account_name(&self) -> Option<&str> {
        self.properties.as_ref()?.account_name.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct RestorablesClient {
    client: ArmClient,
}

impl RestorablesClient {
    pub fn new(client: ArmClient) -> Self {
        Self { client }
    }

    fn path(id: &LocationId) -> String {
        format!("{}/restorableDatabaseAccounts", id)
    }

    pub async fn restorable_database_accounts_list_by_location(
        &self,
        id: &LocationId,
    ) -> Result<Vec<RestorableDatabaseAccountGetResult>, ApiError> {
        self.client.list(&Self::path(id), API_VERSION).await
    }

    /// List every page, keeping only accounts that match `predicate`
    pub async fn restorable_database_accounts_list_by_location_complete_matching_predicate<F>(
        &self,
        id: &LocationId,
        predicate: F,
    ) -> Result<Vec<RestorableDatabaseAccountGetResult>, ApiError>
    where
        F: Fn(&RestorableDatabaseAccountGetResult) -> bool,
    {
        self.client
            .list_matching(&Self::path(id), API_VERSION, predicate)
            .await
    }
}
