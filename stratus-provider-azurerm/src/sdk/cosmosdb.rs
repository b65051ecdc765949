//! Cosmos DB SQL API resources (`Microsoft.DocumentDB`, 2023-04-15)

use serde::{Deserialize, Serialize};

use super::client::ArmClient;
use super::error::ApiError;
use super::lro::Poller;
use crate::ids::{
    DatabaseAccountId, SqlDatabaseId, StoredProcedureId, TriggerId, UserDefinedFunctionId,
};

pub const API_VERSION: &str = "2023-04-15";

// =============================================================================
// Models
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseAccountGetProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<Capability>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseAccountGetResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<DatabaseAccountGetProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoscaleSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_throughput: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUpdateOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throughput: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscale_settings: Option<AutoscaleSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlDatabaseResource {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlDatabaseCreateUpdateProperties {
    pub resource: SqlDatabaseResource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<CreateUpdateOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlDatabaseCreateUpdateParameters {
    pub properties: SqlDatabaseCreateUpdateProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlDatabaseGetProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<SqlDatabaseResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<CreateUpdateOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlDatabaseGetResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<SqlDatabaseGetProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThroughputSettingsResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throughput: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscale_settings: Option<AutoscaleSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThroughputSettingsProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ThroughputSettingsResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThroughputSettingsGetResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<ThroughputSettingsProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThroughputSettingsUpdateProperties {
    pub resource: ThroughputSettingsResource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThroughputSettingsUpdateParameters {
    pub properties: ThroughputSettingsUpdateProperties,
}

/// Request body shape shared by triggers, stored procedures and functions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateUpdateParameters<R> {
    pub properties: CreateUpdateProperties<R>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateUpdateProperties<R> {
    pub resource: R,
    #[serde(default)]
    pub options: CreateUpdateOptions,
}

/// Response shape shared by triggers, stored procedures and functions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetResults<R> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub properties: Option<GetProperties<R>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetProperties<R> {
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub resource: Option<R>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerType {
    Pre,
    Post,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerOperation {
    All,
    Create,
    Update,
    Delete,
    Replace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlTriggerResource {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_type: Option<TriggerType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_operation: Option<TriggerOperation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlStoredProcedureResource {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlUserDefinedFunctionResource {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

pub type SqlTriggerCreateUpdateParameters = CreateUpdateParameters<SqlTriggerResource>;
pub type SqlTriggerGetResults = GetResults<SqlTriggerResource>;
pub type SqlStoredProcedureCreateUpdateParameters = CreateUpdateParameters<SqlStoredProcedureResource>;
pub type SqlStoredProcedureGetResults = GetResults<SqlStoredProcedureResource>;
pub type SqlUserDefinedFunctionCreateUpdateParameters =
    CreateUpdateParameters<SqlUserDefinedFunctionResource>;
pub type SqlUserDefinedFunctionGetResults = GetResults<SqlUserDefinedFunctionResource>;

impl<R> CreateUpdateParameters<R> {
    pub fn new(resource: R) -> Self {
        Self {
            properties: CreateUpdateProperties {
                resource,
                options: CreateUpdateOptions::default(),
            },
        }
    }
}

impl<R> GetResults<R> {
    pub fn resource(&self) -> Option<&R> {
        self.properties.as_ref().and_then(|p| p.resource.as_ref())
    }
}

// =============================================================================
// Operations
// =============================================================================

#[derive(Debug, Clone)]
pub struct CosmosDbClient {
    client: ArmClient,
}

impl CosmosDbClient {
    pub fn new(client: ArmClient) -> Self {
        Self { client }
    }

    pub async fn database_accounts_get(
        &self,
        id: &DatabaseAccountId,
    ) -> Result<DatabaseAccountGetResults, ApiError> {
        self.client.get(&id.to_string(), API_VERSION).await
    }

    pub async fn sql_database_get(&self, id: &SqlDatabaseId) -> Result<SqlDatabaseGetResults, ApiError> {
        self.client.get(&id.to_string(), API_VERSION).await
    }

    pub async fn sql_database_create_update(
        &self,
        id: &SqlDatabaseId,
        parameters: &SqlDatabaseCreateUpdateParameters,
    ) -> Result<Poller, ApiError> {
        self.client.put(&id.to_string(), API_VERSION, parameters).await
    }

    pub async fn sql_database_delete(&self, id: &SqlDatabaseId) -> Result<Poller, ApiError> {
        self.client.delete(&id.to_string(), API_VERSION).await
    }

    pub async fn sql_database_throughput_get(
        &self,
        id: &SqlDatabaseId,
    ) -> Result<ThroughputSettingsGetResults, ApiError> {
        self.client
            .get(&format!("{}/throughputSettings/default", id), API_VERSION)
            .await
    }

    pub async fn sql_database_throughput_update(
        &self,
        id: &SqlDatabaseId,
        parameters: &ThroughputSettingsUpdateParameters,
    ) -> Result<Poller, ApiError> {
        self.client
            .put(
                &format!("{}/throughputSettings/default", id),
                API_VERSION,
                parameters,
            )
            .await
    }

    pub async fn sql_trigger_get(&self, id: &TriggerId) -> Result<SqlTriggerGetResults, ApiError> {
        self.client.get(&id.to_string(), API_VERSION).await
    }

    pub async fn sql_trigger_create_update(
        &self,
        id: &TriggerId,
        parameters: &SqlTriggerCreateUpdateParameters,
    ) -> Result<Poller, ApiError> {
        self.client.put(&id.to_string(), API_VERSION, parameters).await
    }

    pub async fn sql_trigger_delete(&self, id: &TriggerId) -> Result<Poller, ApiError> {
        self.client.delete(&id.to_string(), API_VERSION).await
    }

    pub async fn sql_stored_procedure_get(
        &self,
        id: &StoredProcedureId,
    ) -> Result<SqlStoredProcedureGetResults, ApiError> {
        self.client.get(&id.to_string(), API_VERSION).await
    }

    pub async fn sql_stored_procedure_create_update(
        &self,
        id: &StoredProcedureId,
        parameters: &SqlStoredProcedureCreateUpdateParameters,
    ) -> Result<Poller, ApiError> {
        self.client.put(&id.to_string(), API_VERSION, parameters).await
    }

    pub async fn sql_stored_procedure_delete(
        &self,
        id: &StoredProcedureId,
    ) -> Result<Poller, ApiError> {
        self.client.delete(&id.to_string(), API_VERSION).await
    }

    pub async fn sql_user_defined_function_get(
        &self,
        id: &UserDefinedFunctionId,
    ) -> Result<SqlUserDefinedFunctionGetResults, ApiError> {
        self.client.get(&id.to_string(), API_VERSION).await
    }

    pub async fn sql_user_defined_function_create_update(
        &self,
        id: &UserDefinedFunctionId,
        parameters: &SqlUserDefinedFunctionCreateUpdateParameters,
    ) -> Result<Poller, ApiError> {
        self.client.put(&id.to_string(), API_VERSION, parameters).await
    }

    pub async fn sql_user_defined_function_delete(
        &self,
        id: &UserDefinedFunctionId,
    ) -> Result<Poller, ApiError> {
        self.client.delete(&id.to_string(), API_VERSION).await
    }
}
