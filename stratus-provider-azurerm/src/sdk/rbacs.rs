//! Cosmos DB SQL role-based access control (`Microsoft.DocumentDB`, 2023-04-15)

use serde::{Deserialize, Serialize};

use super::client::ArmClient;
use super::cosmosdb::API_VERSION;
use super::error::ApiError;
use super::lro::Poller;
use crate::ids::{SqlRoleAssignmentId, SqlRoleDefinitionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleDefinitionType {
    BuiltInRole,
    CustomRole,
}

impl RoleDefinitionType {
    pub const VALUES: [&'static str; 2] = ["BuiltInRole", "CustomRole"];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleDefinitionType::BuiltInRole => "BuiltInRole",
            RoleDefinitionType::CustomRole => "CustomRole",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BuiltInRole" => Some(RoleDefinitionType::BuiltInRole),
            "CustomRole" => Some(RoleDefinitionType::CustomRole),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_actions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_data_actions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlRoleDefinitionResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub role_type: Option<RoleDefinitionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignable_scopes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<Permission>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlRoleDefinitionCreateUpdateParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<SqlRoleDefinitionResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlRoleDefinitionGetResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<SqlRoleDefinitionResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlRoleAssignmentResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_definition_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlRoleAssignmentCreateUpdateParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<SqlRoleAssignmentResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlRoleAssignmentGetResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<SqlRoleAssignmentResource>,
}

#[derive(Debug, Clone)]
pub struct RbacsClient {
    client: ArmClient,
}

impl RbacsClient {
    pub fn new(client: ArmClient) -> Self {
        Self { client }
    }

    pub async fn sql_role_definition_get(
        &self,
        id: &SqlRoleDefinitionId,
    ) -> Result<SqlRoleDefinitionGetResults, ApiError> {
        self.client.get(&id.to_string(), API_VERSION).await
    }

    pub async fn sql_role_definition_create_update(
        &self,
        id: &SqlRoleDefinitionId,
        parameters: &SqlRoleDefinitionCreateUpdateParameters,
    ) -> Result<Poller, ApiError> {
        self.client.put(&id.to_string(), API_VERSION, parameters).await
    }

    pub async fn sql_role_definition_delete(
        &self,
        id: &SqlRoleDefinitionId,
    ) -> Result<Poller, ApiError> {
        self.client.delete(&id.to_string(), API_VERSION).await
    }

    pub async fn sql_role_assignment_get(
        &self,
        id: &SqlRoleAssignmentId,
    ) -> Result<SqlRoleAssignmentGetResults, ApiError> {
        self.client.get(&id.to_string(), API_VERSION).await
    }

    pub async fn sql_role_assignment_create_update(
        &self,
        id: &SqlRoleAssignmentId,
        parameters: &SqlRoleAssignmentCreateUpdateParameters,
    ) -> Result<Poller, ApiError> {
        self.client.put(&id.to_string(), API_VERSION, parameters).await
    }

    pub async fn sql_role_assignment_delete(
        &self,
        id: &SqlRoleAssignmentId,
    ) -> Result<Poller, ApiError> {
        self.client.delete(&id.to_string(), API_VERSION).await
    }
}
