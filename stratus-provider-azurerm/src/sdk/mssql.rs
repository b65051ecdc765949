//! SQL server keys and encryption protectors (`Microsoft.Sql`, 2023-02-01-preview)

use serde::{Deserialize, Serialize};

use super::client::ArmClient;
use super::error::ApiError;
use super::lro::Poller;
use crate::ids::{EncryptionProtectorId, ServerKeyId, SqlServerId};

pub const API_VERSION: &str = "2023-02-01-preview";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerKeyType {
    ServiceManaged,
    AzureKeyVault,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Server {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerKeyProperties {
    pub server_key_type: ServerKeyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerKey {
    pub properties: ServerKeyProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionProtectorProperties {
    pub server_key_type: ServerKeyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_key_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_rotation_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptionProtector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<EncryptionProtectorProperties>,
}

impl EncryptionProtector {
    /// The protector every server starts with
    pub fn service_managed() -> Self {
        Self {
            id: None,
            properties: Some(EncryptionProtectorProperties {
                server_key_type: ServerKeyType::ServiceManaged,
                server_key_name: Some("ServiceManaged".to_string()),
                uri: None,
                auto_rotation_enabled: Some(false),
            }),
        }
    }

    pub fn is_customer_managed(&self) -> bool {
        self.properties
            .as_ref()
            .is_some_and(|p| p.server_key_type == ServerKeyType::AzureKeyVault)
    }
}

#[derive(Debug, Clone)]
pub struct SqlClient {
    client: ArmClient,
}

impl SqlClient {
    pub fn new(client: ArmClient) -> Self {
        Self { client }
    }

    pub async fn servers_get(&self, id: &SqlServerId) -> Result<Server, ApiError> {
        self.client.get(&id.to_string(), API_VERSION).await
    }

    pub async fn server_keys_create_or_update(
        &self,
        id: &ServerKeyId,
        key: &ServerKey,
    ) -> Result<Poller, ApiError> {
        self.client.put(&id.to_string(), API_VERSION, key).await
    }

    pub async fn encryption_protectors_get(
        &self,
        id: &EncryptionProtectorId,
    ) -> Result<EncryptionProtector, ApiError> {
        self.client.get(&id.to_string(), API_VERSION).await
    }

    pub async fn encryption_protectors_create_or_update(
        &self,
        id: &EncryptionProtectorId,
        protector: &EncryptionProtector,
    ) -> Result<Poller, ApiError> {
        self.client.put(&id.to_string(), API_VERSION, protector).await
    }
}
