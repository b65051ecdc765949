//! azurerm_mssql_server_transparent_data_encryption
//!
//! Every server has exactly one encryption protector. "Creating" this
//! resource points it at a customer-managed key, "deleting" it reverts the
//! protector to the service-managed key.

use std::collections::HashMap;

use async_trait::async_trait;
use stratus_core::provider::{ProviderError, ProviderResult};
use stratus_core::resource::{Resource, ResourceId, State, Value};
use stratus_core::schema::ResourceSchema;
use stratus_core::timeouts::OperationContext;
use url::Url;

use super::{ResourceHandler, Session, call_optional, delete_tolerant, gone, mutate, refreshed, tag};
use crate::fields::Fields;
use crate::ids::{EncryptionProtectorId, SqlServerId};
use crate::schemas::mssql::server_transparent_data_encryption_schema;
use crate::schemas::types::VersionedKey;
use crate::sdk::mssql::{
    EncryptionProtector, EncryptionProtectorProperties, ServerKey, ServerKeyProperties,
    ServerKeyType,
};

const TYPE_NAME: &str = "azurerm_mssql_server_transparent_data_encryption";

/// A customer-managed key and the URL it was configured with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerKey {
    pub uri: String,
    pub key: VersionedKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransparentDataEncryptionConfig {
    pub server_id: SqlServerId,
    /// `None` means service-managed
    pub key: Option<CustomerKey>,
    pub auto_rotation_enabled: bool,
}

impl TransparentDataEncryptionConfig {
    pub fn from_attributes(attrs: &HashMap<String, Value>) -> ProviderResult<Self> {
        let fields = Fields::new(attrs);
        let key = match fields
            .str("key_vault_key_id")
            .or_else(|| fields.str("managed_hsm_key_id"))
        {
            Some(uri) => Some(CustomerKey {
                uri: uri.to_string(),
                key: VersionedKey::parse(uri).map_err(ProviderError::validation)?,
            }),
            None => None,
        };
        Ok(Self {
            server_id: SqlServerId::parse(fields.required_str("server_id")?)?,
            key,
            auto_rotation_enabled: fields.bool_or("auto_rotation_enabled", false),
        })
    }

    fn protector(&self) -> EncryptionProtector {
        match &self.key {
            Some(customer) => EncryptionProtector {
                id: None,
                properties: Some(EncryptionProtectorProperties {
                    server_key_type: ServerKeyType::AzureKeyVault,
                    server_key_name: Some(customer.key.server_key_name()),
                    uri: None,
                    auto_rotation_enabled: Some(self.auto_rotation_enabled),
                }),
            },
            None => EncryptionProtector::service_managed(),
        }
    }
}

fn is_managed_hsm(uri: &str) -> bool {
    Url::parse(uri)
        .ok()
        .and_then(|url| url.host_str().map(|h| h.contains("managedhsm")))
        .unwrap_or(false)
}

fn server_of(id: &EncryptionProtectorId) -> SqlServerId {
    SqlServerId::new(&id.subscription_id, &id.resource_group_name, &id.server_name)
}

pub struct MsSqlServerTransparentDataEncryption;

impl MsSqlServerTransparentDataEncryption {
    async fn read_id(
        &self,
        session: &Session,
        ctx: &OperationContext,
        rid: &ResourceId,
        id: &EncryptionProtectorId,
    ) -> ProviderResult<State> {
        let Some(protector) =
            call_optional(ctx, id, session.clients.sql.encryption_protectors_get(id)).await?
        else {
            return Ok(gone(rid, id));
        };

        let props = protector.properties.as_ref();
        let uri = props
            .filter(|p| p.server_key_type == ServerKeyType::AzureKeyVault)
            .and_then(|p| p.uri.clone())
            .unwrap_or_default();
        let (key_vault_key_id, managed_hsm_key_id) = if is_managed_hsm(&uri) {
            (String::new(), uri)
        } else {
            (uri, String::new())
        };

        let mut attrs = HashMap::new();
        attrs.insert(
            "server_id".to_string(),
            Value::String(server_of(id).to_string()),
        );
        attrs.insert(
            "key_vault_key_id".to_string(),
            Value::String(key_vault_key_id),
        );
        attrs.insert(
            "managed_hsm_key_id".to_string(),
            Value::String(managed_hsm_key_id),
        );
        attrs.insert(
            "auto_rotation_enabled".to_string(),
            Value::Bool(props.and_then(|p| p.auto_rotation_enabled).unwrap_or(false)),
        );
        Ok(State::existing(rid.clone(), attrs).with_identifier(id.to_string()))
    }

    /// Register the key on the server when needed, then switch the protector
    async fn write(
        &self,
        session: &Session,
        ctx: &OperationContext,
        rid: &ResourceId,
        config: &TransparentDataEncryptionConfig,
    ) -> ProviderResult<State> {
        let sql = &session.clients.sql;
        let id = config.server_id.encryption_protector();

        if let Some(customer) = &config.key {
            let key_id = config.server_id.key(customer.key.server_key_name());
            let key = ServerKey {
                properties: ServerKeyProperties {
                    server_key_type: ServerKeyType::AzureKeyVault,
                    uri: Some(customer.uri.clone()),
                },
            };
            log::debug!("adding server key {}", key_id);
            mutate(ctx, &key_id, sql.server_keys_create_or_update(&key_id, &key)).await?;
        }

        mutate(
            ctx,
            &id,
            sql.encryption_protectors_create_or_update(&id, &config.protector()),
        )
        .await?;
        let state = self.read_id(session, ctx, rid, &id).await?;
        refreshed(state, ctx, &id)
    }
}

#[async_trait]
impl ResourceHandler for MsSqlServerTransparentDataEncryption {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        server_transparent_data_encryption_schema()
    }

    /// A service-managed protector is the default of every server and does not count
    async fn create(
        &self,
        session: &Session,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let config = TransparentDataEncryptionConfig::from_attributes(&resource.attributes)?;
        let id = config.server_id.encryption_protector();

        let existing = call_optional(ctx, &id, session.clients.sql.encryption_protectors_get(&id))
            .await?;
        if existing.is_some_and(|p| p.is_customer_managed()) {
            return Err(ProviderError::already_exists(TYPE_NAME, id.to_string())
                .during(ctx.operation()));
        }
        self.write(session, ctx, &resource.id, &config).await
    }

    async fn read(
        &self,
        session: &Session,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<State> {
        let protector_id =
            EncryptionProtectorId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        self.read_id(session, ctx, id, &protector_id).await
    }

    async fn update(
        &self,
        session: &Session,
        ctx: &OperationContext,
        id: &ResourceId,
        _identifier: &str,
        _from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let config = TransparentDataEncryptionConfig::from_attributes(&to.attributes)?;
        self.write(session, ctx, id, &config).await
    }

    /// Revert to the service-managed key; a missing server counts as deleted
    async fn delete(
        &self,
        session: &Session,
        ctx: &OperationContext,
        identifier: &str,
    ) -> ProviderResult<()> {
        let id = EncryptionProtectorId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        delete_tolerant(
            ctx,
            &id,
            session
                .clients
                .sql
                .encryption_protectors_create_or_update(&id, &EncryptionProtector::service_managed()),
        )
        .await
    }

    /// Only a customer-managed protector counts, matching the create guard
    async fn exists(
        &self,
        session: &Session,
        ctx: &OperationContext,
        identifier: &str,
    ) -> ProviderResult<bool> {
        let id = EncryptionProtectorId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        let protector =
            call_optional(ctx, &id, session.clients.sql.encryption_protectors_get(&id)).await?;
        Ok(protector.is_some_and(|p| p.is_customer_managed()))
    }
}
