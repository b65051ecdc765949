//! SQL server transparent data encryption schema

use stratus_core::resource::Value;
use stratus_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::types::{key_vault_key_id, managed_hsm_key_id, sql_server_id};

pub fn server_transparent_data_encryption_schema() -> ResourceSchema {
    ResourceSchema::new("azurerm_mssql_server_transparent_data_encryption")
        .with_description(
            "The encryption protector of a SQL server, either service-managed or backed by a customer-managed key",
        )
        .attribute(
            AttributeSchema::new("server_id", sql_server_id())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("key_vault_key_id", key_vault_key_id())
                .conflicts_with("managed_hsm_key_id")
                .with_description("Versioned Key Vault key; unset means service-managed"),
        )
        .attribute(
            AttributeSchema::new("managed_hsm_key_id", managed_hsm_key_id())
                .conflicts_with("key_vault_key_id")
                .with_description("Versioned managed HSM key"),
        )
        .attribute(
            AttributeSchema::new("auto_rotation_enabled", AttributeType::Bool)
                .with_default(Value::Bool(false)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use stratus_core::schema::TypeError;

    const SERVER: &str =
        "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/rg1/providers/Microsoft.Sql/servers/sql1";

    #[test]
    fn only_one_key_source() {
        let attrs: HashMap<String, Value> = [
            ("server_id", Value::string(SERVER)),
            (
                "key_vault_key_id",
                Value::string("https://vault1.vault.azure.net/keys/key1/0123456789abcdef0123456789abcdef"),
            ),
            (
                "managed_hsm_key_id",
                Value::string("https://hsm1.managedhsm.azure.net/keys/key1/0123456789abcdef0123456789abcdef"),
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        let errors = server_transparent_data_encryption_schema()
            .validate(&attrs)
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], TypeError::Conflict { .. }));
    }

    #[test]
    fn service_managed_needs_only_the_server() {
        let schema = server_transparent_data_encryption_schema();
        let mut attrs = HashMap::new();
        attrs.insert("server_id".to_string(), Value::string(SERVER));
        schema.apply_defaults(&mut attrs);
        assert_eq!(attrs["auto_rotation_enabled"], Value::Bool(false));
        assert!(schema.validate(&attrs).is_ok());
    }
}
