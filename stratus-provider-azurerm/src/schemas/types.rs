//! Azure-specific attribute types

use std::sync::LazyLock;

use regex::Regex;
use stratus_core::resource::Value;
use stratus_core::schema::AttributeType;

use crate::ids::{ContainerId, SqlRoleDefinitionId, SqlServerId};

static ACCOUNT_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]{1,42}[a-z0-9]$").ok());

static CLUSTER_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]{1,57}[a-zA-Z0-9]$").ok());

static VERSIONED_KEY: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^https://([a-zA-Z0-9-]{3,24})\.(vault|managedhsm)\.azure\.net/keys/([a-zA-Z0-9-]{1,127})/([a-zA-Z0-9]{32})/?$").ok()
});

fn is_match(re: &LazyLock<Option<Regex>>, s: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(s))
}

fn custom(
    name: &str,
    base: AttributeType,
    validate: fn(&Value) -> Result<(), String>,
) -> AttributeType {
    AttributeType::Custom {
        name: name.to_string(),
        base: Box::new(base),
        validate,
    }
}

fn with_str(value: &Value, check: impl Fn(&str) -> Result<(), String>) -> Result<(), String> {
    match value {
        Value::String(s) => check(s),
        _ => Err("Expected string".to_string()),
    }
}

fn with_int(value: &Value, check: impl Fn(i64) -> Result<(), String>) -> Result<(), String> {
    match value {
        Value::Int(n) => check(*n),
        _ => Err("Expected integer".to_string()),
    }
}

// =============================================================================
// Resource Manager
// =============================================================================

/// Resource group name: up to 90 word characters, hyphens, periods and parentheses
pub fn resource_group_name() -> AttributeType {
    custom("ResourceGroupName", AttributeType::String, |value| {
        with_str(value, |s| {
            let valid_chars = s
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '(' | ')'));
            if s.is_empty() || s.len() > 90 {
                Err(format!(
                    "resource group name must be between 1 and 90 characters, got {}",
                    s.len()
                ))
            } else if !valid_chars {
                Err(format!("resource group name {:?} contains invalid characters", s))
            } else if s.ends_with('.') {
                Err(format!("resource group name {:?} may not end with a period", s))
            } else {
                Ok(())
            }
        })
    })
}

/// Azure region in any spelling, e.g. `West Europe` or `westeurope`
pub fn location() -> AttributeType {
    custom("Location", AttributeType::String, |value| {
        with_str(value, |s| {
            if normalize_location(s).is_empty() {
                Err("location must not be empty".to_string())
            } else {
                Ok(())
            }
        })
    })
}

/// `West Europe` -> `westeurope`
pub fn normalize_location(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn tags() -> AttributeType {
    AttributeType::Map(Box::new(AttributeType::String))
}

// =============================================================================
// Cosmos DB
// =============================================================================

/// Name of a database, container, trigger, stored procedure or function
pub fn cosmos_entity_name() -> AttributeType {
    custom("CosmosEntityName", AttributeType::String, |value| {
        with_str(value, validate_cosmos_entity_name)
    })
}

pub fn validate_cosmos_entity_name(s: &str) -> Result<(), String> {
    if s.is_empty() || s.len() > 255 {
        return Err(format!(
            "name must be between 1 and 255 characters, got {}",
            s.len()
        ));
    }
    if let Some(c) = s.chars().find(|c| matches!(c, '/' | '\\' | '#' | '?')) {
        return Err(format!("name {:?} may not contain {:?}", s, c));
    }
    if s.ends_with(' ') {
        return Err(format!("name {:?} may not end with a space", s));
    }
    Ok(())
}

/// Database account name: 3-44 lowercase letters, digits and hyphens
pub fn cosmos_account_name() -> AttributeType {
    custom("CosmosAccountName", AttributeType::String, |value| {
        with_str(value, |s| {
            if is_match(&ACCOUNT_NAME, s) {
                Ok(())
            } else {
                Err(format!(
                    "account name {:?} must be 3-44 characters of lowercase letters, digits and hyphens, starting and ending with a letter or digit",
                    s
                ))
            }
        })
    })
}

/// Manual throughput in RU/s
pub fn cosmos_throughput() -> AttributeType {
    custom("CosmosThroughput", AttributeType::Int, |value| {
        with_int(value, |n| {
            if !(400..=1_000_000).contains(&n) {
                Err(format!("throughput must be between 400 and 1000000, got {}", n))
            } else if n % 100 != 0 {
                Err(format!("throughput must be a multiple of 100, got {}", n))
            } else {
                Ok(())
            }
        })
    })
}

/// Autoscale maximum throughput in RU/s
pub fn cosmos_max_throughput() -> AttributeType {
    custom("CosmosMaxThroughput", AttributeType::Int, |value| {
        with_int(value, |n| {
            if !(1000..=1_000_000).contains(&n) {
                Err(format!(
                    "max_throughput must be between 1000 and 1000000, got {}",
                    n
                ))
            } else if n % 1000 != 0 {
                Err(format!("max_throughput must be a multiple of 1000, got {}", n))
            } else {
                Ok(())
            }
        })
    })
}

pub fn sql_container_id() -> AttributeType {
    custom("SqlContainerId", AttributeType::String, |value| {
        with_str(value, |s| {
            ContainerId::parse(s).map(|_| ()).map_err(|e| e.to_string())
        })
    })
}

pub fn sql_role_definition_id() -> AttributeType {
    custom("SqlRoleDefinitionId", AttributeType::String, |value| {
        with_str(value, |s| {
            SqlRoleDefinitionId::parse(s)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
    })
}

pub fn trigger_type() -> AttributeType {
    AttributeType::Enum(vec!["Pre".to_string(), "Post".to_string()])
}

pub fn trigger_operation() -> AttributeType {
    AttributeType::Enum(
        ["All", "Create", "Update", "Delete", "Replace"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    )
}

// =============================================================================
// SQL
// =============================================================================

pub fn sql_server_id() -> AttributeType {
    custom("SqlServerId", AttributeType::String, |value| {
        with_str(value, |s| {
            SqlServerId::parse(s).map(|_| ()).map_err(|e| e.to_string())
        })
    })
}

/// Parts of a versioned key URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedKey {
    pub vault: String,
    pub managed_hsm: bool,
    pub name: String,
    pub version: String,
}

impl VersionedKey {
    pub fn parse(s: &str) -> Result<Self, String> {
        let caps = VERSIONED_KEY
            .as_ref()
            .and_then(|re| re.captures(s))
            .ok_or_else(|| {
                format!(
                    "{:?} is not a versioned key URL of the form https://{{vault}}.vault.azure.net/keys/{{name}}/{{version}}",
                    s
                )
            })?;
        Ok(Self {
            vault: caps[1].to_string(),
            managed_hsm: &caps[2] == "managedhsm",
            name: caps[3].to_string(),
            version: caps[4].to_string(),
        })
    }

    /// Name of the server key that wraps this key
    pub fn server_key_name(&self) -> String {
        format!("{}_{}_{}", self.vault, self.name, self.version)
    }
}

pub fn key_vault_key_id() -> AttributeType {
    custom("KeyVaultKeyId", AttributeType::String, |value| {
        with_str(value, |s| match VersionedKey::parse(s)? {
            key if key.managed_hsm => Err(format!("{:?} is a managed HSM key", s)),
            _ => Ok(()),
        })
    })
}

pub fn managed_hsm_key_id() -> AttributeType {
    custom("ManagedHsmKeyId", AttributeType::String, |value| {
        with_str(value, |s| match VersionedKey::parse(s)? {
            key if !key.managed_hsm => Err(format!("{:?} is not a managed HSM key", s)),
            _ => Ok(()),
        })
    })
}

// =============================================================================
// HDInsight
// =============================================================================

pub fn cluster_name() -> AttributeType {
    custom("HDInsightClusterName", AttributeType::String, |value| {
        with_str(value, |s| {
            if is_match(&CLUSTER_NAME, s) {
                Ok(())
            } else {
                Err(format!(
                    "cluster name {:?} must be 3-59 characters of letters, digits and hyphens, starting and ending with a letter or digit",
                    s
                ))
            }
        })
    })
}

pub fn cluster_tier() -> AttributeType {
    AttributeType::Enum(vec!["Standard".to_string(), "Premium".to_string()])
}

pub fn target_instance_count() -> AttributeType {
    custom("TargetInstanceCount", AttributeType::Int, |value| {
        with_int(value, |n| {
            if (1..=25).contains(&n) {
                Ok(())
            } else {
                Err(format!(
                    "target_instance_count must be between 1 and 25, got {}",
                    n
                ))
            }
        })
    })
}
