//! Typed Azure Resource Manager resource IDs
//!
//! An ARM ID is a `/`-separated path of fixed segments (`resourceGroups`,
//! `providers`, `databaseAccounts`, ...) interleaved with user-supplied names.
//! Every ID type here declares that shape once; parsing, formatting and the
//! round-trip `parse(id.to_string()) == id` all come from the declaration.

use std::fmt;
use std::str::FromStr;

use stratus_core::provider::{ErrorKind, ProviderError};

/// One segment of an ID shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// A fixed word such as `resourceGroups`
    Static(&'static str),
    /// A user-supplied value, named for error messages
    Value(&'static str),
}

use Segment::{Static, Value};

/// Error produced while parsing an ID
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("parsing {id_type} ID {input:?}: expected the segment {expected:?} but got {got:?}")]
    UnexpectedSegment {
        id_type: &'static str,
        input: String,
        expected: &'static str,
        got: String,
    },

    #[error("parsing {id_type} ID {input:?}: the segment {name:?} is missing")]
    MissingSegment {
        id_type: &'static str,
        input: String,
        name: &'static str,
    },

    #[error("parsing {id_type} ID {input:?}: the value for {name:?} is empty")]
    EmptyValue {
        id_type: &'static str,
        input: String,
        name: &'static str,
    },

    #[error("parsing {id_type} ID {input:?}: unexpected trailing segments")]
    TrailingSegments { id_type: &'static str, input: String },
}

impl From<IdError> for ProviderError {
    fn from(e: IdError) -> Self {
        ProviderError::new(ErrorKind::InvalidIdentifier, e.to_string()).with_cause(e)
    }
}

fn parse_segments(
    id_type: &'static str,
    shape: &[Segment],
    input: &str,
    insensitive: bool,
) -> Result<Vec<String>, IdError> {
    let trimmed = input.strip_prefix('/').unwrap_or(input);
    let mut parts = trimmed.split('/');
    let mut values = Vec::new();

    for segment in shape {
        let part = parts.next();
        match (segment, part) {
            (Static(expected), Some(got)) => {
                let matches = if insensitive {
                    got.eq_ignore_ascii_case(expected)
                } else {
                    got == *expected
                };
                if !matches {
                    return Err(IdError::UnexpectedSegment {
                        id_type,
                        input: input.to_string(),
                        expected,
                        got: got.to_string(),
                    });
                }
            }
            (Value(name), Some("")) => {
                return Err(IdError::EmptyValue {
                    id_type,
                    input: input.to_string(),
                    name,
                });
            }
            (Value(_), Some(got)) => values.push(got.to_string()),
            (Static(name), None) | (Value(name), None) => {
                return Err(IdError::MissingSegment {
                    id_type,
                    input: input.to_string(),
                    name,
                });
            }
        }
    }

    if parts.next().is_some() {
        return Err(IdError::TrailingSegments {
            id_type,
            input: input.to_string(),
        });
    }

    Ok(values)
}

fn format_segments(f: &mut fmt::Formatter<'_>, shape: &[Segment], values: &[&str]) -> fmt::Result {
    let mut values = values.iter();
    for segment in shape {
        match segment {
            Static(word) => write!(f, "/{}", word)?,
            Value(_) => write!(f, "/{}", values.next().copied().unwrap_or_default())?,
        }
    }
    Ok(())
}

macro_rules! resource_id {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal) {
            $($field:ident),+ $(,)?
        } = [$($seg:expr),+ $(,)?]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            $(pub $field: String,)+
        }

        impl $name {
            pub const SHAPE: &'static [Segment] = &[$($seg),+];

            #[allow(clippy::too_many_arguments)]
            pub fn new($($field: impl Into<String>),+) -> Self {
                Self {
                    $($field: $field.into(),)+
                }
            }

            /// Parse an ID whose fixed segments match exactly
            pub fn parse(input: &str) -> Result<Self, IdError> {
                Self::parse_with(input, false)
            }

            /// Parse an ID ignoring the case of fixed segments
            pub fn parse_insensitively(input: &str) -> Result<Self, IdError> {
                Self::parse_with(input, true)
            }

            fn parse_with(input: &str, insensitive: bool) -> Result<Self, IdError> {
                let mut values = parse_segments($label, Self::SHAPE, input, insensitive)?.into_iter();
                Ok(Self {
                    $($field: values.next().unwrap_or_default(),)+
                })
            }

            pub fn id(&self) -> String {
                self.to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                format_segments(f, Self::SHAPE, &[$(self.$field.as_str()),+])
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

// =============================================================================
// Cosmos DB
// =============================================================================

const DOCUMENT_DB: Segment = Static("Microsoft.DocumentDB");

resource_id! {
    /// `/subscriptions/{}/resourceGroups/{}/providers/Microsoft.DocumentDB/databaseAccounts/{}`
    DatabaseAccountId ("Database Account") {
        subscription_id,
        resource_group_name,
        database_account_name,
    } = [
        Static("subscriptions"), Value("subscriptionId"),
        Static("resourceGroups"), Value("resourceGroupName"),
        Static("providers"), DOCUMENT_DB,
        Static("databaseAccounts"), Value("databaseAccountName"),
    ]
}

resource_id! {
    SqlDatabaseId ("Sql Database") {
        subscription_id,
        resource_group_name,
        database_account_name,
        sql_database_name,
    } = [
        Static("subscriptions"), Value("subscriptionId"),
        Static("resourceGroups"), Value("resourceGroupName"),
        Static("providers"), DOCUMENT_DB,
        Static("databaseAccounts"), Value("databaseAccountName"),
        Static("sqlDatabases"), Value("sqlDatabaseName"),
    ]
}

resource_id! {
    ContainerId ("Container") {
        subscription_id,
        resource_group_name,
        database_account_name,
        sql_database_name,
        container_name,
    } = [
        Static("subscriptions"), Value("subscriptionId"),
        Static("resourceGroups"), Value("resourceGroupName"),
        Static("providers"), DOCUMENT_DB,
        Static("databaseAccounts"), Value("databaseAccountName"),
        Static("sqlDatabases"), Value("sqlDatabaseName"),
        Static("containers"), Value("containerName"),
    ]
}

resource_id! {
    TriggerId ("Trigger") {
        subscription_id,
        resource_group_name,
        database_account_name,
        sql_database_name,
        container_name,
        trigger_name,
    } = [
        Static("subscriptions"), Value("subscriptionId"),
        Static("resourceGroups"), Value("resourceGroupName"),
        Static("providers"), DOCUMENT_DB,
        Static("databaseAccounts"), Value("databaseAccountName"),
        Static("sqlDatabases"), Value("sqlDatabaseName"),
        Static("containers"), Value("containerName"),
        Static("triggers"), Value("triggerName"),
    ]
}

resource_id! {
    StoredProcedureId ("Stored Procedure") {
        subscription_id,
        resource_group_name,
        database_account_name,
        sql_database_name,
        container_name,
        stored_procedure_name,
    } = [
        Static("subscriptions"), Value("subscriptionId"),
        Static("resourceGroups"), Value("resourceGroupName"),
        Static("providers"), DOCUMENT_DB,
        Static("databaseAccounts"), Value("databaseAccountName"),
        Static("sqlDatabases"), Value("sqlDatabaseName"),
        Static("containers"), Value("containerName"),
        Static("storedProcedures"), Value("storedProcedureName"),
    ]
}

resource_id! {
    UserDefinedFunctionId ("User Defined Function") {
        subscription_id,
        resource_group_name,
        database_account_name,
        sql_database_name,
        container_name,
        user_defined_function_name,
    } = [
        Static("subscriptions"), Value("subscriptionId"),
        Static("resourceGroups"), Value("resourceGroupName"),
        Static("providers"), DOCUMENT_DB,
        Static("databaseAccounts"), Value("databaseAccountName"),
        Static("sqlDatabases"), Value("sqlDatabaseName"),
        Static("containers"), Value("containerName"),
        Static("userDefinedFunctions"), Value("userDefinedFunctionName"),
    ]
}

resource_id! {
    SqlRoleDefinitionId ("Sql Role Definition") {
        subscription_id,
        resource_group_name,
        database_account_name,
        role_definition_id,
    } = [
        Static("subscriptions"), Value("subscriptionId"),
        Static("resourceGroups"), Value("resourceGroupName"),
        Static("providers"), DOCUMENT_DB,
        Static("databaseAccounts"), Value("databaseAccountName"),
        Static("sqlRoleDefinitions"), Value("roleDefinitionId"),
    ]
}

resource_id! {
    SqlRoleAssignmentId ("Sql Role Assignment") {
        subscription_id,
        resource_group_name,
        database_account_name,
        role_assignment_id,
    } = [
        Static("subscriptions"), Value("subscriptionId"),
        Static("resourceGroups"), Value("resourceGroupName"),
        Static("providers"), DOCUMENT_DB,
        Static("databaseAccounts"), Value("databaseAccountName"),
        Static("sqlRoleAssignments"), Value("roleAssignmentId"),
    ]
}

resource_id! {
    /// `/subscriptions/{}/providers/Microsoft.DocumentDB/locations/{}`
    LocationId ("Location") {
        subscription_id,
        location_name,
    } = [
        Static("subscriptions"), Value("subscriptionId"),
        Static("providers"), DOCUMENT_DB,
        Static("locations"), Value("locationName"),
    ]
}

resource_id! {
    RestorableDatabaseAccountId ("Restorable Database Account") {
        subscription_id,
        location_name,
        instance_id,
    } = [
        Static("subscriptions"), Value("subscriptionId"),
        Static("providers"), DOCUMENT_DB,
        Static("locations"), Value("locationName"),
        Static("restorableDatabaseAccounts"), Value("instanceId"),
    ]
}

impl SqlDatabaseId {
    pub fn account(&self) -> DatabaseAccountId {
        DatabaseAccountId::new(
            &self.subscription_id,
            &self.resource_group_name,
            &self.database_account_name,
        )
    }
}

impl ContainerId {
    pub fn trigger(&self, name: impl Into<String>) -> TriggerId {
        TriggerId::new(
            &self.subscription_id,
            &self.resource_group_name,
            &self.database_account_name,
            &self.sql_database_name,
            &self.container_name,
            name,
        )
    }

    pub fn stored_procedure(&self, name: impl Into<String>) -> StoredProcedureId {
        StoredProcedureId::new(
            &self.subscription_id,
            &self.resource_group_name,
            &self.database_account_name,
            &self.sql_database_name,
            &self.container_name,
            name,
        )
    }

    pub fn user_defined_function(&self, name: impl Into<String>) -> UserDefinedFunctionId {
        UserDefinedFunctionId::new(
            &self.subscription_id,
            &self.resource_group_name,
            &self.database_account_name,
            &self.sql_database_name,
            &self.container_name,
            name,
        )
    }
}

impl TriggerId {
    pub fn container(&self) -> ContainerId {
        ContainerId::new(
            &self.subscription_id,
            &self.resource_group_name,
            &self.database_account_name,
            &self.sql_database_name,
            &self.container_name,
        )
    }
}

impl UserDefinedFunctionId {
    pub fn container(&self) -> ContainerId {
        ContainerId::new(
            &self.subscription_id,
            &self.resource_group_name,
            &self.database_account_name,
            &self.sql_database_name,
            &self.container_name,
        )
    }
}

impl LocationId {
    pub fn restorable_database_account(
        &self,
        instance_id: impl Into<String>,
    ) -> RestorableDatabaseAccountId {
        RestorableDatabaseAccountId::new(&self.subscription_id, &self.location_name, instance_id)
    }
}

// =============================================================================
// SQL
// =============================================================================

const SQL: Segment = Static("Microsoft.Sql");

resource_id! {
    /// `/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Sql/servers/{}`
    SqlServerId ("Sql Server") {
        subscription_id,
        resource_group_name,
        server_name,
    } = [
        Static("subscriptions"), Value("subscriptionId"),
        Static("resourceGroups"), Value("resourceGroupName"),
        Static("providers"), SQL,
        Static("servers"), Value("serverName"),
    ]
}

resource_id! {
    EncryptionProtectorId ("Encryption Protector") {
        subscription_id,
        resource_group_name,
        server_name,
        encryption_protector_name,
    } = [
        Static("subscriptions"), Value("subscriptionId"),
        Static("resourceGroups"), Value("resourceGroupName"),
        Static("providers"), SQL,
        Static("servers"), Value("serverName"),
        Static("encryptionProtector"), Value("encryptionProtectorName"),
    ]
}

resource_id! {
    ServerKeyId ("Server Key") {
        subscription_id,
        resource_group_name,
        server_name,
        key_name,
    } = [
        Static("subscriptions"), Value("subscriptionId"),
        Static("resourceGroups"), Value("resourceGroupName"),
        Static("providers"), SQL,
        Static("servers"), Value("serverName"),
        Static("keys"), Value("keyName"),
    ]
}

impl SqlServerId {
    /// The only encryption protector a server has
    pub fn encryption_protector(&self) -> EncryptionProtectorId {
        EncryptionProtectorId::new(
            &self.subscription_id,
            &self.resource_group_name,
            &self.server_name,
            "current",
        )
    }

    pub fn key(&self, name: impl Into<String>) -> ServerKeyId {
        ServerKeyId::new(
            &self.subscription_id,
            &self.resource_group_name,
            &self.server_name,
            name,
        )
    }
}

// =============================================================================
// HDInsight
// =============================================================================

resource_id! {
    /// `/subscriptions/{}/resourceGroups/{}/providers/Microsoft.HDInsight/clusters/{}`
    ClusterId ("HDInsight Cluster") {
        subscription_id,
        resource_group_name,
        cluster_name,
    } = [
        Static("subscriptions"), Value("subscriptionId"),
        Static("resourceGroups"), Value("resourceGroupName"),
        Static("providers"), Static("Microsoft.HDInsight"),
        Static("clusters"), Value("clusterName"),
    ]
}
