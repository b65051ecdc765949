//! Cosmos DB SQL API resource and data source schemas

use stratus_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema, types};

use super::types::{
    cosmos_account_name, cosmos_entity_name, cosmos_max_throughput, cosmos_throughput,
    location, normalize_location, resource_group_name, sql_container_id, sql_role_definition_id,
    trigger_operation, trigger_type,
};
use crate::sdk::rbacs::RoleDefinitionType;

fn block(schema: BlockSchema) -> AttributeType {
    AttributeType::Block(Box::new(schema))
}

fn account_name() -> AttributeSchema {
    AttributeSchema::new("account_name", cosmos_account_name())
        .required()
        .force_new()
        .with_description("Name of the Cosmos DB account")
}

fn group() -> AttributeSchema {
    AttributeSchema::new("resource_group_name", resource_group_name())
        .required()
        .force_new()
}

fn autoscale_settings() -> AttributeType {
    block(
        BlockSchema::new()
            .attribute(AttributeSchema::new("max_throughput", cosmos_max_throughput()).optional_computed())
            .single(),
    )
}

fn permissions() -> AttributeType {
    block(
        BlockSchema::new()
            .attribute(AttributeSchema::new("data_actions", types::string_set()).required())
            .min_items(1)
            .as_set(),
    )
}

// =============================================================================
// Resources
// =============================================================================

pub fn sql_database_schema() -> ResourceSchema {
    ResourceSchema::new("azurerm_cosmosdb_sql_database")
        .with_description("A SQL database within a Cosmos DB account")
        .attribute(
            AttributeSchema::new("name", cosmos_entity_name())
                .required()
                .force_new(),
        )
        .attribute(group())
        .attribute(account_name())
        .attribute(
            AttributeSchema::new("throughput", cosmos_throughput())
                .optional_computed()
                .conflicts_with("autoscale_settings")
                .with_description("Manually provisioned RU/s"),
        )
        .attribute(
            AttributeSchema::new("autoscale_settings", autoscale_settings())
                .optional_computed()
                .with_description("Autoscale ceiling; switching from manual throughput is not supported"),
        )
}

pub fn sql_trigger_schema() -> ResourceSchema {
    ResourceSchema::new("azurerm_cosmosdb_sql_trigger")
        .with_description("A server-side trigger on a SQL container")
        .attribute(
            AttributeSchema::new("name", cosmos_entity_name())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("container_id", sql_container_id())
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new("body", types::non_empty_string()).required())
        .attribute(AttributeSchema::new("operation", trigger_operation()).required())
        .attribute(AttributeSchema::new("type", trigger_type()).required())
}

pub fn sql_stored_procedure_schema() -> ResourceSchema {
    ResourceSchema::new("azurerm_cosmosdb_sql_stored_procedure")
        .with_description("A stored procedure on a SQL container")
        .attribute(
            AttributeSchema::new("name", types::non_empty_string())
                .required()
                .force_new(),
        )
        .attribute(group())
        .attribute(account_name())
        .attribute(
            AttributeSchema::new("database_name", cosmos_entity_name())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("container_name", cosmos_entity_name())
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new("body", types::non_empty_string()).required())
}

pub fn sql_function_schema() -> ResourceSchema {
    ResourceSchema::new("azurerm_cosmosdb_sql_function")
        .with_description("A user-defined function on a SQL container")
        .attribute(
            AttributeSchema::new("name", cosmos_entity_name())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("container_id", sql_container_id())
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new("body", types::non_empty_string()).required())
}

pub fn sql_role_assignment_schema() -> ResourceSchema {
    ResourceSchema::new("azurerm_cosmosdb_sql_role_assignment")
        .with_description("Grants a principal a SQL role definition over a scope")
        .attribute(
            AttributeSchema::new("name", types::uuid())
                .optional_computed()
                .force_new()
                .with_description("Generated when left out"),
        )
        .attribute(group())
        .attribute(account_name())
        .attribute(
            AttributeSchema::new("principal_id", types::uuid())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("role_definition_id", sql_role_definition_id()).required(),
        )
        .attribute(
            AttributeSchema::new("scope", types::non_empty_string())
                .required()
                .force_new(),
        )
}

pub fn sql_role_definition_schema() -> ResourceSchema {
    ResourceSchema::new("azurerm_cosmosdb_sql_role_definition")
        .with_description("A SQL role definition on a Cosmos DB account")
        .attribute(
            AttributeSchema::new("role_definition_id", types::uuid())
                .optional_computed()
                .force_new()
                .with_description("Generated when left out"),
        )
        .attribute(group())
        .attribute(account_name())
        .attribute(AttributeSchema::new("name", types::non_empty_string()).required())
        .attribute(
            AttributeSchema::new(
                "type",
                AttributeType::Enum(RoleDefinitionType::VALUES.iter().map(|v| v.to_string()).collect()),
            )
            .force_new()
            .with_default(stratus_core::resource::Value::string(
                RoleDefinitionType::CustomRole.as_str(),
            )),
        )
        .attribute(AttributeSchema::new("assignable_scopes", types::string_set()).required())
        .attribute(AttributeSchema::new("permissions", permissions()).required())
}

// =============================================================================
// Data sources
// =============================================================================

pub fn sql_database_data_source_schema() -> ResourceSchema {
    ResourceSchema::new("azurerm_cosmosdb_sql_database")
        .with_description("Looks up an existing SQL database")
        .attribute(AttributeSchema::new("name", cosmos_entity_name()).required())
        .attribute(AttributeSchema::new("resource_group_name", resource_group_name()).required())
        .attribute(AttributeSchema::new("account_name", cosmos_account_name()).required())
        .attribute(AttributeSchema::new("throughput", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("autoscale_settings", autoscale_settings()).computed())
}

pub fn sql_role_definition_data_source_schema() -> ResourceSchema {
    ResourceSchema::new("azurerm_cosmosdb_sql_role_definition")
        .with_description("Looks up an existing SQL role definition")
        .attribute(AttributeSchema::new("resource_group_name", resource_group_name()).required())
        .attribute(AttributeSchema::new("account_name", cosmos_account_name()).required())
        .attribute(AttributeSchema::new("role_definition_id", types::uuid()).required())
        .attribute(AttributeSchema::new("name", AttributeType::String).computed())
        .attribute(AttributeSchema::new("type", AttributeType::String).computed())
        .attribute(AttributeSchema::new("assignable_scopes", types::string_set()).computed())
        .attribute(AttributeSchema::new("permissions", permissions()).computed())
}

pub fn restorable_database_accounts_data_source_schema() -> ResourceSchema {
    let restorable_location = BlockSchema::new()
        .attribute(AttributeSchema::new("creation_time", AttributeType::String).computed())
        .attribute(AttributeSchema::new("deletion_time", AttributeType::String).computed())
        .attribute(AttributeSchema::new("location", AttributeType::String).computed())
        .attribute(
            AttributeSchema::new("regional_database_account_instance_id", AttributeType::String)
                .computed(),
        );
    let account = BlockSchema::new()
        .attribute(AttributeSchema::new("id", AttributeType::String).computed())
        .attribute(AttributeSchema::new("api_type", AttributeType::String).computed())
        .attribute(AttributeSchema::new("creation_time", AttributeType::String).computed())
        .attribute(AttributeSchema::new("deletion_time", AttributeType::String).computed())
        .attribute(
            AttributeSchema::new("restorable_locations", block(restorable_location)).computed(),
        );

    ResourceSchema::new("azurerm_cosmosdb_restorable_database_accounts")
        .with_description("Lists the restorable instances of a database account in a location")
        .attribute(AttributeSchema::new("name", cosmos_account_name()).required())
        .attribute(
            AttributeSchema::new("location", location())
                .required()
                .normalized_by(normalize_location),
        )
        .attribute(AttributeSchema::new("accounts", block(account)).computed())
}
