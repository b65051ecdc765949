//! Azure RM resource and data source schema definitions

pub mod cosmosdb;
pub mod hdinsight;
pub mod mssql;
pub mod types;

use stratus_core::schema::ResourceSchema;

/// Schemas of every managed resource type
pub fn all_schemas() -> Vec<ResourceSchema> {
    vec![
        cosmosdb::sql_database_schema(),
        cosmosdb::sql_trigger_schema(),
        cosmosdb::sql_stored_procedure_schema(),
        cosmosdb::sql_function_schema(),
        cosmosdb::sql_role_assignment_schema(),
        cosmosdb::sql_role_definition_schema(),
        mssql::server_transparent_data_encryption_schema(),
        hdinsight::hadoop_cluster_schema(),
    ]
}

/// Schemas of every data source
pub fn data_source_schemas() -> Vec<ResourceSchema> {
    vec![
        cosmosdb::sql_database_data_source_schema(),
        cosmosdb::sql_role_definition_data_source_schema(),
        cosmosdb::restorable_database_accounts_data_source_schema(),
    ]
}
