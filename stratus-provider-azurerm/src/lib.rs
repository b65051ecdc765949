//! Stratus Azure RM Provider
//!
//! Azure Resource Manager provider for Cosmos DB SQL APIs, SQL Server
//! transparent data encryption and HDInsight Hadoop clusters.
//!
//! ## Module Structure
//!
//! - `provider` - AzureRmProvider implementation
//! - `resources` - CRUD handlers, one per resource type
//! - `data_sources` - read-only lookups
//! - `schemas` - resource and data source schemas
//! - `sdk` - REST client for the management API
//! - `ids` - typed resource identifiers
//! - `common` - throughput and capability adapters shared by handlers
//! - `fields` - typed access to attribute maps
//! - `config` - provider block settings

pub mod common;
pub mod config;
pub mod data_sources;
pub mod fields;
pub mod ids;
pub mod provider;
pub mod resources;
pub mod schemas;
pub mod sdk;

// Re-export main types
pub use config::ProviderConfig;
pub use provider::AzureRmProvider;

use stratus_core::provider::{BoxFuture, Provider, ProviderResult};
use stratus_core::resource::{Resource, ResourceId, State};
use stratus_core::schema::ResourceSchema;

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for AzureRmProvider {
    fn name(&self) -> &'static str {
        "azurerm"
    }

    fn schemas(&self) -> Vec<ResourceSchema> {
        self.resource_schemas()
    }

    fn data_source_schemas(&self) -> Vec<ResourceSchema> {
        AzureRmProvider::data_source_schemas(self)
    }

    fn read(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.read_resource(&id, &identifier).await })
    }

    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { AzureRmProvider::read_data_source(self, &resource).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(&resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move { self.update_resource(&id, &identifier, &from, &to).await })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.delete_resource(&id, &identifier).await })
    }
}
