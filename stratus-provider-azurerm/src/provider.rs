//! Azure Resource Manager provider implementation
//!
//! Routes each request to the handler of its resource type, after filling in
//! defaults and validating the attributes against the handler's schema. Every
//! operation runs inside an [`OperationContext`] built from the handler's
//! timeouts and the provider-wide cancellation token.

use std::collections::HashMap;
use std::sync::Arc;

use stratus_core::provider::{ErrorKind, Operation, ProviderError, ProviderResult};
use stratus_core::resource::{Resource, ResourceId, State};
use stratus_core::schema::{ResourceSchema, TypeError};
use stratus_core::timeouts::{OperationContext, ResourceTimeouts};
use tokio_util::sync::CancellationToken;

use crate::config::ProviderConfig;
use crate::data_sources::{self, DataSourceHandler};
use crate::resources::{self, ResourceHandler, Session};
use crate::sdk::{ArmClient, Clients, ReqwestTransport, Transport};

/// Azure RM Provider
pub struct AzureRmProvider {
    config: ProviderConfig,
    session: Session,
    resources: HashMap<&'static str, Box<dyn ResourceHandler>>,
    data_sources: HashMap<&'static str, Box<dyn DataSourceHandler>>,
    cancel: CancellationToken,
}

impl AzureRmProvider {
    /// Create a provider talking to `config.endpoint` over HTTPS
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let transport = ReqwestTransport::new(&config.access_token)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a provider on top of an existing transport
    pub fn with_transport(config: ProviderConfig, transport: Arc<dyn Transport>) -> Self {
        let client = ArmClient::new(transport, config.endpoint.clone());
        let session = Session {
            clients: Clients::new(client),
            subscription_id: config.subscription_id.clone(),
        };
        Self {
            config,
            session,
            resources: resources::handlers()
                .into_iter()
                .map(|h| (h.type_name(), h))
                .collect(),
            data_sources: data_sources::handlers()
                .into_iter()
                .map(|h| (h.type_name(), h))
                .collect(),
            cancel: CancellationToken::new(),
        }
    }

    /// Token that aborts every in-flight operation when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn resource_handler(&self, resource_type: &str) -> ProviderResult<&dyn ResourceHandler> {
        self.resources
            .get(resource_type)
            .map(|h| &**h)
            .ok_or_else(|| unknown_type("resource", resource_type))
    }

    fn data_source_handler(&self, resource_type: &str) -> ProviderResult<&dyn DataSourceHandler> {
        self.data_sources
            .get(resource_type)
            .map(|h| &**h)
            .ok_or_else(|| unknown_type("data source", resource_type))
    }

    fn context(&self, operation: Operation, timeouts: ResourceTimeouts) -> OperationContext {
        let timeout = timeouts
            .with_override(self.config.timeout)
            .for_operation(operation);
        OperationContext::new(operation, timeout, self.config.poll_interval)
            .with_cancellation(self.cancel.child_token())
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    pub async fn read_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
        let handler = self
            .resource_handler(&id.resource_type)
            .map_err(|e| e.for_resource(id.clone()))?;
        let ctx = self.context(Operation::Read, handler.timeouts());
        handler
            .read(&self.session, &ctx, id, identifier)
            .await
            .map_err(|e| e.for_resource(id.clone()))
    }

    pub async fn create_resource(&self, resource: &Resource) -> ProviderResult<State> {
        let id = resource.id.clone();
        let handler = self
            .resource_handler(&id.resource_type)
            .map_err(|e| e.for_resource(id.clone()))?;
        let resource = prepare(&handler.schema(), resource, Operation::Create)
            .map_err(|e| e.for_resource(id.clone()))?;

        log::info!("creating {}", id);
        let ctx = self.context(Operation::Create, handler.timeouts());
        handler
            .create(&self.session, &ctx, &resource)
            .await
            .map_err(|e| e.for_resource(id))
    }

    pub async fn update_resource(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let handler = self
            .resource_handler(&id.resource_type)
            .map_err(|e| e.for_resource(id.clone()))?;
        let to = prepare(&handler.schema(), to, Operation::Update)
            .map_err(|e| e.for_resource(id.clone()))?;

        log::info!("updating {} ({})", id, identifier);
        let ctx = self.context(Operation::Update, handler.timeouts());
        handler
            .update(&self.session, &ctx, id, identifier, from, &to)
            .await
            .map_err(|e| e.for_resource(id.clone()))
    }

    pub async fn delete_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        let handler = self
            .resource_handler(&id.resource_type)
            .map_err(|e| e.for_resource(id.clone()))?;

        log::info!("deleting {} ({})", id, identifier);
        let ctx = self.context(Operation::Delete, handler.timeouts());
        handler
            .delete(&self.session, &ctx, identifier)
            .await
            .map_err(|e| e.for_resource(id.clone()))
    }

    /// Whether the remote object behind `identifier` exists
    pub async fn resource_exists(&self, resource_type: &str, identifier: &str) -> ProviderResult<bool> {
        let handler = self.resource_handler(resource_type)?;
        let ctx = self.context(Operation::Read, handler.timeouts());
        handler.exists(&self.session, &ctx, identifier).await
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    pub async fn read_data_source(&self, resource: &Resource) -> ProviderResult<State> {
        let id = resource.id.clone();
        let handler = self
            .data_source_handler(&id.resource_type)
            .map_err(|e| e.for_resource(id.clone()))?;
        let resource = prepare(&handler.schema(), resource, Operation::Read)
            .map_err(|e| e.for_resource(id.clone()))?;

        let ctx = self.context(Operation::Read, handler.timeouts());
        handler
            .read(&self.session, &ctx, &resource)
            .await
            .map_err(|e| e.for_resource(id))
    }

    pub fn resource_schemas(&self) -> Vec<ResourceSchema> {
        crate::schemas::all_schemas()
    }

    pub fn data_source_schemas(&self) -> Vec<ResourceSchema> {
        crate::schemas::data_source_schemas()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn unknown_type(kind: &str, resource_type: &str) -> ProviderError {
    ProviderError::new(
        ErrorKind::Validation,
        format!("unknown {} type {:?}", kind, resource_type),
    )
}

/// Fill in defaults and validate, before any request is sent
fn prepare(
    schema: &ResourceSchema,
    resource: &Resource,
    operation: Operation,
) -> ProviderResult<Resource> {
    let mut resource = resource.clone();
    schema.apply_defaults(&mut resource.attributes);
    schema
        .validate(&resource.attributes)
        .map_err(|errors| validation_error(&errors).during(operation))?;
    Ok(resource)
}

fn validation_error(errors: &[TypeError]) -> ProviderError {
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    ProviderError::validation(messages.join("; "))
}
