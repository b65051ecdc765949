//! Provider - Trait abstracting resource operations
//!
//! A Provider defines operations for a specific infrastructure (Azure, etc.).
//! It is responsible for turning validated configuration into remote API calls
//! and for turning remote responses back into [`State`].

use std::future::Future;
use std::pin::Pin;

use crate::resource::{Resource, ResourceId, State};
use crate::schema::ResourceSchema;

/// Classification of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Configuration rejected before any remote call
    Validation,
    /// Remote object does not exist
    NotFound,
    /// Create found an object that must be imported instead
    AlreadyExists,
    /// Network or decoding failure
    Transport,
    /// Remote rejected the request
    Remote,
    /// A long-running operation reached a failed terminal state
    OperationFailed,
    /// A long-running operation did not finish before its deadline
    Timeout,
    /// The caller cancelled the operation
    Cancelled,
    /// A resource identifier could not be parsed
    InvalidIdentifier,
    /// Provider-level configuration is missing or malformed
    Configuration,
}

/// The lifecycle operation an error happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub fn verb(&self) -> &'static str {
        match self {
            Operation::Create => "creating",
            Operation::Read => "reading",
            Operation::Update => "updating",
            Operation::Delete => "deleting",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.verb())
    }
}

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub operation: Option<Operation>,
    pub message: String,
    pub resource_id: Option<ResourceId>,
    /// Remote identifier the operation was acting on
    pub identifier: Option<String>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}.{}] ", id.resource_type, id.name)?;
        }
        match (&self.operation, &self.identifier) {
            (Some(op), Some(identifier)) => write!(f, "{} {}: ", op.verb(), identifier)?,
            (Some(op), None) => write!(f, "{}: ", op.verb())?,
            (None, Some(identifier)) => write!(f, "{}: ", identifier)?,
            (None, None) => {}
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            operation: None,
            message: message.into(),
            resource_id: None,
            identifier: None,
            cause: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// The object already exists and has to be imported into state
    pub fn already_exists(resource_type: &str, identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        Self::new(
            ErrorKind::AlreadyExists,
            format!(
                "a resource with the ID {:?} already exists - to be managed it needs to be imported into the state; see the import documentation for {:?}",
                identifier, resource_type
            ),
        )
        .with_identifier(identifier)
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn during(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Main Provider trait
///
/// Each infrastructure provider implements this trait.
/// All operations are async and involve side effects.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "azurerm")
    fn name(&self) -> &'static str;

    /// Schemas of the resource types this Provider can manage
    fn schemas(&self) -> Vec<ResourceSchema>;

    /// Schemas of the data sources this Provider can read
    fn data_source_schemas(&self) -> Vec<ResourceSchema>;

    /// Get the current state of a resource
    ///
    /// The identifier is the remote ID recorded on create or supplied on
    /// import. Returns `State::not_found()` if the resource does not exist.
    fn read(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<State>>;

    /// Read a data source
    ///
    /// Unlike [`Provider::read`], a missing remote object is an error.
    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Create a resource
    ///
    /// Returns State with identifier set to the remote ID
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Update a resource in place
    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Delete a resource
    ///
    /// Deleting an object that is already gone succeeds.
    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>>;
}

/// Provider implementation for Box<dyn Provider>
/// This enables dynamic dispatch for Providers
impl Provider for Box<dyn Provider> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn schemas(&self) -> Vec<ResourceSchema> {
        (**self).schemas()
    }

    fn data_source_schemas(&self) -> Vec<ResourceSchema> {
        (**self).data_source_schemas()
    }

    fn read(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read(id, identifier)
    }

    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read_data_source(resource)
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).create(resource)
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).update(id, identifier, from, to)
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).delete(id, identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mock Provider for testing
    struct MockProvider;

    impl Provider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn schemas(&self) -> Vec<ResourceSchema> {
            vec![ResourceSchema::new("mock_thing")]
        }

        fn data_source_schemas(&self) -> Vec<ResourceSchema> {
            vec![]
        }

        fn read(&self, id: &ResourceId, _identifier: &str) -> BoxFuture<'_, ProviderResult<State>> {
            let id = id.clone();
            Box::pin(async move { Ok(State::not_found(id)) })
        }

        fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            let id = resource.id.clone();
            Box::pin(async move {
                Err(ProviderError::not_found("no such thing")
                    .for_resource(id)
                    .during(Operation::Read))
            })
        }

        fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            let id = resource.id.clone();
            let attrs = resource.attributes.clone();
            Box::pin(async move { Ok(State::existing(id, attrs).with_identifier("mock-id-123")) })
        }

        fn update(
            &self,
            id: &ResourceId,
            _identifier: &str,
            _from: &State,
            to: &Resource,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let id = id.clone();
            let attrs = to.attributes.clone();
            Box::pin(async move { Ok(State::existing(id, attrs)) })
        }

        fn delete(&self, _id: &ResourceId, _identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn mock_provider_read_returns_not_found() {
        let provider: Box<dyn Provider> = Box::new(MockProvider);
        let id = ResourceId::new("test", "example");
        let state = provider.read(&id, "x").await.unwrap();
        assert!(!state.exists);
        assert_eq!(provider.schemas().len(), 1);
    }

    #[tokio::test]
    async fn mock_provider_create_returns_existing() {
        let provider = MockProvider;
        let resource = Resource::new("test", "example");
        let state = provider.create(&resource).await.unwrap();
        assert!(state.exists);
        assert_eq!(state.identifier, Some("mock-id-123".to_string()));
    }

    #[tokio::test]
    async fn data_source_not_found_is_error() {
        let provider = MockProvider;
        let resource = Resource::new("test", "example").with_read_only(true);
        let err = provider.read_data_source(&resource).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "[test.example] reading: no such thing");
    }

    #[test]
    fn error_display_includes_operation_and_identifier() {
        let err = ProviderError::new(ErrorKind::Timeout, "operation timed out")
            .for_resource(ResourceId::new("azurerm_cosmosdb_sql_database", "db"))
            .during(Operation::Create)
            .with_identifier("/subscriptions/s/resourceGroups/rg");
        assert_eq!(
            err.to_string(),
            "[azurerm_cosmosdb_sql_database.db] creating /subscriptions/s/resourceGroups/rg: operation timed out"
        );
    }

    #[test]
    fn already_exists_names_type_and_identifier() {
        let err = ProviderError::already_exists("azurerm_cosmosdb_sql_trigger", "/x/y");
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
        assert_eq!(err.identifier.as_deref(), Some("/x/y"));
        assert!(err.message.contains("azurerm_cosmosdb_sql_trigger"));
        assert!(err.message.contains("/x/y"));
    }
}
