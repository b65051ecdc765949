//! HTTP integration tests for the management API client
//!
//! These run the reqwest transport against a local mock server and check
//! authentication, error decoding, paging and long-running operations.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use stratus_core::poll::PollOutcome;
use stratus_core::provider::{ErrorKind, Operation};
use stratus_core::resource::{Resource, Value};
use stratus_core::timeouts::OperationContext;
use stratus_provider_azurerm::sdk::{ApiError, ArmClient, ReqwestTransport};
use stratus_provider_azurerm::{AzureRmProvider, ProviderConfig};
use url::Url;
use wiremock::matchers::{bearer_token, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SUB: &str = "00000000-0000-0000-0000-000000000000";
const API_VERSION: &str = "2023-04-15";

fn client(server: &MockServer) -> ArmClient {
    let transport = ReqwestTransport::new("test-token").unwrap();
    ArmClient::new(Arc::new(transport), Url::parse(&server.uri()).unwrap())
}

fn ctx(operation: Operation) -> OperationContext {
    OperationContext::new(operation, Duration::from_secs(30), Duration::from_millis(10))
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

mod http_client_tests {
    use super::*;

    /// Requests carry the bearer token and the pinned API version
    #[tokio::test]
    async fn test_get_sends_token_and_api_version() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subscriptions/sub/resourceGroups/rg1"))
            .and(bearer_token("test-token"))
            .and(query_param("api-version", API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "rg1"})))
            .expect(1)
            .mount(&server)
            .await;

        let named: Named = client(&server)
            .get("/subscriptions/sub/resourceGroups/rg1", API_VERSION)
            .await
            .unwrap();
        assert_eq!(named.name, "rg1");
    }

    /// A 404 maps to NotFound regardless of body
    #[tokio::test]
    async fn test_missing_resource_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": "NotFound", "message": "Resource not found"}
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .get::<Named>("/subscriptions/sub/resourceGroups/gone", API_VERSION)
            .await
            .unwrap_err();
        assert!(err.was_not_found());
    }

    /// Other failures keep the remote error code and message
    #[tokio::test]
    async fn test_error_envelope_is_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": {"code": "Conflict", "message": "Operation in progress"}
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .put("/subscriptions/sub/resourceGroups/rg1", API_VERSION, &json!({}))
            .await
            .unwrap_err();
        match err {
            ApiError::Remote {
                status,
                code,
                message,
                ..
            } => {
                assert_eq!(status, 409);
                assert_eq!(code, "Conflict");
                assert_eq!(message, "Operation in progress");
            }
            other => panic!("expected a remote error, got {other:?}"),
        }
    }

    /// Lists follow nextLink until it runs out
    #[tokio::test]
    async fn test_list_follows_next_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"name": "a"}, {"name": "b"}],
                "nextLink": format!("{}/items/page2", server.uri())
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/items/page2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"value": [{"name": "c"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let items: Vec<Named> = client(&server).list("/items", API_VERSION).await.unwrap();
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}

mod long_running_operation_tests {
    use super::*;

    /// An Azure-AsyncOperation URL is polled until it succeeds
    #[tokio::test]
    async fn test_async_operation_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/things/t1"))
            .respond_with(ResponseTemplate::new(201).insert_header(
                "Azure-AsyncOperation",
                format!("{}/operations/op1", server.uri()).as_str(),
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/op1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status": "InProgress"})),
            )
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/op1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})),
            )
            .mount(&server)
            .await;

        let poller = client(&server)
            .put("/things/t1", API_VERSION, &json!({"properties": {}}))
            .await
            .unwrap();
        assert!(!poller.is_finished());
        let outcome = poller.wait(&ctx(Operation::Create)).await.unwrap();
        assert_eq!(outcome, PollOutcome::Succeeded);
    }

    /// A failed operation reports the remote error
    #[tokio::test]
    async fn test_async_operation_fails() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(201).insert_header(
                "Azure-AsyncOperation",
                format!("{}/operations/op2", server.uri()).as_str(),
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/op2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "Failed",
                "error": {"code": "BadRequest", "message": "invalid key"}
            })))
            .mount(&server)
            .await;

        let outcome = client(&server)
            .put("/things/t2", API_VERSION, &json!({}))
            .await
            .unwrap()
            .wait(&ctx(Operation::Create))
            .await
            .unwrap();
        assert_eq!(outcome, PollOutcome::Failed("BadRequest: invalid key".to_string()));

        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.kind, ErrorKind::OperationFailed);
    }

    /// A 202 with Location is polled until the location stops answering 202
    #[tokio::test]
    async fn test_delete_polls_location() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/things/t3"))
            .respond_with(ResponseTemplate::new(202).insert_header(
                "Location",
                format!("{}/operationResults/op3", server.uri()).as_str(),
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operationResults/op3"))
            .respond_with(ResponseTemplate::new(202))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operationResults/op3"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client(&server)
            .delete("/things/t3", API_VERSION)
            .await
            .unwrap()
            .wait(&ctx(Operation::Delete))
            .await
            .unwrap();
        assert!(outcome.is_success());
    }
}

mod provider_tests {
    use super::*;

    fn config(server: &MockServer) -> ProviderConfig {
        ProviderConfig {
            subscription_id: SUB.to_string(),
            access_token: "test-token".to_string(),
            endpoint: Url::parse(&server.uri()).unwrap(),
            poll_interval: Duration::from_millis(10),
            timeout: None,
        }
    }

    fn procedure_path() -> String {
        format!(
            "/subscriptions/{SUB}/resourceGroups/rg1/providers/Microsoft.DocumentDB/databaseAccounts/acct-http/sqlDatabases/db1/containers/c1/storedProcedures/sp1"
        )
    }

    fn procedure() -> Resource {
        Resource::new("azurerm_cosmosdb_sql_stored_procedure", "sp1")
            .with_attribute("name", Value::string("sp1"))
            .with_attribute("resource_group_name", Value::string("rg1"))
            .with_attribute("account_name", Value::string("acct-http"))
            .with_attribute("database_name", Value::string("db1"))
            .with_attribute("container_name", Value::string("c1"))
            .with_attribute("body", Value::string("function () {}"))
    }

    /// Create probes for an existing procedure, writes it and reads it back
    #[tokio::test]
    async fn test_create_stored_procedure_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(procedure_path()))
            .respond_with(ResponseTemplate::new(404))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(procedure_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "sp1",
                "properties": {"resource": {"id": "sp1", "body": "function () {}"}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(procedure_path()))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let provider = AzureRmProvider::new(config(&server)).unwrap();
        let state = provider.create_resource(&procedure()).await.unwrap();

        assert!(state.exists);
        assert_eq!(state.identifier, Some(procedure_path()));
        assert_eq!(state.attributes["body"], Value::string("function () {}"));
    }

    /// An existing procedure is refused before any write
    #[tokio::test]
    async fn test_create_refuses_existing_procedure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(procedure_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "properties": {"resource": {"id": "sp1", "body": "function () {}"}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let provider = AzureRmProvider::new(config(&server)).unwrap();
        let err = provider.create_resource(&procedure()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
    }
}
