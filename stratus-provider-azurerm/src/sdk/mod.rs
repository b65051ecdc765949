//! REST client layer for Azure Resource Manager
//!
//! One module per service and API version, each exposing a thin client whose
//! methods map one-to-one onto REST operations. GETs decode into typed models;
//! mutating calls return a [`Poller`] that must be driven to completion.

pub mod client;
pub mod cosmosdb;
pub mod error;
pub mod hdinsight;
pub mod lro;
pub mod mssql;
pub mod rbacs;
pub mod restorables;
pub mod transport;

#[cfg(test)]
pub(crate) mod fake;

pub use client::ArmClient;
pub use error::ApiError;
pub use lro::Poller;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

/// Every service client, sharing one transport
#[derive(Debug, Clone)]
pub struct Clients {
    pub cosmos: cosmosdb::CosmosDbClient,
    pub rbacs: rbacs::RbacsClient,
    pub restorables: restorables::RestorablesClient,
    pub sql: mssql::SqlClient,
    pub hdinsight: hdinsight::ClustersClient,
}

impl Clients {
    pub fn new(client: ArmClient) -> Self {
        Self {
            cosmos: cosmosdb::CosmosDbClient::new(client.clone()),
            rbacs: rbacs::RbacsClient::new(client.clone()),
            restorables: restorables::RestorablesClient::new(client.clone()),
            sql: mssql::SqlClient::new(client.clone()),
            hdinsight: hdinsight::ClustersClient::new(client),
        }
    }
}
