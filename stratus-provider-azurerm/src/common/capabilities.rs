//! Database account capability checks

use crate::sdk::cosmosdb::DatabaseAccountGetResults;

const SERVERLESS: &str = "EnableServerless";

/// Whether the account bills per request instead of provisioned throughput
///
/// Serverless accounts reject every throughput endpoint, so callers skip
/// throughput reads for them.
pub fn is_serverless_capacity_mode(account: &DatabaseAccountGetResults) -> bool {
    account
        .properties
        .as_ref()
        .and_then(|p| p.capabilities.as_ref())
        .is_some_and(|caps| caps.iter().any(|c| c.name.as_deref() == Some(SERVERLESS)))
}
