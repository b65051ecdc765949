//! HDInsight Hadoop cluster schema

use stratus_core::resource::Value;
use stratus_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema, types};

use super::types::{
    cluster_name, cluster_tier, location, normalize_location, resource_group_name, tags,
    target_instance_count,
};

pub const HEAD_NODE: &str = "head_node";
pub const WORKER_NODE: &str = "worker_node";
pub const ZOOKEEPER_NODE: &str = "zookeeper_node";

fn block(schema: BlockSchema) -> AttributeType {
    AttributeType::Block(Box::new(schema))
}

/// Attributes shared by every node type
fn node(extra: Option<AttributeSchema>) -> AttributeType {
    let mut schema = BlockSchema::new()
        .attribute(
            AttributeSchema::new("vm_size", types::non_empty_string())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("username", types::non_empty_string())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("password", types::non_empty_string())
                .sensitive()
                .force_new()
                .conflicts_with("ssh_keys"),
        )
        .attribute(
            AttributeSchema::new("ssh_keys", types::string_set())
                .write_only()
                .force_new(),
        )
        .attribute(AttributeSchema::new("subnet_id", AttributeType::String).force_new())
        .attribute(AttributeSchema::new("virtual_network_id", AttributeType::String).force_new())
        .min_items(1)
        .single();
    if let Some(extra) = extra {
        schema = schema.attribute(extra);
    }
    block(schema)
}

fn roles() -> AttributeType {
    block(
        BlockSchema::new()
            .attribute(AttributeSchema::new(HEAD_NODE, node(None)).required())
            .attribute(
                AttributeSchema::new(
                    WORKER_NODE,
                    node(Some(
                        AttributeSchema::new("target_instance_count", target_instance_count())
                            .required(),
                    )),
                )
                .required(),
            )
            .attribute(AttributeSchema::new(ZOOKEEPER_NODE, node(None)).required())
            .min_items(1)
            .single(),
    )
}

pub fn hadoop_cluster_schema() -> ResourceSchema {
    let component_version = BlockSchema::new()
        .attribute(AttributeSchema::new("hadoop", types::non_empty_string()).required())
        .min_items(1)
        .single();
    let gateway = BlockSchema::new()
        .attribute(AttributeSchema::new("enabled", AttributeType::Bool).with_default(Value::Bool(true)))
        .attribute(AttributeSchema::new("username", types::non_empty_string()).required())
        .attribute(
            AttributeSchema::new("password", types::non_empty_string())
                .required()
                .sensitive(),
        )
        .min_items(1)
        .single();
    let storage_account = BlockSchema::new()
        .attribute(
            AttributeSchema::new("storage_container_id", types::non_empty_string()).required(),
        )
        .attribute(
            AttributeSchema::new("storage_account_key", types::non_empty_string())
                .required()
                .sensitive(),
        )
        .attribute(AttributeSchema::new("is_default", AttributeType::Bool).required())
        .min_items(1);

    ResourceSchema::new("azurerm_hdinsight_hadoop_cluster")
        .with_description("An HDInsight cluster running Hadoop")
        .attribute(
            AttributeSchema::new("name", cluster_name())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("resource_group_name", resource_group_name())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("location", location())
                .required()
                .force_new()
                .normalized_by(normalize_location),
        )
        .attribute(
            AttributeSchema::new("cluster_version", types::non_empty_string())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("tier", cluster_tier())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("component_version", block(component_version))
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("gateway", block(gateway))
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("storage_account", block(storage_account))
                .required()
                .force_new()
                .write_only()
                .with_description("Not returned by the service"),
        )
        .attribute(
            AttributeSchema::new("roles", roles())
                .required()
                .with_description("Only the worker node count can change in place"),
        )
        .attribute(AttributeSchema::new("tags", tags()))
        .attribute(AttributeSchema::new("https_endpoint", AttributeType::String).computed())
        .attribute(AttributeSchema::new("ssh_endpoint", AttributeType::String).computed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use stratus_core::differ::{Diff, diff};
    use stratus_core::resource::{Resource, ResourceId, State};

    fn map(pairs: Vec<(&str, Value)>) -> Value {
        Value::Map(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    fn node(vm_size: &str, count: Option<i64>) -> Value {
        let mut pairs = vec![
            ("vm_size", Value::string(vm_size)),
            ("username", Value::string("acctestusrvm")),
            ("password", Value::string("AccTestvdSC4daf986!")),
        ];
        if let Some(count) = count {
            pairs.push(("target_instance_count", Value::Int(count)));
        }
        Value::List(vec![map(pairs)])
    }

    fn roles(worker_size: &str, count: i64) -> Value {
        Value::List(vec![map(vec![
            ("head_node", node("Standard_D3_V2", None)),
            ("worker_node", node(worker_size, Some(count))),
            ("zookeeper_node", node("Standard_D3_V2", None)),
        ])])
    }

    fn attrs(worker_size: &str, count: i64) -> HashMap<String, Value> {
        [
            ("name", Value::string("hdi1")),
            ("resource_group_name", Value::string("rg1")),
            ("location", Value::string("westeurope")),
            ("cluster_version", Value::string("4.0")),
            ("tier", Value::string("Standard")),
            ("component_version", Value::List(vec![map(vec![("hadoop", Value::string("3.1"))])])),
            (
                "gateway",
                Value::List(vec![map(vec![
                    ("enabled", Value::Bool(true)),
                    ("username", Value::string("acctestusrgw")),
                    ("password", Value::string("TerrAform123!")),
                ])]),
            ),
            (
                "storage_account",
                Value::List(vec![map(vec![
                    (
                        "storage_container_id",
                        Value::string("https://acct1.blob.core.windows.net/data"),
                    ),
                    ("storage_account_key", Value::string("a2V5")),
                    ("is_default", Value::Bool(true)),
                ])]),
            ),
            ("roles", roles(worker_size, count)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    fn current(worker_size: &str, count: i64) -> State {
        let mut attrs = attrs(worker_size, count);
        attrs.remove("storage_account");
        State::existing(ResourceId::new("azurerm_hdinsight_hadoop_cluster", "c"), attrs)
    }

    fn desired(worker_size: &str, count: i64) -> Resource {
        let mut resource = Resource::new("azurerm_hdinsight_hadoop_cluster", "c");
        resource.attributes = attrs(worker_size, count);
        resource
    }

    #[test]
    fn valid_configuration() {
        assert!(hadoop_cluster_schema().validate(&attrs("Standard_D4_V2", 3)).is_ok());
    }

    #[test]
    fn worker_count_is_out_of_range() {
        assert!(hadoop_cluster_schema().validate(&attrs("Standard_D4_V2", 26)).is_err());
    }

    #[test]
    fn unreadable_storage_account_is_not_drift() {
        let schema = hadoop_cluster_schema();
        assert_eq!(
            diff(&desired("Standard_D4_V2", 3), &current("Standard_D4_V2", 3), &schema),
            Diff::NoChange(ResourceId::new("azurerm_hdinsight_hadoop_cluster", "c"))
        );
    }

    #[test]
    fn resize_updates_but_vm_size_replaces() {
        let schema = hadoop_cluster_schema();
        assert!(matches!(
            diff(&desired("Standard_D4_V2", 5), &current("Standard_D4_V2", 3), &schema),
            Diff::Update { .. }
        ));
        assert!(matches!(
            diff(&desired("Standard_D13_V2", 3), &current("Standard_D4_V2", 3), &schema),
            Diff::Replace { .. }
        ));
    }
}
