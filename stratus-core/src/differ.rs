//! Differ - Compare desired state with current state
//!
//! Compares the configuration supplied by the orchestration layer with the
//! state read back from the Provider and decides what has to happen. The
//! resource schema drives the comparison: sets compare without regard to
//! order, attributes the provider computes are only compared when the caller
//! sets them, and a change to a force-new attribute turns an update into a
//! replacement.

use std::collections::HashMap;

use crate::resource::{Resource, ResourceId, State, Value};
use crate::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema};

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// A force-new attribute changed -> delete, then create
    Replace {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare desired state with current state to compute a Diff
pub fn diff(desired: &Resource, current: &State, schema: &ResourceSchema) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let changed = find_changed_attributes(&desired.attributes, &current.attributes, schema);

    if changed.is_empty() {
        return Diff::NoChange(desired.id.clone());
    }

    let forces_replacement = changed.iter().any(|name| {
        schema.attributes.get(name).is_some_and(|attr| {
            attr.force_new
                || match (&attr.attr_type, desired.attributes.get(name), current.attributes.get(name)) {
                    (AttributeType::Block(block), Some(to), Some(from)) => {
                        nested_forces_new(block, to, from)
                    }
                    _ => false,
                }
        })
    });

    if forces_replacement {
        Diff::Replace {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    } else {
        Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    }
}

/// Find changed attributes between desired and current state, sorted by name
fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
    schema: &ResourceSchema,
) -> Vec<String> {
    let mut changed = Vec::new();

    for (key, desired_value) in desired {
        let attr = schema.attributes.get(key);
        let same = match current.get(key) {
            Some(current_value) => match attr {
                Some(attr) => values_equal(
                    &attr.attr_type,
                    &attr.normalized(desired_value),
                    &attr.normalized(current_value),
                ),
                None => desired_value == current_value,
            },
            // An empty optional value matches an absent one
            None => desired_value.is_empty() || attr.is_some_and(|a| a.is_unreadable()),
        };
        if !same {
            changed.push(key.clone());
        }
    }

    // Attributes present remotely but dropped from configuration
    for (key, current_value) in current {
        if desired.contains_key(key) {
            continue;
        }
        let Some(attr) = schema.attributes.get(key) else {
            continue;
        };
        if removal_is_change(attr, current_value) {
            changed.push(key.clone());
        }
    }

    changed.sort();
    changed
}

fn removal_is_change(attr: &AttributeSchema, current: &Value) -> bool {
    if attr.computed || attr.required || !attr.is_settable() || attr.is_unreadable() {
        return false;
    }
    match &attr.default {
        Some(default) => !values_equal(&attr.attr_type, default, current),
        None => !current.is_empty(),
    }
}

/// Whether two block values differ in an attribute marked force-new
///
/// A block as a whole can be updatable while some of its fields are not.
fn nested_forces_new(block: &BlockSchema, to: &Value, from: &Value) -> bool {
    let (Value::List(xs), Value::List(ys)) = (to, from) else {
        return false;
    };
    if xs.len() != ys.len() {
        return block.attributes.values().any(|a| a.force_new);
    }
    xs.iter().zip(ys).any(|(x, y)| {
        let (Value::Map(xm), Value::Map(ym)) = (x, y) else {
            return false;
        };
        block.attributes.iter().any(|(k, a)| match (xm.get(k), ym.get(k)) {
            (Some(xv), Some(yv)) => {
                if values_equal(&a.attr_type, xv, yv) {
                    false
                } else if a.force_new {
                    true
                } else if let AttributeType::Block(inner) = &a.attr_type {
                    nested_forces_new(inner, xv, yv)
                } else {
                    false
                }
            }
            (Some(_), None) if a.is_unreadable() || a.computed => false,
            (Some(v), None) | (None, Some(v)) => a.force_new && !v.is_empty(),
            (None, None) => false,
        })
    })
}

/// Structural equality that honors set semantics, including inside blocks
pub fn values_equal(attr_type: &AttributeType, a: &Value, b: &Value) -> bool {
    match (attr_type, a, b) {
        (AttributeType::Set(inner), Value::List(xs), Value::List(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|x| ys.iter().any(|y| values_equal(inner, x, y)))
        }
        (AttributeType::List(inner), Value::List(xs), Value::List(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|(x, y)| values_equal(inner, x, y))
        }
        (AttributeType::Block(block), Value::List(xs), Value::List(ys)) => {
            let item_equal = |x: &Value, y: &Value| match (x, y) {
                (Value::Map(xm), Value::Map(ym)) => block.attributes.iter().all(|(k, a)| {
                    match (xm.get(k), ym.get(k)) {
                        (Some(xv), Some(yv)) => values_equal(&a.attr_type, xv, yv),
                        (Some(_), None) if a.is_unreadable() => true,
                        (Some(v), None) | (None, Some(v)) => a.computed || v.is_empty(),
                        (None, None) => true,
                    }
                }),
                _ => x == y,
            };
            xs.len() == ys.len()
                && if block.unordered {
                    xs.iter().all(|x| ys.iter().any(|y| item_equal(x, y)))
                } else {
                    xs.iter().zip(ys).all(|(x, y)| item_equal(x, y))
                }
        }
        (AttributeType::Map(inner), Value::Map(xm), Value::Map(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(k, xv)| ym.get(k).is_some_and(|yv| values_equal(inner, xv, yv)))
        }
        (AttributeType::Custom { base, .. }, _, _) => values_equal(base, a, b),
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeSchema, BlockSchema, types};

    fn schema() -> ResourceSchema {
        ResourceSchema::new("azurerm_cosmosdb_sql_role_definition")
            .attribute(
                AttributeSchema::new("account_name", AttributeType::String)
                    .required()
                    .force_new(),
            )
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("assignable_scopes", types::string_set()).required())
            .attribute(
                AttributeSchema::new(
                    "permissions",
                    AttributeType::Block(Box::new(
                        BlockSchema::new()
                            .attribute(AttributeSchema::new("data_actions", types::string_set())),
                    )),
                )
                .required(),
            )
            .attribute(AttributeSchema::new("throughput", AttributeType::Int).optional_computed())
    }

    fn state(attrs: Vec<(&str, Value)>) -> State {
        State::existing(
            ResourceId::new("azurerm_cosmosdb_sql_role_definition", "test"),
            attrs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    fn permissions(actions: &[&str]) -> Value {
        let mut block = HashMap::new();
        block.insert(
            "data_actions".to_string(),
            Value::string_list(actions.iter().copied()),
        );
        Value::List(vec![Value::Map(block)])
    }

    #[test]
    fn diff_create_when_not_exists() {
        let desired = Resource::new("azurerm_cosmosdb_sql_role_definition", "test");
        let current = State::not_found(desired.id.clone());

        let result = diff(&desired, &current, &schema());
        assert!(matches!(result, Diff::Create(_)));
    }

    #[test]
    fn diff_no_change_when_set_order_differs() {
        let desired = Resource::new("azurerm_cosmosdb_sql_role_definition", "test")
            .with_attribute("name", Value::string("reader"))
            .with_attribute("assignable_scopes", Value::string_list(["/a", "/b"]))
            .with_attribute("permissions", permissions(&["x/read", "y/read"]));
        let current = state(vec![
            ("name", Value::string("reader")),
            ("assignable_scopes", Value::string_list(["/b", "/a"])),
            ("permissions", permissions(&["y/read", "x/read"])),
            ("throughput", Value::Int(400)),
        ]);

        let result = diff(&desired, &current, &schema());
        assert!(matches!(result, Diff::NoChange(_)), "{:?}", result);
    }

    #[test]
    fn diff_update_when_different() {
        let desired = Resource::new("azurerm_cosmosdb_sql_role_definition", "test")
            .with_attribute("name", Value::string("writer"));
        let current = state(vec![("name", Value::string("reader"))]);

        match diff(&desired, &current, &schema()) {
            Diff::Update {
                changed_attributes, ..
            } => assert_eq!(changed_attributes, vec!["name".to_string()]),
            other => panic!("Expected Update, got {:?}", other),
        }
    }

    #[test]
    fn diff_replace_on_force_new_change() {
        let desired = Resource::new("azurerm_cosmosdb_sql_role_definition", "test")
            .with_attribute("account_name", Value::string("acct2"))
            .with_attribute("name", Value::string("writer"));
        let current = state(vec![
            ("account_name", Value::string("acct1")),
            ("name", Value::string("reader")),
        ]);

        match diff(&desired, &current, &schema()) {
            Diff::Replace {
                changed_attributes, ..
            } => assert_eq!(
                changed_attributes,
                vec!["account_name".to_string(), "name".to_string()]
            ),
            other => panic!("Expected Replace, got {:?}", other),
        }
    }

    #[test]
    fn unreadable_attributes_missing_remotely_are_not_drift() {
        let schema = ResourceSchema::new("azurerm_hdinsight_hadoop_cluster")
            .attribute(
                AttributeSchema::new("password", AttributeType::String)
                    .required()
                    .sensitive(),
            )
            .attribute(
                AttributeSchema::new("storage_key", AttributeType::String)
                    .force_new()
                    .write_only(),
            );
        let desired = Resource::new("azurerm_hdinsight_hadoop_cluster", "test")
            .with_attribute("password", Value::string("s3cret!"))
            .with_attribute("storage_key", Value::string("abc"));
        let current = State::existing(desired.id.clone(), HashMap::new());

        assert!(matches!(
            diff(&desired, &current, &schema),
            Diff::NoChange(_)
        ));
    }

    #[test]
    fn normalized_spellings_are_not_drift() {
        let schema = ResourceSchema::new("azurerm_hdinsight_hadoop_cluster").attribute(
            AttributeSchema::new("location", AttributeType::String)
                .required()
                .force_new()
                .normalized_by(|s| s.replace(' ', "").to_lowercase()),
        );
        let desired = Resource::new("azurerm_hdinsight_hadoop_cluster", "test")
            .with_attribute("location", Value::string("West Europe"));

        let same = state(vec![("location", Value::string("westeurope"))]);
        assert!(matches!(diff(&desired, &same, &schema), Diff::NoChange(_)));

        let moved = state(vec![("location", Value::string("northeurope"))]);
        assert!(matches!(diff(&desired, &moved, &schema), Diff::Replace { .. }));
    }

    #[test]
    fn nested_force_new_field_forces_replacement() {
        let node = |size: &str, count: i64| {
            let mut block = HashMap::new();
            block.insert("vm_size".to_string(), Value::string(size));
            block.insert("target_instance_count".to_string(), Value::Int(count));
            Value::List(vec![Value::Map(block)])
        };
        let schema = ResourceSchema::new("azurerm_hdinsight_hadoop_cluster").attribute(
            AttributeSchema::new(
                "worker_node",
                AttributeType::Block(Box::new(
                    BlockSchema::new()
                        .attribute(
                            AttributeSchema::new("vm_size", AttributeType::String)
                                .required()
                                .force_new(),
                        )
                        .attribute(
                            AttributeSchema::new("target_instance_count", AttributeType::Int)
                                .required(),
                        )
                        .single(),
                )),
            )
            .required(),
        );
        let current = State::existing(
            ResourceId::new("azurerm_hdinsight_hadoop_cluster", "test"),
            [("worker_node".to_string(), node("Standard_D3_V2", 2))].into(),
        );

        let resize = Resource::new("azurerm_hdinsight_hadoop_cluster", "test")
            .with_attribute("worker_node", node("Standard_D3_V2", 3));
        assert!(matches!(diff(&resize, &current, &schema), Diff::Update { .. }));

        let resized_vm = Resource::new("azurerm_hdinsight_hadoop_cluster", "test")
            .with_attribute("worker_node", node("Standard_D4_V2", 2));
        assert!(matches!(diff(&resized_vm, &current, &schema), Diff::Replace { .. }));
    }

    #[test]
    fn nested_set_change_is_detected() {
        let desired = Resource::new("azurerm_cosmosdb_sql_role_definition", "test")
            .with_attribute("permissions", permissions(&["x/read"]));
        let current = state(vec![("permissions", permissions(&["x/read", "y/read"]))]);

        let result = diff(&desired, &current, &schema());
        assert!(matches!(result, Diff::Update { .. }));
        assert!(result.is_change());
    }
}
