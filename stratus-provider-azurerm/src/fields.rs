//! Typed access to attribute maps
//!
//! Handlers parse their configuration out of a validated attribute map with
//! [`Fields`], and build state back up with the constructors at the bottom.

use std::collections::{BTreeMap, HashMap};

use stratus_core::provider::{ProviderError, ProviderResult};
use stratus_core::resource::Value;

/// Read-only view of an attribute map, or of one nested block
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    attrs: &'a HashMap<String, Value>,
}

impl<'a> Fields<'a> {
    pub fn new(attrs: &'a HashMap<String, Value>) -> Self {
        Self { attrs }
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.attrs.get(name)
    }

    /// A string attribute; empty strings count as unset
    pub fn str(&self, name: &str) -> Option<&'a str> {
        self.attrs
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn required_str(&self, name: &str) -> ProviderResult<&'a str> {
        self.str(name)
            .ok_or_else(|| ProviderError::validation(format!("`{}` is required", name)))
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.attrs.get(name).and_then(Value::as_int)
    }

    pub fn bool_or(&self, name: &str, default: bool) -> bool {
        self.attrs
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    /// Items of a string list or set, in configuration order
    pub fn strings(&self, name: &str) -> Vec<String> {
        self.attrs
            .get(name)
            .and_then(Value::as_list)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn string_map(&self, name: &str) -> BTreeMap<String, String> {
        self.attrs
            .get(name)
            .and_then(Value::as_map)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every instance of a nested block
    pub fn blocks(&self, name: &str) -> Vec<Fields<'a>> {
        self.attrs
            .get(name)
            .and_then(Value::as_list)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_map)
                    .map(Fields::new)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The first instance of a nested block
    pub fn block(&self, name: &str) -> Option<Fields<'a>> {
        self.blocks(name).into_iter().next()
    }

    pub fn required_block(&self, name: &str) -> ProviderResult<Fields<'a>> {
        self.block(name)
            .ok_or_else(|| ProviderError::validation(format!("a `{}` block is required", name)))
    }
}

/// A single nested block instance
pub fn block<I>(pairs: I) -> Value
where
    I: IntoIterator<Item = (&'static str, Value)>,
{
    Value::Map(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

/// A block attribute holding one instance
pub fn single_block<I>(pairs: I) -> Value
where
    I: IntoIterator<Item = (&'static str, Value)>,
{
    Value::List(vec![block(pairs)])
}

/// A string set in sorted order
pub fn sorted_set<I, S>(items: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut items: Vec<String> = items.into_iter().map(Into::into).collect();
    items.sort();
    items.dedup();
    Value::string_list(items)
}

pub fn string_map(map: &BTreeMap<String, String>) -> Value {
    Value::Map(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::string(v)))
            .collect(),
    )
}

/// Fold optional string fields into an empty string when unset
pub fn string_or_empty(s: Option<&str>) -> Value {
    Value::string(s.unwrap_or_default())
}
