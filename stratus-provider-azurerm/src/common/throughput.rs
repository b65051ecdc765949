//! Provisioned throughput: manual RU/s or an autoscale ceiling

use std::collections::HashMap;

use stratus_core::provider::{ProviderError, ProviderResult};
use stratus_core::resource::Value;

use crate::fields::{self, Fields};
use crate::sdk::cosmosdb::{
    AutoscaleSettings, CreateUpdateOptions, ThroughputSettingsGetResults,
    ThroughputSettingsResource, ThroughputSettingsUpdateParameters,
    ThroughputSettingsUpdateProperties,
};

pub const THROUGHPUT: &str = "throughput";
pub const AUTOSCALE_SETTINGS: &str = "autoscale_settings";
pub const MAX_THROUGHPUT: &str = "max_throughput";

/// Throughput as it appears in configuration or state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Throughput {
    pub manual: Option<i64>,
    pub autoscale_max: Option<i64>,
}

impl Throughput {
    pub fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            manual: fields.int(THROUGHPUT),
            autoscale_max: expand_autoscale_settings(fields).and_then(|a| a.max_throughput),
        }
    }

    pub fn is_autoscale(&self) -> bool {
        self.autoscale_max.is_some()
    }

    /// Options for the initial create; a zero throughput is left to the service
    pub fn expand_options(&self) -> Option<CreateUpdateOptions> {
        let options = CreateUpdateOptions {
            throughput: self.manual.filter(|t| *t != 0),
            autoscale_settings: self.autoscale_max.map(|max| AutoscaleSettings {
                max_throughput: Some(max),
            }),
        };
        (options != CreateUpdateOptions::default()).then_some(options)
    }

    /// Body for the throughput settings endpoint; autoscale wins when both are set
    pub fn expand_update(&self) -> ThroughputSettingsUpdateParameters {
        let resource = match self.autoscale_max {
            Some(max) => ThroughputSettingsResource {
                throughput: None,
                autoscale_settings: Some(AutoscaleSettings {
                    max_throughput: Some(max),
                }),
            },
            None => ThroughputSettingsResource {
                throughput: self.manual,
                autoscale_settings: None,
            },
        };
        ThroughputSettingsUpdateParameters {
            properties: ThroughputSettingsUpdateProperties { resource },
        }
    }
}

/// The `autoscale_settings` block, when configured with a ceiling
pub fn expand_autoscale_settings(fields: &Fields<'_>) -> Option<AutoscaleSettings> {
    let block = fields.block(AUTOSCALE_SETTINGS)?;
    let max = block.int(MAX_THROUGHPUT)?;
    Some(AutoscaleSettings {
        max_throughput: Some(max),
    })
}

/// Always a list; empty when autoscale is off
pub fn flatten_autoscale_settings(settings: Option<&AutoscaleSettings>) -> Value {
    match settings.and_then(|s| s.max_throughput) {
        Some(max) => fields::single_block([(MAX_THROUGHPUT, Value::Int(max))]),
        None => Value::List(Vec::new()),
    }
}

/// Write the throughput fields of a settings response into state
///
/// An autoscale resource reports its current RU/s in `throughput` as well;
/// only the ceiling is kept so configuration and state line up.
pub fn flatten_throughput(
    results: Option<&ThroughputSettingsGetResults>,
    attrs: &mut HashMap<String, Value>,
) {
    let resource = results
        .and_then(|r| r.properties.as_ref())
        .and_then(|p| p.resource.as_ref());
    let autoscale = resource.and_then(|r| r.autoscale_settings.as_ref());

    attrs.remove(THROUGHPUT);
    if autoscale.is_none()
        && let Some(throughput) = resource.and_then(|r| r.throughput)
    {
        attrs.insert(THROUGHPUT.to_string(), Value::Int(throughput));
    }
    attrs.insert(
        AUTOSCALE_SETTINGS.to_string(),
        flatten_autoscale_settings(autoscale),
    );
}

/// Switching between manual and autoscale has to happen outside this provider
pub fn check_for_change_from_autoscale_and_manual(
    from: &Throughput,
    to: &Throughput,
) -> ProviderResult<()> {
    if from.is_autoscale() && !to.is_autoscale() && to.manual.is_some() {
        return Err(ProviderError::validation(
            "switching from autoscale to manually provisioned throughput is not supported; change it in the Azure portal first",
        ));
    }
    if !from.is_autoscale() && from.manual.is_some() && to.is_autoscale() {
        return Err(ProviderError::validation(
            "switching from manually provisioned throughput to autoscale is not supported; change it in the Azure portal first",
        ));
    }
    Ok(())
}

/// Whether the configured throughput differs from what state recorded
pub fn has_throughput_change(from: &Throughput, to: &Throughput) -> bool {
    let manual_changed = to.manual.is_some() && to.manual != from.manual;
    let autoscale_changed = to.autoscale_max.is_some() && to.autoscale_max != from.autoscale_max;
    manual_changed || autoscale_changed
}
