// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Transformer for native-image JSON descriptors (reflection, resources,
//! proxies, serialization, JNI).
//!
//! Two shapes are understood:
//!
//! * a top-level array of records: `name` and `condition.typeReachable` are
//!   relocated in every object record;
//! * a top-level object: the `name` of every object in its `bundles` list is
//!   relocated.
//!
//! Anything the transformer does not target is carried through the generic
//! `serde_json::Value` tree untouched, fields keep their document order.
//! Object-shaped descriptors never raise the watermark; array-shaped ones
//! raise it whenever a record actually changed.

use std::collections::BTreeMap;
use std::io::Read;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::TransformError;
use crate::json_format::to_descriptor_vec;
use crate::rule::{RuleError, RuleSet};
use crate::transformer::{read_content, EmittedResource, ResourceTransformer, NATIVE_IMAGE_PREFIX};
use crate::watermark::Watermark;

/// File name suffix of JSON descriptors.
pub const JSON_SUFFIX: &str = ".json";

const NAME: &str = "name";
const CONDITION: &str = "condition";
const TYPE_REACHABLE: &str = "typeReachable";
const BUNDLES: &str = "bundles";

/// Relocates type names in native-image JSON descriptors.
#[derive(Debug, Default)]
pub struct ReflectConfigTransformer {
    resources: BTreeMap<String, Value>,
    watermark: Watermark,
}

impl ReflectConfigTransformer {
    /// Fresh transformer with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded document for `path`.
    pub fn resource(&self, path: &str) -> Option<&Value> {
        self.resources.get(path)
    }

    /// Current watermark.
    pub fn watermark(&self) -> Watermark {
        self.watermark
    }
}

impl ResourceTransformer for ReflectConfigTransformer {
    fn name(&self) -> &'static str {
        "native-image-json"
    }

    fn can_transform_resource(&self, path: &str) -> bool {
        path.starts_with(NATIVE_IMAGE_PREFIX) && path.ends_with(JSON_SUFFIX)
    }

    fn process_resource(
        &mut self,
        path: &str,
        content: &mut dyn Read,
        rules: &RuleSet,
        timestamp: i64,
    ) -> Result<(), TransformError> {
        info!(resource = path, "processing");
        let bytes = read_content(path, content)?;
        // Only the first value is read; trailing content is ignored.
        let Some(parsed) = serde_json::Deserializer::from_slice(&bytes)
            .into_iter::<Value>()
            .next()
        else {
            warn!(resource = path, "empty descriptor, nothing recorded");
            return Ok(());
        };
        let document = parsed.map_err(|source| TransformError::MalformedJson {
            path: path.to_owned(),
            source,
        })?;
        let rule_error = |source: RuleError| TransformError::Rule {
            path: path.to_owned(),
            source,
        };

        let relocated = match document {
            Value::Array(records) => {
                let (records, changed) = relocate_records(records, rules).map_err(rule_error)?;
                if changed && self.watermark.raise(timestamp) {
                    debug!(resource = path, timestamp, "raised watermark");
                }
                Value::Array(records)
            }
            Value::Object(config) => {
                Value::Object(relocate_bundles(config, rules).map_err(rule_error)?)
            }
            _ => {
                warn!(
                    resource = path,
                    "descriptor is neither an array nor an object, nothing recorded"
                );
                return Ok(());
            }
        };
        self.resources.insert(path.to_owned(), relocated);
        Ok(())
    }

    fn has_transformed_resource(&self) -> bool {
        !self.resources.is_empty()
    }

    fn emitted(&self) -> Result<Vec<EmittedResource>, TransformError> {
        let timestamp = self.watermark.emitted();
        self.resources
            .iter()
            .map(|(path, document)| {
                let bytes =
                    to_descriptor_vec(document).map_err(|source| TransformError::Serialize {
                        path: path.clone(),
                        source,
                    })?;
                Ok(EmittedResource {
                    path: path.clone(),
                    timestamp,
                    bytes,
                })
            })
            .collect()
    }
}

/// Relocate a string slot in place; returns whether it changed.
fn relocate_slot(slot: &mut String, rules: &RuleSet) -> Result<bool, RuleError> {
    let relocated = rules.relocate(slot)?;
    if relocated == *slot {
        return Ok(false);
    }
    debug!(from = %slot, to = %relocated, "relocated descriptor type");
    *slot = relocated;
    Ok(true)
}

/// Rebuild a record array. Non-object entries pass through. Returns the new
/// records and whether any record changed.
fn relocate_records(
    records: Vec<Value>,
    rules: &RuleSet,
) -> Result<(Vec<Value>, bool), RuleError> {
    let mut changed = false;
    let mut relocated = Vec::with_capacity(records.len());
    for entry in records {
        let mut record = match entry {
            Value::Object(record) => record,
            other => {
                relocated.push(other);
                continue;
            }
        };
        if let Some(Value::String(name)) = record.get_mut(NAME) {
            changed |= relocate_slot(name, rules)?;
        }
        if let Some(Value::Object(condition)) = record.get_mut(CONDITION) {
            if let Some(Value::String(reachable)) = condition.get_mut(TYPE_REACHABLE) {
                changed |= relocate_slot(reachable, rules)?;
            }
        }
        relocated.push(Value::Object(record));
    }
    Ok((relocated, changed))
}

/// Relocate the `name` of every bundle; everything else is kept as parsed.
fn relocate_bundles(
    mut config: Map<String, Value>,
    rules: &RuleSet,
) -> Result<Map<String, Value>, RuleError> {
    if let Some(Value::Array(bundles)) = config.get_mut(BUNDLES) {
        for bundle in bundles {
            if let Value::Object(bundle) = bundle {
                if let Some(Value::String(name)) = bundle.get_mut(NAME) {
                    relocate_slot(name, rules)?;
                }
            }
        }
    }
    Ok(config)
}
