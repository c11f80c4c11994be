// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Transformer for `native-image.properties` descriptors.

use std::collections::BTreeMap;
use std::io::Read;

use tracing::{debug, info};

use crate::args::rewrite_args;
use crate::error::TransformError;
use crate::properties::Properties;
use crate::rule::RuleSet;
use crate::transformer::{read_content, EmittedResource, ResourceTransformer, NATIVE_IMAGE_PREFIX};
use crate::watermark::Watermark;

/// File name suffix of native-image build argument descriptors.
pub const PROPERTIES_SUFFIX: &str = "native-image.properties";

/// Property holding the native-image command line.
pub const ARGS_PROPERTY: &str = "Args";

/// Rewrites class lists in the `Args` property of native-image descriptors.
///
/// Every eligible resource is recorded, changed or not, so it is re-emitted
/// with the rest. The watermark is raised whenever a class-list flag was
/// rewritten.
#[derive(Debug, Default)]
pub struct NativeImagePropertiesTransformer {
    resources: BTreeMap<String, Properties>,
    watermark: Watermark,
}

impl NativeImagePropertiesTransformer {
    /// Identifier written into the header comment of emitted files.
    pub const IDENTIFIER: &'static str = "native_relocate_core::NativeImagePropertiesTransformer";

    /// Fresh transformer with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded property set for `path`.
    pub fn resource(&self, path: &str) -> Option<&Properties> {
        self.resources.get(path)
    }

    /// Current watermark.
    pub fn watermark(&self) -> Watermark {
        self.watermark
    }
}

impl ResourceTransformer for NativeImagePropertiesTransformer {
    fn name(&self) -> &'static str {
        "native-image-properties"
    }

    fn can_transform_resource(&self, path: &str) -> bool {
        path.starts_with(NATIVE_IMAGE_PREFIX) && path.ends_with(PROPERTIES_SUFFIX)
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
        let mut properties =
            Properties::load(&bytes).map_err(|source| TransformError::MalformedProperties {
                path: path.to_owned(),
                source,
            })?;

        let rewritten = properties
            .get(ARGS_PROPERTY)
            .map(|args| rewrite_args(args, rules))
            .transpose()
            .map_err(|source| TransformError::Rule {
                path: path.to_owned(),
                source,
            })?
            .flatten();
        if let Some(args) = rewritten {
            properties.set(ARGS_PROPERTY, args);
            if self.watermark.raise(timestamp) {
                debug!(resource = path, timestamp, "raised watermark");
            }
        }

        self.resources.insert(path.to_owned(), properties);
        Ok(())
    }

    fn has_transformed_resource(&self) -> bool {
        !self.resources.is_empty()
    }

    fn emitted(&self) -> Result<Vec<EmittedResource>, TransformError> {
        let timestamp = self.watermark.emitted();
        let comment = format!("Relocated by {}", Self::IDENTIFIER);
        Ok(self
            .resources
            .iter()
            .map(|(path, properties)| EmittedResource {
                path: path.clone(),
                timestamp,
                bytes: properties.store(Some(&comment)),
            })
            .collect())
    }
}
