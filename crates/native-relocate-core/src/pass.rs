// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! One relocation run over a packaged archive.
//!
//! A [`RelocationPass`] owns the ordered rule set and the transformers for one
//! packaging run. The driver offers every archive entry in the order it finds
//! them; an entry goes to the first transformer whose eligibility predicate
//! accepts it. Entries nobody accepts are the driver's to copy. The pass is
//! consumed by [`finish`](RelocationPass::finish), so each transformer emits
//! exactly once.

use std::io::Read;

use crate::error::TransformError;
use crate::native_image_properties::NativeImagePropertiesTransformer;
use crate::reflect_config::ReflectConfigTransformer;
use crate::rule::RuleSet;
use crate::transformer::{ResourceSink, ResourceTransformer};

/// Rules plus transformers for a single run.
pub struct RelocationPass {
    rules: RuleSet,
    transformers: Vec<Box<dyn ResourceTransformer>>,
}

impl RelocationPass {
    /// Pass with no transformers registered.
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            transformers: Vec::new(),
        }
    }

    /// Pass handling both native-image descriptor families.
    pub fn native_image(rules: RuleSet) -> Self {
        Self::new(rules)
            .with_transformer(NativeImagePropertiesTransformer::new())
            .with_transformer(ReflectConfigTransformer::new())
    }

    /// Register a transformer after the ones already present.
    pub fn with_transformer<T: ResourceTransformer + 'static>(mut self, transformer: T) -> Self {
        self.transformers.push(Box::new(transformer));
        self
    }

    /// Name of the transformer that would take `path`, if any.
    pub fn transformer_for(&self, path: &str) -> Option<&'static str> {
        self.transformers
            .iter()
            .find(|t| t.can_transform_resource(path))
            .map(|t| t.name())
    }

    /// Route `path` to the first accepting transformer. Returns `Ok(false)`
    /// when no transformer wants it.
    pub fn offer(
        &mut self,
        path: &str,
        content: &mut dyn Read,
        timestamp: i64,
    ) -> Result<bool, TransformError> {
        let Some(transformer) = self
            .transformers
            .iter_mut()
            .find(|t| t.can_transform_resource(path))
        else {
            return Ok(false);
        };
        transformer.process_resource(path, content, &self.rules, timestamp)?;
        Ok(true)
    }

    /// Whether any transformer recorded a resource.
    pub fn has_transformed_resources(&self) -> bool {
        self.transformers.iter().any(|t| t.has_transformed_resource())
    }

    /// Emit every recorded resource into `sink`, transformer by transformer.
    /// Returns the number of entries written.
    pub fn finish(self, sink: &mut dyn ResourceSink) -> Result<usize, TransformError> {
        let mut written = 0;
        for transformer in &self.transformers {
            if transformer.has_transformed_resource() {
                written += transformer.emit(sink)?;
            }
        }
        Ok(written)
    }
}
