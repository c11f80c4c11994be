// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Transformer contract and the output port.
//!
//! A packaging driver offers resources one at a time to a
//! [`ResourceTransformer`], which accumulates rewritten representations and
//! later hands them to a [`ResourceSink`] (the archive writer) as
//! [`EmittedResource`] triples. The sink is a driven port: transformers
//! depend on the trait only, so they can be exercised with the in-memory
//! `Vec<EmittedResource>` sink while a real driver writes files.

use std::io::{self, Read};

use crate::error::TransformError;
use crate::rule::RuleSet;
use crate::watermark::LEGACY_TIMESTAMP;

/// Directory holding native-image configuration inside a jar.
pub const NATIVE_IMAGE_PREFIX: &str = "META-INF/native-image/";

/// One serialized output entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedResource {
    /// Entry path, identical to the key the resource was processed under.
    pub path: String,
    /// Modification time to stamp on the entry (ms since the Unix epoch).
    pub timestamp: i64,
    /// Serialized content.
    pub bytes: Vec<u8>,
}

/// Driven port receiving emitted entries.
pub trait ResourceSink {
    /// Write one entry. Failures propagate out of the emission pass
    /// unchanged; entries already written stay written.
    fn put_resource(&mut self, resource: EmittedResource) -> io::Result<()>;
}

impl ResourceSink for Vec<EmittedResource> {
    fn put_resource(&mut self, resource: EmittedResource) -> io::Result<()> {
        self.push(resource);
        Ok(())
    }
}

/// Relocation-aware rewriter for one family of resources.
pub trait ResourceTransformer {
    /// Short stable name, used in logs and by drivers.
    fn name(&self) -> &'static str;

    /// Eligibility predicate: whether a driver should route `path` here.
    fn can_transform_resource(&self, path: &str) -> bool;

    /// Parse `content`, relocate the type names it carries and record the
    /// result under `path` (last write wins). `timestamp` is the
    /// resource's modification time in milliseconds.
    fn process_resource(
        &mut self,
        path: &str,
        content: &mut dyn Read,
        rules: &RuleSet,
        timestamp: i64,
    ) -> Result<(), TransformError>;

    /// Legacy entry point for drivers that do not track modification times.
    fn process_resource_untimed(
        &mut self,
        path: &str,
        content: &mut dyn Read,
        rules: &RuleSet,
    ) -> Result<(), TransformError> {
        self.process_resource(path, content, rules, LEGACY_TIMESTAMP)
    }

    /// Whether any resource has been recorded.
    fn has_transformed_resource(&self) -> bool;

    /// Serialize every recorded resource, stamped with the watermark.
    fn emitted(&self) -> Result<Vec<EmittedResource>, TransformError>;

    /// Write every recorded resource to `sink`; returns how many were
    /// written.
    fn emit(&self, sink: &mut dyn ResourceSink) -> Result<usize, TransformError> {
        let resources = self.emitted()?;
        let count = resources.len();
        for resource in resources {
            let path = resource.path.clone();
            sink.put_resource(resource)
                .map_err(|source| TransformError::Sink { path, source })?;
        }
        Ok(count)
    }
}

pub(crate) fn read_content(path: &str, content: &mut dyn Read) -> Result<Vec<u8>, TransformError> {
    let mut bytes = Vec::new();
    content
        .read_to_end(&mut bytes)
        .map_err(|source| TransformError::Read {
            path: path.to_owned(),
            source,
        })?;
    Ok(bytes)
}
