// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error type shared by the transformers.

use std::io;

use thiserror::Error;

use crate::properties::PropertiesError;
use crate::rule::RuleError;

/// Failure while processing or emitting one resource.
///
/// A failed `process_resource` call records nothing for its resource;
/// resources accumulated earlier are untouched.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The resource content could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Resource path.
        path: String,
        /// Underlying I/O failure.
        source: io::Error,
    },
    /// The content is not a valid properties document.
    #[error("malformed properties in {path}: {source}")]
    MalformedProperties {
        /// Resource path.
        path: String,
        /// Parser failure.
        source: PropertiesError,
    },
    /// The content is not valid JSON.
    #[error("malformed JSON in {path}: {source}")]
    MalformedJson {
        /// Resource path.
        path: String,
        /// Parser failure.
        source: serde_json::Error,
    },
    /// A relocation rule failed while answering a query.
    #[error("relocation rule failed in {path}: {source}")]
    Rule {
        /// Resource path.
        path: String,
        /// Rule failure.
        source: RuleError,
    },
    /// An accumulated resource could not be serialized.
    #[error("failed to serialize {path}: {source}")]
    Serialize {
        /// Resource path.
        path: String,
        /// Serializer failure.
        source: serde_json::Error,
    },
    /// The output sink rejected an entry.
    #[error("failed to write {path}: {source}")]
    Sink {
        /// Resource path.
        path: String,
        /// Sink failure.
        source: io::Error,
    },
}

impl TransformError {
    /// Path of the resource the error concerns.
    pub fn path(&self) -> &str {
        match self {
            Self::Read { path, .. }
            | Self::MalformedProperties { path, .. }
            | Self::MalformedJson { path, .. }
            | Self::Rule { path, .. }
            | Self::Serialize { path, .. }
            | Self::Sink { path, .. } => path,
        }
    }

    /// Whether the resource content itself was unparseable.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::MalformedProperties { .. } | Self::MalformedJson { .. }
        )
    }
}

impl From<TransformError> for io::Error {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::Read { source, .. } | TransformError::Sink { source, .. } => source,
            malformed @ (TransformError::MalformedProperties { .. }
            | TransformError::MalformedJson { .. }) => {
                Self::new(io::ErrorKind::InvalidData, malformed)
            }
            other => Self::other(other),
        }
    }
}
