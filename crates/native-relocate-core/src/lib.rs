// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Relocation-aware rewrite engine for GraalVM native-image configuration.
//!
//! When a shading step moves bundled classes to new packages, the
//! native-image descriptors shipped under `META-INF/native-image/` still name
//! the old classes. This crate rewrites them:
//!
//! - [`NativeImagePropertiesTransformer`] relocates the class lists of
//!   `--initialize-at-run-time` / `--initialize-at-build-time` flags in the
//!   `Args` property of `native-image.properties`;
//! - [`ReflectConfigTransformer`] relocates `name` and
//!   `condition.typeReachable` in JSON record arrays and bundle names in
//!   resource configs.
//!
//! Which names move is decided entirely by the caller's ordered [`RuleSet`];
//! the first rule that accepts a name renames it. Each transformer tracks a
//! [`Watermark`], the latest modification time of any resource it changed,
//! and stamps it on everything it emits through a [`ResourceSink`].
#![forbid(unsafe_code)]

pub mod args;
pub mod error;
pub mod json_format;
pub mod native_image_properties;
pub mod pass;
pub mod properties;
pub mod reflect_config;
pub mod relocator;
pub mod rule;
pub mod transformer;
pub mod watermark;

pub use error::TransformError;
pub use native_image_properties::NativeImagePropertiesTransformer;
pub use pass::RelocationPass;
pub use properties::{Properties, PropertiesError};
pub use reflect_config::ReflectConfigTransformer;
pub use relocator::{PackageRelocator, SelectorError};
pub use rule::{relocate, RelocationRule, RuleError, RuleSet};
pub use transformer::{EmittedResource, ResourceSink, ResourceTransformer, NATIVE_IMAGE_PREFIX};
pub use watermark::{Watermark, LEGACY_TIMESTAMP};
