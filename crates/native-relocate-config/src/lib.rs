// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Relocation profiles for native-relocate and where they are kept.
//! The CLI stays a thin adapter over [`ConfigService`].
#![forbid(unsafe_code)]

pub mod fs;
pub mod profile;
pub mod store;

pub use fs::FsConfigStore;
pub use profile::{ParseRelocationError, RelocationProfile, RelocationSpec};
pub use store::{read_profile_file, ConfigError, ConfigService, ConfigStore};
