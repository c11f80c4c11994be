// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! native-relocate
//!
//! Rewrites relocated type names in the native-image descriptors of an
//! exploded (unzipped) shaded jar, copying every other entry verbatim.

mod archive;

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use native_relocate_config::{
    read_profile_file, ConfigService, FsConfigStore, RelocationProfile, RelocationSpec,
};
use native_relocate_core::{RelocationPass, RuleSet};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::archive::{walk, DirectorySink};

#[derive(Parser, Debug)]
#[command(author, version, about = "Relocate type names in GraalVM native-image descriptors")]
struct Cli {
    /// Log every relocation (same as RUST_LOG=debug).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rewrite an exploded archive into a new directory.
    Relocate {
        /// Root of the exploded input archive.
        #[arg(long)]
        input: PathBuf,
        /// Directory receiving the rewritten archive.
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        rules: RuleArgs,
    },
    /// Show which transformer would handle each archive entry name.
    Check {
        /// Entry names, e.g. META-INF/native-image/g/a/reflect-config.json.
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Manage saved relocation profiles.
    Profile {
        #[command(subcommand)]
        cmd: ProfileCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    /// Save the given relocations under a name.
    Save {
        /// Profile name.
        name: String,
        /// Relocation as <pattern>=<shaded-pattern>; repeatable, first match wins.
        #[arg(long = "relocate", value_name = "FROM=TO", required = true)]
        relocations: Vec<RelocationSpec>,
        /// Profile directory (defaults to the user config directory).
        #[arg(long)]
        config_dir: Option<PathBuf>,
    },
    /// Print a saved profile as JSON.
    Show {
        /// Profile name.
        name: String,
        /// Profile directory (defaults to the user config directory).
        #[arg(long)]
        config_dir: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RuleArgs {
    /// Profile JSON file to load relocations from.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Saved profile to load relocations from.
    #[arg(long)]
    profile: Option<String>,
    /// Profile directory (defaults to the user config directory).
    #[arg(long)]
    config_dir: Option<PathBuf>,
    /// Relocation as <pattern>=<shaded-pattern>; repeatable, applied after
    /// any profile rules.
    #[arg(long = "relocate", value_name = "FROM=TO")]
    relocations: Vec<RelocationSpec>,
}

impl RuleArgs {
    /// Profile file, then saved profile, then inline relocations.
    fn rule_set(&self) -> Result<RuleSet> {
        let mut rules = RuleSet::new();
        if let Some(path) = &self.config {
            read_profile_file(path)
                .with_context(|| format!("failed to read profile file {}", path.display()))?
                .extend_rule_set(&mut rules)
                .with_context(|| format!("bad relocation in {}", path.display()))?;
        }
        if let Some(name) = &self.profile {
            config_service(self.config_dir.as_deref())?
                .load_profile(name)
                .with_context(|| format!("failed to load profile `{name}`"))?
                .extend_rule_set(&mut rules)
                .with_context(|| format!("bad relocation in profile `{name}`"))?;
        }
        RelocationProfile::new(self.relocations.clone()).extend_rule_set(&mut rules)?;
        if rules.is_empty() {
            bail!("no relocation rules given; pass --relocate, --config or --profile");
        }
        Ok(rules)
    }
}

fn config_service(dir: Option<&Path>) -> Result<ConfigService<FsConfigStore>> {
    let store = match dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::new()?,
    };
    Ok(ConfigService::new(store))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    match cli.cmd {
        Command::Relocate {
            input,
            output,
            rules,
        } => relocate(&input, &output, rules.rule_set()?),
        Command::Check { paths } => check(&paths),
        Command::Profile { cmd } => profile(cmd),
    }
}

fn relocate(input: &Path, output: &Path, rules: RuleSet) -> Result<()> {
    if !input.is_dir() {
        bail!("input {} is not a directory", input.display());
    }
    if resolve(output)?.starts_with(input.canonicalize()?) {
        bail!("output {} must not be inside input {}", output.display(), input.display());
    }

    let entries =
        walk(input).with_context(|| format!("failed to list {}", input.display()))?;
    info!(input = %input.display(), entries = entries.len(), rules = rules.len(), "relocating");

    let mut pass = RelocationPass::native_image(rules);
    let mut sink = DirectorySink::new(output);
    let mut copied = 0usize;
    for entry in &entries {
        if pass.transformer_for(&entry.name).is_some() {
            let mut file = File::open(&entry.file)
                .with_context(|| format!("failed to open {}", entry.file.display()))?;
            pass.offer(&entry.name, &mut file, entry.modified)?;
        } else {
            sink.copy_entry(entry)
                .with_context(|| format!("failed to copy {}", entry.name))?;
            copied += 1;
        }
    }
    let transformed = pass.finish(&mut sink)?;
    info!(output = %output.display(), written = sink.written(), "done");

    writeln!(
        io::stdout().lock(),
        "transformed {transformed} resource(s), copied {copied}"
    )?;
    Ok(())
}

/// Canonical form of `path`, which need not exist yet: the deepest existing
/// ancestor is canonicalized and the missing tail appended.
fn resolve(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => break,
        }
    }
    let mut resolved = existing.canonicalize()?;
    resolved.extend(missing.iter().rev());
    Ok(resolved)
}

fn check(paths: &[String]) -> Result<()> {
    let pass = RelocationPass::native_image(RuleSet::new());
    let mut out = io::stdout().lock();
    for path in paths {
        writeln!(out, "{path}\t{}", pass.transformer_for(path).unwrap_or("-"))?;
    }
    Ok(())
}

fn profile(cmd: ProfileCommand) -> Result<()> {
    match cmd {
        ProfileCommand::Save {
            name,
            relocations,
            config_dir,
        } => {
            let service = config_service(config_dir.as_deref())?;
            service
                .save_profile(&name, &RelocationProfile::new(relocations))
                .with_context(|| format!("failed to save profile `{name}`"))?;
            info!(profile = %name, dir = %service.store().base().display(), "saved");
            Ok(())
        }
        ProfileCommand::Show { name, config_dir } => {
            let profile = config_service(config_dir.as_deref())?
                .load_profile(&name)
                .with_context(|| format!("failed to load profile `{name}`"))?;
            writeln!(
                io::stdout().lock(),
                "{}",
                serde_json::to_string_pretty(&profile)?
            )?;
            Ok(())
        }
    }
}
