//! artisign
//!
//! Resolves the configured OpenPGP key and passphrase, then writes an
//! armored detached signature for every artifact given on the command line.
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use anyhow::{Context, Result};
use artisign::sign_artifacts;
use artisign_config::{CliOverrides, SignerConfig};
use artisign_keys::{AgentEnvironment, SecretResolver, SequoiaBackend};
use artisign_logging::{init_logging, LogFormat};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "artisign")]
#[command(about = "Sign build artifacts with an OpenPGP key")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Secret key specifier, e.g. keyfile:/path/key.asc or keyring:id=alice
    #[arg(long)]
    secret_key: Option<String>,

    /// Passphrase specifier, e.g. gpg-agent: or file:/path/pass.txt
    #[arg(long)]
    passphrase: Option<String>,

    /// Directory for the .asc files (default: next to each artifact)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Do not sign anything
    #[arg(long)]
    skip: bool,

    /// Log as JSON
    #[arg(long)]
    json_logs: bool,

    /// Files to sign
    #[arg(required = true)]
    artifacts: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        secret_key: cli.secret_key.clone(),
        passphrase: cli.passphrase.clone(),
        skip: cli.skip,
    };
    let config = SignerConfig::load(cli.config.as_deref(), &overrides)
        .context("Failed to load configuration")?;

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Console
    };
    init_logging("artisign", &config.log_level, format);

    if config.skip {
        info!(artifacts = cli.artifacts.len(), "Signing skipped");
        return Ok(());
    }

    let specifiers = config.secret_specifiers()?;
    let backend = Arc::new(SequoiaBackend::new());
    let resolver = SecretResolver::with_defaults(
        backend,
        config.registry_options(AgentEnvironment::from_env()),
    );

    // Resolution failures abort before any artifact is read
    let signer = resolver
        .signer(specifiers.secret_key, specifiers.passphrase)
        .context("Failed to resolve signing key")?;

    let written = sign_artifacts(&signer, &cli.artifacts, cli.output_dir.as_deref())
        .context("Failed to sign artifacts")?;

    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}
