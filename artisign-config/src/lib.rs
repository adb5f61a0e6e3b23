//! Configuration management for artisign
//!
//! Precedence, lowest first: built-in defaults, environment variables,
//! the configuration file, command line overrides.
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


use artisign_keys::{AgentEnvironment, AgentSettings, KeyError, KeyResult, RegistryOptions};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const SECRET_KEY_VAR: &str = "PGP_SECRETKEY";
pub const PASSPHRASE_VAR: &str = "PGP_PASSPHRASE";

/// Environment variable to configuration key
const ENV_KEYS: &[(&str, &str)] = &[
    (SECRET_KEY_VAR, "secret_key"),
    (PASSPHRASE_VAR, "passphrase"),
    ("PGP_SKIP", "skip"),
    ("PGP_AGENT_MAX_ATTEMPTS", "agent.max_attempts"),
    ("PGP_AGENT_TIMEOUT_SECS", "agent.timeout_secs"),
    ("LOG_LEVEL", "log_level"),
];

/// gpg-agent configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AgentConfig {
    pub max_attempts: u32,
    pub timeout_secs: Option<u64>,
}

/// Values given on the command line. They win over every other source.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub secret_key: Option<String>,
    pub passphrase: Option<String>,
    pub skip: bool,
}

/// Application configuration
#[derive(Clone, Deserialize)]
pub struct SignerConfig {
    pub secret_key: Option<String>,
    pub passphrase: Option<String>,
    pub skip: bool,
    pub agent: AgentConfig,
    pub home_dir: Option<PathBuf>,
    pub log_level: String,
}

impl std::fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Specifiers may be `literal:` secrets
        f.debug_struct("SignerConfig")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<set>"))
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<set>"))
            .field("skip", &self.skip)
            .field("agent", &self.agent)
            .field("home_dir", &self.home_dir)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Secret key and passphrase specifiers, both present
#[derive(Debug, Clone, Copy)]
pub struct SecretSpecifiers<'a> {
    pub secret_key: &'a str,
    pub passphrase: &'a str,
}

impl SignerConfig {
    /// Load configuration from the process environment, `.env`, and an
    /// optional file.
    pub fn load(file: Option<&Path>, overrides: &CliOverrides) -> KeyResult<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let environment: HashMap<String, String> = env::vars().collect();
        Self::from_sources(&environment, file, overrides)
    }

    /// Load configuration from an explicit environment map.
    pub fn from_sources(
        environment: &HashMap<String, String>,
        file: Option<&Path>,
        overrides: &CliOverrides,
    ) -> KeyResult<Self> {
        let mut builder = builder_with_defaults().map_err(config_error)?;

        for (var, key) in ENV_KEYS {
            if let Some(value) = environment.get(*var) {
                builder = builder.set_default(*key, value.as_str()).map_err(config_error)?;
            }
        }

        if let Some(path) = file {
            debug!(path = %path.display(), "Reading configuration file");
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder
            .set_override_option("secret_key", overrides.secret_key.clone())
            .map_err(config_error)?
            .set_override_option("passphrase", overrides.passphrase.clone())
            .map_err(config_error)?;
        if overrides.skip {
            builder = builder.set_override("skip", true).map_err(config_error)?;
        }

        let mut config: Self = builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(config_error)?;

        if config.home_dir.is_none() {
            config.home_dir = directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
        }
        Ok(config)
    }

    /// Both specifiers, or the error naming where they can be set.
    pub fn secret_specifiers(&self) -> KeyResult<SecretSpecifiers<'_>> {
        let secret_key = self.secret_key.as_deref().ok_or_else(|| {
            KeyError::Configuration(format!(
                "No secret key configured. Set it with --secret-key, the secret_key setting, or the {SECRET_KEY_VAR} environment variable"
            ))
        })?;
        let passphrase = self.passphrase.as_deref().ok_or_else(|| {
            KeyError::Configuration(format!(
                "No passphrase configured. Set it with --passphrase, the passphrase setting, or the {PASSPHRASE_VAR} environment variable"
            ))
        })?;
        Ok(SecretSpecifiers {
            secret_key,
            passphrase,
        })
    }

    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings {
            max_attempts: self.agent.max_attempts,
            timeout: self.agent.timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn registry_options(&self, agent_environment: AgentEnvironment) -> RegistryOptions {
        RegistryOptions {
            home_dir: self.home_dir.clone(),
            agent_environment,
            agent_settings: self.agent_settings(),
        }
    }
}

fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    Config::builder()
        .set_default("skip", false)?
        .set_default("agent.max_attempts", 3)?
        .set_default("log_level", "info")
}

fn config_error(e: config::ConfigError) -> KeyError {
    KeyError::Configuration(format!("Invalid configuration: {e}"))
}
