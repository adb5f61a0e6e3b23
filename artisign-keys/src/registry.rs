//! Scheme registry
//!
//! Maps the scheme of a `scheme:opaque` string to the source that handles it.
//! Key schemes and passphrase schemes live in separate namespaces, so
//! `literal` means an inline key in one and an inline passphrase in the other.
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


use crate::agent::{AgentEnvironment, AgentPassphraseSource, AgentSettings};
use crate::backend::OpenPgpBackend;
use crate::error::{KeyError, KeyResult};
use crate::key_source::{KeyFileSource, KeyRingSource, LiteralKeySource, SecretKeySource};
use crate::key_types::{Passphrase, SecretKeyMaterial};
use crate::passphrase::{FilePassphraseSource, LiteralPassphraseSource, PassphraseSource};
use crate::specifier::Specifier;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Everything the built-in sources need besides the backend
#[derive(Debug, Clone, Default)]
pub struct RegistryOptions {
    pub home_dir: Option<PathBuf>,
    pub agent_environment: AgentEnvironment,
    pub agent_settings: AgentSettings,
}

struct Entry<T: ?Sized> {
    source: Box<T>,
    /// Keep the opaque part out of error messages
    secret_specifier: bool,
}

/// Scheme name to source, for keys and passphrases
pub struct SchemeRegistry {
    key_sources: BTreeMap<String, Entry<dyn SecretKeySource>>,
    passphrase_sources: BTreeMap<String, Entry<dyn PassphraseSource>>,
}

impl SchemeRegistry {
    /// Registry without any scheme
    pub fn empty() -> Self {
        Self {
            key_sources: BTreeMap::new(),
            passphrase_sources: BTreeMap::new(),
        }
    }

    /// Key schemes `keyfile`, `keyring`, `literal`; passphrase schemes
    /// `literal`, `file`, `gpg-agent`.
    pub fn with_defaults(backend: Arc<dyn OpenPgpBackend>, options: RegistryOptions) -> Self {
        let mut registry = Self::empty();

        registry.register_key_source("keyfile", Box::new(KeyFileSource::new(backend.clone())));
        registry.register_key_source(
            "keyring",
            Box::new(KeyRingSource::new(backend.clone(), options.home_dir)),
        );
        registry.register_secret_key_source("literal", Box::new(LiteralKeySource::new(backend.clone())));

        registry.register_secret_passphrase_source("literal", Box::new(LiteralPassphraseSource));
        registry.register_passphrase_source("file", Box::new(FilePassphraseSource));
        registry.register_passphrase_source(
            "gpg-agent",
            Box::new(AgentPassphraseSource::new(
                backend,
                options.agent_environment,
                options.agent_settings,
            )),
        );

        registry
    }

    /// Add or replace a key scheme.
    pub fn register_key_source(&mut self, scheme: &str, source: Box<dyn SecretKeySource>) {
        self.key_sources.insert(
            scheme.to_string(),
            Entry {
                source,
                secret_specifier: false,
            },
        );
    }

    /// Add or replace a key scheme whose specifier is itself secret.
    pub fn register_secret_key_source(&mut self, scheme: &str, source: Box<dyn SecretKeySource>) {
        self.key_sources.insert(
            scheme.to_string(),
            Entry {
                source,
                secret_specifier: true,
            },
        );
    }

    /// Add or replace a passphrase scheme.
    pub fn register_passphrase_source(&mut self, scheme: &str, source: Box<dyn PassphraseSource>) {
        self.passphrase_sources.insert(
            scheme.to_string(),
            Entry {
                source,
                secret_specifier: false,
            },
        );
    }

    /// Add or replace a passphrase scheme whose specifier is itself secret.
    pub fn register_secret_passphrase_source(
        &mut self,
        scheme: &str,
        source: Box<dyn PassphraseSource>,
    ) {
        self.passphrase_sources.insert(
            scheme.to_string(),
            Entry {
                source,
                secret_specifier: true,
            },
        );
    }

    pub fn key_schemes(&self) -> Vec<&str> {
        self.key_sources.keys().map(String::as_str).collect()
    }

    pub fn passphrase_schemes(&self) -> Vec<&str> {
        self.passphrase_sources.keys().map(String::as_str).collect()
    }

    /// Load the key named by a `scheme:opaque` string.
    pub fn load_key(&self, raw: &str) -> KeyResult<SecretKeyMaterial> {
        let spec = Specifier::parse(raw).map_err(|_| {
            KeyError::Configuration(format!(
                "Invalid secret key string. It needs to start with a scheme like 'FOO:': {raw}"
            ))
        })?;

        let entry = self.key_sources.get(spec.scheme).ok_or_else(|| {
            KeyError::Configuration(format!(
                "Invalid secret key scheme '{}'. Known schemes are {}; custom schemes must be registered with the scheme registry",
                spec.scheme,
                self.key_schemes().join(", ")
            ))
        })?;

        debug!(scheme = spec.scheme, "Loading secret key");
        entry
            .source
            .load(spec.opaque)
            .map_err(|e| e.context(format!("Failed to load key from {}", display(&spec, entry.secret_specifier))))
    }

    /// Load the passphrase for `key` named by a `scheme:opaque` string.
    pub fn load_passphrase(&self, raw: &str, key: &SecretKeyMaterial) -> KeyResult<Passphrase> {
        // The raw string may be a bare passphrase, so it is never echoed
        let spec = Specifier::parse(raw).map_err(|_| {
            KeyError::Configuration(
                "Invalid passphrase string. It needs to start with a scheme like 'FOO:'".to_string(),
            )
        })?;

        let entry = self.passphrase_sources.get(spec.scheme).ok_or_else(|| {
            KeyError::Configuration(format!(
                "Invalid pass phrase scheme '{}'. Known schemes are {}; custom schemes must be registered with the scheme registry",
                spec.scheme,
                self.passphrase_schemes().join(", ")
            ))
        })?;

        debug!(scheme = spec.scheme, key_id = %key.short_key_id(), "Loading passphrase");
        entry.source.load(key, spec.opaque).map_err(|e| {
            e.context(format!(
                "Failed to load passphrase from {}",
                display(&spec, entry.secret_specifier)
            ))
        })
    }
}

fn display(spec: &Specifier<'_>, secret: bool) -> String {
    if secret {
        format!("{}:<redacted>", spec.scheme)
    } else {
        format!("{}:{}", spec.scheme, spec.opaque)
    }
}
