//! Secret resolution
//!
//! Turns a secret key string and a passphrase string into usable material,
//! trying each only through the scheme registry.
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


use crate::backend::OpenPgpBackend;
use crate::error::KeyResult;
use crate::key_types::{Passphrase, SecretKeyMaterial};
use crate::registry::{RegistryOptions, SchemeRegistry};
use crate::signer::Signer;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// A key together with the passphrase that unlocks it
pub struct ResolvedSecrets {
    pub key: SecretKeyMaterial,
    pub passphrase: Passphrase,
}

impl fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("key", &self.key)
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

pub struct SecretResolver {
    backend: Arc<dyn OpenPgpBackend>,
    registry: SchemeRegistry,
}

impl SecretResolver {
    pub fn new(backend: Arc<dyn OpenPgpBackend>, registry: SchemeRegistry) -> Self {
        Self { backend, registry }
    }

    /// Resolver with the built-in schemes
    pub fn with_defaults(backend: Arc<dyn OpenPgpBackend>, options: RegistryOptions) -> Self {
        let registry = SchemeRegistry::with_defaults(backend.clone(), options);
        Self::new(backend, registry)
    }

    pub fn registry(&self) -> &SchemeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SchemeRegistry {
        &mut self.registry
    }

    pub fn resolve_key(&self, secret_key: &str) -> KeyResult<SecretKeyMaterial> {
        self.registry.load_key(secret_key)
    }

    pub fn resolve_passphrase(&self, key: &SecretKeyMaterial, passphrase: &str) -> KeyResult<Passphrase> {
        self.registry.load_passphrase(passphrase, key)
    }

    /// Resolve the key first, then the passphrase for it.
    pub fn resolve(&self, secret_key: &str, passphrase: &str) -> KeyResult<ResolvedSecrets> {
        let key = self.resolve_key(secret_key)?;
        let passphrase = self.resolve_passphrase(&key, passphrase)?;
        info!(
            key_id = %key.short_key_id(),
            backend = self.backend.name(),
            "Resolved signing key"
        );
        Ok(ResolvedSecrets { key, passphrase })
    }

    /// Resolve both secrets and build a signer, which verifies the passphrase.
    pub fn signer(&self, secret_key: &str, passphrase: &str) -> KeyResult<Signer> {
        let ResolvedSecrets { key, passphrase } = self.resolve(secret_key, passphrase)?;
        Signer::new(self.backend.clone(), key, passphrase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{key, ring, MockBackend};
    use crate::error::KeyError;
    use crate::key_source::SecretKeySource;
    use std::sync::atomic::Ordering;

    fn resolver(backend: Arc<MockBackend>) -> SecretResolver {
        SecretResolver::with_defaults(backend, RegistryOptions::default())
    }

    #[test]
    fn test_resolve_literal_pair() {
        let backend = Arc::new(MockBackend::new(vec![ring(vec![key(0xabc, &["alice"])])], "pw"));
        let secrets = resolver(backend).resolve("literal:KEY", "literal:pw").unwrap();
        assert_eq!(secrets.key.key_id(), 0xabc);
        assert_eq!(secrets.passphrase.as_str(), "pw");
        assert!(!format!("{secrets:?}").contains("\"pw\""));
    }

    #[test]
    fn test_key_failure_skips_passphrase() {
        let backend = Arc::new(MockBackend::new(Vec::new(), "pw"));
        let dir = tempfile::tempdir().unwrap();
        let pass = dir.path().join("pass.txt");
        let err = resolver(backend)
            .resolve("keyfile:/nonexistent/key.asc", &format!("file:{}", pass.display()))
            .unwrap_err();
        assert!(matches!(err, KeyError::NotFound { message: m, .. } if m.contains("key.asc")));
    }

    #[test]
    fn test_signer_rejects_wrong_passphrase() {
        let backend = Arc::new(MockBackend::new(vec![ring(vec![key(0xabc, &[])])], "pw"));
        let err = resolver(backend.clone())
            .signer("literal:KEY", "literal:nope")
            .err()
            .unwrap();
        assert!(matches!(err, KeyError::Authentication(m) if m.contains("abc")));
        assert_eq!(backend.unlock_attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_signer_with_custom_scheme() {
        struct Fixed;
        impl SecretKeySource for Fixed {
            fn load(&self, _specifier: &str) -> KeyResult<SecretKeyMaterial> {
                Ok(key(0x77, &[]))
            }
        }

        let backend = Arc::new(MockBackend::new(Vec::new(), "pw"));
        let mut resolver = resolver(backend);
        resolver.registry_mut().register_key_source("fixed", Box::new(Fixed));

        let signer = resolver.signer("fixed:anything", "literal:pw").unwrap();
        assert_eq!(signer.key().key_id(), 0x77);
    }
}
