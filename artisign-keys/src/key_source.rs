//! Secret key sources
//!
//! - `keyfile:<path>` reads an exported key, armored or binary.
//! - `keyring:keyring=<path>&id=<id>` searches a `secring.gpg` style keyring.
//! - `literal:<key>` decodes a key given inline.
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


use crate::backend::{OpenPgpBackend, PgpObjects};
use crate::error::{KeyError, KeyResult};
use crate::key_types::{PgpObject, SecretKeyMaterial};
use crate::specifier::parse_query;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Keyring used when `keyring=` is not given, relative to the home directory
pub const DEFAULT_KEYRING: &str = ".gnupg/secring.gpg";

/// Loads the secret key to sign with.
///
/// `specifier` is the configuration string without its `scheme:` prefix.
pub trait SecretKeySource: Send + Sync {
    fn load(&self, specifier: &str) -> KeyResult<SecretKeyMaterial>;
}

/// Primary key of the first object, which must be a secret key ring.
fn first_primary_key(mut objects: PgpObjects<'_>, origin: &str) -> KeyResult<SecretKeyMaterial> {
    match objects.next() {
        Some(Ok(PgpObject::SecretKeyRing(ring))) => ring
            .into_primary()
            .ok_or_else(|| KeyError::not_found(format!("{origin} contains an empty key ring"))),
        Some(Ok(other)) => Err(KeyError::not_found(format!(
            "{origin} doesn't contain PGP private key (found {})",
            other.describe()
        ))),
        Some(Err(e)) => Err(e.context(format!("{origin} doesn't contain PGP private key"))),
        None => Err(KeyError::not_found(format!(
            "{origin} doesn't contain PGP private key"
        ))),
    }
}

/// Search decoded key rings in order.
///
/// Without `id` the primary key of the first ring wins and later rings are
/// never decoded. With `id`, every key of every ring is tried in order.
pub fn find_secret_key(
    objects: PgpObjects<'_>,
    id: Option<&str>,
    origin: &str,
) -> KeyResult<SecretKeyMaterial> {
    for object in objects {
        let ring = match object? {
            PgpObject::SecretKeyRing(ring) => ring,
            other => {
                return Err(KeyError::not_found(format!(
                    "Expecting a secret key in {origin} but found {}",
                    other.describe()
                )))
            }
        };

        match id {
            None => {
                return ring
                    .into_primary()
                    .ok_or_else(|| KeyError::not_found(format!("{origin} starts with an empty key ring")))
            }
            Some(id) => {
                if let Some(key) = ring.find(id) {
                    return Ok(key.clone());
                }
            }
        }
    }

    Err(KeyError::not_found(match id {
        Some(id) => format!("No key that matches {id} was found in {origin}"),
        None => format!("No secret key was found in {origin}"),
    }))
}

/// Exported key file (`keyfile:` scheme)
pub struct KeyFileSource {
    backend: Arc<dyn OpenPgpBackend>,
}

impl KeyFileSource {
    pub fn new(backend: Arc<dyn OpenPgpBackend>) -> Self {
        Self { backend }
    }
}

impl SecretKeySource for KeyFileSource {
    fn load(&self, specifier: &str) -> KeyResult<SecretKeyMaterial> {
        let path = Path::new(specifier);
        let data = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                KeyError::not_found(format!("No such key file exists: {}", path.display()))
            } else {
                KeyError::not_found_io(format!("Failed to read key file {}", path.display()), e)
            }
        })?;

        let key = first_primary_key(self.backend.decode(&data), specifier)?;
        info!(key_id = %key.short_key_id(), path = %path.display(), "Loaded secret key from key file");
        Ok(key)
    }
}

/// Keyring search (`keyring:` scheme)
pub struct KeyRingSource {
    backend: Arc<dyn OpenPgpBackend>,
    home_dir: Option<PathBuf>,
}

impl KeyRingSource {
    /// `home_dir` locates the default keyring when none is configured.
    pub fn new(backend: Arc<dyn OpenPgpBackend>, home_dir: Option<PathBuf>) -> Self {
        Self { backend, home_dir }
    }

    fn keyring_path(&self, configured: Option<&String>) -> KeyResult<PathBuf> {
        match configured {
            Some(path) => Ok(PathBuf::from(path)),
            None => self
                .home_dir
                .as_ref()
                .map(|home| home.join(DEFAULT_KEYRING))
                .ok_or_else(|| {
                    KeyError::Configuration(
                        "No keyring given and the home directory is unknown".to_string(),
                    )
                }),
        }
    }
}

impl SecretKeySource for KeyRingSource {
    fn load(&self, specifier: &str) -> KeyResult<SecretKeyMaterial> {
        let opts = parse_query(specifier);
        let keyring = self.keyring_path(opts.get("keyring"))?;
        if !keyring.exists() {
            return Err(KeyError::not_found(format!(
                "No such key ring file exists: {}",
                keyring.display()
            )));
        }

        let id = opts.get("id").map(String::as_str);
        debug!(keyring = %keyring.display(), id = ?id, "Searching key ring");

        let data = std::fs::read(&keyring)
            .map_err(|e| KeyError::not_found_io(format!("Failed to read key ring {}", keyring.display()), e))?;
        let origin = keyring.display().to_string();
        let key = find_secret_key(self.backend.decode(&data), id, &origin)?;

        info!(key_id = %key.short_key_id(), keyring = %origin, "Selected secret key from key ring");
        Ok(key)
    }
}

/// Key given inline (`literal:` scheme)
pub struct LiteralKeySource {
    backend: Arc<dyn OpenPgpBackend>,
}

impl LiteralKeySource {
    pub fn new(backend: Arc<dyn OpenPgpBackend>) -> Self {
        Self { backend }
    }
}

impl SecretKeySource for LiteralKeySource {
    fn load(&self, specifier: &str) -> KeyResult<SecretKeyMaterial> {
        let key = first_primary_key(self.backend.decode(specifier.as_bytes()), "Literal")?;
        info!(key_id = %key.short_key_id(), "Loaded literal secret key");
        Ok(key)
    }
}
