//! Passphrase sources that need no agent
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


use crate::error::{KeyError, KeyResult};
use crate::key_types::{Passphrase, SecretKeyMaterial};
use std::path::PathBuf;
use tracing::debug;
use zeroize::Zeroizing;

/// Loads the passphrase that unlocks `key`.
///
/// The key is passed so that sources able to verify a candidate (the agent)
/// can do so before returning it.
pub trait PassphraseSource: Send + Sync {
    fn load(&self, key: &SecretKeyMaterial, specifier: &str) -> KeyResult<Passphrase>;
}

/// The specifier is the passphrase (`literal:` scheme)
#[derive(Debug, Default)]
pub struct LiteralPassphraseSource;

impl PassphraseSource for LiteralPassphraseSource {
    fn load(&self, _key: &SecretKeyMaterial, specifier: &str) -> KeyResult<Passphrase> {
        Ok(Zeroizing::new(specifier.to_string()))
    }
}

/// Passphrase stored in a file (`file:` scheme).
///
/// `|` in the specifier stands for `:`, which cannot appear after the scheme
/// separator otherwise.
#[derive(Debug, Default)]
pub struct FilePassphraseSource;

impl FilePassphraseSource {
    pub fn resolve_path(specifier: &str) -> PathBuf {
        PathBuf::from(specifier.replace('|', ":"))
    }
}

impl PassphraseSource for FilePassphraseSource {
    fn load(&self, _key: &SecretKeyMaterial, specifier: &str) -> KeyResult<Passphrase> {
        let path = Self::resolve_path(specifier);
        if !path.exists() {
            return Err(KeyError::not_found(format!(
                "No such file exists: {}",
                path.display()
            )));
        }

        let contents = Zeroizing::new(std::fs::read_to_string(&path).map_err(|e| {
            KeyError::not_found_io(format!("Failed to read passphrase file {}", path.display()), e)
        })?);
        debug!(path = %path.display(), "Read passphrase file");
        Ok(Zeroizing::new(contents.trim().to_string()))
    }
}
