//! Detached signature generation
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
use crate::error::{KeyError, KeyResult};
use crate::key_types::{Passphrase, SecretKeyMaterial, Signature, UnlockOutcome};
use std::io::Read;
use std::sync::Arc;
use tracing::debug;

/// Signs artifacts with one resolved key.
///
/// The passphrase is checked once, on construction, so a wrong passphrase
/// fails before any artifact is read.
pub struct Signer {
    backend: Arc<dyn OpenPgpBackend>,
    key: SecretKeyMaterial,
    passphrase: Passphrase,
}

impl Signer {
    pub fn new(
        backend: Arc<dyn OpenPgpBackend>,
        key: SecretKeyMaterial,
        passphrase: Passphrase,
    ) -> KeyResult<Self> {
        match backend.unlock(&key, &passphrase)? {
            UnlockOutcome::Accepted => Ok(Self {
                backend,
                key,
                passphrase,
            }),
            UnlockOutcome::Rejected => Err(KeyError::Authentication(format!(
                "Passphrase is incorrect for key {}",
                key.short_key_id()
            ))),
        }
    }

    pub fn key(&self) -> &SecretKeyMaterial {
        &self.key
    }

    pub fn sign(&self, artifact: &[u8]) -> KeyResult<Signature> {
        let signature = self.backend.sign(&self.key, &self.passphrase, artifact)?;
        debug!(
            key_id = %self.key.short_key_id(),
            artifact_len = artifact.len(),
            "Generated signature"
        );
        Ok(signature)
    }

    pub fn sign_reader<R: Read>(&self, mut reader: R) -> KeyResult<Signature> {
        let mut artifact = Vec::new();
        reader
            .read_to_end(&mut artifact)
            .map_err(|e| KeyError::io("Failed to read artifact", e))?;
        self.sign(&artifact)
    }
}
