//! OpenPGP backend interface
//!
//! Everything that needs to understand OpenPGP packets goes through this
//! trait. Loaders and the signer receive the backend explicitly, so tests can
//! substitute one that does not do real cryptography.
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


use crate::error::KeyResult;
use crate::key_types::{PgpObject, SecretKeyMaterial, Signature, UnlockOutcome};

/// Stream of top-level objects, in input order
pub type PgpObjects<'a> = Box<dyn Iterator<Item = KeyResult<PgpObject>> + 'a>;

/// Trait for OpenPGP implementations
pub trait OpenPgpBackend: Send + Sync {
    /// Decode the top-level objects of an armored or binary OpenPGP stream.
    ///
    /// Objects are produced lazily so callers can stop at the first match.
    fn decode<'a>(&'a self, data: &'a [u8]) -> PgpObjects<'a>;

    /// Try to decrypt the private key with `passphrase`.
    ///
    /// A wrong passphrase is `Ok(UnlockOutcome::Rejected)`. `Err` is reserved
    /// for material the backend cannot process at all.
    fn unlock(&self, key: &SecretKeyMaterial, passphrase: &str) -> KeyResult<UnlockOutcome>;

    /// Produce a detached binary signature over `data`.
    fn sign(&self, key: &SecretKeyMaterial, passphrase: &str, data: &[u8]) -> KeyResult<Signature>;

    /// Backend name, for logs
    fn name(&self) -> &str;
}
