//! Key material type definitions
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


use std::fmt;
use zeroize::Zeroizing;

/// A resolved passphrase. Wiped from memory on drop.
pub type Passphrase = Zeroizing<String>;

/// One secret key (primary or subkey) as loaded from a key source.
///
/// The two blobs are opaque to everything except the backend that produced
/// them. The struct never prints them.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKeyMaterial {
    key_id: u64,
    user_ids: Vec<String>,
    encrypted_private_key: Vec<u8>,
    public_key: Vec<u8>,
}

impl SecretKeyMaterial {
    pub fn new(
        key_id: u64,
        user_ids: Vec<String>,
        encrypted_private_key: Vec<u8>,
        public_key: Vec<u8>,
    ) -> Self {
        Self {
            key_id,
            user_ids,
            encrypted_private_key,
            public_key,
        }
    }

    /// Full 64-bit key id
    pub fn key_id(&self) -> u64 {
        self.key_id
    }

    /// Lower 32 bits of the key id as lowercase hex, no padding
    pub fn short_key_id(&self) -> String {
        format!("{:x}", self.key_id & 0xFFFF_FFFF)
    }

    pub fn user_ids(&self) -> &[String] {
        &self.user_ids
    }

    pub fn encrypted_private_key(&self) -> &[u8] {
        &self.encrypted_private_key
    }

    /// Public counterpart of the key, checked by the backend before signing
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Whether `id` selects this key.
    ///
    /// A hex id of at most 8 digits (optionally `0x`-prefixed) is compared
    /// with the low 32 bits of the key id, a 16 digit one with the whole id.
    /// Otherwise, or if the id does not match, `id` is looked up as a
    /// case-insensitive substring of every user id.
    pub fn matches(&self, id: &str) -> bool {
        if self.matches_key_id(id) {
            return true;
        }
        let needle = id.to_lowercase();
        self.user_ids
            .iter()
            .any(|uid| uid.to_lowercase().contains(&needle))
    }

    fn matches_key_id(&self, id: &str) -> bool {
        let hex = id
            .strip_prefix("0x")
            .or_else(|| id.strip_prefix("0X"))
            .unwrap_or(id);
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return false;
        }
        match hex.len() {
            1..=8 => u32::from_str_radix(hex, 16)
                .map(|short| u64::from(short) == self.key_id & 0xFFFF_FFFF)
                .unwrap_or(false),
            16 => u64::from_str_radix(hex, 16)
                .map(|long| long == self.key_id)
                .unwrap_or(false),
            _ => false,
        }
    }
}

impl fmt::Debug for SecretKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKeyMaterial")
            .field("key_id", &format_args!("{:016X}", self.key_id))
            .field("user_ids", &self.user_ids)
            .finish_non_exhaustive()
    }
}

/// A primary key with its subkeys. The primary key comes first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretKeyRing {
    keys: Vec<SecretKeyMaterial>,
}

impl SecretKeyRing {
    pub fn new(keys: Vec<SecretKeyMaterial>) -> Self {
        Self { keys }
    }

    pub fn primary(&self) -> Option<&SecretKeyMaterial> {
        self.keys.first()
    }

    pub fn keys(&self) -> &[SecretKeyMaterial] {
        &self.keys
    }

    pub fn into_primary(self) -> Option<SecretKeyMaterial> {
        self.keys.into_iter().next()
    }

    /// First key, in ring order, that [`SecretKeyMaterial::matches`] `id`.
    pub fn find(&self, id: &str) -> Option<&SecretKeyMaterial> {
        self.keys.iter().find(|key| key.matches(id))
    }
}

/// A top-level object decoded from an OpenPGP stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PgpObject {
    SecretKeyRing(SecretKeyRing),
    /// A certificate without secret key material
    PublicKeyRing { fingerprint: String },
}

impl PgpObject {
    pub fn describe(&self) -> String {
        match self {
            PgpObject::SecretKeyRing(ring) => match ring.primary() {
                Some(key) => format!("secret key ring {:016X}", key.key_id()),
                None => "empty secret key ring".to_string(),
            },
            PgpObject::PublicKeyRing { fingerprint } => format!("public key ring {fingerprint}"),
        }
    }
}

/// Result of trying a passphrase against a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    Accepted,
    Rejected,
}

/// A detached binary signature packet
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({} bytes)", self.0.len())
    }
}
