//! OpenPGP backend built on Sequoia
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
use crate::key_types::{PgpObject, SecretKeyMaterial, SecretKeyRing, Signature, UnlockOutcome};
use openpgp::cert::{Cert, CertParser};
use openpgp::crypto::Password;
use openpgp::packet::key::{PublicParts, SecretParts, UnspecifiedRole};
use openpgp::packet::signature::SignatureBuilder;
use openpgp::packet::Key;
use openpgp::parse::Parse;
use openpgp::serialize::SerializeInto;
use openpgp::types::{HashAlgorithm, SignatureType};
use openpgp::{KeyID, Packet, PacketPile};
use sequoia_openpgp as openpgp;
use tracing::debug;

/// Sequoia-based backend. Signs binary documents with a fixed digest.
#[derive(Debug, Clone)]
pub struct SequoiaBackend {
    hash_algo: HashAlgorithm,
}

impl SequoiaBackend {
    pub fn new() -> Self {
        Self {
            hash_algo: HashAlgorithm::SHA256,
        }
    }

    fn object_from_cert(cert: &Cert) -> KeyResult<PgpObject> {
        if !cert.is_tsk() {
            return Ok(PgpObject::PublicKeyRing {
                fingerprint: cert.fingerprint().to_hex(),
            });
        }

        let user_ids: Vec<String> = cert
            .userids()
            .map(|ua| String::from_utf8_lossy(ua.userid().value()).into_owned())
            .collect();

        let mut keys = Vec::new();

        // User ids belong to the primary key only
        let primary = cert.primary_key().key();
        if primary.has_secret() {
            let secret = primary.clone().parts_into_secret().map_err(decode_error)?;
            keys.push(SecretKeyMaterial::new(
                key_id_u64(&secret.keyid()),
                user_ids,
                serialize(Packet::from(secret.clone()))?,
                serialize(Packet::from(secret.take_secret().0.parts_into_public()))?,
            ));
        }

        for ka in cert.keys().subkeys().secret() {
            let secret = ka.key().clone();
            let public = secret.clone().take_secret().0.parts_into_public();
            keys.push(SecretKeyMaterial::new(
                key_id_u64(&secret.keyid()),
                Vec::new(),
                serialize(Packet::from(secret))?,
                serialize(Packet::from(public))?,
            ));
        }

        Ok(PgpObject::SecretKeyRing(SecretKeyRing::new(keys)))
    }
}

impl Default for SequoiaBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenPgpBackend for SequoiaBackend {
    fn decode<'a>(&'a self, data: &'a [u8]) -> PgpObjects<'a> {
        match CertParser::from_bytes(data) {
            Ok(parser) => Box::new(parser.map(|cert| {
                let cert = cert.map_err(decode_error)?;
                Self::object_from_cert(&cert)
            })),
            Err(e) => Box::new(std::iter::once(Err(decode_error(e)))),
        }
    }

    fn unlock(&self, key: &SecretKeyMaterial, passphrase: &str) -> KeyResult<UnlockOutcome> {
        let secret = decode_secret_key(key)?;
        if !secret.secret().is_encrypted() {
            return Ok(UnlockOutcome::Accepted);
        }

        match secret.decrypt_secret(&Password::from(passphrase)) {
            Ok(_) => Ok(UnlockOutcome::Accepted),
            Err(e) => {
                debug!(key_id = %key.short_key_id(), error = %e, "Passphrase rejected");
                Ok(UnlockOutcome::Rejected)
            }
        }
    }

    fn sign(&self, key: &SecretKeyMaterial, passphrase: &str, data: &[u8]) -> KeyResult<Signature> {
        let public = decode_public_key(key)?;
        let secret = decode_secret_key(key)?;
        if public.fingerprint() != secret.fingerprint() {
            return Err(KeyError::Signing(format!(
                "Key {} has mismatched public and secret packets",
                key.short_key_id()
            )));
        }

        let pk_algo = public.pk_algo();
        if !pk_algo.for_signing() {
            return Err(KeyError::Signing(format!(
                "Unsupported signing key {}: {} cannot sign",
                key.short_key_id(),
                pk_algo
            )));
        }

        let secret = if secret.secret().is_encrypted() {
            secret
                .decrypt_secret(&Password::from(passphrase))
                .map_err(|_| {
                    KeyError::Authentication(format!(
                        "Passphrase is incorrect for key {}",
                        key.short_key_id()
                    ))
                })?
        } else {
            secret
        };

        let mut keypair = secret
            .into_keypair()
            .map_err(|e| KeyError::Signing(format!("Unusable secret key: {e}")))?;

        let signature = SignatureBuilder::new(SignatureType::Binary)
            .set_hash_algo(self.hash_algo)
            .sign_message(&mut keypair, data)
            .map_err(|e| KeyError::Signing(format!("Failed to generate signature: {e}")))?;

        let bytes = Packet::from(signature)
            .to_vec()
            .map_err(|e| KeyError::Signing(format!("Failed to serialize signature: {e}")))?;
        Ok(Signature::new(bytes))
    }

    fn name(&self) -> &str {
        "sequoia"
    }
}

fn decode_error(e: impl std::fmt::Display) -> KeyError {
    KeyError::not_found(format!("Not a readable OpenPGP key: {e}"))
}

fn serialize(packet: Packet) -> KeyResult<Vec<u8>> {
    packet
        .to_vec()
        .map_err(|e| KeyError::Signing(format!("Failed to serialize key packet: {e}")))
}

/// Low 8 bytes of the key id, big-endian
fn key_id_u64(keyid: &KeyID) -> u64 {
    let bytes = keyid.as_bytes();
    let tail = &bytes[bytes.len().saturating_sub(8)..];
    let mut buf = [0u8; 8];
    buf[8 - tail.len()..].copy_from_slice(tail);
    u64::from_be_bytes(buf)
}

fn decode_public_key(key: &SecretKeyMaterial) -> KeyResult<Key<PublicParts, UnspecifiedRole>> {
    let pile = PacketPile::from_bytes(key.public_key()).map_err(|e| {
        KeyError::Signing(format!("Corrupt public key {}: {e}", key.short_key_id()))
    })?;

    match pile.into_children().next() {
        Some(Packet::PublicKey(k)) => Ok(k.role_into_unspecified()),
        Some(Packet::PublicSubkey(k)) => Ok(k.role_into_unspecified()),
        _ => Err(KeyError::Signing(format!(
            "Key {} carries no public key packet",
            key.short_key_id()
        ))),
    }
}

fn decode_secret_key(key: &SecretKeyMaterial) -> KeyResult<Key<SecretParts, UnspecifiedRole>> {
    let pile = PacketPile::from_bytes(key.encrypted_private_key()).map_err(|e| {
        KeyError::Signing(format!("Corrupt secret key {}: {e}", key.short_key_id()))
    })?;

    match pile.into_children().next() {
        Some(Packet::SecretKey(k)) => Ok(k.role_into_unspecified()),
        Some(Packet::SecretSubkey(k)) => Ok(k.role_into_unspecified()),
        _ => Err(KeyError::Signing(format!(
            "Key {} carries no secret key packet",
            key.short_key_id()
        ))),
    }
}
