//! Shared helpers for the integration tests
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


#![allow(dead_code)]

use openpgp::cert::{Cert, CertBuilder};
use openpgp::crypto::Password;
use openpgp::parse::Parse;
use openpgp::Packet;
use sequoia_openpgp as openpgp;

/// Fresh certificate with a signing subkey, optionally password protected.
pub fn generate(uid: &str, password: Option<&str>) -> Cert {
    let (cert, _revocation) = CertBuilder::new()
        .add_userid(uid)
        .add_signing_subkey()
        .set_password(password.map(Password::from))
        .generate()
        .expect("Failed to generate certificate");
    cert
}

/// 64-bit id of the primary key
pub fn key_id(cert: &Cert) -> u64 {
    let bytes: [u8; 8] = cert
        .keyid()
        .as_bytes()
        .try_into()
        .expect("V4 key ids are 8 bytes");
    u64::from_be_bytes(bytes)
}

/// Check that `armored` is a valid signature over `data` by the primary key.
pub fn verify(cert: &Cert, armored: &[u8], data: &[u8]) {
    let packet = Packet::from_bytes(armored).expect("Failed to parse signature");
    let mut signature = match packet {
        Packet::Signature(signature) => signature,
        other => panic!("expected a signature packet, got {other:?}"),
    };
    signature
        .verify_message(cert.primary_key().key(), data)
        .expect("Signature does not verify");
}
