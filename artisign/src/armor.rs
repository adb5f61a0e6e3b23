//! ASCII armor for detached signatures
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


use artisign_keys::{KeyError, KeyResult, Signature};
use openpgp::armor;
use sequoia_openpgp as openpgp;
use std::io::Write;

/// Wrap a binary signature packet in a `PGP SIGNATURE` armor block.
pub fn armor_signature(signature: &Signature) -> KeyResult<Vec<u8>> {
    let mut writer = armor::Writer::new(Vec::new(), armor::Kind::Signature)
        .map_err(|e| KeyError::io("Failed to create armored writer", e))?;
    writer
        .write_all(signature.as_bytes())
        .map_err(|e| KeyError::io("Failed to armor signature", e))?;
    writer
        .finalize()
        .map_err(|e| KeyError::io("Failed to armor signature", e))
}
