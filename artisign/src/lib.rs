//! artisign
//!
//! Detached OpenPGP signatures for build artifacts. Key and passphrase
//! resolution lives in `artisign_keys`; this crate writes the armored
//! `.asc` files.
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


pub mod armor;
pub mod artifact;

pub use armor::armor_signature;
pub use artifact::{sign_artifacts, signature_path, SIGNATURE_EXTENSION};
