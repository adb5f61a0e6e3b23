//! Signing key management for artisign
//!
//! Resolves an OpenPGP secret key and its passphrase from `scheme:opaque`
//! strings and produces detached signatures with them. Key schemes are
//! `keyfile`, `keyring` and `literal`; passphrase schemes are `literal`,
//! `file` and `gpg-agent`. Both sets can be extended through [`SchemeRegistry`].
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


pub mod agent;
pub mod backend;
pub mod error;
pub mod key_source;
pub mod key_types;
pub mod passphrase;
pub mod registry;
pub mod resolver;
pub mod sequoia_backend;
pub mod signer;
pub mod specifier;

pub use agent::{AgentEnvironment, AgentPassphraseSource, AgentSettings};
pub use backend::OpenPgpBackend;
pub use error::{KeyError, KeyResult};
pub use key_source::{KeyFileSource, KeyRingSource, LiteralKeySource, SecretKeySource};
pub use key_types::{Passphrase, PgpObject, SecretKeyMaterial, SecretKeyRing, Signature, UnlockOutcome};
pub use passphrase::{FilePassphraseSource, LiteralPassphraseSource, PassphraseSource};
pub use registry::{RegistryOptions, SchemeRegistry};
pub use resolver::{ResolvedSecrets, SecretResolver};
pub use sequoia_backend::SequoiaBackend;
pub use signer::Signer;
