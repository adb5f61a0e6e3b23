//! Error types for secret material resolution and signing
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


use std::fmt::Display;
use thiserror::Error;

/// Key resolution and signing errors
#[derive(Error, Debug)]
pub enum KeyError {
    /// Malformed specifier, unknown scheme, malformed agent descriptor.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Missing or unreadable file, missing keyring entry, no key matching the criteria.
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Unexpected agent response, connection failure, malformed handshake.
    #[error("Agent protocol error: {message}")]
    Protocol {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The private key could not be unlocked with the supplied passphrase.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Signature generation failed for a reason other than the passphrase.
    #[error("Signing error: {0}")]
    Signing(String),

    /// Artifact and output I/O, outside key and passphrase loading.
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl KeyError {
    pub fn protocol(message: impl Into<String>) -> Self {
        KeyError::Protocol {
            message: message.into(),
            source: None,
        }
    }

    pub fn protocol_io(message: impl Into<String>, source: std::io::Error) -> Self {
        KeyError::Protocol {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        KeyError::NotFound {
            message: message.into(),
            source: None,
        }
    }

    /// A loader input that exists but could not be read
    pub fn not_found_io(message: impl Into<String>, source: std::io::Error) -> Self {
        KeyError::NotFound {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        KeyError::Io {
            context: context.into(),
            source,
        }
    }

    /// Prefix the message with loader context, keeping the error category.
    pub fn context(self, context: impl Display) -> Self {
        match self {
            KeyError::Configuration(m) => KeyError::Configuration(format!("{context}: {m}")),
            KeyError::NotFound { message, source } => KeyError::NotFound {
                message: format!("{context}: {message}"),
                source,
            },
            KeyError::Protocol { message, source } => KeyError::Protocol {
                message: format!("{context}: {message}"),
                source,
            },
            KeyError::Authentication(m) => KeyError::Authentication(format!("{context}: {m}")),
            KeyError::Signing(m) => KeyError::Signing(format!("{context}: {m}")),
            KeyError::Io { context: c, source } => KeyError::Io {
                context: format!("{context}: {c}"),
                source,
            },
        }
    }
}

impl From<std::io::Error> for KeyError {
    fn from(source: std::io::Error) -> Self {
        KeyError::io("I/O failure", source)
    }
}

/// Result type for key operations
pub type KeyResult<T> = Result<T, KeyError>;
