//! gpg-agent passphrase client (`gpg-agent:` scheme)
//!
//! Talks the line-oriented Assuan protocol to a running agent over its Unix
//! domain socket:
//!
//! ```text
//! <- OK Pleased to meet you
//! -> OPTION display=:0
//! <- OK
//! -> GET_PASSPHRASE artisign:passphrased50582e6 + Passphrase Enter+passphrase...
//! <- OK 68756e74657232
//! ```
//!
//! Every candidate is tried against the key before it is returned. A wrong
//! passphrase sends the request again with an error text so the agent
//! re-prompts instead of serving its cache.
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
use crate::key_types::{Passphrase, SecretKeyMaterial, UnlockOutcome};
use crate::passphrase::PassphraseSource;
use std::env;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// `socket:pid:version` descriptor of a running agent
pub const AGENT_INFO_VAR: &str = "GPG_AGENT_INFO";
pub const DISPLAY_VAR: &str = "DISPLAY";
pub const TERM_VAR: &str = "TERM";

const CACHE_ID_PREFIX: &str = "artisign:passphrase";
const NO_ERROR: &str = "+";
const INCORRECT_PASSPHRASE: &str = "Passphrase+incorrect";

/// Process environment the agent client depends on, captured once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentEnvironment {
    pub agent_info: Option<String>,
    pub display: Option<String>,
    pub term: Option<String>,
}

impl AgentEnvironment {
    pub fn from_env() -> Self {
        Self {
            agent_info: env::var(AGENT_INFO_VAR).ok(),
            display: env::var(DISPLAY_VAR).ok(),
            term: env::var(TERM_VAR).ok(),
        }
    }
}

/// Parsed agent descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentInfo {
    pub socket_path: PathBuf,
    pub pid: String,
}

impl AgentInfo {
    /// Parse `socketPath:pid:1`. Exactly three fields, protocol version 1.
    pub fn parse(raw: &str) -> KeyResult<Self> {
        let tokens: Vec<&str> = raw.split(':').collect();
        match tokens.as_slice() {
            [socket, pid, "1"] if !socket.is_empty() => Ok(Self {
                socket_path: PathBuf::from(socket),
                pid: pid.to_string(),
            }),
            _ => Err(KeyError::Configuration(format!(
                "Invalid {AGENT_INFO_VAR}: {raw}"
            ))),
        }
    }

    pub fn from_environment(environment: &AgentEnvironment) -> KeyResult<Self> {
        match &environment.agent_info {
            Some(raw) => Self::parse(raw),
            None => Err(KeyError::Configuration(format!(
                "GPG agent is not running. There's no {AGENT_INFO_VAR} environment variable"
            ))),
        }
    }
}

/// Retry and timeout policy for the passphrase exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSettings {
    /// Passphrase requests before giving up. `0` never gives up.
    pub max_attempts: u32,
    /// Socket read/write timeout. `None` blocks indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout: None,
        }
    }
}

/// Escape text for an Assuan command argument.
pub fn escape_assuan(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            ' ' => escaped.push('+'),
            '+' | '%' => escaped.push_str(&format!("%{:02X}", c as u32)),
            c if c.is_ascii_control() => escaped.push_str(&format!("%{:02X}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}

/// One connection to the agent. The socket closes when the session drops.
pub struct AgentSession {
    reader: BufReader<UnixStream>,
    writer: UnixStream,
}

impl AgentSession {
    pub fn connect(socket_path: &Path, timeout: Option<Duration>) -> KeyResult<Self> {
        let unreachable =
            |e| KeyError::protocol_io(format!("Agent unreachable at {}", socket_path.display()), e);

        let stream = UnixStream::connect(socket_path).map_err(unreachable)?;
        stream.set_read_timeout(timeout).map_err(unreachable)?;
        stream.set_write_timeout(timeout).map_err(unreachable)?;
        let writer = stream.try_clone().map_err(unreachable)?;

        debug!(socket = %socket_path.display(), "Connected to gpg-agent");
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
        })
    }

    /// Consume the greeting, then forward display and terminal type.
    pub fn handshake(&mut self, environment: &AgentEnvironment) -> KeyResult<()> {
        self.read_greeting()?;

        if let Some(display) = &environment.display {
            self.command(&format!("OPTION display={display}"))?;
        }
        if let Some(term) = &environment.term {
            self.command(&format!("OPTION ttytype={term}"))?;
        }
        Ok(())
    }

    /// Ask the agent for a passphrase. `error` is `+` for none.
    pub fn get_passphrase(
        &mut self,
        cache_id: &str,
        error: &str,
        prompt: &str,
    ) -> KeyResult<Passphrase> {
        let payload =
            self.command(&format!("GET_PASSPHRASE {cache_id} {error} Passphrase {prompt}"))?;

        let bytes = Zeroizing::new(hex::decode(payload.as_str()).map_err(|e| {
            KeyError::protocol(format!("Agent returned a malformed passphrase payload: {e}"))
        })?);
        let text = std::str::from_utf8(&bytes)
            .map_err(|_| KeyError::protocol("Agent returned a passphrase that is not UTF-8"))?;
        Ok(Zeroizing::new(text.to_string()))
    }

    fn command(&mut self, line: &str) -> KeyResult<Zeroizing<String>> {
        self.send(line)?;
        self.read_ok()
    }

    fn send(&mut self, line: &str) -> KeyResult<()> {
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .and_then(|_| self.writer.flush())
            .map_err(|e| KeyError::protocol_io("Failed to write to agent", e))
    }

    /// The first line the agent sends must be an `OK`. Nothing is skipped.
    fn read_greeting(&mut self) -> KeyResult<()> {
        let line = self.read_line()?;
        if line.starts_with("OK") {
            Ok(())
        } else {
            Err(KeyError::protocol(format!(
                "Unexpected greeting: expected OK but got this instead: {}",
                line.as_str()
            )))
        }
    }

    fn read_line(&mut self) -> KeyResult<Zeroizing<String>> {
        let mut raw = Zeroizing::new(String::new());
        let read = self
            .reader
            .read_line(&mut raw)
            .map_err(|e| KeyError::protocol_io("Failed to read from agent", e))?;
        if read == 0 {
            return Err(KeyError::protocol("Agent closed the connection"));
        }
        Ok(Zeroizing::new(raw.trim_end_matches(&['\r', '\n'][..]).to_string()))
    }

    /// Read up to the next `OK` and return what follows it.
    ///
    /// Comment and status lines are skipped and inquiries are declined with
    /// `END`. Anything else fails.
    fn read_ok(&mut self) -> KeyResult<Zeroizing<String>> {
        loop {
            let raw = self.read_line()?;
            let line = raw.as_str();
            if line.starts_with('#') || line == "S" || line.starts_with("S ") {
                continue;
            }
            if line.starts_with("INQUIRE") {
                debug!(inquiry = line, "Declining agent inquiry");
                self.send("END")?;
                continue;
            }
            if line.starts_with("OK") {
                return Ok(Zeroizing::new(line.get(3..).unwrap_or("").trim().to_string()));
            }
            return Err(KeyError::protocol(format!(
                "Expected OK but got this instead: {line}"
            )));
        }
    }
}

/// Outcome of one passphrase request
enum Attempt {
    Accepted(Passphrase),
    Rejected,
}

/// Passphrase source backed by gpg-agent. Only returns a passphrase that
/// unlocks the key.
pub struct AgentPassphraseSource {
    backend: Arc<dyn OpenPgpBackend>,
    environment: AgentEnvironment,
    settings: AgentSettings,
}

impl AgentPassphraseSource {
    pub fn new(
        backend: Arc<dyn OpenPgpBackend>,
        environment: AgentEnvironment,
        settings: AgentSettings,
    ) -> Self {
        Self {
            backend,
            environment,
            settings,
        }
    }

    fn attempt(
        &self,
        session: &mut AgentSession,
        key: &SecretKeyMaterial,
        cache_id: &str,
        error: &str,
        prompt: &str,
    ) -> KeyResult<Attempt> {
        let candidate = session.get_passphrase(cache_id, error, prompt)?;
        Ok(match self.backend.unlock(key, &candidate)? {
            UnlockOutcome::Accepted => Attempt::Accepted(candidate),
            UnlockOutcome::Rejected => Attempt::Rejected,
        })
    }

    fn negotiate(&self, session: &mut AgentSession, key: &SecretKeyMaterial) -> KeyResult<Passphrase> {
        let key_id = key.short_key_id();
        let cache_id = format!("{CACHE_ID_PREFIX}{key_id}");
        let prompt = escape_assuan(&format!(
            "Enter passphrase to unlock key {key_id} for signing artifacts"
        ));

        let mut attempts: u32 = 0;
        loop {
            if self.settings.max_attempts != 0 && attempts >= self.settings.max_attempts {
                return Err(KeyError::Authentication(format!(
                    "max attempts exceeded: key {key_id} was not unlocked after {attempts} passphrase requests"
                )));
            }
            attempts += 1;

            let error = if attempts == 1 {
                NO_ERROR
            } else {
                INCORRECT_PASSPHRASE
            };
            match self.attempt(session, key, &cache_id, error, &prompt)? {
                Attempt::Accepted(passphrase) => {
                    info!(key_id = %key_id, attempts, "Agent passphrase accepted");
                    return Ok(passphrase);
                }
                Attempt::Rejected => {
                    warn!(key_id = %key_id, attempt = attempts, "Agent passphrase rejected");
                }
            }
        }
    }
}

impl PassphraseSource for AgentPassphraseSource {
    fn load(&self, key: &SecretKeyMaterial, _specifier: &str) -> KeyResult<Passphrase> {
        let info = AgentInfo::from_environment(&self.environment)?;
        debug!(socket = %info.socket_path.display(), pid = %info.pid, "Using gpg-agent");

        let mut session = AgentSession::connect(&info.socket_path, self.settings.timeout)?;
        session.handshake(&self.environment)?;
        self.negotiate(&mut session, key)
    }
}
