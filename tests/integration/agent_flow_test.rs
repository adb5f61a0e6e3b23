//! Integration Tests for gpg-agent passphrase retrieval
//!
//! A scripted agent listens on a Unix socket in a temp directory and hands
//! out passphrases for a real, password protected key.
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


mod common;

use artisign_keys::{
    AgentEnvironment, AgentSettings, KeyError, RegistryOptions, SecretResolver, SequoiaBackend,
};
use common::{generate, verify};
use openpgp::serialize::SerializeInto;
use sequoia_openpgp as openpgp;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixListener;
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Answers every GET_PASSPHRASE with the next passphrase and every other
/// command with a bare OK. Returns the GET_PASSPHRASE lines it saw.
fn spawn_agent(socket: &Path, passphrases: Vec<&'static str>) -> JoinHandle<Vec<String>> {
    let listener = UnixListener::bind(socket).unwrap();
    std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);
        writeln!(writer, "OK Pleased to meet you").unwrap();

        let mut requests = Vec::new();
        let mut passphrases = passphrases.into_iter();
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let reply = if line.starts_with("GET_PASSPHRASE") {
                requests.push(line.trim_end().to_string());
                match passphrases.next() {
                    Some(p) => format!("OK {}", hex::encode(p)),
                    None => "ERR 83886179 Operation cancelled".to_string(),
                }
            } else {
                "OK".to_string()
            };
            if writeln!(writer, "{reply}").is_err() {
                break;
            }
        }
        requests
    })
}

fn resolver(socket: &Path, max_attempts: u32) -> SecretResolver {
    SecretResolver::with_defaults(
        Arc::new(SequoiaBackend::new()),
        RegistryOptions {
            home_dir: None,
            agent_environment: AgentEnvironment {
                agent_info: Some(format!("{}:4242:1", socket.display())),
                display: Some(":0".to_string()),
                term: Some("xterm".to_string()),
            },
            agent_settings: AgentSettings {
                max_attempts,
                timeout: Some(Duration::from_secs(30)),
            },
        },
    )
}

#[test]
fn test_agent_retries_until_key_unlocks() {
    let dir = tempfile::tempdir().unwrap();
    let cert = generate("alice", Some("correct horse"));
    let key_path = dir.path().join("alice.asc");
    fs::write(&key_path, cert.as_tsk().armored().to_vec().unwrap()).unwrap();

    let socket = dir.path().join("S.gpg-agent");
    let agent = spawn_agent(&socket, vec!["battery staple", "correct horse"]);

    let signer = resolver(&socket, 3)
        .signer(&format!("keyfile:{}", key_path.display()), "gpg-agent:")
        .unwrap();
    let signature = signer.sign(b"artifact").unwrap();
    verify(&cert, &artisign::armor_signature(&signature).unwrap(), b"artifact");

    let requests = agent.join().unwrap();
    assert_eq!(requests.len(), 2);
    let short_id = signer.key().short_key_id();
    assert!(requests[0].starts_with(&format!("GET_PASSPHRASE artisign:passphrase{short_id} + ")));
    assert!(requests[1].contains(" Passphrase+incorrect "));
}

#[test]
fn test_agent_gives_up_after_max_attempts() {
    let dir = tempfile::tempdir().unwrap();
    let cert = generate("alice", Some("correct horse"));
    let key_path = dir.path().join("alice.asc");
    fs::write(&key_path, cert.as_tsk().armored().to_vec().unwrap()).unwrap();

    let socket = dir.path().join("S.gpg-agent");
    let agent = spawn_agent(&socket, vec!["one", "two", "three"]);

    let err = resolver(&socket, 2)
        .resolve(&format!("keyfile:{}", key_path.display()), "gpg-agent:")
        .unwrap_err();
    assert!(matches!(err, KeyError::Authentication(m) if m.contains("max attempts exceeded")));
    assert_eq!(agent.join().unwrap().len(), 2);
}
