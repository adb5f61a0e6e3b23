//! Integration Tests for the resolve and sign pipeline
//!
//! Keys are generated at test time; nothing outside the temp directories is
//! touched.
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

use artisign::{sign_artifacts, signature_path};
use artisign_config::{CliOverrides, SignerConfig};
use artisign_keys::{KeyError, RegistryOptions, SecretResolver, SequoiaBackend};
use common::{generate, key_id, verify};
use openpgp::serialize::SerializeInto;
use sequoia_openpgp as openpgp;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn resolver(home: Option<&Path>) -> SecretResolver {
    SecretResolver::with_defaults(
        Arc::new(SequoiaBackend::new()),
        RegistryOptions {
            home_dir: home.map(Path::to_path_buf),
            ..Default::default()
        },
    )
}

#[test]
fn test_keyfile_with_literal_passphrase_signs_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let cert = generate("Release Bot <release@example.org>", Some("s3cret"));
    let key_path = dir.path().join("release.asc");
    fs::write(&key_path, cert.as_tsk().armored().to_vec().unwrap()).unwrap();

    let jar = dir.path().join("app-1.0.jar");
    let pom = dir.path().join("app-1.0.pom");
    fs::write(&jar, b"jar bytes").unwrap();
    fs::write(&pom, b"<project/>").unwrap();

    let signer = resolver(None)
        .signer(&format!("keyfile:{}", key_path.display()), "literal:s3cret")
        .unwrap();
    assert_eq!(signer.key().key_id(), key_id(&cert));

    let out = dir.path().join("signatures");
    let written = sign_artifacts(&signer, &[&jar, &pom], Some(out.as_path())).unwrap();
    assert_eq!(
        written,
        vec![
            signature_path(&jar, Some(out.as_path())).unwrap(),
            signature_path(&pom, Some(out.as_path())).unwrap(),
        ]
    );

    verify(&cert, &fs::read(&written[0]).unwrap(), b"jar bytes");
    verify(&cert, &fs::read(&written[1]).unwrap(), b"<project/>");
}

#[test]
fn test_signature_written_next_to_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let cert = generate("alice", None);
    let key_path = dir.path().join("alice.gpg");
    fs::write(&key_path, cert.as_tsk().to_vec().unwrap()).unwrap();

    let artifact = dir.path().join("app.tar.gz");
    fs::write(&artifact, b"tarball").unwrap();

    // An unprotected key accepts any passphrase
    let signer = resolver(None)
        .signer(&format!("keyfile:{}", key_path.display()), "literal:")
        .unwrap();
    let written = sign_artifacts(&signer, &[&artifact], None).unwrap();

    assert_eq!(written, vec![dir.path().join("app.tar.gz.asc")]);
    let armored = fs::read_to_string(&written[0]).unwrap();
    assert!(armored.starts_with("-----BEGIN PGP SIGNATURE-----"));
    verify(&cert, armored.as_bytes(), b"tarball");
}

#[test]
fn test_literal_key() {
    let cert = generate("alice", Some("pw"));
    let armored = String::from_utf8(cert.as_tsk().armored().to_vec().unwrap()).unwrap();

    let signer = resolver(None)
        .signer(&format!("literal:{armored}"), "literal:pw")
        .unwrap();
    let signature = signer.sign(b"payload").unwrap();
    let armored_signature = artisign::armor_signature(&signature).unwrap();
    verify(&cert, &armored_signature, b"payload");
}

#[test]
fn test_keyring_selects_key_by_user_id() {
    let home = tempfile::tempdir().unwrap();
    let alice = generate("Alice <alice@example.org>", Some("alice-pw"));
    let bob = generate("Bob <bob@example.org>", Some("bob-pw"));

    let mut keyring = alice.as_tsk().to_vec().unwrap();
    keyring.extend(bob.as_tsk().to_vec().unwrap());
    fs::create_dir_all(home.path().join(".gnupg")).unwrap();
    fs::write(home.path().join(".gnupg/secring.gpg"), keyring).unwrap();

    let resolver = resolver(Some(home.path()));
    let secrets = resolver.resolve("keyring:id=BOB", "literal:bob-pw").unwrap();
    assert_eq!(secrets.key.key_id(), key_id(&bob));

    let short = format!("0x{:X}", key_id(&bob) & 0xFFFF_FFFF);
    let secrets = resolver
        .resolve(&format!("keyring:id={short}"), "literal:bob-pw")
        .unwrap();
    assert_eq!(secrets.key.key_id(), key_id(&bob));

    // No id: the first key ring wins
    let secrets = resolver.resolve("keyring:", "literal:alice-pw").unwrap();
    assert_eq!(secrets.key.key_id(), key_id(&alice));
}

#[test]
fn test_keyring_without_match() {
    let dir = tempfile::tempdir().unwrap();
    let keyring = dir.path().join("ring.gpg");
    fs::write(&keyring, generate("alice", None).as_tsk().to_vec().unwrap()).unwrap();

    let err = resolver(None)
        .resolve_key(&format!("keyring:keyring={}&id=carol", keyring.display()))
        .unwrap_err();
    assert!(matches!(err, KeyError::NotFound { message: m, .. } if m.contains("carol")));
}

#[test]
fn test_file_passphrase_with_colon_in_path() {
    let dir = tempfile::tempdir().unwrap();
    let cert = generate("alice", Some("from file"));
    let key_path = dir.path().join("alice.asc");
    fs::write(&key_path, cert.as_tsk().armored().to_vec().unwrap()).unwrap();

    let pass_path = dir.path().join("pass:word.txt");
    fs::write(&pass_path, "from file\n").unwrap();
    let pass_spec = format!("file:{}", pass_path.display().to_string().replace(':', "|"));

    let signer = resolver(None)
        .signer(&format!("keyfile:{}", key_path.display()), &pass_spec)
        .unwrap();
    let signature = signer.sign(b"data").unwrap();
    verify(&cert, &artisign::armor_signature(&signature).unwrap(), b"data");
}

#[test]
fn test_wrong_passphrase_fails_before_signing() {
    let dir = tempfile::tempdir().unwrap();
    let cert = generate("alice", Some("right"));
    let key_path = dir.path().join("alice.asc");
    fs::write(&key_path, cert.as_tsk().armored().to_vec().unwrap()).unwrap();

    let err = resolver(None)
        .signer(&format!("keyfile:{}", key_path.display()), "literal:wrong")
        .err()
        .unwrap();
    assert!(matches!(err, KeyError::Authentication(_)));
}

#[test]
fn test_public_certificate_is_not_a_signing_key() {
    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("public.asc");
    fs::write(&key_path, generate("alice", None).armored().to_vec().unwrap()).unwrap();

    let err = resolver(None)
        .resolve_key(&format!("keyfile:{}", key_path.display()))
        .unwrap_err();
    assert!(matches!(err, KeyError::NotFound { .. }));
}

#[test]
fn test_configuration_feeds_resolver() {
    let dir = tempfile::tempdir().unwrap();
    let cert = generate("alice", Some("env-pw"));
    let key_path = dir.path().join("alice.asc");
    fs::write(&key_path, cert.as_tsk().armored().to_vec().unwrap()).unwrap();

    let environment: HashMap<String, String> = [
        ("PGP_SECRETKEY".to_string(), format!("keyfile:{}", key_path.display())),
        ("PGP_PASSPHRASE".to_string(), "literal:env-pw".to_string()),
    ]
    .into_iter()
    .collect();
    let config = SignerConfig::from_sources(&environment, None, &CliOverrides::default()).unwrap();
    let specifiers = config.secret_specifiers().unwrap();

    let signer = resolver(config.home_dir.as_deref())
        .signer(specifiers.secret_key, specifiers.passphrase)
        .unwrap();
    assert_eq!(signer.key().key_id(), key_id(&cert));
}
