//! Artifact signing
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


use crate::armor::armor_signature;
use artisign_keys::{KeyError, KeyResult, Signer};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

/// Signature extension appended to the artifact file name
pub const SIGNATURE_EXTENSION: &str = "asc";

/// Where the signature of `artifact` goes: `output_dir` if given, otherwise
/// next to the artifact, named `<file name>.asc`.
pub fn signature_path(artifact: &Path, output_dir: Option<&Path>) -> KeyResult<PathBuf> {
    let file_name = artifact.file_name().ok_or_else(|| {
        KeyError::Configuration(format!("Not a file: {}", artifact.display()))
    })?;

    let mut name = file_name.to_os_string();
    name.push(".");
    name.push(SIGNATURE_EXTENSION);

    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => artifact.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    Ok(dir.join(name))
}

/// Sign each artifact in order and write its armored signature.
///
/// Stops at the first failure. Returns the signature paths written.
pub fn sign_artifacts<P: AsRef<Path>>(
    signer: &Signer,
    artifacts: &[P],
    output_dir: Option<&Path>,
) -> KeyResult<Vec<PathBuf>> {
    if let Some(dir) = output_dir {
        fs::create_dir_all(dir)
            .map_err(|e| KeyError::io(format!("Failed to create {}", dir.display()), e))?;
    }

    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let artifact = artifact.as_ref();
        let file = File::open(artifact).map_err(|e| {
            KeyError::io(format!("Failed to open artifact {}", artifact.display()), e)
        })?;

        let signature = signer
            .sign_reader(BufReader::new(file))
            .map_err(|e| e.context(format!("Failed to sign {}", artifact.display())))?;
        let armored = armor_signature(&signature)?;

        let path = signature_path(artifact, output_dir)?;
        fs::write(&path, armored)
            .map_err(|e| KeyError::io(format!("Failed to write {}", path.display()), e))?;

        info!(
            artifact = %artifact.display(),
            signature = %path.display(),
            key_id = %signer.key().short_key_id(),
            "Signed artifact"
        );
        written.push(path);
    }
    Ok(written)
}
