//! `scheme:opaque` specifier parsing
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


use crate::error::{KeyError, KeyResult};
use std::collections::HashMap;

/// A configuration string split at its first `:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Specifier<'a> {
    pub scheme: &'a str,
    pub opaque: &'a str,
}

impl<'a> Specifier<'a> {
    /// Split `raw` at the first `:`. Everything after it, further colons
    /// included, is the opaque part.
    pub fn parse(raw: &'a str) -> KeyResult<Self> {
        match raw.split_once(':') {
            Some((scheme, opaque)) => Ok(Self { scheme, opaque }),
            None => Err(KeyError::Configuration(format!(
                "Invalid specifier. It needs to start with a scheme like 'FOO:': {}",
                raw
            ))),
        }
    }
}

/// `key=value` options parsed from an opaque specifier.
pub type QueryParams = HashMap<String, String>;

/// Parse `a=b&c=d` into a map.
///
/// Each token is split at its first `=`; a token without `=` maps to an empty
/// value and the last occurrence of a key wins. There is no escaping, so `&`
/// cannot appear inside a value. Empty tokens are ignored.
pub fn parse_query(opaque: &str) -> QueryParams {
    let mut params = QueryParams::new();
    for token in opaque.split('&').filter(|t| !t.is_empty()) {
        match token.split_once('=') {
            Some((key, value)) => params.insert(key.to_string(), value.to_string()),
            None => params.insert(token.to_string(), String::new()),
        };
    }
    params
}
