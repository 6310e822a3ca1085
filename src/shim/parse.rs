// Copyright 2025 Fernando Borretti
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

use serde::Deserialize;
use serde_json::Value;

use crate::shim::envelope::Invocation;
use crate::shim::failure::BatchError;

/// The body used when the invocation carries none.
const DEFAULT_BODY: &str = r#"{"cards": []}"#;

/// A batch as it arrives, before any validation.
#[derive(Debug, Deserialize)]
pub struct RawBatch {
    #[serde(default)]
    pub cards: Option<Vec<Value>>,
    #[serde(default)]
    pub statuses: Option<Vec<Value>>,
}

pub fn parse_body(body: Option<&str>) -> Result<RawBatch, BatchError> {
    let body = match body {
        Some(b) if !b.trim().is_empty() => b,
        _ => DEFAULT_BODY,
    };
    serde_json::from_str(body).map_err(|e| BatchError::MalformedBody {
        detail: e.to_string(),
    })
}

/// Decode a whole invocation envelope.
pub fn parse_event(event: &str) -> Result<Invocation, BatchError> {
    serde_json::from_str(event).map_err(|e| BatchError::MalformedBody {
        detail: format!("invalid invocation envelope: {e}"),
    })
}
