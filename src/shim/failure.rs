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

use std::fmt::Display;
use std::fmt::Formatter;

use axum::http::StatusCode;
use serde_json::Value;
use serde_json::json;

/// Everything that can make a batch invocation fail.
#[derive(Debug, PartialEq)]
pub enum BatchError {
    /// The body is not a JSON object of the expected shape.
    MalformedBody { detail: String },
    /// The batch has no cards.
    EmptyCards { cards: Value },
    /// The statuses are missing or do not line up with the cards.
    LengthMismatch {
        cards: usize,
        statuses: Option<usize>,
    },
    InvalidRating { index: usize, value: Value },
    MalformedCard { index: usize, detail: String },
    /// The scheduler failed on a well-formed pair.
    SchedulingFault { index: usize, detail: String },
}

impl BatchError {
    pub fn kind(&self) -> &'static str {
        match self {
            BatchError::MalformedBody { .. } => "MalformedBody",
            BatchError::EmptyCards { .. } => "EmptyCards",
            BatchError::LengthMismatch { .. } => "LengthMismatch",
            BatchError::InvalidRating { .. } => "InvalidRating",
            BatchError::MalformedCard { .. } => "MalformedCard",
            BatchError::SchedulingFault { .. } => "SchedulingFault",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            BatchError::SchedulingFault { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// The human-readable message sent to the caller.
    pub fn message(&self) -> String {
        match self {
            BatchError::MalformedBody { .. } => "Malformed request body".to_string(),
            BatchError::EmptyCards { .. } => "No cards provided".to_string(),
            BatchError::LengthMismatch { .. } => "Invalid input".to_string(),
            BatchError::InvalidRating { index, .. } => format!("Invalid rating at index {index}"),
            BatchError::MalformedCard { index, .. } => format!("Malformed card at index {index}"),
            BatchError::SchedulingFault { .. } => "Internal scheduling error".to_string(),
        }
    }

    /// Diagnostic context for the caller. Never includes card payloads.
    pub fn debug(&self) -> Option<Value> {
        match self {
            BatchError::MalformedBody { detail } => Some(json!(detail)),
            BatchError::EmptyCards { cards } => Some(cards.clone()),
            BatchError::LengthMismatch { cards, statuses } => {
                Some(json!({ "cards": cards, "statuses": statuses }))
            }
            BatchError::InvalidRating { index, value } => {
                Some(json!({ "index": index, "status": value }))
            }
            BatchError::MalformedCard { index, detail } => {
                Some(json!({ "index": index, "reason": detail }))
            }
            BatchError::SchedulingFault { .. } => None,
        }
    }
}

impl Display for BatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchError::SchedulingFault { index, detail } => {
                write!(f, "{}: pair {index}: {detail}", self.kind())
            }
            _ => write!(f, "{}: {}", self.kind(), self.message()),
        }
    }
}
