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

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// The outcome of reviewing a card.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

/// A status value that does not name a rating.
#[derive(Debug, PartialEq)]
pub struct RatingError {
    pub value: Value,
}

impl Display for RatingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "not a valid rating: {}", self.value)
    }
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Rating::Again => 1,
            Rating::Hard => 2,
            Rating::Good => 3,
            Rating::Easy => 4,
        }
    }

    /// Coerce a loosely-typed status value into a rating.
    ///
    /// Accepts the integers 1 to 4 (also as integral floats or numeric
    /// strings) and rating names in any case. The status names used by the
    /// mobile client (`Wrong`, `Difficult`, `Normal`) are accepted as aliases.
    pub fn coerce(value: &Value) -> Result<Self, RatingError> {
        let rating = match value {
            Value::Number(n) => match (n.as_u64(), n.as_f64()) {
                (Some(i), _) => Self::from_code(i),
                (None, Some(f)) if f.fract() == 0.0 && f >= 0.0 => Self::from_code(f as u64),
                _ => None,
            },
            Value::String(s) => Self::from_name(s.trim()),
            _ => None,
        };
        rating.ok_or_else(|| RatingError {
            value: value.clone(),
        })
    }

    fn from_code(code: u64) -> Option<Self> {
        match code {
            1 => Some(Rating::Again),
            2 => Some(Rating::Hard),
            3 => Some(Rating::Good),
            4 => Some(Rating::Easy),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        if let Ok(code) = name.parse::<u64>() {
            return Self::from_code(code);
        }
        match name.to_ascii_lowercase().as_str() {
            "again" | "forgot" | "wrong" => Some(Rating::Again),
            "hard" | "difficult" => Some(Rating::Hard),
            "good" | "normal" => Some(Rating::Good),
            "easy" => Some(Rating::Easy),
            _ => None,
        }
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.as_u8()
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_code(value as u64).ok_or_else(|| format!("invalid rating: {value}"))
    }
}
