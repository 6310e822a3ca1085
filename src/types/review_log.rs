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
use serde::Serialize;

use crate::types::rating::Rating;
use crate::types::timestamp::Timestamp;

/// A record of a single review event.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ReviewLog {
    pub card_id: i64,
    pub rating: Rating,
    pub review_datetime: Timestamp,
    /// How long the review took, in milliseconds, if known.
    pub review_duration: Option<u64>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::Fallible;

    #[test]
    fn test_wire_format() -> Fallible<()> {
        let log = ReviewLog {
            card_id: 42,
            rating: Rating::Good,
            review_datetime: Timestamp::parse("2025-03-06T09:00:00Z")?,
            review_duration: None,
        };
        assert_eq!(
            serde_json::to_value(&log)?,
            json!({
                "card_id": 42,
                "rating": 3,
                "review_datetime": "2025-03-06T09:00:00+00:00",
                "review_duration": null
            })
        );
        Ok(())
    }
}
