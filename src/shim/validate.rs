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

use serde_json::Value;

use crate::shim::failure::BatchError;
use crate::shim::parse::RawBatch;

/// A batch with at least one card and exactly one status per card.
#[derive(Debug)]
pub struct Batch {
    cards: Vec<Value>,
    statuses: Vec<Value>,
}

impl Batch {
    pub fn size(&self) -> usize {
        self.cards.len()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.cards.iter().zip(self.statuses.iter())
    }
}

pub fn validate(raw: RawBatch) -> Result<Batch, BatchError> {
    let RawBatch { cards, statuses } = raw;
    let cards = cards.unwrap_or_default();
    if cards.is_empty() {
        return Err(BatchError::EmptyCards {
            cards: Value::Array(cards),
        });
    }
    match statuses {
        Some(statuses) if !statuses.is_empty() && statuses.len() == cards.len() => {
            Ok(Batch { cards, statuses })
        }
        statuses => Err(BatchError::LengthMismatch {
            cards: cards.len(),
            statuses: statuses.map(|s| s.len()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw(cards: Vec<Value>, statuses: Option<Vec<Value>>) -> RawBatch {
        RawBatch {
            cards: Some(cards),
            statuses,
        }
    }

    #[test]
    fn test_empty_cards_wins_regardless_of_statuses() {
        for statuses in [None, Some(vec![]), Some(vec![json!("good")])] {
            let err = validate(raw(vec![], statuses)).unwrap_err();
            assert_eq!(err, BatchError::EmptyCards { cards: json!([]) });
        }
    }

    #[test]
    fn test_null_cards_are_empty() {
        let batch = RawBatch {
            cards: None,
            statuses: Some(vec![json!("good")]),
        };
        let err = validate(batch).unwrap_err();
        assert_eq!(err, BatchError::EmptyCards { cards: json!([]) });
    }

    #[test]
    fn test_missing_statuses() {
        let err = validate(raw(vec![json!({})], None)).unwrap_err();
        assert_eq!(
            err,
            BatchError::LengthMismatch {
                cards: 1,
                statuses: None
            }
        );
    }

    #[test]
    fn test_length_mismatch() {
        let err = validate(raw(vec![json!({}), json!({})], Some(vec![json!("good")]))).unwrap_err();
        assert_eq!(
            err,
            BatchError::LengthMismatch {
                cards: 2,
                statuses: Some(1)
            }
        );
        let err = validate(raw(vec![json!({})], Some(vec![]))).unwrap_err();
        assert_eq!(err.kind(), "LengthMismatch");
    }

    #[test]
    fn test_valid_batch_keeps_order() {
        let batch = validate(raw(
            vec![json!("a"), json!("b")],
            Some(vec![json!(1), json!(2)]),
        ))
        .unwrap();
        assert_eq!(batch.size(), 2);
        let pairs: Vec<_> = batch.pairs().collect();
        assert_eq!(pairs, vec![(&json!("a"), &json!(1)), (&json!("b"), &json!(2))]);
    }
}
