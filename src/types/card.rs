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

use crate::fsrs::Difficulty;
use crate::fsrs::MAX_STABILITY;
use crate::fsrs::Stability;
use crate::types::timestamp::Timestamp;

/// The learning phase a card is in.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum State {
    Learning,
    Review,
    Relearning,
}

impl From<State> for u8 {
    fn from(value: State) -> Self {
        match value {
            State::Learning => 1,
            State::Review => 2,
            State::Relearning => 3,
        }
    }
}

impl TryFrom<u8> for State {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(State::Learning),
            2 => Ok(State::Review),
            3 => Ok(State::Relearning),
            _ => Err(format!("invalid card state: {value}")),
        }
    }
}

/// A card's scheduling state.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Card {
    pub card_id: i64,
    pub state: State,
    /// The index into the (re)learning steps. Absent in the review state.
    pub step: Option<usize>,
    pub stability: Option<Stability>,
    pub difficulty: Option<Difficulty>,
    pub due: Timestamp,
    pub last_review: Option<Timestamp>,
}

/// Why a card record was rejected.
#[derive(Debug, PartialEq)]
pub struct CardError {
    message: String,
}

impl CardError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for CardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Card {
    /// A card that has never been reviewed, due at `now`.
    #[cfg(test)]
    pub fn new(card_id: i64, now: Timestamp) -> Self {
        Self {
            card_id,
            state: State::Learning,
            step: Some(0),
            stability: None,
            difficulty: None,
            due: now,
            last_review: None,
        }
    }

    /// Decode a card record, rejecting anything that does not match the
    /// schema or describes an impossible scheduling state.
    pub fn decode(value: &Value) -> Result<Self, CardError> {
        let card: Card = Card::deserialize(value).map_err(|e| CardError::new(e.to_string()))?;
        card.check()?;
        Ok(card)
    }

    #[cfg(test)]
    pub fn encode(&self) -> Value {
        serde_json::to_value(self).unwrap()
    }

    fn check(&self) -> Result<(), CardError> {
        match (self.state, self.step) {
            (State::Review, Some(_)) => {
                return Err(CardError::new("a card in review cannot have a step"));
            }
            (State::Learning | State::Relearning, None) => {
                return Err(CardError::new("a (re)learning card must have a step"));
            }
            _ => {}
        }
        match (self.stability, self.difficulty) {
            (Some(s), Some(d)) => {
                if !(s.is_finite() && s > 0.0 && s <= MAX_STABILITY) {
                    return Err(CardError::new(format!("stability out of range: {s}")));
                }
                if !(d.is_finite() && (1.0..=10.0).contains(&d)) {
                    return Err(CardError::new(format!("difficulty out of range: {d}")));
                }
            }
            (None, None) => {
                if self.state != State::Learning {
                    return Err(CardError::new(
                        "only a learning card may lack stability and difficulty",
                    ));
                }
            }
            _ => {
                return Err(CardError::new(
                    "stability and difficulty must be given together",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn review_card() -> Value {
        json!({
            "card_id": 1718000000000i64,
            "state": 2,
            "step": null,
            "stability": 4.5,
            "difficulty": 5.25,
            "due": "2025-03-10T09:00:00+00:00",
            "last_review": "2025-03-06T09:00:00+00:00"
        })
    }

    #[test]
    fn test_decode_review_card() {
        let card = Card::decode(&review_card()).unwrap();
        assert_eq!(card.state, State::Review);
        assert_eq!(card.step, None);
        assert_eq!(card.stability, Some(4.5));
        assert_eq!(card.encode(), review_card());
    }

    #[test]
    fn test_decode_new_card() {
        let value = json!({
            "card_id": 7,
            "state": 1,
            "step": 0,
            "stability": null,
            "difficulty": null,
            "due": "2025-03-10T09:00:00Z",
            "last_review": null
        });
        let card = Card::decode(&value).unwrap();
        assert_eq!(card, Card::new(7, card.due));
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        assert!(Card::decode(&json!("card")).is_err());
        assert!(Card::decode(&json!({"card_id": 1})).is_err());
        let mut value = review_card();
        value["state"] = json!(9);
        assert!(Card::decode(&value).is_err());
        let mut value = review_card();
        value["due"] = json!("tomorrow");
        assert!(Card::decode(&value).is_err());
        let mut value = review_card();
        value["colour"] = json!("red");
        assert!(Card::decode(&value).is_err());
    }

    #[test]
    fn test_decode_rejects_inconsistent_state() {
        let mut value = review_card();
        value["step"] = json!(1);
        assert!(Card::decode(&value).is_err());

        let mut value = review_card();
        value["difficulty"] = json!(null);
        assert!(Card::decode(&value).is_err());

        let mut value = review_card();
        value["difficulty"] = json!(11.0);
        assert!(Card::decode(&value).is_err());

        let mut value = review_card();
        value["stability"] = json!(0.0);
        assert!(Card::decode(&value).is_err());

        let mut value = review_card();
        value["stability"] = json!(1e308);
        assert!(Card::decode(&value).is_err());

        let mut value = review_card();
        value["stability"] = json!(MAX_STABILITY);
        assert!(Card::decode(&value).is_ok());

        let mut value = review_card();
        value["stability"] = json!(null);
        value["difficulty"] = json!(null);
        assert!(Card::decode(&value).is_err());
    }
}
