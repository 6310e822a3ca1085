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

use chrono::Duration;

use crate::config::SchedulerConfig;
use crate::error::Fallible;
use crate::fsrs::Difficulty;
use crate::fsrs::Model;
use crate::fsrs::Stability;
use crate::types::card::Card;
use crate::types::card::State;
use crate::types::rating::Rating;
use crate::types::review_log::ReviewLog;
use crate::types::timestamp::Timestamp;

/// Computes a card's next state from a review.
pub trait Scheduler: Send + Sync {
    fn review(
        &self,
        card: &Card,
        rating: Rating,
        reviewed_at: Timestamp,
    ) -> Result<(Card, ReviewLog), SchedulingError>;
}

/// A failure inside the scheduler itself.
#[derive(Debug, PartialEq)]
pub struct SchedulingError {
    message: String,
}

impl SchedulingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for SchedulingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// The FSRS scheduler, with (re)learning steps and no interval fuzzing.
pub struct FsrsScheduler {
    model: Model,
    desired_retention: f64,
    learning_steps: Vec<Duration>,
    relearning_steps: Vec<Duration>,
    maximum_interval: u32,
}

impl FsrsScheduler {
    pub fn new(config: &SchedulerConfig) -> Fallible<Self> {
        Ok(Self {
            model: Model::new(config.weights()?),
            desired_retention: config.desired_retention,
            learning_steps: to_durations(&config.learning_steps),
            relearning_steps: to_durations(&config.relearning_steps),
            maximum_interval: config.maximum_interval,
        })
    }

    fn next_interval(&self, s: Stability) -> Duration {
        let days = self
            .model
            .interval(self.desired_retention, s)
            .round()
            .clamp(1.0, self.maximum_interval as f64);
        Duration::days(days as i64)
    }

    /// Update the memory state of `card` for a review at `now`.
    fn memory(&self, card: &Card, rating: Rating, now: Timestamp) -> (Stability, Difficulty) {
        match (card.stability, card.difficulty, card.last_review) {
            (Some(s), Some(d), Some(last)) if now.days_since(last) < 1 => (
                self.model.short_term_stability(s, rating),
                self.model.new_difficulty(d, rating),
            ),
            (Some(s), Some(d), last_review) => {
                let r = match last_review {
                    Some(last) => self.model.retrievability(now.days_since(last) as f64, s),
                    None => 0.0,
                };
                (
                    self.model.new_stability(d, s, r, rating),
                    self.model.new_difficulty(d, rating),
                )
            }
            _ => (
                self.model.initial_stability(rating),
                self.model.initial_difficulty(rating),
            ),
        }
    }

    /// Advance through `steps` for a card in a (re)learning state. Returns the
    /// new state, step, and the wait until the card is next due.
    fn step(
        &self,
        steps: &[Duration],
        step: usize,
        rating: Rating,
        s: Stability,
    ) -> (State, Option<usize>, Duration) {
        let graduate = (State::Review, None, self.next_interval(s));
        if steps.is_empty() || (step >= steps.len() && rating != Rating::Again) {
            return graduate;
        }
        match rating {
            Rating::Again => (State::Learning, Some(0), steps[0]),
            Rating::Hard => {
                let wait = if step == 0 && steps.len() == 1 {
                    steps[0] * 3 / 2
                } else if step == 0 {
                    (steps[0] + steps[1]) / 2
                } else {
                    steps[step.min(steps.len() - 1)]
                };
                (State::Learning, Some(step), wait)
            }
            Rating::Good => {
                if step + 1 >= steps.len() {
                    graduate
                } else {
                    (State::Learning, Some(step + 1), steps[step + 1])
                }
            }
            Rating::Easy => graduate,
        }
    }
}

fn to_durations(secs: &[u64]) -> Vec<Duration> {
    secs.iter().map(|s| Duration::seconds(*s as i64)).collect()
}

impl Scheduler for FsrsScheduler {
    fn review(
        &self,
        card: &Card,
        rating: Rating,
        reviewed_at: Timestamp,
    ) -> Result<(Card, ReviewLog), SchedulingError> {
        let (stability, difficulty) = self.memory(card, rating, reviewed_at);
        if !(stability.is_finite() && difficulty.is_finite()) {
            return Err(SchedulingError::new(format!(
                "card {} produced a non-finite memory state",
                card.card_id
            )));
        }

        let (state, step, wait) = match card.state {
            State::Learning => self.step(
                &self.learning_steps,
                card.step.unwrap_or(0),
                rating,
                stability,
            ),
            State::Relearning => {
                let (state, step, wait) = self.step(
                    &self.relearning_steps,
                    card.step.unwrap_or(0),
                    rating,
                    stability,
                );
                let state = match state {
                    State::Learning => State::Relearning,
                    other => other,
                };
                (state, step, wait)
            }
            State::Review => {
                if rating == Rating::Again && !self.relearning_steps.is_empty() {
                    (State::Relearning, Some(0), self.relearning_steps[0])
                } else {
                    (State::Review, None, self.next_interval(stability))
                }
            }
        };

        let due = reviewed_at.checked_plus(wait).ok_or_else(|| {
            SchedulingError::new(format!("card {} has a due date out of range", card.card_id))
        })?;
        let updated = Card {
            card_id: card.card_id,
            state,
            step,
            stability: Some(stability),
            difficulty: Some(difficulty),
            due,
            last_review: Some(reviewed_at),
        };
        let log = ReviewLog {
            card_id: card.card_id,
            rating,
            review_datetime: reviewed_at,
            review_duration: None,
        };
        Ok((updated, log))
    }
}
