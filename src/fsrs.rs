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

//! The FSRS-5 memory model.

use crate::types::rating::Rating;

pub type Stability = f64;
pub type Difficulty = f64;
pub type Retrievability = f64;

/// Number of model weights.
pub const WEIGHT_COUNT: usize = 19;

pub type Weights = [f64; WEIGHT_COUNT];

pub const DEFAULT_WEIGHTS: Weights = [
    0.40255, 1.18385, 3.173, 15.69105, 7.1949, 0.5345, 1.4604, 0.0046, 1.54575, 0.1192, 1.01925,
    1.9395, 0.11, 0.29605, 2.2698, 0.2315, 2.9898, 0.51655, 0.6621,
];

const DECAY: f64 = -0.5;
const FACTOR: f64 = 19.0 / 81.0;

const MIN_STABILITY: Stability = 0.01;
/// The largest stability accepted on an incoming card, in days.
pub const MAX_STABILITY: Stability = 36500.0 * 100.0;
const MIN_DIFFICULTY: Difficulty = 1.0;
const MAX_DIFFICULTY: Difficulty = 10.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    w: Weights,
}

impl Default for Model {
    fn default() -> Self {
        Self::new(DEFAULT_WEIGHTS)
    }
}

fn grade(rating: Rating) -> f64 {
    rating.as_u8() as f64
}

impl Model {
    pub fn new(w: Weights) -> Self {
        Self { w }
    }

    /// Probability of recall after `elapsed_days` with the given stability.
    pub fn retrievability(&self, elapsed_days: f64, s: Stability) -> Retrievability {
        (1.0 + FACTOR * elapsed_days / s).powf(DECAY)
    }

    /// The interval, in days, after which recall probability drops to
    /// `desired_retention`. Not rounded.
    pub fn interval(&self, desired_retention: f64, s: Stability) -> f64 {
        (s / FACTOR) * (desired_retention.powf(1.0 / DECAY) - 1.0)
    }

    pub fn initial_stability(&self, rating: Rating) -> Stability {
        let i = (rating.as_u8() - 1) as usize;
        self.w[i].max(MIN_STABILITY)
    }

    pub fn initial_difficulty(&self, rating: Rating) -> Difficulty {
        self.raw_initial_difficulty(rating)
            .clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
    }

    fn raw_initial_difficulty(&self, rating: Rating) -> Difficulty {
        self.w[4] - (self.w[5] * (grade(rating) - 1.0)).exp() + 1.0
    }

    pub fn new_difficulty(&self, d: Difficulty, rating: Rating) -> Difficulty {
        let delta = -self.w[6] * (grade(rating) - 3.0);
        let damped = d + (MAX_DIFFICULTY - d) * delta / 9.0;
        let target = self.raw_initial_difficulty(Rating::Easy);
        (self.w[7] * target + (1.0 - self.w[7]) * damped).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
    }

    /// Stability after a review on the same day as the previous one.
    pub fn short_term_stability(&self, s: Stability, rating: Rating) -> Stability {
        let s = s * (self.w[17] * (grade(rating) - 3.0 + self.w[18])).exp();
        s.max(MIN_STABILITY)
    }

    pub fn new_stability(
        &self,
        d: Difficulty,
        s: Stability,
        r: Retrievability,
        rating: Rating,
    ) -> Stability {
        let s = if rating == Rating::Again {
            self.forget_stability(d, s, r)
        } else {
            self.recall_stability(d, s, r, rating)
        };
        s.max(MIN_STABILITY)
    }

    fn recall_stability(
        &self,
        d: Difficulty,
        s: Stability,
        r: Retrievability,
        rating: Rating,
    ) -> Stability {
        let hard_penalty = if rating == Rating::Hard {
            self.w[15]
        } else {
            1.0
        };
        let easy_bonus = if rating == Rating::Easy {
            self.w[16]
        } else {
            1.0
        };
        s * (1.0
            + self.w[8].exp()
                * (11.0 - d)
                * s.powf(-self.w[9])
                * (((1.0 - r) * self.w[10]).exp() - 1.0)
                * hard_penalty
                * easy_bonus)
    }

    fn forget_stability(&self, d: Difficulty, s: Stability, r: Retrievability) -> Stability {
        let long_term = self.w[11]
            * d.powf(-self.w[12])
            * ((s + 1.0).powf(self.w[13]) - 1.0)
            * ((1.0 - r) * self.w[14]).exp();
        let short_term = s / (self.w[17] * self.w[18]).exp();
        long_term.min(short_term)
    }
}
