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

use crate::scheduler::Scheduler;
use crate::shim::failure::BatchError;
use crate::shim::validate::Batch;
use crate::types::card::Card;
use crate::types::rating::Rating;
use crate::types::review_log::ReviewLog;
use crate::types::timestamp::Timestamp;

/// The outcome of reviewing a whole batch. Index `i` of each vector belongs
/// to pair `i` of the request.
#[derive(Debug)]
pub struct Reviewed {
    pub cards: Vec<Card>,
    pub review_logs: Vec<ReviewLog>,
}

/// Review every pair in the batch, in order.
///
/// All pairs are decoded before the scheduler is called, so a malformed card
/// or rating anywhere in the batch means no pair is scheduled.
pub fn dispatch<S: Scheduler + ?Sized>(
    batch: &Batch,
    scheduler: &S,
    reviewed_at: Timestamp,
) -> Result<Reviewed, BatchError> {
    let mut pairs: Vec<(Card, Rating)> = Vec::with_capacity(batch.size());
    for (index, (raw_card, status)) in batch.pairs().enumerate() {
        let card = Card::decode(raw_card).map_err(|e| BatchError::MalformedCard {
            index,
            detail: e.to_string(),
        })?;
        let rating = Rating::coerce(status).map_err(|e| BatchError::InvalidRating {
            index,
            value: e.value,
        })?;
        pairs.push((card, rating));
    }

    let mut reviewed = Reviewed {
        cards: Vec::with_capacity(pairs.len()),
        review_logs: Vec::with_capacity(pairs.len()),
    };
    for (index, (card, rating)) in pairs.iter().enumerate() {
        let (card, log) = scheduler
            .review(card, *rating, reviewed_at)
            .map_err(|e| BatchError::SchedulingFault {
                index,
                detail: e.to_string(),
            })?;
        log::debug!(
            "card {} {} -> state={:?} due={}",
            card.card_id,
            rating.as_str(),
            card.state,
            card.due
        );
        reviewed.cards.push(card);
        reviewed.review_logs.push(log);
    }
    Ok(reviewed)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::Value;
    use serde_json::json;

    use super::*;
    use crate::scheduler::SchedulingError;
    use crate::shim::parse::RawBatch;
    use crate::shim::validate::validate;

    /// Records each call; fails on the card whose id is `fail_on`.
    struct Recorder {
        calls: Mutex<Vec<(i64, Rating)>>,
        fail_on: Option<i64>,
    }

    impl Recorder {
        fn new(fail_on: Option<i64>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on,
            }
        }
    }

    impl Scheduler for Recorder {
        fn review(
            &self,
            card: &Card,
            rating: Rating,
            reviewed_at: Timestamp,
        ) -> Result<(Card, ReviewLog), SchedulingError> {
            self.calls.lock().unwrap().push((card.card_id, rating));
            if self.fail_on == Some(card.card_id) {
                return Err(SchedulingError::new("boom"));
            }
            let mut updated = card.clone();
            updated.last_review = Some(reviewed_at);
            let log = ReviewLog {
                card_id: card.card_id,
                rating,
                review_datetime: reviewed_at,
                review_duration: None,
            };
            Ok((updated, log))
        }
    }

    fn now() -> Timestamp {
        Timestamp::parse("2025-03-01T12:00:00Z").unwrap()
    }

    fn card(id: i64) -> Value {
        json!({
            "card_id": id,
            "state": 1,
            "step": 0,
            "stability": null,
            "difficulty": null,
            "due": "2025-03-01T00:00:00Z",
            "last_review": null
        })
    }

    fn batch(cards: Vec<Value>, statuses: Vec<Value>) -> Batch {
        validate(RawBatch {
            cards: Some(cards),
            statuses: Some(statuses),
        })
        .unwrap()
    }

    #[test]
    fn test_preserves_order() {
        let scheduler = Recorder::new(None);
        let batch = batch(
            vec![card(3), card(1), card(2)],
            vec![json!("easy"), json!(1), json!("Hard")],
        );
        let reviewed = dispatch(&batch, &scheduler, now()).unwrap();
        let ids: Vec<i64> = reviewed.cards.iter().map(|c| c.card_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        let logs: Vec<(i64, Rating)> = reviewed
            .review_logs
            .iter()
            .map(|l| (l.card_id, l.rating))
            .collect();
        assert_eq!(
            logs,
            vec![(3, Rating::Easy), (1, Rating::Again), (2, Rating::Hard)]
        );
        assert_eq!(*scheduler.calls.lock().unwrap(), logs);
        assert!(reviewed.cards.iter().all(|c| c.last_review == Some(now())));
    }

    #[test]
    fn test_invalid_rating_schedules_nothing() {
        let scheduler = Recorder::new(None);
        let batch = batch(vec![card(1), card(2)], vec![json!("good"), json!("meh")]);
        let err = dispatch(&batch, &scheduler, now()).unwrap_err();
        assert_eq!(
            err,
            BatchError::InvalidRating {
                index: 1,
                value: json!("meh")
            }
        );
        assert!(scheduler.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_card_schedules_nothing() {
        let scheduler = Recorder::new(None);
        let batch = batch(
            vec![card(1), json!({"front": "hola"})],
            vec![json!("good"), json!("good")],
        );
        let err = dispatch(&batch, &scheduler, now()).unwrap_err();
        assert_eq!(err.kind(), "MalformedCard");
        assert!(matches!(err, BatchError::MalformedCard { index: 1, .. }));
        assert!(scheduler.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_card_checked_before_rating() {
        let scheduler = Recorder::new(None);
        let batch = batch(vec![json!(null)], vec![json!("meh")]);
        let err = dispatch(&batch, &scheduler, now()).unwrap_err();
        assert_eq!(err.kind(), "MalformedCard");
    }

    #[test]
    fn test_scheduler_fault_aborts() {
        let scheduler = Recorder::new(Some(2));
        let batch = batch(
            vec![card(1), card(2), card(3)],
            vec![json!(3), json!(3), json!(3)],
        );
        let err = dispatch(&batch, &scheduler, now()).unwrap_err();
        assert_eq!(
            err,
            BatchError::SchedulingFault {
                index: 1,
                detail: "boom".to_string()
            }
        );
        // The third pair is never attempted.
        assert_eq!(scheduler.calls.lock().unwrap().len(), 2);
    }
}
