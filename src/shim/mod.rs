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

//! The request/response boundary: parse, validate, dispatch, respond.

pub mod dispatch;
pub mod envelope;
pub mod failure;
pub mod parse;
pub mod respond;
pub mod validate;

use crate::scheduler::Scheduler;
use crate::shim::dispatch::Reviewed;
use crate::shim::dispatch::dispatch;
use crate::shim::envelope::Invocation;
use crate::shim::envelope::Reply;
use crate::shim::failure::BatchError;
use crate::shim::parse::parse_body;
use crate::shim::parse::parse_event;
use crate::shim::validate::validate;
use crate::types::timestamp::Timestamp;

/// Handle one invocation. Every pair in the batch is reviewed at
/// `reviewed_at`.
pub fn handle<S: Scheduler + ?Sized>(
    invocation: &Invocation,
    scheduler: &S,
    reviewed_at: Timestamp,
) -> Reply {
    let body = invocation.body.as_deref();
    log::debug!(
        "Received invocation with {} byte body",
        body.map_or(0, str::len)
    );
    let reply = match review_batch(body, scheduler, reviewed_at) {
        Ok(reviewed) => {
            log::info!("Reviewed {} cards", reviewed.cards.len());
            respond::success(&reviewed)
        }
        Err(err) => {
            if err.status().is_server_error() {
                log::error!("{err}");
            } else {
                log::info!("Rejected batch: {err}");
            }
            respond::failure(&err)
        }
    };
    log::debug!("Responding with status {}", reply.status_code);
    reply
}

/// Handle a raw invocation envelope, as text.
pub fn handle_event<S: Scheduler + ?Sized>(
    event: &str,
    scheduler: &S,
    reviewed_at: Timestamp,
) -> Reply {
    match parse_event(event) {
        Ok(invocation) => handle(&invocation, scheduler, reviewed_at),
        Err(err) => {
            log::info!("Rejected invocation: {err}");
            respond::failure(&err)
        }
    }
}

fn review_batch<S: Scheduler + ?Sized>(
    body: Option<&str>,
    scheduler: &S,
    reviewed_at: Timestamp,
) -> Result<Reviewed, BatchError> {
    let raw = parse_body(body)?;
    let batch = validate(raw)?;
    log::debug!("Reviewing batch of {} cards", batch.size());
    dispatch(&batch, scheduler, reviewed_at)
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use serde_json::json;

    use super::*;
    use crate::config::SchedulerConfig;
    use crate::scheduler::FsrsScheduler;
    use crate::types::card::Card;
    use crate::types::card::State;
    use crate::types::rating::Rating;

    fn scheduler() -> FsrsScheduler {
        FsrsScheduler::new(&SchedulerConfig::default()).unwrap()
    }

    fn now() -> Timestamp {
        Timestamp::parse("2025-03-01T12:00:00Z").unwrap()
    }

    fn card(id: i64) -> Value {
        Card::new(id, now()).encode()
    }

    fn run(body: Value) -> (u16, Value, Reply) {
        let invocation = Invocation::with_body(body.to_string());
        let reply = handle(&invocation, &scheduler(), now());
        let parsed: Value = serde_json::from_str(&reply.body).unwrap();
        (reply.status_code, parsed, reply)
    }

    #[test]
    fn test_single_good_review() {
        let (status, body, reply) = run(json!({"cards": [card(1)], "statuses": ["good"]}));
        assert_eq!(status, 200);
        assert_eq!(
            reply.headers.unwrap().get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        let expected = scheduler()
            .review(&Card::new(1, now()), Rating::Good, now())
            .unwrap();
        assert_eq!(body["cards"], json!([expected.0.encode()]));
        assert_eq!(body["review_logs"], json!([serde_json::to_value(&expected.1).unwrap()]));
    }

    #[test]
    fn test_batch_lengths_and_order() {
        let cards: Vec<Value> = (1..=5).map(card).collect();
        let statuses = json!([1, 2, 3, 4, "again"]);
        let (status, body, _) = run(json!({"cards": cards, "statuses": statuses}));
        assert_eq!(status, 200);
        let out_cards = body["cards"].as_array().unwrap();
        let logs = body["review_logs"].as_array().unwrap();
        assert_eq!(out_cards.len(), 5);
        assert_eq!(logs.len(), 5);
        for (i, log) in logs.iter().enumerate() {
            assert_eq!(log["card_id"], json!(i as i64 + 1));
            assert_eq!(out_cards[i]["card_id"], json!(i as i64 + 1));
        }
        let ratings: Vec<&Value> = logs.iter().map(|l| &l["rating"]).collect();
        assert_eq!(ratings, vec![&json!(1), &json!(2), &json!(3), &json!(4), &json!(1)]);
        // Easy graduates a new card straight to review.
        assert_eq!(out_cards[3]["state"], json!(u8::from(State::Review)));
    }

    #[test]
    fn test_empty_cards() {
        let (status, body, _) = run(json!({"cards": [], "statuses": []}));
        assert_eq!(status, 400);
        assert_eq!(body, json!({"error": "No cards provided", "debug": []}));

        let (status, body, _) = run(json!({"cards": [], "statuses": ["good", "bad"]}));
        assert_eq!(status, 400);
        assert_eq!(body["error"], json!("No cards provided"));
    }

    #[test]
    fn test_absent_body() {
        let reply = handle(&Invocation::default(), &scheduler(), now());
        assert_eq!(reply.status_code, 400);
        let body: Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(body, json!({"error": "No cards provided", "debug": []}));
    }

    #[test]
    fn test_length_mismatch() {
        let (status, body, _) = run(json!({"cards": [card(1), card(2)], "statuses": ["good"]}));
        assert_eq!(status, 400);
        assert_eq!(body["error"], json!("Invalid input"));
        assert_eq!(body["debug"], json!({"cards": 2, "statuses": 1}));

        let (status, body, _) = run(json!({"cards": [card(1)]}));
        assert_eq!(status, 400);
        assert_eq!(body["debug"], json!({"cards": 1, "statuses": null}));
    }

    #[test]
    fn test_unparseable_body() {
        let reply = handle(&Invocation::with_body("{\"cards\": ["), &scheduler(), now());
        assert_eq!(reply.status_code, 400);
        let body: Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(body["error"], json!("Malformed request body"));
    }

    #[test]
    fn test_one_invalid_rating_fails_batch() {
        let (status, body, _) = run(json!({
            "cards": [card(1), card(2), card(3)],
            "statuses": ["good", "great", "easy"]
        }));
        assert_eq!(status, 400);
        assert!(body.get("cards").is_none());
        assert!(body.get("review_logs").is_none());
        assert_eq!(body["debug"], json!({"index": 1, "status": "great"}));
    }

    #[test]
    fn test_malformed_card() {
        let (status, body, _) = run(json!({"cards": [{"question": "?"}], "statuses": [3]}));
        assert_eq!(status, 400);
        assert_eq!(body["error"], json!("Malformed card at index 0"));
    }

    #[test]
    fn test_huge_stability_is_malformed() {
        let card = json!({
            "card_id": 1,
            "state": 2,
            "step": null,
            "stability": 1e308,
            "difficulty": 5.0,
            "due": now().to_string(),
            "last_review": now().plus(chrono::Duration::hours(-6)).to_string()
        });
        let (status, body, _) = run(json!({"cards": [card], "statuses": ["easy"]}));
        assert_eq!(status, 400);
        assert_eq!(body["error"], json!("Malformed card at index 0"));
    }

    #[test]
    fn test_null_cards() {
        let (status, body, _) = run(json!({"cards": null, "statuses": ["good"]}));
        assert_eq!(status, 400);
        assert_eq!(body, json!({"error": "No cards provided", "debug": []}));
    }

    #[test]
    fn test_handle_event() {
        let event = json!({
            "body": json!({"cards": [card(1)], "statuses": ["easy"]}).to_string()
        });
        let reply = handle_event(&event.to_string(), &scheduler(), now());
        assert_eq!(reply.status_code, 200);

        let reply = handle_event("][", &scheduler(), now());
        assert_eq!(reply.status_code, 400);
    }

    #[test]
    fn test_repeat_runs_keep_shape() {
        let body = json!({"cards": [card(1), card(2)], "statuses": ["hard", "good"]});
        let (_, first, _) = run(body.clone());
        let (_, second, _) = run(body);
        for out in [first, second] {
            assert_eq!(out["cards"].as_array().unwrap().len(), 2);
            assert_eq!(out["review_logs"].as_array().unwrap().len(), 2);
        }
    }
}
