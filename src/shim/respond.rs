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

use std::collections::BTreeMap;

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::shim::dispatch::Reviewed;
use crate::shim::envelope::Reply;
use crate::shim::failure::BatchError;
use crate::types::card::Card;
use crate::types::review_log::ReviewLog;

const JSON: &str = "application/json";

#[derive(Serialize)]
struct SuccessBody<'a> {
    cards: &'a [Card],
    review_logs: &'a [ReviewLog],
}

pub fn success(reviewed: &Reviewed) -> Reply {
    let body = SuccessBody {
        cards: &reviewed.cards,
        review_logs: &reviewed.review_logs,
    };
    match serde_json::to_string(&body) {
        Ok(body) => Reply {
            status_code: StatusCode::OK.as_u16(),
            headers: Some(json_headers()),
            body,
        },
        Err(e) => {
            log::error!("Failed to encode response: {e}");
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode response", None)
        }
    }
}

pub fn failure(err: &BatchError) -> Reply {
    error_reply(err.status(), &err.message(), err.debug())
}

fn error_reply(status: StatusCode, message: &str, debug: Option<Value>) -> Reply {
    let mut body = Map::new();
    body.insert("error".to_string(), Value::String(message.to_string()));
    if let Some(debug) = debug {
        body.insert("debug".to_string(), debug);
    }
    Reply {
        status_code: status.as_u16(),
        headers: Some(json_headers()),
        body: Value::Object(body).to_string(),
    }
}

fn json_headers() -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".to_string(), JSON.to_string());
    headers
}
