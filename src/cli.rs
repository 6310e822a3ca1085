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

use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use crate::config::SchedulerConfig;
use crate::error::Fallible;
use crate::scheduler::FsrsScheduler;
use crate::server::ServerState;
use crate::server::start_server;
use crate::shim::envelope::Invocation;
use crate::shim::envelope::Reply;
use crate::shim::handle;
use crate::shim::handle_event;
use crate::types::timestamp::Timestamp;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Serve the review endpoints over HTTP.
    Serve {
        /// The address to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// The port to listen on.
        #[arg(long, default_value_t = 8000)]
        port: u16,
        /// Optional path to a TOML scheduler config.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Handle a single invocation and print the reply envelope.
    Invoke {
        /// Path to the invocation. Reads standard input if absent.
        path: Option<PathBuf>,
        /// Treat the input as a bare request body rather than an envelope.
        #[arg(long)]
        raw: bool,
        /// Review instant (RFC 3339). Defaults to the current time.
        #[arg(long)]
        now: Option<String>,
        /// Optional path to a TOML scheduler config.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Serve { host, port, config } => {
            let config = SchedulerConfig::load(config.as_deref())?;
            let scheduler = FsrsScheduler::new(&config)?;
            let state = ServerState {
                scheduler: Arc::new(scheduler),
            };
            let bind = format!("{host}:{port}");
            start_server(&bind, state).await
        }
        Command::Invoke {
            path,
            raw,
            now,
            config,
        } => {
            let input = read_input(path.as_deref())?;
            let reviewed_at = match now {
                Some(now) => Timestamp::parse(&now)?,
                None => Timestamp::now(),
            };
            let reply = invoke(&input, raw, reviewed_at, config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
            Ok(())
        }
    }
}

fn invoke(
    input: &str,
    raw: bool,
    reviewed_at: Timestamp,
    config: Option<&Path>,
) -> Fallible<Reply> {
    let config = SchedulerConfig::load(config)?;
    let scheduler = FsrsScheduler::new(&config)?;
    let reply = if raw {
        handle(&Invocation::with_body(input), &scheduler, reviewed_at)
    } else {
        handle_event(input, &scheduler, reviewed_at)
    };
    Ok(reply)
}

fn read_input(path: Option<&Path>) -> Fallible<String> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}
