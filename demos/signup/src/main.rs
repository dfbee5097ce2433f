//! Signup - vetted-dispatch example
//!
//! Dispatches one validated `signup/register` action per applicant through a
//! store and prints the resulting state as JSON:
//! 1. The creator builds a validatable action for each applicant
//! 2. ValidationMiddleware runs the async check on a spawned task
//! 3. The reducer sees the (normalized) registration or a rejection
//!
//! # Usage
//!
//! ```sh
//! cargo run -p signup-demo -- " Ada :36:ADA@example.com" "Bob:-4:bob@example.com"
//!
//! # Run the batch twice, clearing the state in between
//! cargo run -p signup-demo -- --rounds 2 --reset "Ada:36:ada@example.com"
//!
//! # Trace the chain
//! RUST_LOG=debug cargo run -p signup-demo -- --taken ada@example.com "Ada:36:ada@example.com"
//! ```

mod action;
mod reducer;
mod state;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use vetted_dispatch::{
    ActionLoggerConfig, LoggingMiddleware, RedispatchPolicy, Store, ValidationMiddleware,
};

use crate::action::{register, Applicant, SignupAction};
use crate::reducer::reducer;
use crate::state::SignupState;

/// Signup CLI - vetted-dispatch example
#[derive(Parser, Debug)]
#[command(name = "signup")]
#[command(about = "Validate applicants through a vetted-dispatch store")]
struct Args {
    /// Applicants as `name:age:email`
    #[arg(required = true)]
    applicants: Vec<Applicant>,

    /// Emails that are already registered (comma-separated)
    #[arg(long, value_delimiter = ',')]
    taken: Vec<String>,

    /// Where resolved actions re-enter the store
    #[arg(long, default_value_t = RedispatchPolicy::RestartFromTop)]
    policy: RedispatchPolicy,

    /// Simulated email lookup latency in milliseconds
    #[arg(long, default_value = "50")]
    lookup_ms: u64,

    /// Only log action kinds matching these glob patterns (comma-separated)
    #[arg(long)]
    log_include: Option<String>,

    /// Skip logging action kinds matching these glob patterns (comma-separated)
    #[arg(long)]
    log_exclude: Option<String>,

    /// Dispatch the applicant batch this many times
    #[arg(long, default_value = "1")]
    rounds: u32,

    /// Clear the state between rounds, so only the last round is printed
    #[arg(long)]
    reset: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let taken = Arc::new(
        args.taken
            .iter()
            .map(|email| email.trim().to_ascii_lowercase())
            .collect::<Vec<_>>(),
    );
    let creator = register(taken, Duration::from_millis(args.lookup_ms))?;

    let logging = LoggingMiddleware::verbose().with_filter(ActionLoggerConfig::new(
        args.log_include.as_deref(),
        args.log_exclude.as_deref(),
    ));
    let store = Store::new(SignupState::default(), reducer)
        .with_middleware(logging)
        .with_middleware(ValidationMiddleware::with_policy(args.policy));

    for round in 0..args.rounds {
        if round > 0 && args.reset {
            let changed = store.dispatch(SignupAction::Reset).changed();
            tracing::info!(round, changed = ?changed, "state reset");
        }

        let pending: Vec<_> = args
            .applicants
            .iter()
            .cloned()
            .map(|applicant| store.dispatch(creator.create::<SignupAction>(applicant)))
            .collect();
        for dispatched in pending {
            dispatched.settled().await?;
        }
    }

    let state = store.snapshot();
    tracing::info!(
        members = state.members.len(),
        rejections = state.rejections.len(),
        "signup finished"
    );
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}
