//! `rpcretry simulate` – drive the configured policy against a fake service.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use rpcretry_core::config::{RetryConfig, ThrottleConfig};
use rpcretry_core::{CallContext, ErrorCode, Outcome, Pushback, RetryPolicy, Stat};

const UNAVAILABLE: i32 = 14;
const INVALID_ARGUMENT: i32 = 3;
const DEADLINE_EXCEEDED: i32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct SimulateArgs {
    /// Number of logical calls to make, one after another.
    #[arg(long, default_value = "5", value_name = "N")]
    pub calls: usize,
    /// Attempts per call that fail before the service answers.
    #[arg(long, default_value = "1", value_name = "K")]
    pub fail_first: u32,
    /// Fail with a non-retryable code instead of UNAVAILABLE.
    #[arg(long)]
    pub non_retryable: bool,
    /// Pushback attached to each failure; negative forbids retries.
    #[arg(long, allow_negative_numbers = true, value_name = "MS")]
    pub pushback_ms: Option<i64>,
    /// Latency of every attempt.
    #[arg(long, default_value = "0", value_name = "MS")]
    pub latency_ms: u64,
    /// Deadline for each logical call.
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,
    /// Print the session stats as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Status returned by the fake service.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SimStatus {
    code: i32,
    message: String,
}

impl fmt::Display for SimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {}: {}", self.code, self.message)
    }
}

impl std::error::Error for SimStatus {}

impl ErrorCode for SimStatus {
    fn code(&self) -> Option<i32> {
        Some(self.code)
    }
}

/// Fails the first `fail_first` attempts of every call, then answers.
#[derive(Debug)]
struct FakeService {
    fail_first: u32,
    code: i32,
    pushback: Option<Pushback>,
    latency: Duration,
}

impl FakeService {
    fn from_args(args: &SimulateArgs) -> Self {
        Self {
            fail_first: args.fail_first,
            code: if args.non_retryable {
                INVALID_ARGUMENT
            } else {
                UNAVAILABLE
            },
            pushback: args.pushback_ms.map(Pushback::from_millis),
            latency: Duration::from_millis(args.latency_ms),
        }
    }

    async fn call(&self, ctx: CallContext, request: &str) -> Outcome<String, SimStatus> {
        if !self.latency.is_zero() {
            tokio::select! {
                _ = ctx.done() => {
                    return Outcome::err(SimStatus {
                        code: DEADLINE_EXCEEDED,
                        message: format!("{request} cancelled"),
                    });
                }
                _ = tokio::time::sleep(self.latency) => {}
            }
        }
        let attempt = ctx.attempt();
        if attempt <= self.fail_first {
            let status = SimStatus {
                code: self.code,
                message: format!("{request} rejected on attempt {attempt}"),
            };
            return Outcome::err(status).with_pushback_opt(self.pushback);
        }
        Outcome::ok(format!("{request} served on attempt {attempt}"))
    }
}

pub async fn run_simulate(cfg: &RetryConfig, args: &SimulateArgs) -> Result<()> {
    // Own the bucket so its level can be shown after the run.
    let bucket = cfg
        .throttle
        .as_ref()
        .map(ThrottleConfig::build)
        .transpose()?
        .map(Arc::new);
    let mut builder = cfg.to_builder::<String, SimStatus>()?;
    if let Some(bucket) = &bucket {
        builder = builder.throttle(bucket.clone());
    }
    let policy = builder.build()?;

    let service = FakeService::from_args(args);
    let stats = simulate_calls(&policy, &service, args).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&stats);
    }
    if let Some(bucket) = &bucket {
        println!(
            "Throttle tokens: {:.2}/{:.2} (admits retries above {:.2})",
            bucket.tokens(),
            bucket.max_tokens(),
            bucket.threshold()
        );
    }
    Ok(())
}

async fn simulate_calls(
    policy: &RetryPolicy<String, SimStatus>,
    service: &FakeService,
    args: &SimulateArgs,
) -> Vec<Stat> {
    let mut stats = Vec::with_capacity(args.calls);
    for call in 1..=args.calls {
        let mut ctx = CallContext::new();
        if let Some(ms) = args.timeout_ms {
            ctx = ctx.with_timeout(Duration::from_millis(ms));
        }
        let request = format!("call-{call}");
        let (result, stat) = policy
            .invoke_with_stat(&ctx, request.as_str(), move |attempt_ctx, req| {
                service.call(attempt_ctx, req)
            })
            .await;
        match result {
            Ok(reply) => tracing::debug!(call, %reply, "simulated call succeeded"),
            Err(err) => tracing::debug!(call, error = %err, "simulated call failed"),
        }
        stats.push(stat);
    }
    stats
}

fn print_stats(stats: &[Stat]) {
    println!(
        "  {:>4}  {:>8}  {:>8}  {:>9}  {:>6}  {:>8}  {}",
        "Call", "Attempts", "Result", "Throttled", "Frozen", "Cost(ms)", "Error"
    );
    println!(
        "  {}  {}  {}  {}  {}  {}  {}",
        "----", "--------", "--------", "---------", "------", "--------", "-----"
    );
    for (i, s) in stats.iter().enumerate() {
        let result = if s.succeeded() {
            "ok"
        } else if s.timed_out {
            "timeout"
        } else {
            "error"
        };
        println!(
            "  {:>4}  {:>8}  {:>8}  {:>9}  {:>6}  {:>8.1}  {}",
            i + 1,
            s.attempt_count(),
            result,
            s.throttled,
            s.frozen,
            s.cost.as_secs_f64() * 1000.0,
            s.error.as_deref().unwrap_or("-")
        );
    }
    let ok = stats.iter().filter(|s| s.succeeded()).count();
    let retries: usize = stats.iter().map(Stat::retries).sum();
    println!("Succeeded {}/{} calls with {} retries.", ok, stats.len(), retries);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcretry_core::config::BackoffConfig;

    fn args() -> SimulateArgs {
        SimulateArgs {
            calls: 2,
            fail_first: 1,
            non_retryable: false,
            pushback_ms: None,
            latency_ms: 0,
            timeout_ms: None,
            json: false,
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy<String, SimStatus> {
        let cfg = RetryConfig {
            max_attempts,
            backoff: Some(BackoffConfig::None),
            throttle: None,
            ..RetryConfig::default()
        };
        cfg.to_builder().unwrap().build().unwrap()
    }

    #[tokio::test]
    async fn retries_until_fake_service_answers() {
        let args = SimulateArgs {
            fail_first: 2,
            ..args()
        };
        let stats = simulate_calls(&policy(3), &FakeService::from_args(&args), &args).await;
        assert_eq!(stats.len(), 2);
        assert!(stats.iter().all(|s| s.succeeded() && s.attempt_count() == 3));
    }

    #[tokio::test]
    async fn non_retryable_failures_stop_after_one_attempt() {
        let args = SimulateArgs {
            non_retryable: true,
            ..args()
        };
        let stats = simulate_calls(&policy(3), &FakeService::from_args(&args), &args).await;
        assert!(stats.iter().all(|s| !s.succeeded() && s.attempt_count() == 1));
        assert!(stats[0]
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("status 3:")));
    }

    #[tokio::test]
    async fn negative_pushback_freezes_each_call() {
        let args = SimulateArgs {
            pushback_ms: Some(-1),
            ..args()
        };
        let stats = simulate_calls(&policy(5), &FakeService::from_args(&args), &args).await;
        assert!(stats.iter().all(|s| s.frozen && s.attempt_count() == 1));
    }
}
