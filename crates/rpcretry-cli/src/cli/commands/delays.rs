//! `rpcretry delays` – sample backoff delays.

use anyhow::Result;
use rpcretry_core::config::{BackoffConfig, RetryConfig};
use rpcretry_core::Backoff;

pub fn run_delays(cfg: &RetryConfig, attempts: u32, samples: usize) -> Result<()> {
    let backoff = cfg
        .backoff
        .as_ref()
        .map(BackoffConfig::to_backoff)
        .transpose()?
        .unwrap_or_else(Backoff::none);
    println!("Backoff: {:?}", backoff.kind());
    print_samples(&backoff, attempts, samples);
    Ok(())
}

fn print_samples(backoff: &Backoff, attempts: u32, samples: usize) {
    println!("  {:>7}  {}", "Attempt", "Delay(ms)");
    println!("  {}  {}", "-------", "---------");
    for attempt in 1..=attempts {
        let delays: Vec<String> = (0..samples)
            .map(|_| format!("{:.1}", backoff.next_delay(attempt).as_secs_f64() * 1000.0))
            .collect();
        println!("  {:>7}  {}", attempt, delays.join(" "));
    }
}
