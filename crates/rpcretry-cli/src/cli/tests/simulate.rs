//! Tests for the simulate subcommand.

use super::parse;
use crate::cli::CliCommand;

#[test]
fn cli_parse_simulate_defaults() {
    match parse(&["rpcretry", "simulate"]) {
        CliCommand::Simulate(args) => {
            assert_eq!(args.calls, 5);
            assert_eq!(args.fail_first, 1);
            assert!(!args.non_retryable);
            assert!(args.pushback_ms.is_none());
            assert_eq!(args.latency_ms, 0);
            assert!(args.timeout_ms.is_none());
            assert!(!args.json);
        }
        _ => panic!("expected Simulate"),
    }
}

#[test]
fn cli_parse_simulate_negative_pushback() {
    match parse(&["rpcretry", "simulate", "--pushback-ms", "-1", "--calls", "2"]) {
        CliCommand::Simulate(args) => {
            assert_eq!(args.pushback_ms, Some(-1));
            assert_eq!(args.calls, 2);
        }
        _ => panic!("expected Simulate with --pushback-ms"),
    }
}

#[test]
fn cli_parse_simulate_flags() {
    match parse(&[
        "rpcretry",
        "simulate",
        "--fail-first",
        "3",
        "--non-retryable",
        "--latency-ms",
        "20",
        "--timeout-ms",
        "150",
        "--json",
    ]) {
        CliCommand::Simulate(args) => {
            assert_eq!(args.fail_first, 3);
            assert!(args.non_retryable);
            assert_eq!(args.latency_ms, 20);
            assert_eq!(args.timeout_ms, Some(150));
            assert!(args.json);
        }
        _ => panic!("expected Simulate"),
    }
}
