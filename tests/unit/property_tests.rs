//! Property tests for backoff arithmetic and report serialization.

#![allow(clippy::expect_used)]

use std::time::Duration;

use proptest::prelude::*;

use opsrun::report::{PipelineReport, ReportStatus};
use opsrun::retry::RetryPolicy;

proptest! {
    /// A policy with N attempts sleeps exactly N-1 times.
    #[test]
    fn prop_delay_count_is_attempts_minus_one(
        attempts in 1u32..=8,
        base_ms in 1u64..=10_000,
    ) {
        let policy = RetryPolicy::new(attempts, Duration::from_millis(base_ms));
        prop_assert_eq!(policy.delays().count() as u32, attempts - 1);
    }

    /// Without jitter and with multiplier >= 1, delays never shrink.
    #[test]
    fn prop_delays_are_monotonic_without_jitter(
        attempts in 2u32..=8,
        base_ms in 1u64..=10_000,
        multiplier in 1.0f64..=3.0,
    ) {
        let policy = RetryPolicy::new(attempts, Duration::from_millis(base_ms))
            .multiplier(multiplier);
        let delays: Vec<_> = policy.delays().collect();
        for pair in delays.windows(2) {
            prop_assert!(pair[0] <= pair[1], "{:?} then {:?}", pair[0], pair[1]);
        }
    }

    /// A cap bounds every delay, however fast the growth.
    #[test]
    fn prop_cap_bounds_every_delay(
        attempts in 2u32..=8,
        base_ms in 1u64..=10_000,
        multiplier in 1.0f64..=5.0,
        cap_ms in 1u64..=60_000,
    ) {
        let cap = Duration::from_millis(cap_ms);
        let policy = RetryPolicy::new(attempts, Duration::from_millis(base_ms))
            .multiplier(multiplier)
            .cap(cap);
        for delay in policy.delays() {
            prop_assert!(delay <= cap, "{delay:?} exceeds cap {cap:?}");
        }
    }

    /// Jitter stays within 50% and 150% of the deterministic delay.
    #[test]
    fn prop_jitter_stays_within_band(
        base_ms in 2u64..=10_000,
        attempt in 0u32..=4,
    ) {
        let plain = RetryPolicy::new(8, Duration::from_millis(base_ms));
        let jittered = plain.clone().jitter(true);
        let expected = plain.delay_for(attempt);
        let actual = jittered.delay_for(attempt);
        prop_assert!(actual >= expected.mul_f64(0.49), "{actual:?} below band");
        prop_assert!(actual <= expected.mul_f64(1.51), "{actual:?} above band");
    }

    /// Reports survive a JSON round trip with arbitrary field values.
    #[test]
    fn prop_report_json_roundtrip(
        duration in 0.0f64..=86_400.0,
        triggered_by in "[a-z][a-z0-9_-]{0,30}",
        success in any::<bool>(),
    ) {
        let status = if success { ReportStatus::Success } else { ReportStatus::Failure };
        let report = PipelineReport::now(status, duration, triggered_by);
        let json = serde_json::to_string(&report).expect("serialize");
        let parsed: PipelineReport = serde_json::from_str(&json).expect("deserialize");
        prop_assert_eq!(parsed, report);
    }
}
