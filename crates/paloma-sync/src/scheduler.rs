// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Overlap-safe tick source for the periodic engines.

use std::time::Duration;

use tokio::time::{interval, Interval, MissedTickBehavior};

/// Builds the interval both engines poll on.
///
/// Missed ticks are skipped, not burst: a cycle that outlasts its period
/// delays the next tick to the following period boundary instead of queueing
/// concurrent cycles against a slow backend.
pub fn cycle_interval(period: Duration) -> Interval {
    let mut ticks = interval(period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn slow_cycles_do_not_accumulate_ticks() {
        let mut ticks = cycle_interval(Duration::from_secs(10));
        ticks.tick().await; // immediate first tick

        // Simulate a cycle that overruns three periods.
        tokio::time::advance(Duration::from_secs(35)).await;

        // Only one tick is pending despite three periods elapsing.
        ticks.tick().await;
        let pending = tokio::time::timeout(Duration::from_millis(1), ticks.tick()).await;
        assert!(pending.is_err(), "skipped ticks must not burst");
    }
}
