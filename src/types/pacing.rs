//! Pacing configuration

use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::{
    AUTO_ADVANCE_DELAY_MS, CHOICE_PROMPT_DELAY_MS, CLOSING_BASE_DELAY_MS, CONVERGENCE_DWELL_MS,
    DEFAULT_BLOCK_DELAY_MS, HESITATION_THRESHOLD_MS, LOCK_DELAY_MS, PROCESSING_DELAY_COMPLIANT_MS,
    PROCESSING_DELAY_DEVIANT_MS, REVELATION_ADVANCE_DELAY_MS, REVELATION_CONCLUSION_DELAY_MS,
    REVELATION_ENTRY_INTERVAL_MS, REVELATION_HASH_DELAY_MS, SYSTEM_COMPLETE_DELAY_MS,
    SYSTEM_MESSAGE_INTERVAL_MS,
};

/// Every delay the controller schedules, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pacing {
    pub block_delay_ms: u64,
    pub system_message_interval_ms: u64,
    pub system_complete_delay_ms: u64,
    pub auto_advance_delay_ms: u64,
    pub choice_prompt_delay_ms: u64,
    pub hesitation_threshold_ms: u64,
    pub processing_compliant_ms: u64,
    pub processing_deviant_ms: u64,
    pub convergence_dwell_ms: u64,
    pub revelation_entry_interval_ms: u64,
    pub revelation_hash_delay_ms: u64,
    pub revelation_conclusion_delay_ms: u64,
    pub revelation_advance_delay_ms: u64,
    pub closing_base_delay_ms: u64,
    pub lock_delay_ms: u64,
    /// Multiplier applied to every delay (1.0 = authored pacing)
    pub speed: f64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            block_delay_ms: DEFAULT_BLOCK_DELAY_MS,
            system_message_interval_ms: SYSTEM_MESSAGE_INTERVAL_MS,
            system_complete_delay_ms: SYSTEM_COMPLETE_DELAY_MS,
            auto_advance_delay_ms: AUTO_ADVANCE_DELAY_MS,
            choice_prompt_delay_ms: CHOICE_PROMPT_DELAY_MS,
            hesitation_threshold_ms: HESITATION_THRESHOLD_MS,
            processing_compliant_ms: PROCESSING_DELAY_COMPLIANT_MS,
            processing_deviant_ms: PROCESSING_DELAY_DEVIANT_MS,
            convergence_dwell_ms: CONVERGENCE_DWELL_MS,
            revelation_entry_interval_ms: REVELATION_ENTRY_INTERVAL_MS,
            revelation_hash_delay_ms: REVELATION_HASH_DELAY_MS,
            revelation_conclusion_delay_ms: REVELATION_CONCLUSION_DELAY_MS,
            revelation_advance_delay_ms: REVELATION_ADVANCE_DELAY_MS,
            closing_base_delay_ms: CLOSING_BASE_DELAY_MS,
            lock_delay_ms: LOCK_DELAY_MS,
            speed: 1.0,
        }
    }
}

impl Pacing {
    /// Authored pacing scaled by `speed` (2.0 = twice as fast)
    ///
    /// Non-positive or non-finite speeds fall back to 1.0.
    pub fn with_speed(speed: f64) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 { speed } else { 1.0 };
        Self { speed, ..Self::default() }
    }

    /// Every delay collapses to zero; ordering is still preserved by the runtime
    pub fn instant() -> Self {
        Self { speed: f64::INFINITY, ..Self::default() }
    }

    /// Convert an authored delay into a scaled duration
    pub fn scaled(&self, ms: u64) -> Duration {
        if self.speed.is_infinite() {
            return Duration::ZERO;
        }
        Duration::from_nanos((ms as f64 * 1_000_000.0 / self.speed).round() as u64)
    }

    /// Reveal delay for one block: phase base delay + block delay (or default)
    pub fn block_delay(&self, base_ms: u64, block_ms: Option<u64>) -> Duration {
        self.scaled(base_ms + block_ms.unwrap_or(self.block_delay_ms))
    }

    /// Processing delay after a pick; deviant picks are answered faster
    pub fn processing_delay(&self, deviant: bool) -> Duration {
        if deviant {
            self.scaled(self.processing_deviant_ms)
        } else {
            self.scaled(self.processing_compliant_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pacing_matches_constants() {
        let p = Pacing::default();
        assert_eq!(p.scaled(p.convergence_dwell_ms), Duration::from_millis(2500));
        assert_eq!(p.block_delay(0, None), Duration::from_millis(150));
        assert_eq!(p.block_delay(100, Some(400)), Duration::from_millis(500));
    }

    #[test]
    fn test_speed_scales_delays() {
        let p = Pacing::with_speed(2.0);
        assert_eq!(p.scaled(1000), Duration::from_millis(500));
        assert_eq!(Pacing::with_speed(-3.0).speed, 1.0);
    }

    #[test]
    fn test_instant_pacing_is_zero() {
        let p = Pacing::instant();
        assert_eq!(p.scaled(LOCK_DELAY_MS), Duration::ZERO);
        assert_eq!(p.processing_delay(true), Duration::ZERO);
    }

    #[test]
    fn test_deviant_processing_is_faster() {
        let p = Pacing::default();
        assert!(p.processing_delay(true) < p.processing_delay(false));
    }
}
