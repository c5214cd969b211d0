//! Deterministic fake-work generators.
//!
//! These stand in for the real generation backend during development.
//! The contract the client relies on: progress is monotonic and
//! saturates at 100, completion results are computed once and stable
//! thereafter, and stage completion only moves forward.

use std::time::Duration;

use rand::Rng;
use spriteforge_core::batch::{BatchResult, FRAMES_PER_BATCH};

/// Default simulated work rate: 1% of a batch per 120 ms, so a batch
/// completes 12 seconds after its run call.
pub const DEFAULT_MS_PER_PERCENT: u64 = 120;

/// Default simulated duration of one pipeline stage.
pub const DEFAULT_STAGE_DURATION: Duration = Duration::from_secs(2);

/// Simulated timing knobs. Tests shrink these so full flows finish in
/// milliseconds; the defaults match the documented mock contract.
#[derive(Debug, Clone, Copy)]
pub struct MockTiming {
    /// Wall time representing 1% of batch progress.
    pub per_percent: Duration,
    /// Wall time each required pipeline stage takes.
    pub stage_duration: Duration,
}

impl Default for MockTiming {
    fn default() -> Self {
        Self {
            per_percent: Duration::from_millis(DEFAULT_MS_PER_PERCENT),
            stage_duration: DEFAULT_STAGE_DURATION,
        }
    }
}

/// Batch progress as a function of elapsed run time: saturating at 100,
/// never decreasing for a growing `elapsed`.
pub fn batch_progress(elapsed: Duration, per_percent: Duration) -> u8 {
    let pct = elapsed.as_millis() / per_percent.as_millis().max(1);
    pct.min(100) as u8
}

/// Number of required stages finished after `elapsed`, given each takes
/// `stage_duration`. Capped at `required_count`.
pub fn stages_completed(elapsed: Duration, stage_duration: Duration, required_count: usize) -> usize {
    let done = (elapsed.as_millis() / stage_duration.as_millis().max(1)) as usize;
    done.min(required_count)
}

/// Ordered fake frame paths for a preset:
/// `/workspace/sprites/<preset>/frame_0001.png` .. `frame_0008.png`.
pub fn frame_paths(preset: &str) -> Vec<String> {
    (1..=FRAMES_PER_BATCH)
        .map(|i| format!("/workspace/sprites/{preset}/frame_{i:04}.png"))
        .collect()
}

/// Fake sprite sheet path for a character.
pub fn sheet_path(character: &str) -> String {
    format!("/workspace/spritesheets/{character}_sheet.png")
}

/// Completed-batch payload. Called once per batch; the caller stores the
/// result so repeated status queries never regenerate paths.
pub fn batch_result(character: &str, preset: &str) -> BatchResult {
    BatchResult {
        sheet: sheet_path(character),
        frames: frame_paths(preset),
    }
}

/// Random batch id in the `batch_00000` style of the original mock.
pub fn make_batch_id() -> String {
    let n: u32 = rand::rng().random_range(0..100_000);
    format!("batch_{n:05}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PER_PERCENT: Duration = Duration::from_millis(120);

    #[test]
    fn progress_is_zero_at_start() {
        assert_eq!(batch_progress(Duration::ZERO, PER_PERCENT), 0);
    }

    #[test]
    fn progress_reaches_100_at_twelve_seconds() {
        assert_eq!(batch_progress(Duration::from_secs(12), PER_PERCENT), 100);
    }

    #[test]
    fn progress_saturates_past_completion() {
        assert_eq!(batch_progress(Duration::from_secs(60), PER_PERCENT), 100);
    }

    #[test]
    fn progress_is_monotone_in_elapsed_time() {
        let mut last = 0;
        for ms in (0..15_000).step_by(250) {
            let pct = batch_progress(Duration::from_millis(ms), PER_PERCENT);
            assert!(pct >= last, "progress went backwards at {ms}ms");
            last = pct;
        }
    }

    #[test]
    fn frame_paths_are_ordered_and_zero_padded() {
        let frames = frame_paths("goblin_sneak");
        assert_eq!(frames.len(), 8);
        assert_eq!(frames[0], "/workspace/sprites/goblin_sneak/frame_0001.png");
        assert_eq!(frames[7], "/workspace/sprites/goblin_sneak/frame_0008.png");
    }

    #[test]
    fn batch_result_is_deterministic() {
        assert_eq!(
            batch_result("goblin", "goblin_sneak"),
            batch_result("goblin", "goblin_sneak"),
        );
    }

    #[test]
    fn batch_ids_have_fixed_width_suffix() {
        for _ in 0..20 {
            let id = make_batch_id();
            let suffix = id.strip_prefix("batch_").expect("bad prefix");
            assert_eq!(suffix.len(), 5);
            assert!(suffix.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn stage_completion_advances_one_stage_per_duration() {
        let d = Duration::from_secs(2);
        assert_eq!(stages_completed(Duration::from_secs(1), d, 5), 0);
        assert_eq!(stages_completed(Duration::from_secs(2), d, 5), 1);
        assert_eq!(stages_completed(Duration::from_secs(7), d, 5), 3);
        assert_eq!(stages_completed(Duration::from_secs(60), d, 5), 5);
    }
}
