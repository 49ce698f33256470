use frame_tunnel_core::prelude::InsufficientSamplesError;
use frame_tunnel_summary_model::FrameStats;

/// Reduce the frame samples of one observation window into a [FrameStats] summary.
///
/// `samples` are frame durations in milliseconds and `total_elapsed_ms` is the wall time of the
/// observation window. The average frame time and FPS are derived from the wall time, the
/// minimum, maximum and percentiles from the samples.
///
/// Percentiles use the nearest-rank rule rounded down: `sorted[floor(count * p)]`, clamped to the
/// last sample. No interpolation is done between neighbouring samples, so the result is always one
/// of the recorded samples. This matches the estimator used by earlier reports so that results
/// remain comparable.
///
/// When `total_elapsed_ms` is zero the frame rate is undefined and reported as `0`.
pub fn reduce(samples: &[f64], total_elapsed_ms: f64) -> Result<FrameStats, InsufficientSamplesError> {
    if samples.is_empty() {
        return Err(InsufficientSamplesError::default());
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let total_frames = sorted.len();
    let total_elapsed_ms = total_elapsed_ms.max(0.0);
    let avg_fps = if total_elapsed_ms > 0.0 {
        total_frames as f64 / total_elapsed_ms * 1000.0
    } else {
        0.0
    };

    Ok(FrameStats {
        total_frames,
        total_elapsed_ms,
        avg_fps,
        avg_frame_time_ms: total_elapsed_ms / total_frames as f64,
        min_frame_time_ms: sorted[0],
        max_frame_time_ms: sorted[total_frames - 1],
        p95_frame_time_ms: nearest_rank(&sorted, 0.95),
        p99_frame_time_ms: nearest_rank(&sorted, 0.99),
    })
}

fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    let idx = ((sorted.len() as f64 * p).floor() as usize).min(sorted.len() - 1);
    sorted[idx]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_samples_are_rejected() {
        assert!(reduce(&[], 5000.0).is_err());
    }

    #[test]
    fn single_sample() {
        let stats = reduce(&[42.0], 42.0).unwrap();

        assert_eq!(1, stats.total_frames);
        assert_eq!(42.0, stats.min_frame_time_ms);
        assert_eq!(42.0, stats.max_frame_time_ms);
        assert_eq!(42.0, stats.avg_frame_time_ms);
        assert_eq!(42.0, stats.p95_frame_time_ms);
        assert_eq!(42.0, stats.p99_frame_time_ms);
    }

    #[test]
    fn ten_samples_clamp_both_percentiles_to_the_last() {
        let samples = [100.0, 30.0, 10.0, 90.0, 20.0, 60.0, 50.0, 40.0, 80.0, 70.0];

        let stats = reduce(&samples, 550.0).unwrap();

        assert_eq!(10.0, stats.min_frame_time_ms);
        assert_eq!(100.0, stats.max_frame_time_ms);
        assert_eq!(100.0, stats.p95_frame_time_ms);
        assert_eq!(100.0, stats.p99_frame_time_ms);
        assert_eq!(55.0, stats.avg_frame_time_ms);
    }

    #[test]
    fn percentiles_round_down() {
        // 1..=100, floor(100 * 0.95) = 95 and floor(100 * 0.99) = 99
        let samples = (1..=100).map(f64::from).collect::<Vec<_>>();

        let stats = reduce(&samples, 5000.0).unwrap();

        assert_eq!(96.0, stats.p95_frame_time_ms);
        assert_eq!(100.0, stats.p99_frame_time_ms);
        assert_eq!(20.0, stats.avg_fps);
        assert_eq!(50.0, stats.avg_frame_time_ms);
    }

    #[test]
    fn input_order_is_not_modified() {
        let samples = vec![3.0, 1.0, 2.0];

        reduce(&samples, 10.0).unwrap();

        assert_eq!(vec![3.0, 1.0, 2.0], samples);
    }

    #[test]
    fn zero_elapsed_has_no_frame_rate() {
        let stats = reduce(&[0.0, 0.0], 0.0).unwrap();

        assert_eq!(0.0, stats.avg_fps);
        assert_eq!(0.0, stats.avg_frame_time_ms);
    }

    proptest! {
        #[test]
        fn prop_percentiles_are_ordered(
            samples in prop::collection::vec(0.0f64..1000.0, 1..512),
            elapsed in 0.0f64..100_000.0,
        ) {
            let stats = reduce(&samples, elapsed).unwrap();

            prop_assert!(stats.min_frame_time_ms <= stats.p95_frame_time_ms);
            prop_assert!(stats.p95_frame_time_ms <= stats.p99_frame_time_ms);
            prop_assert!(stats.p99_frame_time_ms <= stats.max_frame_time_ms);
            prop_assert_eq!(samples.len(), stats.total_frames);
        }

        #[test]
        fn prop_reduce_is_deterministic(
            samples in prop::collection::vec(0.0f64..1000.0, 1..256),
            elapsed in 0.0f64..100_000.0,
        ) {
            let first = reduce(&samples, elapsed).unwrap();
            let second = reduce(&samples, elapsed).unwrap();

            prop_assert_eq!(first.avg_fps.to_bits(), second.avg_fps.to_bits());
            prop_assert_eq!(first.avg_frame_time_ms.to_bits(), second.avg_frame_time_ms.to_bits());
            prop_assert_eq!(first.p95_frame_time_ms.to_bits(), second.p95_frame_time_ms.to_bits());
            prop_assert_eq!(first.p99_frame_time_ms.to_bits(), second.p99_frame_time_ms.to_bits());
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_average_times_count_is_elapsed(
            samples in prop::collection::vec(0.0f64..1000.0, 1..256),
            elapsed in 0.0f64..100_000.0,
        ) {
            let stats = reduce(&samples, elapsed).unwrap();

            let total = stats.avg_frame_time_ms * stats.total_frames as f64;
            prop_assert!((total - elapsed).abs() <= 1e-9 * elapsed.max(1.0));
        }

        #[test]
        fn prop_percentiles_are_recorded_samples(
            samples in prop::collection::vec(0.0f64..1000.0, 1..256),
        ) {
            let stats = reduce(&samples, 1000.0).unwrap();

            prop_assert!(samples.contains(&stats.p95_frame_time_ms));
            prop_assert!(samples.contains(&stats.p99_frame_time_ms));
        }
    }
}
