use crate::pipeline::geo;
use crate::types::activity::TrackSample;
use crate::types::quality::{QualityReport, QualityThresholds};

/// Stop segmentation state. The accumulator lives inside `Stopped` so it only exists while a
/// candidate stop is open.
#[derive(Debug, Clone, Copy, PartialEq)]
enum StopState {
    Moving,
    Stopped { accumulated_s: i64 },
}

#[derive(Debug)]
struct StopDetector {
    state: StopState,
    speed_threshold_mps: f64,
    min_duration_s: i64,
    stopped_time_s: i64,
    segments: u32,
}

impl StopDetector {
    fn new(thresholds: &QualityThresholds) -> Self {
        Self {
            state: StopState::Moving,
            speed_threshold_mps: thresholds.stop_speed_threshold_mps,
            min_duration_s: thresholds.stop_min_duration_s,
            stopped_time_s: 0,
            segments: 0,
        }
    }

    fn observe(&mut self, speed_mps: f64, dt: i64) {
        if speed_mps <= self.speed_threshold_mps {
            let accumulated_s = match self.state {
                StopState::Moving => 0,
                StopState::Stopped { accumulated_s } => accumulated_s,
            };
            self.state = StopState::Stopped {
                accumulated_s: accumulated_s.saturating_add(dt),
            };
        } else {
            self.close();
        }
    }

    /// Commits an open stop if it lasted long enough, then returns to `Moving`.
    fn close(&mut self) {
        if let StopState::Stopped { accumulated_s } = self.state {
            if accumulated_s >= self.min_duration_s {
                self.stopped_time_s = self.stopped_time_s.saturating_add(accumulated_s);
                self.segments += 1;
            }
        }
        self.state = StopState::Moving;
    }

    fn finish(mut self) -> (i64, u32) {
        self.close();
        (self.stopped_time_s, self.segments)
    }
}

/// Computes the quality report for an ordered track. Total: any input yields a report.
///
/// Pairs with a non-positive (or unrepresentable) time step are skipped: they add no distance,
/// no speed sample and no stop-state transition. `duration_s` and `point_count` still cover
/// every point; time sums saturate at `i64::MAX`.
pub fn analyze(samples: &[TrackSample], thresholds: &QualityThresholds) -> QualityReport {
    if samples.len() < 2 {
        return QualityReport::empty(samples.len());
    }

    let mut distance_m = 0.0;
    let mut max_speed_mps = 0.0_f64;
    let mut spike_count = 0u32;
    let mut speeds = Vec::with_capacity(samples.len() - 1);
    let mut stops = StopDetector::new(thresholds);

    for pair in samples.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        let dt = match curr.elapsed_seconds.checked_sub(prev.elapsed_seconds) {
            Some(dt) if dt > 0 => dt,
            _ => continue,
        };

        let d = geo::distance_m(prev.lat, prev.lon, curr.lat, curr.lon);
        let v = d / dt as f64;

        distance_m += d;
        max_speed_mps = max_speed_mps.max(v);
        speeds.push(v);

        if v >= thresholds.spike_speed_threshold_mps {
            spike_count += 1;
        }
        stops.observe(v, dt);
    }

    let (stopped_time_s, stop_segments) = stops.finish();

    let (min_t, max_t) = samples
        .iter()
        .fold((i64::MAX, i64::MIN), |(lo, hi), s| {
            (lo.min(s.elapsed_seconds), hi.max(s.elapsed_seconds))
        });

    QualityReport {
        point_count: samples.len(),
        duration_s: max_t.saturating_sub(min_t),
        distance_m,
        max_speed_mps,
        spike_count,
        stopped_time_s,
        stop_segments,
        jitter_score: jitter_score(&speeds),
    }
}

/// Mean absolute change between consecutive speed samples.
fn jitter_score(speeds: &[f64]) -> f64 {
    if speeds.len() < 2 {
        return 0.0;
    }
    let total: f64 = speeds.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    total / (speeds.len() - 1) as f64
}
