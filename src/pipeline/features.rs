use rayon::prelude::*;

use crate::error::QualityError;
use crate::pipeline::ingest;
use crate::state::AppState;
use crate::store::FeatureSnapshotStore;
use crate::types::activity::{Activity, ActivityId};
use crate::types::features::{
    DerivedFeatures, FeatureDocument, FeatureMetadata, FeaturePayload, FeatureVersion,
};
use crate::types::quality::QualityReport;

/// Derives normalized features from a quality report. Pure and total: each ratio is `None`
/// when its denominator is missing or not positive, never NaN.
pub fn derive(report: &QualityReport, activity: &Activity) -> FeaturePayload {
    let distance_m = report.distance_m;
    let duration_s = report.duration_s as f64;
    let point_count = report.point_count as f64;
    let distance_km = distance_m / 1000.0;

    let features = DerivedFeatures {
        point_count: report.point_count,
        duration_s: report.duration_s,
        distance_m_gps: distance_m,
        distance_ratio_gps_vs_official: ratio(distance_m, activity.distance_m),
        avg_speed_mps_gps: ratio(distance_m, Some(duration_s)),
        max_speed_mps: report.max_speed_mps,
        max_speed_kmh: report.max_speed_mps * 3.6,
        spike_count: report.spike_count,
        spikes_per_km: ratio(f64::from(report.spike_count), Some(distance_km)),
        stopped_time_s: report.stopped_time_s,
        stopped_fraction: ratio(report.stopped_time_s as f64, Some(duration_s)),
        stop_segments: report.stop_segments,
        jitter_score: report.jitter_score,
        points_per_km: ratio(point_count, Some(distance_km)),
        points_per_min: ratio(point_count, Some(duration_s / 60.0)),
        stop_segments_per_hour: ratio(f64::from(report.stop_segments), Some(duration_s / 3600.0)),
        spike_fraction: ratio(f64::from(report.spike_count), Some(point_count)),
    };

    FeaturePayload {
        metadata: FeatureMetadata {
            name: activity.name.clone(),
            sport_type: activity.sport_type.clone(),
            start_date: activity.start_date,
            moving_time_s: activity.moving_time_s,
            distance_m_official: activity.distance_m,
            elevation_gain_m: activity.elevation_gain_m,
        },
        features,
    }
}

fn ratio(numerator: f64, denominator: Option<f64>) -> Option<f64> {
    match denominator {
        Some(d) if d > 0.0 => Some(numerator / d),
        _ => None,
    }
}

/// Builds the feature document for one activity from its (persisted or freshly computed)
/// quality snapshot, optionally upserting it under `(activity, feature_version)`.
///
/// Persisting reads the snapshot and writes the features under the activity's gate, so the
/// stored features always match the quality snapshot they were derived from.
pub fn build_activity_features(
    state: &AppState,
    activity: &Activity,
    feature_version: FeatureVersion,
    persist: bool,
) -> Result<FeatureDocument, QualityError> {
    let thresholds = &state.config().thresholds;

    let (payload, computed_at) = if persist {
        state
            .gates
            .with_gate(activity.id, || {
                let quality = ingest::quality_locked(&state.tracks, activity.id, thresholds)?;
                let snapshot = state.features.upsert_features(
                    activity.id,
                    feature_version,
                    derive(&quality.report, activity),
                );
                Ok::<_, QualityError>((snapshot.payload, snapshot.computed_at))
            })
            .unwrap_or(Err(QualityError::ActivityRemoved(activity.id)))?
    } else {
        let quality =
            ingest::get_or_compute_quality(&state.tracks, &state.gates, activity.id, thresholds)?;
        (derive(&quality.report, activity), quality.computed_at)
    };

    Ok(FeatureDocument {
        activity_id: activity.id,
        strava_activity_id: activity.strava_activity_id,
        feature_version,
        computed_at,
        metadata: payload.metadata,
        features: payload.features,
    })
}

#[derive(Debug, Clone, Default)]
pub struct RebuildSummary {
    pub rebuilt: usize,
    pub skipped_activity_ids: Vec<ActivityId>,
}

/// Rebuilds and persists features for each id in parallel. Activities without enough data
/// (or deleted meanwhile) are reported as skipped.
pub fn rebuild_features(
    state: &AppState,
    activity_ids: &[ActivityId],
    feature_version: FeatureVersion,
) -> RebuildSummary {
    let outcomes: Vec<(ActivityId, bool)> = activity_ids
        .par_iter()
        .map(|&activity_id| {
            let built = state.activities.get(activity_id).map(|activity| {
                build_activity_features(state, &activity, feature_version, true)
            });
            match built {
                Some(Ok(_)) => (activity_id, true),
                Some(Err(err)) => {
                    tracing::warn!("Skipping features for activity {}: {}", activity_id, err);
                    (activity_id, false)
                }
                None => (activity_id, false),
            }
        })
        .collect();

    let mut summary = RebuildSummary::default();
    for (activity_id, rebuilt) in outcomes {
        if rebuilt {
            summary.rebuilt += 1;
        } else {
            summary.skipped_activity_ids.push(activity_id);
        }
    }

    tracing::info!(
        "Rebuilt feature version {} for {} activities ({} skipped)",
        feature_version,
        summary.rebuilt,
        summary.skipped_activity_ids.len()
    );
    summary
}
