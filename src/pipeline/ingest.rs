use crate::error::{IngestError, QualityError};
use crate::pipeline::quality;
use crate::store::locks::WriteGates;
use crate::store::{FeatureSnapshotStore, PointStore, QualitySnapshotStore};
use crate::types::activity::{ActivityId, RawTelemetryPoint, StreamPayload, TrackSample};
use crate::types::quality::{QualityMetricSnapshot, QualityThresholds};

#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub point_count: usize,
    pub quality: QualityMetricSnapshot,
}

/// Turns raw stream arrays into sequenced points. Fails before anything is stored when
/// either required array is absent or empty.
pub fn build_points(payload: &StreamPayload) -> Result<Vec<RawTelemetryPoint>, IngestError> {
    let latlng = payload
        .latlng
        .as_deref()
        .filter(|series| !series.is_empty())
        .ok_or(IngestError::MissingStreamData("latlng"))?;
    let times = payload
        .time
        .as_deref()
        .filter(|series| !series.is_empty())
        .ok_or(IngestError::MissingStreamData("time"))?;

    if latlng.len() != times.len() {
        tracing::warn!(
            "Stream length mismatch (latlng={}, time={}); keeping {} points",
            latlng.len(),
            times.len(),
            latlng.len().min(times.len())
        );
    }

    let altitude = payload.altitude.as_deref();
    let points = latlng
        .iter()
        .zip(times)
        .enumerate()
        .map(|(idx, (&[lat, lon], &elapsed_seconds))| RawTelemetryPoint {
            sequence: idx as u32,
            elapsed_seconds,
            latitude: lat,
            longitude: lon,
            elevation_m: altitude
                .and_then(|series| series.get(idx))
                .copied()
                .flatten()
                .map(|meters| meters.round() as i32),
        })
        .collect();

    Ok(points)
}

/// Replaces the activity's whole point set and its quality snapshot as one unit, and drops
/// feature snapshots derived from the previous points.
///
/// Re-running with the same payload yields the same stored points; running with new data
/// leaves no stale points behind. Fails with `ActivityRemoved` once the activity is deleted.
pub fn ingest<S: PointStore, F: FeatureSnapshotStore>(
    tracks: &S,
    features: &F,
    gates: &WriteGates,
    activity_id: ActivityId,
    payload: &StreamPayload,
    thresholds: &QualityThresholds,
) -> Result<IngestOutcome, IngestError> {
    let points = build_points(payload)?;
    let samples: Vec<TrackSample> = points.iter().map(TrackSample::from).collect();
    let report = quality::analyze(&samples, thresholds);
    let point_count = points.len();

    let snapshot = gates
        .with_gate(activity_id, || {
            let snapshot = QualityMetricSnapshot::new(activity_id, report, *thresholds);
            tracks.replace_track(activity_id, points, snapshot.clone());
            features.clear_features(activity_id);
            snapshot
        })
        .ok_or(IngestError::ActivityRemoved(activity_id))?;

    tracing::info!(
        "Ingested {} points for activity {} ({:.1} m, {} spikes, {} stops)",
        point_count,
        activity_id,
        snapshot.report.distance_m,
        snapshot.report.spike_count,
        snapshot.report.stop_segments
    );

    Ok(IngestOutcome {
        point_count,
        quality: snapshot,
    })
}

/// Recomputes the quality snapshot from stored points, replacing any persisted one. Feature
/// snapshots derived from the replaced snapshot are dropped.
pub fn recompute_from_points<S: PointStore + QualitySnapshotStore, F: FeatureSnapshotStore>(
    tracks: &S,
    features: &F,
    gates: &WriteGates,
    activity_id: ActivityId,
    thresholds: &QualityThresholds,
) -> Result<QualityMetricSnapshot, QualityError> {
    gates
        .with_gate(activity_id, || {
            let snapshot = recompute_locked(tracks, activity_id, thresholds)?;
            features.clear_features(activity_id);
            Ok::<_, QualityError>(snapshot)
        })
        .unwrap_or(Err(QualityError::ActivityRemoved(activity_id)))
}

/// Returns the persisted snapshot, computing and storing one from points when none exists.
pub fn get_or_compute_quality<S: PointStore + QualitySnapshotStore>(
    store: &S,
    gates: &WriteGates,
    activity_id: ActivityId,
    thresholds: &QualityThresholds,
) -> Result<QualityMetricSnapshot, QualityError> {
    if let Some(snapshot) = store.get_quality(activity_id) {
        return Ok(snapshot);
    }
    gates
        .with_gate(activity_id, || quality_locked(store, activity_id, thresholds))
        .unwrap_or(Err(QualityError::ActivityRemoved(activity_id)))
}

/// Get-or-compute for callers already holding the activity's gate.
pub(crate) fn quality_locked<S: PointStore + QualitySnapshotStore>(
    store: &S,
    activity_id: ActivityId,
    thresholds: &QualityThresholds,
) -> Result<QualityMetricSnapshot, QualityError> {
    match store.get_quality(activity_id) {
        Some(snapshot) => Ok(snapshot),
        None => recompute_locked(store, activity_id, thresholds),
    }
}

fn recompute_locked<S: PointStore + QualitySnapshotStore>(
    store: &S,
    activity_id: ActivityId,
    thresholds: &QualityThresholds,
) -> Result<QualityMetricSnapshot, QualityError> {
    let points = store.points(activity_id);
    if points.len() < 2 {
        return Err(QualityError::InsufficientPoints(points.len()));
    }

    let samples: Vec<TrackSample> = points.iter().map(TrackSample::from).collect();
    let report = quality::analyze(&samples, thresholds);
    let snapshot = store.upsert_quality(activity_id, report, *thresholds);

    tracing::info!(
        "Recomputed quality for activity {} from {} stored points",
        activity_id,
        points.len()
    );
    Ok(snapshot)
}
