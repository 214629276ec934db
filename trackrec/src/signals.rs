//! Per-playlist diversity and age signals.
//!
//! [`aggregate`] derives a [`PlaylistSignals`] row for every playlist and
//! z-score normalizes the diversity and age columns across the corpus.
//! [`join`] attaches the normalized columns to each track instance.
//!
//! Z-scores use the sample standard deviation (n - 1 denominator). When the
//! deviation is zero or undefined (fewer than two playlists, or every playlist
//! equal) the normalized value is `0.0`; NaN is never produced.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{Catalog, TrackInstance};
use crate::error::{RecError, Result};

const SECONDS_PER_DAY: i64 = 86_400;

/// Derived statistics for one playlist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaylistSignals {
    pub playlist_id: u64,
    pub num_tracks: u32,
    /// Distinct normalized artist names.
    pub unique_artists: usize,
    /// Distinct raw album names.
    pub unique_albums: usize,
    /// `(unique_artists + unique_albums) / num_tracks`.
    pub diversity_score: f64,
    pub normalized_diversity_score: f64,
    /// Whole days between `modified_at` and the reference time, floored.
    pub age_days: i64,
    pub normalized_playlist_age: f64,
}

/// Lookup table of [`PlaylistSignals`] keyed by playlist id.
///
/// Rows keep the catalog's playlist order.
#[derive(Debug, Clone, Default)]
pub struct SignalTable {
    rows: Vec<PlaylistSignals>,
    by_id: HashMap<u64, usize>,
}

impl SignalTable {
    /// Signals for `playlist_id`, if that playlist was aggregated.
    pub fn get(&self, playlist_id: u64) -> Option<&PlaylistSignals> {
        self.by_id.get(&playlist_id).map(|&i| &self.rows[i])
    }

    /// All rows in playlist order.
    pub fn rows(&self) -> &[PlaylistSignals] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A track instance carrying its playlist's normalized signals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeaturedTrack {
    pub instance: TrackInstance,
    pub normalized_diversity_score: f64,
    pub normalized_playlist_age: f64,
}

#[derive(Default)]
struct PlaylistTally<'a> {
    artists: HashSet<&'a str>,
    albums: HashSet<&'a str>,
    occurrences: usize,
}

/// Compute a [`SignalTable`] for every playlist in `catalog`.
///
/// `instances` must be the normalized track instances of the same catalog;
/// artist uniqueness is counted on their normalized names, album uniqueness on
/// the raw album names they carry.
///
/// # Errors
///
/// - [`RecError::DivisionByZero`] if a playlist declares `num_tracks == 0`.
/// - [`RecError::MalformedInput`] on duplicate playlist ids, on a playlist
///   holding more track instances than `num_tracks`, or on a `modified_at`
///   that cannot be represented as a timestamp.
pub fn aggregate(
    catalog: &Catalog,
    instances: &[TrackInstance],
    reference_now: DateTime<Utc>,
) -> Result<SignalTable> {
    let mut tallies: HashMap<u64, PlaylistTally<'_>> = HashMap::new();
    for instance in instances {
        let tally = tallies.entry(instance.playlist_id).or_default();
        tally.artists.insert(instance.artist_name.as_str());
        tally.albums.insert(instance.album_name.as_str());
        tally.occurrences += 1;
    }

    let mut rows = Vec::with_capacity(catalog.playlists.len());
    let mut by_id = HashMap::with_capacity(catalog.playlists.len());

    for playlist in &catalog.playlists {
        let context = format!("playlist {}", playlist.pid);
        if by_id.insert(playlist.pid, rows.len()).is_some() {
            return Err(RecError::malformed(context, "duplicate playlist id"));
        }
        if playlist.num_tracks == 0 {
            return Err(RecError::DivisionByZero { playlist_id: playlist.pid });
        }

        let (unique_artists, unique_albums, occurrences) = tallies
            .get(&playlist.pid)
            .map(|t| (t.artists.len(), t.albums.len(), t.occurrences))
            .unwrap_or((0, 0, 0));
        if occurrences > playlist.num_tracks as usize {
            return Err(RecError::malformed(
                context,
                format!(
                    "holds {occurrences} track instances but declares num_tracks = {}",
                    playlist.num_tracks
                ),
            ));
        }

        let modified = DateTime::<Utc>::from_timestamp(playlist.modified_at, 0).ok_or_else(|| {
            RecError::malformed(
                format!("playlist {}", playlist.pid),
                format!("modified_at {} is not a valid timestamp", playlist.modified_at),
            )
        })?;
        let age_days = (reference_now - modified).num_seconds().div_euclid(SECONDS_PER_DAY);

        rows.push(PlaylistSignals {
            playlist_id: playlist.pid,
            num_tracks: playlist.num_tracks,
            unique_artists,
            unique_albums,
            diversity_score: (unique_artists + unique_albums) as f64
                / f64::from(playlist.num_tracks),
            normalized_diversity_score: 0.0,
            age_days,
            normalized_playlist_age: 0.0,
        });
    }

    let diversity: Vec<f64> = rows.iter().map(|r| r.diversity_score).collect();
    let ages: Vec<f64> = rows.iter().map(|r| r.age_days as f64).collect();
    for ((row, d), a) in rows.iter_mut().zip(z_scores(&diversity)).zip(z_scores(&ages)) {
        row.normalized_diversity_score = d;
        row.normalized_playlist_age = a;
    }

    let playlist_count = rows.len();
    info!(playlist_count, track_count = instances.len(), "aggregated playlist signals");

    Ok(SignalTable { rows, by_id })
}

/// Attach normalized playlist signals to each track instance.
///
/// Left join on `playlist_id`: the output has exactly one row per input
/// instance, in the same order.
///
/// # Errors
///
/// Returns [`RecError::MissingSignal`] for the first instance whose playlist
/// is absent from `table`.
pub fn join(instances: &[TrackInstance], table: &SignalTable) -> Result<Vec<FeaturedTrack>> {
    instances
        .iter()
        .map(|instance| {
            let signals = table
                .get(instance.playlist_id)
                .ok_or(RecError::MissingSignal { playlist_id: instance.playlist_id })?;
            Ok(FeaturedTrack {
                instance: instance.clone(),
                normalized_diversity_score: signals.normalized_diversity_score,
                normalized_playlist_age: signals.normalized_playlist_age,
            })
        })
        .collect()
}

/// Z-score `values` with the sample standard deviation.
///
/// Degenerate spreads map every value to `0.0`. The deviation counts as zero
/// when it is within floating rounding of the mean's magnitude, so a column
/// of identical values never yields spurious nonzero scores.
pub fn z_scores(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std_dev = variance.sqrt();
    let tolerance = f64::EPSILON * 16.0 * mean.abs().max(1.0);
    if !std_dev.is_finite() || std_dev <= tolerance {
        debug!(n, mean, std_dev, "degenerate spread, normalizing to zero");
        return vec![0.0; n];
    }
    values.iter().map(|v| (v - mean) / std_dev).collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::catalog::{Playlist, Track, normalize_tracks};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> i64 {
        now().timestamp() - days * SECONDS_PER_DAY
    }

    #[test]
    fn counts_normalized_artists_and_raw_albums() {
        let catalog = Catalog::new(vec![
            Playlist::new(1, "p", 3, days_ago(10))
                .with_track(Track::new("a", "Lil Tecca", "Album", 1))
                .with_track(Track::new("b", "lil tecca!", "album", 1))
                .with_track(Track::new("c", "LIL TECCA", "Album", 1)),
        ]);
        let instances = normalize_tracks(&catalog);
        let table = aggregate(&catalog, &instances, now()).unwrap();
        let row = table.get(1).unwrap();
        assert_eq!(row.unique_artists, 1);
        assert_eq!(row.unique_albums, 2);
        assert!((row.diversity_score - 1.0).abs() < 1e-12);
        assert_eq!(row.age_days, 10);
    }

    #[test]
    fn zero_num_tracks_is_division_by_zero() {
        let catalog = Catalog::new(vec![Playlist::new(42, "empty", 0, days_ago(1))]);
        let err = aggregate(&catalog, &[], now()).unwrap_err();
        assert!(matches!(err, RecError::DivisionByZero { playlist_id: 42 }));
    }

    #[test]
    fn more_instances_than_declared_is_malformed() {
        let catalog = Catalog::new(vec![
            Playlist::new(3, "p", 1, days_ago(1))
                .with_track(Track::new("a", "x", "y", 1))
                .with_track(Track::new("b", "x", "y", 1)),
        ]);
        let instances = normalize_tracks(&catalog);
        let err = aggregate(&catalog, &instances, now()).unwrap_err();
        assert!(matches!(err, RecError::MalformedInput { .. }));
    }

    #[test]
    fn duplicate_playlist_ids_are_malformed() {
        let catalog = Catalog::new(vec![
            Playlist::new(5, "a", 1, days_ago(1)),
            Playlist::new(5, "b", 1, days_ago(1)),
        ]);
        let err = aggregate(&catalog, &[], now()).unwrap_err();
        assert!(matches!(err, RecError::MalformedInput { .. }));
    }

    #[test]
    fn age_days_floors_partial_days() {
        let catalog = Catalog::new(vec![
            Playlist::new(1, "old", 1, now().timestamp() - SECONDS_PER_DAY - 3600),
            Playlist::new(2, "future", 1, now().timestamp() + 3600),
        ]);
        let table = aggregate(&catalog, &[], now()).unwrap();
        assert_eq!(table.get(1).unwrap().age_days, 1);
        assert_eq!(table.get(2).unwrap().age_days, -1);
    }

    #[test]
    fn single_playlist_normalizes_to_zero() {
        let catalog = Catalog::new(vec![
            Playlist::new(1, "solo", 1, days_ago(100)).with_track(Track::new("a", "b", "c", 1)),
        ]);
        let instances = normalize_tracks(&catalog);
        let table = aggregate(&catalog, &instances, now()).unwrap();
        let row = table.get(1).unwrap();
        assert_eq!(row.normalized_diversity_score, 0.0);
        assert_eq!(row.normalized_playlist_age, 0.0);
    }

    #[test]
    fn z_scores_use_sample_deviation() {
        let z = z_scores(&[1.0, 2.0, 3.0]);
        assert!((z[0] + 1.0).abs() < 1e-12);
        assert!(z[1].abs() < 1e-12);
        assert!((z[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn z_scores_of_identical_values_are_zero() {
        assert_eq!(z_scores(&[0.1, 0.1, 0.1]), vec![0.0, 0.0, 0.0]);
        assert_eq!(z_scores(&[7.0]), vec![0.0]);
        assert!(z_scores(&[]).is_empty());
    }

    #[test]
    fn join_attaches_signals_in_order() {
        let catalog = Catalog::new(vec![
            Playlist::new(1, "a", 1, days_ago(10)).with_track(Track::new("x", "a", "b", 1)),
            Playlist::new(2, "b", 1, days_ago(20)).with_track(Track::new("y", "a", "b", 1)),
        ]);
        let instances = normalize_tracks(&catalog);
        let table = aggregate(&catalog, &instances, now()).unwrap();
        let featured = join(&instances, &table).unwrap();
        assert_eq!(featured.len(), 2);
        assert_eq!(featured[0].instance.track_name, "x");
        assert!(featured[0].normalized_playlist_age < featured[1].normalized_playlist_age);
    }

    #[test]
    fn join_rejects_unknown_playlist() {
        let orphan = TrackInstance::from_track(99, &Track::new("x", "y", "z", 1));
        let err = join(&[orphan], &SignalTable::default()).unwrap_err();
        assert!(matches!(err, RecError::MissingSignal { playlist_id: 99 }));
    }
}
