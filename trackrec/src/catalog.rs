//! Record types for playlists, tracks and normalized track instances.
//!
//! [`Playlist`] and [`Track`] mirror the Million Playlist Dataset slice
//! format and deserialize directly from it; fields the recommender does not
//! use are ignored. [`TrackInstance`] is the output of the normalization
//! stage: one row per playlist-track occurrence, in ingestion order.

use serde::{Deserialize, Serialize};

use crate::normalize::normalize;

/// A raw track record as it appears inside a playlist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    /// Track title as published.
    pub track_name: String,
    /// Performing artist as published.
    pub artist_name: String,
    /// Album title as published.
    pub album_name: String,
    /// Track length in milliseconds.
    pub duration_ms: u64,
    /// Position of the track inside its playlist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<u32>,
    /// Spotify URI of the track, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_uri: Option<String>,
    /// Spotify URI of the artist, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_uri: Option<String>,
    /// Spotify URI of the album, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_uri: Option<String>,
}

impl Track {
    /// Create a track with only the fields the recommender needs.
    pub fn new(
        track_name: impl Into<String>,
        artist_name: impl Into<String>,
        album_name: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            track_name: track_name.into(),
            artist_name: artist_name.into(),
            album_name: album_name.into(),
            duration_ms,
            pos: None,
            track_uri: None,
            artist_uri: None,
            album_uri: None,
        }
    }

    /// Attach a Spotify track URI.
    pub fn with_track_uri(mut self, uri: impl Into<String>) -> Self {
        self.track_uri = Some(uri.into());
        self
    }
}

/// A playlist with its ordered tracks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Playlist {
    /// Unique, stable playlist id.
    pub pid: u64,
    /// Playlist title.
    pub name: String,
    /// Declared number of tracks.
    pub num_tracks: u32,
    /// Last modification time, unix seconds.
    pub modified_at: i64,
    /// Tracks in playlist order.
    pub tracks: Vec<Track>,
}

impl Playlist {
    /// Create an empty playlist; add tracks with [`Playlist::with_track`].
    pub fn new(pid: u64, name: impl Into<String>, num_tracks: u32, modified_at: i64) -> Self {
        Self { pid, name: name.into(), num_tracks, modified_at, tracks: Vec::new() }
    }

    /// Append a track.
    pub fn with_track(mut self, track: Track) -> Self {
        self.tracks.push(track);
        self
    }
}

/// The full ordered set of playlists fed to the recommender.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Catalog {
    /// Playlists in ingestion order.
    pub playlists: Vec<Playlist>,
}

impl Catalog {
    /// Wrap an ordered list of playlists.
    pub fn new(playlists: Vec<Playlist>) -> Self {
        Self { playlists }
    }

    /// Number of playlists.
    pub fn playlist_count(&self) -> usize {
        self.playlists.len()
    }

    /// Number of track instances across all playlists.
    pub fn track_count(&self) -> usize {
        self.playlists.iter().map(|p| p.tracks.len()).sum()
    }
}

/// One normalized playlist-track occurrence.
///
/// `track_name` and `artist_name` hold [`normalize`]d text; `album_name` is
/// the raw album title, left untouched on purpose.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackInstance {
    pub playlist_id: u64,
    pub track_name: String,
    pub artist_name: String,
    pub album_name: String,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_uri: Option<String>,
}

impl TrackInstance {
    /// Normalize a raw track belonging to playlist `playlist_id`.
    pub fn from_track(playlist_id: u64, track: &Track) -> Self {
        Self {
            playlist_id,
            track_name: normalize(&track.track_name),
            artist_name: normalize(&track.artist_name),
            album_name: track.album_name.clone(),
            duration_ms: track.duration_ms,
            track_uri: track.track_uri.clone(),
        }
    }
}

/// Flatten a catalog into normalized track instances, preserving order.
pub fn normalize_tracks(catalog: &Catalog) -> Vec<TrackInstance> {
    catalog
        .playlists
        .iter()
        .flat_map(|p| p.tracks.iter().map(move |t| TrackInstance::from_track(p.pid, t)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_mpd_playlist() {
        let json = r#"{
            "name": "Throwbacks",
            "collaborative": "false",
            "pid": 0,
            "modified_at": 1493424000,
            "num_tracks": 1,
            "num_albums": 1,
            "num_followers": 1,
            "tracks": [{
                "pos": 0,
                "artist_name": "Missy Elliott",
                "track_uri": "spotify:track:0UaMYEvWZi0ZqiDOoHU3YI",
                "artist_uri": "spotify:artist:2wIVse2owClT7go1WT98tk",
                "track_name": "Lose Control (feat. Ciara & Fat Man Scoop)",
                "album_uri": "spotify:album:6vV5UrXcfyQD1wu4Qo2I9K",
                "duration_ms": 226863,
                "album_name": "The Cookbook"
            }],
            "num_edits": 6,
            "duration_ms": 11532414,
            "num_artists": 37
        }"#;
        let playlist: Playlist = serde_json::from_str(json).unwrap();
        assert_eq!(playlist.pid, 0);
        assert_eq!(playlist.tracks.len(), 1);
        assert_eq!(playlist.tracks[0].pos, Some(0));
        assert_eq!(playlist.tracks[0].album_name, "The Cookbook");
    }

    #[test]
    fn normalizes_names_but_not_albums() {
        let catalog = Catalog::new(vec![
            Playlist::new(7, "mix", 1, 0)
                .with_track(Track::new("Ran$om!", "Lil Tecca", "We Love You Tecca!", 131240)),
        ]);
        let instances = normalize_tracks(&catalog);
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].playlist_id, 7);
        assert_eq!(instances[0].track_name, "ranom");
        assert_eq!(instances[0].artist_name, "lil tecca");
        assert_eq!(instances[0].album_name, "We Love You Tecca!");
    }

    #[test]
    fn flattening_preserves_ingestion_order() {
        let catalog = Catalog::new(vec![
            Playlist::new(1, "a", 2, 0)
                .with_track(Track::new("One", "x", "x", 1))
                .with_track(Track::new("Two", "x", "x", 1)),
            Playlist::new(2, "b", 1, 0).with_track(Track::new("Three", "y", "y", 1)),
        ]);
        let names: Vec<_> =
            normalize_tracks(&catalog).into_iter().map(|t| t.track_name).collect();
        assert_eq!(names, vec!["one", "two", "three"]);
        assert_eq!(catalog.track_count(), 3);
    }
}
