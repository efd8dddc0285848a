/*
    playlist-sync | Rust CLI tool to copy Spotify libraries and playlists between accounts.
    Copyright (C) 2026  The playlist-sync authors

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use rspotify::model::{AlbumId, ArtistId, PlaylistId, TrackId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A playlist as captured from a source account.
///
/// `tracks` is `Some` for playlists owned by one of the source accounts;
/// those are copied track by track into the destinations. `None` marks a
/// third-party playlist, which destinations merely follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSnapshot {
    pub id: PlaylistId<'static>,
    pub name: String,
    /// Bare Spotify user id of the playlist owner.
    pub owner: String,
    pub public: Option<bool>,
    pub tracks: Option<Vec<TrackId<'static>>>,
}

impl PlaylistSnapshot {
    pub fn is_copied(&self) -> bool {
        self.tracks.is_some()
    }
}

/// Everything read from the source accounts during a read pass.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    pub tracks: Vec<TrackId<'static>>,
    pub artists: Vec<ArtistId<'static>>,
    pub albums: Vec<AlbumId<'static>>,
    pub playlists: Vec<PlaylistSnapshot>,
}

impl LibrarySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
            && self.artists.is_empty()
            && self.albums.is_empty()
            && self.playlists.is_empty()
    }
}

impl fmt::Display for LibrarySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} saved tracks, {} followed artists, {} saved albums, {} playlists",
            self.tracks.len(),
            self.artists.len(),
            self.albums.len(),
            self.playlists.len()
        )
    }
}

/// What a write pass actually changed on one destination account.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ApplyReport {
    pub username: String,
    pub tracks_saved: usize,
    pub artists_followed: usize,
    pub albums_saved: usize,
    pub playlists_followed: usize,
    pub playlists_created: usize,
    pub playlist_tracks_added: usize,
}

impl ApplyReport {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }

    /// True when the destination already held everything in the snapshot.
    pub fn is_noop(&self) -> bool {
        self.tracks_saved == 0
            && self.artists_followed == 0
            && self.albums_saved == 0
            && self.playlists_followed == 0
            && self.playlists_created == 0
            && self.playlist_tracks_added == 0
    }
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_noop() {
            return write!(f, "'{}': already up to date", self.username);
        }
        write!(
            f,
            "'{}': +{} tracks, +{} artists, +{} albums, {} playlists followed, {} created, +{} playlist tracks",
            self.username,
            self.tracks_saved,
            self.artists_followed,
            self.albums_saved,
            self.playlists_followed,
            self.playlists_created,
            self.playlist_tracks_added
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> TrackId<'static> {
        TrackId::from_id(id.to_string()).unwrap()
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = LibrarySnapshot::new();
        assert!(snapshot.is_empty());
        assert_eq!(
            snapshot.to_string(),
            "0 saved tracks, 0 followed artists, 0 saved albums, 0 playlists"
        );
    }

    #[test]
    fn test_snapshot_display_counts() {
        let mut snapshot = LibrarySnapshot::new();
        snapshot.tracks.push(track("4iV5W9uYEdYUVa79Axb7Rh"));
        snapshot.tracks.push(track("1301WleyT98MSxVHPZCA6M"));
        assert!(!snapshot.is_empty());
        assert!(snapshot.to_string().starts_with("2 saved tracks"));
    }

    #[test]
    fn test_playlist_snapshot_roles() {
        let followed = PlaylistSnapshot {
            id: PlaylistId::from_id("37i9dQZF1DXcBWIGoYBM5M".to_string()).unwrap(),
            name: "Today's Top Hits".to_string(),
            owner: "spotify".to_string(),
            public: Some(true),
            tracks: None,
        };
        assert!(!followed.is_copied());

        let copied = PlaylistSnapshot {
            tracks: Some(vec![track("4iV5W9uYEdYUVa79Axb7Rh")]),
            ..followed
        };
        assert!(copied.is_copied());
    }

    #[test]
    fn test_report_display_noop() {
        let report = ApplyReport::new("bob");
        assert!(report.is_noop());
        assert_eq!(report.to_string(), "'bob': already up to date");
    }

    #[test]
    fn test_report_display_counts() {
        let mut report = ApplyReport::new("bob");
        report.tracks_saved = 5;
        report.playlists_created = 1;
        report.playlist_tracks_added = 40;
        assert!(!report.is_noop());
        let display = report.to_string();
        assert!(display.contains("+5 tracks"));
        assert!(display.contains("1 created"));
        assert!(display.contains("+40 playlist tracks"));
    }
}
