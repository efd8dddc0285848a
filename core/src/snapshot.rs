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

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::models::LibrarySnapshot;

const TRACKS_FILE: &str = "tracks.json";
const ARTISTS_FILE: &str = "artists.json";
const ALBUMS_FILE: &str = "albums.json";
const PLAYLISTS_FILE: &str = "playlists.json";

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("No library snapshot at {path}; run a read pass (without --write-only) first")]
    Missing { path: PathBuf },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid snapshot JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Creates a directory owned by and readable only to the current user.
/// Token caches live under the data directory too, so the whole tree stays
/// owner-only.
pub(crate) fn create_private_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
    }
    Ok(())
}

/// Persists the merged library between the read and the write pass, one JSON
/// document per collection, so either pass can run on its own.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, SnapshotError> {
        let dir = dir.into();
        create_private_dir(&dir).map_err(|source| SnapshotError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, snapshot: &LibrarySnapshot) -> Result<(), SnapshotError> {
        self.write_json(TRACKS_FILE, &snapshot.tracks)?;
        self.write_json(ARTISTS_FILE, &snapshot.artists)?;
        self.write_json(ALBUMS_FILE, &snapshot.albums)?;
        self.write_json(PLAYLISTS_FILE, &snapshot.playlists)?;
        Ok(())
    }

    pub fn load(&self) -> Result<LibrarySnapshot, SnapshotError> {
        Ok(LibrarySnapshot {
            tracks: self.read_json(TRACKS_FILE)?,
            artists: self.read_json(ARTISTS_FILE)?,
            albums: self.read_json(ALBUMS_FILE)?,
            playlists: self.read_json(PLAYLISTS_FILE)?,
        })
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<(), SnapshotError> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value).map_err(|source| SnapshotError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| SnapshotError::Write { path, source })
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T, SnapshotError> {
        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(SnapshotError::Missing { path });
        }
        let contents = fs::read_to_string(&path).map_err(|source| SnapshotError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| SnapshotError::Json { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlaylistSnapshot;
    use rspotify::model::{ArtistId, PlaylistId, TrackId};

    fn sample_snapshot() -> LibrarySnapshot {
        let mut snapshot = LibrarySnapshot::new();
        snapshot
            .tracks
            .push(TrackId::from_id("4iV5W9uYEdYUVa79Axb7Rh".to_string()).unwrap());
        snapshot
            .artists
            .push(ArtistId::from_id("0OdUWJ0sBjDrqHygGUXeCF".to_string()).unwrap());
        snapshot.playlists.push(PlaylistSnapshot {
            id: PlaylistId::from_id("37i9dQZF1DXcBWIGoYBM5M".to_string()).unwrap(),
            name: "Mix".to_string(),
            owner: "alice".to_string(),
            public: Some(false),
            tracks: Some(vec![
                TrackId::from_id("1301WleyT98MSxVHPZCA6M".to_string()).unwrap()
            ]),
        });
        snapshot
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path().join("data")).unwrap();
        let snapshot = sample_snapshot();
        store.save(&snapshot).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_load_without_read_pass_names_remedy() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path().join("data")).unwrap();
        let err = store.load().unwrap_err();
        assert!(matches!(err, SnapshotError::Missing { .. }));
        let message = err.to_string();
        assert!(message.contains("tracks.json"));
        assert!(message.contains("--write-only"));
    }

    #[cfg(unix)]
    #[test]
    fn test_data_dir_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path().join("data")).unwrap();
        let mode = fs::metadata(store.dir()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
