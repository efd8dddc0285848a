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

pub mod auth;
pub mod config;
pub mod library;
pub mod models;
pub mod snapshot;
pub mod sync;

// Re-export key items for convenience
pub use auth::{Role, SessionManager};
pub use config::SyncConfig;
pub use library::{Library, SpotifyLibrary};
pub use models::{ApplyReport, LibrarySnapshot, PlaylistSnapshot};
pub use snapshot::SnapshotStore;
pub use sync::{apply_to_destination, collect_sources};
