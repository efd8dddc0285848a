use async_trait::async_trait;
use futures::stream::TryStreamExt;
use log::debug;
use rspotify::{
    model::{AlbumId, ArtistId, Cursor, PlayableId, PlayableItem, PlaylistId, TrackId, UserId},
    prelude::*,
    AuthCodeSpotify,
};
use thiserror::Error;

use crate::models::PlaylistSnapshot;

// Spotify caps library write endpoints at 50 ids per call and playlist item
// adds at 100.
const LIBRARY_BATCH: usize = 50;
const PLAYLIST_BATCH: usize = 100;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Spotify API error: {0}")]
    Spotify(#[from] rspotify::ClientError),
    #[error("Invalid Spotify ID: {0}")]
    InvalidId(String),
}

/// One account's library, read and written through the same seam so the sync
/// logic can be exercised without the network.
#[async_trait]
pub trait Library {
    fn username(&self) -> &str;

    async fn saved_tracks(&self) -> Result<Vec<TrackId<'static>>, LibraryError>;
    async fn followed_artists(&self) -> Result<Vec<ArtistId<'static>>, LibraryError>;
    async fn saved_albums(&self) -> Result<Vec<AlbumId<'static>>, LibraryError>;
    async fn playlists(&self) -> Result<Vec<PlaylistSnapshot>, LibraryError>;
    async fn playlist_tracks(
        &self,
        playlist: &PlaylistId<'static>,
    ) -> Result<Vec<TrackId<'static>>, LibraryError>;

    async fn save_tracks(&self, tracks: &[TrackId<'static>]) -> Result<(), LibraryError>;
    async fn follow_artists(&self, artists: &[ArtistId<'static>]) -> Result<(), LibraryError>;
    async fn save_albums(&self, albums: &[AlbumId<'static>]) -> Result<(), LibraryError>;
    async fn follow_playlist(&self, playlist: &PlaylistId<'static>) -> Result<(), LibraryError>;
    async fn create_playlist(
        &self,
        name: &str,
        public: bool,
    ) -> Result<PlaylistId<'static>, LibraryError>;
    async fn add_playlist_tracks(
        &self,
        playlist: &PlaylistId<'static>,
        tracks: &[TrackId<'static>],
    ) -> Result<(), LibraryError>;
}

/// The real thing, backed by an authenticated Web API client.
pub struct SpotifyLibrary {
    username: String,
    spotify: AuthCodeSpotify,
}

impl SpotifyLibrary {
    pub fn new(username: impl Into<String>, spotify: AuthCodeSpotify) -> Self {
        Self {
            username: username.into(),
            spotify,
        }
    }
}

#[async_trait]
impl Library for SpotifyLibrary {
    fn username(&self) -> &str {
        &self.username
    }

    async fn saved_tracks(&self) -> Result<Vec<TrackId<'static>>, LibraryError> {
        let mut tracks = Vec::new();
        let mut stream = self.spotify.current_user_saved_tracks(None);

        while let Some(item) = stream.try_next().await? {
            // Local files carry no id and cannot be saved elsewhere.
            if let Some(id) = item.track.id {
                tracks.push(id);
            }
        }

        debug!("'{}': {} saved tracks", self.username, tracks.len());
        Ok(tracks)
    }

    async fn followed_artists(&self) -> Result<Vec<ArtistId<'static>>, LibraryError> {
        let mut artists = Vec::new();
        let mut after: Option<String> = None;

        // Followed artists are cursor paged rather than offset paged.
        loop {
            let page = self
                .spotify
                .current_user_followed_artists(after.as_deref(), Some(50))
                .await?;
            artists.extend(page.items.into_iter().map(|artist| artist.id));
            after = next_cursor(page.cursors);
            if after.is_none() {
                break;
            }
        }

        debug!("'{}': {} followed artists", self.username, artists.len());
        Ok(artists)
    }

    async fn saved_albums(&self) -> Result<Vec<AlbumId<'static>>, LibraryError> {
        let mut albums = Vec::new();
        let mut stream = self.spotify.current_user_saved_albums(None);

        while let Some(item) = stream.try_next().await? {
            albums.push(item.album.id);
        }

        debug!("'{}': {} saved albums", self.username, albums.len());
        Ok(albums)
    }

    async fn playlists(&self) -> Result<Vec<PlaylistSnapshot>, LibraryError> {
        let mut playlists = Vec::new();
        let mut stream = self.spotify.current_user_playlists();

        while let Some(pl) = stream.try_next().await? {
            playlists.push(PlaylistSnapshot {
                id: pl.id,
                name: pl.name,
                owner: pl.owner.id.id().to_string(),
                public: pl.public,
                tracks: None,
            });
        }

        debug!("'{}': {} playlists", self.username, playlists.len());
        Ok(playlists)
    }

    async fn playlist_tracks(
        &self,
        playlist: &PlaylistId<'static>,
    ) -> Result<Vec<TrackId<'static>>, LibraryError> {
        let mut tracks = Vec::new();
        let mut stream = self.spotify.playlist_items(playlist.clone(), None, None);

        while let Some(item) = stream.try_next().await? {
            // Episodes and local files are skipped; only real tracks copy over.
            if let Some(PlayableItem::Track(track)) = item.track {
                if let Some(id) = track.id {
                    tracks.push(id);
                }
            }
        }

        Ok(tracks)
    }

    async fn save_tracks(&self, tracks: &[TrackId<'static>]) -> Result<(), LibraryError> {
        for chunk in tracks.chunks(LIBRARY_BATCH) {
            debug!("'{}': saving {} tracks", self.username, chunk.len());
            self.spotify
                .current_user_saved_tracks_add(chunk.iter().cloned())
                .await?;
        }
        Ok(())
    }

    async fn follow_artists(&self, artists: &[ArtistId<'static>]) -> Result<(), LibraryError> {
        for chunk in artists.chunks(LIBRARY_BATCH) {
            debug!("'{}': following {} artists", self.username, chunk.len());
            self.spotify.user_follow_artists(chunk.iter().cloned()).await?;
        }
        Ok(())
    }

    async fn save_albums(&self, albums: &[AlbumId<'static>]) -> Result<(), LibraryError> {
        for chunk in albums.chunks(LIBRARY_BATCH) {
            debug!("'{}': saving {} albums", self.username, chunk.len());
            self.spotify
                .current_user_saved_albums_add(chunk.iter().cloned())
                .await?;
        }
        Ok(())
    }

    async fn follow_playlist(&self, playlist: &PlaylistId<'static>) -> Result<(), LibraryError> {
        self.spotify.playlist_follow(playlist.clone(), None).await?;
        Ok(())
    }

    async fn create_playlist(
        &self,
        name: &str,
        public: bool,
    ) -> Result<PlaylistId<'static>, LibraryError> {
        let user_id = UserId::from_id(self.username.clone())
            .map_err(|_| LibraryError::InvalidId(self.username.clone()))?;
        let playlist = self
            .spotify
            .user_playlist_create(user_id, name, Some(public), None, None)
            .await?;
        Ok(playlist.id)
    }

    async fn add_playlist_tracks(
        &self,
        playlist: &PlaylistId<'static>,
        tracks: &[TrackId<'static>],
    ) -> Result<(), LibraryError> {
        for chunk in tracks.chunks(PLAYLIST_BATCH) {
            debug!(
                "'{}': adding {} tracks to playlist {}",
                self.username,
                chunk.len(),
                playlist.id()
            );
            let items = chunk.iter().map(|id| PlayableId::Track(id.clone()));
            self.spotify
                .playlist_add_items(playlist.clone(), items, None)
                .await?;
        }
        Ok(())
    }
}

// The final page of a cursor-paged listing carries no cursors.
fn next_cursor(cursors: Option<Cursor>) -> Option<String> {
    cursors.and_then(|cursor| cursor.after)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_followed_artist_paging_ends_without_cursor() {
        assert_eq!(next_cursor(None), None);
        assert_eq!(next_cursor(Some(Cursor::default())), None);

        let page_cursor = Some(Cursor {
            after: Some("0aV6DOiouImYTqrR5YlIqx".to_string()),
        });
        assert_eq!(
            next_cursor(page_cursor),
            Some("0aV6DOiouImYTqrR5YlIqx".to_string())
        );
    }
}
