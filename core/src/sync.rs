use std::collections::{HashMap, HashSet};

use log::info;
use rspotify::model::{AlbumId, ArtistId, PlaylistId, TrackId};

use crate::library::{Library, LibraryError};
use crate::models::{ApplyReport, LibrarySnapshot};

/// Reads every source account and merges the results into one snapshot.
///
/// Items seen in several sources are kept once, in the order they were first
/// seen. Playlists owned by any of the source accounts have their tracks
/// captured so destinations can receive an independent copy; playlists owned
/// by third parties are recorded follow-only.
pub async fn collect_sources<L: Library>(sources: &[L]) -> Result<LibrarySnapshot, LibraryError> {
    let mut snapshot = LibrarySnapshot::new();
    let mut seen_tracks: HashSet<TrackId<'static>> = HashSet::new();
    let mut seen_artists: HashSet<ArtistId<'static>> = HashSet::new();
    let mut seen_albums: HashSet<AlbumId<'static>> = HashSet::new();
    let mut seen_playlists: HashSet<PlaylistId<'static>> = HashSet::new();

    let source_users: HashSet<&str> = sources.iter().map(|s| s.username()).collect();

    for source in sources {
        info!("Reading library of '{}'", source.username());

        for track in source.saved_tracks().await? {
            if seen_tracks.insert(track.clone()) {
                snapshot.tracks.push(track);
            }
        }
        for artist in source.followed_artists().await? {
            if seen_artists.insert(artist.clone()) {
                snapshot.artists.push(artist);
            }
        }
        for album in source.saved_albums().await? {
            if seen_albums.insert(album.clone()) {
                snapshot.albums.push(album);
            }
        }
        for mut playlist in source.playlists().await? {
            if !seen_playlists.insert(playlist.id.clone()) {
                continue;
            }
            if source_users.contains(playlist.owner.as_str()) {
                playlist.tracks = Some(source.playlist_tracks(&playlist.id).await?);
            }
            snapshot.playlists.push(playlist);
        }
    }

    Ok(snapshot)
}

/// Brings one destination account up to the snapshot. Purely additive: items
/// the destination already has are left alone, nothing is ever removed.
///
/// Follow-only playlists are followed once. Copied playlists are matched by
/// name against playlists the destination owns; a missing copy is created
/// first, then any tracks the copy lacks are appended in snapshot order.
pub async fn apply_to_destination<L: Library>(
    dest: &L,
    snapshot: &LibrarySnapshot,
) -> Result<ApplyReport, LibraryError> {
    let mut report = ApplyReport::new(dest.username());

    let have_tracks: HashSet<TrackId<'static>> =
        dest.saved_tracks().await?.into_iter().collect();
    let missing_tracks: Vec<TrackId<'static>> = snapshot
        .tracks
        .iter()
        .filter(|id| !have_tracks.contains(*id))
        .cloned()
        .collect();
    if !missing_tracks.is_empty() {
        dest.save_tracks(&missing_tracks).await?;
        report.tracks_saved = missing_tracks.len();
    }

    let have_artists: HashSet<ArtistId<'static>> =
        dest.followed_artists().await?.into_iter().collect();
    let missing_artists: Vec<ArtistId<'static>> = snapshot
        .artists
        .iter()
        .filter(|id| !have_artists.contains(*id))
        .cloned()
        .collect();
    if !missing_artists.is_empty() {
        dest.follow_artists(&missing_artists).await?;
        report.artists_followed = missing_artists.len();
    }

    let have_albums: HashSet<AlbumId<'static>> =
        dest.saved_albums().await?.into_iter().collect();
    let missing_albums: Vec<AlbumId<'static>> = snapshot
        .albums
        .iter()
        .filter(|id| !have_albums.contains(*id))
        .cloned()
        .collect();
    if !missing_albums.is_empty() {
        dest.save_albums(&missing_albums).await?;
        report.albums_saved = missing_albums.len();
    }

    // One listing answers both playlist questions: which ids are already
    // present (for follows) and which owned names exist (for copies).
    let existing = dest.playlists().await?;
    let existing_ids: HashSet<PlaylistId<'static>> =
        existing.iter().map(|pl| pl.id.clone()).collect();
    let mut own_by_name: HashMap<String, PlaylistId<'static>> = HashMap::new();
    for pl in &existing {
        if pl.owner == dest.username() {
            own_by_name
                .entry(pl.name.clone())
                .or_insert_with(|| pl.id.clone());
        }
    }

    for playlist in &snapshot.playlists {
        match &playlist.tracks {
            None => {
                if !existing_ids.contains(&playlist.id) {
                    info!(
                        "'{}': following playlist '{}'",
                        dest.username(),
                        playlist.name
                    );
                    dest.follow_playlist(&playlist.id).await?;
                    report.playlists_followed += 1;
                }
            }
            Some(tracks) => {
                let target = match own_by_name.get(&playlist.name) {
                    Some(id) => id.clone(),
                    None => {
                        info!(
                            "'{}': creating playlist '{}'",
                            dest.username(),
                            playlist.name
                        );
                        let public = playlist.public.unwrap_or(false);
                        let id = dest.create_playlist(&playlist.name, public).await?;
                        report.playlists_created += 1;
                        own_by_name.insert(playlist.name.clone(), id.clone());
                        id
                    }
                };
                let have: HashSet<TrackId<'static>> =
                    dest.playlist_tracks(&target).await?.into_iter().collect();
                let missing: Vec<TrackId<'static>> = tracks
                    .iter()
                    .filter(|id| !have.contains(*id))
                    .cloned()
                    .collect();
                if !missing.is_empty() {
                    info!(
                        "'{}': adding {} tracks to playlist '{}'",
                        dest.username(),
                        missing.len(),
                        playlist.name
                    );
                    dest.add_playlist_tracks(&target, &missing).await?;
                    report.playlist_tracks_added += missing.len();
                }
            }
        }
    }

    Ok(report)
}
