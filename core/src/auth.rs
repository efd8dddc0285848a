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

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use log::warn;
use rspotify::{prelude::*, scopes, AuthCodeSpotify, Config, Credentials, OAuth};
use thiserror::Error;

use crate::snapshot::create_private_dir;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to create token directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Spotify authentication failed for '{username}': {source}")]
    Spotify {
        username: String,
        source: rspotify::ClientError,
    },
}

/// How an account takes part in a sync run. The role decides which OAuth
/// scopes are requested, so a source account never holds write permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Source,
    Destination,
}

impl Role {
    pub fn scopes(&self) -> HashSet<String> {
        match self {
            Role::Source => scopes!(
                "playlist-read-private",
                "user-library-read",
                "user-follow-read"
            ),
            Role::Destination => scopes!(
                "playlist-read-private",
                "user-library-read",
                "user-follow-read",
                "playlist-modify-private",
                "playlist-modify-public",
                "user-library-modify",
                "user-follow-modify"
            ),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Source => write!(f, "source"),
            Role::Destination => write!(f, "destination"),
        }
    }
}

/// Builds authenticated Spotify clients, one per account, each with its own
/// token cache file under the data directory.
pub struct SessionManager {
    creds: Credentials,
    redirect_uri: String,
    data_dir: PathBuf,
}

impl SessionManager {
    pub fn new(
        creds: Credentials,
        redirect_uri: impl Into<String>,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            creds,
            redirect_uri: redirect_uri.into(),
            data_dir: data_dir.into(),
        }
    }

    /// Token cache location for one account: `<data_dir>/<username>/.cache-<username>`.
    pub fn cache_path(&self, username: &str) -> PathBuf {
        self.data_dir
            .join(username)
            .join(format!(".cache-{username}"))
    }

    /// Authenticates one account via the Authorization Code Flow.
    ///
    /// 1. Ensures the per-account token directory exists (mode 0700).
    /// 2. Reuses and refreshes a cached token when one is present.
    /// 3. Otherwise prints the login notice and walks the user through the
    ///    browser authorization, caching the resulting token.
    pub async fn authorize(&self, username: &str, role: Role) -> Result<AuthCodeSpotify, AuthError> {
        let cache_path = self.cache_path(username);
        if let Some(dir) = cache_path.parent() {
            create_private_dir(dir).map_err(|source| AuthError::CacheDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let oauth = OAuth {
            redirect_uri: self.redirect_uri.clone(),
            scopes: role.scopes(),
            ..Default::default()
        };
        let config = Config {
            token_cached: true,
            token_refreshing: true,
            cache_path,
            ..Default::default()
        };
        let spotify = AuthCodeSpotify::with_config(self.creds.clone(), oauth, config);

        // Peek at the cache so the notice only appears when the user has to act.
        let cached = spotify.read_token_cache(true).await.ok().flatten();
        if cached.is_none() {
            print_login_notice(username, role);
        }

        let url = spotify
            .get_authorize_url(false)
            .map_err(|source| AuthError::Spotify {
                username: username.to_string(),
                source,
            })?;
        spotify
            .prompt_for_token(&url)
            .await
            .map_err(|source| AuthError::Spotify {
                username: username.to_string(),
                source,
            })?;

        Ok(spotify)
    }

    /// Warns when the account that actually logged in is not the configured
    /// one. Tokens are cached under the configured name, so a mix-up here
    /// silently poisons later runs.
    pub async fn verify_identity(
        &self,
        spotify: &AuthCodeSpotify,
        username: &str,
    ) -> Result<(), AuthError> {
        let me = spotify
            .current_user()
            .await
            .map_err(|source| AuthError::Spotify {
                username: username.to_string(),
                source,
            })?;
        if me.id.id() != username {
            warn!(
                "Logged in as '{}' but the config names this account '{}'; \
                 delete {} and authorize again if that is wrong",
                me.id.id(),
                username,
                self.cache_path(username).display()
            );
        }
        Ok(())
    }
}

fn print_login_notice(username: &str, role: Role) {
    let mut scopes: Vec<String> = role.scopes().into_iter().collect();
    scopes.sort();

    println!();
    println!("#####################################################");
    println!();
    println!(
        "Need to authenticate the Spotify user '{}' for login type {}.",
        username,
        role.to_string().to_uppercase()
    );
    println!();
    println!("SOURCE accounts are only ever read from. DESTINATION accounts");
    println!("receive everything collected from the sources (read/write).");
    println!();
    println!("The following permissions will be requested:");
    for scope in &scopes {
        println!("    {scope}");
    }
    println!();
    println!("Log in as '{username}' in the browser window that opens, authorize");
    println!("the application, then paste the URL you are redirected to back");
    println!("here, even if the page itself shows an error.");
    println!();
    println!("Use a private browser window so an already signed-in session");
    println!("cannot authorize the wrong account, and close it again before");
    println!("the next login.");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_scopes_include_source_scopes() {
        let source = Role::Source.scopes();
        let destination = Role::Destination.scopes();
        assert!(source.is_subset(&destination));
        assert!(destination.contains("user-library-modify"));
        assert!(!source.contains("user-library-modify"));
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Source.to_string(), "source");
        assert_eq!(Role::Destination.to_string(), "destination");
    }

    #[test]
    fn test_cache_path_layout() {
        let manager = SessionManager::new(
            Credentials::new("id", "secret"),
            "http://localhost/",
            "/tmp/ps-data",
        );
        assert_eq!(
            manager.cache_path("alice"),
            PathBuf::from("/tmp/ps-data/alice/.cache-alice")
        );
    }
}
