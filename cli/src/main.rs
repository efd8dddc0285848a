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

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use log::warn;

use playlist_sync_core::config::Account;
use playlist_sync_core::{
    apply_to_destination, collect_sources, ApplyReport, Library, Role, SessionManager,
    SnapshotStore, SpotifyLibrary, SyncConfig,
};

#[derive(Parser)]
#[command(name = "playlist-sync")]
#[command(
    about = "Copies saved tracks, artists, albums and playlists from source Spotify accounts to destination accounts",
    long_about = None
)]
struct Cli {
    /// Path to the config file (default: ~/.playlist_sync.yaml, then
    /// playlist_sync.yaml next to the executable, then /etc/playlist_sync.yaml)
    #[arg(short, long, value_name = "/path/to/configfile")]
    config: Option<PathBuf>,

    /// Only read the source accounts and store the snapshot
    #[arg(short, long, conflicts_with = "write_only")]
    read_only: bool,

    /// Only write a previously stored snapshot to the destination accounts
    #[arg(short, long)]
    write_only: bool,

    /// Write the per-destination reports to a JSON file (e.g., --json=report.json)
    #[arg(long)]
    json: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if dotenv().is_err() {
        // Silently ignore
    }

    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        eprintln!();
        eprintln!("[ERROR] {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let mut config =
        SyncConfig::load(cli.config.as_deref()).context("Could not load the configuration")?;
    config.retain_roles(cli.read_only, cli.write_only);

    let creds = config.credentials()?;
    let data_dir = config.data_dir();
    let store = SnapshotStore::open(&data_dir)?;
    let sessions = SessionManager::new(creds, config.redirect_url.clone(), &data_dir);

    // Authorize everything up front so all login prompts happen before the
    // first long fetch starts.
    let sources = authorize_all(&sessions, &config.sources, Role::Source).await?;
    let destinations = authorize_all(&sessions, &config.destinations, Role::Destination).await?;

    if !cli.write_only {
        run_read_phase(&sources, &store).await?;
    }

    if !cli.read_only {
        run_write_phase(&destinations, &store, cli.json.as_deref()).await?;
    } else {
        if cli.json.is_some() {
            warn!("--json only applies to the write phase; ignoring it in a read-only run");
        }
        println!();
        println!("Tip: Run 'playlist-sync --write-only' later to apply this snapshot.");
    }

    Ok(())
}

async fn authorize_all(
    sessions: &SessionManager,
    accounts: &BTreeMap<String, Account>,
    role: Role,
) -> Result<Vec<SpotifyLibrary>> {
    let mut libraries = Vec::new();
    for (alias, account) in accounts {
        let spotify = sessions
            .authorize(&account.username, role)
            .await
            .with_context(|| format!("Could not authorize {role} account '{alias}'"))?;
        sessions
            .verify_identity(&spotify, &account.username)
            .await
            .with_context(|| format!("Could not verify the identity of '{}'", account.username))?;
        libraries.push(SpotifyLibrary::new(&account.username, spotify));
    }
    Ok(libraries)
}

async fn run_read_phase(sources: &[SpotifyLibrary], store: &SnapshotStore) -> Result<()> {
    if sources.is_empty() {
        warn!("No source accounts configured; the snapshot will be empty");
    }

    println!("Reading {} source account(s)...", sources.len());
    let snapshot = collect_sources(sources)
        .await
        .context("Reading the source accounts failed")?;

    println!();
    println!("---------------------------------------------------");
    println!("COLLECTED FROM SOURCES");
    println!("---------------------------------------------------");
    println!("Saved tracks:     {}", snapshot.tracks.len());
    println!("Followed artists: {}", snapshot.artists.len());
    println!("Saved albums:     {}", snapshot.albums.len());
    println!("Playlists:        {}", snapshot.playlists.len());
    println!("---------------------------------------------------");

    store
        .save(&snapshot)
        .context("Could not store the library snapshot")?;
    println!("Snapshot stored in {}", store.dir().display());

    Ok(())
}

async fn run_write_phase(
    destinations: &[SpotifyLibrary],
    store: &SnapshotStore,
    json_path: Option<&Path>,
) -> Result<()> {
    if destinations.is_empty() {
        warn!("No destination accounts configured; nothing to write");
        return Ok(());
    }

    let snapshot = store.load()?;
    println!();
    println!(
        "Writing to {} destination account(s): {}",
        destinations.len(),
        snapshot
    );

    let mut reports = Vec::new();
    for dest in destinations {
        let report = apply_to_destination(dest, &snapshot)
            .await
            .with_context(|| format!("Updating account '{}' failed", dest.username()))?;
        reports.push(report);
    }

    println!();
    println!("---------------------------------------------------");
    println!("SYNC COMPLETE");
    println!("---------------------------------------------------");
    for report in &reports {
        println!("{report}");
    }
    println!("---------------------------------------------------");

    if let Some(path) = json_path {
        write_json_report(path, &reports);
    }

    Ok(())
}

fn write_json_report(path: &Path, reports: &[ApplyReport]) {
    match File::create(path) {
        Ok(mut file) => {
            let json_content = serde_json::to_string_pretty(reports).unwrap_or_default();
            if let Err(e) = file.write_all(json_content.as_bytes()) {
                eprintln!();
                eprintln!("[ERROR] Failed to write report to file: {}", e);
            } else {
                println!();
                println!("[SAVED] Report saved to: {}", path.display());
            }
        }
        Err(e) => eprintln!("[ERROR] Failed to create file '{}': {}", path.display(), e),
    }
}
