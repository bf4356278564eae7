//! Stored playlist commands.

use std::path::PathBuf;
use tokio::runtime::Runtime;

use super::{AppContext, format_duration};
use crate::catalog::CatalogError;
use crate::playlist::{GenerateRequest, Playlist, PlaylistError};

/// Generate a playlist and print it
pub fn cmd_generate(
    rt: &Runtime,
    config_file: Option<&PathBuf>,
    token: Option<&str>,
    request: &GenerateRequest,
    json: bool,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let ctx = AppContext::open(config_file).await?;
        let token = ctx.token(token).await?;

        if !json {
            println!("Generating from {} seed track(s)...", request.seed_ids.len());
        }
        let playlist = match ctx.service.generate(&token, ctx.owner_id(), request).await {
            Ok(playlist) => playlist,
            Err(PlaylistError::EmptyRecommendations) => {
                eprintln!("✗ No recommendations found for these seeds");
                eprintln!("  Try different seed tracks or remove the energy/valence targets.");
                return Err(PlaylistError::EmptyRecommendations.into());
            }
            Err(e) => return Err(e.into()),
        };

        if json {
            println!("{}", serde_json::to_string_pretty(&playlist)?);
        } else {
            println!("✓ Saved playlist #{}", playlist.id);
            print_playlist(&playlist);
        }
        anyhow::Ok(())
    })
}

/// List the owner's stored playlists
pub fn cmd_list(rt: &Runtime, config_file: Option<&PathBuf>) -> anyhow::Result<()> {
    rt.block_on(async {
        let ctx = AppContext::open(config_file).await?;
        let playlists = ctx.service.list(ctx.owner_id()).await?;

        if playlists.is_empty() {
            println!("No playlists yet. Create one with `seedmix generate <track-id>`.");
            return Ok(());
        }

        for playlist in &playlists {
            let exported = if playlist.remote_playlist_id.is_some() {
                " [exported]"
            } else {
                ""
            };
            println!(
                "{:>5}  {}  ({} tracks, {}){}",
                playlist.id,
                playlist.name,
                playlist.tracks.len(),
                format_duration(playlist.total_duration),
                exported
            );
        }
        println!("\n{} playlist(s)", playlists.len());
        anyhow::Ok(())
    })
}

/// Show a stored playlist
pub fn cmd_show(
    rt: &Runtime,
    config_file: Option<&PathBuf>,
    id: i64,
    json: bool,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let ctx = AppContext::open(config_file).await?;
        let playlist = ctx.service.get(id, ctx.owner_id()).await?;

        if json {
            println!("{}", serde_json::to_string_pretty(&playlist)?);
        } else {
            print_playlist(&playlist);
        }
        anyhow::Ok(())
    })
}

/// Delete a stored playlist
pub fn cmd_delete(rt: &Runtime, config_file: Option<&PathBuf>, id: i64) -> anyhow::Result<()> {
    rt.block_on(async {
        let ctx = AppContext::open(config_file).await?;
        ctx.service.delete(id, ctx.owner_id()).await?;
        println!("✓ Deleted playlist #{id}");
        anyhow::Ok(())
    })
}

/// Create a stored playlist in the token user's account
pub fn cmd_export(
    rt: &Runtime,
    config_file: Option<&PathBuf>,
    token: Option<&str>,
    id: i64,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let ctx = AppContext::open(config_file).await?;
        let token = ctx.token(token).await?;

        match ctx.service.export(&token, id, ctx.owner_id()).await {
            Ok(playlist) => {
                println!(
                    "✓ Exported \"{}\" as {}",
                    playlist.name,
                    playlist.remote_playlist_id.as_deref().unwrap_or_default()
                );
                anyhow::Ok(())
            }
            Err(PlaylistError::Catalog(CatalogError::Unauthorized | CatalogError::Forbidden(_))) => {
                eprintln!("✗ Export needs a user access token with playlist-modify scope.");
                eprintln!("  Pass one with --token or SPOTIFY_ACCESS_TOKEN.");
                anyhow::bail!("export of playlist #{id} was not authorized")
            }
            Err(e) => Err(e.into()),
        }
    })
}

fn print_playlist(playlist: &Playlist) {
    println!("\n{}", playlist.name);
    if !playlist.description.is_empty() {
        println!("{}", playlist.description);
    }
    println!(
        "{} tracks, {} - created {}",
        playlist.tracks.len(),
        format_duration(playlist.total_duration),
        playlist.created_at
    );
    if let Some(genres) = &playlist.generation_params.genres {
        println!("Genres: {}", genres.join(", "));
    }
    if let Some(remote) = &playlist.remote_playlist_id {
        println!("Exported: spotify:playlist:{remote}");
    }
    println!();

    for (i, track) in playlist.tracks.iter().enumerate() {
        println!(
            "{:>3}. {} - {} [{}]",
            i + 1,
            track.artist,
            track.name,
            format_duration(track.duration)
        );
    }
}
