//! Catalog browsing commands.

use std::path::PathBuf;
use tokio::runtime::Runtime;

use super::{AppContext, format_duration};
use crate::catalog::{
    CatalogApi, SearchItem, SearchKind, SearchQuery, TimeRange, TopItem, TopItemKind,
    clean_track_id,
};

/// Search the catalog and print one line per hit
pub fn cmd_search(
    rt: &Runtime,
    config_file: Option<&PathBuf>,
    token: Option<&str>,
    query: &str,
    kind: SearchKind,
    limit: usize,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let ctx = AppContext::open(config_file).await?;
        let token = ctx.token(token).await?;

        let query = SearchQuery::tracks(query, limit.clamp(1, 50)).of_kind(kind);
        let items = ctx.catalog.search(&token, &query).await?;
        if items.is_empty() {
            println!("No results for \"{}\"", query.text);
            return Ok(());
        }

        for item in &items {
            match item {
                SearchItem::Track(t) => println!(
                    "{}  {} - {} [{}]",
                    t.id,
                    t.primary_artist_name,
                    t.name,
                    format_duration(t.duration_ms)
                ),
                SearchItem::Album(a) => println!(
                    "{}  {} - {} ({} tracks)",
                    a.id, a.artist_name, a.name, a.total_tracks
                ),
                SearchItem::Artist(a) => {
                    println!("{}  {}  {}", a.id, a.name, a.genres.join(", "))
                }
                SearchItem::Playlist(p) => println!(
                    "{}  {} by {} ({} tracks)",
                    p.id,
                    p.name,
                    p.owner_name.as_deref().unwrap_or("unknown"),
                    p.track_count
                ),
            }
        }
        anyhow::Ok(())
    })
}

/// Show the token user's top tracks or artists
pub fn cmd_top(
    rt: &Runtime,
    config_file: Option<&PathBuf>,
    token: Option<&str>,
    artists: bool,
    range: TimeRange,
    limit: usize,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let ctx = AppContext::open(config_file).await?;
        let token = ctx.token(token).await?;
        let kind = if artists {
            TopItemKind::Artists
        } else {
            TopItemKind::Tracks
        };

        let items = ctx
            .catalog
            .get_top_items(&token, kind, range, limit.clamp(1, 50))
            .await?;

        println!("Top {} ({})", kind.as_path(), range.as_param());
        for (i, item) in items.iter().enumerate() {
            match item {
                TopItem::Track(t) => {
                    println!("{:>3}. {} - {}  {}", i + 1, t.primary_artist_name, t.name, t.id)
                }
                TopItem::Artist(a) => println!("{:>3}. {}  {}", i + 1, a.name, a.id),
            }
        }
        anyhow::Ok(())
    })
}

/// Print the audio features of one track
pub fn cmd_features(
    rt: &Runtime,
    config_file: Option<&PathBuf>,
    token: Option<&str>,
    id: &str,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let ctx = AppContext::open(config_file).await?;
        let token = ctx.token(token).await?;
        let id = clean_track_id(id);

        let features = ctx.catalog.get_audio_features(&token, &id).await?;
        println!("Audio features for {id}");
        println!("  energy:           {:.2}", features.energy);
        println!("  valence:          {:.2}", features.valence);
        println!("  danceability:     {:.2}", features.danceability);
        println!("  acousticness:     {:.2}", features.acousticness);
        println!("  instrumentalness: {:.2}", features.instrumentalness);
        println!("  liveness:         {:.2}", features.liveness);
        println!("  speechiness:      {:.2}", features.speechiness);
        match features.tempo {
            Some(tempo) => println!("  tempo:            {tempo:.0} BPM"),
            None => println!("  tempo:            unknown"),
        }
        anyhow::Ok(())
    })
}
