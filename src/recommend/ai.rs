//! Prompt construction and response parsing for the AI-assisted tier.

use serde::Deserialize;

use crate::catalog::{CandidateTrack, TargetProfile};

/// One song suggested by the text generator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SongSuggestion {
    pub title: String,
    pub artist: String,
}

impl SongSuggestion {
    /// Catalog query resolving this suggestion to a track.
    pub fn search_query(&self) -> String {
        format!("track:{} artist:{}", self.title.trim(), self.artist.trim())
    }
}

pub fn energy_descriptor(energy: Option<f32>) -> &'static str {
    match energy {
        None => "varied energy",
        Some(e) if e > 0.7 => "high-energy, upbeat",
        Some(e) if e < 0.3 => "calm, relaxing",
        Some(_) => "moderate energy",
    }
}

pub fn mood_descriptor(valence: Option<f32>) -> &'static str {
    match valence {
        None => "varied mood",
        Some(v) if v > 0.7 => "happy, positive",
        Some(v) if v < 0.3 => "melancholic, introspective",
        Some(_) => "balanced",
    }
}

pub fn build_prompt(seed: &CandidateTrack, limit: usize, target: TargetProfile) -> String {
    format!(
        "You are a music curator. Suggest exactly {limit} songs similar to \"{title}\" by {artist}. \
         The songs should have {energy} and a {mood} mood. \
         Do not include \"{title}\" itself. \
         Respond with ONLY a JSON array of objects with \"title\" and \"artist\" fields, \
         for example: [{{\"title\": \"Song Name\", \"artist\": \"Artist Name\"}}]",
        title = seed.name,
        artist = seed.primary_artist_name,
        energy = energy_descriptor(target.energy),
        mood = mood_descriptor(target.valence),
    )
}

/// Parse the generator's reply into suggestions.
///
/// Accepts a bare JSON array, optionally wrapped in a markdown code fence or
/// surrounded by prose; anything else is an error.
pub fn parse_suggestions(raw: &str) -> Result<Vec<SongSuggestion>, serde_json::Error> {
    let json = match (raw.find('['), raw.rfind(']')) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => raw,
    };
    let suggestions: Vec<SongSuggestion> = serde_json::from_str(json)?;
    Ok(suggestions
        .into_iter()
        .filter(|s| !s.title.trim().is_empty() && !s.artist.trim().is_empty())
        .collect())
}
