//! Playlist title and description generation.
//!
//! Two paths:
//! - **AI** ([`generate_with_ai`]) asks the text generator for a JSON
//!   `{"name", "description"}` object
//! - **Templates** ([`TitleGenerator`]) pick one of a fixed set of templates
//!   filled with time-of-day, season and mood labels
//!
//! The template path is the fallback whenever the AI path is unavailable or
//! returns something unusable. Template choice is random; the RNG is injected
//! so tests can pin it.

use chrono::{Datelike, NaiveDateTime, Timelike};
use rand::Rng;
use serde::Deserialize;

use crate::catalog::{CandidateTrack, TargetProfile};
use crate::textgen::{TextGenError, TextGenerator};

/// Longest name accepted from the AI path.
pub const MAX_NAME_CHARS: usize = 100;

pub const TITLE_TEMPLATE_COUNT: usize = 6;
pub const DESCRIPTION_TEMPLATE_COUNT: usize = 5;

/// Why the AI path produced nothing usable.
#[derive(Debug, thiserror::Error)]
pub enum NamingError {
    #[error(transparent)]
    TextGen(#[from] TextGenError),

    #[error("Unparsable naming response: {0}")]
    Parse(String),

    #[error("Rejected playlist name: {0:?}")]
    InvalidName(String),
}

/// A generated name and description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaylistName {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Labels interpolated into the templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Labels {
    pub time_of_day: &'static str,
    pub season: &'static str,
    pub mood: &'static str,
    pub energy: &'static str,
}

impl Labels {
    pub fn new(target: TargetProfile, now: NaiveDateTime) -> Self {
        let (mood, energy) = mood_energy(target);
        Self {
            time_of_day: time_of_day(now.hour()),
            season: season(now.month()),
            mood,
            energy,
        }
    }
}

/// 5-11 Morning, 12-16 Afternoon, 17-20 Evening, otherwise Late Night.
pub fn time_of_day(hour: u32) -> &'static str {
    match hour {
        5..=11 => "Morning",
        12..=16 => "Afternoon",
        17..=20 => "Evening",
        _ => "Late Night",
    }
}

/// Season for a 1-based month (northern hemisphere).
pub fn season(month: u32) -> &'static str {
    match month {
        3..=5 => "Spring",
        6..=8 => "Summer",
        9..=11 => "Fall",
        _ => "Winter",
    }
}

/// Mood and energy words for the target, with absent values read as neutral.
pub fn mood_energy(target: TargetProfile) -> (&'static str, &'static str) {
    let valence = target.valence_or_neutral();
    let energy = target.energy_or_neutral();

    let mood = if valence >= 0.7 {
        Some("Happy")
    } else if valence < 0.3 {
        Some("Melancholic")
    } else {
        None
    };
    let level = if energy >= 0.7 {
        Some("Energetic")
    } else if energy < 0.3 {
        Some("Chill")
    } else {
        None
    };

    match (mood, level) {
        (Some(m), Some(e)) => (m, e),
        (Some(m), None) => (m, "Dynamic"),
        (None, Some(e)) => ("Balanced", e),
        (None, None) => ("Balanced", "Chill"),
    }
}

pub fn render_title(index: usize, seed: &CandidateTrack, labels: &Labels) -> String {
    let artist = &seed.primary_artist_name;
    let track = &seed.name;
    match index % TITLE_TEMPLATE_COUNT {
        0 => format!("{} {} Mix", labels.time_of_day, labels.mood),
        1 => format!("{} {} Vibes", labels.season, labels.energy),
        2 => format!("{} & Friends: {} Edition", artist, labels.energy),
        3 => format!("{} {} Sessions", labels.mood, labels.time_of_day),
        4 => format!("If You Like {}", track),
        _ => format!("{} {} Radio", labels.season, artist),
    }
}

pub fn render_description(
    index: usize,
    seed: &CandidateTrack,
    track_count: usize,
    labels: &Labels,
) -> String {
    let artist = &seed.primary_artist_name;
    let mood = labels.mood.to_lowercase();
    let energy = labels.energy.to_lowercase();
    match index % DESCRIPTION_TEMPLATE_COUNT {
        0 => format!("{track_count} tracks inspired by {artist}"),
        1 => format!("A {mood} mix of {track_count} songs for fans of {artist}"),
        2 => format!("{track_count} {energy} picks, starting from {artist}"),
        3 => format!("Discover {track_count} tracks in the spirit of {artist}"),
        _ => format!("{artist} and {track_count} songs that keep the {energy} mood going"),
    }
}

/// Template-based names with an injectable random source.
pub struct TitleGenerator<R> {
    rng: R,
}

impl<R: Rng> TitleGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn title(&mut self, seed: &CandidateTrack, target: TargetProfile, now: NaiveDateTime) -> String {
        let index = self.rng.random_range(0..TITLE_TEMPLATE_COUNT);
        render_title(index, seed, &Labels::new(target, now))
    }

    pub fn description(
        &mut self,
        seed: &CandidateTrack,
        track_count: usize,
        target: TargetProfile,
        now: NaiveDateTime,
    ) -> String {
        let index = self.rng.random_range(0..DESCRIPTION_TEMPLATE_COUNT);
        render_description(index, seed, track_count, &Labels::new(target, now))
    }

    /// Title and description together.
    pub fn name(
        &mut self,
        seed: &CandidateTrack,
        track_count: usize,
        target: TargetProfile,
        now: NaiveDateTime,
    ) -> PlaylistName {
        PlaylistName {
            name: self.title(seed, target, now),
            description: self.description(seed, track_count, target, now),
        }
    }
}

fn naming_prompt(seed: &CandidateTrack, track_count: usize, labels: &Labels) -> String {
    format!(
        "Create a creative playlist name and a one-sentence description for a playlist of \
         {track_count} songs inspired by \"{title}\" by {artist}. \
         The mood is {mood} and the energy is {energy}; it is {time} in {season}. \
         The name must be at most {MAX_NAME_CHARS} characters. \
         Respond with ONLY a JSON object: {{\"name\": \"...\", \"description\": \"...\"}}",
        title = seed.name,
        artist = seed.primary_artist_name,
        mood = labels.mood.to_lowercase(),
        energy = labels.energy.to_lowercase(),
        time = labels.time_of_day.to_lowercase(),
        season = labels.season.to_lowercase(),
    )
}

/// Parse and validate the generator's reply.
pub fn parse_name(raw: &str) -> Result<PlaylistName, NamingError> {
    let json = match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => raw,
    };
    let mut parsed: PlaylistName =
        serde_json::from_str(json).map_err(|e| NamingError::Parse(e.to_string()))?;

    parsed.name = parsed.name.trim().to_string();
    parsed.description = parsed.description.trim().to_string();
    if parsed.name.is_empty() || parsed.name.chars().count() > MAX_NAME_CHARS {
        return Err(NamingError::InvalidName(parsed.name));
    }
    Ok(parsed)
}

/// Ask the text generator for a name and description.
pub async fn generate_with_ai(
    textgen: &dyn TextGenerator,
    seed: &CandidateTrack,
    track_count: usize,
    target: TargetProfile,
    now: NaiveDateTime,
) -> Result<PlaylistName, NamingError> {
    let prompt = naming_prompt(seed, track_count, &Labels::new(target, now));
    let raw = textgen.generate_text(&prompt).await?;
    parse_name(&raw)
}
