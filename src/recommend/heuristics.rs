//! Pure helpers for the search-based fallback: quotas, genre inference,
//! mood terms, dedup and per-artist diversification.

use std::collections::{HashMap, HashSet};

use crate::catalog::{CandidateTrack, TargetProfile};

/// Share of the limit filled from the seed artist's catalog.
pub const SAME_ARTIST_PERCENT: usize = 30;
/// Share of the limit filled from inferred genres.
pub const GENRE_PERCENT: usize = 30;
/// Share of the limit filled from mood-term searches.
pub const MOOD_PERCENT: usize = 40;

/// Mood candidates are rejected once their artist has this many tracks.
pub const MAX_TRACKS_PER_ARTIST: usize = 3;

const MAX_GENRES: usize = 2;
const MAX_MOOD_TERMS: usize = 3;

/// Keyword table for genre inference, checked in order.
const GENRE_KEYWORDS: &[(&[&str], &str)] = &[
    (&["rock"], "rock"),
    (&["pop"], "pop"),
    (&["hip-hop", "hip hop", "rap"], "hip-hop"),
    (&["jazz"], "jazz"),
    (&["electronic", "edm"], "electronic"),
    (&["country"], "country"),
    (&["classical"], "classical"),
];

const DEFAULT_GENRES: &[&str] = &["pop", "rock", "indie", "alternative"];
const DEFAULT_MOOD_TERMS: &[&str] = &["popular", "trending", "hits"];

/// `percent` of `limit`, rounded up so quotas never under-allocate.
pub fn quota(limit: usize, percent: usize) -> usize {
    (limit * percent).div_ceil(100)
}

/// Per-query share of a quota split across `buckets` queries, rounded up.
pub fn per_bucket(quota: usize, buckets: usize) -> usize {
    quota.div_ceil(buckets.max(1))
}

/// Guess up to two genres from the seed's track and artist names.
pub fn infer_genres(track_name: &str, artist_name: &str) -> Vec<&'static str> {
    let haystack = format!("{track_name} {artist_name}").to_lowercase();
    let mut genres: Vec<&'static str> = GENRE_KEYWORDS
        .iter()
        .filter(|(keywords, _)| keywords.iter().any(|k| haystack.contains(k)))
        .map(|(_, genre)| *genre)
        .take(MAX_GENRES)
        .collect();

    if genres.is_empty() {
        genres = DEFAULT_GENRES.iter().copied().take(MAX_GENRES).collect();
    }
    genres
}

/// Search terms for an energy value, in five bands.
pub fn energy_terms(energy: f32) -> &'static [&'static str] {
    if energy < 0.2 {
        &["ambient", "chill", "relaxing", "calm"]
    } else if energy < 0.4 {
        &["acoustic", "mellow", "soft"]
    } else if energy < 0.6 {
        &["indie", "alternative"]
    } else if energy < 0.8 {
        &["upbeat", "pop", "rock"]
    } else {
        &["energetic", "upbeat", "party", "dance"]
    }
}

/// Search terms for a valence value, in five bands.
pub fn valence_terms(valence: f32) -> &'static [&'static str] {
    if valence < 0.2 {
        &["melancholic", "sad", "moody"]
    } else if valence < 0.4 {
        &["emotional", "nostalgic"]
    } else if valence < 0.6 {
        &["chill", "indie"]
    } else if valence < 0.8 {
        &["feel good", "positive"]
    } else {
        &["happy", "joyful", "uplifting"]
    }
}

/// Up to three mood search terms for the target profile.
///
/// Energy and valence terms are interleaved so both axes are represented
/// when both targets are set.
pub fn mood_terms(target: TargetProfile) -> Vec<&'static str> {
    if target.is_unset() {
        return DEFAULT_MOOD_TERMS.to_vec();
    }

    let energy = target.energy.map(energy_terms).unwrap_or_default();
    let valence = target.valence.map(valence_terms).unwrap_or_default();

    let mut terms = Vec::with_capacity(MAX_MOOD_TERMS);
    for i in 0..energy.len().max(valence.len()) {
        for term in [energy.get(i), valence.get(i)].into_iter().flatten() {
            if terms.len() < MAX_MOOD_TERMS && !terms.contains(term) {
                terms.push(*term);
            }
        }
    }
    terms
}

/// Stable sort by descending popularity, missing popularity counted as 0.
pub fn rank_by_popularity(tracks: &mut [CandidateTrack]) {
    tracks.sort_by_key(|t| std::cmp::Reverse(t.popularity.unwrap_or(0)));
}

/// Drop repeated track ids, keeping the first occurrence.
pub fn dedup_by_id(tracks: Vec<CandidateTrack>) -> Vec<CandidateTrack> {
    let mut seen = HashSet::with_capacity(tracks.len());
    tracks
        .into_iter()
        .filter(|t| seen.insert(t.id.clone()))
        .collect()
}

/// Running per-artist track counts for one request.
#[derive(Debug, Default)]
pub struct ArtistTally {
    counts: HashMap<String, usize>,
}

impl ArtistTally {
    pub fn record(&mut self, track: &CandidateTrack) {
        *self.counts.entry(track.artist_key().to_string()).or_default() += 1;
    }

    pub fn count(&self, track: &CandidateTrack) -> usize {
        self.counts.get(track.artist_key()).copied().unwrap_or(0)
    }

    /// Whether the track's artist is still below the diversification cap.
    pub fn admits(&self, track: &CandidateTrack) -> bool {
        self.count(track) < MAX_TRACKS_PER_ARTIST
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::candidate;
    use proptest::prelude::*;

    #[test]
    fn test_quota_rounds_up() {
        assert_eq!(quota(20, SAME_ARTIST_PERCENT), 6);
        assert_eq!(quota(20, MOOD_PERCENT), 8);
        assert_eq!(quota(7, SAME_ARTIST_PERCENT), 3);
        assert_eq!(quota(1, GENRE_PERCENT), 1);
        assert_eq!(quota(0, GENRE_PERCENT), 0);
    }

    #[test]
    fn test_quotas_cover_limit() {
        for limit in 1..=100 {
            let total = quota(limit, SAME_ARTIST_PERCENT)
                + quota(limit, GENRE_PERCENT)
                + quota(limit, MOOD_PERCENT);
            assert!(total >= limit, "limit {limit} under-allocated");
        }
    }

    #[test]
    fn test_per_bucket() {
        assert_eq!(per_bucket(8, 3), 3);
        assert_eq!(per_bucket(6, 2), 3);
        assert_eq!(per_bucket(5, 0), 5);
    }

    #[test]
    fn test_infer_genres_from_keywords() {
        assert_eq!(infer_genres("Jazz Standards", "Some Trio"), vec!["jazz"]);
        assert_eq!(
            infer_genres("Rap God", "Rock Band"),
            vec!["rock", "hip-hop"]
        );
        assert_eq!(infer_genres("Hip Hop Hooray", "Naughty"), vec!["hip-hop"]);
        assert_eq!(infer_genres("EDM Anthem", "DJ"), vec!["electronic"]);
    }

    #[test]
    fn test_infer_genres_defaults() {
        assert_eq!(infer_genres("Yesterday", "The Beatles"), vec!["pop", "rock"]);
    }

    #[test]
    fn test_energy_band_boundaries() {
        assert_eq!(energy_terms(0.0)[0], "ambient");
        assert_eq!(energy_terms(0.19)[0], "ambient");
        assert_eq!(energy_terms(0.2)[0], "acoustic");
        assert_eq!(energy_terms(0.4)[0], "indie");
        assert_eq!(energy_terms(0.6)[0], "upbeat");
        assert_eq!(energy_terms(0.8)[0], "energetic");
        assert_eq!(energy_terms(1.0)[0], "energetic");
    }

    #[test]
    fn test_valence_band_boundaries() {
        assert_eq!(valence_terms(0.1)[0], "melancholic");
        assert_eq!(valence_terms(0.3)[0], "emotional");
        assert_eq!(valence_terms(0.5)[0], "chill");
        assert_eq!(valence_terms(0.7)[0], "feel good");
        assert_eq!(valence_terms(0.95)[0], "happy");
    }

    #[test]
    fn test_mood_terms_default() {
        assert_eq!(
            mood_terms(TargetProfile::default()),
            vec!["popular", "trending", "hits"]
        );
    }

    #[test]
    fn test_mood_terms_interleave_axes() {
        let terms = mood_terms(TargetProfile::new(Some(0.9), Some(0.9)));
        assert_eq!(terms, vec!["energetic", "happy", "upbeat"]);
    }

    #[test]
    fn test_mood_terms_single_axis() {
        let terms = mood_terms(TargetProfile::new(Some(0.1), None));
        assert_eq!(terms, vec!["ambient", "chill", "relaxing"]);
    }

    #[test]
    fn test_mood_terms_dedup() {
        // "chill" appears in both the lowest energy band and the middle valence band
        let terms = mood_terms(TargetProfile::new(Some(0.1), Some(0.5)));
        assert_eq!(terms, vec!["ambient", "chill", "indie"]);
    }

    #[test]
    fn test_rank_by_popularity_missing_is_zero() {
        let mut tracks = vec![
            candidate("a", "X", None),
            candidate("b", "X", Some(50)),
            candidate("c", "X", Some(90)),
            candidate("d", "X", Some(0)),
        ];
        rank_by_popularity(&mut tracks);
        let ids: Vec<_> = tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a", "d"]);
    }

    #[test]
    fn test_artist_tally_cap() {
        let mut tally = ArtistTally::default();
        let track = candidate("a", "X", None);
        for _ in 0..MAX_TRACKS_PER_ARTIST {
            assert!(tally.admits(&track));
            tally.record(&track);
        }
        assert!(!tally.admits(&track));
        assert!(tally.admits(&candidate("b", "Y", None)));
    }

    proptest! {
        #[test]
        fn prop_dedup_keeps_first_of_each_id(ids in prop::collection::vec(0u8..20, 0..60)) {
            let tracks: Vec<_> = ids
                .iter()
                .enumerate()
                .map(|(pos, id)| {
                    let mut t = candidate(&format!("t{id}"), "A", None);
                    t.popularity = Some(pos as u32);
                    t
                })
                .collect();
            let deduped = dedup_by_id(tracks);
            let unique: HashSet<_> = deduped.iter().map(|t| t.id.clone()).collect();
            prop_assert_eq!(unique.len(), deduped.len());
            let expected: HashSet<_> = ids.iter().map(|id| format!("t{id}")).collect();
            prop_assert_eq!(unique, expected);
            // First occurrence wins: positions are strictly increasing
            for pair in deduped.windows(2) {
                prop_assert!(pair[0].popularity < pair[1].popularity);
            }
        }
    }
}
