use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static CORPUS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/corpus");
const CORPUS_FILE: &str = "texts.json";
/// Below this many length-matching texts, any text of the difficulty will do.
const MIN_LENGTH_MATCHES: usize = 3;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Basic,
    Intermediate,
    Advanced,
}

impl Difficulty {
    fn prefers_length(&self, len: usize) -> bool {
        match self {
            Difficulty::Basic => len < 300,
            Difficulty::Intermediate => (300..600).contains(&len),
            Difficulty::Advanced => len >= 600,
        }
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct ThemedText {
    pub text: String,
    pub theme: String,
    pub language: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextFilter {
    pub difficulty: Option<Difficulty>,
    pub theme: Option<String>,
}

pub fn corpus() -> &'static [ThemedText] {
    static CORPUS: OnceLock<Vec<ThemedText>> = OnceLock::new();
    CORPUS.get_or_init(|| {
        CORPUS_DIR
            .get_file(CORPUS_FILE)
            .and_then(|file| file.contents_utf8())
            .and_then(|json| match serde_json::from_str(json) {
                Ok(texts) => Some(texts),
                Err(e) => {
                    tracing::warn!(error = %e, "embedded corpus is malformed");
                    None
                }
            })
            .unwrap_or_default()
    })
}

/// Topics present in the corpus, sorted.
pub fn themes() -> Vec<String> {
    corpus()
        .iter()
        .map(|t| t.theme.clone())
        .unique()
        .sorted()
        .collect()
}

/// Texts matching `filter`, preferring lengths that suit the difficulty.
pub fn candidates<'a>(corpus: &'a [ThemedText], filter: &TextFilter) -> Vec<&'a ThemedText> {
    let matching: Vec<&ThemedText> = corpus
        .iter()
        .filter(|t| filter.difficulty.map_or(true, |d| t.difficulty == d))
        .filter(|t| {
            filter
                .theme
                .as_deref()
                .map_or(true, |theme| t.theme.eq_ignore_ascii_case(theme))
        })
        .collect();

    if matching.is_empty() {
        return corpus.iter().collect();
    }

    let Some(difficulty) = filter.difficulty else {
        return matching;
    };

    let by_length: Vec<&ThemedText> = matching
        .iter()
        .copied()
        .filter(|t| difficulty.prefers_length(t.text.chars().count()))
        .collect();

    if by_length.len() < MIN_LENGTH_MATCHES {
        matching
    } else {
        by_length
    }
}

/// Pick one text. Falls back to the whole corpus for an unmatched filter.
pub fn get_candidate_text<R: Rng + ?Sized>(filter: &TextFilter, rng: &mut R) -> String {
    candidates(corpus(), filter)
        .choose(rng)
        .map(|t| t.text.clone())
        .unwrap_or_else(|| "the quick brown fox jumps over the lazy dog".to_string())
}
