//! Post-session error patterns and the practice material they suggest.

use std::collections::BTreeMap;

use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::session::ErrorEvent;

pub const TOP_N: usize = 5;
const DRILL_REPEATS: usize = 10;

const ACCENTED: &str = "áéíóúüñÁÉÍÓÚÜÑ";
const SYMBOLS: &str = ".,;:(){}[]<>!?¡¿@#$%^&*-_=+'\"\\|/";

/// Declaration order doubles as the tie-break order for the weakest category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ErrorCategory {
    Symbols,
    Numbers,
    Letters,
    Spaces,
    Accents,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 5] = [
        ErrorCategory::Symbols,
        ErrorCategory::Numbers,
        ErrorCategory::Letters,
        ErrorCategory::Spaces,
        ErrorCategory::Accents,
    ];
}

pub fn categorize(c: char) -> ErrorCategory {
    if c.is_ascii_digit() {
        ErrorCategory::Numbers
    } else if c.is_whitespace() {
        ErrorCategory::Spaces
    } else if ACCENTED.contains(c) {
        ErrorCategory::Accents
    } else if SYMBOLS.contains(c) {
        ErrorCategory::Symbols
    } else {
        ErrorCategory::Letters
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub title: String,
    pub description: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorAnalysis {
    /// Reference character -> times it was mistyped
    pub character_errors: BTreeMap<char, usize>,
    /// Same, folded to lowercase for the keyboard heatmap
    pub heatmap: BTreeMap<char, usize>,
    pub category_errors: BTreeMap<ErrorCategory, usize>,
    pub top_characters: Vec<(char, usize)>,
    pub weakest_category: Option<ErrorCategory>,
    pub exercises: Vec<Exercise>,
    pub total_errors: usize,
}

impl ErrorAnalysis {
    /// Share of all errors made on `c`, in percent.
    pub fn share_of(&self, c: char) -> f64 {
        match (self.character_errors.get(&c), self.total_errors) {
            (Some(&count), total) if total > 0 => 100.0 * count as f64 / total as f64,
            _ => 0.0,
        }
    }
}

/// Classify the logged errors by the character that should have been typed.
pub fn analyze<R: Rng + ?Sized>(reference: &[char], error_log: &[ErrorEvent], rng: &mut R) -> ErrorAnalysis {
    let mut character_errors: BTreeMap<char, usize> = BTreeMap::new();
    let mut heatmap: BTreeMap<char, usize> = BTreeMap::new();

    for expected in error_log.iter().filter_map(|e| reference.get(e.position)) {
        *character_errors.entry(*expected).or_default() += 1;
        for lower in expected.to_lowercase() {
            *heatmap.entry(lower).or_default() += 1;
        }
    }

    let mut category_errors: BTreeMap<ErrorCategory, usize> =
        ErrorCategory::ALL.iter().map(|&c| (c, 0)).collect();
    for (&c, &count) in &character_errors {
        *category_errors.entry(categorize(c)).or_default() += count;
    }

    let top_characters: Vec<(char, usize)> = character_errors
        .iter()
        .map(|(&c, &n)| (c, n))
        .sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)))
        .take(TOP_N)
        .collect();

    // max_by_key keeps the last maximum, so walk categories in reverse
    let weakest_category = ErrorCategory::ALL
        .iter()
        .rev()
        .map(|&c| (c, category_errors[&c]))
        .filter(|&(_, n)| n > 0)
        .max_by_key(|&(_, n)| n)
        .map(|(c, _)| c);

    let mut exercises = Vec::new();
    if !top_characters.is_empty() {
        exercises.push(character_drill(&top_characters, rng));
    }
    if let Some(category) = weakest_category {
        exercises.push(category_exercise(category));
    }

    ErrorAnalysis {
        total_errors: error_log.len(),
        character_errors,
        heatmap,
        category_errors,
        top_characters,
        weakest_category,
        exercises,
    }
}

fn character_drill<R: Rng + ?Sized>(top: &[(char, usize)], rng: &mut R) -> Exercise {
    let chars = top.iter().map(|(c, _)| *c).collect::<Vec<_>>();
    let unit = chars.iter().join(" ");
    let mut drill: Vec<char> = unit.repeat(DRILL_REPEATS).chars().collect();
    drill.shuffle(rng);

    Exercise {
        title: "Problem characters".to_string(),
        description: format!(
            "Focus on the characters that cost you the most: {}",
            chars.iter().map(|c| display_char(*c)).join(", ")
        ),
        text: drill.into_iter().collect(),
    }
}

pub fn category_exercise(category: ErrorCategory) -> Exercise {
    let (title, description, text) = match category {
        ErrorCategory::Symbols => (
            "Symbols",
            "Sharpen your accuracy with punctuation and symbols",
            "Ms. Reyes (the manager) asked: \"Wait! Is the total $150.75, or $175.50?\" [ref: #42-b; see p. 7/9]",
        ),
        ErrorCategory::Numbers => (
            "Numbers",
            "Build speed and precision on the number row",
            "In 2023, 75% of the 1,234 people surveyed preferred model 9870 over model 8654.",
        ),
        ErrorCategory::Accents => (
            "Accents",
            "Practise accented characters and the letter ñ",
            "El niño cumplió años y su mamá le organizó una fiesta con piñata. ¡Qué día más feliz!",
        ),
        ErrorCategory::Spaces => (
            "Spacing",
            "Improve your rhythm and precision with the space bar",
            "One two three four five six seven eight nine ten eleven twelve thirteen fourteen fifteen.",
        ),
        ErrorCategory::Letters => (
            "Letters",
            "Improve speed and accuracy on common letter combinations",
            "When we examine the question in more depth, we find that it requires a careful and thorough analysis.",
        ),
    };

    Exercise {
        title: title.to_string(),
        description: description.to_string(),
        text: text.to_string(),
    }
}

pub fn display_char(c: char) -> String {
    match c {
        ' ' => "space".to_string(),
        '\t' => "tab".to_string(),
        c => c.to_string(),
    }
}
