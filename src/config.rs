use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Storage;
use crate::texts::Difficulty;

pub const PREFERENCES_KEY: &str = "preferences";

/// The selectable test lengths.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(try_from = "u64", into = "u64")]
pub enum TestDuration {
    #[strum(to_string = "15s")]
    Fifteen,
    #[strum(to_string = "30s")]
    Thirty,
    #[default]
    #[strum(to_string = "60s")]
    Sixty,
    #[strum(to_string = "120s")]
    OneTwenty,
}

impl TestDuration {
    pub const ALL: [TestDuration; 4] = [
        TestDuration::Fifteen,
        TestDuration::Thirty,
        TestDuration::Sixty,
        TestDuration::OneTwenty,
    ];

    pub fn secs(&self) -> u64 {
        match self {
            TestDuration::Fifteen => 15,
            TestDuration::Thirty => 30,
            TestDuration::Sixty => 60,
            TestDuration::OneTwenty => 120,
        }
    }
}

impl TryFrom<u64> for TestDuration {
    type Error = String;

    fn try_from(secs: u64) -> Result<Self, Self::Error> {
        TestDuration::ALL
            .into_iter()
            .find(|d| d.secs() == secs)
            .ok_or_else(|| format!("unsupported duration {secs}s (expected 15, 30, 60 or 120)"))
    }
}

impl From<TestDuration> for u64 {
    fn from(d: TestDuration) -> Self {
        d.secs()
    }
}

impl std::str::FromStr for TestDuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let secs = s
            .trim()
            .trim_end_matches('s')
            .parse::<u64>()
            .map_err(|e| format!("invalid duration '{s}': {e}"))?;
        TestDuration::try_from(secs)
    }
}

/// User preferences, persisted through the key-value store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Preferences {
    pub duration: TestDuration,
    pub difficulty: Option<Difficulty>,
    pub topic: Option<String>,
    pub tutorial_seen: bool,
    pub last_used: Option<DateTime<Utc>>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            duration: TestDuration::default(),
            difficulty: None,
            topic: None,
            tutorial_seen: false,
            last_used: None,
        }
    }
}

impl Preferences {
    pub fn load(storage: &Storage) -> Self {
        storage.get(PREFERENCES_KEY, Preferences::default())
    }

    /// Stamps `last_used` and writes through. Returns false if not persisted.
    pub fn save(&mut self, storage: &mut Storage) -> bool {
        self.last_used = Some(Utc::now());
        storage.set(PREFERENCES_KEY, self)
    }
}
