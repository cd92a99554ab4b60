//! Output naming patterns.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How an output base name is derived from the source base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NamingPattern {
    #[default]
    Original,
    SuffixConverted,
    DateSuffix,
    IndexPrefix,
}

impl NamingPattern {
    /// Parses a pattern name. Unknown names fall back to [`NamingPattern::Original`].
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "suffixConverted" => NamingPattern::SuffixConverted,
            "dateSuffix" => NamingPattern::DateSuffix,
            "indexPrefix" => NamingPattern::IndexPrefix,
            _ => NamingPattern::Original,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NamingPattern::Original => "original",
            NamingPattern::SuffixConverted => "suffixConverted",
            NamingPattern::DateSuffix => "dateSuffix",
            NamingPattern::IndexPrefix => "indexPrefix",
        }
    }

    pub fn apply(&self, base: &str, ordinal: u64, today: NaiveDate) -> String {
        match self {
            NamingPattern::Original => base.to_string(),
            NamingPattern::SuffixConverted => format!("{}_converted", base),
            NamingPattern::DateSuffix => format!("{}_{}", base, today.format("%Y-%m-%d")),
            NamingPattern::IndexPrefix if ordinal > 0 => format!("{}_{}", ordinal, base),
            NamingPattern::IndexPrefix => base.to_string(),
        }
    }
}

impl fmt::Display for NamingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a source base name to an output base name for the given pattern name.
pub fn name_for(base: &str, pattern: &str, ordinal: u64, today: NaiveDate) -> String {
    NamingPattern::parse(pattern).apply(base, ordinal, today)
}
