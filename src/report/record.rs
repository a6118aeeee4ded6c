//! Structured record produced from an engine report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The parser's sole output. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredRecord {
    /// Dates, palaces, solar terms and per-term times (`立春_time`, ...).
    pub basic_info: BTreeMap<String, String>,
    /// Either all four pillars or nothing.
    pub four_pillars: Option<FourPillars>,
    pub five_elements: FiveElements,
    pub analysis: Analysis,
    /// Engine output, verbatim.
    pub raw_output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FourPillars {
    pub year: String,
    pub month: String,
    pub day: String,
    pub hour: String,
}

impl FourPillars {
    /// Assign the first four tokens to year, month, day, hour.
    /// Returns `None` unless there are at least four.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Option<Self> {
        match tokens {
            [year, month, day, hour, ..] => Some(Self {
                year: year.as_ref().to_string(),
                month: month.as_ref().to_string(),
                day: day.as_ref().to_string(),
                hour: hour.as_ref().to_string(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FiveElements {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scores: BTreeMap<String, u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub status: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_value: Option<i64>,
    /// `"无"` when the report says there is no strong root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strong_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity_score: Option<i64>,
    /// Set only when `strength` was captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weak: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ten_gods: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spiritual_stars: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<PatternAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasonal_adjustment: Option<SeasonalAdjustment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jinbuhuan_seasonal: Option<SeasonalAdjustment>,
    /// Ascending by `start_age`, unique by `start_age`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub luck_cycles: Vec<LuckCycle>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternAnalysis {
    pub primary_pattern: String,
    pub secondary_patterns: Vec<String>,
    pub favorable_elements: Vec<String>,
    pub unfavorable_elements: Vec<String>,
    pub pattern_quality: PatternQuality,
}

/// Ordered from worst to best.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PatternQuality {
    #[default]
    #[serde(rename = "")]
    Unrated,
    #[serde(rename = "佳")]
    Good,
    #[serde(rename = "最佳")]
    Best,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalAdjustment {
    /// Stems in priority order, first occurrence kept.
    pub adjustment_gods: Vec<char>,
    pub priority_order: Vec<PriorityEntry>,
    pub favorable_gods: Vec<char>,
    pub unfavorable_gods: Vec<char>,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityEntry {
    pub priority: u32,
    pub god: char,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LuckCycle {
    pub start_age: u32,
    pub heavenly_stem: String,
    pub earthly_branch: String,
    pub pillar: String,
    pub twelve_stages: String,
    pub nayin: String,
    pub ten_god: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_pillars_from_tokens() {
        let pillars = FourPillars::from_tokens(&["甲子", "乙丑", "丙寅", "丁卯", "extra"]).unwrap();
        assert_eq!(pillars.year, "甲子");
        assert_eq!(pillars.hour, "丁卯");
        assert!(FourPillars::from_tokens(&["甲子", "乙丑", "丙寅"]).is_none());
    }

    #[test]
    fn test_pattern_quality_serializes_to_labels() {
        assert_eq!(serde_json::to_string(&PatternQuality::Unrated).unwrap(), "\"\"");
        assert_eq!(serde_json::to_string(&PatternQuality::Good).unwrap(), "\"佳\"");
        assert_eq!(serde_json::to_string(&PatternQuality::Best).unwrap(), "\"最佳\"");
    }

    #[test]
    fn test_empty_fields_are_omitted() {
        let json = serde_json::to_value(StructuredRecord::default()).unwrap();
        assert_eq!(json["five_elements"], serde_json::json!({}));
        assert_eq!(json["analysis"], serde_json::json!({}));
        assert!(json["four_pillars"].is_null());
    }
}
