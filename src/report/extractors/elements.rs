//! Five-element scores and status, strength, strong root and humidity.

use std::sync::LazyLock;

use regex::Regex;

use super::FieldExtractor;
use crate::report::accumulator::{Accumulator, Fragment};
use crate::report::vocab::{char_class, ELEMENTS, ELEMENT_STATES};

static SCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"({})(\d+)", char_class(&ELEMENTS))).expect("valid regex")
});
static STATUS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"({})[:：]({})",
        char_class(&ELEMENTS),
        char_class(&ELEMENT_STATES)
    ))
    .expect("valid regex")
});
static STRENGTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"强弱[:：]\s*(\d+)").expect("valid regex"));
static MIDDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"中值[:：]?\s*(-?\d+)").expect("valid regex"));
static STRONG_ROOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"强根[:：]\s*(\S*)").expect("valid regex"));
static HUMIDITY_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"湿度\[([^\]]+)\]").expect("valid regex"));
static HUMIDITY_AFTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"湿度(?:分数)?[:：]?\s*([+-]?\d+)").expect("valid regex"));
static HUMIDITY_BEFORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)([+-]?\d+)\s*湿度").expect("valid regex"));

/// Sentinel for an explicitly empty strong root.
pub const NO_STRONG_ROOT: &str = "无";

fn mentions_all_elements(line: &str) -> bool {
    ELEMENTS.iter().all(|e| line.contains(*e))
}

/// Single-character capture group as a `char`.
fn capture_char(cap: &regex::Captures<'_>, group: usize) -> Option<char> {
    cap.get(group).and_then(|m| m.as_str().chars().next())
}

/// `金10 木20 水30 火40 土50`
pub struct ElementScoresExtractor;

impl FieldExtractor for ElementScoresExtractor {
    fn name(&self) -> &'static str {
        "element_scores"
    }

    fn extract(&self, line: &str, _acc: &Accumulator) -> Vec<Fragment> {
        if !mentions_all_elements(line) {
            return Vec::new();
        }
        SCORE_RE
            .captures_iter(line)
            .filter_map(|cap| {
                let element = capture_char(&cap, 1)?;
                let score = cap[2].parse::<u32>().ok()?;
                Some(Fragment::ElementScore { element, score })
            })
            .collect()
    }
}

/// `金:旺 木:休 水:相 火:死 土:囚`
pub struct ElementStatusExtractor;

impl FieldExtractor for ElementStatusExtractor {
    fn name(&self) -> &'static str {
        "element_status"
    }

    fn extract(&self, line: &str, _acc: &Accumulator) -> Vec<Fragment> {
        if !mentions_all_elements(line) {
            return Vec::new();
        }
        STATUS_RE
            .captures_iter(line)
            .filter_map(|cap| {
                Some(Fragment::ElementStatus {
                    element: capture_char(&cap, 1)?,
                    state: capture_char(&cap, 2)?,
                })
            })
            .collect()
    }
}

/// `强弱:45` and `中值50`, independently.
pub struct StrengthExtractor;

impl FieldExtractor for StrengthExtractor {
    fn name(&self) -> &'static str {
        "strength"
    }

    fn extract(&self, line: &str, _acc: &Accumulator) -> Vec<Fragment> {
        let mut fragments = Vec::new();
        if let Some(value) = STRENGTH_RE.captures(line).and_then(|c| c[1].parse::<u32>().ok()) {
            fragments.push(Fragment::Strength(value));
        }
        if let Some(value) = MIDDLE_RE.captures(line).and_then(|c| c[1].parse::<i64>().ok()) {
            fragments.push(Fragment::MiddleValue(value));
        }
        fragments
    }
}

/// `强根:丙` or `强根:` (none).
pub struct StrongRootExtractor;

impl FieldExtractor for StrongRootExtractor {
    fn name(&self) -> &'static str {
        "strong_root"
    }

    fn extract(&self, line: &str, _acc: &Accumulator) -> Vec<Fragment> {
        let Some(cap) = STRONG_ROOT_RE.captures(line) else {
            return Vec::new();
        };
        let root = match &cap[1] {
            "" => NO_STRONG_ROOT.to_string(),
            root => root.to_string(),
        };
        vec![Fragment::StrongRoot(root)]
    }
}

/// `湿度[-6,6]` range plus a signed score on either side of the marker.
pub struct HumidityExtractor;

impl FieldExtractor for HumidityExtractor {
    fn name(&self) -> &'static str {
        "humidity"
    }

    fn extract(&self, line: &str, _acc: &Accumulator) -> Vec<Fragment> {
        if !line.contains("湿度") {
            return Vec::new();
        }
        let mut fragments = Vec::new();
        if let Some(cap) = HUMIDITY_RANGE_RE.captures(line) {
            fragments.push(Fragment::HumidityRange(cap[1].to_string()));
        }
        let score = HUMIDITY_AFTER_RE
            .captures(line)
            .or_else(|| HUMIDITY_BEFORE_RE.captures(line))
            .and_then(|cap| cap[1].parse::<i64>().ok());
        if let Some(score) = score {
            fragments.push(Fragment::HumidityScore(score));
        }
        fragments
    }
}
