//! Dates, palaces and solar terms.

use std::sync::LazyLock;

use regex::Regex;

use super::FieldExtractor;
use crate::report::accumulator::{Accumulator, Fragment};
use crate::report::vocab::SOLAR_TERMS;

static GREGORIAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"公历[:：]\s*(\S+)").expect("valid regex"));
static LUNAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"农历[:：]\s*(\S+)").expect("valid regex"));
static TERM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&SOLAR_TERMS.join("|")).expect("valid regex")
});
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}[:：]\d{2}").expect("valid regex"));

/// Palace labels and the `basic_info` key each one fills.
const PALACES: [(&str, &str); 3] = [
    ("命宫", "life_palace"),
    ("胎元", "taiyuan"),
    ("身宫", "body_palace"),
];

/// Gregorian and lunar dates. Both markers must be on the line.
pub struct DateExtractor;

impl FieldExtractor for DateExtractor {
    fn name(&self) -> &'static str {
        "dates"
    }

    fn extract(&self, line: &str, _acc: &Accumulator) -> Vec<Fragment> {
        let (Some(gregorian), Some(lunar)) = (GREGORIAN_RE.captures(line), LUNAR_RE.captures(line))
        else {
            return Vec::new();
        };
        vec![
            Fragment::BasicInfo {
                key: "gregorian_date".to_string(),
                value: gregorian[1].to_string(),
            },
            Fragment::BasicInfo {
                key: "lunar_date".to_string(),
                value: lunar[1].to_string(),
            },
        ]
    }
}

/// Life palace, taiyuan and body palace, each matched on its own.
pub struct PalaceExtractor;

static PALACE_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    PALACES
        .iter()
        .map(|(label, key)| {
            let re = Regex::new(&format!(r"{}[:：]\s*(\S+)", label)).expect("valid regex");
            (re, *key)
        })
        .collect()
});

impl FieldExtractor for PalaceExtractor {
    fn name(&self) -> &'static str {
        "palaces"
    }

    fn extract(&self, line: &str, _acc: &Accumulator) -> Vec<Fragment> {
        PALACE_RES
            .iter()
            .filter_map(|(re, key)| {
                re.captures(line).map(|cap| Fragment::BasicInfo {
                    key: key.to_string(),
                    value: cap[1].to_string(),
                })
            })
            .collect()
    }
}

/// Solar-term line and per-term time strings.
pub struct SolarTermExtractor;

impl FieldExtractor for SolarTermExtractor {
    fn name(&self) -> &'static str {
        "solar_terms"
    }

    fn extract(&self, line: &str, _acc: &Accumulator) -> Vec<Fragment> {
        // Non-overlapping, left to right: 立冬至 yields 立冬 only.
        let hits: Vec<(usize, usize, &str)> = TERM_RE
            .find_iter(line)
            .map(|m| (m.start(), m.end(), m.as_str()))
            .collect();
        if hits.is_empty() {
            return Vec::new();
        }

        let mut fragments = Vec::new();

        let mut distinct: Vec<&str> = hits.iter().map(|(_, _, t)| *t).collect();
        distinct.sort();
        distinct.dedup();
        if distinct.len() >= 2 {
            fragments.push(Fragment::BasicInfo {
                key: "solar_terms".to_string(),
                value: line.to_string(),
            });
        }

        // A term's segment runs until the next term on the line.
        for (i, (_, start, term)) in hits.iter().enumerate() {
            let end = hits.get(i + 1).map(|(next, _, _)| *next).unwrap_or(line.len());
            let segment = line[*start..end].trim();
            if TIME_RE.is_match(segment) {
                fragments.push(Fragment::BasicInfo {
                    key: format!("{}_time", term),
                    value: segment.to_string(),
                });
            }
        }

        fragments
    }
}
