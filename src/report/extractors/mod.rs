//! Per-line field extractors.
//!
//! Each extractor looks at one line at a time and either contributes
//! fragments or nothing. Extractors are independent of each other: the
//! order they run in on a line does not change the result.

pub mod calendar;
pub mod elements;
pub mod luck;
pub mod patterns;
pub mod pillars;
pub mod seasonal;
pub mod stars;
pub mod ten_gods;

use super::accumulator::{Accumulator, Fragment};

/// A stateless matcher for one semantic concern of the report.
pub trait FieldExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fragments this line contributes. An empty vec means no match.
    fn extract(&self, line: &str, acc: &Accumulator) -> Vec<Fragment>;
}

/// The full set of extractors applied to every line.
pub fn default_registry() -> Vec<Box<dyn FieldExtractor>> {
    vec![
        Box::new(calendar::DateExtractor),
        Box::new(calendar::PalaceExtractor),
        Box::new(calendar::SolarTermExtractor),
        Box::new(pillars::FourPillarsExtractor),
        Box::new(elements::ElementScoresExtractor),
        Box::new(elements::ElementStatusExtractor),
        Box::new(elements::StrengthExtractor),
        Box::new(elements::StrongRootExtractor),
        Box::new(elements::HumidityExtractor),
        Box::new(ten_gods::TenGodsExtractor),
        Box::new(stars::SpiritualStarsExtractor),
        Box::new(patterns::PatternExtractor),
        Box::new(seasonal::SeasonalExtractor),
        Box::new(luck::LuckCycleExtractor),
    ]
}

/// Text following the first occurrence of `label` and an optional colon.
pub(crate) fn after_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let (_, rest) = line.split_once(label)?;
    let rest = rest.trim_start();
    let rest = rest
        .strip_prefix(':')
        .or_else(|| rest.strip_prefix('：'))
        .unwrap_or(rest);
    Some(rest.trim())
}
