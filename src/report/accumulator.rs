//! Scan accumulator: fragments contributed by extractors and how they merge.
//!
//! Scalar fields follow last-seen-wins. Spiritual stars are a set. Luck
//! cycles are keyed by starting age and the first record seen for an age
//! wins; later rows for the same age are dropped.

use std::collections::{BTreeMap, BTreeSet};

use super::record::{
    Analysis, FiveElements, FourPillars, LuckCycle, PatternAnalysis, SeasonalAdjustment,
    StructuredRecord,
};

/// Upper bound (inclusive) on strength for a chart to count as weak.
pub const WEAK_STRENGTH_MAX: u32 = 29;

/// A single contribution from one extractor on one line.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    BasicInfo { key: String, value: String },
    FourPillars(FourPillars),
    ElementScore { element: char, score: u32 },
    ElementStatus { element: char, state: char },
    Strength(u32),
    MiddleValue(i64),
    StrongRoot(String),
    HumidityRange(String),
    HumidityScore(i64),
    TenGods(Vec<String>),
    SpiritualStar(String),
    Patterns(PatternAnalysis),
    Seasonal(SeasonalAdjustment),
    JinbuhuanSeasonal(SeasonalAdjustment),
    LuckCycle(LuckCycle),
}

/// Mutable state of a single parse. Never shared between parses.
#[derive(Debug, Default, Clone)]
pub struct Accumulator {
    basic_info: BTreeMap<String, String>,
    four_pillars: Option<FourPillars>,
    five_elements: FiveElements,
    ten_gods: Option<Vec<String>>,
    spiritual_stars: BTreeSet<String>,
    patterns: Option<PatternAnalysis>,
    seasonal: Option<SeasonalAdjustment>,
    jinbuhuan: Option<SeasonalAdjustment>,
    luck_cycles: Vec<LuckCycle>,
}

impl Accumulator {
    pub fn has_four_pillars(&self) -> bool {
        self.four_pillars.is_some()
    }

    /// Fold one fragment into the accumulator.
    pub fn merge(mut self, fragment: Fragment) -> Self {
        let elements = &mut self.five_elements;
        match fragment {
            Fragment::BasicInfo { key, value } => {
                self.basic_info.insert(key, value);
            }
            Fragment::FourPillars(pillars) => self.four_pillars = Some(pillars),
            Fragment::ElementScore { element, score } => {
                elements.scores.insert(element.to_string(), score);
            }
            Fragment::ElementStatus { element, state } => {
                elements.status.insert(element.to_string(), state.to_string());
            }
            Fragment::Strength(value) => elements.strength = Some(value),
            Fragment::MiddleValue(value) => elements.middle_value = Some(value),
            Fragment::StrongRoot(root) => elements.strong_root = Some(root),
            Fragment::HumidityRange(range) => elements.humidity_range = Some(range),
            Fragment::HumidityScore(score) => elements.humidity_score = Some(score),
            Fragment::TenGods(gods) => self.ten_gods = Some(gods),
            Fragment::SpiritualStar(star) => {
                self.spiritual_stars.insert(star);
            }
            Fragment::Patterns(patterns) => self.patterns = Some(patterns),
            Fragment::Seasonal(seasonal) => self.seasonal = Some(seasonal),
            Fragment::JinbuhuanSeasonal(seasonal) => self.jinbuhuan = Some(seasonal),
            Fragment::LuckCycle(cycle) => merge_luck_cycle(&mut self.luck_cycles, cycle),
        }
        self
    }

    /// Turn the accumulated state into the final, immutable record.
    pub fn assemble(self, raw_output: &str) -> StructuredRecord {
        let mut five_elements = self.five_elements;
        five_elements.weak = five_elements.strength.map(|s| s <= WEAK_STRENGTH_MAX);

        let mut luck_cycles = self.luck_cycles;
        luck_cycles.sort_by_key(|c| c.start_age);

        StructuredRecord {
            basic_info: self.basic_info,
            four_pillars: self.four_pillars,
            five_elements,
            analysis: Analysis {
                ten_gods: self.ten_gods,
                spiritual_stars: self.spiritual_stars.into_iter().collect(),
                patterns: self.patterns,
                seasonal_adjustment: self.seasonal,
                jinbuhuan_seasonal: self.jinbuhuan,
                luck_cycles,
            },
            raw_output: raw_output.to_string(),
        }
    }
}

/// Append `cycle` unless a cycle with the same starting age is already present.
pub fn merge_luck_cycle(cycles: &mut Vec<LuckCycle>, cycle: LuckCycle) {
    if !cycles.iter().any(|c| c.start_age == cycle.start_age) {
        cycles.push(cycle);
    }
}
