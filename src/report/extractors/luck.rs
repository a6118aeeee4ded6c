//! Luck-cycle (大运) rows: `<age> <stem><branch> <life stage> ...`.

use std::sync::LazyLock;

use regex::Regex;

use super::FieldExtractor;
use crate::report::accumulator::{Accumulator, Fragment};
use crate::report::record::LuckCycle;
use crate::report::vocab::{
    char_class, first_occurrence, BRANCHES, NAYIN, STEMS, TEN_GODS, TEN_GOD_NONE, TWELVE_STAGES,
};

const MIN_TOKENS: usize = 4;

static ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(\d+)\s+{}{}\s+({})(?:\s|$)",
        char_class(&STEMS),
        char_class(&BRANCHES),
        TWELVE_STAGES.join("|")
    ))
    .expect("valid regex")
});
static PILLAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("({})({})", char_class(&STEMS), char_class(&BRANCHES)))
        .expect("valid regex")
});
static TEN_GOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    let names: Vec<String> = TEN_GODS
        .iter()
        .filter(|g| **g != TEN_GOD_NONE)
        .map(|g| regex::escape(g))
        .collect();
    Regex::new(&format!(r"({})[:：]", names.join("|"))).expect("valid regex")
});

pub struct LuckCycleExtractor;

impl FieldExtractor for LuckCycleExtractor {
    fn name(&self) -> &'static str {
        "luck_cycles"
    }

    fn extract(&self, line: &str, _acc: &Accumulator) -> Vec<Fragment> {
        parse_luck_row(line)
            .map(Fragment::LuckCycle)
            .into_iter()
            .collect()
    }
}

fn parse_luck_row(line: &str) -> Option<LuckCycle> {
    if line.split_whitespace().count() < MIN_TOKENS {
        return None;
    }
    let row = ROW_RE.captures(line)?;
    let start_age: u32 = row[1].parse().ok()?;
    let pillar = PILLAR_RE.captures(line)?;

    Some(LuckCycle {
        start_age,
        heavenly_stem: pillar[1].to_string(),
        earthly_branch: pillar[2].to_string(),
        pillar: pillar[0].to_string(),
        twelve_stages: row[2].to_string(),
        nayin: first_occurrence(line, &NAYIN).unwrap_or_default().to_string(),
        ten_god: TEN_GOD_RE
            .captures(line)
            .map(|c| c[1].to_string())
            .unwrap_or_default(),
    })
}
