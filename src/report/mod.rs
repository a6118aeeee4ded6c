//! Engine report parsing.
//!
//! Pure, synchronous, no async. Every extractor in the registry is offered
//! every line; their fragments are folded into one [`Accumulator`] per parse.
//! When the scan is done the four pillars are rebuilt from bare stem/branch
//! rows if the labelled form was absent, and the accumulator is assembled
//! into a [`StructuredRecord`].
//!
//! The scan is all-or-nothing: a panic inside any extractor aborts the parse
//! and yields a [`ParseError`] carrying the raw text, never a partial record.

pub mod accumulator;
pub mod extractors;
pub mod lines;
pub mod record;
pub mod vocab;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::LazyLock;

use thiserror::Error;
use tracing::{debug, trace, warn};

use accumulator::{Accumulator, Fragment};
use extractors::FieldExtractor;
use lines::ReportLines;
pub use record::StructuredRecord;

/// The scan failed as a whole. Carries the original text for diagnosis.
#[derive(Debug, Clone, Error)]
#[error("解析错误: {message}")]
pub struct ParseError {
    pub message: String,
    pub raw_output: String,
}

/// Registry of extractors applied uniformly to every line.
pub struct ReportParser {
    extractors: Vec<Box<dyn FieldExtractor>>,
}

static DEFAULT_PARSER: LazyLock<ReportParser> = LazyLock::new(ReportParser::new);

/// Parse engine output with the default extractor registry.
pub fn parse_report(raw: &str) -> Result<StructuredRecord, ParseError> {
    DEFAULT_PARSER.parse(raw)
}

impl ReportParser {
    pub fn new() -> Self {
        Self::with_extractors(extractors::default_registry())
    }

    pub fn with_extractors(extractors: Vec<Box<dyn FieldExtractor>>) -> Self {
        Self { extractors }
    }

    /// Parse one report. Each call uses its own accumulator.
    pub fn parse(&self, raw: &str) -> Result<StructuredRecord, ParseError> {
        panic::catch_unwind(AssertUnwindSafe(|| self.scan(raw))).map_err(|payload| {
            let message = panic_message(&*payload);
            warn!("Report scan aborted: {}", message);
            ParseError {
                message,
                raw_output: raw.to_string(),
            }
        })
    }

    fn scan(&self, raw: &str) -> StructuredRecord {
        let lines = ReportLines::new(raw);

        let mut line_count = 0usize;
        let acc = lines.clone().fold(Accumulator::default(), |acc, line| {
            line_count += 1;
            self.apply(acc, line)
        });

        let acc = if acc.has_four_pillars() {
            acc
        } else {
            match extractors::pillars::reconstruct_from_rows(lines) {
                Some(pillars) => acc.merge(Fragment::FourPillars(pillars)),
                None => acc,
            }
        };

        let record = acc.assemble(raw);
        debug!(
            "Scanned {} lines: {} basic_info keys, pillars={}, {} stars, {} luck cycles",
            line_count,
            record.basic_info.len(),
            record.four_pillars.is_some(),
            record.analysis.spiritual_stars.len(),
            record.analysis.luck_cycles.len()
        );
        record
    }

    /// Offer one line to every extractor and fold in what they contribute.
    fn apply(&self, acc: Accumulator, line: &str) -> Accumulator {
        self.extractors.iter().fold(acc, |acc, extractor| {
            let fragments = extractor.extract(line, &acc);
            if !fragments.is_empty() {
                trace!("{}: {} fragment(s) from {:?}", extractor.name(), fragments.len(), line);
            }
            fragments.into_iter().fold(acc, Accumulator::merge)
        })
    }
}

impl Default for ReportParser {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "extractor panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use record::{FourPillars, PriorityEntry};

    const SAMPLE_REPORT: &str = "\
公历: 1990年5月15日 农历: 1990年4月21日
命宫:戊寅 胎元:辛未 身宫:甲申
立夏 5月6日 03:35 小满 5月21日 16:37
四柱：庚午 辛巳 庚辰 癸未
才 杀 -- 伤
金:旺 木:死 水:休 火:相 土:囚
金35 木10 水20 火45 土30
强弱:45 中值50 强根:午
湿度[-6,6] 湿度:-2
神煞: 桃花 文昌
格局选用：正官格；佳；喜土金 忌木火
调候： 1壬2丙戊3丁 ##金不换大运：1癸
大运
4 庚辰 养 白蜡金 比:庚
14 己卯 胎 城头土 印:己
14 戊寅 绝 城头土 枭:戊
24 戊寅 绝 城头土 枭:戊
驿马 天乙
";

    struct PanickingExtractor;

    impl FieldExtractor for PanickingExtractor {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn extract(&self, line: &str, _acc: &Accumulator) -> Vec<Fragment> {
            if line.contains("boom") {
                panic!("cannot interpret line: {}", line);
            }
            Vec::new()
        }
    }

    fn pillars(year: &str, month: &str, day: &str, hour: &str) -> Option<FourPillars> {
        Some(FourPillars {
            year: year.to_string(),
            month: month.to_string(),
            day: day.to_string(),
            hour: hour.to_string(),
        })
    }

    #[test]
    fn test_four_pillars_primary_form() {
        let record = parse_report("四柱：甲子 乙丑 丙寅 丁卯").unwrap();
        assert_eq!(record.four_pillars, pillars("甲子", "乙丑", "丙寅", "丁卯"));
    }

    #[test]
    fn test_four_pillars_ignore_trailing_tokens() {
        let record = parse_report("四柱：甲子 乙丑 丙寅 丁卯 戊辰 己巳").unwrap();
        assert_eq!(record.four_pillars, pillars("甲子", "乙丑", "丙寅", "丁卯"));
    }

    #[test]
    fn test_four_pillars_fallback_rows() {
        let record = parse_report("八字\n甲 乙 丙 丁\n其他\n子 丑 寅 卯").unwrap();
        assert_eq!(record.four_pillars, pillars("甲子", "乙丑", "丙寅", "丁卯"));
    }

    #[test]
    fn test_fallback_not_used_when_primary_present() {
        let record = parse_report("庚 辛 壬 癸\n午 未 申 酉\n四柱：甲子 乙丑 丙寅 丁卯").unwrap();
        assert_eq!(record.four_pillars, pillars("甲子", "乙丑", "丙寅", "丁卯"));
    }

    #[test]
    fn test_four_pillars_absent() {
        let record = parse_report("甲 乙 丙 丁\nnothing else").unwrap();
        assert_eq!(record.four_pillars, None);
    }

    #[test]
    fn test_element_scores() {
        let record = parse_report("五行\n金10 木20 水30 火40 土50").unwrap();
        let scores = &record.five_elements.scores;
        assert_eq!(scores.len(), 5);
        assert_eq!(scores["金"], 10);
        assert_eq!(scores["木"], 20);
        assert_eq!(scores["水"], 30);
        assert_eq!(scores["火"], 40);
        assert_eq!(scores["土"], 50);
    }

    #[test]
    fn test_strength_across_lines() {
        let record = parse_report("强弱:45\n中值50").unwrap();
        assert_eq!(record.five_elements.strength, Some(45));
        assert_eq!(record.five_elements.middle_value, Some(50));
        assert_eq!(record.five_elements.weak, Some(false));
    }

    #[test]
    fn test_weak_unset_without_strength() {
        let record = parse_report("中值50").unwrap();
        assert_eq!(record.five_elements.weak, None);
    }

    #[test]
    fn test_seasonal_scenario() {
        let record = parse_report("调候： 1壬2丙戊3丁").unwrap();
        let seasonal = record.analysis.seasonal_adjustment.unwrap();
        assert_eq!(
            seasonal.priority_order,
            vec![
                PriorityEntry { priority: 1, god: '壬' },
                PriorityEntry { priority: 2, god: '丙' },
                PriorityEntry { priority: 2, god: '戊' },
                PriorityEntry { priority: 3, god: '丁' },
            ]
        );
        assert_eq!(seasonal.adjustment_gods, vec!['壬', '丙', '戊', '丁']);
    }

    #[test]
    fn test_stars_independent_of_line_order() {
        let a = parse_report("神煞: 桃花 文昌\n驿马 桃花").unwrap();
        let b = parse_report("驿马 桃花\n神煞: 桃花 文昌").unwrap();
        let mut stars_a = a.analysis.spiritual_stars;
        let mut stars_b = b.analysis.spiritual_stars;
        stars_a.sort();
        stars_b.sort();
        assert_eq!(stars_a, stars_b);
        assert_eq!(stars_a.len(), 3);
    }

    #[test]
    fn test_luck_cycles_first_seen_wins() {
        let record = parse_report("14 己卯 胎 城头土 印:己\n4 庚辰 养 白蜡金 比:庚\n14 戊寅 绝 城头土 枭:戊").unwrap();
        let cycles = &record.analysis.luck_cycles;
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0].start_age, 4);
        assert_eq!(cycles[1].start_age, 14);
        assert_eq!(cycles[1].pillar, "己卯");
    }

    #[test]
    fn test_full_sample_report() {
        let record = parse_report(SAMPLE_REPORT).unwrap();

        assert_eq!(record.basic_info["gregorian_date"], "1990年5月15日");
        assert_eq!(record.basic_info["lunar_date"], "1990年4月21日");
        assert_eq!(record.basic_info["life_palace"], "戊寅");
        assert_eq!(record.basic_info["taiyuan"], "辛未");
        assert_eq!(record.basic_info["body_palace"], "甲申");
        assert_eq!(record.basic_info["立夏_time"], "5月6日 03:35");
        assert!(record.basic_info.contains_key("solar_terms"));

        assert_eq!(record.four_pillars, pillars("庚午", "辛巳", "庚辰", "癸未"));

        let elements = &record.five_elements;
        assert_eq!(elements.status["金"], "旺");
        assert_eq!(elements.scores["火"], 45);
        assert_eq!(elements.strength, Some(45));
        assert_eq!(elements.middle_value, Some(50));
        assert_eq!(elements.strong_root.as_deref(), Some("午"));
        assert_eq!(elements.humidity_range.as_deref(), Some("-6,6"));
        assert_eq!(elements.humidity_score, Some(-2));
        assert_eq!(elements.weak, Some(false));

        let analysis = &record.analysis;
        assert_eq!(
            analysis.ten_gods,
            Some(vec!["才".to_string(), "杀".to_string(), "--".to_string(), "伤".to_string()])
        );
        assert_eq!(analysis.spiritual_stars.len(), 4);
        let patterns = analysis.patterns.as_ref().unwrap();
        assert_eq!(patterns.primary_pattern, "正官格");
        assert_eq!(
            analysis.seasonal_adjustment.as_ref().unwrap().adjustment_gods,
            vec!['壬', '丙', '戊', '丁']
        );
        assert_eq!(
            analysis.jinbuhuan_seasonal.as_ref().unwrap().adjustment_gods,
            vec!['癸']
        );
        let ages: Vec<_> = analysis.luck_cycles.iter().map(|c| c.start_age).collect();
        assert_eq!(ages, vec![4, 14, 24]);
        assert_eq!(analysis.luck_cycles[1].pillar, "己卯");
        assert_eq!(analysis.luck_cycles[0].nayin, "白蜡金");
        assert_eq!(analysis.luck_cycles[0].ten_god, "比");

        assert_eq!(record.raw_output, SAMPLE_REPORT);
    }

    #[test]
    fn test_overlapping_solar_terms_keep_record() {
        let record = parse_report("四柱：甲子 乙丑 丙寅 丁卯\n从立冬至小寒 12:00\n格局选用:正官格；佳\n").unwrap();
        assert_eq!(record.four_pillars, pillars("甲子", "乙丑", "丙寅", "丁卯"));
        assert_eq!(record.basic_info.get("小寒_time").map(String::as_str), Some("12:00"));
        assert_eq!(record.analysis.patterns.unwrap().primary_pattern, "正官格");
    }

    #[test]
    fn test_empty_report_yields_empty_record() {
        let record = parse_report("").unwrap();
        assert!(record.basic_info.is_empty());
        assert!(record.four_pillars.is_none());
        assert_eq!(record.raw_output, "");
    }

    #[test]
    fn test_panic_becomes_parse_error_with_raw_text() {
        let mut registry = extractors::default_registry();
        registry.push(Box::new(PanickingExtractor));
        let parser = ReportParser::with_extractors(registry);

        let raw = "四柱：甲子 乙丑 丙寅 丁卯\nboom\n";
        let err = parser.parse(raw).unwrap_err();
        assert_eq!(err.raw_output, raw);
        assert!(err.message.contains("boom"));
    }

    #[test]
    fn test_parses_are_independent() {
        let parser = ReportParser::new();
        let first = parser.parse("强弱:20").unwrap();
        let second = parser.parse("中值50").unwrap();
        assert_eq!(first.five_elements.weak, Some(true));
        assert_eq!(second.five_elements.strength, None);
    }
}
