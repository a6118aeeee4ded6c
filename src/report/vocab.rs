//! Fixed vocabularies recognised in engine reports.

/// Heavenly stems, in canonical order.
pub const STEMS: [char; 10] = ['甲', '乙', '丙', '丁', '戊', '己', '庚', '辛', '壬', '癸'];

/// Earthly branches, in canonical order.
pub const BRANCHES: [char; 12] = [
    '子', '丑', '寅', '卯', '辰', '巳', '午', '未', '申', '酉', '戌', '亥',
];

/// Five-element symbols.
pub const ELEMENTS: [char; 5] = ['金', '木', '水', '火', '土'];

/// Seasonal states an element can be in.
pub const ELEMENT_STATES: [char; 5] = ['旺', '相', '休', '囚', '死'];

/// Placeholder the engine prints where a pillar has no ten-god relation.
pub const TEN_GOD_NONE: &str = "--";

/// Ten-god tokens: the ten abbreviations, day-master marks, the two
/// self-strength marks and the "none" placeholder.
pub const TEN_GODS: [&str; 16] = [
    "比", "劫", "食", "伤", "才", "财", "杀", "官", "枭", "印",
    "日主", "元男", "元女", "禄", "刃", TEN_GOD_NONE,
];

pub const SPIRITUAL_STARS: [&str; 15] = [
    "天乙", "驿马", "桃花", "华盖", "文昌", "天德", "月德", "劫煞",
    "亡神", "孤辰", "寡宿", "红艳", "将星", "大耗", "羊刃",
];

/// The twelve life stages, in cycle order.
pub const TWELVE_STAGES: [&str; 12] = [
    "长生", "沐浴", "冠带", "临官", "帝旺", "衰", "病", "死", "墓", "绝", "胎", "养",
];

/// Nayin sound elements, in sexagenary order (one per stem-branch pair).
pub const NAYIN: [&str; 30] = [
    "海中金", "炉中火", "大林木", "路旁土", "剑锋金", "山头火",
    "涧下水", "城头土", "白蜡金", "杨柳木", "泉中水", "屋上土",
    "霹雳火", "松柏木", "长流水", "砂中金", "山下火", "平地木",
    "壁上土", "金箔金", "覆灯火", "天河水", "大驿土", "钗钏金",
    "桑柘木", "大溪水", "沙中土", "天上火", "石榴木", "大海水",
];

pub const SOLAR_TERMS: [&str; 24] = [
    "立春", "雨水", "惊蛰", "春分", "清明", "谷雨",
    "立夏", "小满", "芒种", "夏至", "小暑", "大暑",
    "立秋", "处暑", "白露", "秋分", "寒露", "霜降",
    "立冬", "小雪", "大雪", "冬至", "小寒", "大寒",
];

pub fn is_stem(c: char) -> bool {
    STEMS.contains(&c)
}

pub fn is_branch(c: char) -> bool {
    BRANCHES.contains(&c)
}

pub fn is_ten_god(token: &str) -> bool {
    TEN_GODS.contains(&token)
}

/// Returns true if `token` is exactly one stem followed by one branch.
pub fn is_pillar(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(s), Some(b), None) if is_stem(s) && is_branch(b)
    )
}

/// Regex character class matching any of `chars`, e.g. `[甲乙丙]`.
pub fn char_class(chars: &[char]) -> String {
    let mut class = String::from("[");
    class.extend(chars.iter().map(|c| regex::escape(&c.to_string())));
    class.push(']');
    class
}

/// Find the vocabulary entry that occurs earliest in `text`.
pub fn first_occurrence<'a>(text: &str, vocab: &[&'a str]) -> Option<&'a str> {
    vocab
        .iter()
        .filter_map(|name| text.find(name).map(|pos| (pos, *name)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, name)| name)
}
