// src/ingest/duration.rs
use once_cell::sync::OnceCell;
use regex::Regex;

/// Parse compact duration notation (`PT1H2M3S`, `PT45S`, `PT3M`) into seconds.
/// Each component is optional; missing or unparsable groups count as 0, and
/// text without any recognizable component yields 0.
pub fn parse_duration(text: &str) -> u64 {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").unwrap());

    let Some(caps) = re.captures(text) else {
        return 0;
    };
    let group = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };

    group(1)
        .saturating_mul(3600)
        .saturating_add(group(2).saturating_mul(60))
        .saturating_add(group(3))
}
