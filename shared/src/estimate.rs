//! Heuristic yield estimation
//!
//! Combines crop, growth duration, fertilizer and province into a single
//! estimated total yield. All adjustments are multiplicative scalar
//! factors, so their order does not matter; the lookup tables are ordered
//! slices because the fertilizer and region matches are
//! first-substring-wins.

use chrono::NaiveDate;

use crate::models::Season;

/// Reference yield in tons per hectare by crop.
const BASE_YIELDS: &[(&str, f64)] = &[
    ("lúa", 5.5),
    ("ngô", 4.8),
    ("hoa hướng dương", 2.5),
    ("cà phê", 2.2),
    ("cao su", 1.8),
    ("chè", 3.2),
    ("tiêu", 3.0),
    ("điều", 1.5),
    ("mía", 60.0),
    ("lạc", 2.2),
    ("đậu tương", 2.0),
];

/// Base yield for a crop not present in the table.
const DEFAULT_BASE_YIELD: f64 = 4.0;

/// Growth duration assumed when either date is missing or malformed.
const DEFAULT_GROWTH_DAYS: i64 = 90;

/// Computed growth durations are clamped into this range; the default of
/// 90 days is applied as-is and lands in the 0.9 factor bucket.
const MIN_GROWTH_DAYS: i64 = 60;
const MAX_GROWTH_DAYS: i64 = 180;

/// Fertilizer adjustment, scanned in order against the lower-cased
/// fertilizer text; the first substring match wins.
const FERTILIZER_FACTORS: &[(&str, f64)] = &[
    ("hữu cơ", 1.2),
    ("vô cơ", 1.1),
    ("npk", 1.15),
    ("phân chuồng", 1.18),
    ("không", 0.8),
];

/// Province adjustment, scanned in order against the lower-cased,
/// trimmed province text; the first substring match wins.
const REGION_FACTORS: &[(&str, f64)] = &[
    ("an giang", 1.3),
    ("đồng tháp", 1.25),
    ("long an", 1.2),
    ("hà nội", 1.1),
    ("bắc ninh", 1.05),
    ("hưng yên", 1.05),
    ("đắk lắk", 1.0),
    ("đắk nông", 0.95),
    ("gia lai", 0.95),
    ("bắc kạn", 0.9),
    ("cao bằng", 0.85),
    ("hà giang", 0.85),
];

/// Estimate the total yield for a season, in tons, rounded to two
/// decimal places.
///
/// Returns `None` when no estimate can be produced. An area of zero is a
/// valid input and yields 0.0 tons; callers deciding whether to persist
/// an estimate must treat `area <= 0` specially.
pub fn estimate_total_yield(season: &Season) -> Option<f64> {
    if !season.area.is_finite() {
        return None;
    }

    let base = base_yield(&season.crop);
    let growth = growth_factor(growth_days(
        season.sow_date.as_deref(),
        season.harvest_date.as_deref(),
    ));
    let fertilizer = fertilizer_factor(season.fertilizer.as_deref().unwrap_or(""));
    let region = region_factor(&season.province);

    let total = base * growth * fertilizer * region * season.area;
    if total.is_finite() {
        Some(round2(total))
    } else {
        None
    }
}

/// Reference tons/hectare for a crop name as entered.
pub fn base_yield(crop: &str) -> f64 {
    let crop = crop.trim().to_lowercase();
    BASE_YIELDS
        .iter()
        .find(|(name, _)| *name == crop)
        .map(|(_, tons)| *tons)
        .unwrap_or(DEFAULT_BASE_YIELD)
}

/// Growth duration in days. Both dates must parse as `YYYY-MM-DD` for the
/// computed span to be used; the span is clamped to [60, 180].
fn growth_days(sow_date: Option<&str>, harvest_date: Option<&str>) -> i64 {
    let (Some(sow), Some(harvest)) = (sow_date, harvest_date) else {
        return DEFAULT_GROWTH_DAYS;
    };
    match (
        NaiveDate::parse_from_str(sow, "%Y-%m-%d"),
        NaiveDate::parse_from_str(harvest, "%Y-%m-%d"),
    ) {
        (Ok(sow), Ok(harvest)) => (harvest - sow)
            .num_days()
            .clamp(MIN_GROWTH_DAYS, MAX_GROWTH_DAYS),
        _ => DEFAULT_GROWTH_DAYS,
    }
}

fn growth_factor(days: i64) -> f64 {
    if days < 80 {
        0.7
    } else if days < 100 {
        0.9
    } else if days < 120 {
        1.0
    } else if days < 150 {
        1.1
    } else {
        1.2
    }
}

fn fertilizer_factor(fertilizer: &str) -> f64 {
    let fertilizer = fertilizer.trim().to_lowercase();
    FERTILIZER_FACTORS
        .iter()
        .find(|(pattern, _)| fertilizer.contains(pattern))
        .map(|(_, factor)| *factor)
        .unwrap_or(1.0)
}

fn region_factor(province: &str) -> f64 {
    let province = province.trim().to_lowercase();
    REGION_FACTORS
        .iter()
        .find(|(pattern, _)| province.contains(pattern))
        .map(|(_, factor)| *factor)
        .unwrap_or(1.0)
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn season(crop: &str, area: f64) -> Season {
        Season {
            id: "s1".to_string(),
            farmer_name: "Nguyễn Văn A".to_string(),
            province: String::new(),
            crop: crop.to_string(),
            area,
            sow_date: None,
            harvest_date: None,
            fertilizer: None,
            notes: None,
            created_at: Utc::now(),
            user: "tester".to_string(),
            actual_yield: None,
            yield_calculated_at: None,
            yield_source: None,
        }
    }

    #[test]
    fn flat_inputs_use_base_yield_and_default_duration() {
        // No dates: 90-day default, which sits in the 0.9 bucket.
        let estimate = estimate_total_yield(&season("lúa", 2.0));
        assert_eq!(estimate, Some(9.9));
    }

    #[test]
    fn unknown_crop_falls_back_to_default_base() {
        let estimate = estimate_total_yield(&season("thanh long", 1.0));
        assert_eq!(estimate, Some(3.6)); // 4.0 × 0.9
    }

    #[test]
    fn zero_area_estimates_zero_tons() {
        let estimate = estimate_total_yield(&season("lúa", 0.0));
        assert_eq!(estimate, Some(0.0));
    }

    #[test]
    fn non_finite_area_is_unavailable() {
        assert_eq!(estimate_total_yield(&season("lúa", f64::NAN)), None);
        assert_eq!(estimate_total_yield(&season("lúa", f64::INFINITY)), None);
    }

    #[test]
    fn short_span_clamps_to_sixty_days() {
        let mut s = season("lúa", 1.0);
        s.sow_date = Some("2024-01-01".to_string());
        s.harvest_date = Some("2024-01-05".to_string());
        // 4 days clamp to 60, not the 90-day default.
        assert_eq!(estimate_total_yield(&s), Some(3.85)); // 5.5 × 0.7
    }

    #[test]
    fn long_span_clamps_to_one_eighty_days() {
        let mut s = season("lúa", 1.0);
        s.sow_date = Some("2023-01-01".to_string());
        s.harvest_date = Some("2024-01-01".to_string());
        assert_eq!(estimate_total_yield(&s), Some(6.6)); // 5.5 × 1.2
    }

    #[test]
    fn harvest_before_sowing_clamps_to_floor() {
        let mut s = season("lúa", 1.0);
        s.sow_date = Some("2024-06-01".to_string());
        s.harvest_date = Some("2024-01-01".to_string());
        assert_eq!(estimate_total_yield(&s), Some(3.85)); // clamped to 60 → 0.7
    }

    #[test]
    fn malformed_dates_use_default_duration() {
        let mut s = season("lúa", 2.0);
        s.sow_date = Some("01/02/2024".to_string());
        s.harvest_date = Some("2024-06-01".to_string());
        assert_eq!(estimate_total_yield(&s), Some(9.9));
    }

    #[test]
    fn growth_factor_buckets() {
        assert_eq!(growth_factor(60), 0.7);
        assert_eq!(growth_factor(79), 0.7);
        assert_eq!(growth_factor(80), 0.9);
        assert_eq!(growth_factor(99), 0.9);
        assert_eq!(growth_factor(100), 1.0);
        assert_eq!(growth_factor(119), 1.0);
        assert_eq!(growth_factor(120), 1.1);
        assert_eq!(growth_factor(149), 1.1);
        assert_eq!(growth_factor(150), 1.2);
        assert_eq!(growth_factor(180), 1.2);
    }

    #[test]
    fn fertilizer_match_is_first_in_table_order() {
        // Contains both "hữu cơ" and (as a word) "phân"; the earlier
        // table entry wins.
        assert_eq!(fertilizer_factor("phân hữu cơ vi sinh"), 1.2);
        assert_eq!(fertilizer_factor("NPK 16-16-8"), 1.15);
        assert_eq!(fertilizer_factor("không bón"), 0.8);
        assert_eq!(fertilizer_factor("vôi bột"), 1.0);
        assert_eq!(fertilizer_factor(""), 1.0);
    }

    #[test]
    fn fertilizer_with_competing_patterns_prefers_table_order() {
        // "phân chuồng" also appears, but "hữu cơ" is listed first.
        assert_eq!(fertilizer_factor("hữu cơ trộn phân chuồng"), 1.2);
    }

    #[test]
    fn region_match_is_substring_and_case_insensitive() {
        assert_eq!(region_factor("Tỉnh An Giang"), 1.3);
        assert_eq!(region_factor("  đồng tháp  "), 1.25);
        assert_eq!(region_factor("Hà Giang"), 0.85);
        assert_eq!(region_factor("Quảng Ninh"), 1.0);
    }

    #[test]
    fn all_factors_compose_multiplicatively() {
        let mut s = season("lúa", 2.0);
        s.province = "An Giang".to_string();
        s.fertilizer = Some("NPK".to_string());
        s.sow_date = Some("2024-01-01".to_string());
        s.harvest_date = Some("2024-05-01".to_string());
        // 121 days → 1.1; 5.5 × 1.1 × 1.15 × 1.3 × 2 = 18.0895 → 18.09
        assert_eq!(estimate_total_yield(&s), Some(18.09));
    }

    #[test]
    fn estimate_rounds_to_two_decimals() {
        let mut s = season("cà phê", 1.7);
        s.province = "Đắk Nông".to_string();
        // 2.2 × 0.9 × 1.0 × 0.95 × 1.7 = 3.19770 → 3.2
        assert_eq!(estimate_total_yield(&s), Some(3.2));
    }
}
