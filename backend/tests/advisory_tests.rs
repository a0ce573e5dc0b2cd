//! Decision-support advisory property-based and unit tests
//!
//! Covers:
//! - Yield classification bands against per-hectare thresholds
//! - Zero-area handling (no division error, lowest band)
//! - Profit arithmetic and margin bounds
//! - Monetary string formatting

use chrono::Utc;
use proptest::prelude::*;
use shared::models::Season;
use shared::{format_thousands, generate_advisory};

fn season(crop: &str, area: f64, fertilizer: Option<&str>) -> Season {
    Season {
        id: "test".to_string(),
        farmer_name: "Nông dân".to_string(),
        province: "Long An".to_string(),
        crop: crop.to_string(),
        area,
        sow_date: None,
        harvest_date: None,
        fertilizer: fertilizer.map(|f| f.to_string()),
        notes: None,
        created_at: Utc::now(),
        user: "tester".to_string(),
        actual_yield: None,
        yield_calculated_at: None,
        yield_source: None,
    }
}

fn total_yield_strategy() -> impl Strategy<Value = f64> {
    (0u32..=100_000).prop_map(|n| n as f64 / 100.0) // 0.00 to 1000.00 tons
}

fn area_strategy() -> impl Strategy<Value = f64> {
    (1u32..=10_000).prop_map(|n| n as f64 / 10.0) // 0.1 to 1000.0 ha
}

proptest! {
    /// The reported category always matches the per-hectare thresholds.
    #[test]
    fn category_matches_per_hectare_thresholds(
        total in total_yield_strategy(),
        area in area_strategy(),
    ) {
        let report = generate_advisory(&season("lúa", area, Some("NPK")), total).unwrap();
        let per_ha = total / area;
        let expected = if per_ha >= 6.0 {
            "Rất cao"
        } else if per_ha >= 4.0 {
            "Cao"
        } else if per_ha >= 2.0 {
            "Trung bình"
        } else {
            "Thấp"
        };
        prop_assert_eq!(report.yield_category, expected);
    }

    /// Profit margin never exceeds 100% and is zero without revenue.
    #[test]
    fn profit_margin_is_bounded(
        total in total_yield_strategy(),
        area in area_strategy(),
    ) {
        let report = generate_advisory(&season("cà phê", area, Some("NPK")), total).unwrap();
        prop_assert!(report.profit_margin <= 100.0);
        if total == 0.0 {
            prop_assert_eq!(report.profit_margin, 0.0);
        }
    }

    /// Monetary strings contain only digits, separators and a sign, with
    /// groups of three between separators.
    #[test]
    fn monetary_formatting_is_well_formed(amount in -1_000_000_000i64..=1_000_000_000) {
        let text = format_thousands(rust_decimal::Decimal::from(amount));
        let unsigned = text.strip_prefix('-').unwrap_or(&text);
        for group in unsigned.split(',') {
            prop_assert!(!group.is_empty() && group.len() <= 3);
            prop_assert!(group.chars().all(|c| c.is_ascii_digit()));
        }
        let rejoined: String = unsigned.chars().filter(|c| *c != ',').collect();
        prop_assert_eq!(rejoined, amount.abs().to_string());
    }

    /// The advisory always carries the four-stage schedule and the
    /// four general recommendations, whatever the inputs.
    #[test]
    fn report_shape_is_stable(
        total in total_yield_strategy(),
        area in area_strategy(),
    ) {
        let report = generate_advisory(&season("điều", area, Some("NPK")), total).unwrap();
        prop_assert_eq!(report.growth_stages.len(), 4);
        prop_assert_eq!(report.general_recommendations.len(), 4);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn zero_area_never_divides() {
    let report = generate_advisory(&season("lúa", 0.0, Some("NPK")), 12.0).unwrap();
    assert_eq!(report.yield_per_ha, 0.0);
    assert_eq!(report.yield_category, "Thấp");
}

#[test]
fn fertilizer_warning_matches_the_none_pattern() {
    let with_none = generate_advisory(&season("lúa", 1.0, Some("không")), 5.0).unwrap();
    assert_eq!(with_none.warnings.len(), 1);

    let with_empty = generate_advisory(&season("lúa", 1.0, None), 5.0).unwrap();
    assert_eq!(with_empty.warnings.len(), 1);

    let with_fertilizer = generate_advisory(&season("lúa", 1.0, Some("phân chuồng")), 5.0).unwrap();
    assert!(with_fertilizer.warnings.is_empty());
}

#[test]
fn rice_profit_for_two_hectares() {
    // 19.8 t × 1000 kg × 7,000 = 138,600,000 revenue;
    // cost 15,000,000 × 2 = 30,000,000; profit 108,600,000.
    let report = generate_advisory(&season("lúa", 2.0, Some("NPK")), 19.8).unwrap();
    assert_eq!(report.estimated_revenue, "138,600,000");
    assert_eq!(report.cost, "30,000,000");
    assert_eq!(report.estimated_profit, "108,600,000");
}

#[test]
fn non_finite_inputs_are_unavailable() {
    assert!(generate_advisory(&season("lúa", 1.0, None), f64::NAN).is_none());
    assert!(generate_advisory(&season("lúa", f64::NAN, None), 5.0).is_none());
}
