//! Decision-support advisory generation
//!
//! Turns a season and its estimated total yield into a structured report:
//! yield classification, care recommendations, warnings, a profit estimate
//! and a growth-stage schedule. Monetary arithmetic uses `Decimal`;
//! amounts are emitted as thousands-separated VND strings.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::estimate::round2;
use crate::models::Season;

/// Farm-gate price per kilogram in VND, looked up by normalized crop.
const CROP_PRICES: &[(&str, i64)] = &[
    ("lúa", 7_000),
    ("ngô", 6_000),
    ("cà phê", 45_000),
    ("cao su", 35_000),
    ("chè", 25_000),
    ("tiêu", 80_000),
    ("điều", 30_000),
    ("mía", 1_000),
    ("lạc", 20_000),
    ("đậu tương", 15_000),
];

const DEFAULT_PRICE_PER_KG: i64 = 10_000;

/// Production cost per hectare in VND.
const COST_PER_HA: &[(&str, i64)] = &[
    ("lúa", 15_000_000),
    ("ngô", 18_000_000),
    ("cà phê", 25_000_000),
    ("cao su", 15_000_000),
    ("chè", 20_000_000),
];

const DEFAULT_COST_PER_HA: i64 = 15_000_000;

/// Structured advisory report for a single season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryReport {
    pub yield_per_ha: f64,
    pub yield_category: String,
    /// Presentation hints carried as opaque style tags.
    pub yield_color: String,
    pub yield_bg: String,
    pub crop_recommendations: Vec<String>,
    pub general_recommendations: Vec<String>,
    pub warnings: Vec<String>,
    pub estimated_revenue: String,
    pub estimated_profit: String,
    pub cost: String,
    pub growth_stages: Vec<GrowthStage>,
    pub profit_margin: f64,
    pub price_per_kg: String,
}

/// One entry of the fixed growth-stage schedule. The schedule is a
/// presentation template, not a timeline computed from the season dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthStage {
    pub stage: String,
    pub progress: u8,
    pub tasks: Vec<String>,
}

/// Generate the advisory report for a season given its estimated total
/// yield in tons. Returns `None` when the inputs do not permit a report.
pub fn generate_advisory(season: &Season, total_yield: f64) -> Option<AdvisoryReport> {
    if !total_yield.is_finite() || !season.area.is_finite() {
        return None;
    }

    let crop = season.normalized_crop();
    let area = season.area;

    let yield_per_ha = if area > 0.0 { total_yield / area } else { 0.0 };
    let (category, color, bg) = classify_yield(yield_per_ha);

    let mut warnings = Vec::new();
    let fertilizer = season.fertilizer.as_deref().unwrap_or("").trim();
    if fertilizer.is_empty() || fertilizer.to_lowercase().contains("không") {
        warnings.push("Chưa sử dụng phân bón - có thể ảnh hưởng năng suất".to_string());
    }

    let price_per_kg = crop_price(&crop);
    let revenue = Decimal::from_f64(total_yield)?
        * Decimal::from(1_000)
        * Decimal::from(price_per_kg);
    let cost = Decimal::from(cost_per_hectare(&crop)) * Decimal::from_f64(area)?;
    let profit = revenue - cost;
    let profit_margin = if revenue > Decimal::ZERO {
        (profit / revenue * Decimal::from(100))
            .round_dp(1)
            .to_f64()
            .unwrap_or(0.0)
    } else {
        0.0
    };

    Some(AdvisoryReport {
        yield_per_ha: round2(yield_per_ha),
        yield_category: category.to_string(),
        yield_color: color.to_string(),
        yield_bg: bg.to_string(),
        crop_recommendations: crop_recommendations(&crop)
            .unwrap_or_else(general_recommendations),
        general_recommendations: general_recommendations(),
        warnings,
        estimated_revenue: format_thousands(revenue),
        estimated_profit: format_thousands(profit),
        cost: format_thousands(cost),
        growth_stages: growth_stage_template(),
        profit_margin,
        price_per_kg: format_thousands(Decimal::from(price_per_kg)),
    })
}

/// Classify per-hectare yield into a band with its style tags.
fn classify_yield(yield_per_ha: f64) -> (&'static str, &'static str, &'static str) {
    if yield_per_ha >= 6.0 {
        ("Rất cao", "text-green-600", "bg-green-100")
    } else if yield_per_ha >= 4.0 {
        ("Cao", "text-green-500", "bg-green-50")
    } else if yield_per_ha >= 2.0 {
        ("Trung bình", "text-yellow-600", "bg-yellow-50")
    } else {
        ("Thấp", "text-red-600", "bg-red-50")
    }
}

fn crop_price(crop: &str) -> i64 {
    CROP_PRICES
        .iter()
        .find(|(name, _)| *name == crop)
        .map(|(_, price)| *price)
        .unwrap_or(DEFAULT_PRICE_PER_KG)
}

fn cost_per_hectare(crop: &str) -> i64 {
    COST_PER_HA
        .iter()
        .find(|(name, _)| *name == crop)
        .map(|(_, cost)| *cost)
        .unwrap_or(DEFAULT_COST_PER_HA)
}

/// Care recommendations for the crops we cover explicitly.
fn crop_recommendations(crop: &str) -> Option<Vec<String>> {
    let items: &[&str] = match crop {
        "lúa" => &[
            "Bón thúc đợt 1: 7-10 ngày sau sạ",
            "Duy trì mực nước 3-5cm trong giai đoạn đẻ nhánh",
            "Phòng trừ sâu bệnh: đạo ôn, rầy nâu",
            "Thu hoạch khi 85-90% hạt chín vàng",
        ],
        "ngô" => &[
            "Bón lót phân chuồng + lân trước khi gieo",
            "Tưới đủ ẩm giai đoạn trỗ cờ phun râu",
            "Phòng trừ sâu đục thân, bệnh khô vằn",
            "Thu hoạch khi hạt cứng, râu chuyển nâu",
        ],
        "cà phê" => &[
            "Tỉa cành tạo tán sau thu hoạch",
            "Tưới nước đầy đủ mùa khô",
            "Bón phân NPK cân đối theo giai đoạn",
            "Che bóng hợp lý tránh nắng gắt",
        ],
        _ => return None,
    };
    Some(items.iter().map(|s| s.to_string()).collect())
}

fn general_recommendations() -> Vec<String> {
    [
        "Theo dõi thời tiết thường xuyên để điều chỉnh lịch chăm sóc",
        "Kiểm tra độ ẩm đất trước khi tưới nước",
        "Thăm đồng thường xuyên để phát hiện sâu bệnh sớm",
        "Ghi chép nhật ký đồng ruộng để cải thiện vụ sau",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn growth_stage_template() -> Vec<GrowthStage> {
    [
        ("Gieo trồng", 100, &["Làm đất", "Gieo hạt"][..]),
        ("Phát triển", 65, &["Bón thúc", "Tưới nước"][..]),
        ("Ra hoa", 30, &["Bón phân", "Phun thuốc"][..]),
        ("Thu hoạch", 0, &["Chuẩn bị thu", "Bảo quản"][..]),
    ]
    .iter()
    .map(|(stage, progress, tasks)| GrowthStage {
        stage: stage.to_string(),
        progress: *progress,
        tasks: tasks.iter().map(|t| t.to_string()).collect(),
    })
    .collect()
}

/// Format a monetary amount as a thousands-separated integer string.
pub fn format_thousands(amount: Decimal) -> String {
    let rounded = amount.round();
    let text = rounded.normalize().to_string();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("{}{}", sign, out)
}
