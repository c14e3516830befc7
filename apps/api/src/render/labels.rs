//! Display strings drawn on the brochure, and the formatting that turns record
//! values into them.

use crate::models::property::{PropertyRecord, PropertyStatus};

pub const COVER_TITLE: &str = "عرض عقاري";
pub const DETAILS_TITLE: &str = "تفاصيل العقار";
pub const GALLERY_TITLE: &str = "معرض الصور";

pub const DESCRIPTION_HEADING: &str = "وصف العقار:";
pub const FEATURES_HEADING: &str = "المميزات الرئيسية:";
pub const CONTACT_HEADING: &str = "معلومات التواصل:";
pub const GALLERY_HEADING: &str = "صور العقار:";

pub const CONTACT_LABEL: &str = "رقم الجوال";
pub const CONTACT_MISSING: &str = "غير متوفر";
pub const CONTINUED_MARKER: &str = "... والمزيد";
pub const CLIP_MARKER: &str = "...";
pub const FEATURE_BULLET: &str = "•";
pub const VALUE_MISSING: &str = "-";

pub const AREA_LABEL: &str = "المساحة";
pub const AREA_UNIT: &str = "م²";
pub const BEDROOMS_LABEL: &str = "الغرف";
pub const BATHROOMS_LABEL: &str = "الحمامات";
pub const PARKING_LABEL: &str = "مواقف السيارات";
pub const YEAR_BUILT_LABEL: &str = "سنة البناء";
pub const TYPE_LABEL: &str = "نوع العقار";

pub fn status_label(status: PropertyStatus) -> &'static str {
    match status {
        PropertyStatus::Available => "متاح",
        PropertyStatus::Sold => "مباع",
    }
}

pub fn file_number_label(number: u32) -> String {
    format!("ملف رقم: {number}")
}

pub fn generated_on_label(date: &str) -> String {
    format!("تم إنشاء العرض في {date}")
}

pub fn gallery_page_label(page: usize, total: usize) -> String {
    format!("صفحة صور {page}/{total}")
}

/// One detail card on the cover page.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailCard {
    pub label: &'static str,
    pub value: String,
}

/// The six cover cards, in drawing order.
pub fn detail_cards(property: &PropertyRecord) -> Vec<DetailCard> {
    vec![
        DetailCard {
            label: AREA_LABEL,
            value: format!("{} {AREA_UNIT}", format_number(property.area)),
        },
        DetailCard {
            label: BEDROOMS_LABEL,
            value: property.bedrooms.to_string(),
        },
        DetailCard {
            label: BATHROOMS_LABEL,
            value: property.bathrooms.to_string(),
        },
        DetailCard {
            label: PARKING_LABEL,
            value: property.parking.to_string(),
        },
        DetailCard {
            label: YEAR_BUILT_LABEL,
            value: property
                .year_built
                .map(|y| y.to_string())
                .unwrap_or_else(|| VALUE_MISSING.to_string()),
        },
        DetailCard {
            label: TYPE_LABEL,
            value: property.property_type.clone(),
        },
    ]
}

pub fn price_text(property: &PropertyRecord) -> String {
    format!("{} {}", format_grouped(property.price), property.currency)
}

pub fn location_text(property: &PropertyRecord) -> String {
    format!(
        "{}, {}, {}",
        property.location, property.city, property.country
    )
}

/// Drops a trailing `.0` so whole numbers print as integers.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        let formatted = format!("{value:.2}");
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

/// Thousands-separated with up to two decimals: `174147140.5` → `174,147,140.5`.
pub fn format_grouped(value: f64) -> String {
    let formatted = format_number(value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (formatted.clone(), None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}
