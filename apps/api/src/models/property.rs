use serde::{Deserialize, Serialize};

/// Listing availability. Translated to a display label only when drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyStatus {
    #[default]
    Available,
    Sold,
}

impl PropertyStatus {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "AVAILABLE" => Some(Self::Available),
            "SOLD" => Some(Self::Sold),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marketer {
    pub name: String,
    pub role: String,
}

/// A listing that passed validation. Consumed once by the brochure assembler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub currency: String,
    #[serde(rename = "type")]
    pub property_type: String,
    pub status: PropertyStatus,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub parking: u32,
    pub area: f64,
    pub location: String,
    pub city: String,
    pub country: String,
    /// Never empty: the first image is the cover, the rest form the gallery.
    pub images: Vec<String>,
    pub features: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i32>,
    pub contact_info: String,
    pub company_logos: Vec<String>,
    pub marketer: Marketer,
}

impl PropertyRecord {
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    pub fn gallery_images(&self) -> &[String] {
        self.images.get(1..).unwrap_or(&[])
    }

    pub fn has_gallery(&self) -> bool {
        self.images.len() > 1
    }
}

/// The demo listing served by `/sample-property` and `/generate-sample-pdf`.
pub fn sample_property() -> PropertyRecord {
    PropertyRecord {
        title: "فيلا فاخرة بأبحر الشمالية".to_string(),
        description: "فرصة استثنائية لاقتناء فيلا فريدة من نوعها، مبنية بأعلى معايير الجودة والتصميم، \
                      مؤثثة بالكامل بأثاث فاخر، وتقع على زاوية شارعين عرض 16م، في قلب أبحر الشمالية."
            .to_string(),
        price: 174_147_140.0,
        currency: "ريال".to_string(),
        property_type: "فيلا".to_string(),
        status: PropertyStatus::Available,
        bedrooms: 5,
        bathrooms: 6,
        parking: 3,
        area: 625.5,
        location: "أبحر الشمالية".to_string(),
        city: "جدة".to_string(),
        country: "السعودية".to_string(),
        images: vec![
            "https://images.unsplash.com/photo-1600596542815-ffad4c1539a9?auto=format&fit=crop&w=1000&q=80".to_string(),
            "https://images.unsplash.com/photo-1600607687939-ce8a6c25118c?auto=format&fit=crop&w=1000&q=80".to_string(),
        ],
        features: vec![
            "تكييف مركزي".to_string(),
            "حديقة".to_string(),
            "مسبح".to_string(),
            "مرآب".to_string(),
        ],
        year_built: Some(2023),
        contact_info: "+966 50 123 4567".to_string(),
        company_logos: vec![],
        marketer: Marketer {
            name: "أحمد منصور".to_string(),
            role: "مسوق عقاري".to_string(),
        },
    }
}
