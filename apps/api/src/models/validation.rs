//! Listing validation: turns an untyped JSON body into a [`PropertyRecord`].
//!
//! Every field is checked and every failure is collected, so the caller gets the full
//! list of localized (Arabic) messages in one response. Missing optional fields take
//! their defaults:
//! - `currency` → `SAR`, `country` → `السعودية`, `status` → `AVAILABLE`
//! - `bedrooms`, `bathrooms`, `parking` → 0
//! - `features`, `companyLogos` → empty

use chrono::Datelike;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::property::{Marketer, PropertyRecord, PropertyStatus};

pub const DEFAULT_CURRENCY: &str = "SAR";
pub const DEFAULT_COUNTRY: &str = "السعودية";
pub const MIN_YEAR_BUILT: i64 = 1800;

// ────────────────────────────────────────────────────────────────────────────
// Error types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Error)]
#[error("validation failed with {} error(s)", .0.len())]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(|e| e.message.clone()).collect()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Per-field messages
// ────────────────────────────────────────────────────────────────────────────

/// Localized messages for one field. `base` covers wrong types, `min` covers range.
struct Messages {
    required: &'static str,
    base: &'static str,
    min: &'static str,
}

const TITLE: Messages = Messages {
    required: "عنوان العقار مطلوب",
    base: "يجب أن يكون عنوان العقار نصاً",
    min: "",
};
const DESCRIPTION: Messages = Messages {
    required: "وصف العقار مطلوب",
    base: "يجب أن يكون وصف العقار نصاً",
    min: "",
};
const PRICE: Messages = Messages {
    required: "السعر مطلوب",
    base: "يجب أن يكون السعر رقم",
    min: "يجب أن يكون السعر أكبر من أو يساوي الصفر",
};
const PROPERTY_TYPE: Messages = Messages {
    required: "نوع العقار مطلوب",
    base: "يجب أن يكون نوع العقار نصاً",
    min: "",
};
const AREA: Messages = Messages {
    required: "المساحة مطلوبة",
    base: "يجب أن تكون المساحة رقم",
    min: "يجب أن تكون المساحة أكبر من أو تساوي الصفر",
};
const LOCATION: Messages = Messages {
    required: "الموقع مطلوب",
    base: "يجب أن يكون الموقع نصاً",
    min: "",
};
const CITY: Messages = Messages {
    required: "المدينة مطلوبة",
    base: "يجب أن تكون المدينة نصاً",
    min: "",
};
const CONTACT_INFO: Messages = Messages {
    required: "معلومات التواصل مطلوبة",
    base: "يجب أن تكون معلومات التواصل نصاً",
    min: "",
};
const MARKETER_NAME: Messages = Messages {
    required: "اسم المسوق مطلوب",
    base: "يجب أن يكون اسم المسوق نصاً",
    min: "",
};
const MARKETER_ROLE: Messages = Messages {
    required: "دور المسوق مطلوب",
    base: "يجب أن يكون دور المسوق نصاً",
    min: "",
};
const BEDROOMS: Messages = Messages {
    required: "",
    base: "يجب أن يكون عدد الغرف رقماً صحيحاً",
    min: "يجب أن يكون عدد الغرف أكبر من أو يساوي الصفر",
};
const BATHROOMS: Messages = Messages {
    required: "",
    base: "يجب أن يكون عدد الحمامات رقماً صحيحاً",
    min: "يجب أن يكون عدد الحمامات أكبر من أو يساوي الصفر",
};
const PARKING: Messages = Messages {
    required: "",
    base: "يجب أن يكون عدد مواقف السيارات رقماً صحيحاً",
    min: "يجب أن يكون عدد مواقف السيارات أكبر من أو يساوي الصفر",
};

const IMAGES_REQUIRED: &str = "الصور مطلوبة";
const IMAGES_BASE: &str = "يجب أن تكون الصور مصفوفة";
const IMAGES_MIN: &str = "يجب إضافة صورة واحدة على الأقل";
const MARKETER_REQUIRED: &str = "بيانات المسوق مطلوبة";
const STATUS_INVALID: &str = "حالة العقار يجب أن تكون SOLD أو AVAILABLE";
const BODY_NOT_OBJECT: &str = "يجب أن تكون بيانات العقار كائناً";

// ────────────────────────────────────────────────────────────────────────────
// Entry points
// ────────────────────────────────────────────────────────────────────────────

/// Validates a listing against the current calendar year.
pub fn validate_property(input: &Value) -> Result<PropertyRecord, ValidationErrors> {
    validate_property_at(input, chrono::Utc::now().year())
}

/// Validates a listing; `current_year` bounds `yearBuilt` from above.
pub fn validate_property_at(
    input: &Value,
    current_year: i32,
) -> Result<PropertyRecord, ValidationErrors> {
    let Some(obj) = input.as_object() else {
        return Err(ValidationErrors(vec![FieldError {
            field: "body".to_string(),
            message: BODY_NOT_OBJECT.to_string(),
        }]));
    };

    let mut v = Validator::new(obj, "");

    let title = v.required_string("title", &TITLE);
    let description = v.required_string("description", &DESCRIPTION);
    let price = v.required_number("price", &PRICE);
    let currency = v.optional_string("currency", DEFAULT_CURRENCY);
    let property_type = v.required_string("type", &PROPERTY_TYPE);
    let status = v.status("status");
    let bedrooms = v.count("bedrooms", &BEDROOMS);
    let bathrooms = v.count("bathrooms", &BATHROOMS);
    let parking = v.count("parking", &PARKING);
    let area = v.required_number("area", &AREA);
    let location = v.required_string("location", &LOCATION);
    let city = v.required_string("city", &CITY);
    let country = v.optional_string("country", DEFAULT_COUNTRY);
    let images = v.images("images");
    let features = v.string_list("features");
    let year_built = v.year_built("yearBuilt", current_year);
    let contact_info = v.required_string("contactInfo", &CONTACT_INFO);
    let company_logos = v.string_list("companyLogos");
    let marketer = v.marketer("marketer");

    if !v.errors.is_empty() {
        return Err(ValidationErrors(v.errors));
    }

    Ok(PropertyRecord {
        title,
        description,
        price,
        currency,
        property_type,
        status,
        bedrooms,
        bathrooms,
        parking,
        area,
        location,
        city,
        country,
        images,
        features,
        year_built,
        contact_info,
        company_logos,
        marketer,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Field validator
// ────────────────────────────────────────────────────────────────────────────

/// Walks one JSON object, returning placeholder values for bad fields and recording
/// an error for each. Callers check `errors` before trusting any returned value.
struct Validator<'a> {
    obj: &'a Map<String, Value>,
    prefix: &'static str,
    errors: Vec<FieldError>,
}

impl<'a> Validator<'a> {
    fn new(obj: &'a Map<String, Value>, prefix: &'static str) -> Self {
        Self {
            obj,
            prefix,
            errors: Vec::new(),
        }
    }

    fn fail(&mut self, key: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: format!("{}{key}", self.prefix),
            message: message.into(),
        });
    }

    /// Missing and explicit `null` are treated alike.
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.obj.get(key).filter(|v| !v.is_null())
    }

    fn required_string(&mut self, key: &str, messages: &Messages) -> String {
        match self.get(key) {
            None => {
                self.fail(key, messages.required);
                String::new()
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                self.fail(key, messages.required);
                String::new()
            }
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                self.fail(key, messages.base);
                String::new()
            }
        }
    }

    fn optional_string(&mut self, key: &str, default: &str) -> String {
        match self.get(key) {
            None => default.to_string(),
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(_) => {
                self.fail(key, format!("قيمة الحقل {key} غير صالحة"));
                default.to_string()
            }
        }
    }

    fn required_number(&mut self, key: &str, messages: &Messages) -> f64 {
        match self.get(key) {
            None => {
                self.fail(key, messages.required);
                0.0
            }
            Some(value) => match value.as_f64() {
                Some(n) if n < 0.0 => {
                    self.fail(key, messages.min);
                    0.0
                }
                Some(n) => n,
                None => {
                    self.fail(key, messages.base);
                    0.0
                }
            },
        }
    }

    /// Non-negative integer defaulting to 0.
    fn count(&mut self, key: &str, messages: &Messages) -> u32 {
        match self.get(key) {
            None => 0,
            Some(value) => match as_integer(value) {
                Some(n) if n < 0 => {
                    self.fail(key, messages.min);
                    0
                }
                Some(n) => match u32::try_from(n) {
                    Ok(count) => count,
                    Err(_) => {
                        self.fail(key, messages.base);
                        0
                    }
                },
                None => {
                    self.fail(key, messages.base);
                    0
                }
            },
        }
    }

    fn status(&mut self, key: &str) -> PropertyStatus {
        match self.get(key) {
            None => PropertyStatus::default(),
            Some(value) => match value.as_str().and_then(PropertyStatus::from_code) {
                Some(status) => status,
                None => {
                    self.fail(key, STATUS_INVALID);
                    PropertyStatus::default()
                }
            },
        }
    }

    fn year_built(&mut self, key: &str, current_year: i32) -> Option<i32> {
        let value = self.get(key)?;
        match as_integer(value) {
            Some(year) if (MIN_YEAR_BUILT..=i64::from(current_year)).contains(&year) => {
                i32::try_from(year).ok()
            }
            Some(_) => {
                self.fail(
                    key,
                    format!("يجب أن تكون سنة البناء بين {MIN_YEAR_BUILT} و {current_year}"),
                );
                None
            }
            None => {
                self.fail(key, "يجب أن تكون سنة البناء رقماً صحيحاً");
                None
            }
        }
    }

    fn images(&mut self, key: &str) -> Vec<String> {
        match self.get(key) {
            None => {
                self.fail(key, IMAGES_REQUIRED);
                Vec::new()
            }
            Some(Value::Array(items)) if items.is_empty() => {
                self.fail(key, IMAGES_MIN);
                Vec::new()
            }
            Some(Value::Array(items)) => self.collect_strings(key, items),
            Some(_) => {
                self.fail(key, IMAGES_BASE);
                Vec::new()
            }
        }
    }

    fn string_list(&mut self, key: &str) -> Vec<String> {
        match self.get(key) {
            None => Vec::new(),
            Some(Value::Array(items)) => self.collect_strings(key, items),
            Some(_) => {
                self.fail(key, format!("يجب أن يكون الحقل {key} مصفوفة"));
                Vec::new()
            }
        }
    }

    fn collect_strings(&mut self, key: &str, items: &[Value]) -> Vec<String> {
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match item.as_str() {
                Some(s) if !s.trim().is_empty() => out.push(s.to_string()),
                _ => self.fail(
                    &format!("{key}[{i}]"),
                    format!("العنصر رقم {} في الحقل {key} يجب أن يكون نصاً غير فارغ", i + 1),
                ),
            }
        }
        out
    }

    fn marketer(&mut self, key: &str) -> Marketer {
        let placeholder = Marketer {
            name: String::new(),
            role: String::new(),
        };
        let Some(value) = self.get(key) else {
            self.fail(key, MARKETER_REQUIRED);
            return placeholder;
        };
        let Some(obj) = value.as_object() else {
            self.fail(key, MARKETER_REQUIRED);
            return placeholder;
        };

        let mut nested = Validator::new(obj, "marketer.");
        let name = nested.required_string("name", &MARKETER_NAME);
        let role = nested.required_string("role", &MARKETER_ROLE);
        self.errors.append(&mut nested.errors);
        Marketer { name, role }
    }
}

/// Accepts JSON integers and integral floats (`3` and `3.0`).
fn as_integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    value
        .as_f64()
        .filter(|f| f.fract() == 0.0 && f.is_finite())
        .map(|f| f as i64)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_body() -> Value {
        json!({
            "title": "فيلا اختبارية",
            "description": "هذا وصف تجريبي لعقار فاخر.",
            "price": 1234567,
            "currency": "ريال",
            "type": "فيلا",
            "status": "AVAILABLE",
            "bedrooms": 4,
            "bathrooms": 3,
            "area": 350,
            "location": "حي النخيل",
            "city": "الرياض",
            "country": "السعودية",
            "images": ["https://example.com/a.jpg", "https://example.com/b.png"],
            "features": ["مسبح", "حديقة"],
            "yearBuilt": 2021,
            "parking": 2,
            "contactInfo": "+966 50 000 0000",
            "marketer": { "name": "سارة محمد", "role": "مسوقة عقارية" }
        })
    }

    #[test]
    fn test_valid_body_passes() {
        let record = validate_property_at(&valid_body(), 2025).unwrap();
        assert_eq!(record.title, "فيلا اختبارية");
        assert_eq!(record.bedrooms, 4);
        assert_eq!(record.images.len(), 2);
        assert_eq!(record.year_built, Some(2021));
        assert_eq!(record.status, PropertyStatus::Available);
    }

    #[test]
    fn test_empty_images_rejected() {
        let mut body = valid_body();
        body["images"] = json!([]);
        let err = validate_property_at(&body, 2025).unwrap_err();
        assert!(err.has_field("images"));
        assert!(err.messages().contains(&IMAGES_MIN.to_string()));
    }

    #[test]
    fn test_missing_images_rejected() {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove("images");
        let err = validate_property_at(&body, 2025).unwrap_err();
        assert!(err.messages().contains(&IMAGES_REQUIRED.to_string()));
    }

    #[test]
    fn test_defaults_applied() {
        let mut body = valid_body();
        let obj = body.as_object_mut().unwrap();
        for key in [
            "currency", "status", "bedrooms", "bathrooms", "parking", "country", "features",
            "yearBuilt",
        ] {
            obj.remove(key);
        }
        let record = validate_property_at(&body, 2025).unwrap();
        assert_eq!(record.currency, DEFAULT_CURRENCY);
        assert_eq!(record.country, DEFAULT_COUNTRY);
        assert_eq!(record.status, PropertyStatus::Available);
        assert_eq!(record.bedrooms, 0);
        assert_eq!(record.parking, 0);
        assert!(record.features.is_empty());
        assert!(record.company_logos.is_empty());
        assert_eq!(record.year_built, None);
    }

    #[test]
    fn test_negative_price_and_area() {
        let mut body = valid_body();
        body["price"] = json!(-1);
        body["area"] = json!(-5.5);
        let err = validate_property_at(&body, 2025).unwrap_err();
        let messages = err.messages();
        assert!(messages.contains(&PRICE.min.to_string()));
        assert!(messages.contains(&AREA.min.to_string()));
    }

    #[test]
    fn test_price_must_be_number() {
        let mut body = valid_body();
        body["price"] = json!("expensive");
        let err = validate_property_at(&body, 2025).unwrap_err();
        assert_eq!(err.messages(), vec![PRICE.base.to_string()]);
    }

    #[test]
    fn test_status_outside_enumeration() {
        let mut body = valid_body();
        body["status"] = json!("متاح");
        let err = validate_property_at(&body, 2025).unwrap_err();
        assert!(err.has_field("status"));
    }

    #[test]
    fn test_sold_status_parsed() {
        let mut body = valid_body();
        body["status"] = json!("SOLD");
        let record = validate_property_at(&body, 2025).unwrap();
        assert_eq!(record.status, PropertyStatus::Sold);
    }

    #[test]
    fn test_year_built_bounds() {
        for (year, ok) in [(1799, false), (1800, true), (2025, true), (2026, false)] {
            let mut body = valid_body();
            body["yearBuilt"] = json!(year);
            assert_eq!(validate_property_at(&body, 2025).is_ok(), ok, "year {year}");
        }
    }

    #[test]
    fn test_negative_rooms_rejected() {
        let mut body = valid_body();
        body["bedrooms"] = json!(-2);
        body["parking"] = json!(1.5);
        let err = validate_property_at(&body, 2025).unwrap_err();
        assert!(err.has_field("bedrooms"));
        assert!(err.has_field("parking"));
    }

    #[test]
    fn test_oversized_room_count_rejected() {
        let mut body = valid_body();
        body["bedrooms"] = json!(5_000_000_000u64);
        body["parking"] = json!(1e20);
        let err = validate_property_at(&body, 2025).unwrap_err();
        let messages = err.messages();
        assert!(messages.contains(&BEDROOMS.base.to_string()));
        assert!(messages.contains(&PARKING.base.to_string()));
    }

    #[test]
    fn test_integral_float_accepted_as_count() {
        let mut body = valid_body();
        body["bathrooms"] = json!(3.0);
        assert_eq!(validate_property_at(&body, 2025).unwrap().bathrooms, 3);
    }

    #[test]
    fn test_marketer_fields_required() {
        let mut body = valid_body();
        body["marketer"] = json!({ "name": "" });
        let err = validate_property_at(&body, 2025).unwrap_err();
        assert!(err.has_field("marketer.name"));
        assert!(err.has_field("marketer.role"));
        assert!(err.messages().contains(&MARKETER_NAME.required.to_string()));
    }

    #[test]
    fn test_missing_marketer() {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove("marketer");
        let err = validate_property_at(&body, 2025).unwrap_err();
        assert_eq!(err.messages(), vec![MARKETER_REQUIRED.to_string()]);
    }

    #[test]
    fn test_all_errors_collected() {
        let err = validate_property_at(&json!({}), 2025).unwrap_err();
        // title, description, price, type, area, location, city, images, contactInfo, marketer
        assert_eq!(err.0.len(), 10);
        assert!(err.messages().contains(&TITLE.required.to_string()));
    }

    #[test]
    fn test_non_object_body() {
        let err = validate_property_at(&json!([1, 2]), 2025).unwrap_err();
        assert_eq!(err.messages(), vec![BODY_NOT_OBJECT.to_string()]);
    }

    #[test]
    fn test_blank_image_entry_rejected() {
        let mut body = valid_body();
        body["images"] = json!(["a.jpg", "  "]);
        let err = validate_property_at(&body, 2025).unwrap_err();
        assert!(err.has_field("images[1]"));
    }
}
