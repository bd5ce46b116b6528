//! Request and response contracts for the companies API.

use crate::db::models::{Company, CompanyChanges, NewCompany};
use crate::error::{FieldError, GeoError};
use serde::{Deserialize, Serialize, Serializer};

pub const NAME_MAX_LEN: usize = 255;
pub const INDUSTRY_MAX_LEN: usize = 255;
pub const LOCATION_MAX_LEN: usize = 500;
pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

pub const DEFAULT_SKIP: i64 = 0;
pub const DEFAULT_LIMIT: i64 = 100;

/// Field constraints checked after deserialization and before any storage access.
pub trait Validate {
    fn validate(&self) -> Result<(), GeoError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyCreate {
    pub name: String,
    pub industry: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Validate for CompanyCreate {
    fn validate(&self) -> Result<(), GeoError> {
        let mut errors = Vec::new();
        check_text(&mut errors, "name", &self.name, NAME_MAX_LEN);
        check_text(&mut errors, "industry", &self.industry, INDUSTRY_MAX_LEN);
        check_text(&mut errors, "location", &self.location, LOCATION_MAX_LEN);
        check_range(&mut errors, "latitude", self.latitude, LATITUDE_RANGE);
        check_range(&mut errors, "longitude", self.longitude, LONGITUDE_RANGE);
        into_result(errors)
    }
}

impl From<CompanyCreate> for NewCompany {
    fn from(c: CompanyCreate) -> Self {
        NewCompany::new(c.name, c.industry, c.location, c.latitude, c.longitude)
    }
}

/// Partial update: only the fields present in the body are checked and applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Validate for CompanyUpdate {
    fn validate(&self) -> Result<(), GeoError> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            check_text(&mut errors, "name", name, NAME_MAX_LEN);
        }
        if let Some(industry) = &self.industry {
            check_text(&mut errors, "industry", industry, INDUSTRY_MAX_LEN);
        }
        if let Some(location) = &self.location {
            check_text(&mut errors, "location", location, LOCATION_MAX_LEN);
        }
        if let Some(latitude) = self.latitude {
            check_range(&mut errors, "latitude", latitude, LATITUDE_RANGE);
        }
        if let Some(longitude) = self.longitude {
            check_range(&mut errors, "longitude", longitude, LONGITUDE_RANGE);
        }
        into_result(errors)
    }
}

impl From<CompanyUpdate> for CompanyChanges {
    fn from(u: CompanyUpdate) -> Self {
        CompanyChanges {
            name: u.name,
            industry: u.industry,
            location: u.location,
            latitude: u.latitude,
            longitude: u.longitude,
        }
    }
}

/// Company as returned to clients. Coordinates keep full precision in storage
/// and are rounded to 6 decimals (about 0.11 m) on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyResponse {
    pub id: i32,
    pub name: String,
    pub industry: String,
    pub location: String,
    #[serde(serialize_with = "round_coordinate")]
    pub latitude: f64,
    #[serde(serialize_with = "round_coordinate")]
    pub longitude: f64,
}

impl From<Company> for CompanyResponse {
    fn from(c: Company) -> Self {
        Self {
            id: c.id,
            name: c.name,
            industry: c.industry,
            location: c.location,
            latitude: c.latitude,
            longitude: c.longitude,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyListResponse {
    pub companies: Vec<CompanyResponse>,
    pub total: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_skip")]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            skip: DEFAULT_SKIP,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Validate for ListParams {
    fn validate(&self) -> Result<(), GeoError> {
        let mut errors = Vec::new();
        for (field, value) in [("skip", self.skip), ("limit", self.limit)] {
            if value < 0 {
                errors.push(FieldError::new(
                    &["query", field],
                    "Input should be greater than or equal to 0",
                    "greater_than_equal",
                ));
            }
        }
        into_result(errors)
    }
}

fn default_skip() -> i64 {
    DEFAULT_SKIP
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

pub fn round6(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}

fn round_coordinate<S>(v: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(round6(*v))
}

fn check_text(errors: &mut Vec<FieldError>, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len == 0 {
        errors.push(FieldError::new(
            &["body", field],
            "String should have at least 1 character",
            "string_too_short",
        ));
    } else if len > max {
        errors.push(FieldError::new(
            &["body", field],
            format!("String should have at most {max} characters"),
            "string_too_long",
        ));
    }
}

fn check_range(errors: &mut Vec<FieldError>, field: &str, value: f64, (min, max): (f64, f64)) {
    if value < min {
        errors.push(FieldError::new(
            &["body", field],
            format!("Input should be greater than or equal to {min}"),
            "greater_than_equal",
        ));
    } else if value > max {
        errors.push(FieldError::new(
            &["body", field],
            format!("Input should be less than or equal to {max}"),
            "less_than_equal",
        ));
    } else if !value.is_finite() {
        errors.push(FieldError::new(
            &["body", field],
            "Input should be a finite number",
            "finite_number",
        ));
    }
}

fn into_result(errors: Vec<FieldError>) -> Result<(), GeoError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(GeoError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> CompanyCreate {
        CompanyCreate {
            name: "Test Company".into(),
            industry: "Technology".into(),
            location: "San Francisco, CA".into(),
            latitude: 37.7749,
            longitude: -122.4194,
        }
    }

    fn failed_fields(result: Result<(), GeoError>) -> Vec<String> {
        match result {
            Err(GeoError::Validation(errors)) => errors.into_iter().map(|e| e.loc[1].clone()).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_create_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn bounds_are_inclusive() {
        let mut c = sample();
        for (lat, lon) in [(90.0, 180.0), (-90.0, -180.0), (0.0, 0.0)] {
            c.latitude = lat;
            c.longitude = lon;
            assert!(c.validate().is_ok(), "{lat},{lon} should be accepted");
        }
    }

    #[test]
    fn out_of_range_coordinates_fail() {
        let mut c = sample();
        c.latitude = 200.0;
        c.longitude = -180.5;
        assert_eq!(failed_fields(c.validate()), vec!["latitude", "longitude"]);
    }

    #[test]
    fn empty_and_oversized_strings_fail() {
        let mut c = sample();
        c.name = String::new();
        c.industry = String::new();
        c.location = "x".repeat(LOCATION_MAX_LEN + 1);
        assert_eq!(failed_fields(c.validate()), vec!["name", "industry", "location"]);

        let mut c = sample();
        c.location = "é".repeat(LOCATION_MAX_LEN);
        assert!(c.validate().is_ok(), "length counts characters, not bytes");
    }

    #[test]
    fn update_only_checks_present_fields() {
        assert!(CompanyUpdate::default().validate().is_ok());

        let update = CompanyUpdate {
            name: Some(String::new()),
            latitude: Some(-91.0),
            ..Default::default()
        };
        assert_eq!(failed_fields(update.validate()), vec!["name", "latitude"]);
    }

    #[test]
    fn response_rounds_coordinates_to_six_decimals() {
        let resp = CompanyResponse {
            id: 1,
            name: "n".into(),
            industry: "i".into(),
            location: "l".into(),
            latitude: 37.774_929_123_4,
            longitude: -122.419_415_55,
        };
        let v = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(v["latitude"], json!(37.774929));
        assert_eq!(v["longitude"], json!(-122.419416));
        assert_eq!(resp.latitude, 37.774_929_123_4);
    }

    #[test]
    fn list_params_default_and_reject_negatives() {
        let params: ListParams = serde_json::from_value(json!({})).expect("params");
        assert_eq!((params.skip, params.limit), (0, 100));
        let params = ListParams { skip: -1, limit: 5 };
        assert!(params.validate().is_err());
    }
}
