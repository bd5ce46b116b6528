//! WGS84 point stored in the `geom` column.
//!
//! Both backends move the point as EWKT text (`SRID=4326;POINT(lon lat)`):
//! PostGIS converts it with `ST_GeogFromText` / `ST_AsEWKT`, SQLite keeps the
//! text as is.

use std::fmt;
use std::str::FromStr;
use thiserror::Error as ThisError;

/// WGS84 lat/lon reference system.
pub const SRID_WGS84: i32 = 4326;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, ThisError, PartialEq)]
pub enum PointParseError {
    #[error("unsupported SRID {0}, expected 4326")]
    UnsupportedSrid(i32),
    #[error("malformed point: {0}")]
    Malformed(String),
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Builds the point for a record. Skipped (None) when either coordinate is
    /// missing.
    pub fn derive(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Some(Self::new(lon, lat)),
            _ => None,
        }
    }

    pub fn to_ewkt(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SRID={};POINT({} {})",
            SRID_WGS84, self.longitude, self.latitude
        )
    }
}

impl FromStr for GeoPoint {
    type Err = PointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || PointParseError::Malformed(s.to_string());
        let mut wkt = s.trim();

        if let Some((prefix, rest)) = wkt.split_once(';') {
            let srid = prefix
                .trim()
                .get(..5)
                .filter(|p| p.eq_ignore_ascii_case("SRID="))
                .and_then(|_| prefix.trim()[5..].trim().parse::<i32>().ok())
                .ok_or_else(malformed)?;
            if srid != SRID_WGS84 {
                return Err(PointParseError::UnsupportedSrid(srid));
            }
            wkt = rest.trim();
        }

        let body = wkt
            .get(..5)
            .filter(|kw| kw.eq_ignore_ascii_case("POINT"))
            .map(|_| wkt[5..].trim())
            .and_then(|b| b.strip_prefix('('))
            .and_then(|b| b.strip_suffix(')'))
            .ok_or_else(malformed)?;

        let mut coords = body.split_whitespace().map(f64::from_str);
        match (coords.next(), coords.next(), coords.next()) {
            (Some(Ok(longitude)), Some(Ok(latitude)), None) => Ok(Self::new(longitude, latitude)),
            _ => Err(malformed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_orders_longitude_first() {
        let p = GeoPoint::derive(Some(37.7749), Some(-122.4194)).expect("point");
        assert_eq!(p.longitude, -122.4194);
        assert_eq!(p.latitude, 37.7749);
        assert_eq!(p.to_ewkt(), "SRID=4326;POINT(-122.4194 37.7749)");
    }

    #[test]
    fn derive_skips_when_a_coordinate_is_missing() {
        assert_eq!(GeoPoint::derive(None, Some(10.0)), None);
        assert_eq!(GeoPoint::derive(Some(10.0), None), None);
        assert_eq!(GeoPoint::derive(None, None), None);
    }

    #[test]
    fn parses_postgis_output() {
        let p: GeoPoint = "SRID=4326;POINT(-122.4194 37.7749)".parse().expect("ewkt");
        assert_eq!(p, GeoPoint::new(-122.4194, 37.7749));

        let bare: GeoPoint = "point (2.35 48.85)".parse().expect("wkt");
        assert_eq!(bare, GeoPoint::new(2.35, 48.85));
    }

    #[test]
    fn rejects_foreign_srid_and_garbage() {
        assert_eq!(
            "SRID=3857;POINT(1 2)".parse::<GeoPoint>(),
            Err(PointParseError::UnsupportedSrid(3857))
        );
        assert!("POINT(1)".parse::<GeoPoint>().is_err());
        assert!("POINT(1 2 3)".parse::<GeoPoint>().is_err());
        assert!("LINESTRING(1 2, 3 4)".parse::<GeoPoint>().is_err());
        assert!("SRID=abc;POINT(1 2)".parse::<GeoPoint>().is_err());
    }
}
