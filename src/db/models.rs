use crate::db::point::GeoPoint;
use serde::Serialize;

/// A row of the `companies` table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Company {
    pub id: i32,
    pub name: String,
    pub industry: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip)]
    pub geom: GeoPoint,
}

/// Insert payload. The point is derived here and cannot be supplied directly.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCompany {
    pub name: String,
    pub industry: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    geom: GeoPoint,
}

impl NewCompany {
    pub fn new(
        name: impl Into<String>,
        industry: impl Into<String>,
        location: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            name: name.into(),
            industry: industry.into(),
            location: location.into(),
            latitude,
            longitude,
            geom: GeoPoint::new(longitude, latitude),
        }
    }

    pub fn geom(&self) -> GeoPoint {
        self.geom
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyChanges {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl CompanyChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.industry.is_none()
            && self.location.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
    }

    pub fn touches_coordinates(&self) -> bool {
        self.latitude.is_some() || self.longitude.is_some()
    }
}

impl Company {
    /// Merge `changes` into the record. The point follows the coordinates
    /// whenever either of them is part of the change.
    pub fn apply(&mut self, changes: CompanyChanges) {
        let recompute = changes.touches_coordinates();
        let CompanyChanges {
            name,
            industry,
            location,
            latitude,
            longitude,
        } = changes;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(industry) = industry {
            self.industry = industry;
        }
        if let Some(location) = location {
            self.location = location;
        }
        if let Some(latitude) = latitude {
            self.latitude = latitude;
        }
        if let Some(longitude) = longitude {
            self.longitude = longitude;
        }

        if recompute
            && let Some(geom) = GeoPoint::derive(Some(self.latitude), Some(self.longitude))
        {
            self.geom = geom;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Company {
        Company {
            id: 7,
            name: "Acme".into(),
            industry: "Tools".into(),
            location: "Paris".into(),
            latitude: 48.8566,
            longitude: 2.3522,
            geom: GeoPoint::new(2.3522, 48.8566),
        }
    }

    #[test]
    fn new_company_derives_point_from_coordinates() {
        let c = NewCompany::new("Acme", "Tools", "San Francisco, CA", 37.7749, -122.4194);
        assert_eq!(c.geom(), GeoPoint::new(-122.4194, 37.7749));
    }

    #[test]
    fn apply_without_coordinates_keeps_point() {
        let mut c = stored();
        c.apply(CompanyChanges {
            name: Some("Acme Corp".into()),
            ..Default::default()
        });
        assert_eq!(c.name, "Acme Corp");
        assert_eq!(c.geom, GeoPoint::new(2.3522, 48.8566));
    }

    #[test]
    fn apply_rederives_point_when_one_coordinate_changes() {
        let mut c = stored();
        c.apply(CompanyChanges {
            latitude: Some(-33.8688),
            ..Default::default()
        });
        assert_eq!(c.latitude, -33.8688);
        assert_eq!(c.longitude, 2.3522);
        assert_eq!(c.geom, GeoPoint::new(2.3522, -33.8688));
    }

    #[test]
    fn empty_changes_are_a_no_op() {
        let changes = CompanyChanges::default();
        assert!(changes.is_empty());
        let mut c = stored();
        c.apply(changes);
        assert_eq!(c, stored());
    }
}
