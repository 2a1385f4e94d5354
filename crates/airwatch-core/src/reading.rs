use serde::{Deserialize, Serialize};

/// Pollutant concentrations shared by measurements and contributions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pollutants {
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub co: Option<f64>,
    pub so2: Option<f64>,
    pub ozone: Option<f64>,
}

impl Pollutants {
    /// Named values, in column order.
    pub fn fields(&self) -> [(&'static str, Option<f64>); 6] {
        [
            ("pm25", self.pm25),
            ("pm10", self.pm10),
            ("no2", self.no2),
            ("co", self.co),
            ("so2", self.so2),
            ("ozone", self.ozone),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, v)| v.is_none())
    }
}

/// Degrees of latitude per kilometre, close enough for a bounding-box filter.
const KM_PER_DEGREE: f64 = 111.0;

/// Axis-aligned latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Approximate box of `radius_km` around a point.
    pub fn around(lat: f64, lon: f64, radius_km: f64) -> Self {
        let delta = radius_km / KM_PER_DEGREE;
        Self {
            min_lat: lat - delta,
            max_lat: lat + delta,
            min_lon: lon - delta,
            max_lon: lon + delta,
        }
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pollutants() {
        assert!(Pollutants::default().is_empty());
        let p = Pollutants {
            ozone: Some(0.0),
            ..Default::default()
        };
        assert!(!p.is_empty());
    }

    #[test]
    fn test_bounding_box_around_point() {
        let bbox = BoundingBox::around(59.91, 10.75, 111.0);
        assert!((bbox.min_lat - 58.91).abs() < 1e-9);
        assert!((bbox.max_lon - 11.75).abs() < 1e-9);
        assert!(bbox.contains(59.91, 10.75));
        assert!(bbox.contains(60.5, 10.0));
        assert!(!bbox.contains(61.0, 10.75));
    }
}
