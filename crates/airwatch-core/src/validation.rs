use crate::error::ValidationError;
use crate::reading::Pollutants;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 50;
pub const EMAIL_MAX: usize = 100;
pub const PASSWORD_MIN: usize = 8;
pub const STATION_NAME_MAX: usize = 100;
pub const SOURCE_MAX: usize = 50;
pub const EPA_NAME_MAX: usize = 100;
pub const EPA_LINK_MAX: usize = 255;
pub const POST_TITLE_MAX: usize = 255;
pub const NOTIFICATION_TITLE_MAX: usize = 100;

/// Validator for inbound records.
pub struct Validator;

impl Validator {
    /// Validate latitude value.
    pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
        if lat.is_nan() || !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::InvalidLatitude(lat));
        }
        Ok(())
    }

    /// Validate longitude value.
    pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
        if lon.is_nan() || !(-180.0..=180.0).contains(&lon) {
            return Err(ValidationError::InvalidLongitude(lon));
        }
        Ok(())
    }

    pub fn validate_coordinates(lat: f64, lon: f64) -> Result<(), ValidationError> {
        Self::validate_latitude(lat)?;
        Self::validate_longitude(lon)
    }

    /// Reject negative, NaN and infinite readings.
    pub fn validate_non_negative(
        field: &'static str,
        value: Option<f64>,
    ) -> Result<(), ValidationError> {
        match value {
            Some(v) if !v.is_finite() || v < 0.0 => {
                Err(ValidationError::Negative { field, value: v })
            }
            _ => Ok(()),
        }
    }

    pub fn validate_pollutants(pollutants: &Pollutants) -> Result<(), ValidationError> {
        for (field, value) in pollutants.fields() {
            Self::validate_non_negative(field, value)?;
        }
        Ok(())
    }

    /// A contribution that carries readings must name the station it was taken at.
    pub fn validate_contribution(
        pollutants: &Pollutants,
        overall_aqi: Option<f64>,
        station_id: Option<i64>,
    ) -> Result<(), ValidationError> {
        Self::validate_pollutants(pollutants)?;
        Self::validate_non_negative("overall_aqi", overall_aqi)?;
        let has_readings = !pollutants.is_empty() || overall_aqi.is_some();
        if has_readings && station_id.is_none() {
            return Err(ValidationError::StationRequired);
        }
        Ok(())
    }

    /// Non-blank text of at most `max` characters.
    pub fn validate_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::Required(field));
        }
        Self::validate_max_len(field, value, max)
    }

    pub fn validate_max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
        let len = value.chars().count();
        if len > max {
            return Err(ValidationError::TooLong { field, len, max });
        }
        Ok(())
    }

    /// Non-blank free text with no length cap.
    pub fn validate_content(field: &'static str, value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::Required(field));
        }
        Ok(())
    }

    pub fn validate_username(username: &str) -> Result<(), ValidationError> {
        let len = username.chars().count();
        if len < USERNAME_MIN {
            return Err(ValidationError::TooShort {
                field: "username",
                len,
                min: USERNAME_MIN,
            });
        }
        Self::validate_max_len("username", username, USERNAME_MAX)
    }

    /// Minimal shape check: one `@` with text on both sides and a dot in the domain.
    pub fn validate_email(email: &str) -> Result<(), ValidationError> {
        Self::validate_max_len("email", email, EMAIL_MAX)?;
        let valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !email.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if !valid {
            return Err(ValidationError::InvalidEmail(email.to_string()));
        }
        Ok(())
    }

    pub fn validate_password(password: &str) -> Result<(), ValidationError> {
        let len = password.chars().count();
        if len < PASSWORD_MIN {
            return Err(ValidationError::TooShort {
                field: "password",
                len,
                min: PASSWORD_MIN,
            });
        }
        Ok(())
    }

    pub fn validate_radius(radius_km: f64) -> Result<(), ValidationError> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(ValidationError::InvalidRadius(radius_km));
        }
        Ok(())
    }
}
