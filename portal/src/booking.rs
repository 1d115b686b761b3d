//! Trip search form on the passenger home page.

use thiserror::Error;

/// Locations offered by the departure and destination pickers
pub const KNOWN_LOCATIONS: [&str; 6] = ["Qamra", "3irfan", "Casa", "Rabat", "Tanger", "Fes"];

/// Why a booking search cannot be run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    /// A picker was left empty
    #[error("Please select both locations.")]
    MissingLocation,

    /// Departure equals destination
    #[error("Departure and destination must be different.")]
    SameLocation,

    /// Not one of [`KNOWN_LOCATIONS`]
    #[error("Unknown location: {0}")]
    UnknownLocation(String),
}

fn picked(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Departure and destination picked by the passenger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingRequest {
    /// Departure
    pub from: Option<String>,
    /// Destination
    pub to: Option<String>,
}

impl BookingRequest {
    /// Request from `from` to `to`
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: Some(from.into()),
            to: Some(to.into()),
        }
    }

    /// Check the pickers before searching.
    ///
    /// Blank values count as missing. Returns the trimmed `(from, to)` pair.
    ///
    /// # Errors
    ///
    /// The first [`BookingError`] found.
    pub fn validate(&self) -> Result<(&str, &str), BookingError> {
        let (Some(from), Some(to)) = (picked(self.from.as_deref()), picked(self.to.as_deref()))
        else {
            return Err(BookingError::MissingLocation);
        };
        if from == to {
            return Err(BookingError::SameLocation);
        }
        if let Some(unknown) = [from, to]
            .into_iter()
            .find(|l| !KNOWN_LOCATIONS.iter().any(|known| known == l))
        {
            return Err(BookingError::UnknownLocation(unknown.to_string()));
        }
        Ok((from, to))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request() {
        assert_eq!(
            BookingRequest::new("Casa", " Rabat ").validate(),
            Ok(("Casa", "Rabat"))
        );
    }

    #[test]
    fn test_missing_location() {
        let request = BookingRequest {
            from: Some("Casa".to_string()),
            to: Some("  ".to_string()),
        };
        let err = request.validate().unwrap_err();
        assert_eq!(err, BookingError::MissingLocation);
        assert_eq!(err.to_string(), "Please select both locations.");
        assert_eq!(
            BookingRequest::default().validate(),
            Err(BookingError::MissingLocation)
        );
    }

    #[test]
    fn test_same_location() {
        let err = BookingRequest::new("Fes", "Fes").validate().unwrap_err();
        assert_eq!(err.to_string(), "Departure and destination must be different.");
    }

    #[test]
    fn test_unknown_location() {
        assert_eq!(
            BookingRequest::new("Casa", "Agadir").validate(),
            Err(BookingError::UnknownLocation("Agadir".to_string()))
        );
    }
}
