use serde::{Deserialize, Serialize};

use crate::error::ApiError;

use super::repo::{Marker, MarkerStatus, MarkerType, NewMarker, Visibility};

/// Body of `POST /markers`. Coordinates are accepted as `lat`/`lng` or
/// `latitude`/`longitude`; the long names win when both appear. Unknown enum
/// strings are rejected at deserialization, not silently defaulted.
#[derive(Debug, Deserialize)]
pub struct CreateMarkerRequest {
    pub user_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub marker_type: Option<MarkerType>,
    pub contact: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    pub visibility: Option<Visibility>,
}

impl CreateMarkerRequest {
    /// First failing precondition wins; nothing is written before this passes.
    pub fn validate(self) -> Result<NewMarker, ApiError> {
        let user_id = self
            .user_id
            .ok_or_else(|| ApiError::BadRequest("user_id is required".into()))?;

        let title = self.title.as_deref().unwrap_or("").trim().to_string();
        if title.is_empty() {
            return Err(ApiError::BadRequest("title is required".into()));
        }
        let description = self.description.as_deref().unwrap_or("").trim().to_string();
        if description.is_empty() {
            return Err(ApiError::BadRequest("description is required".into()));
        }

        let lat = self.latitude.or(self.lat);
        let lng = self.longitude.or(self.lng);
        let (Some(lat), Some(lng)) = (lat, lng) else {
            return Err(ApiError::BadRequest("invalid coordinates".into()));
        };

        let visibility = self.visibility.ok_or_else(|| {
            ApiError::BadRequest("visibility must be one of: today, three_days".into())
        })?;

        Ok(NewMarker {
            user_id,
            title,
            description,
            lat,
            lng,
            marker_type: self.marker_type.unwrap_or(MarkerType::Personal),
            contact: self.contact,
            is_private: self.is_private,
            visibility,
        })
    }
}

/// Owner-side patch for `PUT /markers/:id`.
#[derive(Debug, Deserialize)]
pub struct UpdateMarkerRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub contact: Option<String>,
    pub marker_type: Option<MarkerType>,
    pub is_private: Option<bool>,
    pub status: Option<MarkerStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: MarkerStatus,
}

#[derive(Debug, Serialize)]
pub struct MarkerResponse {
    pub message: String,
    pub marker: Marker,
}

#[derive(Debug, Serialize)]
pub struct DeleteMarkerResponse {
    pub message: String,
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> CreateMarkerRequest {
        CreateMarkerRequest {
            user_id: Some(1),
            title: Some("t".into()),
            description: Some("d".into()),
            lat: Some(1.0),
            lng: Some(2.0),
            latitude: None,
            longitude: None,
            marker_type: None,
            contact: None,
            is_private: false,
            visibility: Some(Visibility::Today),
        }
    }

    #[test]
    fn long_coordinate_names_take_precedence() {
        let req = CreateMarkerRequest {
            latitude: Some(48.85),
            longitude: Some(2.35),
            ..base_request()
        };
        let new = req.validate().unwrap();
        assert_eq!(new.lat, 48.85);
        assert_eq!(new.lng, 2.35);
    }

    #[test]
    fn short_coordinate_names_accepted() {
        let new = base_request().validate().unwrap();
        assert_eq!(new.lat, 1.0);
        assert_eq!(new.lng, 2.0);
    }

    #[test]
    fn blank_title_rejected_first() {
        let req = CreateMarkerRequest {
            title: Some("   ".into()),
            description: None,
            ..base_request()
        };
        let err = req.validate().unwrap_err();
        assert_eq!(err.to_string(), "title is required");
    }

    #[test]
    fn missing_coordinates_rejected() {
        let req = CreateMarkerRequest {
            lat: None,
            lng: None,
            ..base_request()
        };
        assert_eq!(req.validate().unwrap_err().to_string(), "invalid coordinates");
    }

    #[test]
    fn missing_visibility_rejected() {
        let req = CreateMarkerRequest {
            visibility: None,
            ..base_request()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn marker_type_defaults_to_personal() {
        let new = base_request().validate().unwrap();
        assert_eq!(new.marker_type, MarkerType::Personal);
    }
}
