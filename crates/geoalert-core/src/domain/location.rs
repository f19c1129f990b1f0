//! Location check result: the payload carried by every webhook task.
//!
//! The incident service produces these when a user location is checked
//! against active incidents. The shape is fixed by the wire format consumed
//! by the third-party receiver, so field names are pinned with serde renames.

use serde::{Deserialize, Serialize};

/// An incident matched by a location check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedIncident {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub latitude: String,
    pub longitude: String,
    /// Geofence radius in meters.
    pub radius: i32,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
}

/// Result of checking one user location against the active incidents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCheckResult {
    #[serde(rename = "check_id")]
    pub id: String,
    pub user_id: String,
    pub latitude: String,
    pub longitude: String,
    pub is_danger: bool,
    #[serde(default)]
    pub detected_incidents: Vec<DetectedIncident>,
}

impl LocationCheckResult {
    /// A result flagged as dangerous with no incidents attached yet.
    pub fn dangerous(
        id: impl Into<String>,
        user_id: impl Into<String>,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            latitude: latitude.into(),
            longitude: longitude.into(),
            is_danger: true,
            detected_incidents: Vec::new(),
        }
    }

    /// A result for a location outside every incident.
    pub fn safe(
        id: impl Into<String>,
        user_id: impl Into<String>,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
    ) -> Self {
        Self {
            is_danger: false,
            ..Self::dangerous(id, user_id, latitude, longitude)
        }
    }

    pub fn with_incident(mut self, incident: DetectedIncident) -> Self {
        self.detected_incidents.push(incident);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incident() -> DetectedIncident {
        DetectedIncident {
            id: "inc-1".to_string(),
            name: "gas leak".to_string(),
            kind: "chemical".to_string(),
            latitude: "55.7558".to_string(),
            longitude: "37.6173".to_string(),
            radius: 500,
            is_active: true,
            distance_meters: Some(120.5),
        }
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let result = LocationCheckResult::dangerous("chk-1", "user-7", "55.75", "37.61")
            .with_incident(incident());

        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["check_id"], "chk-1");
        assert_eq!(v["user_id"], "user-7");
        assert_eq!(v["is_danger"], true);
        assert_eq!(v["detected_incidents"][0]["type"], "chemical");
        assert_eq!(v["detected_incidents"][0]["distance_meters"], 120.5);
    }

    #[test]
    fn distance_is_omitted_when_unknown() {
        let mut inc = incident();
        inc.distance_meters = None;

        let v = serde_json::to_value(&inc).unwrap();
        assert!(v.get("distance_meters").is_none());
    }

    #[test]
    fn missing_incident_list_defaults_to_empty() {
        let json = r#"{
            "check_id": "chk-2",
            "user_id": "u",
            "latitude": "1.0",
            "longitude": "2.0",
            "is_danger": false
        }"#;
        let result: LocationCheckResult = serde_json::from_str(json).unwrap();
        assert!(!result.is_danger);
        assert!(result.detected_incidents.is_empty());
    }
}
