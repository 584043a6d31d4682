//! Compile-time embedded camera roster.

use serde::Deserialize;

use crate::{Camera, CameraError};

const CAMERAS_TOML: &str = include_str!("../cameras.toml");

#[derive(Debug, Deserialize)]
struct RosterFile {
    cameras: Vec<Camera>,
}

/// Parses a roster from TOML text containing `[[cameras]]` tables.
///
/// # Errors
///
/// Returns [`CameraError::Config`] if the TOML is malformed or two cameras
/// share an ID.
pub fn parse_roster(toml_str: &str) -> Result<Vec<Camera>, CameraError> {
    let file: RosterFile = toml::de::from_str(toml_str).map_err(|e| CameraError::Config {
        message: format!("Failed to parse camera roster: {e}"),
    })?;

    let mut seen = std::collections::BTreeSet::new();
    for camera in &file.cameras {
        if !seen.insert(camera.id.as_str()) {
            return Err(CameraError::Config {
                message: format!("Duplicate camera ID: {}", camera.id),
            });
        }
    }

    Ok(file.cameras)
}

/// Returns every camera in the embedded roster, in file order.
///
/// # Panics
///
/// Panics if the embedded roster is malformed (a build-time guarantee).
#[must_use]
pub fn all_cameras() -> Vec<Camera> {
    parse_roster(CAMERAS_TOML).unwrap_or_else(|e| panic!("Embedded camera roster is invalid: {e}"))
}

/// Looks up a camera by ID.
///
/// # Errors
///
/// Returns [`CameraError::UnknownCamera`] if no camera has that ID.
pub fn find_camera(id: &str) -> Result<Camera, CameraError> {
    all_cameras()
        .into_iter()
        .find(|c| c.id == id)
        .ok_or_else(|| CameraError::UnknownCamera { id: id.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CameraStatus, StreamKind};

    #[test]
    fn loads_six_cameras() {
        let cameras = all_cameras();
        assert_eq!(cameras.len(), 6);
        assert_eq!(cameras[0].id, "camera-1");
        assert_eq!(cameras[0].coordinates, Some([19.0160, 72.8200]));
        assert!(cameras[0].has_stream());
        assert!(cameras[1..].iter().all(|c| !c.has_stream()));
        assert!(cameras.iter().all(|c| c.status == CameraStatus::Online));
        assert!(cameras.iter().all(|c| c.kind == StreamKind::Youtube));
    }

    #[test]
    fn finds_by_id() {
        assert_eq!(find_camera("camera-4").unwrap().name, "Camera 4");
        assert!(matches!(
            find_camera("camera-99"),
            Err(CameraError::UnknownCamera { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let toml_str = r#"
            [[cameras]]
            id = "a"
            name = "A"
            location = "X"
            status = "online"
            type = "hls"

            [[cameras]]
            id = "a"
            name = "A again"
            location = "X"
            status = "offline"
            type = "hls"
        "#;
        let err = parse_roster(toml_str).unwrap_err();
        assert!(err.to_string().contains("Duplicate camera ID"));
    }

    #[test]
    fn serializes_with_dashboard_field_names() {
        let json = serde_json::to_value(&all_cameras()[0]).unwrap();
        assert_eq!(json["streamUrl"], "https://www.youtube.com/live/y-Os52eW2rg?si=yf9CIMI81lJfNftb");
        assert_eq!(json["type"], "youtube");
        assert_eq!(json["status"], "online");
        assert_eq!(json["coordinates"], serde_json::json!([19.016, 72.82]));
    }
}
