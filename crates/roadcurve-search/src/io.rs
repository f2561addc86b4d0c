//! JSON configuration and report helpers for the curvature search.

use crate::candidates::RadiusCandidate;
use crate::search::{CandidateScore, CurvatureSearch, FrameEstimate, SearchError, SearchParams};
use roadcurve_core::{CameraGeometry, GeometryError};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Static camera and run description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurvatureConfig {
    pub width: usize,
    pub height: usize,
    #[serde(alias = "cameraInclination")]
    pub camera_inclination_deg: f64,
    #[serde(alias = "cameraHeight")]
    pub camera_height_units: f64,
    pub upper_rect_line_height: f64,
    pub profile_width: usize,
    #[serde(alias = "fovx")]
    pub fovx_deg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchParams>,
}

impl CurvatureConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Directory of frames to process, if configured.
    pub fn frames_dir(&self) -> Option<PathBuf> {
        self.frames_path.as_ref().map(PathBuf::from)
    }

    /// Validate the camera record and derive the vertical field of view.
    pub fn build_geometry(&self) -> Result<CameraGeometry, ConfigError> {
        Ok(CameraGeometry::from_degrees(
            self.width,
            self.height,
            self.camera_inclination_deg,
            self.fovx_deg,
            self.camera_height_units,
            self.upper_rect_line_height,
        )?)
    }

    /// Search parameters with `profileWidth` applied on top of the optional
    /// `search` block.
    pub fn build_params(&self) -> SearchParams {
        let mut params = self.search.clone().unwrap_or_default();
        params.profile_width = self.profile_width;
        params
    }

    /// Build a ready-to-run search from this config.
    pub fn build_search(&self) -> Result<CurvatureSearch, ConfigError> {
        let geometry = self.build_geometry()?;
        Ok(CurvatureSearch::new(geometry, self.build_params())?)
    }
}

/// Per-frame result as written to the run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame_index: usize,
    /// Index into the candidate set, `None` for `Straight`.
    pub index: Option<usize>,
    pub candidate: RadiusCandidate,
    /// Signed radius in profile pixels, `None` for `Straight`.
    pub signed_radius: Option<i64>,
    pub score: u8,
    pub excluded: usize,
    pub elapsed_ms: f64,
    #[serde(default)]
    pub scores: Vec<CandidateScore>,
}

impl FrameReport {
    pub fn from_estimate(frame_index: usize, frame: &FrameEstimate) -> Self {
        let estimate = &frame.estimate;
        Self {
            frame_index,
            index: estimate.index,
            candidate: estimate.candidate,
            signed_radius: estimate.candidate.signed_radius(),
            score: estimate.score,
            excluded: estimate.excluded(),
            elapsed_ms: frame.elapsed.as_secs_f64() * 1e3,
            scores: estimate.scores.clone(),
        }
    }
}

/// A sampled frame that produced no estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedFrame {
    pub frame_index: usize,
    pub reason: String,
}

/// Summary of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub config: CurvatureConfig,
    pub frames: Vec<FrameReport>,
    #[serde(default)]
    pub skipped: Vec<SkippedFrame>,
}

impl RunReport {
    pub fn new(config: CurvatureConfig) -> Self {
        Self {
            config,
            frames: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Mean per-frame processing time, `None` for an empty run.
    pub fn mean_elapsed_ms(&self) -> Option<f64> {
        if self.frames.is_empty() {
            return None;
        }
        let total: f64 = self.frames.iter().map(|f| f.elapsed_ms).sum();
        Some(total / self.frames.len() as f64)
    }

    /// Load a JSON report from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const REFERENCE: &str = r#"{
        "width": 640,
        "height": 480,
        "cameraInclination": 5.0,
        "cameraHeight": 1.2,
        "upperRectLineHeight": 0.32,
        "profileWidth": 50,
        "fovx": 60.0
    }"#;

    fn reference() -> CurvatureConfig {
        serde_json::from_str(REFERENCE).expect("parse")
    }

    #[test]
    fn parses_short_field_names() {
        let cfg = reference();
        assert_eq!(cfg.width, 640);
        assert_relative_eq!(cfg.camera_inclination_deg, 5.0);
        assert_relative_eq!(cfg.camera_height_units, 1.2);
        assert_relative_eq!(cfg.fovx_deg, 60.0);
        assert!(cfg.search.is_none());
        assert!(cfg.frames_dir().is_none());
    }

    #[test]
    fn profile_width_overrides_search_block() {
        let mut cfg = reference();
        cfg.profile_width = 64;
        cfg.search = Some(SearchParams {
            candidate_count: 7,
            ..SearchParams::default()
        });
        let params = cfg.build_params();
        assert_eq!(params.profile_width, 64);
        assert_eq!(params.candidate_count, 7);

        let search = cfg.build_search().expect("search");
        assert_eq!(search.candidates().len(), 14);
    }

    #[test]
    fn invalid_geometry_is_reported_at_build_time() {
        let mut cfg = reference();
        cfg.camera_inclination_deg = 95.0;
        assert!(matches!(
            cfg.build_geometry(),
            Err(ConfigError::Geometry(GeometryError::InvalidInclination(_)))
        ));

        let mut narrow = reference();
        narrow.profile_width = 10;
        assert!(matches!(
            narrow.build_search(),
            Err(ConfigError::Search(SearchError::ProfileTooNarrow { .. }))
        ));
    }

    #[test]
    fn config_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        let mut cfg = reference();
        cfg.frames_path = Some("frames".to_string());
        cfg.write_json(&path).expect("write");

        let raw = fs::read_to_string(&path).expect("read");
        assert!(raw.contains("\"cameraInclinationDeg\""));
        assert!(raw.contains("\"framesPath\""));
        assert_eq!(CurvatureConfig::load_json(&path).expect("load"), cfg);
    }

    #[test]
    fn camera_fields_are_required() {
        for field in ["upperRectLineHeight", "profileWidth"] {
            let mut value: serde_json::Value = serde_json::from_str(REFERENCE).expect("parse");
            value.as_object_mut().expect("object").remove(field);
            let err = serde_json::from_value::<CurvatureConfig>(value)
                .expect_err("config without the field must not load");
            assert!(err.to_string().contains(field), "{field}: {err}");
        }

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("partial.json");
        fs::write(
            &path,
            r#"{ "width": 640, "height": 480, "cameraInclination": 5.0,
                 "cameraHeight": 1.2, "fovx": 60.0 }"#,
        )
        .expect("write");
        assert!(matches!(
            CurvatureConfig::load_json(&path),
            Err(IoError::Json(_))
        ));
    }

    #[test]
    fn missing_config_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            CurvatureConfig::load_json(dir.path().join("absent.json")),
            Err(IoError::Io(_))
        ));
    }

    #[test]
    fn mean_elapsed_of_empty_run_is_none() {
        let mut report = RunReport::new(reference());
        assert_eq!(report.mean_elapsed_ms(), None);
        for (i, ms) in [2.0, 4.0].into_iter().enumerate() {
            report.frames.push(FrameReport {
                frame_index: i * 4,
                index: None,
                candidate: RadiusCandidate::Straight,
                signed_radius: None,
                score: 0,
                excluded: 0,
                elapsed_ms: ms,
                scores: Vec::new(),
            });
        }
        assert_relative_eq!(report.mean_elapsed_ms().expect("mean"), 3.0);
    }
}
