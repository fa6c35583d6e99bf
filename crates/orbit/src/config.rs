use crate::layout::LayoutPaths;
use directories::ProjectDirs;
use orbit_core::geometry::DEFAULT_MARKER_DIAMETER;
use orbit_core::{Circle, RingGeometry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const POINTS_FILE: &str = "points.json";
const NESTS_FILE: &str = "nests.json";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub marker_diameter: f64,
    pub circles: Vec<Circle>,
    pub points_file: Option<PathBuf>,
    pub nests_file: Option<PathBuf>,
    pub pretty: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            marker_diameter: DEFAULT_MARKER_DIAMETER,
            circles: vec![
                Circle::new(0, 180.0),
                Circle::new(1, 330.0),
                Circle::new(2, 480.0),
            ],
            points_file: None,
            nests_file: None,
            pretty: true,
        }
    }
}

impl Settings {
    pub fn geometry(&self) -> RingGeometry {
        RingGeometry::new(self.marker_diameter)
    }

    pub fn circle(&self, id: i32) -> Option<&Circle> {
        self.circles.iter().find(|c| c.id == id)
    }

    /// Layout file locations: configured paths first, then the data dir.
    pub fn layout_paths(&self) -> Result<LayoutPaths, ConfigError> {
        let data_dir = || -> Result<PathBuf, ConfigError> {
            Ok(project_dirs()?.data_dir().to_path_buf())
        };
        let points = match &self.points_file {
            Some(path) => path.clone(),
            None => data_dir()?.join(POINTS_FILE),
        };
        let nests = match &self.nests_file {
            Some(path) => path.clone(),
            None => data_dir()?.join(NESTS_FILE),
        };
        Ok(LayoutPaths { points, nests })
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
    #[error("Invalid circle {id}: radius must be positive, got {radius}")]
    InvalidCircle { id: i32, radius: f64 },
    #[error("marker_diameter must be positive, got {0}")]
    InvalidMarker(f64),
}

fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("org", "orbit", "orbit").ok_or(ConfigError::ConfigDirNotFound)
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

pub fn load_from(path: &Path) -> Result<Settings, ConfigError> {
    let s = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("ORBIT"))
        .build()?;

    let settings: Settings = s.try_deserialize()?;
    validate(&settings)?;
    Ok(settings)
}

pub fn load_config() -> Result<Settings, ConfigError> {
    load_from(&get_config_path()?)
}

pub fn load_or_default() -> Settings {
    load_config().unwrap_or_else(|e| {
        log::error!("Falling back to default settings: {}", e);
        Settings::default()
    })
}

fn validate(settings: &Settings) -> Result<(), ConfigError> {
    if !(settings.marker_diameter.is_finite() && settings.marker_diameter > 0.0) {
        return Err(ConfigError::InvalidMarker(settings.marker_diameter));
    }
    match settings.circles.iter().find(|c| !c.is_valid()) {
        Some(c) => Err(ConfigError::InvalidCircle {
            id: c.id,
            radius: c.radius,
        }),
        None => Ok(()),
    }
}

pub fn write_default_config() -> std::io::Result<PathBuf> {
    let path =
        get_config_path().map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e))?;
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(&path, DEFAULT_CONFIG)?;
    }
    Ok(path)
}

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs_err::write(&path, DEFAULT_CONFIG).unwrap();

        let settings = load_from(&path).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.circles, Settings::default().circles);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs_err::write(
            &path,
            "pretty = false\npoints_file = \"/tmp/p.json\"\n[[circles]]\nid = 0\nradius = 100.0\n",
        )
        .unwrap();

        let settings = load_from(&path).unwrap();
        assert!(!settings.pretty);
        assert_eq!(settings.circles, vec![Circle::new(0, 100.0)]);
        assert_eq!(settings.marker_diameter, DEFAULT_MARKER_DIAMETER);
        assert_eq!(settings.points_file, Some(PathBuf::from("/tmp/p.json")));
        assert_eq!(settings.circle(0), Some(&Circle::new(0, 100.0)));
        assert_eq!(settings.circle(1), None);
    }

    #[test]
    fn test_invalid_circle_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs_err::write(&path, "[[circles]]\nid = 3\nradius = -5.0\n").unwrap();

        assert!(matches!(
            load_from(&path),
            Err(ConfigError::InvalidCircle { id: 3, .. })
        ));
    }

    #[test]
    fn test_configured_layout_paths() {
        let settings = Settings {
            points_file: Some(PathBuf::from("/a/points.json")),
            nests_file: Some(PathBuf::from("/b/nests.json")),
            ..Settings::default()
        };
        let paths = settings.layout_paths().unwrap();
        assert_eq!(paths.points, PathBuf::from("/a/points.json"));
        assert_eq!(paths.nests, PathBuf::from("/b/nests.json"));
    }
}
