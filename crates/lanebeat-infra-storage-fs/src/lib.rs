use lanebeat_ports::chart::ChartDto;
use lanebeat_ports::storage::{SettingsDto, StorageError, StoragePort};
use std::fs;
use std::path::{Path, PathBuf};

const CHART_EXTENSION: &str = "json";

/// Settings and charts as pretty JSON: `settings.json` plus `charts/<name>.json`.
pub struct FsStorage {
    base_dir: PathBuf,
}

impl FsStorage {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn default_base_dir() -> Result<PathBuf, StorageError> {
        let base = dirs_next::config_dir()
            .ok_or_else(|| StorageError::Io("config dir not found".to_string()))?;
        Ok(base.join("Lanebeat"))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn settings_path(&self) -> PathBuf {
        self.base_dir.join("settings.json")
    }

    fn charts_dir(&self) -> PathBuf {
        self.base_dir.join("charts")
    }

    fn chart_path(&self, name: &str) -> Result<PathBuf, StorageError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | ' ' | '.'))
            && !name.starts_with('.');
        if !valid {
            return Err(StorageError::Io(format!("invalid chart name: {name:?}")));
        }
        Ok(self
            .charts_dir()
            .join(format!("{name}.{CHART_EXTENSION}")))
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
        let data = fs::read(path).map_err(|e| StorageError::Io(e.to_string()))?;
        serde_json::from_slice(&data).map_err(|e| StorageError::Serde(e.to_string()))
    }

    fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        let data =
            serde_json::to_vec_pretty(value).map_err(|e| StorageError::Serde(e.to_string()))?;
        fs::write(path, data).map_err(|e| StorageError::Io(e.to_string()))
    }
}

impl Default for FsStorage {
    fn default() -> Self {
        let base_dir = Self::default_base_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { base_dir }
    }
}

impl StoragePort for FsStorage {
    fn load_settings(&self) -> Result<SettingsDto, StorageError> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(SettingsDto::default());
        }
        Self::read_json(&path)
    }

    fn save_settings(&self, s: &SettingsDto) -> Result<(), StorageError> {
        let path = self.settings_path();
        Self::write_json(&path, s)
    }

    fn list_charts(&self) -> Result<Vec<String>, StorageError> {
        let dir = self.charts_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| StorageError::Io(e.to_string()))? {
            let path = entry.map_err(|e| StorageError::Io(e.to_string()))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(CHART_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn load_chart(&self, name: &str) -> Result<ChartDto, StorageError> {
        let path = self.chart_path(name)?;
        if !path.exists() {
            return Err(StorageError::ChartNotFound(name.to_string()));
        }
        Self::read_json(&path)
    }

    fn save_chart(&self, name: &str, chart: &ChartDto) -> Result<(), StorageError> {
        let path = self.chart_path(name)?;
        Self::write_json(&path, chart)
    }
}
