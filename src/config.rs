//! Pipeline configuration loaded from YAML.
//!
//! Every field has a default, so a partial file (or none at all) is valid.
//! Lookup order for the file: `--config`, then `CORDEX_PREP_CONFIG`.
//! The `CDO` environment variable overrides the configured CDO binary.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cdo::{LonLatBox, DEFAULT_CDO_PROGRAM};
use crate::error::{Error, Result};
use crate::regrid::{RegridMethod, RegridRule};

pub const CONFIG_ENV_VAR: &str = "CORDEX_PREP_CONFIG";
pub const CDO_ENV_VAR: &str = "CDO";

/// Missing-data sentinel written into synthesized months.
pub const DEFAULT_FILL_VALUE: f64 = 1e20;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub cdo: CdoConfig,
    /// Experiment tags, also the per-experiment directory names.
    pub experiments: Vec<String>,
    /// Institutes containing a hyphen, in addition to the built-in table.
    pub extra_institutes: Vec<String>,
    pub merge: MergeConfig,
    pub regrid: RegridConfig,
    pub catalogue: CatalogueConfig,
    pub patch: PatchConfig,
    pub indices: IndicesConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cdo: CdoConfig::default(),
            experiments: strings(&["historical", "rcp45", "rcp85"]),
            extra_institutes: Vec::new(),
            merge: MergeConfig::default(),
            regrid: RegridConfig::default(),
            catalogue: CatalogueConfig::default(),
            patch: PatchConfig::default(),
            indices: IndicesConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        Self::from_yaml_str(&raw)
    }

    /// Resolve the config file from the explicit path or the environment,
    /// falling back to defaults, then apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        let mut config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        if let Ok(program) = std::env::var(CDO_ENV_VAR) {
            if !program.trim().is_empty() {
                config.cdo.program = program;
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.experiments.is_empty() {
            return Err(Error::Config("at least one experiment is required".into()));
        }
        if self.merge.variables.is_empty() {
            return Err(Error::Config("merge.variables must not be empty".into()));
        }
        let fill = &self.patch.fill;
        if !(1..=12).contains(&fill.month) {
            return Err(Error::Config(format!(
                "patch.fill.month must be 1-12, got {}",
                fill.month
            )));
        }
        let b = &self.patch.subset.bounds;
        if b.lon_min >= b.lon_max || b.lat_min >= b.lat_max {
            return Err(Error::Config(
                "patch.subset.bounds must have min < max for lon and lat".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CdoConfig {
    pub program: String,
}

impl Default for CdoConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_CDO_PROGRAM.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Trees walked recursively for input chunks.
    pub roots: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub ensemble: String,
    pub frequency: String,
    pub variables: Vec<String>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            roots: vec![PathBuf::from("input")],
            output_dir: PathBuf::from("scratch/step1_concat"),
            ensemble: "r1i1p1".to_string(),
            frequency: "day".to_string(),
            variables: strings(&["pr", "tasmax", "tasmin"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegridConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub source_domain: String,
    pub target_domain: String,
    /// CDO grid description of the target grid.
    pub target_grid: PathBuf,
    /// Applied with `setgrid` before remapping when the input grid is not self-describing.
    pub source_grid: Option<PathBuf>,
    pub rules: Vec<RegridRule>,
}

impl Default for RegridConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("scratch/step1_concat"),
            output_dir: PathBuf::from("scratch/step2_regrid_AUS-44i"),
            source_domain: "AUS-44".to_string(),
            target_domain: "AUS-44i".to_string(),
            target_grid: PathBuf::from("grids/AUS-44i.txt"),
            source_grid: None,
            rules: vec![
                RegridRule::new("pr", RegridMethod::Conservative),
                RegridRule::new("tas", RegridMethod::Bilinear),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogueConfig {
    /// Parent of the per-experiment directories to catalogue.
    pub input_dir: PathBuf,
    pub output: PathBuf,
    pub project: String,
    pub product: String,
    pub version: String,
    /// Log and skip unparsable filenames instead of aborting.
    pub skip_invalid: bool,
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("scratch/step2_regrid_AUS-44i"),
            output: PathBuf::from("scratch/catalogue.csv"),
            project: "CORDEX".to_string(),
            product: "output".to_string(),
            version: "v1".to_string(),
            skip_invalid: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    pub subset: SubsetConfig,
    pub calendar: CalendarConfig,
    pub fill: FillConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubsetConfig {
    pub input_dirs: Vec<PathBuf>,
    pub output_dir: PathBuf,
    /// Only files whose name starts with this are subset.
    pub file_prefix: String,
    pub bounds: LonLatBox,
}

impl Default for SubsetConfig {
    fn default() -> Self {
        Self {
            input_dirs: Vec::new(),
            output_dir: PathBuf::from("scratch/patch_subset"),
            file_prefix: "pr_".to_string(),
            bounds: LonLatBox {
                lon_min: 88.0,
                lon_max: 207.0,
                lat_min: -53.0,
                lat_max: 12.5,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Files, or directories whose `.nc` files are all fixed.
    pub inputs: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub reference_date: String,
    pub reference_time: String,
    pub units: String,
    pub calendar: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output_dir: PathBuf::from("scratch/patch_calendar"),
            reference_date: "1949-12-01".to_string(),
            reference_time: "00:00:00".to_string(),
            units: "days".to_string(),
            calendar: "365_day".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillBackend {
    #[default]
    Cdo,
    Native,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillConfig {
    /// Existing file of the same simulation providing grid and global attributes.
    pub template: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub year: i32,
    pub month: u32,
    pub variables: Vec<String>,
    pub calendar: String,
    pub reference_date: String,
    pub fill_value: f64,
    pub backend: FillBackend,
    /// Where `patch recalendar` writes the calendar-fixed fill files.
    pub recalendar_output_dir: PathBuf,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            template: None,
            output_dir: PathBuf::from("scratch/patch_fill"),
            year: 2006,
            month: 1,
            variables: strings(&["pr", "tasmax", "tasmin"]),
            calendar: "365_day".to_string(),
            reference_date: "1949-12-01".to_string(),
            fill_value: DEFAULT_FILL_VALUE,
            backend: FillBackend::Cdo,
            recalendar_output_dir: PathBuf::from("scratch/patch_fill_calendar"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicesConfig {
    /// Holds one directory per model run.
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
    /// Non-index files written alongside the indices.
    pub skip_files: Vec<String>,
    pub create_missing_dirs: bool,
}

impl Default for IndicesConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("scratch/indices"),
            dest_root: PathBuf::from("scratch/indices_sorted"),
            skip_files: strings(&["thresholds.nc", "warning.log", "README.txt", ".DS_Store"]),
            create_missing_dirs: false,
        }
    }
}
