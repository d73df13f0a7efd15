//! Writer configuration.
//!
//! A [`WriterConfig`] can be built in code, parsed from TOML, or assembled by the
//! command-line front-end. It must pass [`WriterConfig::validate`] before anything is
//! allocated or any file is touched.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the dataset written by the reference configuration.
pub const DEFAULT_DATASET: &str = "CharArray";

/// Dimensions of the reference configuration as `(depth, height, width)`.
pub const REFERENCE_SHAPE: (usize, usize, usize) = (102_400, 1024, 1024);

/// Shape of a rank-3 dataset: `depth x height x width`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    pub depth: usize,
    pub height: usize,
    pub width: usize,
}

impl Shape {
    pub const fn new(depth: usize, height: usize, width: usize) -> Self {
        Self { depth, height, width }
    }

    /// Number of elements in one plane, or `None` on overflow.
    pub fn plane_len(&self) -> Option<usize> {
        self.height.checked_mul(self.width)
    }

    /// Number of elements in the whole dataset, or `None` on overflow.
    pub fn len(&self) -> Option<usize> {
        self.plane_len().and_then(|n| n.checked_mul(self.depth))
    }

    pub fn is_empty(&self) -> bool {
        self.depth == 0 || self.height == 0 || self.width == 0
    }

    pub fn dims(&self) -> [usize; 3] {
        [self.depth, self.height, self.width]
    }
}

impl From<(usize, usize, usize)> for Shape {
    fn from((depth, height, width): (usize, usize, usize)) -> Self {
        Self::new(depth, height, width)
    }
}

impl TryFrom<&[usize]> for Shape {
    type Error = Error;

    fn try_from(dims: &[usize]) -> Result<Self> {
        match *dims {
            [depth, height, width] => Ok(Self::new(depth, height, width)),
            _ => fail!("expected a rank-3 shape, got {:?}", dims),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}x{}", self.depth, self.height, self.width)
    }
}

/// Element type stored in the dataset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Signed 1-byte character (`i8`), the native `char` of the reference program.
    #[default]
    Char,
    /// Unsigned 1-byte character (`u8`).
    UChar,
}

impl ElementType {
    pub fn size(self) -> usize {
        1
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::UChar => "uchar",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "char" | "i8" | "schar" => Ok(Self::Char),
            "uchar" | "u8" => Ok(Self::UChar),
            _ => fail!(Error::Validation(format!("unknown element type: {s:?}"))),
        }
    }
}

/// HDF5 file driver used for the container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    /// POSIX unbuffered I/O.
    #[default]
    Sec2,
    /// Buffered C stdio.
    Stdio,
    /// Whole file held in memory and written out when closed.
    Core,
}

impl FromStr for Driver {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sec2" => Ok(Self::Sec2),
            "stdio" => Ok(Self::Stdio),
            "core" => Ok(Self::Core),
            _ => fail!(Error::Validation(format!("unknown file driver: {s:?}"))),
        }
    }
}

/// What to do when a single plane fails to write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaneErrorPolicy {
    /// Stop at the first failed plane.
    #[default]
    Abort,
    /// Record the failed plane and carry on with the next one.
    Continue,
}

/// What to do with the container after a failed run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Leave the partially written container in place.
    #[default]
    Keep,
    /// Delete the container.
    Remove,
}

/// Everything the slab writer needs to know about a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriterConfig {
    pub path: PathBuf,
    #[serde(default = "default_dataset")]
    pub dataset: String,
    pub depth: usize,
    pub height: usize,
    pub width: usize,
    #[serde(default)]
    pub element_type: ElementType,
    #[serde(default)]
    pub driver: Driver,
    #[serde(default)]
    pub on_plane_error: PlaneErrorPolicy,
    #[serde(default)]
    pub on_failure: FailurePolicy,
}

fn default_dataset() -> String {
    DEFAULT_DATASET.to_owned()
}

impl WriterConfig {
    pub fn new<P: Into<PathBuf>>(path: P, depth: usize, height: usize, width: usize) -> Self {
        Self {
            path: path.into(),
            dataset: default_dataset(),
            depth,
            height,
            width,
            element_type: ElementType::default(),
            driver: Driver::default(),
            on_plane_error: PlaneErrorPolicy::default(),
            on_failure: FailurePolicy::default(),
        }
    }

    /// The configuration of the reference program: a 102400x1024x1024 char dataset.
    pub fn reference<P: Into<PathBuf>>(path: P) -> Self {
        let (depth, height, width) = REFERENCE_SHAPE;
        Self::new(path, depth, height, width)
    }

    pub fn with_dataset<S: Into<String>>(mut self, dataset: S) -> Self {
        self.dataset = dataset.into();
        self
    }

    pub fn with_element_type(mut self, element_type: ElementType) -> Self {
        self.element_type = element_type;
        self
    }

    pub fn with_driver(mut self, driver: Driver) -> Self {
        self.driver = driver;
        self
    }

    pub fn with_plane_error_policy(mut self, policy: PlaneErrorPolicy) -> Self {
        self.on_plane_error = policy;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }

    pub fn shape(&self) -> Shape {
        Shape::new(self.depth, self.height, self.width)
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("unable to read {}: {err}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Rejects configurations that would create an empty or malformed dataset.
    pub fn validate(&self) -> Result<()> {
        let invalid = |desc: String| Err(Error::Validation(desc));
        if self.path.as_os_str().is_empty() {
            return invalid("path must not be empty".into());
        }
        if self.dataset.is_empty() || self.dataset.split('/').any(str::is_empty) {
            return invalid(format!("invalid dataset name: {:?}", self.dataset));
        }
        for (name, value) in [("depth", self.depth), ("height", self.height), ("width", self.width)]
        {
            if value == 0 {
                return invalid(format!("{name} must be positive"));
            }
        }
        if self.shape().len().is_none() {
            return invalid(format!("dataset shape {} overflows", self.shape()));
        }
        Ok(())
    }
}
