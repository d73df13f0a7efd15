use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::PathBuf;

use ndarray::ShapeError;

use crate::writer::WriteReport;

/// The error type for slab writing and verification.
#[derive(Debug)]
pub enum Error {
    /// The configuration was rejected before any allocation or file I/O.
    Validation(String),
    /// A configuration file could not be read or parsed.
    Config(String),
    /// The plane buffer could not be allocated.
    Allocation { bytes: usize },
    /// The container could not be created or opened.
    Open { path: PathBuf, source: Box<Error> },
    /// The dataset, its datatype or its dataspace could not be defined.
    Define { what: &'static str, source: Box<Error> },
    /// Transferring one plane into the dataset failed.
    Write { plane: usize, source: Box<Error> },
    /// One or more planes failed under the continue-on-error policy; the report lists
    /// them in `failed_planes` and counts the planes that were written.
    Incomplete { report: Box<WriteReport> },
    /// Reading a plane back from the dataset failed.
    Read { plane: usize, source: Box<Error> },
    /// A stored element differs from the expected pattern.
    Mismatch { plane: usize, offset: usize, expected: u8, found: u8 },
    /// An error reported by the HDF5 library.
    HDF5(hdf5::Error),
    /// A filesystem error outside of HDF5.
    Io(io::Error),
    /// Any other failure, e.g. an inconsistent slab or an injected fault.
    Internal(String),
}

/// A type for results generated by this crate where the `Err` type is `h5slab::Error`.
pub type Result<T, E = Error> = ::std::result::Result<T, E>;

impl Error {
    pub(crate) fn open<E: Into<Self>>(path: impl Into<PathBuf>, err: E) -> Self {
        Self::Open { path: path.into(), source: Box::new(err.into()) }
    }

    pub(crate) fn define<E: Into<Self>>(what: &'static str, err: E) -> Self {
        Self::Define { what, source: Box::new(err.into()) }
    }

    pub(crate) fn write<E: Into<Self>>(plane: usize, err: E) -> Self {
        Self::Write { plane, source: Box::new(err.into()) }
    }

    pub(crate) fn read<E: Into<Self>>(plane: usize, err: E) -> Self {
        Self::Read { plane, source: Box::new(err.into()) }
    }

    /// Returns the depth index of the plane this error is attributed to, if any.
    pub fn plane(&self) -> Option<usize> {
        match *self {
            Self::Write { plane, .. } | Self::Read { plane, .. } | Self::Mismatch { plane, .. } => {
                Some(plane)
            }
            _ => None,
        }
    }

    /// The partial report of a run that finished with failed planes.
    pub fn report(&self) -> Option<&WriteReport> {
        match *self {
            Self::Incomplete { ref report } => Some(report.as_ref()),
            _ => None,
        }
    }

    /// Returns `true` if the error was raised before the container was touched.
    pub fn is_before_io(&self) -> bool {
        matches!(*self, Self::Validation(_) | Self::Config(_) | Self::Allocation { .. })
    }
}

impl From<&str> for Error {
    fn from(desc: &str) -> Self {
        Self::Internal(desc.into())
    }
}

impl From<String> for Error {
    fn from(desc: String) -> Self {
        Self::Internal(desc)
    }
}

impl From<hdf5::Error> for Error {
    fn from(err: hdf5::Error) -> Self {
        Self::HDF5(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ShapeError> for Error {
    fn from(err: ShapeError) -> Self {
        format!("shape error: {err}").into()
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Validation(ref desc) => write!(f, "invalid configuration: {desc}"),
            Self::Config(ref desc) => write!(f, "config error: {desc}"),
            Self::Allocation { bytes } => write!(f, "unable to allocate plane buffer of {bytes} bytes"),
            Self::Open { ref path, ref source } => {
                write!(f, "unable to create container {}: {source}", path.display())
            }
            Self::Define { what, ref source } => write!(f, "unable to create {what}: {source}"),
            Self::Write { plane, ref source } => write!(f, "failed to write plane {plane}: {source}"),
            Self::Incomplete { ref report } => write!(
                f,
                "{} plane(s) failed to write: {:?}",
                report.failed_planes.len(),
                report.failed_planes
            ),
            Self::Read { plane, ref source } => write!(f, "failed to read plane {plane}: {source}"),
            Self::Mismatch { plane, offset, expected, found } => write!(
                f,
                "plane {plane}: element {offset} is {found:#04x}, expected {expected:#04x}"
            ),
            Self::HDF5(ref err) => fmt::Display::fmt(err, f),
            Self::Io(ref err) => fmt::Display::fmt(err, f),
            Self::Internal(ref desc) => f.write_str(desc),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            Self::Open { ref source, .. }
            | Self::Define { ref source, .. }
            | Self::Write { ref source, .. }
            | Self::Read { ref source, .. } => Some(source.as_ref()),
            Self::HDF5(ref err) => Some(err),
            Self::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        Self::new(io::ErrorKind::Other, err)
    }
}
