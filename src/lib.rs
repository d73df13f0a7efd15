//! Plane-by-plane streaming writer for large three-dimensional HDF5 datasets.
//!
//! The writer fills one `height x width` plane with the byte pattern `i mod 256` and
//! transfers it into every depth index of a `depth x height x width` dataset, selecting
//! one hyperslab per plane. Only one plane is ever held in memory.
//!
//! ```no_run
//! use h5slab::{SlabWriter, WriterConfig};
//!
//! let config = WriterConfig::new("SDS.h5", 16, 1024, 1024);
//! let report = SlabWriter::new(config).run()?;
//! assert_eq!(report.planes_written, 16);
//! # Ok::<(), h5slab::Error>(())
//! ```
//!
//! Storage goes through the [`Storage`] trait. [`Hdf5Storage`] is the HDF5 backend;
//! [`MemoryStorage`] keeps containers in memory and can inject failures.

#![cfg_attr(not(test), allow(dead_code))]

#[macro_use]
mod macros;

mod config;
mod error;
mod pattern;
mod slab;
pub mod storage;
mod verify;
mod writer;


pub use crate::config::{
    Driver, ElementType, FailurePolicy, PlaneErrorPolicy, Shape, WriterConfig, DEFAULT_DATASET,
    REFERENCE_SHAPE,
};
pub use crate::error::{Error, Result};
pub use crate::pattern::{first_mismatch, pattern_plane, Element};
pub use crate::slab::Slab;
pub use crate::storage::{
    Hdf5Storage, MemoryContainer, MemoryStorage, SlabTarget, Storage,
};
pub use crate::verify::{dataset_shape, read_plane, verify, verify_as, VerifyReport};
pub use crate::writer::{SlabWriter, WriteReport};

/// Returns the runtime version of the HDF5 library.
pub fn library_version() -> (u8, u8, u8) {
    hdf5::library_version()
}
