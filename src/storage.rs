//! The storage seam between the slab writer and the library that persists datasets.
//!
//! A [`Storage`] creates a container holding one rank-3 dataset and hands back a
//! [`SlabTarget`] through which planes are transferred. [`Hdf5Storage`] persists to an
//! HDF5 file; [`MemoryStorage`] keeps everything in process memory and can be told to
//! fail at specific steps.

use std::path::Path;

use ndarray::ArrayView3;

use crate::config::{Driver, Shape};
use crate::error::Result;
use crate::pattern::Element;
use crate::slab::Slab;

pub mod h5;
pub mod memory;

pub use self::h5::{Hdf5Storage, Hdf5Target};
pub use self::memory::{MemoryContainer, MemoryStorage, MemoryTarget};

pub trait Storage {
    type Target<T: Element>: SlabTarget<T>;

    /// Creates the container at `path`, truncating any existing one, and defines a
    /// dataset named `dataset` with the given shape and element type `T`.
    ///
    /// Failing to create the container yields `Error::Open`; failing to define the
    /// dataset yields `Error::Define` after the container has been closed again.
    fn create<T: Element>(
        &self, path: &Path, dataset: &str, shape: Shape, driver: Driver,
    ) -> Result<Self::Target<T>>;

    /// Removes a container left behind by a failed run. Missing containers are ignored.
    fn discard(&self, path: &Path) -> Result<()>;
}

pub trait SlabTarget<T: Element> {
    /// Shape of the dataset as reported by the backend.
    fn shape(&self) -> Result<Shape>;

    /// Transfers `plane` into the region selected by `slab`.
    ///
    /// The shape of `plane` must equal `slab.out_shape()`.
    fn write_slab(&mut self, slab: &Slab, plane: ArrayView3<'_, T>) -> Result<()>;

    /// Releases the dataset, then closes the container.
    fn close(self) -> Result<()>;
}

pub(crate) fn check_transfer<T>(slab: &Slab, shape: &Shape, plane: &ArrayView3<'_, T>) -> Result<()> {
    slab.check(shape)?;
    ensure!(
        plane.shape() == &slab.out_shape()[..],
        "source shape {:?} does not match selection {}",
        plane.shape(),
        slab
    );
    Ok(())
}
