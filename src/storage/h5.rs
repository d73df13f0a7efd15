use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::Path;

use hdf5::{Dataset, File, Hyperslab};
use ndarray::ArrayView3;

use crate::config::{Driver, Shape};
use crate::error::{Error, Result};
use crate::pattern::Element;
use crate::slab::Slab;
use crate::storage::{check_transfer, SlabTarget, Storage};

/// Persists datasets to HDF5 files through the `hdf5` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct Hdf5Storage;

impl Hdf5Storage {
    pub fn new() -> Self {
        Self
    }
}

pub(crate) fn create_file(path: &Path, driver: Driver) -> hdf5::Result<File> {
    let mut builder = File::with_options();
    match driver {
        Driver::Sec2 => builder.with_fapl(|p| p.sec2()),
        Driver::Stdio => builder.with_fapl(|p| p.stdio()),
        Driver::Core => builder.with_fapl(|p| p.core_filebacked(true)),
    };
    builder.create(path)
}

impl Storage for Hdf5Storage {
    type Target<T: Element> = Hdf5Target<T>;

    fn create<T: Element>(
        &self, path: &Path, dataset: &str, shape: Shape, driver: Driver,
    ) -> Result<Hdf5Target<T>> {
        let file = create_file(path, driver).map_err(|err| Error::open(path, err))?;
        log::debug!("Created container {} ({:?} driver)", path.display(), driver);
        // contiguous layout, no filters, default fill value, no timestamps
        let dataset = file
            .new_dataset::<T>()
            .no_chunk()
            .obj_track_times(false)
            .shape((shape.depth, shape.height, shape.width))
            .create(dataset)
            .map_err(|err| Error::define("dataset", err))?;
        log::debug!("Created dataset {} of shape {} ({})", dataset.name(), shape, T::TYPE);
        Ok(Hdf5Target { dataset, file, shape, _marker: PhantomData })
    }

    fn discard(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

/// An open HDF5 dataset accepting slab transfers.
#[derive(Debug)]
pub struct Hdf5Target<T> {
    // dropped before the file
    dataset: Dataset,
    file: File,
    shape: Shape,
    _marker: PhantomData<T>,
}

impl<T> Hdf5Target<T> {
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn file(&self) -> &File {
        &self.file
    }
}

impl<T: Element> SlabTarget<T> for Hdf5Target<T> {
    fn shape(&self) -> Result<Shape> {
        Shape::try_from(self.dataset.shape().as_slice())
    }

    fn write_slab(&mut self, slab: &Slab, plane: ArrayView3<'_, T>) -> Result<()> {
        check_transfer(slab, &self.shape, &plane)?;
        self.dataset.write_slice(plane, Hyperslab::from(*slab))?;
        Ok(())
    }

    fn close(self) -> Result<()> {
        let Self { dataset, file, .. } = self;
        drop(dataset);
        file.close()?;
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::pattern::pattern_plane;
    use crate::test::with_tmp_path;

    #[test]
    pub fn test_create_and_shape() {
        with_tmp_path(|path| {
            let target = Hdf5Storage
                .create::<u8>(&path, "CharArray", Shape::new(3, 2, 4), Driver::Sec2)
                .unwrap();
            assert_eq!(target.shape().unwrap(), Shape::new(3, 2, 4));
            assert!(!target.dataset().is_chunked());
            target.close().unwrap();

            let file = File::open(&path).unwrap();
            assert_eq!(file.dataset("CharArray").unwrap().shape(), vec![3, 2, 4]);
        });
    }

    #[test]
    pub fn test_write_slab() {
        with_tmp_path(|path| {
            let mut target =
                Hdf5Storage.create::<i8>(&path, "data", Shape::new(2, 2, 4), Driver::Core).unwrap();
            let plane = pattern_plane::<i8>(2, 4).unwrap();
            target.write_slab(&Slab::plane(1, 2, 4), plane.view()).unwrap();
            let stored = target.dataset().read_raw::<i8>().unwrap();
            assert_eq!(stored, vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7]);

            assert_err!(
                target.write_slab(&Slab::plane(2, 2, 4), plane.view()),
                "out of bounds for shape 2x2x4"
            );
            assert_err!(
                target.write_slab(&Slab::plane(0, 2, 2), plane.view()),
                "source shape \\[1, 2, 4\\] does not match selection"
            );
            target.close().unwrap();
        });
    }

    #[test]
    pub fn test_open_failure() {
        with_tmp_path(|path| {
            let path = path.join("missing").join("dir.h5");
            let err = Hdf5Storage
                .create::<u8>(&path, "data", Shape::new(1, 1, 1), Driver::Sec2)
                .unwrap_err();
            assert!(matches!(err, Error::Open { .. }), "{err:?}");
        });
    }

    #[test]
    pub fn test_discard() {
        with_tmp_path(|path| {
            Hdf5Storage.discard(&path).unwrap();
            Hdf5Storage.create::<u8>(&path, "d", Shape::new(1, 1, 1), Driver::Sec2).unwrap();
            assert!(path.exists());
            Hdf5Storage.discard(&path).unwrap();
            assert!(!path.exists());
        });
    }
}
