//! Reading a written container back and checking it against the pattern.

use std::path::{Path, PathBuf};

use hdf5::datatype::ByteOrder;
use hdf5::{Dataset, Datatype, File};
use ndarray::Array2;

use crate::config::{ElementType, Shape};
use crate::error::{Error, Result};
use crate::pattern::{first_mismatch, Element};

/// Summary of a successful verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyReport {
    pub path: PathBuf,
    pub dataset: String,
    pub shape: Shape,
    pub element_type: ElementType,
    pub byte_order: ByteOrder,
    pub planes_checked: usize,
}

fn open_dataset(path: &Path, name: &str) -> Result<(File, Dataset)> {
    let file = File::open(path).map_err(|err| Error::open(path, err))?;
    let dataset = file.dataset(name)?;
    Ok((file, dataset))
}

/// Rejects datasets whose stored element type is not exactly `T`, so that a signed
/// read of an unsigned dataset is not silently clipped by HDF5's conversion.
fn check_element_type<T: Element>(name: &str, dataset: &Dataset) -> Result<Datatype> {
    let dtype = dataset.dtype()?;
    let stored = dtype.to_descriptor()?;
    ensure!(
        stored == T::type_descriptor(),
        "dataset {:?} stores {:?} elements, expected {}",
        name,
        stored,
        T::TYPE
    );
    Ok(dtype)
}

/// Returns the persisted shape of dataset `name` in the container at `path`.
pub fn dataset_shape<P: AsRef<Path>>(path: P, name: &str) -> Result<Shape> {
    let (_file, dataset) = open_dataset(path.as_ref(), name)?;
    Shape::try_from(dataset.shape().as_slice())
}

/// Reads plane `z` of dataset `name` as a `height x width` array.
pub fn read_plane<T: Element, P: AsRef<Path>>(path: P, name: &str, z: usize) -> Result<Array2<T>> {
    let (_file, dataset) = open_dataset(path.as_ref(), name)?;
    check_element_type::<T>(name, &dataset)?;
    dataset.read_slice_2d::<T, _>((z, .., ..)).map_err(|err| Error::read(z, err))
}

/// Checks shape, element type and contents of dataset `name`.
///
/// `planes` selects the depth indices to compare against the pattern; `None` checks all
/// of them.
pub fn verify<T: Element, P: AsRef<Path>>(
    path: P, name: &str, expected: Shape, planes: Option<&[usize]>,
) -> Result<VerifyReport> {
    let path = path.as_ref();
    let (_file, dataset) = open_dataset(path, name)?;

    let shape = Shape::try_from(dataset.shape().as_slice())?;
    ensure!(shape == expected, "dataset {:?} has shape {}, expected {}", name, shape, expected);
    let dtype = check_element_type::<T>(name, &dataset)?;

    let all: Vec<usize>;
    let planes = match planes {
        Some(planes) => planes,
        None => {
            all = (0..shape.depth).collect();
            &all
        }
    };

    for &z in planes {
        ensure!(z < shape.depth, "plane {} out of range for shape {}", z, shape);
        let plane: Array2<T> =
            dataset.read_slice_2d((z, .., ..)).map_err(|err| Error::read(z, err))?;
        if let Some((offset, expected, found)) = first_mismatch(plane.view()) {
            return Err(Error::Mismatch { plane: z, offset, expected, found });
        }
        log::trace!("Plane {z} matches");
    }

    let report = VerifyReport {
        path: path.to_owned(),
        dataset: name.to_owned(),
        shape,
        element_type: T::TYPE,
        byte_order: dtype.byte_order(),
        planes_checked: planes.len(),
    };
    log::info!("Verified {} plane(s) of {} in {}", report.planes_checked, name, path.display());
    Ok(report)
}

/// Runs [`verify`] with the element type chosen at runtime.
pub fn verify_as<P: AsRef<Path>>(
    element_type: ElementType, path: P, name: &str, expected: Shape, planes: Option<&[usize]>,
) -> Result<VerifyReport> {
    match element_type {
        ElementType::Char => verify::<i8, _>(path, name, expected, planes),
        ElementType::UChar => verify::<u8, _>(path, name, expected, planes),
    }
}
