//! The slab writer: streams one fixed plane into every depth index of a rank-3 dataset.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use ndarray::Array3;

use crate::config::{ElementType, FailurePolicy, PlaneErrorPolicy, Shape, WriterConfig};
use crate::error::{Error, Result};
use crate::pattern::{pattern_plane, Element};
use crate::slab::Slab;
use crate::storage::{Hdf5Storage, SlabTarget, Storage};

/// Summary of a completed run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteReport {
    pub path: PathBuf,
    pub dataset: String,
    pub shape: Shape,
    pub element_type: ElementType,
    pub planes_written: usize,
    pub bytes_written: u64,
    /// Depth indices that could not be written; only non-empty under
    /// [`PlaneErrorPolicy::Continue`].
    pub failed_planes: Vec<usize>,
    pub elapsed: Duration,
}

impl fmt::Display for WriteReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "wrote {} plane(s) ({} bytes) of {} {} dataset {:?} to {} in {:.3}s",
            self.planes_written,
            self.bytes_written,
            self.shape,
            self.element_type,
            self.dataset,
            self.path.display(),
            self.elapsed.as_secs_f64()
        )
    }
}

/// Writes the dataset described by a [`WriterConfig`] through a [`Storage`] backend.
#[derive(Clone, Debug)]
pub struct SlabWriter<S = Hdf5Storage> {
    config: WriterConfig,
    storage: S,
}

impl SlabWriter<Hdf5Storage> {
    pub fn new(config: WriterConfig) -> Self {
        Self::with_storage(config, Hdf5Storage)
    }
}

impl<S: Storage> SlabWriter<S> {
    pub fn with_storage(config: WriterConfig, storage: S) -> Self {
        Self { config, storage }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Writes the dataset with the element type named in the configuration.
    pub fn run(&self) -> Result<WriteReport> {
        match self.config.element_type {
            ElementType::Char => self.write::<i8>(),
            ElementType::UChar => self.write::<u8>(),
        }
    }

    /// Writes the dataset with element type `T`, which must match the configured
    /// element type.
    ///
    /// The configuration is validated and the plane buffer allocated before the
    /// container is created, so those failures leave the filesystem untouched. Every
    /// later failure closes the container first and then applies the failure policy.
    pub fn write<T: Element>(&self) -> Result<WriteReport> {
        let config = &self.config;
        config.validate()?;
        if T::TYPE != config.element_type {
            return Err(Error::Validation(format!(
                "cannot write {} elements to a {} dataset",
                T::TYPE,
                config.element_type
            )));
        }
        let shape = config.shape();
        let start = Instant::now();

        let plane = pattern_plane::<T>(shape.height, shape.width)?;
        log::info!(
            "Writing {} dataset {:?} of shape {} to {}",
            T::TYPE,
            config.dataset,
            shape,
            config.path.display()
        );

        let mut target = match self.storage.create::<T>(
            &config.path,
            &config.dataset,
            shape,
            config.driver,
        ) {
            Ok(target) => target,
            Err(err @ Error::Open { .. }) => return Err(err),
            Err(err) => return Err(self.cleanup(err)),
        };

        let result = check_shape::<T, _>(&target, shape)
            .and_then(|_| self.write_planes(&mut target, &plane));
        self.release::<T>(target);
        let failed_planes = match result {
            Ok(failed) => failed,
            Err(err) => return Err(self.cleanup(err)),
        };

        let written = shape.depth - failed_planes.len();
        let plane_bytes = (plane.len() * T::TYPE.size()) as u64;
        let report = WriteReport {
            path: config.path.clone(),
            dataset: config.dataset.clone(),
            shape,
            element_type: T::TYPE,
            planes_written: written,
            bytes_written: written as u64 * plane_bytes,
            failed_planes,
            elapsed: start.elapsed(),
        };
        if !report.failed_planes.is_empty() {
            return Err(self.cleanup(Error::Incomplete { report: Box::new(report) }));
        }
        log::info!("Finished: {report}");
        Ok(report)
    }

    /// Transfers `plane` into every depth index and returns the indices that failed
    /// under the continue policy.
    fn write_planes<T: Element>(
        &self, target: &mut S::Target<T>, plane: &Array3<T>,
    ) -> Result<Vec<usize>> {
        let shape = self.config.shape();
        let (height, width) = (shape.height, shape.width);
        let progress_step = (shape.depth / 10).max(1);
        let mut failed = Vec::new();

        for z in 0..shape.depth {
            let slab = Slab::plane(z, height, width);
            match target.write_slab(&slab, plane.view()) {
                Ok(()) => log::trace!("Wrote plane {z} ({slab})"),
                Err(err) => {
                    let err = Error::write(z, err);
                    match self.config.on_plane_error {
                        PlaneErrorPolicy::Abort => return Err(err),
                        PlaneErrorPolicy::Continue => {
                            log::warn!("{err}; continuing");
                            failed.push(z);
                        }
                    }
                }
            }
            if (z + 1) % progress_step == 0 {
                log::debug!("Progress: {}/{} planes", z + 1, shape.depth);
            }
        }

        Ok(failed)
    }

    /// Closes the target; failures are logged and not escalated.
    fn release<T: Element>(&self, target: S::Target<T>) {
        if let Err(err) = target.close() {
            log::warn!("Failed to close {}: {err}", self.config.path.display());
        }
    }

    /// Applies the failure policy to a container that was created by this run.
    fn cleanup(&self, err: Error) -> Error {
        log::error!("Writing {} failed: {err}", self.config.path.display());
        if self.config.on_failure == FailurePolicy::Remove {
            match self.storage.discard(&self.config.path) {
                Ok(()) => log::info!("Removed {}", self.config.path.display()),
                Err(e) => log::warn!("Failed to remove {}: {e}", self.config.path.display()),
            }
        }
        err
    }
}

fn check_shape<T: Element, Tg: SlabTarget<T>>(target: &Tg, expected: Shape) -> Result<()> {
    let actual = target.shape().map_err(|err| Error::define("dataspace", err))?;
    if actual != expected {
        return Err(Error::define(
            "dataspace",
            format!("backend reports shape {actual}, expected {expected}"),
        ));
    }
    Ok(())
}
