use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::ArrayView3;
use parking_lot::Mutex;

use crate::config::{Driver, ElementType, Shape};
use crate::error::{Error, Result};
use crate::pattern::Element;
use crate::slab::Slab;
use crate::storage::{check_transfer, SlabTarget, Storage};

/// A container held by [`MemoryStorage`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryContainer {
    pub dataset: String,
    pub shape: Shape,
    pub element_type: ElementType,
    /// Dataset contents in row-major order, one byte per element.
    pub data: Vec<u8>,
    pub closed: bool,
}

impl MemoryContainer {
    /// Bytes of plane `z`, if it exists.
    pub fn plane(&self, z: usize) -> Option<&[u8]> {
        let len = self.shape.plane_len()?;
        if z >= self.shape.depth {
            return None;
        }
        self.data.get(z * len..(z + 1) * len)
    }
}

#[derive(Debug, Default)]
struct Faults {
    create: bool,
    define: bool,
    close: bool,
    planes: HashSet<usize>,
}

#[derive(Debug, Default)]
struct Inner {
    containers: HashMap<PathBuf, MemoryContainer>,
    faults: Faults,
    writes: usize,
}

/// Process-local storage. Clones share the same containers.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next container creations fail.
    pub fn fail_create(&self) -> &Self {
        self.inner.lock().faults.create = true;
        self
    }

    /// Makes dataset definition fail after the container has been created.
    pub fn fail_define(&self) -> &Self {
        self.inner.lock().faults.define = true;
        self
    }

    /// Makes every transfer into plane `z` fail.
    pub fn fail_plane(&self, z: usize) -> &Self {
        self.inner.lock().faults.planes.insert(z);
        self
    }

    /// Makes closing containers fail.
    pub fn fail_close(&self) -> &Self {
        self.inner.lock().faults.close = true;
        self
    }

    pub fn clear_faults(&self) -> &Self {
        self.inner.lock().faults = Faults::default();
        self
    }

    pub fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        self.inner.lock().containers.contains_key(path.as_ref())
    }

    /// A snapshot of the container at `path`.
    pub fn container<P: AsRef<Path>>(&self, path: P) -> Option<MemoryContainer> {
        self.inner.lock().containers.get(path.as_ref()).cloned()
    }

    /// Number of successful slab transfers since creation.
    pub fn writes(&self) -> usize {
        self.inner.lock().writes
    }
}

impl Storage for MemoryStorage {
    type Target<T: Element> = MemoryTarget<T>;

    fn create<T: Element>(
        &self, path: &Path, dataset: &str, shape: Shape, _driver: Driver,
    ) -> Result<MemoryTarget<T>> {
        let mut inner = self.inner.lock();
        if inner.faults.create {
            return Err(Error::open(path, "injected container failure"));
        }
        let len = shape.len().ok_or_else(|| format!("dataset shape {shape} overflows"))?;
        let mut container = MemoryContainer {
            dataset: String::new(),
            shape,
            element_type: T::TYPE,
            data: Vec::new(),
            closed: false,
        };
        if inner.faults.define {
            container.closed = true;
            inner.containers.insert(path.to_owned(), container);
            return Err(Error::define("dataset", "injected dataset failure"));
        }
        let mut data: Vec<u8> = Vec::new();
        data.try_reserve_exact(len).map_err(|_| Error::Allocation { bytes: len })?;
        data.resize(len, 0);
        container.dataset = dataset.to_owned();
        container.data = data;
        inner.containers.insert(path.to_owned(), container);
        Ok(MemoryTarget {
            storage: self.clone(),
            path: path.to_owned(),
            shape,
            _marker: PhantomData,
        })
    }

    fn discard(&self, path: &Path) -> Result<()> {
        self.inner.lock().containers.remove(path);
        Ok(())
    }
}

/// An open in-memory dataset.
#[derive(Debug)]
pub struct MemoryTarget<T> {
    storage: MemoryStorage,
    path: PathBuf,
    shape: Shape,
    _marker: PhantomData<T>,
}

/// Indices selected along one axis.
fn axis_indices(offset: usize, stride: usize, count: usize, block: usize) -> Vec<usize> {
    (0..count).flat_map(|k| (0..block).map(move |j| offset + k * stride + j)).collect()
}

impl<T: Element> SlabTarget<T> for MemoryTarget<T> {
    fn shape(&self) -> Result<Shape> {
        let inner = self.storage.inner.lock();
        let container = inner.containers.get(&self.path).ok_or("container was discarded")?;
        Ok(container.shape)
    }

    fn write_slab(&mut self, slab: &Slab, plane: ArrayView3<'_, T>) -> Result<()> {
        check_transfer(slab, &self.shape, &plane)?;
        let mut inner = self.storage.inner.lock();
        if (slab.offset[0]..slab.offset[0] + slab.out_shape()[0])
            .any(|z| inner.faults.planes.contains(&z))
        {
            fail!("injected write failure");
        }
        let container = inner.containers.get_mut(&self.path).ok_or("container was discarded")?;
        ensure!(!container.closed, "container is closed");
        let axes: Vec<Vec<usize>> = (0..3)
            .map(|i| axis_indices(slab.offset[i], slab.stride[i], slab.count[i], slab.block[i]))
            .collect();
        let (h, w) = (self.shape.height, self.shape.width);
        let mut values = plane.iter();
        for &z in &axes[0] {
            for &y in &axes[1] {
                for &x in &axes[2] {
                    if let Some(&v) = values.next() {
                        container.data[(z * h + y) * w + x] = v.to_byte();
                    }
                }
            }
        }
        inner.writes += 1;
        Ok(())
    }

    fn close(self) -> Result<()> {
        let mut inner = self.storage.inner.lock();
        if inner.faults.close {
            return Err("injected close failure".into());
        }
        if let Some(container) = inner.containers.get_mut(&self.path) {
            container.closed = true;
        }
        Ok(())
    }
}
