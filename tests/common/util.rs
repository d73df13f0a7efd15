use std::path::{Path, PathBuf};

use h5slab::{Element, ElementType};
use tempfile::TempDir;

use super::gen::gen_ascii;

pub fn random_filename() -> String {
    format!("{}.h5", gen_ascii(&mut rand::thread_rng(), 8))
}

pub fn with_tmp_dir<F: FnOnce(PathBuf)>(func: F) {
    let dir = TempDir::new().unwrap();
    func(dir.path().to_path_buf());
}

pub fn with_tmp_path<F: FnOnce(PathBuf)>(func: F) {
    with_tmp_dir(|dir| func(dir.join(random_filename())))
}

fn read_as<T: Element>(path: &Path, name: &str) -> Vec<u8> {
    let file = hdf5::File::open(path).unwrap();
    let dataset = file.dataset(name).unwrap();
    dataset.read_raw::<T>().unwrap().into_iter().map(Element::to_byte).collect()
}

/// Reads a whole dataset as raw element bytes in row-major order.
pub fn read_dataset_bytes(path: &Path, name: &str, element_type: ElementType) -> Vec<u8> {
    match element_type {
        ElementType::Char => read_as::<i8>(path, name),
        ElementType::UChar => read_as::<u8>(path, name),
    }
}
