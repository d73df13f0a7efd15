use std::fmt::Debug;

use hdf5::H5Type;
use ndarray::{Array3, ArrayView2};

use crate::config::ElementType;
use crate::error::{Error, Result};

/// A single-byte element that can be stored in a slab dataset.
pub trait Element: H5Type + Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    const TYPE: ElementType;

    /// The element whose bit pattern is `byte`.
    fn from_byte(byte: u8) -> Self;

    /// The bit pattern of the element.
    fn to_byte(self) -> u8;

    /// The pattern element at flat plane offset `index`: `index mod 256`.
    fn at(index: usize) -> Self {
        Self::from_byte((index % 256) as u8)
    }
}

impl Element for u8 {
    const TYPE: ElementType = ElementType::UChar;

    fn from_byte(byte: u8) -> Self {
        byte
    }

    fn to_byte(self) -> u8 {
        self
    }
}

impl Element for i8 {
    const TYPE: ElementType = ElementType::Char;

    fn from_byte(byte: u8) -> Self {
        byte as Self
    }

    fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Allocates one plane shaped `[1, height, width]` and fills it with the pattern.
///
/// The allocation is fallible: if the buffer cannot be reserved, `Error::Allocation`
/// is returned instead of aborting the process.
pub fn pattern_plane<T: Element>(height: usize, width: usize) -> Result<Array3<T>> {
    let len = height
        .checked_mul(width)
        .ok_or_else(|| Error::Validation(format!("plane {height}x{width} overflows")))?;
    let mut buf: Vec<T> = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| Error::Allocation { bytes: len * T::TYPE.size() })?;
    buf.extend((0..len).map(T::at));
    Ok(Array3::from_shape_vec((1, height, width), buf)?)
}

/// Finds the first element of `plane` that deviates from the pattern.
///
/// Returns `(offset, expected, found)` as raw bytes.
pub fn first_mismatch<T: Element>(plane: ArrayView2<T>) -> Option<(usize, u8, u8)> {
    plane.iter().enumerate().find_map(|(i, &v)| {
        let expected = T::at(i).to_byte();
        let found = v.to_byte();
        (expected != found).then_some((i, expected, found))
    })
}

#[cfg(test)]
pub mod tests {
    use ndarray::Array2;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    pub fn test_small_plane() {
        let plane = pattern_plane::<u8>(2, 4).unwrap();
        assert_eq!(plane.shape(), &[1, 2, 4]);
        assert_eq!(plane.as_slice().unwrap(), &[0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    pub fn test_wraps_at_256() {
        let plane = pattern_plane::<u8>(1, 300).unwrap();
        let expected: Vec<u8> = (0..=255).chain(0..44).collect();
        assert_eq!(plane.as_slice().unwrap(), expected.as_slice());
    }

    #[test]
    pub fn test_char_bit_pattern() {
        let plane = pattern_plane::<i8>(16, 16).unwrap();
        let bytes: Vec<u8> = plane.iter().map(|v| v.to_byte()).collect();
        assert_eq!(bytes, (0..=255).collect::<Vec<u8>>());
        assert_eq!(plane[[0, 8, 0]], -128);
        assert_eq!(plane[[0, 15, 15]], -1);
    }

    #[test]
    pub fn test_first_mismatch() {
        let mut plane = Array2::from_shape_fn((3, 100), |(j, i)| u8::at(j * 100 + i));
        assert_eq!(first_mismatch(plane.view()), None);
        plane[[2, 10]] = 0;
        assert_eq!(first_mismatch(plane.view()), Some((210, 210, 0)));
    }

    #[test]
    pub fn test_overflow() {
        assert_err!(pattern_plane::<u8>(usize::MAX, 2), "overflows");
    }
}
