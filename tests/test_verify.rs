use h5slab::{
    dataset_shape, read_plane, verify, verify_as, ElementType, Error, Hdf5Storage, Shape, Slab,
    SlabTarget, SlabWriter, Storage, WriterConfig,
};
use hdf5::datatype::ByteOrder;
use ndarray::Array3;
use pretty_assertions::assert_eq;

#[macro_use]
mod common;

use self::common::util::with_tmp_path;

#[test]
fn test_verify_written() {
    with_tmp_path(|path| {
        let config = WriterConfig::new(&path, 5, 20, 20).with_element_type(ElementType::UChar);
        SlabWriter::new(config).run().unwrap();

        let report = verify_as(ElementType::UChar, &path, "CharArray", Shape::new(5, 20, 20), None)
            .unwrap();
        assert_eq!(report.planes_checked, 5);
        assert_eq!(report.dataset, "CharArray");
        assert_ne!(report.byte_order, ByteOrder::BigEndian);

        let report = verify::<u8, _>(&path, "CharArray", Shape::new(5, 20, 20), Some(&[4, 0]))
            .unwrap();
        assert_eq!(report.planes_checked, 2);

        let plane = read_plane::<u8, _>(&path, "CharArray", 3).unwrap();
        assert_eq!(plane[[12, 16]], 0);
        assert_eq!(plane[[19, 19]], 143);
    });
}

#[test]
fn test_unwritten_plane_is_reported() {
    with_tmp_path(|path| {
        let shape = Shape::new(3, 2, 2);
        let mut target = Hdf5Storage.create::<i8>(&path, "CharArray", shape, Default::default())
            .unwrap();
        let plane = Array3::from_shape_vec((1, 2, 2), vec![0i8, 1, 2, 3]).unwrap();
        target.write_slab(&Slab::plane(0, 2, 2), plane.view()).unwrap();
        target.write_slab(&Slab::plane(2, 2, 2), plane.view()).unwrap();
        target.close().unwrap();

        verify::<i8, _>(&path, "CharArray", shape, Some(&[0, 2])).unwrap();
        let err = verify::<i8, _>(&path, "CharArray", shape, None).unwrap_err();
        assert!(
            matches!(err, Error::Mismatch { plane: 1, offset: 1, expected: 1, found: 0 }),
            "{err:?}"
        );
    });
}

#[test]
fn test_wrong_expectations() {
    with_tmp_path(|path| {
        SlabWriter::new(WriterConfig::new(&path, 2, 3, 4)).run().unwrap();
        assert_eq!(dataset_shape(&path, "CharArray").unwrap(), Shape::new(2, 3, 4));
        assert_err!(
            verify::<i8, _>(&path, "CharArray", Shape::new(2, 4, 3), None),
            "has shape 2x3x4, expected 2x4x3"
        );
        assert_err!(
            verify::<i8, _>(&path, "CharArray", Shape::new(2, 3, 4), Some(&[2])),
            "plane 2 out of range"
        );
        assert!(verify::<i8, _>(&path, "Missing", Shape::new(2, 3, 4), None).is_err());
    });
}

#[test]
fn test_unsigned_dataset_checked_as_char() {
    with_tmp_path(|path| {
        let config = WriterConfig::new(&path, 2, 1, 129).with_element_type(ElementType::UChar);
        SlabWriter::new(config).run().unwrap();
        let shape = Shape::new(2, 1, 129);
        verify_as(ElementType::UChar, &path, "CharArray", shape, None).unwrap();

        let err = verify_as(ElementType::Char, &path, "CharArray", shape, None).unwrap_err();
        assert!(err.plane().is_none(), "{err:?}");
        assert_err!(Err::<(), _>(err), "expected char");
    });
}
