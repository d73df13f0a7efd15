use std::iter;

use h5slab::Shape;
use rand::distributions::Alphanumeric;
use rand::prelude::Rng;

pub fn gen_ascii<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    iter::repeat(()).map(|_| rng.sample(Alphanumeric)).map(char::from).take(len).collect()
}

/// Small random shape; planes are sometimes larger than 256 elements so the pattern wraps.
pub fn gen_shape<R: Rng + ?Sized>(rng: &mut R) -> Shape {
    Shape::new(rng.gen_range(1..6), rng.gen_range(1..24), rng.gen_range(1..48))
}
