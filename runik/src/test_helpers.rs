//! Helpers for constructing test fixtures.

use runik_types::Scalar;

use crate::font_data::FontData;

/// A big-endian byte buffer with a chainable typed push, for building
/// binary fixtures in tests.
#[derive(Debug, Default, Clone)]
pub struct BeBuffer(Vec<u8>);

impl BeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<T: Scalar>(mut self, value: T) -> Self {
        value.write(&mut self.0);
        self
    }

    pub fn extend(mut self, iter: impl IntoIterator<Item = u8>) -> Self {
        self.0.extend(iter);
        self
    }

    pub fn push_all<T: Scalar + Copy>(mut self, values: &[T]) -> Self {
        for value in values {
            value.write(&mut self.0);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn font_data(&self) -> FontData<'_> {
        FontData::new(&self.0)
    }

    pub fn to_vec(self) -> Vec<u8> {
        self.0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}
