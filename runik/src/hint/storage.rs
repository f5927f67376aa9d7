//! The storage area.

use super::error::HintErrorKind;

/// The interpreter's scratch word array, sized by `maxp.maxStorage`.
pub struct Storage {
    words: Vec<i32>,
}

impl Storage {
    pub fn new(size: usize) -> Self {
        Storage {
            words: vec![0; size],
        }
    }

    pub fn read(&self, index: usize) -> Result<i32, HintErrorKind> {
        self.words
            .get(index)
            .copied()
            .ok_or(HintErrorKind::InvalidStorageIndex(index))
    }

    pub fn write(&mut self, index: usize, value: i32) -> Result<(), HintErrorKind> {
        *self
            .words
            .get_mut(index)
            .ok_or(HintErrorKind::InvalidStorageIndex(index))? = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_checked_access() {
        let mut storage = Storage::new(2);
        storage.write(1, -5).unwrap();
        assert_eq!(storage.read(1), Ok(-5));
        assert_eq!(storage.read(0), Ok(0));
        assert_eq!(storage.read(2), Err(HintErrorKind::InvalidStorageIndex(2)));
        assert!(storage.write(9, 1).is_err());
    }
}
