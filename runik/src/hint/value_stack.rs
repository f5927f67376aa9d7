//! The interpreter's value stack.

use super::error::HintErrorKind;

/// Stack of 32-bit values with a fixed capacity taken from `maxp`.
pub struct ValueStack {
    values: Vec<i32>,
    limit: usize,
}

impl ValueStack {
    pub fn new(limit: usize) -> Self {
        ValueStack {
            values: Vec::with_capacity(limit.min(1024)),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: i32) -> Result<(), HintErrorKind> {
        if self.values.len() >= self.limit {
            return Err(HintErrorKind::ValueStackOverflow);
        }
        self.values.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<i32, HintErrorKind> {
        self.values.pop().ok_or(HintErrorKind::ValueStackUnderflow)
    }

    /// Pops a value, requiring it to be a valid `usize` index.
    pub fn pop_usize(&mut self) -> Result<usize, HintErrorKind> {
        let value = self.pop()?;
        usize::try_from(value).map_err(|_| HintErrorKind::InvalidStackValue(value))
    }

    pub fn peek(&self) -> Result<i32, HintErrorKind> {
        self.values
            .last()
            .copied()
            .ok_or(HintErrorKind::ValueStackUnderflow)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn dup(&mut self) -> Result<(), HintErrorKind> {
        self.push(self.peek()?)
    }

    pub fn swap(&mut self) -> Result<(), HintErrorKind> {
        let a = self.pop()?;
        let b = self.pop()?;
        self.push(a)?;
        self.push(b)
    }

    /// Copies the `n`th value from the top (1-based) to the top.
    pub fn copy_index(&mut self, n: i32) -> Result<(), HintErrorKind> {
        let value = self.from_top(n)?;
        self.push(value)
    }

    /// Moves the `n`th value from the top (1-based) to the top.
    pub fn move_index(&mut self, n: i32) -> Result<(), HintErrorKind> {
        let index = self.index_from_top(n)?;
        let value = self.values.remove(index);
        self.values.push(value);
        Ok(())
    }

    /// Rotates the top three values: `a b c` becomes `b c a`.
    pub fn roll(&mut self) -> Result<(), HintErrorKind> {
        self.move_index(3)
    }

    /// Applies `f` to the top value in place.
    pub fn apply_unary(
        &mut self,
        f: impl FnOnce(i32) -> Result<i32, HintErrorKind>,
    ) -> Result<(), HintErrorKind> {
        let value = self.pop()?;
        self.push(f(value)?)
    }

    /// Pops two values and pushes `f(first, second)` where `first` was
    /// pushed before `second`.
    pub fn apply_binary(
        &mut self,
        f: impl FnOnce(i32, i32) -> Result<i32, HintErrorKind>,
    ) -> Result<(), HintErrorKind> {
        let second = self.pop()?;
        let first = self.pop()?;
        self.push(f(first, second)?)
    }

    fn index_from_top(&self, n: i32) -> Result<usize, HintErrorKind> {
        if n <= 0 || n as usize > self.values.len() {
            return Err(HintErrorKind::InvalidStackValue(n));
        }
        Ok(self.values.len() - n as usize)
    }

    fn from_top(&self, n: i32) -> Result<i32, HintErrorKind> {
        Ok(self.values[self.index_from_top(n)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_with(values: &[i32]) -> ValueStack {
        let mut stack = ValueStack::new(32);
        for &value in values {
            stack.push(value).unwrap();
        }
        stack
    }

    #[test]
    fn overflow_and_underflow() {
        let mut stack = ValueStack::new(1);
        stack.push(1).unwrap();
        assert_eq!(stack.push(2), Err(HintErrorKind::ValueStackOverflow));
        stack.pop().unwrap();
        assert_eq!(stack.pop(), Err(HintErrorKind::ValueStackUnderflow));
    }

    #[test]
    fn cindex_and_mindex() {
        let mut stack = stack_with(&[10, 20, 30]);
        stack.copy_index(3).unwrap();
        assert_eq!(stack.peek().unwrap(), 10);
        stack.pop().unwrap();
        stack.move_index(3).unwrap();
        assert_eq!(stack.pop().unwrap(), 10);
        assert_eq!(stack.pop().unwrap(), 30);
        assert_eq!(stack.pop().unwrap(), 20);
    }

    #[test]
    fn roll_rotates_top_three() {
        let mut stack = stack_with(&[1, 2, 3]);
        stack.roll().unwrap();
        assert_eq!(stack.pop().unwrap(), 1);
        assert_eq!(stack.pop().unwrap(), 3);
        assert_eq!(stack.pop().unwrap(), 2);
    }

    #[test]
    fn binary_argument_order() {
        let mut stack = stack_with(&[60, 10]);
        stack.apply_binary(|a, b| Ok(a - b)).unwrap();
        assert_eq!(stack.pop().unwrap(), 50);
    }

    #[test]
    fn bad_index_values() {
        let mut stack = stack_with(&[1]);
        assert!(stack.copy_index(0).is_err());
        assert!(stack.copy_index(2).is_err());
        assert!(stack.move_index(-1).is_err());
    }
}
