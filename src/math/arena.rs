//! One contiguous block of `f32` storage carved into spans.
//!
//! The arena is sized once from the network description, allocated once and
//! never resized. Feature maps sit at the front in layer order; weights and
//! biases follow from `params_base` onwards.

use std::ops::Range;

use crate::error::{Error, Result};

/// A `(start, len)` window into the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub const EMPTY: Span = Span { start: 0, len: 0 };

    pub fn new(start: usize, len: usize) -> Span {
        Span { start, len }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// True if the two spans share at least one float.
    pub fn overlaps(&self, other: &Span) -> bool {
        !self.is_empty() && !other.is_empty()
            && self.start < other.end() && other.start < self.end()
    }
}

/// Borrowed views for one executor step: the layer being read, the layer
/// being written and the read-only parameter block.
pub struct Stage<'a> {
    pub input: &'a [f32],
    pub output: &'a mut [f32],
    pub params: &'a [f32],
    params_base: usize,
}

impl<'a> Stage<'a> {
    /// Slice of the parameter block addressed by an absolute arena span.
    pub fn param(&self, span: Span) -> &'a [f32] {
        if span.is_empty() {
            return &[];
        }
        let params: &'a [f32] = self.params;
        let start = span.start - self.params_base;
        &params[start..start + span.len]
    }
}

#[derive(Debug, Clone)]
pub struct Arena {
    data: Vec<f32>,
}

impl Arena {
    /// Performs the one allocation of `capacity` floats, zero-filled.
    pub fn allocate(capacity: usize) -> Result<Arena> {
        let mut data: Vec<f32> = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| Error::AllocationFailed { requested: capacity })?;
        data.resize(capacity, 0.0);
        Ok(Arena { data })
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn value(&self, offset: usize) -> f32 {
        self.data[offset]
    }

    pub fn slice(&self, span: Span) -> &[f32] {
        debug_assert!(span.end() <= self.data.len(), "span {:?} past arena end", span);
        &self.data[span.range()]
    }

    pub fn slice_mut(&mut self, span: Span) -> &mut [f32] {
        debug_assert!(span.end() <= self.data.len(), "span {:?} past arena end", span);
        &mut self.data[span.range()]
    }

    pub fn zero(&mut self, span: Span) {
        self.slice_mut(span).fill(0.0);
    }

    /// Splits the arena into the views one executor step needs.
    ///
    /// `input` must lie entirely before `output`, and both before
    /// `params_base`.
    pub fn stage(&mut self, input: Span, output: Span, params_base: usize) -> Stage<'_> {
        debug_assert!(input.end() <= output.start, "input {:?} must precede output {:?}", input, output);
        debug_assert!(output.end() <= params_base, "output {:?} overlaps parameters", output);

        let (maps, params) = self.data.split_at_mut(params_base);
        let (head, tail) = maps.split_at_mut(output.start);
        Stage {
            input: &head[input.range()],
            output: &mut tail[..output.len],
            params,
            params_base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_arena_is_zeroed() {
        let arena = Arena::allocate(16).unwrap();
        assert_eq!(arena.capacity(), 16);
        assert!(arena.slice(Span::new(0, 16)).iter().all(|&x| x == 0.0));
    }

    #[test]
    fn absurd_capacity_fails_cleanly() {
        let err = Arena::allocate(usize::MAX / 2).unwrap_err();
        assert_eq!(err.code(), -1);
    }

    #[test]
    fn stage_views_are_disjoint() {
        let mut arena = Arena::allocate(10).unwrap();
        arena.slice_mut(Span::new(0, 3)).copy_from_slice(&[1.0, 2.0, 3.0]);
        arena.slice_mut(Span::new(7, 3)).copy_from_slice(&[7.0, 8.0, 9.0]);

        let mut stage = arena.stage(Span::new(0, 3), Span::new(3, 4), 7);
        assert_eq!(stage.input, &[1.0, 2.0, 3.0]);
        assert_eq!(stage.param(Span::new(8, 2)), &[8.0, 9.0]);
        stage.output.fill(5.0);

        assert_eq!(arena.slice(Span::new(3, 4)), &[5.0; 4]);
    }

    #[test]
    fn overlap_detection() {
        assert!(Span::new(0, 4).overlaps(&Span::new(3, 2)));
        assert!(!Span::new(0, 4).overlaps(&Span::new(4, 2)));
        assert!(!Span::EMPTY.overlaps(&Span::new(0, 4)));
    }
}
