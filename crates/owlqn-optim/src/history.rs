//! Bounded curvature history for the limited-memory recursion.
//!
//! The history keeps up to `capacity` curvature pairs `(s, y)` together with
//! their scalars `ρ = s·y`. Storage is an arena of fixed-length vectors
//! addressed through a circular start index: slots are allocated while the
//! history warms up, then the oldest slot is overwritten in place by each new
//! pair. Entries are always addressed logically, `0` being the oldest.

use owlqn_core::{
    types::{DVector, Scalar},
    vector_ops,
};
use std::collections::TryReserveError;

/// Ring buffer of curvature pairs.
#[derive(Debug, Clone)]
pub struct CurvatureHistory<T: Scalar> {
    s: Vec<DVector<T>>,
    y: Vec<DVector<T>>,
    rho: Vec<T>,
    /// Physical slot holding the oldest entry.
    start: usize,
    capacity: usize,
    dim: usize,
}

impl<T: Scalar> CurvatureHistory<T> {
    /// Creates an empty history holding at most `capacity` pairs of
    /// `dim`-dimensional vectors.
    pub fn new(capacity: usize, dim: usize) -> Self {
        Self {
            s: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            rho: Vec::with_capacity(capacity),
            start: 0,
            capacity,
            dim,
        }
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.s.len()
    }

    /// True when no pair has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.s.is_empty()
    }

    /// Maximum number of pairs. Only ever shrinks, and only when an
    /// allocation fails while the history is warming up.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Dimension of the stored vectors.
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    fn slot(&self, index: usize) -> usize {
        debug_assert!(index < self.len());
        (self.start + index) % self.len()
    }

    /// Step difference of the `index`-th oldest pair.
    pub fn s(&self, index: usize) -> &DVector<T> {
        &self.s[self.slot(index)]
    }

    /// Gradient difference of the `index`-th oldest pair.
    pub fn y(&self, index: usize) -> &DVector<T> {
        &self.y[self.slot(index)]
    }

    /// Curvature scalar `s·y` of the `index`-th oldest pair.
    pub fn rho(&self, index: usize) -> T {
        self.rho[self.slot(index)]
    }

    /// Records the pair `s = new_x - x`, `y = new_grad - grad`.
    ///
    /// Returns the curvature scalar of the new pair, or `None` when no slot
    /// could be obtained at all (an allocation failed before the first pair).
    pub fn record(
        &mut self,
        new_x: &DVector<T>,
        x: &DVector<T>,
        new_grad: &DVector<T>,
        grad: &DVector<T>,
    ) -> Option<T> {
        let slot = self.acquire_slot()?;

        vector_ops::add_mult_into(&mut self.s[slot], new_x, x, -T::one());
        vector_ops::add_mult_into(&mut self.y[slot], new_grad, grad, -T::one());
        let rho = vector_ops::dot(&self.s[slot], &self.y[slot]);
        self.rho[slot] = rho;

        Some(rho)
    }

    /// Returns the physical slot the next pair must be written to.
    fn acquire_slot(&mut self) -> Option<usize> {
        if self.len() < self.capacity {
            match (zeroed::<T>(self.dim), zeroed::<T>(self.dim)) {
                (Ok(s), Ok(y)) => {
                    self.s.push(s);
                    self.y.push(y);
                    self.rho.push(T::zero());
                    return Some(self.len() - 1);
                }
                (Err(err), _) | (_, Err(err)) => {
                    log::warn!(
                        "could not allocate curvature pair {} of {} ({}); continuing with memory {}",
                        self.len() + 1,
                        self.capacity,
                        err,
                        self.len()
                    );
                    self.cap_at_current_len();
                }
            }
        }

        if self.is_empty() {
            return None;
        }

        let slot = self.start;
        self.start = (self.start + 1) % self.len();
        Some(slot)
    }

    /// Freezes the capacity at the number of pairs currently held.
    fn cap_at_current_len(&mut self) {
        self.capacity = self.len();
    }
}

fn zeroed<T: Scalar>(dim: usize) -> Result<DVector<T>, TryReserveError> {
    let mut data = Vec::new();
    data.try_reserve_exact(dim)?;
    data.resize(dim, T::zero());
    Ok(DVector::from_vec(data))
}
