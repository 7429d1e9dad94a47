//! Elementary vector arithmetic used by the optimizer.
//!
//! All operations work in place on equal-length vectors and never allocate.
//! Equal length is a precondition; it is only checked in debug builds.

use crate::types::{DVector, Scalar};
use num_traits::Float;

/// Dot product `Σ aᵢ·bᵢ`.
#[inline]
pub fn dot<T: Scalar>(a: &DVector<T>, b: &DVector<T>) -> T {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .fold(T::zero(), |acc, (&ai, &bi)| acc + ai * bi)
}

/// Elementwise accumulation `a += b`.
#[inline]
pub fn add<T: Scalar>(a: &mut DVector<T>, b: &DVector<T>) {
    debug_assert_eq!(a.len(), b.len());
    for (ai, &bi) in a.iter_mut().zip(b.iter()) {
        *ai += bi;
    }
}

/// Scaled accumulation `a += b·c`.
#[inline]
pub fn add_mult<T: Scalar>(a: &mut DVector<T>, b: &DVector<T>, c: T) {
    debug_assert_eq!(a.len(), b.len());
    for (ai, &bi) in a.iter_mut().zip(b.iter()) {
        *ai += bi * c;
    }
}

/// Scaled sum into `a = b + c·d`.
#[inline]
pub fn add_mult_into<T: Scalar>(a: &mut DVector<T>, b: &DVector<T>, c: &DVector<T>, d: T) {
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(a.len(), c.len());
    for ((ai, &bi), &ci) in a.iter_mut().zip(b.iter()).zip(c.iter()) {
        *ai = bi + ci * d;
    }
}

/// In-place scaling `a *= b`.
#[inline]
pub fn scale<T: Scalar>(a: &mut DVector<T>, b: T) {
    for ai in a.iter_mut() {
        *ai *= b;
    }
}

/// Scale and store `a = b·c`.
#[inline]
pub fn scale_into<T: Scalar>(a: &mut DVector<T>, b: &DVector<T>, c: T) {
    debug_assert_eq!(a.len(), b.len());
    for (ai, &bi) in a.iter_mut().zip(b.iter()) {
        *ai = bi * c;
    }
}

/// Euclidean norm `‖a‖₂`.
#[inline]
pub fn norm<T: Scalar>(a: &DVector<T>) -> T {
    <T as Float>::sqrt(dot(a, a))
}

/// L1 norm `Σ |aᵢ|`.
#[inline]
pub fn l1_norm<T: Scalar>(a: &DVector<T>) -> T {
    a.iter()
        .fold(T::zero(), |acc, &ai| acc + <T as Float>::abs(ai))
}

/// Number of coordinates that are not exactly zero.
pub fn count_nonzero<T: Scalar>(a: &DVector<T>) -> usize {
    a.iter().filter(|&&ai| ai != T::zero()).count()
}
