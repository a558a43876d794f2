//! Numeric domain checks shared by the series constructors and the assembler.

use ndarray::ArrayView1;
use num::Float;

/// Index of the first NaN or infinite value.
pub(crate) fn first_non_finite<T: Float>(values: ArrayView1<'_, T>) -> Option<usize> {
    values.iter().position(|v| !v.is_finite())
}

/// Index of the first strictly negative value.
pub(crate) fn first_negative<T: Float>(values: ArrayView1<'_, T>) -> Option<usize> {
    values.iter().position(|v| *v < T::zero())
}

/// Indices of every value at or below `floor`.
pub(crate) fn at_or_below<T: Float>(values: ArrayView1<'_, T>, floor: T) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v <= floor)
        .map(|(i, _)| i)
        .collect()
}
