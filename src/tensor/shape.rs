//! Shapes: extents, strides and the mapping from coordinates to offsets
//!
//! Three variants share the [`Shape`] contract:
//! - [`DynamicShape`]: runtime extents, reshape-able
//! - [`Fixed1`] .. [`Fixed6`]: extents are const generic parameters
//! - [`StridedShape`]: produced by sub-viewing, never built by hand
//!
//! The first axis is contiguous: coordinate `(i0, i1, ..)` of a contiguous
//! shape lives at `i0 + e0 * (i1 + e1 * (..))`.

use std::fmt::{self, Debug, Display};

use crate::config;
use crate::error::{TensorError, TensorResult};
use super::index::{Selection, Slicing};
use super::span::Span;

mod sealed {
    pub trait Sealed {}
}

/// Strides of a contiguous, first-axis-fastest layout.
pub fn column_major_strides<const R: usize>(extents: &[usize; R]) -> [usize; R] {
    let mut strides = [1; R];
    let mut acc: usize = 1;
    for axis in 0..R {
        strides[axis] = acc;
        acc = acc.saturating_mul(extents[axis]);
    }
    strides
}

/// Product of the extents, or `BadShape` when it does not fit in `usize`.
fn element_count(extents: &[usize]) -> TensorResult<usize> {
    extents
        .iter()
        .try_fold(1usize, |acc, &e| acc.checked_mul(e))
        .ok_or_else(|| TensorError::bad_shape(extents))
}

fn check_extents(extents: &[usize]) -> TensorResult<()> {
    if config::BOUNDS_CHECKING && extents.iter().any(|&e| e == 0) {
        return Err(TensorError::bad_shape(extents));
    }
    Ok(())
}

#[inline]
fn check_linear(index: usize, len: usize) -> TensorResult<()> {
    if config::BOUNDS_CHECKING && index >= len {
        return Err(TensorError::LinearIndexOutOfRange { index, len });
    }
    Ok(())
}

fn fmt_extents(extents: &[usize], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[{}]", extents.iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", "))
}

/// Shape of a rank-`R` tensor
pub trait Shape<const R: usize>: sealed::Sealed + Clone + Debug + Display {
    /// Flat position `i` lives at offset `i`
    const CONTIGUOUS: bool;

    fn extents(&self) -> [usize; R];

    /// Physical distance between neighbours along each axis
    fn strides(&self) -> [usize; R];

    /// Number of elements (product of the extents)
    fn len(&self) -> usize;

    fn rank(&self) -> usize {
        R
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn extent(&self, axis: usize) -> TensorResult<usize> {
        if config::BOUNDS_CHECKING && axis >= R {
            return Err(TensorError::AxisOutOfRange { axis, rank: R });
        }
        Ok(self.extents()[axis])
    }

    /// Evaluates an index into an element offset or a slice descriptor.
    #[inline]
    fn evaluate<I: Selection<R>>(&self, index: I) -> TensorResult<Slicing<I::Spans>> {
        index.evaluate(&self.extents(), &self.strides())
    }

    /// Maps a flat position in `0..len()` to a physical offset.
    fn flat_to_offset(&self, index: usize) -> TensorResult<usize>;

    /// Number of buffer elements the shape reaches, from offset 0 to its
    /// largest offset inclusive. `BadShape` if that overflows `usize`.
    fn footprint(&self) -> TensorResult<usize> {
        if self.is_empty() {
            return Ok(0);
        }
        let extents = self.extents();
        let strides = self.strides();
        (0..R)
            .try_fold(1usize, |acc, axis| {
                (extents[axis] - 1)
                    .checked_mul(strides[axis])
                    .and_then(|reach| acc.checked_add(reach))
            })
            .ok_or_else(|| TensorError::bad_shape(&extents))
    }

    /// Whether distinct coordinates always map to distinct offsets.
    fn is_disjoint(&self) -> bool {
        let extents = self.extents();
        let strides = self.strides();
        let mut axes: [usize; R] = std::array::from_fn(|axis| axis);
        axes.sort_unstable_by_key(|&axis| strides[axis]);

        let mut reach = 1;
        for &axis in &axes {
            if extents[axis] <= 1 {
                continue;
            }
            if strides[axis] < reach {
                return false;
            }
            reach = reach.saturating_add((extents[axis] - 1).saturating_mul(strides[axis]));
        }
        true
    }
}

/// Shapes whose flat positions are their offsets
pub trait ContiguousShape<const R: usize>: Shape<R> {}

/// Shape with extents chosen at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DynamicShape<const R: usize> {
    extents: [usize; R],
    len: usize,
}

impl<const R: usize> DynamicShape<R> {
    pub fn new(extents: [usize; R]) -> TensorResult<Self> {
        check_extents(&extents)?;
        Ok(Self {
            extents,
            len: element_count(&extents)?,
        })
    }

    /// Replaces the extents; on error the shape is left unchanged.
    pub fn reshape(&mut self, extents: [usize; R]) -> TensorResult<()> {
        *self = Self::new(extents)?;
        Ok(())
    }
}

impl<const R: usize> sealed::Sealed for DynamicShape<R> {}

impl<const R: usize> Shape<R> for DynamicShape<R> {
    const CONTIGUOUS: bool = true;

    fn extents(&self) -> [usize; R] {
        self.extents
    }

    fn strides(&self) -> [usize; R] {
        column_major_strides(&self.extents)
    }

    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn flat_to_offset(&self, index: usize) -> TensorResult<usize> {
        check_linear(index, self.len)?;
        Ok(index)
    }

    fn footprint(&self) -> TensorResult<usize> {
        Ok(self.len)
    }

    fn is_disjoint(&self) -> bool {
        true
    }
}

impl<const R: usize> ContiguousShape<R> for DynamicShape<R> {}

impl<const R: usize> Display for DynamicShape<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_extents(&self.extents, f)
    }
}

/// Shapes whose extents are compile-time constants
pub trait FixedExtents<const R: usize>: ContiguousShape<R> + Copy + Default {
    const EXTENTS: [usize; R];
    const LEN: usize;
}

macro_rules! fixed_shape {
    ($(#[$doc:meta])* $name:ident, $rank:literal, $($e:ident),+) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name<$(const $e: usize),+>;

        impl<$(const $e: usize),+> Default for $name<$($e),+> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<$(const $e: usize),+> $name<$($e),+> {
            const VALID: () = assert!(true $(&& $e > 0)+, "fixed extents must be strictly positive");

            pub const fn new() -> Self {
                #[allow(clippy::let_unit_value)]
                let () = Self::VALID;
                Self
            }
        }

        impl<$(const $e: usize),+> sealed::Sealed for $name<$($e),+> {}

        impl<$(const $e: usize),+> FixedExtents<$rank> for $name<$($e),+> {
            const EXTENTS: [usize; $rank] = [$($e),+];
            const LEN: usize = 1 $(* $e)+;
        }

        impl<$(const $e: usize),+> Shape<$rank> for $name<$($e),+> {
            const CONTIGUOUS: bool = true;

            #[inline]
            fn extents(&self) -> [usize; $rank] {
                Self::EXTENTS
            }

            #[inline]
            fn strides(&self) -> [usize; $rank] {
                column_major_strides(&Self::EXTENTS)
            }

            #[inline]
            fn len(&self) -> usize {
                Self::LEN
            }

            #[inline]
            fn flat_to_offset(&self, index: usize) -> TensorResult<usize> {
                check_linear(index, Self::LEN)?;
                Ok(index)
            }

            fn footprint(&self) -> TensorResult<usize> {
                Ok(Self::LEN)
            }

            fn is_disjoint(&self) -> bool {
                true
            }
        }

        impl<$(const $e: usize),+> ContiguousShape<$rank> for $name<$($e),+> {}

        impl<$(const $e: usize),+> Display for $name<$($e),+> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt_extents(&Self::EXTENTS, f)
            }
        }
    };
}

fixed_shape!(
    /// Rank-1 shape of compile-time extent `A`
    Fixed1, 1, A
);
fixed_shape!(
    /// Rank-2 shape with compile-time extents
    Fixed2, 2, A, B
);
fixed_shape!(Fixed3, 3, A, B, C);
fixed_shape!(Fixed4, 4, A, B, C, D);
fixed_shape!(Fixed5, 5, A, B, C, D, E);
fixed_shape!(Fixed6, 6, A, B, C, D, E, F);

/// Shape of a sub-view: extents plus arbitrary per-axis strides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StridedShape<const R: usize> {
    extents: [usize; R],
    strides: [usize; R],
    len: usize,
}

impl<const R: usize> StridedShape<R> {
    /// Builds the shape of a slice descriptor whose spans are already scaled
    /// by the parent strides.
    pub(crate) fn from_spans(spans: [Span; R]) -> TensorResult<Self> {
        let extents = spans.map(|span| span.len());
        Ok(Self {
            extents,
            strides: spans.map(|span| span.stride),
            len: element_count(&extents)?,
        })
    }
}

impl<const R: usize> sealed::Sealed for StridedShape<R> {}

impl<const R: usize> Shape<R> for StridedShape<R> {
    const CONTIGUOUS: bool = false;

    fn extents(&self) -> [usize; R] {
        self.extents
    }

    fn strides(&self) -> [usize; R] {
        self.strides
    }

    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn flat_to_offset(&self, index: usize) -> TensorResult<usize> {
        check_linear(index, self.len)?;
        if self.len == 0 {
            return Err(TensorError::LinearIndexOutOfRange { index, len: 0 });
        }

        let mut rest = index;
        let mut offset = 0;
        for axis in 0..R {
            if axis + 1 == R {
                offset += rest * self.strides[axis];
            } else {
                let extent = self.extents[axis];
                offset += (rest % extent) * self.strides[axis];
                rest /= extent;
            }
        }
        Ok(offset)
    }
}

impl<const R: usize> Display for StridedShape<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_extents(&self.extents, f)?;
        write!(f, " strides ")?;
        fmt_extents(&self.strides, f)
    }
}
