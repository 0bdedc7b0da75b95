//! Half-open strided ranges and the fixed-size lists used as slice descriptors

use std::fmt::{self, Debug, Display};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::{TensorError, TensorResult};

/// A half-open range `[begin, end)` visited with step `stride`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub begin: usize,
    pub end: usize,
    pub stride: usize,
}

impl Span {
    pub const fn new(begin: usize, end: usize) -> Self {
        Self {
            begin,
            end,
            stride: 1,
        }
    }

    /// # Panics
    ///
    /// Panics if `stride` is zero.
    pub const fn with_stride(begin: usize, end: usize, stride: usize) -> Self {
        assert!(stride != 0, "span stride must be non-zero");
        Self { begin, end, stride }
    }

    /// The whole axis `[0, extent)`.
    pub const fn full(extent: usize) -> Self {
        Self::new(0, extent)
    }

    /// Number of positions visited, `(end - begin) / stride`.
    ///
    /// The division truncates: `0..5` with stride 2 visits 0 and 2 only.
    pub const fn len(&self) -> usize {
        if self.end <= self.begin {
            0
        } else {
            (self.end - self.begin) / self.stride
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shifts both endpoints by `k`.
    pub const fn offset(self, k: usize) -> Self {
        Self {
            begin: self.begin + k,
            end: self.end + k,
            stride: self.stride,
        }
    }

    /// Multiplies both endpoints and the stride by `k`.
    pub const fn scale(self, k: usize) -> Self {
        assert!(k != 0, "span scale factor must be non-zero");
        Self {
            begin: self.begin * k,
            end: self.end * k,
            stride: self.stride * k,
        }
    }

    /// Checks `begin <= end <= extent` for `axis` when bounds checking is
    /// compiled in.
    #[inline]
    pub fn check(&self, axis: usize, extent: usize) -> TensorResult<()> {
        if config::BOUNDS_CHECKING && (self.begin > self.end || self.end > extent) {
            return Err(TensorError::SpanOutOfRange {
                axis,
                begin: self.begin,
                end: self.end,
                extent,
            });
        }
        Ok(())
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stride == 1 {
            write!(f, "{}..{}", self.begin, self.end)
        } else {
            write!(f, "{}..{};{}", self.begin, self.end, self.stride)
        }
    }
}

/// Selects the whole extent of an axis; `..` means the same thing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct All;

/// An ordered, fixed-size list of spans, one per retained axis
pub trait SpanList: Copy + Debug {
    /// The list with one more span appended
    type Push: SpanList;

    fn push(self, span: Span) -> Self::Push;

    fn spans(&self) -> &[Span];
}

macro_rules! span_list {
    ($($len:literal => $next:literal),+) => {
        $(
            impl SpanList for [Span; $len] {
                type Push = [Span; $next];

                #[inline]
                fn push(self, span: Span) -> [Span; $next] {
                    let mut out = [span; $next];
                    out[..$len].copy_from_slice(&self);
                    out
                }

                fn spans(&self) -> &[Span] {
                    self
                }
            }
        )+
    };
}

span_list!(0 => 1, 1 => 2, 2 => 3, 3 => 4, 4 => 5, 5 => 6, 6 => 7, 7 => 8);

/// Past the widest supported slice descriptor; never resolves into a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanOverflow;

impl SpanList for [Span; 8] {
    type Push = SpanOverflow;

    fn push(self, _span: Span) -> SpanOverflow {
        SpanOverflow
    }

    fn spans(&self) -> &[Span] {
        self
    }
}

impl SpanList for SpanOverflow {
    type Push = SpanOverflow;

    fn push(self, _span: Span) -> SpanOverflow {
        SpanOverflow
    }

    fn spans(&self) -> &[Span] {
        &[]
    }
}

/// Concatenates two spans into a two-axis descriptor.
pub fn concat(first: Span, second: Span) -> [Span; 2] {
    [first, second]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_len() {
        assert_eq!(Span::new(2, 5).len(), 3);
        assert_eq!(Span::with_stride(0, 6, 2).len(), 3);
        assert_eq!(Span::with_stride(0, 5, 2).len(), 2);
        assert_eq!(Span::with_stride(1, 10, 3).len(), 3);
        assert_eq!(Span::with_stride(0, 1, 4).len(), 0);
        assert_eq!(Span::new(4, 4).len(), 0);
        assert!(Span::new(4, 4).is_empty());
        assert_eq!(Span::full(7), Span::new(0, 7));
    }

    #[test]
    #[should_panic(expected = "stride must be non-zero")]
    fn test_zero_stride_rejected() {
        let _ = Span::with_stride(0, 4, 0);
    }

    #[test]
    fn test_offset_and_scale() {
        let span = Span::with_stride(1, 5, 2);
        assert_eq!(span.offset(3), Span::with_stride(4, 8, 2));
        assert_eq!(span.scale(10), Span::with_stride(10, 50, 20));
        assert_eq!(span.scale(10).len(), span.len());
        assert_eq!(span.offset(3).len(), span.len());
    }

    #[test]
    fn test_push_builds_descriptor() {
        let empty: [Span; 0] = [];
        let spans = empty.push(Span::new(0, 2)).push(Span::new(1, 3));
        assert_eq!(spans, concat(Span::new(0, 2), Span::new(1, 3)));
        assert_eq!(spans.spans().len(), 2);
    }

    #[test]
    fn test_check() {
        assert!(Span::new(0, 4).check(0, 4).is_ok());
        #[cfg(any(debug_assertions, feature = "bounds-check"))]
        {
            let err = Span::new(2, 5).check(3, 4).unwrap_err();
            assert_eq!(
                err,
                TensorError::SpanOutOfRange {
                    axis: 3,
                    begin: 2,
                    end: 5,
                    extent: 4
                }
            );
            assert!(Span::new(3, 2).check(0, 4).is_err());
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Span::new(1, 3).to_string(), "1..3");
        assert_eq!(Span::with_stride(0, 9, 3).to_string(), "0..9;3");
    }
}
