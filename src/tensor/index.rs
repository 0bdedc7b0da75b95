//! Index arguments and their evaluation into offsets or slice descriptors
//!
//! An index is a tuple with one argument per axis. Each argument is either a
//! coordinate (`usize`), which removes its axis, or span-like ([`Span`],
//! [`All`], `..`, `a..b`, `a..`, `..b`, `a..=b`), which keeps it. The number
//! of kept axes is tracked in the type: folding the arguments left to right
//! appends one span per kept axis to a `[Span; N]`, so an all-coordinate
//! index evaluates to `[Span; 0]` (an element) and anything else to a
//! `[Span; N]` (a sub-view of rank `N`).

use std::ops::{Range, RangeFrom, RangeFull, RangeInclusive, RangeTo, RangeToInclusive};

use crate::config;
use crate::error::{TensorError, TensorResult};
use super::core::TensorBase;
use super::shape::{Shape, StridedShape};
use super::span::{All, Span, SpanList};
use super::storage::{Storage, StorageMut};

/// Result of evaluating an index against a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slicing<L> {
    /// One span per kept axis, scaled by that axis' stride
    pub spans: L,
    /// Physical offset of the first addressed element
    pub offset: usize,
}

#[inline]
pub(crate) fn check_index(index: usize, axis: usize, extent: usize) -> TensorResult<()> {
    if config::BOUNDS_CHECKING && index >= extent {
        return Err(TensorError::index_out_of_range(axis, index, extent));
    }
    Ok(())
}

/// One per-axis index argument
pub trait AxisArg {
    /// The span list after this argument has been folded in
    type Out<L: SpanList>: SpanList;

    fn fold<L: SpanList>(
        self,
        acc: L,
        axis: usize,
        extent: usize,
        stride: usize,
        offset: &mut usize,
    ) -> TensorResult<Self::Out<L>>;
}

impl AxisArg for usize {
    type Out<L: SpanList> = L;

    #[inline]
    fn fold<L: SpanList>(
        self,
        acc: L,
        axis: usize,
        extent: usize,
        stride: usize,
        offset: &mut usize,
    ) -> TensorResult<L> {
        check_index(self, axis, extent)?;
        *offset += self * stride;
        Ok(acc)
    }
}

/// Arguments that keep their axis, resolved against the axis extent
pub trait SpanLike {
    fn resolve(self, extent: usize) -> Span;
}

impl SpanLike for Span {
    fn resolve(self, _extent: usize) -> Span {
        self
    }
}

impl SpanLike for All {
    fn resolve(self, extent: usize) -> Span {
        Span::full(extent)
    }
}

impl SpanLike for RangeFull {
    fn resolve(self, extent: usize) -> Span {
        Span::full(extent)
    }
}

impl SpanLike for Range<usize> {
    fn resolve(self, _extent: usize) -> Span {
        Span::new(self.start, self.end)
    }
}

impl SpanLike for RangeFrom<usize> {
    fn resolve(self, extent: usize) -> Span {
        Span::new(self.start, extent)
    }
}

impl SpanLike for RangeTo<usize> {
    fn resolve(self, _extent: usize) -> Span {
        Span::new(0, self.end)
    }
}

impl SpanLike for RangeInclusive<usize> {
    fn resolve(self, _extent: usize) -> Span {
        let (start, end) = self.into_inner();
        Span::new(start, end + 1)
    }
}

impl SpanLike for RangeToInclusive<usize> {
    fn resolve(self, _extent: usize) -> Span {
        Span::new(0, self.end + 1)
    }
}

// One impl per span type rather than a blanket over `SpanLike`, so `usize`
// is the only integer `AxisArg` and unsuffixed literals infer to it.
macro_rules! span_arg {
    ($($span:ty),+) => {
        $(
            impl AxisArg for $span {
                type Out<L: SpanList> = L::Push;

                #[inline]
                fn fold<L: SpanList>(
                    self,
                    acc: L,
                    axis: usize,
                    extent: usize,
                    stride: usize,
                    offset: &mut usize,
                ) -> TensorResult<L::Push> {
                    let span = self.resolve(extent);
                    span.check(axis, extent)?;
                    *offset += span.begin * stride;
                    Ok(acc.push(span.scale(stride)))
                }
            }
        )+
    };
}

span_arg!(
    Span,
    All,
    RangeFull,
    Range<usize>,
    RangeFrom<usize>,
    RangeTo<usize>,
    RangeInclusive<usize>,
    RangeToInclusive<usize>
);

/// A complete index for a rank-`R` shape
pub trait Selection<const R: usize> {
    type Spans: Resolve;

    fn evaluate(
        self,
        extents: &[usize; R],
        strides: &[usize; R],
    ) -> TensorResult<Slicing<Self::Spans>>;
}

impl<const R: usize> Selection<R> for [usize; R] {
    type Spans = [Span; 0];

    #[inline]
    fn evaluate(
        self,
        extents: &[usize; R],
        strides: &[usize; R],
    ) -> TensorResult<Slicing<[Span; 0]>> {
        let mut offset = 0;
        for axis in 0..R {
            check_index(self[axis], axis, extents[axis])?;
            offset += self[axis] * strides[axis];
        }
        Ok(Slicing { spans: [], offset })
    }
}

impl<A> Selection<1> for A
where
    A: AxisArg,
    A::Out<[Span; 0]>: Resolve,
{
    type Spans = A::Out<[Span; 0]>;

    #[inline]
    fn evaluate(
        self,
        extents: &[usize; 1],
        strides: &[usize; 1],
    ) -> TensorResult<Slicing<Self::Spans>> {
        let mut offset = 0;
        let empty: [Span; 0] = [];
        let spans = self.fold(empty, 0, extents[0], strides[0], &mut offset)?;
        Ok(Slicing { spans, offset })
    }
}

macro_rules! folded {
    ($acc:ty;) => { $acc };
    ($acc:ty; $head:ident $(, $rest:ident)*) => {
        folded!(<$head as AxisArg>::Out<$acc>; $($rest),*)
    };
}

macro_rules! tuple_selection {
    ($rank:literal => $($arg:ident $var:ident $axis:tt),+) => {
        impl<$($arg),+> Selection<$rank> for ($($arg,)+)
        where
            $($arg: AxisArg,)+
            folded!([Span; 0]; $($arg),+): Resolve,
        {
            type Spans = folded!([Span; 0]; $($arg),+);

            #[inline]
            fn evaluate(
                self,
                extents: &[usize; $rank],
                strides: &[usize; $rank],
            ) -> TensorResult<Slicing<Self::Spans>> {
                let ($($var,)+) = self;
                let mut offset = 0;
                let spans: [Span; 0] = [];
                $(
                    let spans = $var.fold(spans, $axis, extents[$axis], strides[$axis], &mut offset)?;
                )+
                Ok(Slicing { spans, offset })
            }
        }
    };
}

tuple_selection!(1 => A a 0);
tuple_selection!(2 => A a 0, B b 1);
tuple_selection!(3 => A a 0, B b 1, C c 2);
tuple_selection!(4 => A a 0, B b 1, C c 2, D d 3);
tuple_selection!(5 => A a 0, B b 1, C c 2, D d 3, E e 4);
tuple_selection!(6 => A a 0, B b 1, C c 2, D d 3, E e 4, F f 5);
tuple_selection!(7 => A a 0, B b 1, C c 2, D d 3, E e 4, F f 5, G g 6);
tuple_selection!(8 => A a 0, B b 1, C c 2, D d 3, E e 4, F f 5, G g 6, H h 7);

/// Turns an evaluated span list into what indexing returns: the element for
/// `[Span; 0]`, a strided sub-view otherwise
pub trait Resolve: SpanList {
    type Output<'a, C: Storage + 'a>;
    type OutputMut<'a, C: StorageMut + 'a>;

    fn resolve<'a, C: Storage + 'a>(
        self,
        offset: usize,
        storage: &'a C,
    ) -> TensorResult<Self::Output<'a, C>>;

    fn resolve_mut<'a, C: StorageMut + 'a>(
        self,
        offset: usize,
        storage: &'a mut C,
    ) -> TensorResult<Self::OutputMut<'a, C>>;
}

impl Resolve for [Span; 0] {
    type Output<'a, C: Storage + 'a> = C::Ref<'a>;
    type OutputMut<'a, C: StorageMut + 'a> = &'a mut C::Elem;

    #[inline]
    fn resolve<'a, C: Storage + 'a>(self, offset: usize, storage: &'a C) -> TensorResult<C::Ref<'a>> {
        storage.get(offset)
    }

    #[inline]
    fn resolve_mut<'a, C: StorageMut + 'a>(
        self,
        offset: usize,
        storage: &'a mut C,
    ) -> TensorResult<&'a mut C::Elem> {
        storage.get_mut(offset)
    }
}

/// Anchor for a sub-view; empty views may point one past the parent.
fn anchor<S, const N: usize>(shape: &S, offset: usize, len: usize) -> usize
where
    S: Shape<N>,
{
    if shape.is_empty() {
        offset.min(len)
    } else {
        offset
    }
}

macro_rules! resolve_view {
    ($($rank:literal),+) => {
        $(
            impl Resolve for [Span; $rank] {
                type Output<'a, C: Storage + 'a> = TensorBase<StridedShape<$rank>, C::View<'a>, $rank>;
                type OutputMut<'a, C: StorageMut + 'a> = TensorBase<StridedShape<$rank>, C::ViewMut<'a>, $rank>;

                fn resolve<'a, C: Storage + 'a>(
                    self,
                    offset: usize,
                    storage: &'a C,
                ) -> TensorResult<Self::Output<'a, C>> {
                    let shape = StridedShape::from_spans(self)?;
                    tracing::trace!(rank = $rank, offset, %shape, "derived strided sub-view");
                    let view = storage.view_at(anchor(&shape, offset, storage.len()))?;
                    Ok(TensorBase::from_parts_unchecked(shape, view))
                }

                fn resolve_mut<'a, C: StorageMut + 'a>(
                    self,
                    offset: usize,
                    storage: &'a mut C,
                ) -> TensorResult<Self::OutputMut<'a, C>> {
                    let shape = StridedShape::from_spans(self)?;
                    tracing::trace!(rank = $rank, offset, %shape, "derived mutable strided sub-view");
                    let anchor = anchor(&shape, offset, storage.len());
                    let view = storage.view_mut_at(anchor)?;
                    Ok(TensorBase::from_parts_unchecked(shape, view))
                }
            }
        )+
    };
}

resolve_view!(1, 2, 3, 4, 5, 6, 7, 8);
