//! Core tensor type: a shape paired with a storage
//!
//! [`TensorBase`] is generic over its [`Shape`] and [`Storage`]; the aliases
//! at the bottom of this module ([`Tensor`], [`TensorView`], [`FixedTensor`],
//! ...) name the common combinations and carry their constructors.

use std::fmt::{self, Debug, Display};
use std::ops::{Index, IndexMut};

use crate::config;
use crate::error::{TensorError, TensorResult};
use super::index::{Resolve, Selection};
use super::shape::{ContiguousShape, DynamicShape, FixedExtents, Shape, StridedShape};
use super::storage::{
    ArrayStorage, Contiguous, OwnedStorage, Resizable, Storage, StorageMut, ViewMutStorage,
    ViewStorage,
};
use super::transform::Transform;

/// A rank-`R` tensor: shape `S` over storage `C`
///
/// Views (`C` a borrowed storage) are `Copy`; owned tensors are duplicated
/// only by an explicit `clone()`, which copies the buffer.
#[derive(Clone, Copy)]
pub struct TensorBase<S, C, const R: usize> {
    shape: S,
    storage: C,
}

impl<S, C, const R: usize> TensorBase<S, C, R>
where
    S: Shape<R>,
    C: Storage,
{
    /// Pairs a shape with a storage, checking that the storage holds every
    /// element the shape addresses.
    pub fn from_parts(shape: S, storage: C) -> TensorResult<Self> {
        if config::BOUNDS_CHECKING {
            let required = shape.footprint()?;
            if required > storage.len() {
                return Err(TensorError::BufferTooSmall {
                    required,
                    len: storage.len(),
                });
            }
        }
        Ok(Self::from_parts_unchecked(shape, storage))
    }

    pub(crate) fn from_parts_unchecked(shape: S, storage: C) -> Self {
        Self { shape, storage }
    }

    pub fn shape(&self) -> &S {
        &self.shape
    }

    pub fn storage(&self) -> &C {
        &self.storage
    }

    pub(crate) fn storage_mut(&mut self) -> &mut C {
        &mut self.storage
    }

    pub fn into_parts(self) -> (S, C) {
        (self.shape, self.storage)
    }

    pub fn into_storage(self) -> C {
        self.storage
    }

    pub fn rank(&self) -> usize {
        R
    }

    pub fn extent(&self, axis: usize) -> TensorResult<usize> {
        self.shape.extent(axis)
    }

    pub fn extents(&self) -> [usize; R] {
        self.shape.extents()
    }

    pub fn len(&self) -> usize {
        self.shape.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    /// Flat position `i` is buffer element `i`.
    pub fn is_contiguous(&self) -> bool {
        S::CONTIGUOUS && C::CONTIGUOUS
    }

    pub fn is_mutable(&self) -> bool {
        C::MUTABLE
    }

    /// Indexes with one argument per axis.
    ///
    /// All-coordinate indices such as `(1, 2)` or `[1, 2]` return the element;
    /// as soon as one argument is a span (`..`, `a..b`, [`Span`](super::span::Span),
    /// [`All`](super::span::All)) the result is a strided sub-view with one axis per
    /// span argument.
    #[inline]
    pub fn at<I: Selection<R>>(&self, index: I) -> TensorResult<<I::Spans as Resolve>::Output<'_, C>> {
        let slicing = self.shape.evaluate(index)?;
        slicing.spans.resolve(slicing.offset, &self.storage)
    }

    /// Element at flat position `index` in iteration order.
    #[inline]
    pub fn get(&self, index: usize) -> TensorResult<C::Ref<'_>> {
        self.storage.get(self.shape.flat_to_offset(index)?)
    }

    /// Read-only view of the whole tensor.
    pub fn view(&self) -> TensorBase<S, C::View<'_>, R> {
        TensorBase::from_parts_unchecked(self.shape.clone(), self.storage.view())
    }

    /// Lazily maps every element through `g`.
    ///
    /// Mapping a mapped tensor composes the functions; the result still wraps
    /// the original storage.
    pub fn map<'a, G, V>(&'a self, g: G) -> TensorBase<S, <C::View<'a> as Transform<G>>::Output, R>
    where
        G: Fn(C::Elem) -> V + Clone,
        C::View<'a>: Transform<G>,
    {
        TensorBase::from_parts_unchecked(self.shape.clone(), self.storage.view().transform(g))
    }
}

impl<S, C, const R: usize> TensorBase<S, C, R>
where
    S: Shape<R>,
    C: StorageMut,
{
    /// Mutable counterpart of [`TensorBase::at`]: `&mut` element or mutable
    /// sub-view.
    #[inline]
    pub fn at_mut<I: Selection<R>>(
        &mut self,
        index: I,
    ) -> TensorResult<<I::Spans as Resolve>::OutputMut<'_, C>> {
        let slicing = self.shape.evaluate(index)?;
        slicing.spans.resolve_mut(slicing.offset, &mut self.storage)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> TensorResult<&mut C::Elem> {
        let offset = self.shape.flat_to_offset(index)?;
        self.storage.get_mut(offset)
    }

    pub fn view_mut(&mut self) -> TensorBase<S, C::ViewMut<'_>, R> {
        TensorBase::from_parts_unchecked(self.shape.clone(), self.storage.view_mut())
    }
}

impl<S, C, const R: usize> TensorBase<S, C, R>
where
    S: ContiguousShape<R>,
    C: Contiguous,
{
    /// The elements in iteration order.
    pub fn as_slice(&self) -> &[C::Elem] {
        let data = self.storage.as_slice();
        &data[..self.len().min(data.len())]
    }

    /// Views the same elements with a different rank and extents.
    pub fn reshaped<const M: usize>(
        &self,
        extents: [usize; M],
    ) -> TensorResult<TensorBase<DynamicShape<M>, ViewStorage<'_, C::Elem>, M>> {
        let shape = DynamicShape::new(extents)?;
        tracing::debug!(from = %self.shape, to = %shape, "reshaped view");
        TensorBase::from_parts(shape, ViewStorage::new(self.as_slice()))
    }
}

impl<S, C, const R: usize> TensorBase<S, C, R>
where
    S: ContiguousShape<R>,
    C: Contiguous + StorageMut,
{
    pub fn as_mut_slice(&mut self) -> &mut [C::Elem] {
        let len = self.len();
        let data = self.storage.as_mut_slice();
        let len = len.min(data.len());
        &mut data[..len]
    }

    pub fn reshaped_mut<const M: usize>(
        &mut self,
        extents: [usize; M],
    ) -> TensorResult<TensorBase<DynamicShape<M>, ViewMutStorage<'_, C::Elem>, M>> {
        let shape = DynamicShape::new(extents)?;
        tracing::debug!(from = %self.shape, to = %shape, "reshaped mutable view");
        TensorBase::from_parts(shape, ViewMutStorage::new(self.as_mut_slice()))
    }
}

impl<C, const R: usize> TensorBase<DynamicShape<R>, C, R>
where
    C: Resizable,
{
    /// Changes the extents in place, resizing owned storage to the new
    /// element count. On error nothing changes.
    pub fn reshape(&mut self, extents: [usize; R]) -> TensorResult<()> {
        let mut shape = self.shape;
        shape.reshape(extents)?;
        self.storage.fit(shape.len())?;
        tracing::debug!(from = %self.shape, to = %shape, "reshaped tensor");
        self.shape = shape;
        Ok(())
    }
}

#[cfg(feature = "always-mutable")]
impl<'a, S, T, const R: usize> TensorBase<S, ViewStorage<'a, T>, R>
where
    S: Shape<R>,
{
    /// Turns a read-only view into a mutable one.
    ///
    /// # Safety
    ///
    /// Same contract as [`ViewStorage::assume_mutable`].
    pub unsafe fn assume_mutable(self) -> TensorBase<S, ViewMutStorage<'a, T>, R> {
        // SAFETY: forwarded to the caller.
        let storage = unsafe { self.storage.assume_mutable() };
        TensorBase::from_parts_unchecked(self.shape, storage)
    }
}

fn slot<T>(data: &[T], offset: usize) -> TensorResult<&T> {
    data.get(offset).ok_or(TensorError::StorageOutOfRange {
        offset,
        len: data.len(),
    })
}

fn slot_mut<T>(data: &mut [T], offset: usize) -> TensorResult<&mut T> {
    let len = data.len();
    data.get_mut(offset)
        .ok_or(TensorError::StorageOutOfRange { offset, len })
}

impl<S, C, const R: usize> Index<usize> for TensorBase<S, C, R>
where
    S: Shape<R>,
    C: Contiguous,
{
    type Output = C::Elem;

    fn index(&self, index: usize) -> &C::Elem {
        match self.shape.flat_to_offset(index)
            .and_then(|offset| slot(self.storage.as_slice(), offset))
        {
            Ok(element) => element,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<S, C, const R: usize> Index<[usize; R]> for TensorBase<S, C, R>
where
    S: Shape<R>,
    C: Contiguous,
{
    type Output = C::Elem;

    fn index(&self, index: [usize; R]) -> &C::Elem {
        match self.shape.evaluate(index)
            .and_then(|slicing| slot(self.storage.as_slice(), slicing.offset))
        {
            Ok(element) => element,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<S, C, const R: usize> IndexMut<usize> for TensorBase<S, C, R>
where
    S: Shape<R>,
    C: Contiguous + StorageMut,
{
    fn index_mut(&mut self, index: usize) -> &mut C::Elem {
        match self.shape.flat_to_offset(index)
            .and_then(|offset| slot_mut(self.storage.as_mut_slice(), offset))
        {
            Ok(element) => element,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<S, C, const R: usize> IndexMut<[usize; R]> for TensorBase<S, C, R>
where
    S: Shape<R>,
    C: Contiguous + StorageMut,
{
    fn index_mut(&mut self, index: [usize; R]) -> &mut C::Elem {
        match self.shape.evaluate(index)
            .and_then(|slicing| slot_mut(self.storage.as_mut_slice(), slicing.offset))
        {
            Ok(element) => element,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<S, C, const R: usize> Display for TensorBase<S, C, R>
where
    S: Shape<R>,
    C: Storage,
    C::Elem: Display + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display = config::display_config();
        write!(f, "tensor({:?}, [", self.extents())?;
        let shown = self.len().min(display.max_elements);
        for i in 0..shown {
            if i > 0 {
                f.write_str(", ")?;
            }
            let value = self.shape.flat_to_offset(i)
                .and_then(|offset| self.storage.load(offset));
            match (value, display.precision) {
                (Ok(value), Some(precision)) => write!(f, "{value:.precision$}")?,
                (Ok(value), None) => write!(f, "{value}")?,
                (Err(_), _) => f.write_str("?")?,
            }
        }
        if shown < self.len() {
            write!(f, ", ... {} more", self.len() - shown)?;
        }
        f.write_str("])")
    }
}

impl<S: Debug, C: Debug, const R: usize> Debug for TensorBase<S, C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TensorBase")
            .field("rank", &R)
            .field("shape", &self.shape)
            .field("storage", &self.storage)
            .finish()
    }
}

/// Owned tensor with runtime extents
pub type Tensor<T, const R: usize> = TensorBase<DynamicShape<R>, OwnedStorage<T>, R>;

/// Read-only tensor over borrowed memory
pub type TensorView<'a, T, const R: usize> = TensorBase<DynamicShape<R>, ViewStorage<'a, T>, R>;

/// Mutable tensor over borrowed memory
pub type TensorViewMut<'a, T, const R: usize> =
    TensorBase<DynamicShape<R>, ViewMutStorage<'a, T>, R>;

/// Owned tensor with compile-time extents `S` over `[T; N]`
///
/// Moves like any owned value; duplicating the buffer takes `clone()`:
///
/// ```compile_fail
/// use tensorview::{Fixed2, FixedTensor};
///
/// let t: FixedTensor<f64, Fixed2<2, 3>, 6, 2> = FixedTensor::from_array([0.0; 6]);
/// let a = t;
/// let b = t;
/// ```
pub type FixedTensor<T, S, const N: usize, const R: usize> = TensorBase<S, ArrayStorage<T, N>, R>;

/// Read-only tensor with compile-time extents over borrowed memory
pub type FixedTensorView<'a, T, S, const R: usize> = TensorBase<S, ViewStorage<'a, T>, R>;

/// Strided read-only sub-view
pub type SubView<'a, T, const R: usize> = TensorBase<StridedShape<R>, ViewStorage<'a, T>, R>;

/// Strided mutable sub-view
pub type SubViewMut<'a, T, const R: usize> = TensorBase<StridedShape<R>, ViewMutStorage<'a, T>, R>;

impl<T, const R: usize> TensorBase<DynamicShape<R>, OwnedStorage<T>, R> {
    /// Tensor of `extents` filled with `T::default()`.
    pub fn new(extents: [usize; R]) -> TensorResult<Self>
    where
        T: Default + Clone,
    {
        Self::from_elem(T::default(), extents)
    }

    pub fn from_elem(elem: T, extents: [usize; R]) -> TensorResult<Self>
    where
        T: Clone,
    {
        let shape = DynamicShape::new(extents)?;
        let data = vec![elem; shape.len()];
        Ok(Self::from_parts_unchecked(shape, OwnedStorage::new(data)))
    }

    /// Takes ownership of `data`, laid out first axis fastest.
    pub fn from_vec(data: Vec<T>, extents: [usize; R]) -> TensorResult<Self> {
        Self::from_parts(DynamicShape::new(extents)?, OwnedStorage::new(data))
    }

    pub fn into_vec(self) -> Vec<T> {
        self.storage.into_vec()
    }
}

impl<'a, T, const R: usize> TensorBase<DynamicShape<R>, ViewStorage<'a, T>, R> {
    pub fn new(data: &'a [T], extents: [usize; R]) -> TensorResult<Self> {
        Self::from_parts(DynamicShape::new(extents)?, ViewStorage::new(data))
    }

    /// Views `product(extents)` elements starting at `ptr`. A null `ptr`
    /// gives an unbound view whose accesses all fail.
    ///
    /// # Safety
    ///
    /// Same contract as [`ViewStorage::from_raw_parts`] for
    /// `product(extents)` elements.
    pub unsafe fn from_raw_parts(ptr: *const T, extents: [usize; R]) -> TensorResult<Self> {
        let shape = DynamicShape::new(extents)?;
        // SAFETY: forwarded to the caller.
        let storage = unsafe { ViewStorage::from_raw_parts(ptr, shape.len()) };
        Ok(Self::from_parts_unchecked(shape, storage))
    }
}

impl<'a, T, const R: usize> TensorBase<DynamicShape<R>, ViewMutStorage<'a, T>, R> {
    pub fn new(data: &'a mut [T], extents: [usize; R]) -> TensorResult<Self> {
        Self::from_parts(DynamicShape::new(extents)?, ViewMutStorage::new(data))
    }

    /// # Safety
    ///
    /// Same contract as [`ViewMutStorage::from_raw_parts_mut`] for
    /// `product(extents)` elements.
    pub unsafe fn from_raw_parts(ptr: *mut T, extents: [usize; R]) -> TensorResult<Self> {
        let shape = DynamicShape::new(extents)?;
        // SAFETY: forwarded to the caller.
        let storage = unsafe { ViewMutStorage::from_raw_parts_mut(ptr, shape.len()) };
        Ok(Self::from_parts_unchecked(shape, storage))
    }
}

impl<T, S, const N: usize, const R: usize> TensorBase<S, ArrayStorage<T, N>, R>
where
    S: FixedExtents<R>,
{
    const FITS: () = assert!(N == S::LEN, "array length must equal the product of the fixed extents");

    pub fn from_array(data: [T; N]) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::FITS;
        Self::from_parts_unchecked(S::default(), ArrayStorage::new(data))
    }

    pub fn into_array(self) -> [T; N] {
        self.storage.into_array()
    }
}

impl<T, S, const N: usize, const R: usize> Default for TensorBase<S, ArrayStorage<T, N>, R>
where
    T: Default,
    S: FixedExtents<R>,
{
    fn default() -> Self {
        Self::from_array(std::array::from_fn(|_| T::default()))
    }
}

impl<'a, T, S, const R: usize> TensorBase<S, ViewStorage<'a, T>, R>
where
    S: FixedExtents<R>,
{
    /// Views `data` with the compile-time extents `S`.
    pub fn from_slice(data: &'a [T]) -> TensorResult<Self> {
        Self::from_parts(S::default(), ViewStorage::new(data))
    }
}
