//! Iteration in flat order
//!
//! [`Iter`] and [`IterMut`] are the usual borrowing iterators. [`Cursor`] is a
//! random-access position over a view, with pointer-style arithmetic and a
//! default-constructed sentinel that is bound to nothing.

use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::ptr::NonNull;

use crate::error::{TensorError, TensorResult};
use super::core::TensorBase;
use super::shape::Shape;
use super::storage::{Contiguous, Storage, StorageMut};

/// Random-access position over a tensor view
///
/// Equality and ordering look at the position only, so a default-constructed
/// sentinel compares equal to any cursor at position 0. Use
/// [`Cursor::is_bound`] to tell the sentinel apart; reading through it fails
/// with [`TensorError::UnboundAccess`].
pub struct Cursor<S, C, const R: usize> {
    bound: Option<(S, C)>,
    position: isize,
}

impl<S, C, const R: usize> Cursor<S, C, R>
where
    S: Shape<R>,
    C: Storage,
{
    pub fn new(tensor: TensorBase<S, C, R>) -> Self {
        Self::at_position(tensor, 0)
    }

    pub fn at_position(tensor: TensorBase<S, C, R>, position: isize) -> Self {
        Self {
            bound: Some(tensor.into_parts()),
            position,
        }
    }

    /// False only for the default-constructed sentinel.
    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    pub fn position(&self) -> isize {
        self.position
    }

    /// Element under the cursor.
    pub fn get(&self) -> TensorResult<C::Ref<'_>> {
        self.get_at(0)
    }

    /// Element `n` positions away from the cursor.
    pub fn get_at(&self, n: isize) -> TensorResult<C::Ref<'_>> {
        let (shape, storage) = self.bound.as_ref().ok_or(TensorError::UnboundAccess)?;
        let position = self.position + n;
        let index = usize::try_from(position).map_err(|_| TensorError::NegativeIndex {
            axis: 0,
            index: position as i64,
        })?;
        storage.get(shape.flat_to_offset(index)?)
    }

    pub fn advance(&mut self, n: isize) -> &mut Self {
        self.position += n;
        self
    }

    pub fn retreat(&mut self, n: isize) -> &mut Self {
        self.position -= n;
        self
    }

    /// Signed number of steps from `self` to `other`.
    pub fn distance(&self, other: &Self) -> isize {
        other.position - self.position
    }
}

impl<S, C, const R: usize> Default for Cursor<S, C, R> {
    fn default() -> Self {
        Self {
            bound: None,
            position: 0,
        }
    }
}

impl<S: Clone, C: Clone, const R: usize> Clone for Cursor<S, C, R> {
    fn clone(&self) -> Self {
        Self {
            bound: self.bound.clone(),
            position: self.position,
        }
    }
}

impl<S: Copy, C: Copy, const R: usize> Copy for Cursor<S, C, R> {}

impl<S, C, const R: usize> fmt::Debug for Cursor<S, C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("bound", &self.bound.is_some())
            .field("position", &self.position)
            .finish()
    }
}

impl<S, C, const R: usize> PartialEq for Cursor<S, C, R> {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

impl<S, C, const R: usize> Eq for Cursor<S, C, R> {}

impl<S, C, const R: usize> PartialOrd for Cursor<S, C, R> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S, C, const R: usize> Ord for Cursor<S, C, R> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.position.cmp(&other.position)
    }
}

impl<S, C, const R: usize> Add<isize> for Cursor<S, C, R> {
    type Output = Self;

    fn add(mut self, n: isize) -> Self {
        self.position += n;
        self
    }
}

impl<S, C, const R: usize> Sub<isize> for Cursor<S, C, R> {
    type Output = Self;

    fn sub(mut self, n: isize) -> Self {
        self.position -= n;
        self
    }
}

impl<S, C, const R: usize> AddAssign<isize> for Cursor<S, C, R> {
    fn add_assign(&mut self, n: isize) {
        self.position += n;
    }
}

impl<S, C, const R: usize> SubAssign<isize> for Cursor<S, C, R> {
    fn sub_assign(&mut self, n: isize) {
        self.position -= n;
    }
}

impl<S, C, const R: usize> Sub for &Cursor<S, C, R> {
    type Output = isize;

    fn sub(self, other: Self) -> isize {
        self.position - other.position
    }
}

/// Borrowing iterator over the elements of a tensor
///
/// Built by [`TensorBase::iter`] only after the storage was checked to reach
/// every offset of the shape.
pub struct Iter<'a, S, C, const R: usize> {
    shape: S,
    storage: &'a C,
    front: usize,
    back: usize,
}

impl<'a, S, C, const R: usize> Iter<'a, S, C, R>
where
    S: Shape<R>,
    C: Storage,
{
    fn new(shape: S, storage: &'a C) -> Self {
        let back = shape.len();
        Self {
            shape,
            storage,
            front: 0,
            back,
        }
    }

    fn fetch(&mut self, index: usize) -> Option<C::Ref<'a>> {
        let storage = self.storage;
        let element = self.shape.flat_to_offset(index)
            .and_then(|offset| storage.get(offset));
        match element {
            Ok(element) => Some(element),
            Err(err) => {
                // Unreachable once the reach check passed
                tracing::error!(%err, index, "element access failed during iteration");
                self.front = self.back;
                None
            }
        }
    }
}

impl<'a, S, C, const R: usize> Iterator for Iter<'a, S, C, R>
where
    S: Shape<R>,
    C: Storage,
{
    type Item = C::Ref<'a>;

    #[inline]
    fn next(&mut self) -> Option<C::Ref<'a>> {
        if self.front >= self.back {
            return None;
        }
        let index = self.front;
        self.front += 1;
        self.fetch(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<C::Ref<'a>> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl<'a, S, C, const R: usize> DoubleEndedIterator for Iter<'a, S, C, R>
where
    S: Shape<R>,
    C: Storage,
{
    #[inline]
    fn next_back(&mut self) -> Option<C::Ref<'a>> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        self.fetch(self.back)
    }
}

impl<S: Shape<R>, C: Storage, const R: usize> ExactSizeIterator for Iter<'_, S, C, R> {}

impl<S: fmt::Debug, C, const R: usize> fmt::Debug for Iter<'_, S, C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("shape", &self.shape)
            .field("remaining", &(self.back - self.front))
            .finish()
    }
}

impl<S: Shape<R>, C: Storage, const R: usize> FusedIterator for Iter<'_, S, C, R> {}

/// Mutable iterator over the elements of a tensor
///
/// Only built for shapes whose coordinates map to distinct offsets, so no
/// element is handed out twice.
pub struct IterMut<'a, S, T, const R: usize> {
    shape: S,
    ptr: NonNull<T>,
    len: usize,
    front: usize,
    back: usize,
    _marker: PhantomData<&'a mut [T]>,
}

impl<'a, S, T, const R: usize> IterMut<'a, S, T, R>
where
    S: Shape<R>,
{
    fn new(shape: S, data: &'a mut [T]) -> Self {
        let back = shape.len();
        Self {
            shape,
            len: data.len(),
            ptr: NonNull::from(data).cast(),
            front: 0,
            back,
            _marker: PhantomData,
        }
    }

    fn fetch(&mut self, index: usize) -> Option<&'a mut T> {
        match self.shape.flat_to_offset(index) {
            Ok(offset) if offset < self.len => {
                // SAFETY: `offset < len`; the shape is disjoint and every flat
                // index is visited once, so no two returned references alias.
                Some(unsafe { &mut *self.ptr.as_ptr().add(offset) })
            }
            _ => {
                tracing::error!(index, len = self.len, "offset outside the mutable buffer");
                self.front = self.back;
                None
            }
        }
    }
}

impl<S: fmt::Debug, T, const R: usize> fmt::Debug for IterMut<'_, S, T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut")
            .field("shape", &self.shape)
            .field("remaining", &(self.back - self.front))
            .finish()
    }
}

impl<'a, S, T, const R: usize> Iterator for IterMut<'a, S, T, R>
where
    S: Shape<R>,
{
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        if self.front >= self.back {
            return None;
        }
        let index = self.front;
        self.front += 1;
        self.fetch(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<'a, S, T, const R: usize> DoubleEndedIterator for IterMut<'a, S, T, R>
where
    S: Shape<R>,
{
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        self.fetch(self.back)
    }
}

impl<S: Shape<R>, T, const R: usize> ExactSizeIterator for IterMut<'_, S, T, R> {}

impl<S: Shape<R>, T, const R: usize> FusedIterator for IterMut<'_, S, T, R> {}

// Same rules as `&mut [T]`
unsafe impl<S: Send, T: Send, const R: usize> Send for IterMut<'_, S, T, R> {}
unsafe impl<S: Sync, T: Sync, const R: usize> Sync for IterMut<'_, S, T, R> {}

impl<S, C, const R: usize> TensorBase<S, C, R>
where
    S: Shape<R>,
    C: Storage,
{
    /// Iterates the elements in flat order.
    ///
    /// Fails up front when the storage cannot reach every element: an
    /// unbound view gives [`TensorError::UnboundAccess`], a short buffer
    /// [`TensorError::StorageOutOfRange`].
    pub fn iter(&self) -> TensorResult<Iter<'_, S, C, R>> {
        self.storage().check_reach(self.shape().footprint()?)?;
        Ok(Iter::new(self.shape().clone(), self.storage()))
    }

    /// Cursor at flat position 0.
    pub fn cursor(&self) -> Cursor<S, C::View<'_>, R> {
        Cursor::new(self.view())
    }

    /// Cursor one past the last element.
    pub fn cursor_end(&self) -> Cursor<S, C::View<'_>, R> {
        Cursor::at_position(self.view(), self.len() as isize)
    }
}

impl<S, C, const R: usize> TensorBase<S, C, R>
where
    S: Shape<R>,
    C: Contiguous + StorageMut,
{
    /// Iterates the elements mutably in flat order.
    ///
    /// Fails with [`TensorError::OverlappingView`] when two coordinates share
    /// an element, and like [`TensorBase::iter`] when the storage cannot
    /// reach every element.
    pub fn iter_mut(&mut self) -> TensorResult<IterMut<'_, S, C::Elem, R>> {
        if !self.shape().is_disjoint() {
            return Err(TensorError::OverlappingView);
        }
        self.storage().check_reach(self.shape().footprint()?)?;
        let shape = self.shape().clone();
        Ok(IterMut::new(shape, self.storage_mut().as_mut_slice()))
    }
}
