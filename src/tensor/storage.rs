use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::slice;

use crate::error::{TensorError, TensorResult};

/// Element storage addressed by physical offset
///
/// Implemented by owned buffers ([`OwnedStorage`], [`ArrayStorage`]),
/// borrowed views ([`ViewStorage`], [`ViewMutStorage`]) and lazily mapped
/// storage ([`Mapped`](super::transform::Mapped)). Offsets are physical: the
/// shape decides which offsets a tensor touches.
pub trait Storage {
    /// Element type as seen by readers
    type Elem;

    /// What [`Storage::get`] hands out: a reference for stored elements, a
    /// value for computed ones
    type Ref<'a>
    where
        Self: 'a;

    /// Read-only view produced by [`Storage::view_at`]
    type View<'a>: Storage<Elem = Self::Elem> + Clone
    where
        Self: 'a;

    /// Element `i` lives at offset `i` of a single buffer
    const CONTIGUOUS: bool;

    /// Elements can be written through this storage
    const MUTABLE: bool;

    /// Number of addressable offsets
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, offset: usize) -> TensorResult<Self::Ref<'_>>;

    /// Checks that every offset in `0..footprint` can be read.
    fn check_reach(&self, footprint: usize) -> TensorResult<()> {
        check_reach(footprint, self.len())
    }

    /// Reads the element at `offset` by value.
    fn load(&self, offset: usize) -> TensorResult<Self::Elem>
    where
        Self::Elem: Clone;

    /// Read-only view anchored at offset 0.
    fn view(&self) -> Self::View<'_>;

    /// Read-only view anchored at `offset`; offset `k` of the view is offset
    /// `offset + k` here.
    fn view_at(&self, offset: usize) -> TensorResult<Self::View<'_>>;
}

/// Storage whose elements can be written in place
pub trait StorageMut: Storage {
    type ViewMut<'a>: StorageMut<Elem = Self::Elem>
    where
        Self: 'a;

    fn get_mut(&mut self, offset: usize) -> TensorResult<&mut Self::Elem>;

    fn view_mut(&mut self) -> Self::ViewMut<'_>;

    fn view_mut_at(&mut self, offset: usize) -> TensorResult<Self::ViewMut<'_>>;

    /// Every addressable element, in offset order.
    fn as_mut_slice(&mut self) -> &mut [Self::Elem];
}

/// Storage that is one plain buffer
pub trait Contiguous: Storage {
    fn as_slice(&self) -> &[Self::Elem];
}

/// Storage that can be brought to a new element count (used by reshape)
pub trait Resizable: StorageMut {
    fn fit(&mut self, len: usize) -> TensorResult<()>;
}

#[inline]
fn element<T>(data: &[T], offset: usize) -> TensorResult<&T> {
    data.get(offset).ok_or(TensorError::StorageOutOfRange {
        offset,
        len: data.len(),
    })
}

#[inline]
fn element_mut<T>(data: &mut [T], offset: usize) -> TensorResult<&mut T> {
    let len = data.len();
    data.get_mut(offset)
        .ok_or(TensorError::StorageOutOfRange { offset, len })
}

fn check_reach(footprint: usize, len: usize) -> TensorResult<()> {
    if footprint > len {
        return Err(TensorError::StorageOutOfRange {
            offset: footprint - 1,
            len,
        });
    }
    Ok(())
}

#[inline]
fn check_anchor(offset: usize, len: usize) -> TensorResult<()> {
    if offset > len {
        return Err(TensorError::StorageOutOfRange { offset, len });
    }
    Ok(())
}

/// Heap buffer owned by its tensor
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OwnedStorage<T> {
    data: Vec<T>,
}

impl<T> OwnedStorage<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self { data }
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T> From<Vec<T>> for OwnedStorage<T> {
    fn from(data: Vec<T>) -> Self {
        Self::new(data)
    }
}

impl<T> Storage for OwnedStorage<T> {
    type Elem = T;
    type Ref<'a> = &'a T where Self: 'a;
    type View<'a> = ViewStorage<'a, T> where Self: 'a;

    const CONTIGUOUS: bool = true;
    const MUTABLE: bool = true;

    fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn get(&self, offset: usize) -> TensorResult<&T> {
        element(&self.data, offset)
    }

    fn load(&self, offset: usize) -> TensorResult<T>
    where
        T: Clone,
    {
        element(&self.data, offset).cloned()
    }

    fn view(&self) -> ViewStorage<'_, T> {
        ViewStorage::new(&self.data)
    }

    fn view_at(&self, offset: usize) -> TensorResult<ViewStorage<'_, T>> {
        self.view().at_offset(offset)
    }
}

impl<T> StorageMut for OwnedStorage<T> {
    type ViewMut<'a> = ViewMutStorage<'a, T> where Self: 'a;

    #[inline]
    fn get_mut(&mut self, offset: usize) -> TensorResult<&mut T> {
        element_mut(&mut self.data, offset)
    }

    fn view_mut(&mut self) -> ViewMutStorage<'_, T> {
        ViewMutStorage::new(&mut self.data)
    }

    fn view_mut_at(&mut self, offset: usize) -> TensorResult<ViewMutStorage<'_, T>> {
        self.view_mut().into_offset(offset)
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T> Contiguous for OwnedStorage<T> {
    fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T: Default + Clone> Resizable for OwnedStorage<T> {
    fn fit(&mut self, len: usize) -> TensorResult<()> {
        self.data.resize(len, T::default());
        Ok(())
    }
}

/// Fixed-size buffer owned by its tensor
///
/// `Clone` but not `Copy`: duplicating the buffer is always explicit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayStorage<T, const N: usize> {
    data: [T; N],
}

impl<T, const N: usize> ArrayStorage<T, N> {
    pub fn new(data: [T; N]) -> Self {
        Self { data }
    }

    pub fn into_array(self) -> [T; N] {
        self.data
    }
}

impl<T: Default, const N: usize> Default for ArrayStorage<T, N> {
    fn default() -> Self {
        Self {
            data: std::array::from_fn(|_| T::default()),
        }
    }
}

impl<T, const N: usize> Storage for ArrayStorage<T, N> {
    type Elem = T;
    type Ref<'a> = &'a T where Self: 'a;
    type View<'a> = ViewStorage<'a, T> where Self: 'a;

    const CONTIGUOUS: bool = true;
    const MUTABLE: bool = true;

    fn len(&self) -> usize {
        N
    }

    #[inline]
    fn get(&self, offset: usize) -> TensorResult<&T> {
        element(&self.data, offset)
    }

    fn load(&self, offset: usize) -> TensorResult<T>
    where
        T: Clone,
    {
        element(&self.data, offset).cloned()
    }

    fn view(&self) -> ViewStorage<'_, T> {
        ViewStorage::new(&self.data)
    }

    fn view_at(&self, offset: usize) -> TensorResult<ViewStorage<'_, T>> {
        self.view().at_offset(offset)
    }
}

impl<T, const N: usize> StorageMut for ArrayStorage<T, N> {
    type ViewMut<'a> = ViewMutStorage<'a, T> where Self: 'a;

    #[inline]
    fn get_mut(&mut self, offset: usize) -> TensorResult<&mut T> {
        element_mut(&mut self.data, offset)
    }

    fn view_mut(&mut self) -> ViewMutStorage<'_, T> {
        ViewMutStorage::new(&mut self.data)
    }

    fn view_mut_at(&mut self, offset: usize) -> TensorResult<ViewMutStorage<'_, T>> {
        self.view_mut().into_offset(offset)
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T, const N: usize> Contiguous for ArrayStorage<T, N> {
    fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T, const N: usize> Resizable for ArrayStorage<T, N> {
    fn fit(&mut self, len: usize) -> TensorResult<()> {
        if len > N {
            return Err(TensorError::BufferTooSmall { required: len, len: N });
        }
        Ok(())
    }
}

/// Read-only borrowed buffer
///
/// A pointer and a length tied to the lifetime `'a` of the memory it was
/// taken from. `ViewStorage::default()` is unbound: every access fails with
/// [`TensorError::UnboundAccess`].
pub struct ViewStorage<'a, T> {
    ptr: NonNull<T>,
    len: usize,
    bound: bool,
    _marker: PhantomData<&'a [T]>,
}

impl<'a, T> ViewStorage<'a, T> {
    pub fn new(data: &'a [T]) -> Self {
        Self {
            ptr: NonNull::from(data).cast(),
            len: data.len(),
            bound: true,
            _marker: PhantomData,
        }
    }

    /// Views `len` elements starting at `ptr`. A null `ptr` gives an unbound
    /// view.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `len` consecutive `T` for all of
    /// `'a`, and nothing may write to that memory during `'a`.
    pub unsafe fn from_raw_parts(ptr: *const T, len: usize) -> Self {
        match NonNull::new(ptr as *mut T) {
            Some(ptr) => Self {
                ptr,
                len,
                bound: true,
                _marker: PhantomData,
            },
            None => Self::default(),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn as_slice(&self) -> &'a [T] {
        // SAFETY: `ptr`/`len` come from a `&'a [T]` or from the contract of
        // `from_raw_parts`; unbound views are dangling with `len == 0`.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    fn element(&self, offset: usize) -> TensorResult<&'a T> {
        if !self.bound {
            return Err(TensorError::UnboundAccess);
        }
        element(self.as_slice(), offset)
    }

    fn at_offset(self, offset: usize) -> TensorResult<Self> {
        if !self.bound {
            return Err(TensorError::UnboundAccess);
        }
        check_anchor(offset, self.len)?;
        Ok(Self {
            // SAFETY: `offset <= len`, so the result stays inside (or one past)
            // the viewed allocation.
            ptr: unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(offset)) },
            len: self.len - offset,
            bound: true,
            _marker: PhantomData,
        })
    }

    /// Reinterprets this read-only view as a mutable one.
    ///
    /// # Safety
    ///
    /// The viewed memory must be writable and must not be accessed through
    /// any other reference while the returned view is alive. A view built
    /// with [`ViewStorage::new`] from a shared slice never satisfies this;
    /// one built with [`ViewStorage::from_raw_parts`] from a `*mut T` can.
    #[cfg(feature = "always-mutable")]
    pub unsafe fn assume_mutable(self) -> ViewMutStorage<'a, T> {
        ViewMutStorage {
            ptr: self.ptr,
            len: self.len,
            bound: self.bound,
            _marker: PhantomData,
        }
    }
}

impl<T> Default for ViewStorage<'_, T> {
    fn default() -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            bound: false,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for ViewStorage<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ViewStorage<'_, T> {}

impl<T> fmt::Debug for ViewStorage<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewStorage")
            .field("len", &self.len)
            .field("bound", &self.bound)
            .finish()
    }
}

// Same rules as `&[T]`
unsafe impl<T: Sync> Send for ViewStorage<'_, T> {}
unsafe impl<T: Sync> Sync for ViewStorage<'_, T> {}

impl<'a, T> Storage for ViewStorage<'a, T> {
    type Elem = T;
    type Ref<'b> = &'a T where Self: 'b;
    type View<'b> = ViewStorage<'a, T> where Self: 'b;

    const CONTIGUOUS: bool = true;
    const MUTABLE: bool = false;

    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn get(&self, offset: usize) -> TensorResult<&'a T> {
        self.element(offset)
    }

    fn check_reach(&self, footprint: usize) -> TensorResult<()> {
        if !self.bound && footprint > 0 {
            return Err(TensorError::UnboundAccess);
        }
        check_reach(footprint, self.len)
    }

    fn load(&self, offset: usize) -> TensorResult<T>
    where
        T: Clone,
    {
        self.element(offset).cloned()
    }

    fn view(&self) -> ViewStorage<'a, T> {
        *self
    }

    fn view_at(&self, offset: usize) -> TensorResult<ViewStorage<'a, T>> {
        self.at_offset(offset)
    }
}

impl<T> Contiguous for ViewStorage<'_, T> {
    fn as_slice(&self) -> &[T] {
        ViewStorage::as_slice(self)
    }
}

/// Mutable borrowed buffer
///
/// Exclusive for its lifetime `'a`, like `&'a mut [T]`.
pub struct ViewMutStorage<'a, T> {
    ptr: NonNull<T>,
    len: usize,
    bound: bool,
    _marker: PhantomData<&'a mut [T]>,
}

impl<'a, T> ViewMutStorage<'a, T> {
    pub fn new(data: &'a mut [T]) -> Self {
        Self {
            len: data.len(),
            ptr: NonNull::from(data).cast(),
            bound: true,
            _marker: PhantomData,
        }
    }

    /// Mutably views `len` elements starting at `ptr`. A null `ptr` gives an
    /// unbound view.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `len` consecutive `T` for
    /// all of `'a`, and no other reference may access that memory during
    /// `'a`.
    pub unsafe fn from_raw_parts_mut(ptr: *mut T, len: usize) -> Self {
        match NonNull::new(ptr) {
            Some(ptr) => Self {
                ptr,
                len,
                bound: true,
                _marker: PhantomData,
            },
            None => Self::default(),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: see `ViewMutStorage::new` / `from_raw_parts_mut`.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: `&mut self` guarantees exclusive access for the borrow.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Gives up the view, keeping the full `'a` borrow.
    pub fn into_mut_slice(self) -> &'a mut [T] {
        // SAFETY: `self` is consumed, so the returned slice is the only access.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    fn into_offset(self, offset: usize) -> TensorResult<Self> {
        if !self.bound {
            return Err(TensorError::UnboundAccess);
        }
        check_anchor(offset, self.len)?;
        Ok(Self {
            // SAFETY: `offset <= len`.
            ptr: unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(offset)) },
            len: self.len - offset,
            bound: true,
            _marker: PhantomData,
        })
    }

    fn reborrow(&mut self) -> ViewMutStorage<'_, T> {
        ViewMutStorage {
            ptr: self.ptr,
            len: self.len,
            bound: self.bound,
            _marker: PhantomData,
        }
    }

    fn shared(&self) -> ViewStorage<'_, T> {
        ViewStorage {
            ptr: self.ptr,
            len: self.len,
            bound: self.bound,
            _marker: PhantomData,
        }
    }
}

impl<T> Default for ViewMutStorage<'_, T> {
    fn default() -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            bound: false,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ViewMutStorage<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewMutStorage")
            .field("len", &self.len)
            .field("bound", &self.bound)
            .finish()
    }
}

// Same rules as `&mut [T]`
unsafe impl<T: Send> Send for ViewMutStorage<'_, T> {}
unsafe impl<T: Sync> Sync for ViewMutStorage<'_, T> {}

impl<'a, T> Storage for ViewMutStorage<'a, T> {
    type Elem = T;
    type Ref<'b> = &'b T where Self: 'b;
    type View<'b> = ViewStorage<'b, T> where Self: 'b;

    const CONTIGUOUS: bool = true;
    const MUTABLE: bool = true;

    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn get(&self, offset: usize) -> TensorResult<&T> {
        self.shared().element(offset)
    }

    fn check_reach(&self, footprint: usize) -> TensorResult<()> {
        self.shared().check_reach(footprint)
    }

    fn load(&self, offset: usize) -> TensorResult<T>
    where
        T: Clone,
    {
        self.shared().element(offset).cloned()
    }

    fn view(&self) -> ViewStorage<'_, T> {
        self.shared()
    }

    fn view_at(&self, offset: usize) -> TensorResult<ViewStorage<'_, T>> {
        self.shared().at_offset(offset)
    }
}

impl<'a, T> StorageMut for ViewMutStorage<'a, T> {
    type ViewMut<'b> = ViewMutStorage<'b, T> where Self: 'b;

    #[inline]
    fn get_mut(&mut self, offset: usize) -> TensorResult<&mut T> {
        if !self.bound {
            return Err(TensorError::UnboundAccess);
        }
        element_mut(ViewMutStorage::as_mut_slice(self), offset)
    }

    fn view_mut(&mut self) -> ViewMutStorage<'_, T> {
        self.reborrow()
    }

    fn view_mut_at(&mut self, offset: usize) -> TensorResult<ViewMutStorage<'_, T>> {
        self.reborrow().into_offset(offset)
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        ViewMutStorage::as_mut_slice(self)
    }
}

impl<T> Contiguous for ViewMutStorage<'_, T> {
    fn as_slice(&self) -> &[T] {
        ViewMutStorage::as_slice(self)
    }
}

impl<T> Resizable for ViewMutStorage<'_, T> {
    fn fit(&mut self, len: usize) -> TensorResult<()> {
        if len > self.len {
            return Err(TensorError::BufferTooSmall {
                required: len,
                len: self.len,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owned_storage() {
        let mut storage = OwnedStorage::new(vec![1, 2, 3]);
        assert_eq!(*storage.get(1).unwrap(), 2);
        *storage.get_mut(2).unwrap() = 30;
        assert_eq!(storage.load(2).unwrap(), 30);
        assert!(OwnedStorage::<i32>::CONTIGUOUS && OwnedStorage::<i32>::MUTABLE);
        assert_eq!(
            storage.get(3).unwrap_err(),
            TensorError::StorageOutOfRange { offset: 3, len: 3 }
        );
    }

    #[test]
    fn test_view_at_is_anchored() {
        let storage = OwnedStorage::new((0..10).collect::<Vec<i32>>());
        let view = storage.view_at(4).unwrap();
        assert_eq!(view.len(), 6);
        assert_eq!(*view.get(0).unwrap(), 4);

        let nested = view.view_at(3).unwrap();
        assert_eq!(*nested.get(2).unwrap(), 9);
        assert!(storage.view_at(10).unwrap().is_empty());
        assert!(storage.view_at(11).is_err());
    }

    #[test]
    fn test_unbound_view() {
        let view: ViewStorage<'_, f32> = ViewStorage::default();
        assert!(!view.is_bound());
        assert_eq!(view.get(0).unwrap_err(), TensorError::UnboundAccess);
        assert_eq!(view.view_at(0).unwrap_err(), TensorError::UnboundAccess);

        let null = unsafe { ViewStorage::<f32>::from_raw_parts(std::ptr::null(), 4) };
        assert!(!null.is_bound());
        assert_eq!(null.check_reach(4).unwrap_err(), TensorError::UnboundAccess);
        assert!(null.check_reach(0).is_ok());
    }

    #[test]
    fn test_check_reach() {
        let storage = OwnedStorage::new(vec![0u8; 6]);
        assert!(storage.check_reach(6).is_ok());
        assert_eq!(
            storage.check_reach(7).unwrap_err(),
            TensorError::StorageOutOfRange { offset: 6, len: 6 }
        );
        let mut data = [1u8, 2, 3];
        let view = ViewMutStorage::new(&mut data);
        assert!(view.check_reach(3).is_ok());
        assert!(view.check_reach(4).is_err());
    }

    #[test]
    fn test_view_outlives_borrow_of_parent_view() {
        let data = [1u8, 2, 3, 4];
        let first: &u8 = {
            let view = ViewStorage::new(&data);
            view.get(3).unwrap()
        };
        assert_eq!(*first, 4);
    }

    #[test]
    fn test_mut_view_writes_through() {
        let mut data = vec![0; 4];
        {
            let mut view = ViewMutStorage::new(&mut data);
            *view.get_mut(1).unwrap() = 7;
            let mut tail = view.view_mut_at(2).unwrap();
            *tail.get_mut(1).unwrap() = 9;
        }
        assert_eq!(data, vec![0, 7, 0, 9]);
    }

    #[test]
    fn test_array_storage_fit() {
        let mut storage = ArrayStorage::new([0.0f64; 6]);
        assert!(storage.fit(6).is_ok());
        assert!(storage.fit(4).is_ok());
        assert_eq!(
            storage.fit(8).unwrap_err(),
            TensorError::BufferTooSmall { required: 8, len: 6 }
        );
    }

    #[test]
    fn test_owned_fit_resizes() {
        let mut storage = OwnedStorage::new(vec![1, 2]);
        storage.fit(4).unwrap();
        assert_eq!(storage.into_vec(), vec![1, 2, 0, 0]);
    }

    #[cfg(feature = "always-mutable")]
    #[test]
    fn test_assume_mutable() {
        let mut data = vec![1, 2, 3];
        let view = unsafe { ViewStorage::from_raw_parts(data.as_mut_ptr(), data.len()) };
        let mut writable = unsafe { view.assume_mutable() };
        *writable.get_mut(0).unwrap() = 10;
        assert_eq!(data[0], 10);
    }
}
