//! Lazily transformed storage
//!
//! [`Mapped`] applies one element function on every read. Mapping an already
//! mapped storage composes the functions with [`Then`] instead of nesting, so
//! a chain of any length stays one wrapper deep.

use std::fmt;

use crate::error::TensorResult;
use super::core::TensorBase;
use super::shape::Shape;
use super::storage::{Storage, ViewStorage};

/// A function from one element to another
pub trait ElementFn<In> {
    type Output;

    fn apply(&self, input: In) -> Self::Output;
}

impl<F, In, O> ElementFn<In> for F
where
    F: Fn(In) -> O,
{
    type Output = O;

    #[inline]
    fn apply(&self, input: In) -> O {
        self(input)
    }
}

/// `first` followed by `second`
#[derive(Clone, Copy)]
pub struct Then<F, G> {
    first: F,
    second: G,
}

impl<F, G> Then<F, G> {
    pub fn new(first: F, second: G) -> Self {
        Self { first, second }
    }
}

impl<In, F, G> ElementFn<In> for Then<F, G>
where
    F: ElementFn<In>,
    G: ElementFn<F::Output>,
{
    type Output = G::Output;

    #[inline]
    fn apply(&self, input: In) -> G::Output {
        self.second.apply(self.first.apply(input))
    }
}

impl<F, G> fmt::Debug for Then<F, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Then")
    }
}

/// Read-only storage that computes each element from an inner storage
#[derive(Clone, Copy)]
pub struct Mapped<C, F> {
    inner: C,
    f: F,
}

impl<C, F> Mapped<C, F> {
    pub fn new(inner: C, f: F) -> Self {
        Self { inner, f }
    }

    /// The untransformed storage.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn function(&self) -> &F {
        &self.f
    }
}

impl<C: fmt::Debug, F> fmt::Debug for Mapped<C, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapped")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<C, F> Storage for Mapped<C, F>
where
    C: Storage,
    C::Elem: Clone,
    F: ElementFn<C::Elem> + Clone,
{
    type Elem = F::Output;
    type Ref<'a> = F::Output where Self: 'a;
    type View<'a> = Mapped<C::View<'a>, F> where Self: 'a;

    const CONTIGUOUS: bool = false;
    const MUTABLE: bool = false;

    fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    fn get(&self, offset: usize) -> TensorResult<F::Output> {
        self.inner.load(offset).map(|value| self.f.apply(value))
    }

    fn check_reach(&self, footprint: usize) -> TensorResult<()> {
        self.inner.check_reach(footprint)
    }

    fn load(&self, offset: usize) -> TensorResult<F::Output>
    where
        F::Output: Clone,
    {
        self.get(offset)
    }

    fn view(&self) -> Mapped<C::View<'_>, F> {
        Mapped::new(self.inner.view(), self.f.clone())
    }

    fn view_at(&self, offset: usize) -> TensorResult<Mapped<C::View<'_>, F>> {
        Ok(Mapped::new(self.inner.view_at(offset)?, self.f.clone()))
    }
}

/// Storages that can absorb one more element function
pub trait Transform<G> {
    type Output: Storage;

    fn transform(self, g: G) -> Self::Output;
}

impl<'a, T, G> Transform<G> for ViewStorage<'a, T>
where
    T: Clone,
    G: ElementFn<T> + Clone,
{
    type Output = Mapped<Self, G>;

    fn transform(self, g: G) -> Mapped<Self, G> {
        Mapped::new(self, g)
    }
}

impl<C, F, G> Transform<G> for Mapped<C, F>
where
    C: Storage,
    C::Elem: Clone,
    F: ElementFn<C::Elem> + Clone,
    G: ElementFn<F::Output> + Clone,
{
    type Output = Mapped<C, Then<F, G>>;

    fn transform(self, g: G) -> Mapped<C, Then<F, G>> {
        Mapped::new(self.inner, Then::new(self.f, g))
    }
}

/// Lazily maps every element of `tensor` through `g`.
///
/// Same as [`TensorBase::map`].
pub fn transform<'a, G, V, S, C, const R: usize>(
    g: G,
    tensor: &'a TensorBase<S, C, R>,
) -> TensorBase<S, <C::View<'a> as Transform<G>>::Output, R>
where
    S: Shape<R>,
    C: Storage,
    G: Fn(C::Elem) -> V + Clone,
    C::View<'a>: Transform<G>,
{
    tensor.map(g)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::core::{Tensor, TensorView};

    #[test]
    fn test_mapped_reads_through() {
        let data = [1.0f32, 2.0, 3.0];
        let mapped = Mapped::new(ViewStorage::new(&data), |x: f32| x * 10.0);
        assert_eq!(mapped.get(2).unwrap(), 30.0);
        assert_eq!(mapped.len(), 3);
        assert!(!Mapped::<ViewStorage<'static, f32>, fn(f32) -> f32>::CONTIGUOUS);
        assert!(mapped.get(3).is_err());
    }

    #[test]
    fn test_chain_does_not_nest() {
        let data = [1i64, 2, 3, 4];
        let add = |x: i64| x + 1;
        let double = |x: i64| x * 2;
        let once = ViewStorage::new(&data).transform(add);
        let twice: Mapped<ViewStorage<'_, i64>, Then<_, _>> = once.transform(double);
        assert_eq!(twice.get(3).unwrap(), 10);
        assert_eq!(twice.inner().len(), 4);
    }

    #[test]
    fn test_map_changes_element_type() {
        let tensor = Tensor::from_vec(vec![1u8, 2, 3, 4, 5, 6], [2, 3]).unwrap();
        let labels = tensor.map(|x| format!("#{x}"));
        assert_eq!(labels.at((1, 2)).unwrap(), "#6");
        assert!(!labels.is_contiguous());
        assert_eq!(labels.extents(), [2, 3]);
    }

    #[test]
    fn test_transform_of_subview() {
        let data: Vec<i32> = (0..12).collect();
        let view = TensorView::new(&data, [3, 4]).unwrap();
        let column = view.at((.., 2)).unwrap();
        let negated = transform(|x: i32| -x, &column);
        let values: Vec<i32> = negated.iter().unwrap().collect();
        assert_eq!(values, vec![-6, -7, -8]);

        let shifted = negated.map(|x| x + 100);
        assert_eq!(shifted.at(1).unwrap(), 93);
    }
}
