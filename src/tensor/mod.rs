//! Tensor views over flat buffers
//!
//! This module provides:
//! - Spans and index arguments (`span`, `index`)
//! - Dynamic, fixed and strided shapes (`shape`)
//! - Owned, borrowed and lazily mapped storage (`storage`, `transform`)
//! - The base tensor with sub-viewing and reshaping (`core`)
//! - Iterators and random-access cursors (`iter`)

pub mod span;
pub mod index;
pub mod shape;
pub mod storage;
pub mod transform;
pub mod core;
pub mod iter;

mod property_tests;

// Re-export main types for convenience
pub use self::core::{
    FixedTensor, FixedTensorView, SubView, SubViewMut, Tensor, TensorBase, TensorView,
    TensorViewMut,
};
pub use index::{AxisArg, Resolve, Selection, Slicing, SpanLike};
pub use iter::{Cursor, Iter, IterMut};
pub use shape::{
    ContiguousShape, DynamicShape, Fixed1, Fixed2, Fixed3, Fixed4, Fixed5, Fixed6, FixedExtents,
    Shape, StridedShape,
};
pub use span::{concat, All, Span, SpanList};
pub use storage::{
    ArrayStorage, Contiguous, OwnedStorage, Resizable, Storage, StorageMut, ViewMutStorage,
    ViewStorage,
};
pub use transform::{transform, ElementFn, Mapped, Then, Transform};
