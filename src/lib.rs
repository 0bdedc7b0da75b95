//! tensorview - multi-dimensional views over flat buffers
//!
//! Features:
//! - Rank fixed at compile time, extents fixed at compile time or at runtime
//! - Owned, borrowed and lazily transformed storage behind one interface
//! - Zero-copy strided sub-views, including views of views
//! - Bounds checking in debug builds or with the `bounds-check` feature
//!
//! ```
//! use tensorview::{All, Tensor};
//!
//! let t = Tensor::from_vec(vec![1, 2, 3, 4, 5, 6], [2, 3]).unwrap();
//! assert_eq!(*t.at((1, 0)).unwrap(), 2);
//! assert_eq!(t[3], 4);
//!
//! let row = t.at((0, All)).unwrap();
//! assert_eq!(row.iter().unwrap().copied().collect::<Vec<_>>(), vec![1, 3, 5]);
//! ```

pub mod config;
pub mod error;
pub mod tensor;

pub use config::{ConfigBuilder, TensorConfig};
pub use error::{ErrorCode, TensorError, TensorResult};
pub use tensor::{
    All, Cursor, DynamicShape, Fixed1, Fixed2, Fixed3, Fixed4, Fixed5, Fixed6, FixedTensor,
    FixedTensorView, Shape, Span, Storage, StorageMut, SubView, SubViewMut, Tensor, TensorBase,
    TensorView, TensorViewMut,
};
pub use tensor::transform::transform;

/// Install a `tracing` subscriber and log the build configuration.
///
/// Calling it again, or after another subscriber was installed, only logs.
pub fn init() -> TensorResult<()> {
    if let Err(err) = tracing_subscriber::fmt().try_init() {
        tracing::debug!(%err, "tracing subscriber already installed");
    }
    tracing::info!(
        version = version(),
        bounds_checking = config::BOUNDS_CHECKING,
        always_mutable = config::ALWAYS_MUTABLE,
        "tensorview initialized"
    );
    Ok(())
}

/// Get the current crate version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_init_is_idempotent() {
        assert!(init().is_ok());
        assert!(init().is_ok());
    }

    #[test]
    fn test_reexports() {
        let data = [1.0f32, 2.0, 3.0, 4.0];
        let view: TensorView<'_, f32, 2> = TensorView::new(&data, [2, 2]).unwrap();
        let column: SubView<'_, f32, 1> = view.at((.., 1)).unwrap();
        assert_eq!(column.iter().unwrap().copied().collect::<Vec<_>>(), vec![3.0, 4.0]);
    }
}
