use thiserror::Error;

/// Main error type for tensorview
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TensorError {
    /// A coordinate along one axis is past that axis' extent
    #[error("index {index} is out of range for axis {axis} with extent {extent}")]
    IndexOutOfRange {
        axis: usize,
        index: usize,
        extent: usize,
    },

    /// A cursor position below zero
    #[error("position {index} is negative on axis {axis}")]
    NegativeIndex { axis: usize, index: i64 },

    /// A span does not fit inside `[0, extent]` on its axis
    #[error("span {begin}..{end} is out of range for axis {axis} with extent {extent}")]
    SpanOutOfRange {
        axis: usize,
        begin: usize,
        end: usize,
        extent: usize,
    },

    /// A linear (flat) index is past the element count
    #[error("linear index {index} is out of range for a tensor of {len} elements")]
    LinearIndexOutOfRange { index: usize, len: usize },

    /// An axis number is not below the rank
    #[error("axis {axis} is out of range for a tensor of rank {rank}")]
    AxisOutOfRange { axis: usize, rank: usize },

    /// Dereferenced an unbound view or a sentinel cursor
    #[error("bad access: the view or cursor is not bound to any storage")]
    UnboundAccess,

    /// A physical offset fell outside the backing buffer
    #[error("bad access: offset {offset} is outside a buffer of {len} elements")]
    StorageOutOfRange { offset: usize, len: usize },

    /// Mutable access was requested through a shape whose elements alias
    #[error("bad access: the view maps distinct coordinates onto the same element")]
    OverlappingView,

    /// Non-positive extent at construction or reshape
    #[error("bad shape: every extent must be strictly positive, got {extents:?}")]
    BadShape { extents: Vec<usize> },

    /// The buffer cannot hold every element the shape addresses
    #[error("bad shape: the shape needs {required} elements but the buffer holds {len}")]
    BufferTooSmall { required: usize, len: usize },

    /// Configuration file errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TensorError {
    /// Out-of-range error for a single coordinate
    pub fn index_out_of_range(axis: usize, index: usize, extent: usize) -> Self {
        TensorError::IndexOutOfRange {
            axis,
            index,
            extent,
        }
    }

    /// Shape error carrying the offending extents
    pub fn bad_shape(extents: &[usize]) -> Self {
        TensorError::BadShape {
            extents: extents.to_vec(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            TensorError::IndexOutOfRange { .. }
            | TensorError::NegativeIndex { .. }
            | TensorError::SpanOutOfRange { .. }
            | TensorError::LinearIndexOutOfRange { .. }
            | TensorError::AxisOutOfRange { .. } => ErrorCode::OutOfRange,
            TensorError::UnboundAccess
            | TensorError::StorageOutOfRange { .. }
            | TensorError::OverlappingView => ErrorCode::BadAccess,
            TensorError::BadShape { .. } | TensorError::BufferTooSmall { .. } => {
                ErrorCode::BadShape
            }
            TensorError::Config(_) => ErrorCode::Config,
        }
    }

    /// The axis this error is about, if any
    pub fn axis(&self) -> Option<usize> {
        match self {
            TensorError::IndexOutOfRange { axis, .. }
            | TensorError::NegativeIndex { axis, .. }
            | TensorError::SpanOutOfRange { axis, .. }
            | TensorError::AxisOutOfRange { axis, .. } => Some(*axis),
            _ => None,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self.code() {
            ErrorCode::OutOfRange => format!(
                "Out of range: {}\n\nCheck the coordinates against `extents()`; spans are half-open, so `end` may equal the extent but not exceed it.",
                self
            ),
            ErrorCode::BadAccess => format!(
                "Bad access: {}\n\nThe view was never bound to memory, or a cursor was used after being default-constructed.",
                self
            ),
            ErrorCode::BadShape => format!(
                "Bad shape: {}\n\nExtents must be positive and the buffer must hold at least the product of the extents.",
                self
            ),
            ErrorCode::Config => self.to_string(),
        }
    }
}

impl From<std::io::Error> for TensorError {
    fn from(err: std::io::Error) -> Self {
        TensorError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for TensorError {
    fn from(err: serde_json::Error) -> Self {
        TensorError::Config(err.to_string())
    }
}

/// Result type for tensorview operations
pub type TensorResult<T> = Result<T, TensorError>;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    OutOfRange,
    BadAccess,
    BadShape,
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let error = TensorError::index_out_of_range(1, 3, 3);
        assert_eq!(
            error.to_string(),
            "index 3 is out of range for axis 1 with extent 3"
        );
        assert_eq!(error.axis(), Some(1));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            TensorError::SpanOutOfRange {
                axis: 0,
                begin: 2,
                end: 9,
                extent: 4
            }
            .code(),
            ErrorCode::OutOfRange
        );
        assert_eq!(TensorError::UnboundAccess.code(), ErrorCode::BadAccess);
        assert_eq!(TensorError::bad_shape(&[2, 0]).code(), ErrorCode::BadShape);
        assert_eq!(
            TensorError::BufferTooSmall { required: 6, len: 4 }.code(),
            ErrorCode::BadShape
        );
        assert_eq!(TensorError::UnboundAccess.axis(), None);
    }

    #[test]
    fn test_user_message() {
        let message = TensorError::bad_shape(&[2, 0, 4]).user_message();
        assert!(message.contains("[2, 0, 4]"));
        assert!(message.contains("Extents must be positive"));
    }

    #[test]
    fn test_from_serde_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: TensorError = err.into();
        assert_eq!(error.code(), ErrorCode::Config);
    }
}
