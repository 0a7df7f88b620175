use thiserror::Error;

#[derive(Debug, Error)]
pub enum CscError {
    #[error("out of bounds index: {index} (max: {max})")]
    OutOfBoundsIndex { index: usize, max: usize },

    #[error("invalid column pointers length: {expected} (actual: {actual})")]
    InvalidColumnPointersLength { expected: usize, actual: usize },

    #[error("invalid column pointers: {index} (expected: {expected}, actual: {actual})")]
    InvalidColumnPointers {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("rows not strictly increasing in column {index} (previous: {previous}, actual: {actual})")]
    RowsNotStrictlyIncreasing {
        index: usize,
        previous: usize,
        actual: usize,
    },
}
