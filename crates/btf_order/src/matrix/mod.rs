pub mod builder;
pub mod csc;
pub mod error;

/// Matrix dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dim {
    pub nrows: usize,
    pub ncols: usize,
}
