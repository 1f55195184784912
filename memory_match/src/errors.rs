/// The error type for [`BoardGenerator::generate()`](crate::BoardGenerator::generate),
/// i.e. for choosing the shape of a new board.
///
/// This is always a configuration problem. Retrying with the same
/// constraints fails the same way, so callers should surface it instead of
/// starting a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutError {
    NoValidConfiguration {
        min_pairs: u32,
        max_pairs: u32,
        max_rows: u32,
        max_columns: u32,
    },
    InvalidPairRange {
        min_pairs: u32,
        max_pairs: u32,
    },
}

impl std::error::Error for LayoutError {}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutError::NoValidConfiguration {
                min_pairs,
                max_pairs,
                max_rows,
                max_columns,
            } => write!(
                f,
                "No board layout with {} to {} pairs fits into {} rows and {} columns",
                min_pairs, max_pairs, max_rows, max_columns
            ),
            LayoutError::InvalidPairRange {
                min_pairs,
                max_pairs,
            } => write!(
                f,
                "The pair range {}..={} is empty, its minimum is larger than its maximum",
                min_pairs, max_pairs
            ),
        }
    }
}
