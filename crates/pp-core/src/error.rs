use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    SizeMismatch { expected: usize, actual: usize },
    OutOfBounds,
    EmptyRegion,
    RegionOutsideBox { left: i32, right: i32 },
    CapacityExceeded { capacity: usize },
    DegenerateChain,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {expected}, got {actual}")
            }
            Self::OutOfBounds => write!(f, "out of bounds"),
            Self::EmptyRegion => write!(f, "region is empty after clamping"),
            Self::RegionOutsideBox { left, right } => {
                write!(f, "edges {left}..{right} lie outside the grey-value box")
            }
            Self::CapacityExceeded { capacity } => {
                write!(f, "row capacity of {capacity} exceeded")
            }
            Self::DegenerateChain => write!(f, "chain has no usable points"),
        }
    }
}

impl std::error::Error for Error {}
