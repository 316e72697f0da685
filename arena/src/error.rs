use std::fmt::{self, Display, Formatter};

/// Arena memory is exhausted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutOfMemory;

impl Display for OutOfMemory {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        fmt.write_str("Arena memory is exhausted")
    }
}

impl std::error::Error for OutOfMemory {}
