use std::fmt::{self, Debug, Display};

/// Longest name that fits into [`Name`], in bytes.
pub const MAX_NAME_LEN: usize = 63;

/// Inline bounded name of a node, mesh or clip.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Name {
    len: u8,
    bytes: [u8; MAX_NAME_LEN],
}

impl Name {
    /// Names longer than [`MAX_NAME_LEN`] bytes are stored empty.
    pub fn new(name: &str) -> Self {
        let mut result = Name::default();
        if name.len() > MAX_NAME_LEN {
            tracing::warn!(
                "Name `{}` is longer than {} bytes and is dropped",
                name,
                MAX_NAME_LEN
            );
            return result;
        }
        result.bytes[..name.len()].copy_from_slice(name.as_bytes());
        result.len = name.len() as u8;
        result
    }

    pub fn as_str(&self) -> &str {
        // Constructed from `&str` only.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for Name {
    fn default() -> Self {
        Name {
            len: 0,
            bytes: [0; MAX_NAME_LEN],
        }
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl Debug for Name {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(self.as_str(), fmt)
    }
}

impl Display for Name {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_is_kept() {
        let name = Name::new("Armature|Spine");
        assert_eq!(name.as_str(), "Armature|Spine");
        assert!(name == *"Armature|Spine");
    }

    #[test]
    fn long_name_is_dropped() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(Name::new(&long).is_empty());
        let exact = "y".repeat(MAX_NAME_LEN);
        assert_eq!(Name::new(&exact).as_str(), exact);
    }
}
