use std::fmt;
use std::str::FromStr;

use crate::utils::BridgeError;

/// Arena slot reference. The generation stamps which lifetime of the slot the
/// handle was issued for, so handles from before a clear never resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// String form that crosses the bridge boundary.
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index, self.generation)
    }
}

impl FromStr for Handle {
    type Err = BridgeError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let (index, generation) = id.split_once(':').ok_or_else(|| BridgeError::lookup(id))?;
        let index = index.parse().map_err(|_| BridgeError::lookup(id))?;
        let generation = generation.parse().map_err(|_| BridgeError::lookup(id))?;
        Ok(Self { index, generation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trips() {
        let handle = Handle::new(7, 3);
        assert_eq!(handle.id(), "7:3");
        assert_eq!("7:3".parse::<Handle>().unwrap(), handle);
    }

    #[test]
    fn malformed_ids_are_lookup_errors() {
        for bad in ["", "7", "a:1", "1:", "1:2:3"] {
            assert!(bad.parse::<Handle>().unwrap_err().is_lookup(), "{bad}");
        }
    }
}
