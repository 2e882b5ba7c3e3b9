use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{Result, TtreeError};

/// Page size the default occupancy is derived from.
pub const DEFAULT_PAGE_SIZE: usize = 4096;
/// Bytes taken by the object header of a persisted page.
pub const OBJECT_HEADER_LEN: usize = 8;
/// Bytes taken by the fixed page fields (two child links, balance, count).
const PAGE_FIELDS_LEN: usize = 4 * 4;
/// Bytes taken by one member reference.
const MEMBER_REF_LEN: usize = 4;

/// Configuration knobs for a T-tree.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtreeOptions {
    /// Capacity of a page in members.
    pub max_items: usize,
    /// Occupancy at or below which a deletion borrows from a neighbouring
    /// subtree instead of shrinking the page.
    pub min_items: usize,
}

impl Default for TtreeOptions {
    fn default() -> Self {
        Self::for_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl TtreeOptions {
    /// Sizes pages so that a full page fits in `page_size` bytes.
    pub fn for_page_size(page_size: usize) -> Self {
        let usable = page_size.saturating_sub(OBJECT_HEADER_LEN + PAGE_FIELDS_LEN);
        Self::with_max_items(usable / MEMBER_REF_LEN)
    }

    /// Explicit capacity with the default borrow threshold of `max_items - 2`.
    pub fn with_max_items(max_items: usize) -> Self {
        Self {
            max_items,
            min_items: max_items.saturating_sub(2).max(1),
        }
    }

    /// Sets the borrow threshold.
    pub fn min_items(mut self, min_items: usize) -> Self {
        self.min_items = min_items;
        self
    }

    /// Checks the occupancy bounds.
    pub fn validate(&self) -> Result<()> {
        if self.max_items < 2 {
            return Err(TtreeError::Invalid("max_items must be at least 2"));
        }
        if self.min_items == 0 {
            return Err(TtreeError::Invalid("min_items must be at least 1"));
        }
        if self.min_items >= self.max_items {
            return Err(TtreeError::Invalid("min_items must be below max_items"));
        }
        Ok(())
    }

    /// Parses and validates options from TOML text.
    pub fn from_toml_str(src: &str) -> Result<Self> {
        let opts: Self = toml::from_str(src).map_err(|err| TtreeError::Config(err.to_string()))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Reads options from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Renders the options as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|err| TtreeError::Config(err.to_string()))
    }
}
