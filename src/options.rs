//! Knobs for a single decode pass.

use serde::{Deserialize, Serialize};

/// Page size every Finder-written tree declares.
pub const DEFAULT_PAGE_SIZE: u32 = 4096;

/// Settings that control a decode pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Largest tree height (`num_levels`) accepted before giving up.
    pub max_depth: u32,
    /// Whether property-list blobs are decoded or kept as raw bytes.
    pub decode_embedded_plists: bool,
    /// Page size expected in the B-tree metadata; other values are logged.
    pub expected_page_size: u32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: 32,
            decode_embedded_plists: true,
            expected_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl DecodeOptions {
    /// Sets [`DecodeOptions::max_depth`].
    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets [`DecodeOptions::decode_embedded_plists`].
    pub fn decode_embedded_plists(mut self, enabled: bool) -> Self {
        self.decode_embedded_plists = enabled;
        self
    }
}
