// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Construction-time validation failures.  Everything past construction
//! is total: selection falls back instead of failing, and the raster
//! drops what it cannot plot.

use failure::Fail;

/// The three ways a caller can hand us something we refuse to build.
#[derive(Debug, Clone, PartialEq, Fail)]
pub enum IfsError {
    /// Empty transform list, mismatched transform and weight counts, or
    /// weights that are negative or do not sum to one.
    #[fail(display = "invalid system: {}", _0)]
    InvalidSystem(String),

    /// Non-positive point or iteration counts, or an out-of-range
    /// iteration index.
    #[fail(display = "invalid parameters: {}", _0)]
    InvalidParameters(String),

    /// A raster whose extents are empty or inverted.
    #[fail(display = "invalid region: {}", _0)]
    InvalidRegion(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IfsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_category() {
        let e = IfsError::InvalidRegion("xmin must be less than xmax".to_string());
        assert_eq!(
            format!("{}", e),
            "invalid region: xmin must be less than xmax"
        );
    }
}
