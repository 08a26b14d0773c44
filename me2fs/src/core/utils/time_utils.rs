// SPDX-License-Identifier: MIT

//! Time utilities for on-disk timestamps.
//!
//! ext2 stores seconds since the UNIX epoch as an unsigned 32-bit value.

use time::OffsetDateTime;

/// Converts an on-disk timestamp into an [`OffsetDateTime`] (UTC).
///
/// `0` means "never set" and yields `None`.
pub fn unix_to_offsetdatetime(secs: u32) -> Option<OffsetDateTime> {
    if secs == 0 {
        return None;
    }
    OffsetDateTime::from_unix_timestamp(secs as i64).ok()
}
