// src/heuristics/mod.rs

mod batch;

use std::fmt;
use time::Date;

/// Arrival date recovered from the first five characters of a batch code.
///
/// Renders as an empty cell when the code was too short to try, and as
/// [`ArrivalDate::SENTINEL`] when the date token does not name a real day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalDate {
    NotAttempted,
    Undecodable,
    Decoded(Date),
}

impl ArrivalDate {
    /// Marker written when decoding was attempted and failed.
    pub const SENTINEL: &'static str = "INVALID";
}

impl fmt::Display for ArrivalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrivalDate::NotAttempted => Ok(()),
            ArrivalDate::Undecodable => f.write_str(Self::SENTINEL),
            ArrivalDate::Decoded(date) => write!(
                f,
                "{:02}-{:02}-{}",
                date.day(),
                u8::from(date.month()),
                date.year()
            ),
        }
    }
}

/// A batch code after character correction and re-segmentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinedBatch {
    pub canonical: String,
    pub arrival: ArrivalDate,
}

/// Refine a raw batch code read off a checksheet.
pub fn refine_batch(raw: &str) -> RefinedBatch {
    batch::refine(raw)
}

/// Same as [`refine_batch`], treating a missing value as empty.
pub fn refine_optional(raw: Option<&str>) -> RefinedBatch {
    refine_batch(raw.unwrap_or_default())
}
