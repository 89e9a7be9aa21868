// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

// KCP numbers segments, not bytes, and both sequence numbers and millisecond timestamps live on a 32-bit circle.
// Ordering is only meaningful between values less than 2^31 apart: `a < b` holds when `b - a`, taken modulo 2^32 and
// read as a signed integer, is positive. The relation is not transitive, so SeqNumber implements PartialOrd but never
// Ord.

use ::std::{
    cmp::Ordering,
    fmt,
    ops::{
        Add,
        Sub,
    },
};

//======================================================================================================================
// Structures
//======================================================================================================================

/// Wrapping segment sequence number.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SeqNumber {
    value: u32,
}

//======================================================================================================================
// Standalone Functions
//======================================================================================================================

/// Signed distance from `earlier` to `later` on the wrapping millisecond clock.
#[inline]
pub fn time_diff(later: u32, earlier: u32) -> i32 {
    later.wrapping_sub(earlier) as i32
}

//======================================================================================================================
// Trait Implementations
//======================================================================================================================

impl From<SeqNumber> for u32 {
    #[inline]
    fn from(item: SeqNumber) -> u32 {
        item.value
    }
}

impl From<u32> for SeqNumber {
    #[inline]
    fn from(value: u32) -> Self {
        Self { value }
    }
}

impl fmt::Display for SeqNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl Add for SeqNumber {
    type Output = SeqNumber;

    #[inline]
    fn add(self, other: SeqNumber) -> SeqNumber {
        Self::from(self.value.wrapping_add(other.value))
    }
}

/// The difference of two sequence numbers is a distance, which callers convert back with `u32::from`.
impl Sub for SeqNumber {
    type Output = SeqNumber;

    #[inline]
    fn sub(self, other: SeqNumber) -> SeqNumber {
        Self::from(self.value.wrapping_sub(other.value))
    }
}

impl PartialOrd for SeqNumber {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(time_diff(self.value, other.value).cmp(&0))
    }
}

//======================================================================================================================
// Unit Tests
//======================================================================================================================
