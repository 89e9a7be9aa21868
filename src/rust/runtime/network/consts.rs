// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Constants
//======================================================================================================================

/// Size of the fixed segment header.
pub const KCP_OVERHEAD: usize = 24;

/// Default MTU.
pub const DEFAULT_MTU: usize = 1400;

/// Largest MTU accepted.
pub const MAX_MTU: usize = 0x7fff;

/// Minimum RTO in no-delay mode (milliseconds).
pub const RTO_NODELAY: u32 = 30;

/// Minimum RTO in normal mode (milliseconds).
pub const RTO_MIN: u32 = 100;

/// Initial RTO (milliseconds).
pub const RTO_DEFAULT: u32 = 200;

/// Upper bound for the RTO (milliseconds).
pub const RTO_MAX: u32 = 60000;

/// Upper bound for the backed off RTO of a single segment (milliseconds). Resend deadlines further away would read as
/// past on the wrapping clock.
pub const RTO_BACKOFF_LIMIT: u32 = i32::MAX as u32;

/// Default send window, in segments.
pub const WND_SND: u32 = 32;

/// Default receive window, in segments. Also the smallest receive window accepted, since a full message must fit in
/// it.
pub const WND_RCV: u32 = 128;

/// Messages must need strictly fewer fragments than this.
pub const MAX_FRAGMENTS: usize = WND_RCV as usize;

/// Default update interval (milliseconds).
pub const INTERVAL: u32 = 100;

/// Bounds of the update interval (milliseconds).
pub const INTERVAL_MIN: u32 = 10;
pub const INTERVAL_MAX: u32 = 5000;

/// Retransmissions after which a link is considered dead.
pub const DEAD_LINK: u32 = 20;

/// Initial slow start threshold, in segments.
pub const THRESH_INIT: u32 = 2;

/// Floor of the slow start threshold, in segments.
pub const THRESH_MIN: u32 = 2;

/// Initial window probe wait (milliseconds).
pub const PROBE_INIT: u32 = 7000;

/// Upper bound of the window probe wait (milliseconds).
pub const PROBE_LIMIT: u32 = 120000;

/// Maximum number of transmissions for which fast retransmit still applies to a segment.
pub const FASTACK_LIMIT: u32 = 5;

/// Distance between the flush due time and the clock past which the due time is considered stale (milliseconds).
pub const FLUSH_RESYNC: i32 = 10000;
