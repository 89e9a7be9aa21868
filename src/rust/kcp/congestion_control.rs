// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use crate::runtime::network::consts::{
    THRESH_INIT,
    THRESH_MIN,
};

//======================================================================================================================
// Structures
//======================================================================================================================

/// Window-based congestion control with slow start, congestion avoidance and fast recovery. Windows are counted in
/// segments; `incr` accumulates the fractional growth of the window in bytes.
#[derive(Debug)]
pub struct CongestionControl {
    cwnd: u32,
    ssthresh: u32,
    incr: u32,
}

//======================================================================================================================
// Associate Functions
//======================================================================================================================

impl CongestionControl {
    pub fn new() -> Self {
        Self {
            cwnd: 0,
            ssthresh: THRESH_INIT,
            incr: 0,
        }
    }

    pub fn get_cwnd(&self) -> u32 {
        self.cwnd
    }

    pub fn get_ssthresh(&self) -> u32 {
        self.ssthresh
    }

    pub fn get_incr(&self) -> u32 {
        self.incr
    }

    /// Grows the window after the oldest unacknowledged segment moved forward.
    pub fn on_ack_received(&mut self, mss: u32, remote_window: u32) {
        if self.cwnd >= remote_window {
            return;
        }

        if self.cwnd < self.ssthresh {
            // Slow start.
            self.cwnd += 1;
            self.incr = self.incr.saturating_add(mss);
        } else {
            // Congestion avoidance.
            if self.incr < mss {
                self.incr = mss;
            }
            self.incr = self.incr.saturating_add(mss * mss / self.incr + mss / 16);
            if (self.cwnd as u64 + 1) * mss as u64 <= self.incr as u64 {
                self.cwnd = self.incr.div_ceil(mss);
            }
        }

        if self.cwnd > remote_window {
            self.cwnd = remote_window;
            self.incr = remote_window.saturating_mul(mss);
        }
    }

    /// Collapses the window after a retransmission timeout. `window` is the effective window of the flush that
    /// detected the loss.
    pub fn on_rto(&mut self, window: u32, mss: u32) {
        self.ssthresh = (window / 2).max(THRESH_MIN);
        self.cwnd = 1;
        self.incr = mss;
    }

    /// Enters fast recovery after `resend` duplicate ACKs, with `inflight` segments outstanding.
    pub fn on_fast_retransmit(&mut self, inflight: u32, resend: u32, mss: u32) {
        self.ssthresh = (inflight / 2).max(THRESH_MIN);
        self.cwnd = self.ssthresh.saturating_add(resend);
        self.incr = self.cwnd.saturating_mul(mss);
    }

    /// Keeps at least one segment in flight.
    pub fn ensure_open(&mut self, mss: u32) {
        if self.cwnd < 1 {
            self.cwnd = 1;
            self.incr = mss;
        }
    }
}

impl Default for CongestionControl {
    fn default() -> Self {
        Self::new()
    }
}

//======================================================================================================================
// Unit Tests
//======================================================================================================================
