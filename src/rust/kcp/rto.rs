// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use crate::runtime::network::consts::{
    RTO_DEFAULT,
    RTO_MAX,
    RTO_MIN,
};

// Retransmission Timeout (RTO) Calculator.
// Follows the smoothing of RFC 6298 in integer milliseconds, except that the variance term is never allowed to drop
// below the update interval, since segments cannot be retransmitted more often than update() runs.

#[derive(Debug)]
pub struct RtoCalculator {
    // Smoothed round-trip time.
    srtt: u32,

    // Round-trip time variation.
    rttvar: u32,

    // Retransmission timeout.
    rto: u32,

    // Lower bound of the retransmission timeout.
    min_rto: u32,

    // Whether a RTT (round-trip-time) sample has been received yet.
    received_sample: bool,
}

impl RtoCalculator {
    /// Initializes an RTO Calculator.
    pub fn new() -> Self {
        Self {
            srtt: 0,
            rttvar: 0,
            rto: RTO_DEFAULT,
            min_rto: RTO_MIN,
            received_sample: false,
        }
    }

    /// Adds an RTT sample (milliseconds) to the calculator.
    pub fn add_sample(&mut self, rtt: u32, interval: u32) {
        if !self.received_sample {
            self.srtt = rtt;
            self.rttvar = rtt / 2;
            self.received_sample = true;
        } else {
            // rttvar = 3/4 rttvar + 1/4 |srtt - rtt|, srtt = 7/8 srtt + 1/8 rtt.
            let delta: u32 = rtt.abs_diff(self.srtt);
            self.rttvar = ((self.rttvar as u64 * 3 + delta as u64) / 4) as u32;
            self.srtt = (((self.srtt as u64 * 7 + rtt as u64) / 8) as u32).max(1);
        }

        let rto: u32 = self
            .srtt
            .saturating_add(interval.max(self.rttvar.saturating_mul(4)));
        self.rto = rto.clamp(self.min_rto, RTO_MAX);
    }

    /// Sets the lower bound used from the next sample on.
    pub fn set_min_rto(&mut self, min_rto: u32) {
        self.min_rto = min_rto;
    }

    /// Gets the current RTO value.
    pub fn rto(&self) -> u32 {
        self.rto
    }

    /// Gets the smoothed round-trip time.
    pub fn srtt(&self) -> u32 {
        self.srtt
    }

    /// Gets the round-trip time variation.
    pub fn rttvar(&self) -> u32 {
        self.rttvar
    }
}

impl Default for RtoCalculator {
    fn default() -> Self {
        Self::new()
    }
}
