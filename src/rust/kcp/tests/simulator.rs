// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::kcp::time_diff;
use ::crossbeam_channel::{
    Receiver,
    Sender,
};
use ::rand::{
    rngs::SmallRng,
    Rng,
    SeedableRng,
};

//======================================================================================================================
// Constants
//======================================================================================================================

/// Datagrams a direction holds before it starts dropping everything.
const MAX_IN_FLIGHT: usize = 1000;

//======================================================================================================================
// Structures
//======================================================================================================================

/// One direction of the simulated network.
struct Link {
    /// Where the sending endpoint hands its datagrams.
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
    /// Datagrams on the wire along with their arrival time.
    in_flight: Vec<(u32, Vec<u8>)>,
    /// Datagrams handed to this direction so far, lost or not.
    transmitted: usize,
}

/// A lossy network with random latency between two endpoints (0 and 1), driven by a virtual millisecond clock.
/// Randomness comes from a fixed seed, so runs are reproducible.
pub struct LatencySimulator {
    rng: SmallRng,
    clock: u32,
    /// One-way loss, in percent.
    loss: u32,
    /// One-way latency bounds, in milliseconds.
    delay_min: u32,
    delay_max: u32,
    links: [Link; 2],
}

//======================================================================================================================
// Associate Functions
//======================================================================================================================

impl Link {
    fn new() -> Self {
        let (tx, rx): (Sender<Vec<u8>>, Receiver<Vec<u8>>) = crossbeam_channel::unbounded();
        Self {
            tx,
            rx,
            in_flight: Vec::new(),
            transmitted: 0,
        }
    }
}

impl LatencySimulator {
    /// Creates a simulator. `loss` is the round-trip loss rate in percent, and `rtt_min`/`rtt_max` bound the round-trip
    /// time in milliseconds.
    pub fn new(seed: u64, loss: u32, rtt_min: u32, rtt_max: u32) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            clock: 0,
            loss: loss / 2,
            delay_min: rtt_min / 2,
            delay_max: rtt_max / 2,
            links: [Link::new(), Link::new()],
        }
    }

    /// Output sink for `peer`.
    pub fn transport(&self, peer: usize) -> Sender<Vec<u8>> {
        self.links[peer].tx.clone()
    }

    pub fn now(&self) -> u32 {
        self.clock
    }

    pub fn advance(&mut self, ms: u32) {
        self.clock = self.clock.wrapping_add(ms);
    }

    /// Datagrams sent by `peer` so far.
    pub fn transmitted(&self, peer: usize) -> usize {
        self.links[peer].transmitted
    }

    /// Puts datagrams that endpoints handed over since the last call on the wire, dropping some of them.
    pub fn pump(&mut self) {
        let now: u32 = self.clock;
        for link in self.links.iter_mut() {
            while let Ok(datagram) = link.rx.try_recv() {
                link.transmitted += 1;
                if self.rng.gen_range(0..100) < self.loss || link.in_flight.len() >= MAX_IN_FLIGHT {
                    continue;
                }
                let delay: u32 = if self.delay_max > self.delay_min {
                    self.rng.gen_range(self.delay_min..self.delay_max)
                } else {
                    self.delay_min
                };
                link.in_flight.push((now.wrapping_add(delay), datagram));
            }
        }
    }

    /// Takes the datagrams that reached `peer` by now, in arrival order.
    pub fn deliver(&mut self, peer: usize) -> Vec<Vec<u8>> {
        let now: u32 = self.clock;
        let link: &mut Link = &mut self.links[1 - peer];
        let (mut arrived, pending): (Vec<(u32, Vec<u8>)>, Vec<(u32, Vec<u8>)>) = link
            .in_flight
            .drain(..)
            .partition(|(arrival, _)| time_diff(now, *arrival) >= 0);
        link.in_flight = pending;
        arrived.sort_by_key(|(arrival, _)| *arrival);
        arrived.into_iter().map(|(_, datagram)| datagram).collect()
    }
}
