// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Exports
//======================================================================================================================

pub mod config;
pub mod consts;

//======================================================================================================================
// Imports
//======================================================================================================================

use ::crossbeam_channel::Sender;

//======================================================================================================================
// Traits
//======================================================================================================================

/// Output sink of a control block. Every call carries one encoded datagram of at most one MTU, and implementations
/// must hand it to the underlying unreliable transport without blocking indefinitely.
pub trait Transmit {
    /// Transmits a single datagram.
    fn transmit(&mut self, datagram: &[u8]);
}

//======================================================================================================================
// Trait Implementations
//======================================================================================================================

/// Closures are the lightest way of wiring a control block to a socket.
impl<F: FnMut(&[u8])> Transmit for F {
    fn transmit(&mut self, datagram: &[u8]) {
        self(datagram)
    }
}

/// Hands datagrams over to another thread or task through a channel.
impl Transmit for Sender<Vec<u8>> {
    fn transmit(&mut self, datagram: &[u8]) {
        if let Err(e) = self.send(datagram.to_vec()) {
            warn!("transmit(): dropping {} bytes, receiver is gone ({:?})", e.0.len(), e);
        }
    }
}

//======================================================================================================================
// Unit Tests
//======================================================================================================================

#[cfg(test)]
mod tests {
    use super::Transmit;
    use ::anyhow::Result;
    use ::crossbeam_channel::{
        Receiver,
        Sender,
    };

    #[test]
    fn closure_sink() -> Result<()> {
        let mut sent: Vec<Vec<u8>> = Vec::new();
        {
            let mut sink = |datagram: &[u8]| sent.push(datagram.to_vec());
            sink.transmit(&[1, 2, 3]);
            sink.transmit(&[]);
        }
        crate::ensure_eq!(sent, vec![vec![1, 2, 3], vec![]]);
        Ok(())
    }

    #[test]
    fn channel_sink() -> Result<()> {
        let (mut tx, rx): (Sender<Vec<u8>>, Receiver<Vec<u8>>) = crossbeam_channel::unbounded();
        tx.transmit(&[4, 5]);
        crate::ensure_eq!(rx.try_recv()?, vec![4, 5]);

        // A dropped receiver must not bring the sender down.
        drop(rx);
        tx.transmit(&[6]);
        Ok(())
    }
}
