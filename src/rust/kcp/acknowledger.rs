// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use crate::kcp::SeqNumber;

// ACKs owed to the peer.
//
// Every data segment that lands inside the receive window is acknowledged individually, duplicates included, on the
// next flush. The list is drained in arrival order and keeps its storage across flushes.

// Initial capacity, in entries.
const ACK_BLOCK: usize = 16;

#[derive(Debug, Default)]
pub struct AckList {
    // Sequence number and timestamp of each data segment to acknowledge.
    entries: Vec<(SeqNumber, u32)>,
}

impl AckList {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Records that the data segment `sn`, stamped with `ts` by the peer, must be acknowledged.
    pub fn push(&mut self, sn: SeqNumber, ts: u32) {
        let needed: usize = self.entries.len() + 1;
        if needed > self.entries.capacity() {
            let mut block: usize = ACK_BLOCK;
            while block < needed {
                block <<= 1;
            }
            self.entries.reserve_exact(block - self.entries.len());
        }
        self.entries.push((sn, ts));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<(SeqNumber, u32)> {
        self.entries.get(index).copied()
    }

    /// Forgets all pending ACKs.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::AckList;
    use crate::kcp::SeqNumber;
    use ::anyhow::Result;

    #[test]
    fn grows_in_blocks() -> Result<()> {
        let mut acks: AckList = AckList::new();
        crate::ensure_eq!(acks.is_empty(), true);

        acks.push(SeqNumber::from(1), 10);
        crate::ensure_eq!(acks.entries.capacity() >= 16, true);

        for sn in 2..=17u32 {
            acks.push(SeqNumber::from(sn), 10 * sn);
        }
        crate::ensure_eq!(acks.len(), 17);
        crate::ensure_eq!(acks.entries.capacity() >= 32, true);
        crate::ensure_eq!(acks.get(0), Some((SeqNumber::from(1), 10)));
        crate::ensure_eq!(acks.get(16), Some((SeqNumber::from(17), 170)));
        crate::ensure_eq!(acks.get(17), None);

        acks.clear();
        crate::ensure_eq!(acks.len(), 0);
        Ok(())
    }
}
