// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use crate::kcp::{
    header::{
        KcpCommand,
        KcpHeader,
    },
    SeqNumber,
};

//======================================================================================================================
// Structures
//======================================================================================================================

/// A segment along with its retransmission state. Segments live in the control block's arena and sit on exactly one of
/// its queues at a time.
#[derive(Debug)]
pub struct Segment {
    pub cmd: KcpCommand,
    pub frg: u8,
    pub wnd: u16,
    pub ts: u32,
    pub sn: SeqNumber,
    pub una: SeqNumber,
    pub payload: Vec<u8>,

    // Send-side bookkeeping.
    /// When the segment is due for retransmission.
    pub resend_ts: u32,
    /// Retransmission timeout of this particular segment.
    pub rto: u32,
    /// Number of ACKs for later segments seen since the last transmission.
    pub fast_ack: u32,
    /// Number of transmissions so far.
    pub xmit: u32,
}

//======================================================================================================================
// Associate Functions
//======================================================================================================================

impl Segment {
    /// Creates an unsent data segment.
    pub fn new(payload: Vec<u8>, frg: u8) -> Self {
        Self {
            cmd: KcpCommand::Push,
            frg,
            wnd: 0,
            ts: 0,
            sn: SeqNumber::default(),
            una: SeqNumber::default(),
            payload,
            resend_ts: 0,
            rto: 0,
            fast_ack: 0,
            xmit: 0,
        }
    }

    /// Creates a segment out of one that was just received.
    pub fn from_received(header: &KcpHeader, payload: &[u8]) -> Self {
        Self {
            cmd: header.cmd,
            frg: header.frg,
            wnd: header.wnd,
            ts: header.ts,
            sn: header.sn,
            una: header.una,
            payload: payload.to_vec(),
            resend_ts: 0,
            rto: 0,
            fast_ack: 0,
            xmit: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Header describing the target segment on the wire.
    pub fn header(&self, conv: u32) -> KcpHeader {
        KcpHeader {
            conv,
            cmd: self.cmd,
            frg: self.frg,
            wnd: self.wnd,
            ts: self.ts,
            sn: self.sn,
            una: self.una,
            len: self.payload.len() as u32,
        }
    }
}
