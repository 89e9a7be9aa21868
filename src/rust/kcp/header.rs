// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use crate::{
    kcp::SeqNumber,
    runtime::{
        fail::{
            Fail,
            FailKind,
        },
        network::consts::KCP_OVERHEAD,
    },
};
use ::std::convert::TryFrom;

//======================================================================================================================
// Structures
//======================================================================================================================

/// Segment commands.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum KcpCommand {
    /// Carries data.
    Push = 81,
    /// Acknowledges one data segment.
    Ack = 82,
    /// Asks the peer to advertise its window.
    WindowAsk = 83,
    /// Advertises the local window.
    WindowTell = 84,
}

impl TryFrom<u8> for KcpCommand {
    type Error = Fail;

    fn try_from(value: u8) -> Result<Self, Fail> {
        match value {
            81 => Ok(KcpCommand::Push),
            82 => Ok(KcpCommand::Ack),
            83 => Ok(KcpCommand::WindowAsk),
            84 => Ok(KcpCommand::WindowTell),
            _ => {
                let cause: String = format!("unknown command (cmd={:?})", value);
                Err(Fail::from_kind(FailKind::MalformedInput, &cause))
            },
        }
    }
}

/// Fixed 24-byte segment header. All fields are little-endian on the wire, in this order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KcpHeader {
    /// Conversation identifier.
    pub conv: u32,
    pub cmd: KcpCommand,
    /// Fragments left after this one in the message.
    pub frg: u8,
    /// Free space in the sender's receive window.
    pub wnd: u16,
    /// Sender's clock when the segment was (re)sent, or the echoed timestamp of an ACK.
    pub ts: u32,
    pub sn: SeqNumber,
    /// Everything below this sequence number has been received by the sender.
    pub una: SeqNumber,
    /// Payload length.
    pub len: u32,
}

//======================================================================================================================
// Associate Functions
//======================================================================================================================

impl KcpHeader {
    /// Reads the conversation identifier of a raw datagram.
    pub fn peek_conversation_id(buf: &[u8]) -> Result<u32, Fail> {
        if buf.len() < KCP_OVERHEAD {
            let cause: String = format!("datagram shorter than a header (len={:?})", buf.len());
            return Err(Fail::from_kind(FailKind::MalformedInput, &cause));
        }
        Ok(u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]))
    }

    /// Parses the header at the start of `buf`, returning it along with the payload it announces. Bytes past the
    /// payload belong to the next segment and are left alone.
    pub fn parse(buf: &[u8]) -> Result<(Self, &[u8]), Fail> {
        if buf.len() < KCP_OVERHEAD {
            let cause: String = format!("segment shorter than a header (len={:?})", buf.len());
            return Err(Fail::from_kind(FailKind::MalformedInput, &cause));
        }
        let (hdr_buf, data_buf): (&[u8], &[u8]) = buf.split_at(KCP_OVERHEAD);

        let conv: u32 = u32::from_le_bytes([hdr_buf[0], hdr_buf[1], hdr_buf[2], hdr_buf[3]]);
        let cmd: u8 = hdr_buf[4];
        let frg: u8 = hdr_buf[5];
        let wnd: u16 = u16::from_le_bytes([hdr_buf[6], hdr_buf[7]]);
        let ts: u32 = u32::from_le_bytes([hdr_buf[8], hdr_buf[9], hdr_buf[10], hdr_buf[11]]);
        let sn: SeqNumber = SeqNumber::from(u32::from_le_bytes([hdr_buf[12], hdr_buf[13], hdr_buf[14], hdr_buf[15]]));
        let una: SeqNumber = SeqNumber::from(u32::from_le_bytes([hdr_buf[16], hdr_buf[17], hdr_buf[18], hdr_buf[19]]));
        let len: u32 = u32::from_le_bytes([hdr_buf[20], hdr_buf[21], hdr_buf[22], hdr_buf[23]]);

        if len as usize > data_buf.len() {
            let cause: String = format!(
                "payload exceeds datagram (len={:?}, remaining={:?})",
                len,
                data_buf.len()
            );
            return Err(Fail::from_kind(FailKind::MalformedInput, &cause));
        }
        let cmd: KcpCommand = KcpCommand::try_from(cmd)?;

        let header: KcpHeader = Self {
            conv,
            cmd,
            frg,
            wnd,
            ts,
            sn,
            una,
            len,
        };
        Ok((header, &data_buf[..len as usize]))
    }

    /// Writes the target header into the first [KCP_OVERHEAD] bytes of `buf`.
    pub fn serialize(&self, buf: &mut [u8]) {
        let fixed_buf: &mut [u8] = &mut buf[..KCP_OVERHEAD];
        fixed_buf[0..4].copy_from_slice(&self.conv.to_le_bytes());
        fixed_buf[4] = self.cmd as u8;
        fixed_buf[5] = self.frg;
        fixed_buf[6..8].copy_from_slice(&self.wnd.to_le_bytes());
        fixed_buf[8..12].copy_from_slice(&self.ts.to_le_bytes());
        fixed_buf[12..16].copy_from_slice(&u32::from(self.sn).to_le_bytes());
        fixed_buf[16..20].copy_from_slice(&u32::from(self.una).to_le_bytes());
        fixed_buf[20..24].copy_from_slice(&self.len.to_le_bytes());
    }
}

//======================================================================================================================
// Unit Tests
//======================================================================================================================

#[cfg(test)]
mod tests {
    use super::{
        KcpCommand,
        KcpHeader,
    };
    use crate::{
        kcp::SeqNumber,
        runtime::{
            fail::FailKind,
            network::consts::KCP_OVERHEAD,
        },
    };
    use ::anyhow::Result;

    fn header(cmd: KcpCommand, len: u32) -> KcpHeader {
        KcpHeader {
            conv: 0x11223344,
            cmd,
            frg: 3,
            wnd: 0x0102,
            ts: 0xa0b0c0d0,
            sn: SeqNumber::from(0xfffffffe),
            una: SeqNumber::from(7),
            len,
        }
    }

    #[test]
    fn wire_layout_is_little_endian() -> Result<()> {
        let mut buf: [u8; KCP_OVERHEAD] = [0; KCP_OVERHEAD];
        header(KcpCommand::Push, 5).serialize(&mut buf);
        crate::ensure_eq!(
            buf,
            [
                0x44, 0x33, 0x22, 0x11, 81, 3, 0x02, 0x01, 0xd0, 0xc0, 0xb0, 0xa0, 0xfe, 0xff, 0xff, 0xff, 7, 0, 0, 0,
                5, 0, 0, 0
            ]
        );
        crate::ensure_eq!(KcpHeader::peek_conversation_id(&buf)?, 0x11223344);
        Ok(())
    }

    #[test]
    fn parse_splits_payload_from_trailing_segments() -> Result<()> {
        let mut buf: Vec<u8> = vec![0; KCP_OVERHEAD];
        header(KcpCommand::Ack, 2).serialize(&mut buf);
        buf.extend_from_slice(&[9, 8, 7, 6]);

        let (parsed, payload): (KcpHeader, &[u8]) = KcpHeader::parse(&buf)?;
        crate::ensure_eq!(parsed, header(KcpCommand::Ack, 2));
        crate::ensure_eq!(payload, &[9u8, 8][..]);
        Ok(())
    }

    #[test]
    fn parse_rejects_malformed_segments() -> Result<()> {
        let short: [u8; KCP_OVERHEAD - 1] = [0; KCP_OVERHEAD - 1];
        crate::ensure_eq!(
            KcpHeader::parse(&short).map(|_| ()).map_err(|e| e.kind()),
            Err(FailKind::MalformedInput)
        );

        let mut truncated: Vec<u8> = vec![0; KCP_OVERHEAD];
        header(KcpCommand::Push, 10).serialize(&mut truncated);
        truncated.extend_from_slice(&[1, 2, 3]);
        crate::ensure_eq!(
            KcpHeader::parse(&truncated).map(|_| ()).map_err(|e| e.kind()),
            Err(FailKind::MalformedInput)
        );

        let mut unknown: Vec<u8> = vec![0; KCP_OVERHEAD];
        header(KcpCommand::WindowTell, 0).serialize(&mut unknown);
        unknown[4] = 85;
        crate::ensure_eq!(
            KcpHeader::parse(&unknown).map(|_| ()).map_err(|e| e.kind()),
            Err(FailKind::MalformedInput)
        );
        Ok(())
    }
}
