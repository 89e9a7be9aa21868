// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

pub mod simulator;

use crate::{
    kcp::{
        KcpCommand,
        KcpHeader,
    },
    runtime::network::consts::KCP_OVERHEAD,
};
use ::anyhow::Result;
use ::std::{
    cell::RefCell,
    rc::Rc,
};

//=============================================================================

/// Datagrams recorded by a [collecting_sink].
pub type Outbox = Rc<RefCell<Vec<Vec<u8>>>>;

/// Output sink used by tests that look at the wire.
pub type Sink = Box<dyn FnMut(&[u8])>;

//=============================================================================

/// Creates a sink that records every datagram it is handed.
pub fn collecting_sink() -> (Sink, Outbox) {
    let outbox: Outbox = Rc::new(RefCell::new(Vec::new()));
    let sent: Outbox = outbox.clone();
    let sink: Sink = Box::new(move |datagram: &[u8]| sent.borrow_mut().push(datagram.to_vec()));
    (sink, outbox)
}

//=============================================================================

/// Takes the datagrams recorded so far.
pub fn take(outbox: &Outbox) -> Vec<Vec<u8>> {
    outbox.borrow_mut().drain(..).collect()
}

//=============================================================================

/// Encodes a single segment without payload.
pub fn encode(header: &KcpHeader) -> Vec<u8> {
    let mut datagram: Vec<u8> = vec![0; KCP_OVERHEAD];
    header.serialize(&mut datagram);
    datagram
}

//=============================================================================

/// Parses every segment header in a datagram.
pub fn parse_headers(datagram: &[u8]) -> Result<Vec<KcpHeader>> {
    let mut headers: Vec<KcpHeader> = Vec::new();
    let mut rest: &[u8] = datagram;
    while !rest.is_empty() {
        let (header, payload): (KcpHeader, &[u8]) = KcpHeader::parse(rest)?;
        rest = &rest[KCP_OVERHEAD + payload.len()..];
        headers.push(header);
    }
    Ok(headers)
}

//=============================================================================

/// Counts segments carrying `cmd` in a batch of datagrams.
pub fn count_commands(datagrams: &[Vec<u8>], cmd: KcpCommand) -> Result<usize> {
    let mut count: usize = 0;
    for datagram in datagrams {
        count += parse_headers(datagram)?.iter().filter(|header| header.cmd == cmd).count();
    }
    Ok(count)
}
