// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use ::crossbeam_channel::{
    self,
    Receiver,
    Sender,
};
use ::kcp::{
    config::Config,
    runtime::logging,
    ControlBlock,
    FailKind,
    KcpConfig,
    KcpHeader,
};
use ::std::{
    thread::{
        self,
        JoinHandle,
    },
    time::{
        Duration,
        Instant,
    },
};

//==============================================================================
// Constants
//==============================================================================

const CONV: u32 = 0xcafe;
const NMESSAGES: u32 = 64;

//==============================================================================
// Helpers
//==============================================================================

/// Milliseconds elapsed since `epoch`, as the protocol clock.
fn clock(epoch: Instant) -> u32 {
    epoch.elapsed().as_millis() as u32
}

/// Feeds every datagram waiting in `rx` to `cb`.
fn drain(cb: &mut ControlBlock<Sender<Vec<u8>>>, rx: &Receiver<Vec<u8>>) {
    while let Ok(datagram) = rx.try_recv() {
        assert_eq!(KcpHeader::peek_conversation_id(&datagram).unwrap(), CONV);
        cb.input(&datagram).unwrap();
    }
}

/// Creates a pair of endpoints that talk over channels.
fn endpoints(
    epoch: Instant,
    config: &KcpConfig,
) -> (
    (ControlBlock<Sender<Vec<u8>>>, Receiver<Vec<u8>>),
    (ControlBlock<Sender<Vec<u8>>>, Receiver<Vec<u8>>),
) {
    let (alice_tx, bob_rx): (Sender<Vec<u8>>, Receiver<Vec<u8>>) = crossbeam_channel::unbounded();
    let (bob_tx, alice_rx): (Sender<Vec<u8>>, Receiver<Vec<u8>>) = crossbeam_channel::unbounded();
    let alice: ControlBlock<Sender<Vec<u8>>> = ControlBlock::with_config(CONV, clock(epoch), config, alice_tx);
    let bob: ControlBlock<Sender<Vec<u8>>> = ControlBlock::with_config(CONV, clock(epoch), config, bob_tx);
    ((alice, alice_rx), (bob, bob_rx))
}

//==============================================================================
// Tests
//==============================================================================

/// Echoes messages between two threads.
#[test]
fn echo_across_threads() {
    logging::initialize();
    let config: KcpConfig = KcpConfig::new(None, None, None, Some(1), Some(10), Some(2), None, None, None, None).unwrap();
    let epoch: Instant = Instant::now();
    let ((mut alice, alice_rx), (mut bob, bob_rx)) = endpoints(epoch, &config);
    let (done_tx, done_rx): (Sender<()>, Receiver<()>) = crossbeam_channel::bounded(1);

    let echo: JoinHandle<u32> = thread::spawn(move || {
        let mut echoed: u32 = 0;
        let mut buf: Vec<u8> = vec![0; 4096];
        while done_rx.try_recv().is_err() {
            bob.update(clock(epoch));
            drain(&mut bob, &bob_rx);
            while let Ok(len) = bob.recv(&mut buf) {
                bob.send(&buf[..len]).unwrap();
                echoed += 1;
            }
            thread::sleep(Duration::from_millis(1));
        }
        echoed
    });

    for i in 0..NMESSAGES {
        let message: Vec<u8> = vec![i as u8; 1 + (i as usize * 97) % 3000];
        alice.send(&message).unwrap();
    }

    let mut next: u32 = 0;
    let mut buf: Vec<u8> = vec![0; 4096];
    let deadline: Instant = Instant::now() + Duration::from_secs(30);
    while next < NMESSAGES {
        assert!(Instant::now() < deadline, "timed out waiting for echoes");
        alice.update(clock(epoch));
        drain(&mut alice, &alice_rx);
        while let Ok(len) = alice.recv(&mut buf) {
            assert_eq!(len, 1 + (next as usize * 97) % 3000);
            assert!(buf[..len].iter().all(|b| *b == next as u8));
            next += 1;
        }
        thread::sleep(Duration::from_millis(1));
    }

    done_tx.send(()).unwrap();
    assert_eq!(echo.join().unwrap(), NMESSAGES);
    assert_eq!(alice.is_link_dead(), false);
}

/// Streams bytes with settings read from a configuration document.
#[test]
fn stream_with_yaml_config() {
    logging::initialize();
    let config: KcpConfig = Config::from_yaml_str("kcp:\n  mtu: 512\n  stream: true\n  nodelay: 2\n  interval: 10\n")
        .unwrap()
        .kcp_config()
        .unwrap();
    assert_eq!(config.get_mtu(), 512);
    assert_eq!(config.get_stream(), true);

    let epoch: Instant = Instant::now();
    let ((mut alice, alice_rx), (mut bob, bob_rx)) = endpoints(epoch, &config);
    assert_eq!(alice.mss(), 512 - 24);

    let data: Vec<u8> = (0..20_000u32).map(|i| (i % 256) as u8).collect();
    for chunk in data.chunks(100) {
        alice.send(chunk).unwrap();
    }

    // Drive both ends from one thread on a virtual clock.
    let mut now: u32 = clock(epoch);
    let mut received: Vec<u8> = Vec::new();
    let mut buf: Vec<u8> = vec![0; 1024];
    while received.len() < data.len() {
        now += 10;
        alice.update(now);
        bob.update(now);
        drain(&mut bob, &bob_rx);
        drain(&mut alice, &alice_rx);
        loop {
            match bob.recv(&mut buf) {
                Ok(len) => received.extend_from_slice(&buf[..len]),
                Err(e) => {
                    assert_eq!(e.kind(), FailKind::WouldBlock);
                    break;
                },
            }
        }
        assert!(now < clock(epoch) + 60_000, "transfer did not complete");
    }
    assert_eq!(received, data);
}
