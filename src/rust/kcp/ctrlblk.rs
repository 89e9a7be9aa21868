// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use super::{
    acknowledger::AckList,
    congestion_control::CongestionControl,
    header::{
        KcpCommand,
        KcpHeader,
    },
    rto::RtoCalculator,
    segment::Segment,
    sequence_number::time_diff,
    SeqNumber,
};
use crate::{
    collections::intrusive::{
        IntrusiveList,
        ListArena,
    },
    runtime::{
        fail::{
            Fail,
            FailKind,
        },
        network::{
            config::KcpConfig,
            consts::{
                DEAD_LINK,
                DEFAULT_MTU,
                FASTACK_LIMIT,
                FLUSH_RESYNC,
                INTERVAL,
                INTERVAL_MAX,
                INTERVAL_MIN,
                KCP_OVERHEAD,
                MAX_FRAGMENTS,
                MAX_MTU,
                PROBE_INIT,
                PROBE_LIMIT,
                RTO_BACKOFF_LIMIT,
                RTO_MIN,
                RTO_NODELAY,
                WND_RCV,
                WND_SND,
            },
            Transmit,
        },
    },
};

//======================================================================================================================
// Structures
//======================================================================================================================

/// Control block of a single KCP conversation.
///
/// Segments flow through four queues that share one arena:
///
/// ```text
///   send() --> send queue --> send buffer --> peer     (flush)
///   peer   --> receive buffer --> receive queue --> recv()
/// ```
///
/// The send buffer holds segments in flight ordered by sequence number, and the receive buffer holds segments that
/// arrived ahead of a gap. Nothing happens on its own: the host drives the control block with [ControlBlock::update]
/// and feeds it datagrams with [ControlBlock::input].
pub struct ControlBlock<T: Transmit> {
    // Conversation identifier, agreed upon out of band.
    conv: u32,
    mtu: usize,
    // Largest payload of a single segment.
    mss: usize,
    // Streaming mode coalesces writes and does not preserve message boundaries.
    stream: bool,

    //
    // Sequence Space:
    //
    //                    |<--------------- send window ----------------->|
    //               send_unacked          send_next
    //                    v                    v
    // ... ---------------|--------------------|--------------------------|-------------------
    //        acked       |   in flight        |   send queue may move in |
    //
    // Note: sequence numbers count segments, not bytes.
    //

    // Oldest unacknowledged sequence number.
    send_unacked: SeqNumber,
    // Next sequence number to assign.
    send_next: SeqNumber,
    // Next sequence number expected from the peer.
    receive_next: SeqNumber,

    // Window sizes, in segments.
    send_window: u32,
    receive_window: u32,
    remote_window: u32,

    // Whether the congestion window limits the effective window.
    congestion_control: bool,
    cc: CongestionControl,
    rto_calculator: RtoCalculator,

    // Clock (milliseconds) as of the last call to update().
    current: u32,
    // Update interval (milliseconds).
    interval: u32,
    // When the next flush is due.
    flush_due: u32,
    // When the next window probe is due, and how long to wait between probes.
    probe_due: u32,
    probe_wait: u32,
    // Window probe commands to send on the next flush.
    ask_pending: bool,
    tell_pending: bool,

    // No-delay level (0 to 2).
    nodelay: u8,
    // Fast resend threshold (0 disables fast resend).
    fast_resend: u32,
    // Transmissions after which the link is considered dead.
    dead_link: u32,

    segments: ListArena<Segment>,
    // Unsent segments, in send() order.
    send_queue: IntrusiveList,
    // Segments in flight.
    send_buffer: IntrusiveList,
    // Received segments that cannot be delivered yet.
    receive_buffer: IntrusiveList,
    // In-order segments ready for recv().
    receive_queue: IntrusiveList,

    // ACKs owed to the peer.
    acks: AckList,

    // Coalescing buffer for outgoing datagrams.
    buffer: Vec<u8>,
    transport: T,
}

//======================================================================================================================
// Associate Functions
//======================================================================================================================

impl<T: Transmit> ControlBlock<T> {
    /// Creates a control block for conversation `conv`. An MTU outside of `(KCP_OVERHEAD, MAX_MTU]` falls back to the
    /// default one.
    pub fn new(conv: u32, now: u32, mtu: usize, stream: bool, transport: T) -> Self {
        let mtu: usize = if mtu <= KCP_OVERHEAD || mtu > MAX_MTU {
            warn!("new(): invalid mtu, falling back to default (mtu={:?}, default={:?})", mtu, DEFAULT_MTU);
            DEFAULT_MTU
        } else {
            mtu
        };

        let mut cb: Self = Self::build(conv, now, mtu, stream, transport);
        cb.flush();
        cb
    }

    /// Creates a control block for conversation `conv` tuned according to `config`.
    pub fn with_config(conv: u32, now: u32, config: &KcpConfig, transport: T) -> Self {
        let mut cb: Self = Self::build(conv, now, config.get_mtu(), config.get_stream(), transport);

        cb.set_window_size(config.get_send_window(), config.get_receive_window());
        cb.nodelay = config.get_nodelay();
        cb.interval = config.get_interval();
        cb.fast_resend = config.get_fast_resend();
        cb.congestion_control = config.get_congestion_control();
        cb.rto_calculator.set_min_rto(config.get_min_rto());
        cb.dead_link = config.get_dead_link();
        cb.flush_due = now.wrapping_add(cb.interval);

        debug!("with_config(): conv={:?} config={:?}", conv, config);
        cb.flush();
        cb
    }

    fn build(conv: u32, now: u32, mtu: usize, stream: bool, transport: T) -> Self {
        Self {
            conv,
            mtu,
            mss: mtu - KCP_OVERHEAD,
            stream,
            send_unacked: SeqNumber::from(0),
            send_next: SeqNumber::from(0),
            receive_next: SeqNumber::from(0),
            send_window: WND_SND,
            receive_window: WND_RCV,
            remote_window: WND_RCV,
            congestion_control: true,
            cc: CongestionControl::new(),
            rto_calculator: RtoCalculator::new(),
            current: now,
            interval: INTERVAL,
            flush_due: now.wrapping_add(INTERVAL),
            probe_due: 0,
            probe_wait: 0,
            ask_pending: false,
            tell_pending: false,
            nodelay: 0,
            fast_resend: 0,
            dead_link: DEAD_LINK,
            segments: ListArena::new(),
            send_queue: IntrusiveList::new(),
            send_buffer: IntrusiveList::new(),
            receive_buffer: IntrusiveList::new(),
            receive_queue: IntrusiveList::new(),
            acks: AckList::new(),
            buffer: Vec::with_capacity(mtu),
            transport,
        }
    }

    //==================================================================================================================
    // Application Side
    //==================================================================================================================

    /// Queues `data` for transmission. Messages are split in segments of at most one MSS; in streaming mode, the last
    /// queued segment is topped up first.
    pub fn send(&mut self, data: &[u8]) -> Result<(), Fail> {
        // Bytes that fit in the spare room of the last queued segment.
        let mut top_up: Option<(usize, usize)> = None;
        if self.stream {
            if let Some(key) = self.send_queue.back() {
                let len: usize = self.segments.get(key).len();
                if len < self.mss {
                    top_up = Some((key, data.len().min(self.mss - len)));
                }
            }
        }
        let extend: usize = top_up.map_or(0, |(_, extend)| extend);
        let remaining: usize = data.len() - extend;

        let count: usize = if self.stream && remaining == 0 {
            0
        } else {
            remaining.div_ceil(self.mss).max(1)
        };
        if count >= MAX_FRAGMENTS {
            let cause: String = format!(
                "message needs too many fragments (len={:?}, fragments={:?})",
                data.len(),
                count
            );
            warn!("send(): {}", cause);
            return Err(Fail::from_kind(FailKind::TooManyFragments, &cause));
        }

        if let Some((key, extend)) = top_up {
            let segment: &mut Segment = self.segments.get_mut(key);
            segment.payload.extend_from_slice(&data[..extend]);
            segment.frg = 0;
        }

        let mut rest: &[u8] = &data[extend..];
        for i in 0..count {
            let size: usize = rest.len().min(self.mss);
            let frg: u8 = if self.stream { 0 } else { (count - i - 1) as u8 };
            let key: usize = self.segments.insert(Segment::new(rest[..size].to_vec(), frg));
            self.send_queue.push_back(&mut self.segments, key);
            rest = &rest[size..];
        }

        trace!("send(): queued {:?} bytes in {:?} new segments", data.len(), count);
        Ok(())
    }

    /// Size of the next message in the receive queue.
    pub fn peek_size(&self) -> Result<usize, Fail> {
        let head: usize = match self.receive_queue.front() {
            Some(key) => key,
            None => return Err(Fail::from_kind(FailKind::WouldBlock, "receive queue is empty")),
        };

        let segment: &Segment = self.segments.get(head);
        if segment.frg == 0 {
            return Ok(segment.len());
        }
        if self.receive_queue.len() < segment.frg as usize + 1 {
            return Err(Fail::from_kind(FailKind::WouldBlock, "message is incomplete"));
        }

        let mut len: usize = 0;
        for (_, segment) in self.receive_queue.iter(&self.segments) {
            len += segment.len();
            if segment.frg == 0 {
                return Ok(len);
            }
        }
        Err(Fail::from_kind(FailKind::WouldBlock, "message is incomplete"))
    }

    /// Moves the next message into `buf` and returns its size.
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Fail> {
        self.do_recv(buf, true)
    }

    /// Copies the next message into `buf` and returns its size, leaving it in the receive queue.
    pub fn peek(&mut self, buf: &mut [u8]) -> Result<usize, Fail> {
        self.do_recv(buf, false)
    }

    fn do_recv(&mut self, buf: &mut [u8], consume: bool) -> Result<usize, Fail> {
        let size: usize = match self.peek_size() {
            Ok(size) => size,
            Err(e) => {
                trace!("recv(): {:?}", e);
                return Err(e);
            },
        };
        if size > buf.len() {
            let cause: String = format!("buffer too small (len={:?}, message={:?})", buf.len(), size);
            debug!("recv(): {}", cause);
            return Err(Fail::from_kind(FailKind::BufferTooSmall, &cause));
        }

        let recover: bool = self.receive_queue.len() >= self.receive_window as usize;

        // Merge fragments.
        let mut offset: usize = 0;
        let mut cursor: Option<usize> = self.receive_queue.front();
        while let Some(key) = cursor {
            cursor = self.segments.next_of(key);

            let segment: &Segment = self.segments.get(key);
            buf[offset..offset + segment.len()].copy_from_slice(&segment.payload);
            offset += segment.len();
            let frg: u8 = segment.frg;
            trace!("recv(): sn={:?}", segment.sn);

            if consume {
                self.receive_queue.unlink(&mut self.segments, key);
                self.segments.remove(key);
            }
            if frg == 0 {
                break;
            }
        }

        self.deliver();

        // Let the peer know that the window reopened.
        if recover && self.receive_queue.len() < self.receive_window as usize {
            self.tell_pending = true;
        }

        Ok(offset)
    }

    /// Number of segments waiting to be sent or acknowledged.
    pub fn waiting_count(&self) -> usize {
        self.send_buffer.len() + self.send_queue.len()
    }

    /// Whether some segment was transmitted as many times as the dead link threshold without being acknowledged.
    pub fn is_link_dead(&self) -> bool {
        self.send_buffer
            .iter(&self.segments)
            .any(|(_, segment)| segment.xmit >= self.dead_link)
    }

    //==================================================================================================================
    // Network Side
    //==================================================================================================================

    /// Processes a datagram received from the peer. Segments are processed in order, and processing stops at the
    /// first bad one; segments before it stay applied.
    pub fn input(&mut self, data: &[u8]) -> Result<(), Fail> {
        trace!("input(): {:?} bytes", data.len());
        if data.len() < KCP_OVERHEAD {
            let cause: String = format!("datagram shorter than a header (len={:?})", data.len());
            warn!("input(): {}", cause);
            return Err(Fail::from_kind(FailKind::MalformedInput, &cause));
        }

        let send_unacked: SeqNumber = self.send_unacked;
        // Highest sequence number acknowledged by this datagram.
        let mut max_ack: Option<SeqNumber> = None;

        let mut rest: &[u8] = data;
        while rest.len() >= KCP_OVERHEAD {
            let conv: u32 = KcpHeader::peek_conversation_id(rest)?;
            if conv != self.conv {
                let cause: String = format!("foreign conversation (expected={:?}, got={:?})", self.conv, conv);
                warn!("input(): {}", cause);
                return Err(Fail::from_kind(FailKind::ForeignConversation, &cause));
            }
            let (header, payload): (KcpHeader, &[u8]) = match KcpHeader::parse(rest) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("input(): dropping malformed segment ({:?})", e);
                    return Err(e);
                },
            };
            rest = &rest[KCP_OVERHEAD + payload.len()..];

            self.remote_window = header.wnd as u32;
            self.parse_una(header.una);
            self.shrink_send_buffer();

            match header.cmd {
                KcpCommand::Ack => {
                    let rtt: i32 = time_diff(self.current, header.ts);
                    if rtt >= 0 {
                        self.rto_calculator.add_sample(rtt as u32, self.interval);
                    }
                    self.parse_ack(header.sn);
                    self.shrink_send_buffer();
                    max_ack = match max_ack {
                        Some(sn) if sn >= header.sn => Some(sn),
                        _ => Some(header.sn),
                    };
                    trace!(
                        "input(): ack sn={:?} rtt={:?} srtt={:?} rttvar={:?} rto={:?}",
                        header.sn,
                        rtt,
                        self.rto_calculator.srtt(),
                        self.rto_calculator.rttvar(),
                        self.rto_calculator.rto()
                    );
                },
                KcpCommand::Push => {
                    trace!("input(): push sn={:?} ts={:?}", header.sn, header.ts);
                    if header.sn < self.receive_next + SeqNumber::from(self.receive_window) {
                        self.acks.push(header.sn, header.ts);
                        if header.sn >= self.receive_next {
                            self.parse_data(Segment::from_received(&header, payload));
                        }
                    }
                },
                KcpCommand::WindowAsk => {
                    debug!("input(): window probe");
                    self.tell_pending = true;
                },
                KcpCommand::WindowTell => {
                    debug!("input(): window tell (wnd={:?})", header.wnd);
                },
            }
        }

        if let Some(sn) = max_ack {
            self.parse_fast_ack(sn);
        }

        if self.send_unacked > send_unacked {
            self.cc.on_ack_received(self.mss as u32, self.remote_window);
        }

        Ok(())
    }

    // Drops every segment in flight that the peer has cumulatively acknowledged.
    fn parse_una(&mut self, una: SeqNumber) {
        while let Some(key) = self.send_buffer.front() {
            if self.segments.get(key).sn >= una {
                break;
            }
            self.send_buffer.unlink(&mut self.segments, key);
            self.segments.remove(key);
        }
    }

    // Drops the segment in flight that the peer has selectively acknowledged.
    fn parse_ack(&mut self, sn: SeqNumber) {
        if sn < self.send_unacked || sn >= self.send_next {
            return;
        }

        let mut cursor: Option<usize> = self.send_buffer.front();
        while let Some(key) = cursor {
            let segment_sn: SeqNumber = self.segments.get(key).sn;
            if sn < segment_sn {
                break;
            }
            if sn == segment_sn {
                self.send_buffer.unlink(&mut self.segments, key);
                self.segments.remove(key);
                break;
            }
            cursor = self.segments.next_of(key);
        }
    }

    // Counts an ACK past each segment in flight older than `sn`.
    fn parse_fast_ack(&mut self, sn: SeqNumber) {
        if sn < self.send_unacked || sn >= self.send_next {
            return;
        }

        let mut cursor: Option<usize> = self.send_buffer.front();
        while let Some(key) = cursor {
            cursor = self.segments.next_of(key);
            let segment: &mut Segment = self.segments.get_mut(key);
            if sn < segment.sn {
                break;
            }
            if sn != segment.sn {
                segment.fast_ack += 1;
            }
        }
    }

    fn shrink_send_buffer(&mut self) {
        self.send_unacked = match self.send_buffer.front() {
            Some(key) => self.segments.get(key).sn,
            None => self.send_next,
        };
    }

    // Files a data segment in the receive buffer, then delivers whatever became contiguous.
    fn parse_data(&mut self, segment: Segment) {
        let sn: SeqNumber = segment.sn;
        if sn >= self.receive_next + SeqNumber::from(self.receive_window) || sn < self.receive_next {
            return;
        }

        // Segments mostly arrive in order, so look for the insertion point from the back.
        let mut anchor: Option<usize> = self.receive_buffer.back();
        let mut duplicate: bool = false;
        while let Some(key) = anchor {
            let existing: SeqNumber = self.segments.get(key).sn;
            if existing == sn {
                duplicate = true;
                break;
            }
            if existing < sn {
                break;
            }
            anchor = self.segments.prev_of(key);
        }

        if duplicate {
            trace!("parse_data(): dropping duplicate (sn={:?})", sn);
        } else {
            let key: usize = self.segments.insert(segment);
            self.receive_buffer.insert_after(&mut self.segments, anchor, key);
        }

        self.deliver();
    }

    // Moves the in-order prefix of the receive buffer to the receive queue.
    fn deliver(&mut self) {
        while let Some(key) = self.receive_buffer.front() {
            if self.segments.get(key).sn != self.receive_next || self.receive_queue.len() >= self.receive_window as usize
            {
                break;
            }
            self.receive_buffer.unlink(&mut self.segments, key);
            self.receive_queue.push_back(&mut self.segments, key);
            self.receive_next = self.receive_next + SeqNumber::from(1);
        }
    }

    //==================================================================================================================
    // Timers
    //==================================================================================================================

    /// Advances the clock to `now` (milliseconds) and flushes when due.
    pub fn update(&mut self, now: u32) {
        self.current = now;

        let slap: i32 = time_diff(now, self.flush_due);
        if slap < -FLUSH_RESYNC || slap >= self.interval as i32 {
            self.flush_due = now.wrapping_add(self.interval);
        } else if slap >= 0 {
            self.flush_due = self.flush_due.wrapping_add(self.interval);
        } else {
            return;
        }

        self.flush();
    }

    /// When update() should be called next, assuming no call to input() or send() happens in between.
    pub fn check(&self, now: u32) -> u32 {
        let tm_flush: i32 = time_diff(self.flush_due, now);
        if tm_flush <= 0 || tm_flush > FLUSH_RESYNC {
            return now;
        }

        let mut tm_packet: i32 = i32::MAX;
        for (_, segment) in self.send_buffer.iter(&self.segments) {
            let diff: i32 = time_diff(segment.resend_ts, now);
            if diff <= 0 {
                return now;
            }
            tm_packet = tm_packet.min(diff);
        }

        let wait: i32 = tm_packet.min(tm_flush).min(self.interval as i32);
        now.wrapping_add(wait as u32)
    }

    // Sends pending ACKs and window probe commands, moves segments from the send queue into flight, and (re)transmits
    // whatever is due.
    fn flush(&mut self) {
        let now: u32 = self.current;
        let conv: u32 = self.conv;
        let mtu: usize = self.mtu;
        let mss: u32 = self.mss as u32;
        let wnd: u16 = self.unused_receive_window();
        let una: SeqNumber = self.receive_next;

        let control: KcpHeader = KcpHeader {
            conv,
            cmd: KcpCommand::Ack,
            frg: 0,
            wnd,
            ts: 0,
            sn: SeqNumber::from(0),
            una,
            len: 0,
        };

        // Acknowledgements.
        if !self.acks.is_empty() {
            trace!("flush(): acknowledging {:?} segments", self.acks.len());
        }
        for i in 0..self.acks.len() {
            if let Some((sn, ts)) = self.acks.get(i) {
                let header: KcpHeader = KcpHeader { sn, ts, ..control };
                Self::write_segment(&mut self.buffer, &mut self.transport, mtu, &header, &[]);
            }
        }
        self.acks.clear();

        // Probe the remote window while it is closed.
        if self.remote_window == 0 {
            if self.probe_wait == 0 {
                self.probe_wait = PROBE_INIT;
                self.probe_due = now.wrapping_add(self.probe_wait);
            } else if time_diff(now, self.probe_due) >= 0 {
                self.probe_wait = (self.probe_wait.max(PROBE_INIT) * 2).min(PROBE_LIMIT);
                self.probe_due = now.wrapping_add(self.probe_wait);
                self.ask_pending = true;
            }
        } else {
            self.probe_due = 0;
            self.probe_wait = 0;
        }

        if self.ask_pending {
            debug!("flush(): asking for the remote window");
            let header: KcpHeader = KcpHeader {
                cmd: KcpCommand::WindowAsk,
                ..control
            };
            Self::write_segment(&mut self.buffer, &mut self.transport, mtu, &header, &[]);
        }
        if self.tell_pending {
            debug!("flush(): telling the local window (wnd={:?})", wnd);
            let header: KcpHeader = KcpHeader {
                cmd: KcpCommand::WindowTell,
                ..control
            };
            Self::write_segment(&mut self.buffer, &mut self.transport, mtu, &header, &[]);
        }
        self.ask_pending = false;
        self.tell_pending = false;

        // Effective window.
        let mut window: u32 = self.send_window.min(self.remote_window);
        if self.congestion_control {
            window = window.min(self.cc.get_cwnd());
        }

        // Move segments from the send queue into flight.
        while self.send_next < self.send_unacked + SeqNumber::from(window) {
            let key: usize = match self.send_queue.pop_front(&mut self.segments) {
                Some(key) => key,
                None => break,
            };
            let segment: &mut Segment = self.segments.get_mut(key);
            segment.cmd = KcpCommand::Push;
            segment.wnd = wnd;
            segment.ts = now;
            segment.sn = self.send_next;
            segment.una = una;
            segment.resend_ts = now;
            segment.rto = self.rto_calculator.rto();
            segment.fast_ack = 0;
            segment.xmit = 0;
            self.send_buffer.push_back(&mut self.segments, key);
            self.send_next = self.send_next + SeqNumber::from(1);
        }

        // (Re)transmit segments in flight.
        let resend: u32 = if self.fast_resend > 0 { self.fast_resend } else { u32::MAX };
        let rx_rto: u32 = self.rto_calculator.rto();
        let rto_slack: u32 = if self.nodelay == 0 { rx_rto >> 3 } else { 0 };
        let mut lost: bool = false;
        let mut change: bool = false;

        let mut cursor: Option<usize> = self.send_buffer.front();
        while let Some(key) = cursor {
            cursor = self.segments.next_of(key);
            let segment: &mut Segment = self.segments.get_mut(key);

            let needsend: bool = if segment.xmit == 0 {
                segment.rto = rx_rto;
                segment.resend_ts = now.wrapping_add(segment.rto).wrapping_add(rto_slack);
                true
            } else if time_diff(now, segment.resend_ts) >= 0 {
                let backoff: u32 = match self.nodelay {
                    0 => segment.rto.max(rx_rto),
                    1 => segment.rto / 2,
                    _ => rx_rto / 2,
                };
                segment.rto = segment.rto.saturating_add(backoff).min(RTO_BACKOFF_LIMIT);
                segment.resend_ts = now.wrapping_add(segment.rto);
                lost = true;
                trace!("flush(): timeout (sn={:?}, rto={:?})", segment.sn, segment.rto);
                true
            } else if segment.fast_ack >= resend && segment.xmit <= FASTACK_LIMIT {
                segment.fast_ack = 0;
                segment.resend_ts = now.wrapping_add(segment.rto);
                change = true;
                trace!("flush(): fast retransmit (sn={:?})", segment.sn);
                true
            } else {
                false
            };

            if needsend {
                segment.xmit += 1;
                segment.ts = now;
                segment.wnd = wnd;
                segment.una = una;
                let header: KcpHeader = segment.header(conv);
                Self::write_segment(&mut self.buffer, &mut self.transport, mtu, &header, &segment.payload);

                if segment.xmit == self.dead_link {
                    warn!("flush(): link looks dead (sn={:?}, xmit={:?})", segment.sn, segment.xmit);
                }
            }
        }

        if !self.buffer.is_empty() {
            trace!("flush(): output {:?} bytes", self.buffer.len());
            self.transport.transmit(&self.buffer);
            self.buffer.clear();
        }

        // Congestion window.
        if lost {
            self.cc.on_rto(window, mss);
        } else if change {
            let inflight: u32 = (self.send_next - self.send_unacked).into();
            self.cc.on_fast_retransmit(inflight, resend, mss);
        }
        self.cc.ensure_open(mss);
        if lost || change {
            debug!(
                "flush(): congestion (lost={:?}, cwnd={:?}, ssthresh={:?}, incr={:?})",
                lost,
                self.cc.get_cwnd(),
                self.cc.get_ssthresh(),
                self.cc.get_incr()
            );
        }
    }

    // Appends a segment to the coalescing buffer, handing the buffer to the transport first if the segment would not
    // fit in the same datagram.
    fn write_segment(buffer: &mut Vec<u8>, transport: &mut T, mtu: usize, header: &KcpHeader, payload: &[u8]) {
        if !buffer.is_empty() && buffer.len() + KCP_OVERHEAD + payload.len() > mtu {
            trace!("flush(): output {:?} bytes", buffer.len());
            transport.transmit(buffer);
            buffer.clear();
        }

        let offset: usize = buffer.len();
        buffer.resize(offset + KCP_OVERHEAD, 0);
        header.serialize(&mut buffer[offset..]);
        buffer.extend_from_slice(payload);
    }

    // Free room in the receive queue, as advertised to the peer.
    fn unused_receive_window(&self) -> u16 {
        let unused: u32 = self.receive_window.saturating_sub(self.receive_queue.len() as u32);
        unused.min(u16::MAX as u32) as u16
    }

    //==================================================================================================================
    // Configuration
    //==================================================================================================================

    /// Changes the MTU. Fails if a segment that is queued or in flight would not fit in the new one.
    pub fn set_mtu(&mut self, mtu: usize) -> Result<(), Fail> {
        if mtu <= KCP_OVERHEAD || mtu > MAX_MTU {
            let cause: String = format!("invalid mtu (mtu={:?})", mtu);
            error!("set_mtu(): {}", cause);
            return Err(Fail::from_kind(FailKind::InvalidArgument, &cause));
        }

        let mss: usize = mtu - KCP_OVERHEAD;
        let oversized: Option<usize> = self
            .send_queue
            .iter(&self.segments)
            .chain(self.send_buffer.iter(&self.segments))
            .map(|(_, segment)| segment.len())
            .find(|len| *len > mss);
        if let Some(len) = oversized {
            let cause: String = format!("pending segment does not fit (mtu={:?}, payload={:?})", mtu, len);
            error!("set_mtu(): {}", cause);
            return Err(Fail::from_kind(FailKind::InvalidArgument, &cause));
        }

        self.mtu = mtu;
        self.mss = mss;
        self.buffer.reserve(mtu.saturating_sub(self.buffer.len()));
        Ok(())
    }

    /// Sets the window sizes, in segments. Zero leaves a window unchanged, and the receive window never goes below the
    /// largest message size.
    pub fn set_window_size(&mut self, send_window: u32, receive_window: u32) {
        if send_window > 0 {
            self.send_window = send_window;
        }
        if receive_window > 0 {
            self.receive_window = receive_window.max(WND_RCV);
        }
    }

    /// Tunes latency. `None` leaves a knob unchanged.
    ///
    /// - `level`: 0 disables no-delay mode, 1 enables it and 2 also keeps retransmission backoff close to the smoothed
    ///   RTO. Enabling no-delay mode lowers the RTO floor.
    /// - `interval`: update interval, in milliseconds.
    /// - `resend`: fast resend threshold, 0 disables fast resend.
    /// - `no_congestion_control`: whether to ignore the congestion window.
    ///
    /// The fastest setting is `nodelay(Some(1), Some(20), Some(2), Some(true))`.
    pub fn nodelay(
        &mut self,
        level: Option<u8>,
        interval: Option<u32>,
        resend: Option<u32>,
        no_congestion_control: Option<bool>,
    ) -> Result<(), Fail> {
        if let Some(level) = level {
            if level > 2 {
                let cause: String = format!("invalid no-delay level (level={:?})", level);
                error!("nodelay(): {}", cause);
                return Err(Fail::from_kind(FailKind::InvalidArgument, &cause));
            }
            self.nodelay = level;
            self.rto_calculator
                .set_min_rto(if level != 0 { RTO_NODELAY } else { RTO_MIN });
        }
        if let Some(interval) = interval {
            self.set_interval(interval);
        }
        if let Some(resend) = resend {
            self.set_fast_resend(resend);
        }
        if let Some(no_congestion_control) = no_congestion_control {
            self.set_congestion_control(!no_congestion_control);
        }
        Ok(())
    }

    /// Sets the update interval, in milliseconds.
    pub fn set_interval(&mut self, interval: u32) {
        self.interval = interval.clamp(INTERVAL_MIN, INTERVAL_MAX);
    }

    pub fn set_fast_resend(&mut self, resend: u32) {
        self.fast_resend = resend;
    }

    pub fn set_congestion_control(&mut self, enabled: bool) {
        self.congestion_control = enabled;
    }

    /// Sets the RTO floor, in milliseconds.
    pub fn set_min_rto(&mut self, min_rto: u32) {
        self.rto_calculator.set_min_rto(min_rto);
    }

    pub fn set_dead_link(&mut self, dead_link: u32) -> Result<(), Fail> {
        if dead_link == 0 {
            let cause: &str = "dead link threshold must be positive";
            error!("set_dead_link(): {}", cause);
            return Err(Fail::from_kind(FailKind::InvalidArgument, cause));
        }
        self.dead_link = dead_link;
        Ok(())
    }

    //==================================================================================================================
    // Getters
    //==================================================================================================================

    pub fn conversation_id(&self) -> u32 {
        self.conv
    }

    pub fn mtu(&self) -> usize {
        self.mtu
    }

    pub fn mss(&self) -> usize {
        self.mss
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Current retransmission timeout, in milliseconds.
    pub fn rto(&self) -> u32 {
        self.rto_calculator.rto()
    }

    /// Smoothed round-trip time, in milliseconds.
    pub fn srtt(&self) -> u32 {
        self.rto_calculator.srtt()
    }

    pub fn cwnd(&self) -> u32 {
        self.cc.get_cwnd()
    }

    pub fn ssthresh(&self) -> u32 {
        self.cc.get_ssthresh()
    }

    pub fn remote_window(&self) -> u32 {
        self.remote_window
    }

    pub fn send_unacked(&self) -> SeqNumber {
        self.send_unacked
    }

    pub fn send_next(&self) -> SeqNumber {
        self.send_next
    }

    pub fn receive_next(&self) -> SeqNumber {
        self.receive_next
    }

    pub fn get_transport(&self) -> &T {
        &self.transport
    }

    pub fn get_transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

//======================================================================================================================
// Unit Tests
//======================================================================================================================
