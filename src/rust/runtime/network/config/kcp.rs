// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use crate::runtime::{
    fail::{
        Fail,
        FailKind,
    },
    network::consts::{
        DEAD_LINK,
        DEFAULT_MTU,
        INTERVAL,
        INTERVAL_MAX,
        INTERVAL_MIN,
        KCP_OVERHEAD,
        MAX_MTU,
        RTO_MIN,
        RTO_NODELAY,
        WND_RCV,
        WND_SND,
    },
};

//==============================================================================
// Structures
//==============================================================================

/// KCP Configuration Descriptor
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KcpConfig {
    /// Maximum Transmission Unit of the Underlying Transport
    mtu: usize,
    /// Send Window Size (segments)
    send_window: u32,
    /// Receive Window Size (segments)
    receive_window: u32,
    /// No-Delay Level (0 to 2)
    nodelay: u8,
    /// Update Interval (milliseconds)
    interval: u32,
    /// Fast Resend Threshold (0 disables fast resend)
    fast_resend: u32,
    /// Enable Congestion Control?
    congestion_control: bool,
    /// Minimum Retransmission Timeout (milliseconds)
    min_rto: u32,
    /// Streaming Mode?
    stream: bool,
    /// Retransmissions After Which the Link is Considered Dead
    dead_link: u32,
}

//==============================================================================
// Associate Functions
//==============================================================================

/// Associate Functions for KCP Configuration Descriptor
impl KcpConfig {
    /// Creates a KCP Configuration Descriptor. Parameters left as `None` keep their default value.
    pub fn new(
        mtu: Option<usize>,
        send_window: Option<u32>,
        receive_window: Option<u32>,
        nodelay: Option<u8>,
        interval: Option<u32>,
        fast_resend: Option<u32>,
        congestion_control: Option<bool>,
        min_rto: Option<u32>,
        stream: Option<bool>,
        dead_link: Option<u32>,
    ) -> Result<Self, Fail> {
        let mut config: KcpConfig = Self::default();

        if let Some(value) = mtu {
            config = config.set_mtu(value)?;
        }
        if let Some(value) = send_window {
            config = config.set_send_window(value)?;
        }
        if let Some(value) = receive_window {
            config = config.set_receive_window(value)?;
        }
        if let Some(value) = nodelay {
            config = config.set_nodelay(value)?;
        }
        if let Some(value) = interval {
            config = config.set_interval(value);
        }
        if let Some(value) = fast_resend {
            config.fast_resend = value;
        }
        if let Some(value) = congestion_control {
            config.congestion_control = value;
        }
        // An explicit floor wins over the one implied by the no-delay level.
        if let Some(value) = min_rto {
            config.min_rto = value;
        }
        if let Some(value) = stream {
            config.stream = value;
        }
        if let Some(value) = dead_link {
            config = config.set_dead_link(value)?;
        }

        Ok(config)
    }

    /// Gets the MTU in the target [KcpConfig].
    pub fn get_mtu(&self) -> usize {
        self.mtu
    }

    /// Gets the send window size in the target [KcpConfig].
    pub fn get_send_window(&self) -> u32 {
        self.send_window
    }

    /// Gets the receive window size in the target [KcpConfig].
    pub fn get_receive_window(&self) -> u32 {
        self.receive_window
    }

    /// Gets the no-delay level in the target [KcpConfig].
    pub fn get_nodelay(&self) -> u8 {
        self.nodelay
    }

    /// Gets the update interval in the target [KcpConfig].
    pub fn get_interval(&self) -> u32 {
        self.interval
    }

    /// Gets the fast resend threshold in the target [KcpConfig].
    pub fn get_fast_resend(&self) -> u32 {
        self.fast_resend
    }

    /// Gets whether congestion control is enabled in the target [KcpConfig].
    pub fn get_congestion_control(&self) -> bool {
        self.congestion_control
    }

    /// Gets the minimum retransmission timeout in the target [KcpConfig].
    pub fn get_min_rto(&self) -> u32 {
        self.min_rto
    }

    /// Gets whether streaming mode is enabled in the target [KcpConfig].
    pub fn get_stream(&self) -> bool {
        self.stream
    }

    /// Gets the dead link threshold in the target [KcpConfig].
    pub fn get_dead_link(&self) -> u32 {
        self.dead_link
    }

    /// Sets the MTU in the target [KcpConfig].
    fn set_mtu(mut self, value: usize) -> Result<Self, Fail> {
        if value <= KCP_OVERHEAD || value > MAX_MTU {
            let cause: String = format!("mtu out of range (mtu={:?})", value);
            error!("set_mtu(): {}", cause);
            return Err(Fail::from_kind(FailKind::InvalidArgument, &cause));
        }
        self.mtu = value;
        Ok(self)
    }

    /// Sets the send window size in the target [KcpConfig].
    fn set_send_window(mut self, value: u32) -> Result<Self, Fail> {
        if value == 0 {
            let cause: &str = "send window must not be empty";
            error!("set_send_window(): {}", cause);
            return Err(Fail::from_kind(FailKind::InvalidArgument, cause));
        }
        self.send_window = value;
        Ok(self)
    }

    /// Sets the receive window size in the target [KcpConfig]. Windows smaller than the fragment ceiling are raised
    /// to it.
    fn set_receive_window(mut self, value: u32) -> Result<Self, Fail> {
        if value == 0 {
            let cause: &str = "receive window must not be empty";
            error!("set_receive_window(): {}", cause);
            return Err(Fail::from_kind(FailKind::InvalidArgument, cause));
        }
        self.receive_window = value.max(WND_RCV);
        Ok(self)
    }

    /// Sets the no-delay level in the target [KcpConfig], along with the RTO floor that goes with it.
    fn set_nodelay(mut self, value: u8) -> Result<Self, Fail> {
        if value > 2 {
            let cause: String = format!("invalid no-delay level (nodelay={:?})", value);
            error!("set_nodelay(): {}", cause);
            return Err(Fail::from_kind(FailKind::InvalidArgument, &cause));
        }
        self.nodelay = value;
        self.min_rto = if value != 0 { RTO_NODELAY } else { RTO_MIN };
        Ok(self)
    }

    /// Sets the update interval in the target [KcpConfig].
    fn set_interval(mut self, value: u32) -> Self {
        self.interval = value.clamp(INTERVAL_MIN, INTERVAL_MAX);
        self
    }

    /// Sets the dead link threshold in the target [KcpConfig].
    fn set_dead_link(mut self, value: u32) -> Result<Self, Fail> {
        if value == 0 {
            let cause: &str = "dead link threshold must be positive";
            error!("set_dead_link(): {}", cause);
            return Err(Fail::from_kind(FailKind::InvalidArgument, cause));
        }
        self.dead_link = value;
        Ok(self)
    }
}

//==============================================================================
// Trait Implementations
//==============================================================================

/// Default Trait Implementation for KCP Configuration Descriptor
impl Default for KcpConfig {
    /// Creates a KCP Configuration Descriptor with the default values.
    fn default() -> Self {
        KcpConfig {
            mtu: DEFAULT_MTU,
            send_window: WND_SND,
            receive_window: WND_RCV,
            nodelay: 0,
            interval: INTERVAL,
            fast_resend: 0,
            congestion_control: true,
            min_rto: RTO_MIN,
            stream: false,
            dead_link: DEAD_LINK,
        }
    }
}

//==============================================================================
// Unit Tests
//==============================================================================
