//! Decoded tcp_info data model
//!
//! These types are what callers get back from the decoder. They carry
//! semantic units instead of the kernel's raw integers:
//!
//! - times are `std::time::Duration` (the kernel mixes ms and μs)
//! - the connection state is a named enum instead of an index
//! - negotiated options are a list of typed values instead of a flag byte
//!
//! Every value is built fresh by one decode call and never mutated
//! afterwards. Nothing here refers back to the raw buffer.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ============================================================================
// CONNECTION STATE
// ============================================================================

/// TCP connection state as reported in `tcpi_state`
///
/// === ORDER MATTERS ===
/// The kernel stores the state as a small integer that is a direct index
/// into this list. `Unknown` (0) is never produced by a live Linux socket
/// but is part of the index space.
///
/// ```
/// use tcpinfo::ConnectionState;
///
/// assert_eq!(ConnectionState::from_index(1), Some(ConnectionState::Established));
/// assert_eq!(ConnectionState::from_index(12), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    Unknown,     // 0
    Established, // 1: Active connection, data flowing
    SynSent,     // 2: Client sent connection request
    SynReceived, // 3: Server received connection request
    FinWait1,    // 4: Closing connection (stage 1)
    FinWait2,    // 5: Closing connection (stage 2)
    TimeWait,    // 6: Waiting for network to clear old packets
    Closed,      // 7
    CloseWait,   // 8: Remote side closed, waiting for local close
    LastAck,     // 9: Waiting for final acknowledgment
    Listen,      // 10
    Closing,     // 11: Both sides closing simultaneously
}

impl ConnectionState {
    /// All states in raw-index order
    pub const ALL: [ConnectionState; 12] = [
        ConnectionState::Unknown,
        ConnectionState::Established,
        ConnectionState::SynSent,
        ConnectionState::SynReceived,
        ConnectionState::FinWait1,
        ConnectionState::FinWait2,
        ConnectionState::TimeWait,
        ConnectionState::Closed,
        ConnectionState::CloseWait,
        ConnectionState::LastAck,
        ConnectionState::Listen,
        ConnectionState::Closing,
    ];

    /// Checked lookup of a raw `tcpi_state` value
    ///
    /// Returns `None` for anything outside `0..=11`. No wrapping, no clamping.
    pub fn from_index(raw: u8) -> Option<Self> {
        Self::ALL.get(usize::from(raw)).copied()
    }

    /// Raw index of this state
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            ConnectionState::Unknown => "Unknown",
            ConnectionState::Established => "Established",
            ConnectionState::SynSent => "SynSent",
            ConnectionState::SynReceived => "SynReceived",
            ConnectionState::FinWait1 => "FinWait1",
            ConnectionState::FinWait2 => "FinWait2",
            ConnectionState::TimeWait => "TimeWait",
            ConnectionState::Closed => "Closed",
            ConnectionState::CloseWait => "CloseWait",
            ConnectionState::LastAck => "LastAck",
            ConnectionState::Listen => "Listen",
            ConnectionState::Closing => "Closing",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// NEGOTIATED OPTIONS
// ============================================================================

/// Kind of a negotiated TCP option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionKind {
    WindowScale,
    Timestamps,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKind::WindowScale => f.write_str("window-scale"),
            OptionKind::Timestamps => f.write_str("timestamps"),
        }
    }
}

/// A TCP option negotiated on the connection
///
/// `Info::options` holds the local side's view and `Info::peer_options`
/// the peer's. Both lists are ordered: window scale first, then timestamps.
/// An option that was not negotiated is simply absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NegotiatedOption {
    /// Window scale shift count (0-15)
    WindowScale(u8),
    /// Timestamps option (RFC 7323); the kernel reports it for both sides at once
    Timestamps(bool),
}

impl NegotiatedOption {
    pub fn kind(&self) -> OptionKind {
        match self {
            NegotiatedOption::WindowScale(_) => OptionKind::WindowScale,
            NegotiatedOption::Timestamps(_) => OptionKind::Timestamps,
        }
    }
}

impl fmt::Display for NegotiatedOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiatedOption::WindowScale(shift) => write!(f, "{}={}", self.kind(), shift),
            NegotiatedOption::Timestamps(present) => write!(f, "{}={}", self.kind(), present),
        }
    }
}

// ============================================================================
// SMALL NEWTYPES
// ============================================================================

/// Maximum segment size in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaxSegSize(pub u32);

impl fmt::Display for MaxSegSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Congestion-avoidance state code (`tcpi_ca_state`)
///
/// Kept as the raw kernel code. The set of states differs between kernel
/// versions and congestion modules, so no closed enum is imposed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaState(pub u8);

impl CaState {
    pub fn code(self) -> u8 {
        self.0
    }
}

impl fmt::Display for CaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// AGGREGATES
// ============================================================================

/// Congestion control timers and windows
///
/// === UNITS ===
/// - `rto`, `ato`, `rtt`, `rtt_var`: kernel reports microseconds
/// - thresholds and window: segment counts, copied as-is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CongestionControl {
    pub rto: Duration,              // Retransmission timeout
    pub ato: Duration,              // Delayed ACK timeout
    pub rtt: Duration,              // Smoothed round-trip time
    pub rtt_var: Duration,          // Round-trip time variance
    pub sender_ss_threshold: u32,   // tcpi_snd_ssthresh
    pub receiver_ss_threshold: u32, // tcpi_rcv_ssthresh
    pub sender_window: u32,         // tcpi_snd_cwnd (segments)
}

/// Kernel bookkeeping counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysInfo {
    pub advertised_mss: MaxSegSize, // tcpi_advmss
    pub receiver_window: u32,       // tcpi_rcv_space
    pub ca_state: CaState,
    pub unacked_segs: u32,
    pub sacked_segs: u32,
    pub lost_segs: u32,
    pub retrans_segs: u32,
    pub forward_ack_segs: u32, // tcpi_fackets
}

/// Decoded diagnostic state of one TCP connection
///
/// Produced by [`crate::parse_tcp_info`] or [`crate::fetch_info`].
///
/// === TIMES ===
/// `last_data_sent`, `last_data_received` and `last_ack_received` are
/// elapsed times since the event, reported by the kernel in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    pub state: ConnectionState,
    pub options: Vec<NegotiatedOption>,      // Local side
    pub peer_options: Vec<NegotiatedOption>, // Remote side
    pub sender_mss: MaxSegSize,
    pub receiver_mss: MaxSegSize,
    pub last_data_sent: Duration,
    pub last_data_received: Duration,
    pub last_ack_received: Duration,
    pub cc: CongestionControl,
    pub sys_info: SysInfo,
}

impl Info {
    /// Local window scale shift, if negotiated
    pub fn window_scale(&self) -> Option<u8> {
        find_window_scale(&self.options)
    }

    /// Peer window scale shift, if negotiated
    pub fn peer_window_scale(&self) -> Option<u8> {
        find_window_scale(&self.peer_options)
    }

    pub fn has_timestamps(&self) -> bool {
        self.options
            .iter()
            .any(|opt| matches!(opt, NegotiatedOption::Timestamps(true)))
    }
}

fn find_window_scale(options: &[NegotiatedOption]) -> Option<u8> {
    options.iter().find_map(|opt| match opt {
        NegotiatedOption::WindowScale(shift) => Some(*shift),
        NegotiatedOption::Timestamps(_) => None,
    })
}

fn write_options(f: &mut fmt::Formatter<'_>, options: &[NegotiatedOption]) -> fmt::Result {
    if options.is_empty() {
        return f.write_str("-");
    }
    for (i, opt) in options.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{opt}")?;
    }
    Ok(())
}

impl fmt::Display for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "state:              {}", self.state)?;
        f.write_str("options:            ")?;
        write_options(f, &self.options)?;
        f.write_str("\npeer options:       ")?;
        write_options(f, &self.peer_options)?;
        writeln!(f)?;
        writeln!(
            f,
            "mss:                snd {} rcv {} adv {}",
            self.sender_mss, self.receiver_mss, self.sys_info.advertised_mss
        )?;
        writeln!(
            f,
            "last:               data sent {:?} data recv {:?} ack recv {:?}",
            self.last_data_sent, self.last_data_received, self.last_ack_received
        )?;
        writeln!(
            f,
            "timers:             rto {:?} ato {:?} rtt {:?}/{:?}",
            self.cc.rto, self.cc.ato, self.cc.rtt, self.cc.rtt_var
        )?;
        writeln!(
            f,
            "windows:            cwnd {} ssthresh snd {} rcv {} rcv_space {}",
            self.cc.sender_window,
            self.cc.sender_ss_threshold,
            self.cc.receiver_ss_threshold,
            self.sys_info.receiver_window
        )?;
        write!(
            f,
            "segments:           ca_state {} unacked {} sacked {} lost {} retrans {} fackets {}",
            self.sys_info.ca_state,
            self.sys_info.unacked_segs,
            self.sys_info.sacked_segs,
            self.sys_info.lost_segs,
            self.sys_info.retrans_segs,
            self.sys_info.forward_ack_segs
        )
    }
}
