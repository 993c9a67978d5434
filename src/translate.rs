//! tcp_info decoding
//!
//! Turns one raw `tcp_info` buffer into an [`Info`] value.
//!
//! # Strategy
//!
//! 1. Check the buffer is exactly the layout's size
//! 2. Map `tcpi_state` through the 12-entry state table (checked)
//! 3. Expand `tcpi_options` + the window-scale nibbles into option lists
//! 4. Copy MSS values
//! 5. Convert the three "last event" times from milliseconds
//! 6. Convert RTO/ATO/RTT/RTTVAR from microseconds, copy windows
//! 7. Copy the segment counters
//!
//! Only two things can fail: the length check and the state lookup. Every
//! other field is a plain unsigned integer and is accepted as-is.
//!
//! # Units
//!
//! Conversions are `Duration::from_millis` / `Duration::from_micros` on the
//! widened `u64` value, so they are exact for every `u32` input.

use std::time::Duration;

use crate::error::{Malformed, TcpInfoError};
use crate::layout::{DefaultLayout, FieldTable, RawTcpInfo, TcpInfoLayout};
use crate::model::{
    CaState, CongestionControl, ConnectionState, Info, MaxSegSize, NegotiatedOption, SysInfo,
};

/// Decode a tcp_info buffer using the build's default layout
///
/// # Errors
///
/// `TcpInfoError::MalformedInput` if the buffer is not exactly
/// `DefaultLayout::SIZE` bytes or the connection state is out of range.
///
/// # Example
///
/// ```
/// use tcpinfo::{parse_tcp_info, ConnectionState, DefaultLayout, TcpInfoLayout};
///
/// let mut raw = vec![0u8; DefaultLayout::SIZE];
/// raw[0] = 1; // tcpi_state = TCP_ESTABLISHED
///
/// let info = parse_tcp_info(&raw)?;
/// assert_eq!(info.state, ConnectionState::Established);
/// assert!(info.options.is_empty());
/// # Ok::<(), tcpinfo::TcpInfoError>(())
/// ```
pub fn parse_tcp_info(data: &[u8]) -> Result<Info, TcpInfoError> {
    parse_tcp_info_with::<DefaultLayout>(data)
}

/// Decode a tcp_info buffer using layout `L`
pub fn parse_tcp_info_with<L: TcpInfoLayout>(data: &[u8]) -> Result<Info, TcpInfoError> {
    Ok(decode(RawTcpInfo::new::<L>(data)?, &L::FIELDS)?)
}

fn decode(raw: RawTcpInfo<'_>, fields: &FieldTable) -> Result<Info, Malformed> {
    // === STEP 1: Connection state ===
    let state_index = raw.byte(fields.state)?;
    let state =
        ConnectionState::from_index(state_index).ok_or(Malformed::StateOutOfRange(state_index))?;

    // === STEP 2: Negotiated options ===
    let (options, peer_options) = decode_options(&raw, fields)?;

    // === STEPS 3-6: Plain fields ===
    let cc = CongestionControl {
        rto: micros(raw.word(fields.rto)?),
        ato: micros(raw.word(fields.ato)?),
        rtt: micros(raw.word(fields.rtt)?),
        rtt_var: micros(raw.word(fields.rttvar)?),
        sender_ss_threshold: raw.word(fields.snd_ssthresh)?,
        receiver_ss_threshold: raw.word(fields.rcv_ssthresh)?,
        sender_window: raw.word(fields.snd_cwnd)?,
    };

    let sys_info = SysInfo {
        advertised_mss: MaxSegSize(raw.word(fields.advmss)?),
        receiver_window: raw.word(fields.rcv_space)?,
        ca_state: CaState(raw.byte(fields.ca_state)?),
        unacked_segs: raw.word(fields.unacked)?,
        sacked_segs: raw.word(fields.sacked)?,
        lost_segs: raw.word(fields.lost)?,
        retrans_segs: raw.word(fields.retrans)?,
        forward_ack_segs: raw.word(fields.fackets)?,
    };

    Ok(Info {
        state,
        options,
        peer_options,
        sender_mss: MaxSegSize(raw.word(fields.snd_mss)?),
        receiver_mss: MaxSegSize(raw.word(fields.rcv_mss)?),
        last_data_sent: millis(raw.word(fields.last_data_sent)?),
        last_data_received: millis(raw.word(fields.last_data_recv)?),
        last_ack_received: millis(raw.word(fields.last_ack_recv)?),
        cc,
        sys_info,
    })
}

/// Builds the local and peer option lists
///
/// Order is fixed: window scale first, then timestamps. The kernel has a
/// single timestamps bit, so it lands in both lists.
fn decode_options(
    raw: &RawTcpInfo<'_>,
    fields: &FieldTable,
) -> Result<(Vec<NegotiatedOption>, Vec<NegotiatedOption>), Malformed> {
    let flags = raw.byte(fields.options)?;
    let bits = fields.option_bits;

    let mut local = Vec::new();
    let mut peer = Vec::new();

    if flags & bits.window_scale != 0 {
        let (local_shift, peer_shift) = raw.nibbles(fields.wscale)?;
        local.push(NegotiatedOption::WindowScale(local_shift));
        peer.push(NegotiatedOption::WindowScale(peer_shift));
    }

    if flags & bits.timestamps != 0 {
        local.push(NegotiatedOption::Timestamps(true));
        peer.push(NegotiatedOption::Timestamps(true));
    }

    Ok((local, peer))
}

fn millis(raw: u32) -> Duration {
    Duration::from_millis(u64::from(raw))
}

fn micros(raw: u32) -> Duration {
    Duration::from_micros(u64::from(raw))
}
