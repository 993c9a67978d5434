//! Linux `struct tcp_info` layout
//!
//! The Linux structure has grown with almost every kernel release, but it
//! only ever grows at the end. This layout covers the fixed prefix present
//! on every kernel since 2.6 (up to and including `tcpi_total_retrans`),
//! which is 104 bytes on every Linux architecture.
//!
//! # Memory Layout
//!
//! ```text
//! offset  size  field
//!      0     1  tcpi_state
//!      1     1  tcpi_ca_state
//!      2     1  tcpi_retransmits
//!      3     1  tcpi_probes
//!      4     1  tcpi_backoff
//!      5     1  tcpi_options            TCPI_OPT_* flags
//!      6     1  tcpi_snd_wscale : 4     low nibble  (peer scale)
//!               tcpi_rcv_wscale : 4     high nibble (local scale)
//!      7     1  tcpi_delivery_rate_app_limited, tcpi_fastopen_client_fail
//!      8     4  tcpi_rto                μs
//!     12     4  tcpi_ato                μs
//!     16     4  tcpi_snd_mss
//!     20     4  tcpi_rcv_mss
//!     24    20  tcpi_unacked .. tcpi_fackets
//!     44    16  tcpi_last_data_sent .. tcpi_last_ack_recv   ms
//!     60    44  tcpi_pmtu .. tcpi_total_retrans
//! ```
//!
//! The offsets below are taken from a `#[repr(C)]` mirror of the kernel
//! structure with `offset_of!`, so the table and the mirror cannot drift.
//! The mirror is never used to reinterpret a buffer.

use std::mem::{offset_of, size_of};

use super::{ByteField, FieldTable, NibblePair, OptionBits, TcpInfoLayout, WordField};

/// `TCPI_OPT_TIMESTAMPS` from `<linux/tcp.h>`
pub const TCPI_OPT_TIMESTAMPS: u8 = 0x01;
/// `TCPI_OPT_SACK`
pub const TCPI_OPT_SACK: u8 = 0x02;
/// `TCPI_OPT_WSCALE`
pub const TCPI_OPT_WSCALE: u8 = 0x04;
/// `TCPI_OPT_ECN`
pub const TCPI_OPT_ECN: u8 = 0x08;

/// Field-for-field mirror of the kernel's `struct tcp_info` prefix
#[repr(C)]
#[allow(dead_code)]
struct KernelTcpInfo {
    // === State and options (8 bytes) ===
    tcpi_state: u8,
    tcpi_ca_state: u8,
    tcpi_retransmits: u8,
    tcpi_probes: u8,
    tcpi_backoff: u8,
    tcpi_options: u8,
    tcpi_wscale: u8, // snd_wscale:4, rcv_wscale:4
    tcpi_app_limited: u8,

    // === Timeouts (8 bytes) ===
    tcpi_rto: u32,
    tcpi_ato: u32,

    // === MSS (8 bytes) ===
    tcpi_snd_mss: u32,
    tcpi_rcv_mss: u32,

    // === Packet counts (20 bytes) ===
    tcpi_unacked: u32,
    tcpi_sacked: u32,
    tcpi_lost: u32,
    tcpi_retrans: u32,
    tcpi_fackets: u32,

    // === Times (16 bytes) ===
    tcpi_last_data_sent: u32,
    tcpi_last_ack_sent: u32, // not reported by the kernel
    tcpi_last_data_recv: u32,
    tcpi_last_ack_recv: u32,

    // === Metrics (44 bytes) ===
    tcpi_pmtu: u32,
    tcpi_rcv_ssthresh: u32,
    tcpi_rtt: u32,
    tcpi_rttvar: u32,
    tcpi_snd_ssthresh: u32,
    tcpi_snd_cwnd: u32,
    tcpi_advmss: u32,
    tcpi_reordering: u32,
    tcpi_rcv_rtt: u32,
    tcpi_rcv_space: u32,
    tcpi_total_retrans: u32,
}

macro_rules! byte_field {
    ($name:ident) => {
        ByteField {
            name: stringify!($name),
            offset: offset_of!(KernelTcpInfo, $name),
        }
    };
}

macro_rules! word_field {
    ($name:ident) => {
        WordField {
            name: stringify!($name),
            offset: offset_of!(KernelTcpInfo, $name),
        }
    };
}

/// Linux `tcp_info`, fixed 104-byte prefix
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxLayout;

impl TcpInfoLayout for LinuxLayout {
    const NAME: &'static str = "linux";

    const SIZE: usize = size_of::<KernelTcpInfo>();

    const FIELDS: FieldTable = FieldTable {
        state: byte_field!(tcpi_state),
        ca_state: byte_field!(tcpi_ca_state),
        options: byte_field!(tcpi_options),
        option_bits: OptionBits {
            timestamps: TCPI_OPT_TIMESTAMPS,
            window_scale: TCPI_OPT_WSCALE,
        },
        wscale: NibblePair {
            byte: byte_field!(tcpi_wscale),
            local_shift: 4,
            peer_shift: 0,
        },

        rto: word_field!(tcpi_rto),
        ato: word_field!(tcpi_ato),

        snd_mss: word_field!(tcpi_snd_mss),
        rcv_mss: word_field!(tcpi_rcv_mss),

        unacked: word_field!(tcpi_unacked),
        sacked: word_field!(tcpi_sacked),
        lost: word_field!(tcpi_lost),
        retrans: word_field!(tcpi_retrans),
        fackets: word_field!(tcpi_fackets),

        last_data_sent: word_field!(tcpi_last_data_sent),
        last_data_recv: word_field!(tcpi_last_data_recv),
        last_ack_recv: word_field!(tcpi_last_ack_recv),

        rcv_ssthresh: word_field!(tcpi_rcv_ssthresh),
        rtt: word_field!(tcpi_rtt),
        rttvar: word_field!(tcpi_rttvar),
        snd_ssthresh: word_field!(tcpi_snd_ssthresh),
        snd_cwnd: word_field!(tcpi_snd_cwnd),
        advmss: word_field!(tcpi_advmss),
        rcv_space: word_field!(tcpi_rcv_space),
    };
}
