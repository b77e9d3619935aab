//! Protocol Constants
//!
//! Fixed values for the FSK telemetry protocol: symbol timing, the preamble
//! pattern, CRC parameters, the SDFT twiddle constants, and the 51-channel
//! hop table with its fixed hop-pattern permutation.

/// Bits per second on the air.
pub const BIT_RATE: u32 = 19_200;

/// Samples per symbol.
pub const SYMBOL_LENGTH: usize = 14;

/// Derived sample rate: `BIT_RATE * SYMBOL_LENGTH`.
pub const SAMPLE_RATE: u32 = BIT_RATE * SYMBOL_LENGTH as u32;

/// Sliding-DFT window length (also the symbol length; the two happen to
/// coincide for this protocol but are conceptually distinct).
pub const SDFT_N: usize = 14;

/// Processing block size in samples. Fixed per the protocol's framing.
pub const BLOCK_SIZE: usize = 512;

/// Preamble, one ASCII bit per symbol.
pub const PREAMBLE: &str = "1100101110001001";

/// Number of preamble symbols (`PREAMBLE.len()`).
pub const PREAMBLE_SYMBOLS: usize = 16;

/// Total symbols in a packet, header through CRC trailer.
pub const PACKET_SYMBOLS: usize = 80;

/// Payload bytes following the 2-byte header (includes the 2-byte CRC
/// trailer).
pub const PAYLOAD_LEN: usize = 8;

/// Header width in bytes: the CRC-excluded prefix of a packet's `PACKET_SYMBOLS`
/// bits, derived as `(PACKET_SYMBOLS / 8) - PAYLOAD_LEN`.
pub const HEADER_LEN: usize = PACKET_SYMBOLS / 8 - PAYLOAD_LEN;

/// CRC-16/CCITT parameters.
pub mod crc {
    pub const POLY: u16 = 0x1021;
    pub const INIT: u16 = 0x0000;
    pub const XOROUT: u16 = 0x0000;
}

/// SDFT twiddle-factor real/imaginary components, exact `f64` constants as
/// specified. `C3` is the bin-10 coefficient, `C4` the bin-11 coefficient.
pub mod sdft {
    pub const KP222520933: f64 = 0.222_520_933_956_314_40;
    pub const KP974927912: f64 = 0.974_927_912_181_823_61;
    #[allow(dead_code)]
    pub const KP623489801: f64 = 0.623_489_801_858_733_53;
    #[allow(dead_code)]
    pub const KP781831482: f64 = 0.781_831_482_468_029_81;
    #[allow(dead_code)]
    pub const KP900968867: f64 = 0.900_968_867_902_419_13;
    #[allow(dead_code)]
    pub const KP433883739: f64 = 0.433_883_739_117_558_12;

    /// Bin-10 twiddle: `+KP222520933 + i*KP974927912`.
    pub const C3_RE: f64 = KP222520933;
    pub const C3_IM: f64 = KP974927912;

    /// Bin-11 twiddle: `-KP222520933 + i*KP974927912`.
    pub const C4_RE: f64 = -KP222520933;
    pub const C4_IM: f64 = KP974927912;
}

/// 51 channel center frequencies in Hz, in hop-table order (index order,
/// *not* transmission order — the hop pattern below permutes this index).
pub const CHANNEL_FREQS_HZ: [u32; 51] = [
    902355835, 902857585, 903359336, 903861086, 904362837, 904864587, 905366338, 905868088,
    906369839, 906871589, 907373340, 907875090, 908376841, 908878591, 909380342, 909882092,
    910383843, 910885593, 911387344, 911889094, 912390845, 912892595, 913394346, 913896096,
    914397847, 914899597, 915401347, 915903098, 916404848, 916906599, 917408349, 917910100,
    918411850, 918913601, 919415351, 919917102, 920418852, 920920603, 921422353, 921924104,
    922425854, 922927605, 923429355, 923931106, 924432856, 924934607, 925436357, 925938108,
    926439858, 926941609, 927443359,
];

/// 51-entry hop-pattern permutation: `hop_pattern[hop_idx]` is the channel
/// index the transmitter dwells on at step `hop_idx`.
pub const HOP_PATTERN: [usize; 51] = [
    0, 19, 41, 25, 8, 47, 32, 13, 36, 22, 3, 29, 44, 16, 5, 27, 38, 10, 49, 21, 2, 30, 42, 14, 48,
    7, 24, 34, 45, 1, 17, 39, 26, 9, 31, 50, 37, 12, 20, 33, 4, 43, 28, 15, 35, 6, 40, 11, 23, 46,
    18,
];

/// Number of hop-table entries. `CHANNEL_FREQS_HZ.len() == HOP_PATTERN.len()
/// == NUM_CHANNELS`.
pub const NUM_CHANNELS: usize = 51;

/// Base dwell time before per-station-ID padding, in microseconds (2.5625 s).
pub const DWELL_TIME_BASE_US: u64 = 2_562_500;

/// Additional dwell time per station ID, in microseconds (62.5 ms).
pub const DWELL_TIME_PER_ID_US: u64 = 62_500;

/// Misses before the scheduler gives up on the current channel and jumps to
/// a random one.
pub const MAX_MISSES_BEFORE_RANDOM_HOP: u32 = 3;

/// Rotations of the full hop table to wait after a random hop.
pub const RANDOM_HOP_DWELL_MULTIPLIER: u64 = 52;

/// Extra margin after a successful reception before the next expected hop.
pub const TRACKING_DWELL_MULTIPLIER_NUM: u64 = 3;
pub const TRACKING_DWELL_MULTIPLIER_DEN: u64 = 2;
