//! Example layouts and the types generated for them.
//!
//! [`Mstatus`] is the RV64 machine status register, a single 64-bit word with read-only summary
//! bits. [`UartRegs`] is a small block of 32-bit device registers with a write-only data field and
//! a byte-addressed register. Their field modules, [`mstatus`] and [`uart_regs`], show the marker
//! types the macro generates.
//!
//! ```
//! use bitfieldset::example::{mstatus, Mstatus};
//! use bitfieldset::prelude::*;
//!
//! let mut csr = FieldSet::<Mstatus>::from_words([0x0000_000a_0000_0000]);
//! csr.set::<mstatus::MPP>(0b11).set::<mstatus::MIE>(1);
//!
//! let snapshot = csr.word::<mstatus::MPP>();
//! assert_eq!(snapshot.get::<mstatus::MPP>(), 0b11);
//! assert_eq!(snapshot.get::<mstatus::SXL>(), 2);
//! assert_eq!(snapshot.get::<mstatus::UXL>(), 2);
//! ```

use crate::bitfield_set;

bitfield_set! {
    /// The RV64 `mstatus` machine status register.
    pub struct Mstatus: [u64; 1] {
        /// Supervisor interrupt enable.
        pub SIE: 0[1],
        /// Machine interrupt enable.
        pub MIE: 0[3],
        /// Supervisor previous interrupt enable.
        pub SPIE: 0[5],
        /// User mode big-endian.
        pub UBE: 0[6],
        /// Machine previous interrupt enable.
        pub MPIE: 0[7],
        /// Supervisor previous privilege.
        pub SPP: 0[8],
        /// Vector extension state.
        pub VS: 0[9..=10],
        /// Machine previous privilege.
        #[max = 3]
        pub MPP: 0[11..=12],
        /// Floating-point unit state.
        pub FS: 0[13..=14],
        /// Additional user extension state.
        #[read_only]
        pub XS: 0[15..=16],
        /// Modify privilege.
        pub MPRV: 0[17],
        /// Permit supervisor user memory access.
        pub SUM: 0[18],
        /// Make executable readable.
        pub MXR: 0[19],
        /// Trap virtual memory.
        pub TVM: 0[20],
        /// Timeout wait.
        pub TW: 0[21],
        /// Trap `sret`.
        pub TSR: 0[22],
        /// User mode XLEN.
        #[default = 2]
        #[min = 1]
        #[max = 3]
        pub UXL: 0[32..=33],
        /// Supervisor mode XLEN.
        #[default = 2]
        #[min = 1]
        #[max = 3]
        pub SXL: 0[34..=35],
        /// Supervisor mode big-endian.
        pub SBE: 0[36],
        /// Machine mode big-endian.
        pub MBE: 0[37],
        /// State dirty summary.
        #[read_only]
        pub SD: 0[63],
    }

    /// Registers of a minimal UART.
    pub struct UartRegs: [u32; 3] {
        /// Byte to transmit.
        #[write_only]
        pub TX_DATA: 0[0..=7],
        /// Received byte.
        #[read_only]
        pub RX_DATA: 0[8..=15],
        /// Set while the transmitter is busy.
        #[read_only]
        pub TX_BUSY: 1[0],
        /// Set when a received byte is waiting.
        #[read_only]
        pub RX_READY: 1[1],
        /// Baud rate divider, as `divider + 1`.
        #[byte_offset = 8]
        #[min = 1]
        #[default = 0xd]
        pub DIVIDER: [0..=15],
        /// Parity selection.
        #[max = 2]
        pub PARITY: 2[16..=17],
    }
}
