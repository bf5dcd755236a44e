//! MCS-51 (8051 family) core interpreter
//!
//! The machine is a 256-byte data space shared between the register banks,
//! general-purpose RAM, and the special function registers, plus a read-only
//! program store.  Instructions are either handed to [`Machine::execute`] as
//! raw bytes or fetched from program storage with [`Machine::step`].
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bank;
mod disasm;
mod exec;
mod fault;
mod memory;
mod op;
pub mod psw;
mod sfr;

pub use disasm::{Disassembler, Instruction};
pub use fault::Fault;
pub use op::{Logic, Op, Opcode, OpcodeTable, Operand};
pub use psw::Psw;
pub use sfr::Sfr;

use static_assertions::const_assert;

/// Size of program storage, in bytes
pub const PROGRAM_SIZE: usize = 4 * 1024;

/// Size of the data space, in bytes
pub const DATA_SIZE: usize = 256;

/// Registers per bank
pub const BANK_SIZE: u8 = 8;

/// Number of register banks
pub const BANK_COUNT: u8 = 4;

/// Stack pointer value after [`Machine::reset`]
pub const SP_RESET: u8 = 0x07;

// Every address in the data space is reachable with a `u8`
const_assert!(DATA_SIZE == 1 << u8::BITS);

// The register banks sit below the bit-addressable area at 0x20
const_assert!(BANK_SIZE as usize * BANK_COUNT as usize <= 0x20);

// The fetch cycle addresses program storage with the 16-bit program counter
const_assert!(PROGRAM_SIZE <= 1 << u16::BITS);

/// The microcontroller itself
pub struct Machine {
    /// Code storage, populated by [`Machine::load`]
    program: Box<[u8]>,

    /// Number of bytes in the loaded program image
    program_len: usize,

    /// Data space; the SFRs live at their fixed addresses in here
    data: [u8; DATA_SIZE],

    /// Program counter
    pc: u16,

    /// Opcode table used for dispatch
    table: &'static OpcodeTable,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// Builds a new machine with empty program storage and zeroed data
    pub fn new() -> Self {
        Self::with_table(OpcodeTable::shared())
    }

    /// Builds a new machine which dispatches through the given table
    pub fn with_table(table: &'static OpcodeTable) -> Self {
        Self {
            program: vec![0u8; PROGRAM_SIZE].into_boxed_slice(),
            program_len: 0,
            data: [0u8; DATA_SIZE],
            pc: 0,
            table,
        }
    }

    /// Resets the data space and program counter
    ///
    /// The stack pointer is set to its power-on value of [`SP_RESET`]; the
    /// loaded program is left in place.
    pub fn reset(&mut self) {
        self.data = [0u8; DATA_SIZE];
        self.data[usize::from(Sfr::Sp.addr())] = SP_RESET;
        self.pc = 0;
    }

    /// Copies a program image to the start of program storage
    ///
    /// Any previously loaded program is cleared first.
    pub fn load(&mut self, rom: &[u8]) -> Result<(), Fault> {
        if rom.len() > PROGRAM_SIZE {
            return Err(Fault::ProgramTooLarge(rom.len()));
        }
        self.program.fill(0);
        self.program[..rom.len()].copy_from_slice(rom);
        self.program_len = rom.len();
        Ok(())
    }

    /// Returns the loaded program image
    #[inline]
    pub fn program(&self) -> &[u8] {
        &self.program[..self.program_len]
    }

    /// Returns the current program counter
    #[inline]
    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Sets the program counter
    #[inline]
    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    /// Shared borrow of the entire data space
    #[inline]
    pub fn data(&self) -> &[u8; DATA_SIZE] {
        &self.data
    }

    /// Returns the opcode table used for dispatch
    #[inline]
    pub fn table(&self) -> &'static OpcodeTable {
        self.table
    }
}
