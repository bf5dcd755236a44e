use thiserror::Error;

/// Errors raised while accessing memory or executing instructions
///
/// None of these are fatal to the [`Machine`](crate::Machine); the caller may
/// keep feeding it instructions afterwards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// `execute` was handed zero bytes
    #[error("instruction must be at least 1 byte")]
    EmptyInstruction,

    /// The opcode byte has no table entry
    #[error("opcode {0:#04x} does not exist in the opcode table")]
    UnknownOpcode(u8),

    /// The instruction bytes don't match the opcode's operand count
    #[error(
        "opcode {opcode:#04x} takes {expected} operand byte(s), got {found}"
    )]
    OperandCount {
        /// Opcode byte
        opcode: u8,
        /// Operand bytes required by the table entry
        expected: usize,
        /// Operand bytes supplied
        found: usize,
    },

    /// Advancing the program counter would leave the 16-bit address space
    #[error("program counter would exceed 0xffff")]
    InstructionPointerOverflow,

    /// An address falls outside of the data space
    #[error("address {0:#x} is outside the data space")]
    OutOfRange(usize),

    /// A register bank outside of `0..=3` was requested
    #[error("register bank {0} does not exist (expected 0..=3)")]
    InvalidBank(u8),

    /// The opcode is a placeholder without semantics
    #[error("opcode {0:#04x} is not implemented")]
    Unimplemented(u8),

    /// A program image is larger than program storage
    #[error("program of {0} bytes does not fit in program storage")]
    ProgramTooLarge(usize),

    /// The instruction at this address runs off the end of program storage
    #[error("instruction at {0:#06x} runs past the end of program storage")]
    ProgramOverrun(u16),

    /// A semantic routine failed
    #[error("failed to evaluate opcode {opcode:#04x}")]
    Eval {
        /// Opcode being evaluated
        opcode: u8,
        /// Fault reported by the routine
        #[source]
        source: Box<Fault>,
    },
}
