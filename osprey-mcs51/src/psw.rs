//! Program status word codec
use bitflags::bitflags;

bitflags! {
    /// Flag masks within the program status word, most significant first
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Psw: u8 {
        /// Carry
        const CY = 1 << 7;
        /// Auxiliary carry (carry out of the low nibble)
        const AC = 1 << 6;
        /// User flag 0
        const F0 = 1 << 5;
        /// Register bank select, high bit
        const RS1 = 1 << 4;
        /// Register bank select, low bit
        const RS0 = 1 << 3;
        /// Overflow
        const OV = 1 << 2;
        /// Reserved (user flag 1 on some parts)
        const RESERVED = 1 << 1;
        /// Parity of the accumulator
        const P = 1 << 0;
    }
}

/// Both bank select bits
const BANK_MASK: Psw = Psw::RS1.union(Psw::RS0);

/// Checks whether every bit in `mask` is set in `word`
#[inline]
pub const fn is_set(word: u8, mask: Psw) -> bool {
    word & mask.bits() == mask.bits()
}

/// Returns `word` with the bits in `mask` set
#[inline]
pub const fn set(word: u8, mask: Psw) -> u8 {
    word | mask.bits()
}

/// Returns `word` with the bits in `mask` cleared
#[inline]
pub const fn clear(word: u8, mask: Psw) -> u8 {
    word & !mask.bits()
}

/// Sets or clears `mask` depending on `on`
#[inline]
pub const fn assign(word: u8, mask: Psw, on: bool) -> u8 {
    if on {
        set(word, mask)
    } else {
        clear(word, mask)
    }
}

impl Psw {
    /// Active register bank, `2 * RS1 + RS0`
    #[inline]
    pub const fn bank(self) -> u8 {
        (self.bits() & BANK_MASK.bits()) >> 3
    }

    /// Returns a copy with the bank select bits encoding `n`
    ///
    /// Only the low two bits of `n` are used; range checking is the caller's
    /// job (see [`Machine::set_bank`](crate::Machine::set_bank)).
    #[inline]
    pub const fn with_bank(self, n: u8) -> Self {
        let bits = clear(self.bits(), BANK_MASK) | ((n & 0b11) << 3);
        Self::from_bits_retain(bits)
    }
}
