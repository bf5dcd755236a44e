use crate::{Fault, Machine, Psw, Sfr, psw};

impl Machine {
    /// Reads a byte from the data space
    #[inline]
    pub fn read(&self, addr: u8) -> u8 {
        self.data[usize::from(addr)]
    }

    /// Writes a byte to the data space
    ///
    /// This is the only path that modifies data memory, so an SFR written
    /// here is immediately visible through [`Machine::sfr`].
    #[inline]
    pub fn write(&mut self, addr: u8, value: u8) -> Result<(), Fault> {
        let i = usize::from(addr);
        let slot = self.data.get_mut(i).ok_or(Fault::OutOfRange(i))?;
        *slot = value;
        Ok(())
    }

    /// Reads the byte addressed by the pointer stored at `addr`
    ///
    /// This is absolute addressing: the pointer is not bank-relative.
    pub fn deref(&self, addr: u8) -> Result<u8, Fault> {
        let ptr = self.read(addr);
        let i = usize::from(ptr);
        self.data.get(i).copied().ok_or(Fault::OutOfRange(i))
    }

    /// Writes `value` to the byte addressed by the pointer stored at `addr`
    pub fn assign_through(&mut self, addr: u8, value: u8) -> Result<(), Fault> {
        let ptr = self.read(addr);
        self.write(ptr, value)
    }

    /// Reads a special function register
    #[inline]
    pub fn sfr(&self, r: Sfr) -> u8 {
        self.read(r.addr())
    }

    /// Writes a special function register
    #[inline]
    pub fn set_sfr(&mut self, r: Sfr, value: u8) -> Result<(), Fault> {
        self.write(r.addr(), value)
    }

    /// Returns the program status word
    #[inline]
    pub fn psw(&self) -> Psw {
        Psw::from_bits_retain(self.sfr(Sfr::Psw))
    }

    /// Returns the carry flag
    #[inline]
    pub fn carry(&self) -> bool {
        psw::is_set(self.sfr(Sfr::Psw), Psw::CY)
    }

    /// Sets or clears the carry flag, leaving the rest of the PSW alone
    #[inline]
    pub fn set_carry(&mut self, c: bool) -> Result<(), Fault> {
        let p = psw::assign(self.sfr(Sfr::Psw), Psw::CY, c);
        self.set_sfr(Sfr::Psw, p)
    }

    /// Maps a bit address to its `(byte address, mask)` pair
    ///
    /// Bits `0x00..0x80` live in the bit-addressable RAM at `0x20..0x30`;
    /// bits `0x80..` belong to the SFR whose address is the bit address with
    /// the low three bits cleared.
    #[inline]
    pub fn bit_addr(bit: u8) -> (u8, u8) {
        let addr = if bit < 0x80 {
            0x20 + bit / 8
        } else {
            bit & 0xF8
        };
        (addr, 1 << (bit % 8))
    }

    /// Reads a single addressable bit
    pub fn read_bit(&self, bit: u8) -> bool {
        let (addr, mask) = Self::bit_addr(bit);
        self.read(addr) & mask != 0
    }

    /// Writes a single addressable bit
    pub fn write_bit(&mut self, bit: u8, on: bool) -> Result<(), Fault> {
        let (addr, mask) = Self::bit_addr(bit);
        let v = self.read(addr);
        self.write(addr, if on { v | mask } else { v & !mask })
    }
}
