use crate::{BANK_COUNT, BANK_SIZE, Fault, Machine, Sfr};

impl Machine {
    /// Returns the register bank selected by `RS1:RS0` in the PSW
    #[inline]
    pub fn active_bank(&self) -> u8 {
        self.psw().bank()
    }

    /// Returns the data-space address of `R0` in the active bank
    #[inline]
    pub fn bank_offset(&self) -> u8 {
        self.active_bank() * BANK_SIZE
    }

    /// Selects a register bank by rewriting the bank select bits in the PSW
    pub fn set_bank(&mut self, n: u8) -> Result<(), Fault> {
        if n >= BANK_COUNT {
            return Err(Fault::InvalidBank(n));
        }
        let p = self.psw().with_bank(n);
        self.set_sfr(Sfr::Psw, p.bits())
    }

    /// Returns the data-space address of register `reg` in the active bank
    ///
    /// The bank is sampled when this is called, so a bank switch between two
    /// calls resolves the same register to different cells.
    ///
    /// # Panics
    /// If `reg` is not in `0..8`
    #[inline]
    pub fn bank_addr(&self, reg: u8) -> u8 {
        assert!(reg < BANK_SIZE, "invalid register R{reg}");
        self.bank_offset() + reg
    }

    /// Reads register `reg` of the active bank
    ///
    /// # Panics
    /// If `reg` is not in `0..8`
    #[inline]
    pub fn read_bank(&self, reg: u8) -> u8 {
        self.read(self.bank_addr(reg))
    }

    /// Writes register `reg` of the active bank
    ///
    /// # Panics
    /// If `reg` is not in `0..8`
    #[inline]
    pub fn write_bank(&mut self, reg: u8, value: u8) -> Result<(), Fault> {
        self.write(self.bank_addr(reg), value)
    }

    /// Reads the byte addressed by register `reg` of the active bank (`@Ri`)
    ///
    /// Only the pointer's location is bank-relative; the pointer itself is an
    /// absolute data-space address.
    ///
    /// # Panics
    /// If `reg` is not in `0..8`
    pub fn deref_bank(&self, reg: u8) -> Result<u8, Fault> {
        self.deref(self.bank_addr(reg))
    }

    /// Writes `value` to the byte addressed by register `reg` of the active
    /// bank
    ///
    /// # Panics
    /// If `reg` is not in `0..8`
    pub fn assign_through_bank(
        &mut self,
        reg: u8,
        value: u8,
    ) -> Result<(), Fault> {
        self.assign_through(self.bank_addr(reg), value)
    }
}
