/// Special function registers, identified by their direct address
///
/// These are views into the machine's data space: the byte at the address is
/// the register, so there is nothing to keep in sync.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Sfr {
    /// Port 0 latch
    P0 = 0x80,
    /// Stack pointer
    Sp = 0x81,
    /// Data pointer, low byte
    Dpl = 0x82,
    /// Data pointer, high byte
    Dph = 0x83,
    /// Power control
    Pcon = 0x87,
    /// Timer / counter control
    Tcon = 0x88,
    /// Timer / counter mode control
    Tmod = 0x89,
    /// Timer 0, low byte
    Tl0 = 0x8A,
    /// Timer 1, low byte
    Tl1 = 0x8B,
    /// Timer 0, high byte
    Th0 = 0x8C,
    /// Timer 1, high byte
    Th1 = 0x8D,
    /// Port 1 latch
    P1 = 0x90,
    /// Serial port control
    Scon = 0x98,
    /// Serial port data buffer
    Sbuf = 0x99,
    /// Port 2 latch
    P2 = 0xA0,
    /// Interrupt enable control
    Ie = 0xA8,
    /// Port 3 latch
    P3 = 0xB0,
    /// Interrupt priority
    Ip = 0xB8,
    /// Program status word
    Psw = 0xD0,
    /// Accumulator
    Acc = 0xE0,
    /// B register
    B = 0xF0,
}

impl Sfr {
    /// Every register, in address order
    pub const ALL: [Sfr; 21] = [
        Sfr::P0,
        Sfr::Sp,
        Sfr::Dpl,
        Sfr::Dph,
        Sfr::Pcon,
        Sfr::Tcon,
        Sfr::Tmod,
        Sfr::Tl0,
        Sfr::Tl1,
        Sfr::Th0,
        Sfr::Th1,
        Sfr::P1,
        Sfr::Scon,
        Sfr::Sbuf,
        Sfr::P2,
        Sfr::Ie,
        Sfr::P3,
        Sfr::Ip,
        Sfr::Psw,
        Sfr::Acc,
        Sfr::B,
    ];

    /// Direct address of the register
    #[inline]
    pub const fn addr(self) -> u8 {
        self as u8
    }

    /// Looks up the register at a direct address, if there is one
    pub fn from_addr(addr: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.addr() == addr)
    }

    /// Data-sheet name of the register
    pub const fn name(self) -> &'static str {
        match self {
            Sfr::P0 => "P0",
            Sfr::Sp => "SP",
            Sfr::Dpl => "DPL",
            Sfr::Dph => "DPH",
            Sfr::Pcon => "PCON",
            Sfr::Tcon => "TCON",
            Sfr::Tmod => "TMOD",
            Sfr::Tl0 => "TL0",
            Sfr::Tl1 => "TL1",
            Sfr::Th0 => "TH0",
            Sfr::Th1 => "TH1",
            Sfr::P1 => "P1",
            Sfr::Scon => "SCON",
            Sfr::Sbuf => "SBUF",
            Sfr::P2 => "P2",
            Sfr::Ie => "IE",
            Sfr::P3 => "P3",
            Sfr::Ip => "IP",
            Sfr::Psw => "PSW",
            Sfr::Acc => "ACC",
            Sfr::B => "B",
        }
    }
}

impl std::fmt::Display for Sfr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
