use std::fmt;
use std::sync::OnceLock;

/// Operand addressing mode
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    /// The accumulator
    A,

    /// `#data`
    ///
    /// Literal value taken from the next instruction byte
    Imm,

    /// `direct`
    ///
    /// Data-space address taken from the next instruction byte
    Direct,

    /// `@Ri`
    ///
    /// The byte whose address is held in register `i` (0 or 1) of the active
    /// bank
    Indirect(u8),

    /// `Rn`
    ///
    /// Register `n` (0 through 7) of the active bank
    Reg(u8),
}

impl Operand {
    /// Number of instruction bytes consumed by this operand
    #[inline]
    pub const fn len(self) -> usize {
        match self {
            Operand::Imm | Operand::Direct => 1,
            Operand::A | Operand::Indirect(_) | Operand::Reg(_) => 0,
        }
    }

    /// Decodes the operand for columns `5..=F` of the opcode map
    fn from_column(i: u8) -> Self {
        match i & 0xF {
            0x5 => Operand::Direct,
            0x6 | 0x7 => Operand::Indirect(i & 0x1),
            0x8..=0xF => Operand::Reg(i & 0x7),
            _ => unreachable!("no operand in column {:x}", i & 0xF),
        }
    }

    /// Decodes a source operand, where column 4 is `#data`
    fn source(i: u8) -> Self {
        if i & 0xF == 0x4 {
            Operand::Imm
        } else {
            Self::from_column(i)
        }
    }

    /// Decodes a destination operand, where column 4 is the accumulator
    fn dest(i: u8) -> Self {
        if i & 0xF == 0x4 {
            Operand::A
        } else {
            Self::from_column(i)
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::A => write!(f, "A"),
            Operand::Imm => write!(f, "#data"),
            Operand::Direct => write!(f, "direct"),
            Operand::Indirect(i) => write!(f, "@R{i}"),
            Operand::Reg(n) => write!(f, "R{n}"),
        }
    }
}

/// Bitwise logic family (`ANL`, `ORL`, `XRL`)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Logic {
    /// `ANL`
    And,
    /// `ORL`
    Or,
    /// `XRL`
    Xor,
}

impl Logic {
    /// Applies the operation to a pair of bytes
    #[inline]
    pub const fn apply(self, a: u8, b: u8) -> u8 {
        match self {
            Logic::And => a & b,
            Logic::Or => a | b,
            Logic::Xor => a ^ b,
        }
    }

    /// Applies the operation to a pair of bits
    #[inline]
    pub const fn apply_bit(self, a: bool, b: bool) -> bool {
        match self {
            Logic::And => a & b,
            Logic::Or => a | b,
            Logic::Xor => a ^ b,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Logic::And => "ANL",
            Logic::Or => "ORL",
            Logic::Xor => "XRL",
        }
    }
}

/// Decoded MCS-51 opcode
///
/// Every byte except `0xA5` decodes to an `Op`; see [`Op::decode`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    /// `NOP`
    Nop,

    /// `AJMP addr11`
    Ajmp,
    /// `ACALL addr11`
    Acall,
    /// `LJMP addr16`
    Ljmp,
    /// `LCALL addr16`
    Lcall,
    /// `RET`
    Ret,
    /// `RETI`
    Reti,
    /// `SJMP rel`
    Sjmp,
    /// `JMP @A+DPTR`
    JmpDptr,
    /// `JC rel`
    Jc,
    /// `JNC rel`
    Jnc,
    /// `JZ rel`
    Jz,
    /// `JNZ rel`
    Jnz,
    /// `JB bit,rel`
    Jb,
    /// `JNB bit,rel`
    Jnb,
    /// `JBC bit,rel`
    Jbc,
    /// `CJNE lhs,rhs,rel`
    Cjne {
        /// Compared operand
        lhs: Operand,
        /// Reference operand
        rhs: Operand,
    },
    /// `DJNZ x,rel`
    Djnz(Operand),

    /// `RR A`
    ///
    /// Rotates the accumulator right by one bit; bit 0 moves into bit 7.
    Rr,
    /// `RRC A`
    ///
    /// Rotates the accumulator right through the carry flag: bit 0 moves
    /// into C, and the old C moves into bit 7.
    Rrc,
    /// `RL A`
    ///
    /// Rotates the accumulator left by one bit; bit 7 moves into bit 0.
    Rl,
    /// `RLC A`
    ///
    /// Rotates the accumulator left through the carry flag: bit 7 moves
    /// into C, and the old C moves into bit 0.
    Rlc,

    /// `INC x`, wrapping, no flags
    Inc(Operand),
    /// `DEC x`, wrapping, no flags
    Dec(Operand),
    /// `INC DPTR`
    IncDptr,

    /// `ADD A,x`
    ///
    /// Wrapping 8-bit addition.  Flags are not computed.
    Add(Operand),
    /// `ADDC A,x`
    Addc(Operand),
    /// `SUBB A,x`
    Subb(Operand),
    /// `MUL AB`
    Mul,
    /// `DIV AB`
    Div,
    /// `DA A`
    Da,

    /// `ANL` / `ORL` / `XRL` with a byte destination
    Logic {
        /// Operation
        f: Logic,
        /// Destination, either `A` or `direct`
        dst: Operand,
        /// Source
        src: Operand,
    },
    /// `ANL C,bit` / `ORL C,bit`, optionally with the bit complemented
    LogicC {
        /// Operation
        f: Logic,
        /// Complement the bit before combining (`/bit`)
        invert: bool,
    },

    /// `MOV dst,src`
    Mov {
        /// Destination
        dst: Operand,
        /// Source
        src: Operand,
    },
    /// `MOV DPTR,#data16`
    MovDptr,
    /// `MOV C,bit`
    MovCBit,
    /// `MOV bit,C`
    MovBitC,
    /// `MOVC A,@A+PC`
    MovcPc,
    /// `MOVC A,@A+DPTR`
    MovcDptr,
    /// `MOVX`
    Movx {
        /// Write to external memory (`MOVX @..,A`) instead of reading from it
        store: bool,
        /// Pointer register `Ri`, or `None` for `DPTR`
        ri: Option<u8>,
    },

    /// `CLR A`
    ClrA,
    /// `CLR C`
    ClrC,
    /// `CLR bit`
    ClrBit,
    /// `SETB C`
    SetbC,
    /// `SETB bit`
    SetbBit,
    /// `CPL A`
    CplA,
    /// `CPL C`
    CplC,
    /// `CPL bit`
    CplBit,

    /// `SWAP A`
    Swap,
    /// `XCH A,x`
    Xch(Operand),
    /// `XCHD A,@Ri`
    Xchd(u8),

    /// `PUSH direct`
    Push,
    /// `POP direct`
    Pop,
}

impl Op {
    /// Decodes an opcode byte
    ///
    /// Returns `None` for the single undefined opcode, `0xA5`.
    pub fn decode(i: u8) -> Option<Op> {
        use Operand::*;
        let op = match i {
            0x01 | 0x21 | 0x41 | 0x61 | 0x81 | 0xa1 | 0xc1 | 0xe1 => Op::Ajmp,
            0x11 | 0x31 | 0x51 | 0x71 | 0x91 | 0xb1 | 0xd1 | 0xf1 => Op::Acall,

            0x00 => Op::Nop,
            0x02 => Op::Ljmp,
            0x03 => Op::Rr,
            0x04 => Op::Inc(A),
            0x05..=0x0f => Op::Inc(Operand::from_column(i)),

            0x10 => Op::Jbc,
            0x12 => Op::Lcall,
            0x13 => Op::Rrc,
            0x14 => Op::Dec(A),
            0x15..=0x1f => Op::Dec(Operand::from_column(i)),

            0x20 => Op::Jb,
            0x22 => Op::Ret,
            0x23 => Op::Rl,
            0x24..=0x2f => Op::Add(Operand::source(i)),

            0x30 => Op::Jnb,
            0x32 => Op::Reti,
            0x33 => Op::Rlc,
            0x34..=0x3f => Op::Addc(Operand::source(i)),

            0x40 => Op::Jc,
            0x50 => Op::Jnc,
            0x60 => Op::Jz,
            0x42 | 0x52 | 0x62 => Op::Logic {
                f: Self::logic_row(i),
                dst: Direct,
                src: A,
            },
            0x43 | 0x53 | 0x63 => Op::Logic {
                f: Self::logic_row(i),
                dst: Direct,
                src: Imm,
            },
            0x44..=0x4f | 0x54..=0x5f | 0x64..=0x6f => Op::Logic {
                f: Self::logic_row(i),
                dst: A,
                src: Operand::source(i),
            },

            0x70 => Op::Jnz,
            0x72 => Op::LogicC {
                f: Logic::Or,
                invert: false,
            },
            0x73 => Op::JmpDptr,
            0x74..=0x7f => Op::Mov {
                dst: Operand::dest(i),
                src: Imm,
            },

            0x80 => Op::Sjmp,
            0x82 => Op::LogicC {
                f: Logic::And,
                invert: false,
            },
            0x83 => Op::MovcPc,
            0x84 => Op::Div,
            0x85..=0x8f => Op::Mov {
                dst: Direct,
                src: Operand::from_column(i),
            },

            0x90 => Op::MovDptr,
            0x92 => Op::MovBitC,
            0x93 => Op::MovcDptr,
            0x94..=0x9f => Op::Subb(Operand::source(i)),

            0xa0 => Op::LogicC {
                f: Logic::Or,
                invert: true,
            },
            0xa2 => Op::MovCBit,
            0xa3 => Op::IncDptr,
            0xa4 => Op::Mul,
            0xa5 => return None,
            0xa6..=0xaf => Op::Mov {
                dst: Operand::from_column(i),
                src: Direct,
            },

            0xb0 => Op::LogicC {
                f: Logic::And,
                invert: true,
            },
            0xb2 => Op::CplBit,
            0xb3 => Op::CplC,
            0xb4 => Op::Cjne { lhs: A, rhs: Imm },
            0xb5 => Op::Cjne {
                lhs: A,
                rhs: Direct,
            },
            0xb6..=0xbf => Op::Cjne {
                lhs: Operand::from_column(i),
                rhs: Imm,
            },

            0xc0 => Op::Push,
            0xc2 => Op::ClrBit,
            0xc3 => Op::ClrC,
            0xc4 => Op::Swap,
            0xc5..=0xcf => Op::Xch(Operand::from_column(i)),

            0xd0 => Op::Pop,
            0xd2 => Op::SetbBit,
            0xd3 => Op::SetbC,
            0xd4 => Op::Da,
            0xd5 => Op::Djnz(Direct),
            0xd6 | 0xd7 => Op::Xchd(i & 0x1),
            0xd8..=0xdf => Op::Djnz(Operand::from_column(i)),

            0xe0 => Op::Movx {
                store: false,
                ri: None,
            },
            0xe2 | 0xe3 => Op::Movx {
                store: false,
                ri: Some(i & 0x1),
            },
            0xe4 => Op::ClrA,
            0xe5..=0xef => Op::Mov {
                dst: A,
                src: Operand::from_column(i),
            },

            0xf0 => Op::Movx {
                store: true,
                ri: None,
            },
            0xf2 | 0xf3 => Op::Movx {
                store: true,
                ri: Some(i & 0x1),
            },
            0xf4 => Op::CplA,
            0xf5..=0xff => Op::Mov {
                dst: Operand::from_column(i),
                src: A,
            },
        };
        Some(op)
    }

    fn logic_row(i: u8) -> Logic {
        match i >> 4 {
            0x4 => Logic::Or,
            0x5 => Logic::And,
            0x6 => Logic::Xor,
            _ => unreachable!("no logic operation in row {:x}", i >> 4),
        }
    }

    /// Number of operand bytes following the opcode
    pub const fn operand_count(self) -> usize {
        match self {
            Op::Nop
            | Op::Ret
            | Op::Reti
            | Op::JmpDptr
            | Op::Rr
            | Op::Rrc
            | Op::Rl
            | Op::Rlc
            | Op::IncDptr
            | Op::Mul
            | Op::Div
            | Op::Da
            | Op::MovcPc
            | Op::MovcDptr
            | Op::Movx { .. }
            | Op::ClrA
            | Op::ClrC
            | Op::SetbC
            | Op::CplA
            | Op::CplC
            | Op::Swap
            | Op::Xchd(_) => 0,

            Op::Ajmp
            | Op::Acall
            | Op::Sjmp
            | Op::Jc
            | Op::Jnc
            | Op::Jz
            | Op::Jnz
            | Op::LogicC { .. }
            | Op::MovCBit
            | Op::MovBitC
            | Op::ClrBit
            | Op::SetbBit
            | Op::CplBit
            | Op::Push
            | Op::Pop => 1,

            Op::Ljmp
            | Op::Lcall
            | Op::Jb
            | Op::Jnb
            | Op::Jbc
            | Op::MovDptr => 2,

            Op::Cjne { lhs, rhs } => lhs.len() + rhs.len() + 1,
            Op::Djnz(x) => x.len() + 1,

            Op::Inc(x)
            | Op::Dec(x)
            | Op::Add(x)
            | Op::Addc(x)
            | Op::Subb(x)
            | Op::Xch(x) => x.len(),

            Op::Logic { dst, src, .. } | Op::Mov { dst, src } => {
                dst.len() + src.len()
            }
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Op::Nop => write!(f, "NOP"),
            Op::Ajmp => write!(f, "AJMP addr11"),
            Op::Acall => write!(f, "ACALL addr11"),
            Op::Ljmp => write!(f, "LJMP addr16"),
            Op::Lcall => write!(f, "LCALL addr16"),
            Op::Ret => write!(f, "RET"),
            Op::Reti => write!(f, "RETI"),
            Op::Sjmp => write!(f, "SJMP rel"),
            Op::JmpDptr => write!(f, "JMP @A+DPTR"),
            Op::Jc => write!(f, "JC rel"),
            Op::Jnc => write!(f, "JNC rel"),
            Op::Jz => write!(f, "JZ rel"),
            Op::Jnz => write!(f, "JNZ rel"),
            Op::Jb => write!(f, "JB bit,rel"),
            Op::Jnb => write!(f, "JNB bit,rel"),
            Op::Jbc => write!(f, "JBC bit,rel"),
            Op::Cjne { lhs, rhs } => write!(f, "CJNE {lhs},{rhs},rel"),
            Op::Djnz(x) => write!(f, "DJNZ {x},rel"),
            Op::Rr => write!(f, "RR A"),
            Op::Rrc => write!(f, "RRC A"),
            Op::Rl => write!(f, "RL A"),
            Op::Rlc => write!(f, "RLC A"),
            Op::Inc(x) => write!(f, "INC {x}"),
            Op::Dec(x) => write!(f, "DEC {x}"),
            Op::IncDptr => write!(f, "INC DPTR"),
            Op::Add(x) => write!(f, "ADD A,{x}"),
            Op::Addc(x) => write!(f, "ADDC A,{x}"),
            Op::Subb(x) => write!(f, "SUBB A,{x}"),
            Op::Mul => write!(f, "MUL AB"),
            Op::Div => write!(f, "DIV AB"),
            Op::Da => write!(f, "DA A"),
            Op::Logic { f: op, dst, src } => {
                write!(f, "{} {dst},{src}", op.name())
            }
            Op::LogicC { f: op, invert } => {
                let slash = if *invert { "/" } else { "" };
                write!(f, "{} C,{slash}bit", op.name())
            }
            Op::Mov { dst, src } => write!(f, "MOV {dst},{src}"),
            Op::MovDptr => write!(f, "MOV DPTR,#data16"),
            Op::MovCBit => write!(f, "MOV C,bit"),
            Op::MovBitC => write!(f, "MOV bit,C"),
            Op::MovcPc => write!(f, "MOVC A,@A+PC"),
            Op::MovcDptr => write!(f, "MOVC A,@A+DPTR"),
            Op::Movx { store, ri } => {
                let ptr = match ri {
                    Some(i) => format!("@R{i}"),
                    None => "@DPTR".to_owned(),
                };
                if *store {
                    write!(f, "MOVX {ptr},A")
                } else {
                    write!(f, "MOVX A,{ptr}")
                }
            }
            Op::ClrA => write!(f, "CLR A"),
            Op::ClrC => write!(f, "CLR C"),
            Op::ClrBit => write!(f, "CLR bit"),
            Op::SetbC => write!(f, "SETB C"),
            Op::SetbBit => write!(f, "SETB bit"),
            Op::CplA => write!(f, "CPL A"),
            Op::CplC => write!(f, "CPL C"),
            Op::CplBit => write!(f, "CPL bit"),
            Op::Swap => write!(f, "SWAP A"),
            Op::Xch(x) => write!(f, "XCH A,{x}"),
            Op::Xchd(i) => write!(f, "XCHD A,@R{i}"),
            Op::Push => write!(f, "PUSH direct"),
            Op::Pop => write!(f, "POP direct"),
        }
    }
}

/// Entry in the [`OpcodeTable`]
#[derive(Clone, Debug)]
pub struct Opcode {
    /// Decoded operation
    pub op: Op,
    /// Human-readable mnemonic, e.g. `MOV R3,#data`
    pub mnemonic: String,
    /// Number of operand bytes following the opcode (0, 1, or 2)
    pub operand_count: usize,
}

/// Table of every opcode, indexed by opcode byte
///
/// The table is immutable once built; [`OpcodeTable::shared`] builds it once
/// per process and hands out a shared reference.
#[derive(Debug)]
pub struct OpcodeTable {
    entries: Vec<Option<Opcode>>,
}

impl Default for OpcodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl OpcodeTable {
    /// Builds a fresh table
    pub fn new() -> Self {
        let entries = (0..=u8::MAX)
            .map(|i| {
                Op::decode(i).map(|op| Opcode {
                    op,
                    mnemonic: op.to_string(),
                    operand_count: op.operand_count(),
                })
            })
            .collect();
        Self { entries }
    }

    /// Returns the process-wide table, building it on first use
    pub fn shared() -> &'static Self {
        static TABLE: OnceLock<OpcodeTable> = OnceLock::new();
        TABLE.get_or_init(OpcodeTable::new)
    }

    /// Looks up an opcode byte
    #[inline]
    pub fn get(&self, opcode: u8) -> Option<&Opcode> {
        self.entries[usize::from(opcode)].as_ref()
    }

    /// Iterates over `(opcode, entry)` pairs for every defined opcode
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Opcode)> + '_ {
        (0..=u8::MAX)
            .zip(&self.entries)
            .filter_map(|(i, e)| Some((i, e.as_ref()?)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn only_a5_is_undefined() {
        let t = OpcodeTable::new();
        assert!(t.get(0xa5).is_none());
        assert_eq!(t.iter().count(), 255);
        for (i, e) in t.iter() {
            assert!(e.operand_count <= 2, "{i:02x} {}", e.mnemonic);
        }
    }

    #[test]
    fn mnemonics() {
        const CASES: &str = "
            00 NOP
            01 AJMP addr11
            11 ACALL addr11
            03 RR A
            06 INC @R0
            0f INC R7
            15 DEC direct
            24 ADD A,#data
            27 ADD A,@R1
            2a ADD A,R2
            42 ORL direct,A
            53 ANL direct,#data
            66 XRL A,@R0
            72 ORL C,bit
            b0 ANL C,/bit
            75 MOV direct,#data
            76 MOV @R0,#data
            7b MOV R3,#data
            85 MOV direct,direct
            87 MOV direct,@R1
            8c MOV direct,R4
            a6 MOV @R0,direct
            ae MOV R6,direct
            b6 CJNE @R0,#data,rel
            b5 CJNE A,direct,rel
            c0 PUSH direct
            c4 SWAP A
            d5 DJNZ direct,rel
            da DJNZ R2,rel
            d7 XCHD A,@R1
            e2 MOVX A,@R0
            f0 MOVX @DPTR,A
            e4 CLR A
            e5 MOV A,direct
            e9 MOV A,R1
            f4 CPL A
            f6 MOV @R0,A
            ff MOV R7,A
        ";
        let t = OpcodeTable::new();
        for line in CASES.lines().map(str::trim).filter(|s| !s.is_empty()) {
            let (byte, name) = line.split_once(' ').unwrap();
            let byte = u8::from_str_radix(byte, 16).unwrap();
            let e = t.get(byte).unwrap();
            assert_eq!(e.mnemonic, name, "opcode {byte:02x}");
        }
    }

    #[test]
    fn lengths() {
        // (opcode, operand bytes)
        const CASES: [(u8, usize); 20] = [
            (0x00, 0),
            (0x02, 2),
            (0x05, 1),
            (0x10, 2),
            (0x24, 1),
            (0x28, 0),
            (0x43, 2),
            (0x75, 2),
            (0x78, 1),
            (0x76, 1),
            (0x85, 2),
            (0x88, 1),
            (0x90, 2),
            (0xb4, 2),
            (0xb8, 2),
            (0xc0, 1),
            (0xd5, 2),
            (0xd8, 1),
            (0xe6, 0),
            (0xf5, 1),
        ];
        let t = OpcodeTable::new();
        for (byte, n) in CASES {
            let e = t.get(byte).unwrap();
            assert_eq!(e.operand_count, n, "opcode {byte:02x}");
        }
    }

    #[test]
    fn shared_table_is_built_once() {
        let a = OpcodeTable::shared() as *const _;
        let b = OpcodeTable::shared() as *const _;
        assert_eq!(a, b);
    }
}
