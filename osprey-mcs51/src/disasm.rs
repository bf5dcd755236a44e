use crate::{Machine, Opcode, OpcodeTable};
use std::fmt;

/// A single decoded instruction from a program image
#[derive(Copy, Clone, Debug)]
pub struct Instruction<'a> {
    /// Address of the opcode byte
    pub offset: usize,
    /// Opcode byte
    pub opcode: u8,
    /// Operand bytes that follow the opcode
    ///
    /// This may be shorter than the opcode's operand count if the image ends
    /// partway through the instruction.
    pub operands: &'a [u8],
    /// Table entry, or `None` for an undefined opcode
    pub entry: Option<&'a Opcode>,
}

impl Instruction<'_> {
    /// Returns the mnemonic, or `db` for bytes which aren't an opcode
    pub fn mnemonic(&self) -> &str {
        self.entry.map(|e| e.mnemonic.as_str()).unwrap_or("db")
    }

    /// Returns the number of bytes this instruction occupies in the image
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        1 + self.operands.len()
    }

    /// Checks whether the image ended before all operand bytes were read
    pub fn is_truncated(&self) -> bool {
        self.entry.is_some_and(|e| e.operand_count != self.operands.len())
    }
}

impl fmt::Display for Instruction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04x}:  {:02x}", self.offset, self.opcode)?;
        for b in self.operands {
            write!(f, " {b:02x}")?;
        }
        // Pad the raw bytes out to a fixed width
        for _ in self.operands.len()..2 {
            write!(f, "   ")?;
        }
        match self.entry {
            Some(_) => write!(f, "   {}", self.mnemonic())?,
            None => write!(f, "   db {:#04x}", self.opcode)?,
        }
        if self.is_truncated() {
            write!(f, "  ; truncated")?;
        }
        Ok(())
    }
}

/// Linear-sweep disassembler over a program image
pub struct Disassembler<'a> {
    table: &'a OpcodeTable,
    program: &'a [u8],
    offset: usize,
}

impl<'a> Disassembler<'a> {
    /// Builds a disassembler which starts at `offset` within `program`
    pub fn new(
        table: &'a OpcodeTable,
        program: &'a [u8],
        offset: usize,
    ) -> Self {
        Self {
            table,
            program,
            offset,
        }
    }
}

impl<'a> Iterator for Disassembler<'a> {
    type Item = Instruction<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.offset;
        let (&opcode, rest) = self.program.get(offset..)?.split_first()?;
        let entry = self.table.get(opcode);
        let n = entry.map(|e| e.operand_count).unwrap_or(0).min(rest.len());
        self.offset += 1 + n;
        Some(Instruction {
            offset,
            opcode,
            operands: &rest[..n],
            entry,
        })
    }
}

impl Machine {
    /// Disassembles the loaded program, starting at `offset`
    pub fn disassemble(&self, offset: usize) -> Disassembler<'_> {
        Disassembler::new(self.table, self.program(), offset)
    }
}
