use crate::{Fault, Machine, Op, Operand, Sfr};
use log::{debug, trace};

/// Resolved operand: either a cell in the data space or a literal
#[derive(Copy, Clone, Debug)]
enum Place {
    Addr(u8),
    Value(u8),
}

impl Machine {
    /// Executes a single instruction, given as `[opcode, operands..]`
    ///
    /// On success, the program counter advances by the instruction length.
    /// On failure, the program counter is left alone; faults detected before
    /// the operation runs leave the machine untouched.
    pub fn execute(&mut self, instruction: &[u8]) -> Result<(), Fault> {
        let (&opcode, operands) =
            instruction.split_first().ok_or(Fault::EmptyInstruction)?;
        let table = self.table;
        let entry = table.get(opcode).ok_or(Fault::UnknownOpcode(opcode))?;
        if operands.len() != entry.operand_count {
            return Err(Fault::OperandCount {
                opcode,
                expected: entry.operand_count,
                found: operands.len(),
            });
        }
        let next = u16::try_from(instruction.len())
            .ok()
            .and_then(|n| self.pc.checked_add(n))
            .ok_or(Fault::InstructionPointerOverflow)?;

        trace!(
            "{:04x}: {opcode:02x} {:<20} {operands:02x?}",
            self.pc,
            entry.mnemonic
        );
        if let Err(e) = self.eval(opcode, entry.op, operands) {
            debug!("{:04x}: {} failed: {e}", self.pc, entry.mnemonic);
            return Err(Fault::Eval {
                opcode,
                source: Box::new(e),
            });
        }
        self.pc = next;
        Ok(())
    }

    /// Fetches the instruction at the program counter and executes it
    ///
    /// The whole instruction must lie within the loaded program image.
    pub fn step(&mut self) -> Result<(), Fault> {
        let pc = usize::from(self.pc);
        let opcode = *self
            .program()
            .get(pc)
            .ok_or(Fault::ProgramOverrun(self.pc))?;
        let entry = self
            .table
            .get(opcode)
            .ok_or(Fault::UnknownOpcode(opcode))?;
        let n = 1 + entry.operand_count;

        let mut buf = [0u8; 3];
        let bytes = self
            .program()
            .get(pc..pc + n)
            .ok_or(Fault::ProgramOverrun(self.pc))?;
        buf[..n].copy_from_slice(bytes);
        self.execute(&buf[..n])
    }

    /// Steps until the program counter leaves the loaded program image
    ///
    /// Stops early after `limit` instructions.  Returns the number of
    /// instructions executed.
    pub fn run(&mut self, limit: usize) -> Result<usize, Fault> {
        let mut count = 0;
        while count < limit && usize::from(self.pc) < self.program_len {
            self.step()?;
            count += 1;
        }
        Ok(count)
    }

    /// Resolves an operand against the current machine state
    ///
    /// `args` holds the instruction bytes belonging to this operand.
    fn place(&self, x: Operand, args: &[u8]) -> Place {
        match x {
            Operand::A => Place::Addr(Sfr::Acc.addr()),
            Operand::Imm => Place::Value(args[0]),
            Operand::Direct => Place::Addr(args[0]),
            Operand::Indirect(i) => Place::Addr(self.read_bank(i)),
            Operand::Reg(n) => Place::Addr(self.bank_addr(n)),
        }
    }

    fn get(&self, p: Place) -> u8 {
        match p {
            Place::Addr(a) => self.read(a),
            Place::Value(v) => v,
        }
    }

    fn put(&mut self, p: Place, v: u8) -> Result<(), Fault> {
        match p {
            Place::Addr(a) => self.write(a, v),
            Place::Value(_) => unreachable!("cannot store to an immediate"),
        }
    }

    fn acc(&self) -> u8 {
        self.sfr(Sfr::Acc)
    }

    fn set_acc(&mut self, v: u8) -> Result<(), Fault> {
        self.set_sfr(Sfr::Acc, v)
    }

    /// Applies an operation's semantics
    ///
    /// Operand bytes have already been checked against the opcode table.
    fn eval(&mut self, opcode: u8, op: Op, args: &[u8]) -> Result<(), Fault> {
        match op {
            Op::Nop => (),

            Op::Rr => self.set_acc(self.acc().rotate_right(1))?,
            Op::Rl => self.set_acc(self.acc().rotate_left(1))?,
            Op::Rrc => {
                let a = self.acc();
                let c = u8::from(self.carry());
                self.set_carry(a & 1 != 0)?;
                self.set_acc((c << 7) | (a >> 1))?;
            }
            Op::Rlc => {
                let a = self.acc();
                let c = u8::from(self.carry());
                self.set_carry(a & 0x80 != 0)?;
                self.set_acc((a << 1) | c)?;
            }

            Op::Inc(x) => {
                let p = self.place(x, args);
                self.put(p, self.get(p).wrapping_add(1))?;
            }
            Op::Dec(x) => {
                let p = self.place(x, args);
                self.put(p, self.get(p).wrapping_sub(1))?;
            }
            Op::IncDptr => {
                let dptr = u16::from_be_bytes([
                    self.sfr(Sfr::Dph),
                    self.sfr(Sfr::Dpl),
                ]);
                let [hi, lo] = dptr.wrapping_add(1).to_be_bytes();
                self.set_sfr(Sfr::Dph, hi)?;
                self.set_sfr(Sfr::Dpl, lo)?;
            }

            // Flags are not computed
            Op::Add(x) => {
                let v = self.get(self.place(x, args));
                self.set_acc(self.acc().wrapping_add(v))?;
            }

            Op::Logic { f, dst, src } => {
                let (d, s) = args.split_at(dst.len());
                let dst = self.place(dst, d);
                let v = self.get(self.place(src, s));
                self.put(dst, f.apply(self.get(dst), v))?;
            }
            Op::LogicC { f, invert } => {
                let b = self.read_bit(args[0]) ^ invert;
                self.set_carry(f.apply_bit(self.carry(), b))?;
            }

            Op::Mov { dst, src } => {
                // MOV direct,direct encodes the source address first
                let (d, s) = if (dst, src) == (Operand::Direct, Operand::Direct)
                {
                    (&args[1..], &args[..1])
                } else {
                    args.split_at(dst.len())
                };
                let dst = self.place(dst, d);
                let v = self.get(self.place(src, s));
                self.put(dst, v)?;
            }
            Op::MovDptr => {
                self.set_sfr(Sfr::Dph, args[0])?;
                self.set_sfr(Sfr::Dpl, args[1])?;
            }
            Op::MovCBit => self.set_carry(self.read_bit(args[0]))?,
            Op::MovBitC => self.write_bit(args[0], self.carry())?,

            Op::ClrA => self.set_acc(0)?,
            Op::CplA => self.set_acc(!self.acc())?,
            Op::ClrC => self.set_carry(false)?,
            Op::SetbC => self.set_carry(true)?,
            Op::CplC => self.set_carry(!self.carry())?,
            Op::ClrBit => self.write_bit(args[0], false)?,
            Op::SetbBit => self.write_bit(args[0], true)?,
            Op::CplBit => self.write_bit(args[0], !self.read_bit(args[0]))?,

            Op::Swap => self.set_acc(self.acc().rotate_left(4))?,
            Op::Xch(x) => {
                let p = self.place(x, args);
                let v = self.get(p);
                self.put(p, self.acc())?;
                self.set_acc(v)?;
            }
            Op::Xchd(i) => {
                let a = self.acc();
                let v = self.deref_bank(i)?;
                self.assign_through_bank(i, (v & 0xF0) | (a & 0x0F))?;
                self.set_acc((a & 0xF0) | (v & 0x0F))?;
            }

            Op::Push => {
                let sp = self.sfr(Sfr::Sp).wrapping_add(1);
                self.set_sfr(Sfr::Sp, sp)?;
                let v = self.read(args[0]);
                self.write(sp, v)?;
            }
            Op::Pop => {
                let v = self.read(self.sfr(Sfr::Sp));
                self.write(args[0], v)?;
                let sp = self.sfr(Sfr::Sp).wrapping_sub(1);
                self.set_sfr(Sfr::Sp, sp)?;
            }

            Op::Ajmp
            | Op::Acall
            | Op::Ljmp
            | Op::Lcall
            | Op::Ret
            | Op::Reti
            | Op::Sjmp
            | Op::JmpDptr
            | Op::Jc
            | Op::Jnc
            | Op::Jz
            | Op::Jnz
            | Op::Jb
            | Op::Jnb
            | Op::Jbc
            | Op::Cjne { .. }
            | Op::Djnz(_)
            | Op::Addc(_)
            | Op::Subb(_)
            | Op::Mul
            | Op::Div
            | Op::Da
            | Op::MovcPc
            | Op::MovcDptr
            | Op::Movx { .. } => return Err(Fault::Unimplemented(opcode)),
        }
        Ok(())
    }
}
