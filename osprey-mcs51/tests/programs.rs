use osprey_mcs51::{Fault, Machine, SP_RESET, Sfr};

fn run(rom: &[u8]) -> Machine {
    let mut m = Machine::new();
    m.reset();
    m.load(rom).expect("could not load program");
    let n = m.run(usize::MAX).expect("program faulted");
    assert_eq!(usize::from(m.pc()), rom.len());
    assert!(n > 0);
    m
}

#[test]
fn fill_with_indirect_stores() {
    #[rustfmt::skip]
    let rom = [
        0x78, 0x30,       // MOV R0,#0x30
        0x74, 0xa0,       // MOV A,#0xa0
        0xf6, 0x08, 0x04, // MOV @R0,A ; INC R0 ; INC A
        0xf6, 0x08, 0x04,
        0xf6, 0x08, 0x04,
        0xf6, 0x08, 0x04,
    ];
    let m = run(&rom);
    assert_eq!(&m.data()[0x30..0x34], &[0xa0, 0xa1, 0xa2, 0xa3]);
    assert_eq!(m.read(0x00), 0x34);
    assert_eq!(m.sfr(Sfr::Acc), 0xa4);
}

#[test]
fn swap_through_the_stack() {
    #[rustfmt::skip]
    let rom = [
        0x75, 0x40, 0x11, // MOV 0x40,#0x11
        0x75, 0x41, 0x22, // MOV 0x41,#0x22
        0xc0, 0x40,       // PUSH 0x40
        0xc0, 0x41,       // PUSH 0x41
        0xd0, 0x40,       // POP 0x40
        0xd0, 0x41,       // POP 0x41
    ];
    let m = run(&rom);
    assert_eq!(m.read(0x40), 0x22);
    assert_eq!(m.read(0x41), 0x11);
    assert_eq!(m.sfr(Sfr::Sp), SP_RESET);
}

#[test]
fn bank_switch_mid_program() {
    #[rustfmt::skip]
    let rom = [
        0x7f, 0xaa,       // MOV R7,#0xaa
        0xd2, 0xd4,       // SETB RS1
        0x7f, 0xbb,       // MOV R7,#0xbb
        0xef,             // MOV A,R7
        0xc2, 0xd4,       // CLR RS1
        0x2f,             // ADD A,R7
    ];
    let m = run(&rom);
    assert_eq!(m.read(0x07), 0xaa);
    assert_eq!(m.read(0x17), 0xbb);
    assert_eq!(m.sfr(Sfr::Acc), 0x65);
    assert_eq!(m.active_bank(), 0);
}

#[test]
fn fault_stops_the_run() {
    let mut m = Machine::new();
    m.load(&[0x04, 0x04, 0x80, 0xfe, 0x04]).unwrap();
    let err = m.run(usize::MAX).unwrap_err();
    assert_eq!(
        err,
        Fault::Eval {
            opcode: 0x80,
            source: Box::new(Fault::Unimplemented(0x80))
        }
    );
    assert_eq!(m.pc(), 2);
    assert_eq!(m.sfr(Sfr::Acc), 2);
}

#[test]
fn oversized_program() {
    let mut m = Machine::new();
    let rom = vec![0u8; osprey_mcs51::PROGRAM_SIZE + 1];
    assert_eq!(m.load(&rom), Err(Fault::ProgramTooLarge(rom.len())));
    assert!(m.program().is_empty());
}

#[test]
fn listing_matches_execution() {
    #[rustfmt::skip]
    let rom = [0x74, 0x01, 0x23, 0x23, 0xf5, 0x50, 0x00];
    let m = run(&rom);
    assert_eq!(m.read(0x50), 0x04);

    let mnemonics: Vec<_> = m
        .disassemble(0)
        .map(|i| i.mnemonic().to_owned())
        .collect();
    assert_eq!(
        mnemonics,
        ["MOV A,#data", "RL A", "RL A", "MOV direct,A", "NOP"]
    );
}
