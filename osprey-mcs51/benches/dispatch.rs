use criterion::{Criterion, criterion_group, criterion_main};
use osprey_mcs51::Machine;
use std::hint::black_box;

/// Tight block of register, indirect, and stack traffic
#[rustfmt::skip]
const PROGRAM: [u8; 16] = [
    0x78, 0x30,       // MOV R0,#0x30
    0xe6,             // MOV A,@R0
    0x24, 0x01,       // ADD A,#1
    0xf6,             // MOV @R0,A
    0x33,             // RLC A
    0xc0, 0xe0,       // PUSH ACC
    0xd0, 0x31,       // POP 0x31
    0x62, 0x31,       // XRL 0x31,A
    0xc4,             // SWAP A
    0x08,             // INC R0
    0x00,             // NOP
];

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut m = Machine::new();
    m.load(&PROGRAM).unwrap();

    c.bench_function("run", |b| {
        b.iter(|| {
            m.reset();
            black_box(m.run(black_box(usize::MAX)).unwrap())
        })
    });

    c.bench_function("execute", |b| {
        m.reset();
        b.iter(|| {
            m.set_pc(0);
            m.execute(black_box(&[0x24, 0x01])).unwrap()
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
