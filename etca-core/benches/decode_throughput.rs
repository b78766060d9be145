use criterion::{black_box, criterion_group, criterion_main, Criterion};
use etca_core::prelude::*;

fn sample_program() -> Vec<u8> {
    let mut bytes = Vec::new();
    for i in 0..64u8 {
        // addx %rx<i%8>, %rx<(i+1)%8>
        let a = i % 8;
        let b = (i + 1) % 8;
        bytes.push(0b00_01_0000 | 0);
        bytes.push((a << 5) | (b << 2));
    }
    bytes.push(0b1000_1110);
    bytes.push(0b0000_0000); // hlt
    bytes
}

fn criterion_benchmark(c: &mut Criterion) {
    let program = sample_program();
    let program = black_box(program);

    c.bench_function("linear_disassemble_64_instructions", |b| {
        b.iter(|| {
            let mut ctx = ParseContext::from_bytes(&program);
            let instrs = black_box(linear_disassemble(&mut ctx, 0)).unwrap();
            black_box(instrs.len())
        });
    });

    c.bench_function("decode_single_instruction", |b| {
        b.iter(|| {
            let mut ctx = ParseContext::from_bytes(&program);
            black_box(decode(&mut ctx)).unwrap()
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
