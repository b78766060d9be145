use clap::Parser;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use etca_cli::{Cli, DisasmConfig};

fn sample_hex() -> String {
    let mut bytes = Vec::new();
    for i in 0..32u8 {
        let a = i % 8;
        let b = (i + 1) % 8;
        bytes.push(0b00_01_0000);
        bytes.push((a << 5) | (b << 2));
    }
    bytes.push(0b1000_1110);
    bytes.push(0b0000_0000);
    hex::encode(bytes)
}

fn criterion_benchmark(c: &mut Criterion) {
    let hex_code = black_box(sample_hex());

    c.bench_function("cli_parse_and_build_config", |b| {
        b.iter(|| {
            let cli = Cli::try_parse_from(["etca-dis", "--hex", &hex_code]).unwrap();
            let config = black_box(DisasmConfig::from_cli(&cli)).unwrap();
            black_box(config.bytes.len())
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
