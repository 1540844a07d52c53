use std::{hint::black_box, io::Cursor};

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use seisan_core::{
    binary::encode_record, normalize_samples, DecodeOptions, MseedPacker, PackParams, Packer,
    RecordReader, SeisanReader, TraceGroup,
};
use seisan_types::{ByteOrder, FormatVariant, SeisanFormat};

const SAMPLES: usize = 100_000;

/// Сигнал, похожий на сейсмический: медленный дрейф плюс мелкие колебания.
fn seismic_samples(n: usize) -> Vec<i32> {
    (0..n)
        .map(|i| {
            let drift = (i as f64 * 0.05).sin() * 50.0;
            let noise = (i as f64 * 1.7).sin() * 10.0;
            1000 + drift as i32 + noise as i32
        })
        .collect()
}

fn seisan_file(samples: &[i32]) -> Vec<u8> {
    let mut out = Vec::new();

    // Первая строка главного заголовка (80 байт) определяет формат
    let mut line = vec![b' '; 80];
    line[1..6].copy_from_slice(b"BENCH");
    encode_record(&mut out, FormatVariant::Standard, ByteOrder::Native, &line).unwrap();

    let mut header = vec![b' '; 1040];
    let count = format!("{:7}", samples.len());
    for (off, text) in [
        (0, "BENCH"),
        (5, "S  Z"),
        (9, "124"),
        (13, "100"),
        (23, "12"),
        (26, " 0"),
        (29, " 0.000"),
        (36, "  100.0"),
        (43, count.as_str()),
        (76, "4"),
    ] {
        header[off..off + text.len()].copy_from_slice(text.as_bytes());
    }
    encode_record(&mut out, FormatVariant::Standard, ByteOrder::Native, &header).unwrap();

    let data: Vec<u8> = samples.iter().flat_map(|s| s.to_ne_bytes()).collect();
    for chunk in data.chunks(4096) {
        encode_record(&mut out, FormatVariant::Standard, ByteOrder::Native, chunk).unwrap();
    }
    out
}

fn bench_normalize(c: &mut Criterion) {
    let raw: Vec<u8> = seismic_samples(SAMPLES)
        .iter()
        .flat_map(|s| s.to_ne_bytes())
        .collect();

    let mut group = c.benchmark_group("normalize");
    group.throughput(Throughput::Elements(SAMPLES as u64));

    group.bench_function("int32_native", |b| {
        b.iter(|| normalize_samples(black_box(&raw), 4, ByteOrder::Native).unwrap())
    });
    group.bench_function("int32_swapped", |b| {
        b.iter(|| normalize_samples(black_box(&raw), 4, ByteOrder::Swapped).unwrap())
    });
    group.bench_function("int16_swapped", |b| {
        b.iter(|| normalize_samples(black_box(&raw), 2, ByteOrder::Swapped).unwrap())
    });
    group.finish();
}

fn bench_framing(c: &mut Criterion) {
    let bytes = seisan_file(&seismic_samples(SAMPLES));
    let format = SeisanFormat {
        variant: FormatVariant::Standard,
        byte_order: ByteOrder::Native,
    };

    let mut group = c.benchmark_group("framing");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("record_reader", |b| {
        b.iter(|| {
            let mut reader = RecordReader::new(Cursor::new(black_box(&bytes)), format).unwrap();
            let mut total = 0usize;
            while let Some(rec) = reader.next_record(None).unwrap() {
                total += rec.data.len();
            }
            total
        })
    });

    let opts = DecodeOptions::default();
    group.bench_function("decode_file", |b| {
        b.iter(|| {
            let mut traces = TraceGroup::new(false);
            for block in SeisanReader::new(Cursor::new(black_box(&bytes)), &opts).unwrap() {
                traces.add_block(block.unwrap());
            }
            traces.total_samples()
        })
    });
    group.finish();
}

fn bench_pack(c: &mut Criterion) {
    let bytes = seisan_file(&seismic_samples(SAMPLES));
    let opts = DecodeOptions::default();

    let mut group = c.benchmark_group("pack");
    group.throughput(Throughput::Elements(SAMPLES as u64));

    group.bench_function("int32_4096", |b| {
        b.iter(|| {
            let mut traces = TraceGroup::new(false);
            for block in SeisanReader::new(Cursor::new(&bytes), &opts).unwrap() {
                traces.add_block(block.unwrap());
            }

            let mut packer = MseedPacker::new(Vec::new(), PackParams::default()).unwrap();
            for trace in traces.iter_mut() {
                packer.pack(trace, true).unwrap();
            }
            packer.into_inner().len()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_normalize, bench_framing, bench_pack);
criterion_main!(benches);
