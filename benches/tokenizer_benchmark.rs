use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use csvstream::encoding::lookup;
use csvstream::{CsvEncoder, CsvParser, CsvReader, Tokenizer};
use std::io::Cursor;

fn sample_lines(size: usize) -> String {
    let encoder = CsvEncoder::default();
    let mut data = String::new();
    for i in 0..size {
        let note = if i % 10 == 0 {
            format!("multi\r\nline \"{}\"", i)
        } else {
            format!("Name_{}", i)
        };
        data.push_str(&encoder.encode_line(&[i.to_string(), note, (i * 100).to_string()]));
    }
    data
}

fn benchmark_tokenize(c: &mut Criterion) {
    let tokenizer = Tokenizer::default();
    let records = [
        ("plain", "1,Tanaka,30,Tokyo,2024-01-01\r\n"),
        ("quoted", "1,\"Tanaka, Taro\",\"He said \"\"hi\"\"\",Tokyo\r\n"),
        ("multibyte", "1,田中太郎,東京都千代田区,\"「引用」\"\r\n"),
    ];

    let mut group = c.benchmark_group("tokenize");
    for (name, record) in records {
        group.bench_with_input(BenchmarkId::from_parameter(name), record, |b, record| {
            b.iter(|| black_box(tokenizer.tokenize(black_box(record))));
        });
    }
    group.finish();
}

fn benchmark_reader(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");

    for size in [1000, 10000, 100000].iter() {
        let data = sample_lines(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| {
                let mut reader = CsvReader::new(Cursor::new(data.as_bytes()));
                for record in reader.records() {
                    black_box(record.unwrap());
                }
            });
        });
    }

    group.finish();
}

fn benchmark_transcode(c: &mut Criterion) {
    let mut group = c.benchmark_group("transcode");
    let data = sample_lines(10000).replace("Name", "名前");
    let (sjis, _, _) = lookup("SJIS").unwrap().encode(&data);

    for (name, input) in [("explicit", Some("SJIS")), ("auto", None)] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut parser = CsvParser::new();
                parser.set_config("input_encoding", input).unwrap();
                parser.set_config("output_encoding", "UTF-8").unwrap();
                let mut reader = CsvReader::with_parser(Cursor::new(&sjis[..]), parser);
                for record in reader.records() {
                    black_box(record.unwrap());
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_tokenize,
    benchmark_reader,
    benchmark_transcode
);
criterion_main!(benches);
