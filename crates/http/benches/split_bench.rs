use std::hint::black_box;
use std::io;

use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use futures::executor::block_on;
use futures::{StreamExt, TryStreamExt};
use slice_http::split::Split;

const DELIMITER: &str = "--boundary-7d3f--";

fn multipart_like(parts: usize, part_size: usize) -> Vec<u8> {
    let mut input = Vec::with_capacity(parts * (part_size + DELIMITER.len()));
    for i in 0..parts {
        if i > 0 {
            input.extend_from_slice(DELIMITER.as_bytes());
        }
        input.extend((0..part_size).map(|n| b'a' + u8::try_from(n % 26).unwrap_or(0)));
    }
    input
}

fn bench_push(c: &mut Criterion) {
    let input = multipart_like(64, 4 * 1024);
    let mut group = c.benchmark_group("split_push");
    group.throughput(Throughput::Bytes(input.len() as u64));

    for chunk_size in [64, 1024, 16 * 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(chunk_size), &chunk_size, |b, &chunk_size| {
            b.iter(|| {
                let mut split = Split::new(DELIMITER).unwrap();
                let mut segments = 0_usize;
                let mut receiver = |bytes: Bytes, last: bool| {
                    black_box(bytes);
                    if last {
                        segments += 1;
                    }
                };
                for chunk in input.chunks(chunk_size) {
                    split.push(chunk, &mut receiver);
                }
                split.complete(&mut receiver);
                black_box(segments);
            });
        });
    }
    group.finish();
}

fn bench_stream(c: &mut Criterion) {
    let input = Bytes::from(multipart_like(64, 4 * 1024));
    let mut group = c.benchmark_group("split_stream");
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("segments_of_segments", |b| {
        b.iter(|| {
            let chunks = (0..input.len())
                .step_by(1024)
                .map(|start| Ok::<_, io::Error>(input.slice(start..(start + 1024).min(input.len()))))
                .collect::<Vec<_>>();
            let mut segments = Split::new(DELIMITER).unwrap().split(futures::stream::iter(chunks));

            block_on(async {
                let mut size = 0_usize;
                while let Some(segment) = segments.next().await {
                    let segment = segment.unwrap();
                    size += segment.try_fold(0, |acc, bytes| async move { Ok(acc + bytes.len()) }).await.unwrap();
                }
                black_box(size);
            });
        });
    });
    group.finish();
}

criterion_group!(benches, bench_push, bench_stream);
criterion_main!(benches);
