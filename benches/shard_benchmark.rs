use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gnindex::core::types::{Record, RecordKind};
use gnindex::parallel::indexer::{commit_lock, index_shard, ShardJob};
use gnindex::parallel::merger::Compactor;
use gnindex::schema::mapping::DocumentMapper;
use gnindex::schema::schema::RecordSchema;
use gnindex::source::annotation::AnnotationCache;
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

const WORDS: [&str; 12] = [
    "sonic", "hedgehog", "limb", "patterning", "kinase", "receptor",
    "hippocampus", "expression", "liver", "transcript", "binding", "protein",
];

/// Helper to create a random gene row
fn random_gene(id: usize) -> Record {
    let mut rng = rand::thread_rng();
    let description: String = (0..20)
        .map(|_| WORDS[rng.gen_range(0..WORDS.len())])
        .collect::<Vec<_>>()
        .join(" ");

    Record::new()
        .with("name", format!("{}_at", id))
        .with("dataset", format!("DS{}", id % 7))
        .with("species", "mouse")
        .with("group", "BXD")
        .with("tissue", "Hippocampus")
        .with("symbol", format!("Gene{}", id % 500))
        .with("chr", rng.gen_range(1..20i64).to_string())
        .with("description", description)
        .with("mean", rng.gen_range(0.0..15.0f64))
        .with("lrs", rng.gen_range(0.0..40.0f64))
        .with("mb", rng.gen_range(0.0..200.0f64))
}

fn annotations() -> AnnotationCache {
    (0..500)
        .map(|i| ("mouse".to_string(), format!("Gene{}", i), "binding protein in liver".to_string()))
        .collect()
}

/// Benchmark record-to-document mapping alone
fn bench_mapping(c: &mut Criterion) {
    let schema = RecordSchema::genes();
    let cache = annotations();
    let records: Vec<Record> = (0..1000).map(random_gene).collect();

    let mut group = c.benchmark_group("mapping");
    group.throughput(Throughput::Elements(records.len() as u64));
    group.bench_function("genes_1000", |b| {
        let mut mapper = DocumentMapper::new(&schema, &cache);
        b.iter(|| {
            for record in &records {
                black_box(mapper.map(record).unwrap());
            }
        });
    });
    group.finish();
}

/// Benchmark building one committed shard
fn bench_shard(c: &mut Criterion) {
    let cache = Arc::new(annotations());
    let lock = commit_lock();
    let mut group = c.benchmark_group("index_shard");
    group.sample_size(10);

    for batch_size in [100, 1000, 5000].iter() {
        let records: Vec<Record> = (0..*batch_size).map(random_gene).collect();
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch_size), batch_size, |b, _| {
            b.iter_with_setup(
                || TempDir::new().unwrap(),
                |dir| {
                    let job = ShardJob {
                        kind: RecordKind::Gene,
                        chunk: 0,
                        path: dir.path().join("00000"),
                        records: records.clone(),
                        annotations: Arc::clone(&cache),
                        commit_lock: Arc::clone(&lock),
                    };
                    black_box(index_shard(job).unwrap());
                },
            );
        });
    }
    group.finish();
}

/// Benchmark compacting a run's worth of shards
fn bench_compaction(c: &mut Criterion) {
    let cache = Arc::new(annotations());
    let lock = commit_lock();
    let shards_dir = TempDir::new().unwrap();
    let shards: Vec<PathBuf> = (0..16u64)
        .map(|chunk| {
            let job = ShardJob {
                kind: RecordKind::Gene,
                chunk,
                path: shards_dir.path().join(format!("{:05}", chunk)),
                records: (0..500).map(|i| random_gene(chunk as usize * 500 + i)).collect(),
                annotations: Arc::clone(&cache),
                commit_lock: Arc::clone(&lock),
            };
            index_shard(job).unwrap().path
        })
        .collect();

    let mut group = c.benchmark_group("compaction");
    group.sample_size(10);
    for fan_in in [2, 8, 16].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(fan_in), fan_in, |b, &fan_in| {
            b.iter_with_setup(
                || TempDir::new().unwrap(),
                |dest| {
                    let mut combined = Compactor::new(fan_in)
                        .compact(&shards, &dest.path().join("combined"))
                        .unwrap();
                    black_box(combined.commit().unwrap());
                },
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_mapping, bench_shard, bench_compaction);
criterion_main!(benches);
