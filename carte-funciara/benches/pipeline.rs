//! Benchmarks pour la reprojection et le pipeline complet

use carte_funciara::{ParcelCollection, ParcelRecord, Pipeline, PipelineConfig, Reprojector};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Parcelles synthétiques : carrés de 20 m répartis autour de Bucarest
fn synthetic_parcels(count: usize, vertices: usize) -> Vec<ParcelRecord> {
    (0..count)
        .map(|i| {
            let x0 = 580000.0 + (i % 100) as f64 * 25.0;
            let y0 = 320000.0 + (i / 100) as f64 * 25.0;
            let points = (0..vertices)
                .map(|k| {
                    let angle = k as f64 / vertices as f64 * std::f64::consts::TAU;
                    [x0 + 10.0 * angle.cos(), y0 + 10.0 * angle.sin()]
                })
                .collect();
            ParcelRecord {
                nr_cadastral: Some(100000 + i as i64),
                proprietar: Some(format!("Proprietar {}", i)),
                localitate: Some("București".to_string()),
                points_xy: points,
                ..Default::default()
            }
        })
        .collect()
}

fn bench_reproject_point(c: &mut Criterion) {
    let reprojector = Reprojector::new("EPSG:3844", "EPSG:4326").unwrap();

    let mut group = c.benchmark_group("reproject");
    group.throughput(Throughput::Elements(1));
    group.bench_function("stereo70_to_wgs84", |b| {
        b.iter(|| {
            let result = reprojector
                .transform_point(black_box(588000.0), black_box(327000.0))
                .unwrap();
            black_box(result)
        })
    });
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);

    for count in [100usize, 1000, 10000] {
        let collection =
            ParcelCollection::new(Some("EPSG:3844".to_string()), synthetic_parcels(count, 12));
        let pipeline = Pipeline::new(PipelineConfig {
            include_label_points: true,
            ..Default::default()
        });

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &collection, |b, c| {
            b.iter(|| {
                let output = pipeline.run(black_box(c));
                black_box(output.is_complete())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reproject_point, bench_pipeline);
criterion_main!(benches);
