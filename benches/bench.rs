// Criterion benchmarks for Spark Match

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use spark_match::core::distance::{calculate_bounding_box, haversine_distance, within_radius};
use spark_match::core::CandidateFilter;
use spark_match::models::{Coordinate, UserProfile};
use std::collections::{BTreeSet, HashSet};

fn create_candidate(id: i64, lat: f64, lon: f64) -> UserProfile {
    UserProfile {
        id,
        name: format!("User {}", id),
        age: 25 + (id % 10) as u8,
        gender: if id % 2 == 0 { "female" } else { "male" }.to_string(),
        looking_for: if id % 3 == 0 { "female" } else { "male" }.to_string(),
        location: Some(Coordinate::new(lat, lon)),
        is_active: id % 7 != 0,
        is_online: false,
        last_seen: None,
        last_active: None,
        bio: None,
        interests: BTreeSet::from(["tennis".to_string()]),
    }
}

fn create_user() -> UserProfile {
    let mut user = create_candidate(0, 40.7128, -74.0060);
    user.age = 28;
    user.gender = "male".to_string();
    user.looking_for = "female".to_string();
    user.is_active = true;
    user
}

fn population(size: i64) -> Vec<UserProfile> {
    (1..=size)
        .map(|i| {
            let lat_offset = (i as f64 * 0.001) % 0.5;
            let lon_offset = (i as f64 * 0.001) % 0.5;
            create_candidate(i, 40.7128 + lat_offset, -74.0060 + lon_offset)
        })
        .collect()
}

fn bench_haversine_distance(c: &mut Criterion) {
    c.bench_function("haversine_distance", |b| {
        b.iter(|| {
            haversine_distance(
                black_box(40.7128),
                black_box(-74.0060),
                black_box(40.72),
                black_box(-74.01),
            )
        });
    });
}

fn bench_within_radius(c: &mut Criterion) {
    let center = Coordinate::new(40.7128, -74.0060);
    let near = Coordinate::new(40.72, -74.01);
    let far = Coordinate::new(51.5074, -0.1278);

    c.bench_function("bounding_box_calculation", |b| {
        b.iter(|| calculate_bounding_box(black_box(40.7128), black_box(-74.0060), black_box(50.0)));
    });

    c.bench_function("within_radius_near", |b| {
        b.iter(|| within_radius(black_box(&center), black_box(&near), black_box(50.0)));
    });

    c.bench_function("within_radius_far", |b| {
        b.iter(|| within_radius(black_box(&center), black_box(&far), black_box(50.0)));
    });
}

fn bench_find_candidates(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_candidates");
    let user = create_user();
    let excluded: HashSet<i64> = (1..50).collect();

    for size in [100, 1_000, 10_000] {
        let candidates = population(size);

        for (label, filter) in [
            ("no_radius", CandidateFilter::default()),
            ("radius_25km", CandidateFilter::new(5, Some(25.0))),
        ] {
            group.bench_with_input(BenchmarkId::new(label, size), &candidates, |b, candidates| {
                b.iter(|| {
                    let found: Vec<_> = filter
                        .find_candidates(&user, candidates.clone(), &excluded)
                        .take(20)
                        .collect();
                    black_box(found)
                });
            });
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_haversine_distance,
    bench_within_radius,
    bench_find_candidates
);

criterion_main!(benches);
