//! Performance benchmarks for safiri_core using Criterion.rs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use safiri_core::ecs::{VehicleClass, VehicleId, VehicleStatus};
use safiri_core::fleet::{generate_fleet, FleetParams};
use safiri_core::matching::{find_nearest, FleetCandidate, DEFAULT_MAX_RADIUS_KM};
use safiri_core::test_helpers::SCENARIO_PICKUP;
use safiri_core::{MapSession, SessionConfig};

fn mounted_session(vehicles: u32) -> MapSession {
    let mut session = MapSession::with_defaults(SessionConfig::default());
    session.load_fleet(&generate_fleet(&FleetParams {
        count: vehicles,
        ..FleetParams::default()
    }));
    session.mount_map();
    // Let every patrol route resolve before measuring frames.
    session.advance(1_000);
    session
}

fn bench_animation_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("animation_frames");
    for vehicles in [5u32, 100, 1_000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(vehicles),
            &vehicles,
            |b, &vehicles| {
                let mut session = mounted_session(vehicles);
                // One second of display frames per iteration.
                b.iter(|| black_box(session.advance(1_000)));
            },
        );
    }
    group.finish();
}

fn bench_nearest_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_matching");
    for size in [100u32, 10_000] {
        let fleet: Vec<FleetCandidate> = generate_fleet(&FleetParams {
            count: size,
            spread_deg: 0.3,
            ..FleetParams::default()
        })
        .into_iter()
        .map(|record| FleetCandidate {
            id: record.id,
            class: record.class,
            status: record.status,
            position: record.start,
        })
        .collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &fleet, |b, fleet| {
            b.iter(|| {
                black_box(find_nearest(
                    fleet,
                    SCENARIO_PICKUP,
                    VehicleClass::Car,
                    DEFAULT_MAX_RADIUS_KM,
                ))
            });
        });
    }
    group.finish();
}

fn bench_dispatch_round_trip(c: &mut Criterion) {
    c.bench_function("price_and_dispatch_100_vehicles", |b| {
        b.iter(|| {
            let mut session = mounted_session(100);
            session.set_pickup(safiri_core::trip::Location::new("CBD", SCENARIO_PICKUP));
            session.set_destination(safiri_core::trip::Location::new(
                "Westlands",
                safiri_core::geo::Coordinate::new(-1.2676, 36.8108),
            ));
            let _ = session.request_price();
            session.advance(1_000);
            let _ = session.request_ride(VehicleClass::Car);
            session.advance(2_000);
            black_box(
                session
                    .vehicles()
                    .iter()
                    .filter(|v| v.status == VehicleStatus::Busy)
                    .map(|v| v.id)
                    .collect::<Vec<VehicleId>>(),
            )
        });
    });
}

criterion_group!(
    benches,
    bench_animation_frames,
    bench_nearest_matching,
    bench_dispatch_round_trip
);
criterion_main!(benches);
