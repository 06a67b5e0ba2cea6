mod support;

use safiri_core::ecs::{VehicleClass, VehicleId};
use safiri_core::error::ConfigError;
use safiri_core::pricing::FareConfig;
use safiri_core::trip::TripPhase;
use safiri_core::SessionConfig;

use support::fleet::{car_at, FAR_AWAY, NEARBY};
use support::session::{priced_session, TestSessionBuilder};

#[test]
fn json_config_drives_dispatch_timing_and_fares() {
    let config = SessionConfig::from_json_str(
        r#"{
            "trip": { "dispatch_delay_ms": 500, "rider_name": "Wanjiru" },
            "fares": { "car_rate_per_km": 200.0 }
        }"#,
    )
    .expect("valid config");
    let session = TestSessionBuilder::new()
        .with_config(config)
        .with_fleet(vec![car_at(1, NEARBY)])
        .build();
    let mut session = priced_session(session);
    assert_eq!(session.trip().quote.expect("quote").car.fare, 640);

    session.request_ride(VehicleClass::Car).expect("ride requested");
    session.advance(500);
    assert_eq!(session.trip_phase(), TripPhase::DriverConfirmed);
    let offer = &session.incoming_trips(VehicleId(1))[0];
    assert_eq!(offer.rider, "Wanjiru");
    assert_eq!(offer.fare.fare, 640);
}

#[test]
fn widened_match_radius_reaches_distant_vehicles() {
    let config = SessionConfig::default().with_max_match_radius_km(50.0);
    let session = TestSessionBuilder::new()
        .with_config(config)
        .with_fleet(vec![car_at(3, FAR_AWAY)])
        .build();
    let mut session = priced_session(session);
    session.request_ride(VehicleClass::Car).expect("ride requested");
    session.advance(2_000);
    assert_eq!(
        session.trip().matched.expect("driver").vehicle_id,
        VehicleId(3)
    );
}

#[test]
fn custom_currency_flows_into_quotes() {
    let fares = FareConfig {
        currency: "USD".to_string(),
        car_rate_per_km: 1.0,
        bike_rate_per_km: 0.5,
        ..FareConfig::default()
    };
    let config = SessionConfig::default().with_fares(fares);
    let session = priced_session(TestSessionBuilder::new().with_config(config).build());
    let quote = session.trip().quote.expect("quote");
    assert_eq!(quote.car.to_string(), "USD 3");
    assert_eq!(quote.bike.to_string(), "USD 2");
}

#[test]
fn unknown_shapes_are_rejected() {
    let err = SessionConfig::from_json_str(r#"{ "debounce_ms": "soon" }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
