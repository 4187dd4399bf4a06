//! Integration tests for horizon crossings and night window construction.

mod support;

use proptest::prelude::*;

use staralt::geometry::MeeusGeometry;
use staralt::models::{Instant, ObservabilityThresholds, Site, Target, Twilight};
use staralt::services::{
    build_track, compute_night_window, Body, CrossingMode, CrossingSearch, HorizonSolver,
};
use staralt::StaraltError;
use support::{at, geometry, seven_dt};

/// Test that the civil sunrise is the first rising 0° crossing after the reference
#[test]
fn test_sunrise_civil_matches_minute_scan() {
    let geometry = geometry();
    let site = seven_dt();
    let solver = HorizonSolver::new(&geometry, &site);
    let reference = at("2024-01-25T20:00:00Z");

    let window = compute_night_window(&solver, reference).unwrap();
    let sunrise_civil = window.sunrise_civil.unwrap();

    // Walk forward minute by minute until the sun climbs through 0°.
    let mut previous = reference;
    let mut previous_alt = solver.altitude(Body::Sun, previous).unwrap();
    let crossing_minute = loop {
        let next = previous.offset_seconds(60.0);
        let alt = solver.altitude(Body::Sun, next).unwrap();
        if previous_alt < 0.0 && alt >= 0.0 {
            break next;
        }
        assert!(next.seconds_since(reference) < 36.0 * 3600.0, "no sunrise found");
        previous = next;
        previous_alt = alt;
    };

    assert!(sunrise_civil > crossing_minute.offset_seconds(-61.0));
    assert!(sunrise_civil <= crossing_minute.offset_seconds(1.0));
}

/// Test that the civil sunset is the most recent setting 0° crossing before the sunrise
#[test]
fn test_sunset_civil_precedes_sunrise() {
    let geometry = geometry();
    let site = seven_dt();
    let solver = HorizonSolver::new(&geometry, &site);
    let window = compute_night_window(&solver, at("2024-01-25T20:00:00Z")).unwrap();

    let sunset_civil = window.sunset_civil.unwrap();
    let sunrise_civil = window.sunrise_civil.unwrap();
    assert!(sunset_civil < sunrise_civil);

    // The sun stays below the horizon between the two.
    let mut t = sunset_civil.offset_seconds(120.0);
    while t < sunrise_civil.offset_seconds(-120.0) {
        assert!(solver.altitude(Body::Sun, t).unwrap() < 0.0, "sun up at {}", t);
        t = t.offset_seconds(600.0);
    }
    // And is above it shortly before the sunset.
    assert!(solver.altitude(Body::Sun, sunset_civil.offset_seconds(-300.0)).unwrap() > 0.0);
}

#[test]
fn test_7dt_window_is_fully_ordered() {
    let geometry = geometry();
    let site = seven_dt();
    let solver = HorizonSolver::new(&geometry, &site);
    let w = compute_night_window(&solver, at("2024-01-25T20:00:00Z")).unwrap();

    let sets = [w.sunset_civil, w.sunset_nautical, w.sunset_astro, w.sunset_night];
    let rises = [w.sunrise_civil, w.sunrise_nautical, w.sunrise_astro, w.sunrise_night];
    let sets: Vec<Instant> = sets.iter().map(|t| t.unwrap()).collect();
    let rises: Vec<Instant> = rises.iter().map(|t| t.unwrap()).collect();

    assert!(sets.windows(2).all(|p| p[0] <= p[1]), "{:?}", sets);
    assert!(rises.windows(2).all(|p| p[0] >= p[1]), "{:?}", rises);
    assert!(w.sunset_night.unwrap() <= w.sunrise_night.unwrap());

    // Each boundary sits on its horizon.
    for level in Twilight::ALL {
        let (set, rise) = w.bounds(level).unwrap();
        for t in [set, rise] {
            let alt = solver.altitude(Body::Sun, t).unwrap();
            assert!((alt - level.horizon_deg()).abs() < 0.01, "{:?} at {}: {}", level, t, alt);
        }
    }
}

#[test]
fn test_crossing_stable_across_step_sizes() {
    let geometry = geometry();
    let site = seven_dt();
    let reference = at("2024-01-25T20:00:00Z");

    let coarse = HorizonSolver::new(&geometry, &site);
    let fine = HorizonSolver::new(&geometry, &site).with_search(CrossingSearch {
        step_seconds: 300.0,
        ..CrossingSearch::default()
    });

    for (horizon, rising) in [(0.0, true), (-18.0, false), (-12.0, true)] {
        let a = coarse
            .find_crossing(Body::Sun, reference, horizon, CrossingMode::Next, rising)
            .unwrap()
            .unwrap();
        let b = fine
            .find_crossing(Body::Sun, reference, horizon, CrossingMode::Next, rising)
            .unwrap()
            .unwrap();
        assert!(a.seconds_since(b).abs() <= 1.0, "{} vs {}", a, b);
    }
}

#[test]
fn test_moon_crossings_found() {
    let geometry = geometry();
    let site = seven_dt();
    let solver = HorizonSolver::new(&geometry, &site);
    let reference = at("2024-01-25T20:00:00Z");

    let rise = solver.moon_rise_time(reference, CrossingMode::Nearest, 0.0).unwrap();
    let set = solver.moon_set_time(reference, CrossingMode::Nearest, 0.0).unwrap();
    assert!(rise.is_some());
    assert!(set.is_some());
    assert_ne!(rise, set);
}

#[test]
fn test_polar_summer_track_is_degenerate() {
    let geometry = geometry();
    for latitude in [65.0, 78.0] {
        let site = Site::new(latitude, 15.0, 0.0, "UTC", "", "").unwrap();
        let solver = HorizonSolver::new(&geometry, &site);
        let window = compute_night_window(&solver, at("2024-06-20T12:00:00Z")).unwrap();
        assert!(window.is_degenerate(), "lat {}: {:?}", latitude, window);

        let target = Target::new(250.0, 40.0, None).unwrap();
        let err = build_track(
            &geometry,
            &site,
            &target,
            &window,
            ObservabilityThresholds::default(),
            Some(window.reference),
        )
        .unwrap_err();
        assert!(matches!(err, StaraltError::DegenerateWindow(_)), "lat {}", latitude);
    }
}

#[test]
fn test_midsummer_without_night_grade_darkness_fails_track() {
    // At 50°N on the June solstice the sun bottoms out near -16.6°:
    // astronomical twilight exists but the -18° night does not.
    let geometry = geometry();
    let site = Site::new(50.0, 10.0, 0.0, "UTC", "", "").unwrap();
    let solver = HorizonSolver::new(&geometry, &site);
    let window = compute_night_window(&solver, at("2024-06-20T12:00:00Z")).unwrap();
    assert!(window.astronomical_bounds().is_some(), "{:?}", window);
    assert!(window.night_bounds().is_none(), "{:?}", window);
    assert!(window.is_degenerate());

    let err = build_track(
        &geometry,
        &site,
        &Target::new(250.0, 40.0, None).unwrap(),
        &window,
        ObservabilityThresholds::default(),
        Some(window.reference),
    )
    .unwrap_err();
    assert!(matches!(err, StaraltError::DegenerateWindow(_)));
}

#[test]
fn test_polar_day_has_no_civil_boundaries() {
    let geometry = geometry();
    let site = Site::new(78.0, 15.0, 0.0, "UTC", "", "").unwrap();
    let solver = HorizonSolver::new(&geometry, &site);
    let window = compute_night_window(&solver, at("2024-06-20T12:00:00Z")).unwrap();
    for level in Twilight::ALL {
        assert_eq!(window.boundaries(level), (None, None), "{:?}", level);
    }
}

fn site_strategy() -> impl Strategy<Value = Site> {
    (-55.0..55.0f64, -180.0..180.0f64)
        .prop_map(|(lat, lon)| Site::new(lat, lon, 0.0, "UTC", "", "").unwrap())
}

/// Sites where the sun passes below -18° every night of the year.
fn dark_night_site_strategy() -> impl Strategy<Value = Site> {
    (-48.0..48.0f64, -180.0..180.0f64)
        .prop_map(|(lat, lon)| Site::new(lat, lon, 0.0, "UTC", "", "").unwrap())
}

fn instant_strategy() -> impl Strategy<Value = Instant> {
    // 2015-01-01 .. 2035-12-31
    (1_420_070_400i64..2_082_672_000i64)
        .prop_map(|secs| Instant::from_unix_timestamp(secs as f64).unwrap())
}

/// Anchor-then-chain crossings straight from the solver, without the nesting
/// guard applied by `compute_night_window`. Returns (sets, rises) ordered
/// civil to night, or `None` if any crossing is missing.
fn raw_crossing_chain(
    solver: &HorizonSolver<'_, MeeusGeometry>,
    reference: Instant,
) -> Option<(Vec<Instant>, Vec<Instant>)> {
    let anchor = solver
        .find_crossing(Body::Sun, reference, 0.0, CrossingMode::Next, true)
        .unwrap()?;
    let mut sets = vec![solver
        .find_crossing(Body::Sun, anchor, 0.0, CrossingMode::Previous, false)
        .unwrap()?];
    let mut rises = vec![anchor];
    for horizon in [-6.0, -12.0, -18.0] {
        sets.push(
            solver
                .find_crossing(Body::Sun, anchor, horizon, CrossingMode::Previous, false)
                .unwrap()?,
        );
        rises.push(
            solver
                .find_crossing(Body::Sun, anchor, horizon, CrossingMode::Previous, true)
                .unwrap()?,
        );
    }
    Some((sets, rises))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_raw_crossing_chain_is_ordered(
        site in dark_night_site_strategy(),
        reference in instant_strategy(),
    ) {
        let geometry = geometry();
        let solver = HorizonSolver::new(&geometry, &site);
        let chain = raw_crossing_chain(&solver, reference);
        prop_assert!(chain.is_some(), "missing crossing at {:?}", site);
        let (sets, rises) = chain.unwrap();

        prop_assert!(rises[0] > reference);
        prop_assert!(sets.windows(2).all(|p| p[0] <= p[1]), "sets {:?}", sets);
        prop_assert!(rises.windows(2).all(|p| p[0] >= p[1]), "rises {:?}", rises);
        prop_assert!(sets[3] <= rises[3]);

        // The nesting guard has nothing to discard on an ordered chain.
        let window = compute_night_window(&solver, reference).unwrap();
        for (i, level) in Twilight::ALL.iter().enumerate() {
            prop_assert_eq!(window.bounds(*level), Some((sets[i], rises[i])));
        }
    }

    #[test]
    fn prop_find_crossing_is_idempotent(
        site in site_strategy(),
        reference in instant_strategy(),
        horizon in -18.0..0.0f64,
        rising in any::<bool>(),
    ) {
        let geometry = geometry();
        let solver = HorizonSolver::new(&geometry, &site);
        let first = solver
            .find_crossing(Body::Sun, reference, horizon, CrossingMode::Nearest, rising)
            .unwrap();
        let second = solver
            .find_crossing(Body::Sun, reference, horizon, CrossingMode::Nearest, rising)
            .unwrap();
        match (first, second) {
            (Some(a), Some(b)) => prop_assert!(a.seconds_since(b).abs() <= 0.5),
            (a, b) => prop_assert_eq!(a, b),
        }
    }
}
