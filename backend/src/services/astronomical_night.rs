//! Astronomical night computation service.
//!
//! Builds the [`NightWindow`] around a reference instant by anchoring on the
//! next civil sunrise and searching every deeper twilight crossing backwards
//! from that anchor, so all eight boundaries belong to the same night.

use log::{debug, warn};

use crate::error::GeometryResult;
use crate::geometry::GeometryProvider;
use crate::models::{Instant, NightWindow, Twilight};
use crate::services::horizon::{Body, CrossingMode, HorizonSolver};

/// Compute the twilight boundaries of the night bracketing `reference`.
///
/// Boundaries that do not exist within the solver's search span are left
/// `None`. A deeper crossing that falls outside the enclosing shallower window
/// (it belongs to another night) is discarded the same way.
pub fn compute_night_window<G: GeometryProvider + ?Sized>(
    solver: &HorizonSolver<'_, G>,
    reference: Instant,
) -> GeometryResult<NightWindow> {
    let mut window = NightWindow::empty(reference);

    let civil = Twilight::Civil.horizon_deg();
    let Some(anchor) =
        solver.find_crossing(Body::Sun, reference, civil, CrossingMode::Next, true)?
    else {
        debug!("No civil sunrise after {}", reference.isoformat());
        return Ok(window);
    };
    let sunset_civil =
        solver.find_crossing(Body::Sun, anchor, civil, CrossingMode::Previous, false)?;
    window.set_boundaries(Twilight::Civil, sunset_civil, Some(anchor));

    for level in [Twilight::Nautical, Twilight::Astronomical, Twilight::Night] {
        let horizon = level.horizon_deg();
        let sunrise =
            solver.find_crossing(Body::Sun, anchor, horizon, CrossingMode::Previous, true)?;
        let sunset =
            solver.find_crossing(Body::Sun, anchor, horizon, CrossingMode::Previous, false)?;

        let enclosing = level.shallower().and_then(|outer| window.bounds(outer));
        let (sunset, sunrise) = match (enclosing, sunset, sunrise) {
            (Some((outer_set, outer_rise)), Some(set), Some(rise))
                if outer_set <= set && set <= rise && rise <= outer_rise =>
            {
                (Some(set), Some(rise))
            }
            (_, None, None) => (None, None),
            (enclosing, set, rise) => {
                warn!(
                    "Discarding {:?} crossings ({:?}, {:?}) outside enclosing window {:?}",
                    level,
                    set.map(|t| t.isoformat()),
                    rise.map(|t| t.isoformat()),
                    enclosing.map(|(a, b)| (a.isoformat(), b.isoformat()))
                );
                (None, None)
            }
        };
        window.set_boundaries(level, sunset, sunrise);
    }

    Ok(window)
}

/// Start and end of the night for an arbitrary horizon.
///
/// If the sun is already below `horizon_deg` at `reference` the night starts at
/// `reference`; otherwise at the next sunset. It ends at the first sunrise
/// after the start. `None` if either end cannot be found.
pub fn tonight<G: GeometryProvider + ?Sized>(
    solver: &HorizonSolver<'_, G>,
    reference: Instant,
    horizon_deg: f64,
) -> GeometryResult<Option<(Instant, Instant)>> {
    let start = if solver.altitude(Body::Sun, reference)? < horizon_deg {
        Some(reference)
    } else {
        solver.find_crossing(Body::Sun, reference, horizon_deg, CrossingMode::Next, false)?
    };
    let Some(start) = start else {
        return Ok(None);
    };
    let end = solver.find_crossing(Body::Sun, start, horizon_deg, CrossingMode::Next, true)?;
    Ok(end.map(|end| (start, end)))
}

/// All nights (sun below `horizon_deg`) that start within `[start, stop)`.
///
/// Nights are not clipped: one that ends after `stop` is reported in full.
pub fn compute_astronomical_nights<G: GeometryProvider + ?Sized>(
    solver: &HorizonSolver<'_, G>,
    start: Instant,
    stop: Instant,
    horizon_deg: f64,
) -> GeometryResult<Vec<(Instant, Instant)>> {
    let mut nights = Vec::new();
    let mut cursor = start;
    while cursor < stop {
        let Some((night_start, night_end)) = tonight(solver, cursor, horizon_deg)? else {
            break;
        };
        if night_start >= stop {
            break;
        }
        nights.push((night_start, night_end));
        // Step past the sunrise so the next search finds the following sunset.
        cursor = night_end.offset_seconds(60.0);
    }
    Ok(nights)
}
