//! Flight Trajectories
//!
//! Pure mapping from a bat and its elapsed time to a pose. Hit detection
//! and rendering both evaluate the same function, so a tap can be checked
//! against exactly what was drawn without replaying any animation.
//!
//! - Horizontal: linear from origin to destination over the flight.
//! - Vertical: sine bob of ±40 units, period 4000 / speed ms.
//! - Rotation: ±15° wing tilt, period 2000 / speed ms (visual only).
//! - Opacity: 300 ms fade in, hold, 300 ms fade out.

use std::f64::consts::TAU;
use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::state::Bat;

/// Vertical bob amplitude (viewport units).
pub const BOB_AMPLITUDE: f64 = 40.0;

/// Bob period at speed 1.0 (ms).
pub const BOB_PERIOD_MS: f64 = 4000.0;

/// Wing tilt amplitude (degrees).
pub const ROTATION_AMPLITUDE_DEG: f64 = 15.0;

/// Wing tilt period at speed 1.0 (ms).
pub const ROTATION_PERIOD_MS: f64 = 2000.0;

/// Fade-in and fade-out length (ms).
pub const FADE_MS: f64 = 300.0;

/// Where a bat is and how it looks at one instant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Hit-tested position
    pub position: Vec2,
    /// Wing tilt in degrees
    pub rotation_deg: f32,
    /// 0 (invisible) to 1 (opaque)
    pub opacity: f32,
}

/// Full pose of `bat` after `elapsed_ms`.
pub fn pose(bat: &Bat, elapsed_ms: u64) -> Pose {
    Pose {
        position: position(bat, elapsed_ms),
        rotation_deg: rotation_deg(bat, elapsed_ms),
        opacity: opacity(bat.flight_duration_ms, elapsed_ms),
    }
}

/// Hit-tested position of `bat` after `elapsed_ms`.
pub fn position(bat: &Bat, elapsed_ms: u64) -> Vec2 {
    let t = elapsed_ms as f64;

    let progress = if bat.flight_duration_ms == 0 {
        1.0
    } else {
        (t / bat.flight_duration_ms as f64).clamp(0.0, 1.0)
    };
    let x = bat.origin.x as f64 + (bat.destination.x - bat.origin.x) as f64 * progress;

    let bob_period = BOB_PERIOD_MS / bat.speed as f64;
    let y = bat.origin.y as f64 + BOB_AMPLITUDE * (TAU * t / bob_period).sin();

    Vec2::new(x as f32, y as f32)
}

/// Wing tilt after `elapsed_ms`. LEFT bats start at -15°, RIGHT at +15°.
pub fn rotation_deg(bat: &Bat, elapsed_ms: u64) -> f32 {
    let period = ROTATION_PERIOD_MS / bat.speed as f64;
    let phase = TAU * elapsed_ms as f64 / period;
    (-(bat.side.sign() as f64) * ROTATION_AMPLITUDE_DEG * phase.cos()) as f32
}

/// Fade envelope over a flight.
///
/// Flights shorter than two fades get a symmetric triangle: each ramp takes
/// half the flight, so the peak still reaches 1.
pub fn opacity(flight_duration_ms: u64, elapsed_ms: u64) -> f32 {
    let flight = flight_duration_ms as f64;
    let t = elapsed_ms as f64;
    if flight <= 0.0 || t >= flight {
        return 0.0;
    }

    let fade = FADE_MS.min(flight / 2.0);
    let value = if t < fade {
        t / fade
    } else if t > flight - fade {
        (flight - t) / fade
    } else {
        1.0
    };
    value.clamp(0.0, 1.0) as f32
}

// =============================================================================
// TESTS
// =============================================================================
