//! Trapezoidal velocity profile
//!
//! Accelerate at the maximal acceleration, cruise at the maximal velocity, decelerate
//! symmetrically. If the distance is too short to ever reach the maximal velocity, the
//! cruise phase vanishes and the profile becomes a triangle with a lower peak velocity.

use crate::planning_error::PlanningError;
use crate::utils::linspace;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrapezoidalProfile {
    /// Signed distance to travel.
    distance: f64,
    max_velocity: f64,
    max_acceleration: f64,
    /// Velocity actually reached, `max_velocity` unless the profile is triangular.
    peak_velocity: f64,
    t_accel: f64,
    t_cruise: f64,
}

impl TrapezoidalProfile {
    /// Profile for traveling `distance` (any sign) starting and ending at rest.
    /// Velocity and acceleration limits must be positive and finite.
    pub fn new(distance: f64, max_velocity: f64, max_acceleration: f64) -> Result<Self, PlanningError> {
        if !distance.is_finite() {
            return Err(PlanningError::InvalidParameter(format!(
                "distance must be finite (got {})", distance
            )));
        }
        check_limits(max_velocity, max_acceleration)?;

        let length = distance.abs();
        let t_accel = max_velocity / max_acceleration;
        let d_accel = 0.5 * max_acceleration * t_accel * t_accel;

        let (peak_velocity, t_accel, t_cruise) = if 2.0 * d_accel > length {
            // Never reaches the maximal velocity
            let peak = (max_acceleration * length).sqrt();
            (peak, peak / max_acceleration, 0.0)
        } else {
            (max_velocity, t_accel, (length - 2.0 * d_accel) / max_velocity)
        };

        Ok(TrapezoidalProfile {
            distance,
            max_velocity,
            max_acceleration,
            peak_velocity,
            t_accel,
            t_cruise,
        })
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn peak_velocity(&self) -> f64 {
        self.peak_velocity
    }

    /// Duration of the acceleration phase (deceleration takes the same).
    pub fn t_accel(&self) -> f64 {
        self.t_accel
    }

    pub fn t_cruise(&self) -> f64 {
        self.t_cruise
    }

    pub fn total_time(&self) -> f64 {
        2.0 * self.t_accel + self.t_cruise
    }

    /// True if the distance is too short to reach the maximal velocity.
    pub fn is_triangular(&self) -> bool {
        self.peak_velocity < self.max_velocity
    }

    /// Signed displacement at time `t`, clamped to the duration of the profile.
    pub fn displacement_at(&self, t: f64) -> f64 {
        let total = self.total_time();
        let t = t.clamp(0.0, total);
        let a = self.max_acceleration;
        let magnitude = if t < self.t_accel {
            0.5 * a * t * t
        } else if t < self.t_accel + self.t_cruise {
            0.5 * a * self.t_accel * self.t_accel + self.peak_velocity * (t - self.t_accel)
        } else {
            let remaining = total - t;
            self.distance.abs() - 0.5 * a * remaining * remaining
        };
        magnitude.copysign(self.distance)
    }

    /// Signed velocity at time `t`, zero outside of the profile.
    pub fn velocity_at(&self, t: f64) -> f64 {
        let total = self.total_time();
        if t <= 0.0 || t >= total {
            return 0.0;
        }
        let magnitude = if t < self.t_accel {
            self.max_acceleration * t
        } else if t < self.t_accel + self.t_cruise {
            self.peak_velocity
        } else {
            self.max_acceleration * (total - t)
        };
        magnitude.copysign(self.distance)
    }

    /// `n` evenly spaced time stamps over the whole profile and the displacement at each.
    /// The first displacement is 0 and the last is exactly `distance`.
    pub fn sample(&self, n: usize) -> (Vec<f64>, Vec<f64>) {
        let times = linspace(0.0, self.total_time(), n);
        let mut displacements: Vec<f64> = times.iter().map(|&t| self.displacement_at(t)).collect();
        if n > 1 {
            displacements[n - 1] = self.distance;
        }
        (times, displacements)
    }
}

/// Shorthand for [TrapezoidalProfile::new] followed by [TrapezoidalProfile::sample].
/// Returns displacements and time stamps.
pub fn trapezoid_profile(
    distance: f64,
    num_points: usize,
    max_velocity: f64,
    max_acceleration: f64,
) -> Result<(Vec<f64>, Vec<f64>), PlanningError> {
    let (times, displacements) =
        TrapezoidalProfile::new(distance, max_velocity, max_acceleration)?.sample(num_points);
    Ok((displacements, times))
}

pub(crate) fn check_limits(max_velocity: f64, max_acceleration: f64) -> Result<(), PlanningError> {
    if !(max_velocity.is_finite() && max_velocity > 0.0) {
        return Err(PlanningError::InvalidParameter(format!(
            "maximal velocity must be positive and finite (got {})", max_velocity
        )));
    }
    if !(max_acceleration.is_finite() && max_acceleration > 0.0) {
        return Err(PlanningError::InvalidParameter(format!(
            "maximal acceleration must be positive and finite (got {})", max_acceleration
        )));
    }
    Ok(())
}
