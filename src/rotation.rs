//! Card orientation: unit quaternions and the exponential-smoothing flip animator.

use std::ops::Mul;

const EPSILON: f64 = 1e-10;
const SLERP_THRESHOLD: f64 = 0.9995;

/// Fallbacks for blend/tolerance values that would keep a flip from ever completing.
const DEFAULT_BLEND: f64 = 0.05;
const DEFAULT_TOLERANCE_DEGREES: f64 = 0.5;
/// Below this, float noise in `angular_distance` can keep the snap from firing.
const MIN_TOLERANCE_DEGREES: f64 = 0.01;

/// Unit quaternion. Always normalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quaternion {
  pub w: f64,
  pub x: f64,
  pub y: f64,
  pub z: f64,
}

impl Quaternion {
  pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
    Self { w, x, y, z }.normalize()
  }

  pub fn identity() -> Self {
    Self { w: 1.0, x: 0.0, y: 0.0, z: 0.0 }
  }

  /// Rotation of `degrees` about `axis` (need not be unit length).
  pub fn from_axis_angle(axis: [f64; 3], degrees: f64) -> Self {
    let len = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
    if len < EPSILON {
      return Self::identity();
    }
    let half = degrees.to_radians() / 2.0;
    let s = half.sin() / len;
    Self::new(half.cos(), axis[0] * s, axis[1] * s, axis[2] * s)
  }

  pub fn normalize(self) -> Self {
    let norm = self.dot(self).sqrt();
    if norm < EPSILON {
      return Self::identity();
    }
    Self { w: self.w / norm, x: self.x / norm, y: self.y / norm, z: self.z / norm }
  }

  pub fn dot(self, other: Self) -> f64 {
    self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
  }

  /// Angle of the rotation taking `self` to `other`, in radians. Range: [0, π].
  pub fn angular_distance(self, other: Self) -> f64 {
    let d = self.dot(other).abs().clamp(0.0, 1.0);
    2.0 * d.acos()
  }

  /// Spherical linear interpolation along the shorter arc.
  pub fn slerp(self, other: Self, t: f64) -> Self {
    if t <= 0.0 {
      return self;
    }
    if t >= 1.0 {
      return other;
    }

    let mut dot = self.dot(other);
    let o = if dot < 0.0 {
      dot = -dot;
      Self { w: -other.w, x: -other.x, y: -other.y, z: -other.z }
    } else {
      other
    };

    // Near-parallel: NLERP
    if dot > SLERP_THRESHOLD {
      return Self {
        w: self.w + t * (o.w - self.w),
        x: self.x + t * (o.x - self.x),
        y: self.y + t * (o.y - self.y),
        z: self.z + t * (o.z - self.z),
      }
      .normalize();
    }

    let theta = dot.clamp(-1.0, 1.0).acos();
    let sin_theta = theta.sin();
    let s0 = ((1.0 - t) * theta).sin() / sin_theta;
    let s1 = (t * theta).sin() / sin_theta;

    Self {
      w: s0 * self.w + s1 * o.w,
      x: s0 * self.x + s1 * o.x,
      y: s0 * self.y + s1 * o.y,
      z: s0 * self.z + s1 * o.z,
    }
    .normalize()
  }
}

/// Hamilton product: `a * b` applies `b` first, then `a`.
impl Mul for Quaternion {
  type Output = Self;

  fn mul(self, rhs: Self) -> Self {
    Self::new(
      self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
      self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
      self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
      self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
    )
  }
}

pub const UP: [f64; 3] = [0.0, 1.0, 0.0];
pub const RIGHT: [f64; 3] = [1.0, 0.0, 0.0];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipDirection {
  /// Question side to explanation side.
  Forward,
  /// Explanation side back to question side.
  Return,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FlipStep {
  Idle,
  Moving(Quaternion),
  Completed(FlipDirection, Quaternion),
}

/// Drives one flip at a time toward its target by a fixed blend per tick.
#[derive(Clone, Debug)]
pub struct FlipAnimator {
  orientation: Quaternion,
  active: Option<FlipDirection>,
  forward_target: Quaternion,
  return_target: Quaternion,
  blend: f64,
  tolerance: f64,
}

impl FlipAnimator {
  /// Forward target: `yaw` about up, then `-tilt` about right. Return target: `+tilt` about right.
  /// The card starts resting on the return target.
  ///
  /// `blend` is clamped into (0, 1] and `tolerance_degrees` to a positive
  /// finite value; zero, negative or non-finite inputs fall back to defaults.
  pub fn new(yaw_degrees: f64, tilt_degrees: f64, blend: f64, tolerance_degrees: f64) -> Self {
    let forward_target =
      Quaternion::from_axis_angle(UP, yaw_degrees) * Quaternion::from_axis_angle(RIGHT, -tilt_degrees);
    let return_target =
      Quaternion::from_axis_angle(UP, 0.0) * Quaternion::from_axis_angle(RIGHT, tilt_degrees);
    Self {
      orientation: return_target,
      active: None,
      forward_target,
      return_target,
      blend: sanitize_blend(blend),
      tolerance: sanitize_tolerance(tolerance_degrees).to_radians(),
    }
  }

  pub fn orientation(&self) -> Quaternion { self.orientation }

  pub fn active(&self) -> Option<FlipDirection> { self.active }

  pub fn is_busy(&self) -> bool { self.active.is_some() }

  pub fn target(&self, direction: FlipDirection) -> Quaternion {
    match direction {
      FlipDirection::Forward => self.forward_target,
      FlipDirection::Return => self.return_target,
    }
  }

  /// Start a flip. Refused (returns false) while another flip is incomplete.
  pub fn begin(&mut self, direction: FlipDirection) -> bool {
    if self.active.is_some() {
      return false;
    }
    self.active = Some(direction);
    true
  }

  /// One simulation step. Snaps exactly onto the target once within tolerance.
  pub fn step(&mut self) -> FlipStep {
    let Some(direction) = self.active else {
      return FlipStep::Idle;
    };
    let target = self.target(direction);
    if self.orientation.angular_distance(target) <= self.tolerance {
      self.orientation = target;
      self.active = None;
      return FlipStep::Completed(direction, target);
    }
    self.orientation = self.orientation.slerp(target, self.blend);
    FlipStep::Moving(self.orientation)
  }
}

fn sanitize_blend(blend: f64) -> f64 {
  if blend.is_finite() && blend > 0.0 { blend.min(1.0) } else { DEFAULT_BLEND }
}

fn sanitize_tolerance(degrees: f64) -> f64 {
  if degrees.is_finite() && degrees > 0.0 {
    degrees.clamp(MIN_TOLERANCE_DEGREES, 180.0)
  } else {
    DEFAULT_TOLERANCE_DEGREES
  }
}
