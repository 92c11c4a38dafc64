//! Newtype wrappers for the physical quantities used in load-flow analysis.
//!
//! Mixing megawatts with megavars, or radians with degrees, is the classic
//! source of silent numerical bugs in power-system code. Each quantity here
//! is a `#[repr(transparent)]` wrapper around `f64`, so the compiler rejects
//! unit mix-ups while the generated code is identical to raw floats.
//!
//! ```
//! use lf_core::units::{Megawatts, Megavars};
//!
//! let p = Megawatts(60.0) + Megawatts(40.0);
//! assert_eq!(p.value(), 100.0);
//! // Megawatts(1.0) + Megavars(1.0) does not compile.
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

macro_rules! quantity {
    ($name:ident, $suffix:literal, $(#[$doc:meta])*) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(pub f64);

        impl $name {
            /// Wrap a raw value.
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Unwrap to the raw value.
            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            /// Absolute value.
            #[inline]
            pub fn abs(self) -> Self {
                Self(self.0.abs())
            }

            /// True when the value is neither NaN nor infinite.
            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }

            /// Clamp into `[min, max]`.
            #[inline]
            pub fn clamp(self, min: Self, max: Self) -> Self {
                Self(self.0.clamp(min.0, max.0))
            }
        }

        impl Add for $name {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $name {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self(self.0 - rhs.0)
            }
        }

        impl Neg for $name {
            type Output = Self;
            fn neg(self) -> Self {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $name {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $name {
            type Output = Self;
            fn div(self, rhs: f64) -> Self {
                Self(self.0 / rhs)
            }
        }

        /// Ratio of two like quantities is dimensionless.
        impl Div for $name {
            type Output = f64;
            fn div(self, rhs: Self) -> f64 {
                self.0 / rhs.0
            }
        }

        impl std::iter::Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|q| q.0).sum())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.4} {}", self.0, $suffix)
            }
        }
    };
}

quantity!(
    Megawatts,
    "MW",
    /// Active power in megawatts.
);

quantity!(
    Megavars,
    "Mvar",
    /// Reactive power in megavolt-amperes reactive.
);

quantity!(
    MegavoltAmperes,
    "MVA",
    /// Apparent power in megavolt-amperes: S = sqrt(P^2 + Q^2).
);

quantity!(
    PerUnit,
    "pu",
    /// A quantity normalized to a system base (voltage to nominal bus
    /// voltage, power to the system MVA base).
);

quantity!(
    Kilovolts,
    "kV",
    /// Absolute voltage in kilovolts.
);

quantity!(
    Kiloamperes,
    "kA",
    /// Current in kiloamperes.
);

quantity!(
    Radians,
    "rad",
    /// Angle in radians, the working unit for all trigonometry.
);

quantity!(
    Degrees,
    "deg",
    /// Angle in degrees, for display and interchange with humans.
);

impl Megawatts {
    /// Apparent power from this active power and a reactive component.
    #[inline]
    pub fn apparent(self, q: Megavars) -> MegavoltAmperes {
        MegavoltAmperes(self.0.hypot(q.0))
    }
}

impl PerUnit {
    /// Nominal value.
    pub const ONE: Self = Self(1.0);

    /// Scale back to kilovolts against a base voltage.
    #[inline]
    pub fn to_kilovolts(self, base: Kilovolts) -> Kilovolts {
        Kilovolts(self.0 * base.0)
    }
}

impl Radians {
    pub const ZERO: Self = Self(0.0);

    #[inline]
    pub fn sin(self) -> f64 {
        self.0.sin()
    }

    #[inline]
    pub fn cos(self) -> f64 {
        self.0.cos()
    }

    #[inline]
    pub fn to_degrees(self) -> Degrees {
        Degrees(self.0.to_degrees())
    }
}

impl Degrees {
    #[inline]
    pub fn to_radians(self) -> Radians {
        Radians(self.0.to_radians())
    }
}
