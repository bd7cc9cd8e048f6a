use std::fmt;

use crate::raw::input_absinfo;

/// Parameters and current value of an absolute axis.
///
/// Carries the axis range (`minimum`/`maximum`), the kernel's noise filter (`fuzz`), the deadzone
/// (`flat`), and the relation of axis units to physical units (`resolution`).
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct AbsInfo(pub(crate) input_absinfo);

impl AbsInfo {
    pub(crate) const ZERO: Self = Self::new(0, 0);

    /// Creates an [`AbsInfo`] with the given range; every other field starts at zero.
    #[inline]
    pub const fn new(minimum: i32, maximum: i32) -> Self {
        Self(input_absinfo {
            value: 0,
            minimum,
            maximum,
            fuzz: 0,
            flat: 0,
            resolution: 0,
        })
    }

    /// Returns a copy of `self` with the given current value.
    #[inline]
    pub const fn with_value(mut self, value: i32) -> Self {
        self.0.value = value;
        self
    }

    /// Returns a copy of `self` with the given fuzz value.
    #[inline]
    pub const fn with_fuzz(mut self, fuzz: i32) -> Self {
        self.0.fuzz = fuzz;
        self
    }

    /// Returns a copy of `self` with the given flat value.
    #[inline]
    pub const fn with_flat(mut self, flat: i32) -> Self {
        self.0.flat = flat;
        self
    }

    /// Returns a copy of `self` with the given resolution.
    #[inline]
    pub const fn with_resolution(mut self, resolution: i32) -> Self {
        self.0.resolution = resolution;
        self
    }

    /// Returns the current axis value.
    ///
    /// The kernel does not promise that this lies inside the `minimum..=maximum` range.
    #[inline]
    pub const fn value(&self) -> i32 {
        self.0.value
    }

    #[inline]
    pub const fn minimum(&self) -> i32 {
        self.0.minimum
    }

    #[inline]
    pub const fn maximum(&self) -> i32 {
        self.0.maximum
    }

    /// Returns the fuzz value the kernel uses to filter axis noise.
    #[inline]
    pub const fn fuzz(&self) -> i32 {
        self.0.fuzz
    }

    /// Returns the size of the deadzone around the neutral position.
    #[inline]
    pub const fn flat(&self) -> i32 {
        self.0.flat
    }

    /// Returns the axis resolution in units per physical unit (commonly units/mm; units/radian
    /// for rotational axes).
    #[inline]
    pub const fn resolution(&self) -> i32 {
        self.0.resolution
    }
}

impl fmt::Debug for AbsInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbsInfo")
            .field("value", &self.value())
            .field("minimum", &self.minimum())
            .field("maximum", &self.maximum())
            .field("fuzz", &self.fuzz())
            .field("flat", &self.flat())
            .field("resolution", &self.resolution())
            .finish()
    }
}
