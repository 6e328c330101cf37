use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Which end of the curve the easing applies to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EaseDir {
    In,
    Out,
    InOut,
}

/// Easing curve applied to a normalized progress value.
///
/// Named the way page timelines name them: `none`, `power1.in`, `power2.inOut`,
/// `sine.out`, etc. A bare family name (`power2`) means `.out`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Ease {
    /// Linear.
    None,
    /// `t^(n+1)` family; `power1` is quadratic.
    Power(u8, EaseDir),
    Sine(EaseDir),
}

impl Default for Ease {
    fn default() -> Self {
        Ease::None
    }
}

impl Ease {
    pub const POWER1_IN: Ease = Ease::Power(1, EaseDir::In);
    pub const POWER2_OUT: Ease = Ease::Power(2, EaseDir::Out);
    pub const POWER2_IN_OUT: Ease = Ease::Power(2, EaseDir::InOut);

    /// Applies the curve. Input is clamped to `[0, 1]`; endpoints are exact.
    pub fn apply(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Ease::None => t,
            Ease::Power(n, dir) => {
                let exp = i32::from(n) + 1;
                shaped(dir, t, |x| x.powi(exp))
            }
            Ease::Sine(dir) => shaped(dir, t, |x| 1.0 - (x * PI * 0.5).cos()),
        }
    }
}

/// Builds out / inOut variants from an ease-in curve.
fn shaped(dir: EaseDir, t: f32, ease_in: impl Fn(f32) -> f32) -> f32 {
    match dir {
        EaseDir::In => ease_in(t),
        EaseDir::Out => 1.0 - ease_in(1.0 - t),
        EaseDir::InOut => {
            if t < 0.5 {
                ease_in(t * 2.0) * 0.5
            } else {
                1.0 - ease_in((1.0 - t) * 2.0) * 0.5
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EaseParseError {
    input: String,
}

impl fmt::Display for EaseParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown easing `{}`", self.input)
    }
}

impl std::error::Error for EaseParseError {}

impl FromStr for Ease {
    type Err = EaseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || EaseParseError { input: s.to_string() };
        let s = s.trim();
        if s == "none" || s == "linear" {
            return Ok(Ease::None);
        }

        let (family, dir) = match s.split_once('.') {
            Some((family, dir)) => (family, dir),
            None => (s, "out"),
        };
        let dir = match dir {
            "in" => EaseDir::In,
            "out" => EaseDir::Out,
            "inOut" => EaseDir::InOut,
            _ => return Err(err()),
        };

        match family {
            "sine" => Ok(Ease::Sine(dir)),
            "power0" => Ok(Ease::None),
            "power1" => Ok(Ease::Power(1, dir)),
            "power2" => Ok(Ease::Power(2, dir)),
            "power3" => Ok(Ease::Power(3, dir)),
            "power4" => Ok(Ease::Power(4, dir)),
            _ => Err(err()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    // ── curves ────────────────────────────────────────────────────────────

    #[test]
    fn endpoints_are_exact_for_every_curve() {
        for name in ["none", "power1.in", "power2.out", "power3.inOut", "power4.in", "sine.inOut"] {
            let e: Ease = name.parse().unwrap();
            assert_eq!(e.apply(0.0), 0.0, "{name}");
            assert!(approx(e.apply(1.0), 1.0), "{name}");
        }
    }

    #[test]
    fn power1_in_is_quadratic() {
        assert!(approx(Ease::POWER1_IN.apply(0.5), 0.25));
    }

    #[test]
    fn in_out_is_symmetric_around_midpoint() {
        let e = Ease::POWER2_IN_OUT;
        assert!(approx(e.apply(0.5), 0.5));
        assert!(approx(e.apply(0.25) + e.apply(0.75), 1.0));
    }

    #[test]
    fn input_is_clamped() {
        assert_eq!(Ease::POWER2_OUT.apply(-1.0), 0.0);
        assert!(approx(Ease::POWER2_OUT.apply(3.0), 1.0));
        assert_eq!(Ease::None.apply(f32::NAN), 0.0);
    }

    // ── parsing ───────────────────────────────────────────────────────────

    #[test]
    fn bare_family_defaults_to_out() {
        assert_eq!("power2".parse::<Ease>(), Ok(Ease::POWER2_OUT));
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!("bounce.out".parse::<Ease>().is_err());
        assert!("power2.sideways".parse::<Ease>().is_err());
    }
}
