//! Tween easing curves and their baked lookup tables.
//!
//! The target has no floating point worth using, so every easing the game
//! references is pre-baked at build time into a 256-entry table mapping
//! progress 0..255 to eased progress 0..255. `Linear` is always emitted as
//! the runtime fallback for unknown ids.

/// Easing function identifiers carried by tween IR.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Easing {
    Linear,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseOutBounce,
    EaseOutElastic,
}

impl Easing {
    /// Identifier fragment used in emitted table names.
    pub fn c_name(self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseInQuad => "in_quad",
            Easing::EaseOutQuad => "out_quad",
            Easing::EaseInOutQuad => "in_out_quad",
            Easing::EaseInCubic => "in_cubic",
            Easing::EaseOutCubic => "out_cubic",
            Easing::EaseOutBounce => "out_bounce",
            Easing::EaseOutElastic => "out_elastic",
        }
    }

    /// Continuous curve on [0, 1]. `EaseOutElastic` may overshoot up to 1.2;
    /// quantization caps the table entry at 255.
    fn curve(self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseOutBounce => {
                let (n1, d1) = (7.5625, 2.75);
                if t < 1.0 / d1 {
                    n1 * t * t
                } else if t < 2.0 / d1 {
                    let t = t - 1.5 / d1;
                    n1 * t * t + 0.75
                } else if t < 2.5 / d1 {
                    let t = t - 2.25 / d1;
                    n1 * t * t + 0.9375
                } else {
                    let t = t - 2.625 / d1;
                    n1 * t * t + 0.984375
                }
            }
            Easing::EaseOutElastic => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else {
                    let c4 = std::f64::consts::TAU / 3.0;
                    let v = 2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0;
                    // Allow the characteristic overshoot but keep it bounded.
                    v.clamp(0.0, 1.2)
                }
            }
        }
    }

    /// Bake the 256-entry progress table. `Linear` bakes to the identity,
    /// which the tween integer-math tests depend on.
    pub fn bake_table(self) -> [u8; 256] {
        let mut table = [0u8; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            let eased = self.curve(i as f64 / 255.0);
            *slot = (eased * 255.0).round().min(255.0).max(0.0) as u8;
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_is_identity() {
        let t = Easing::Linear.bake_table();
        for (i, v) in t.iter().enumerate() {
            assert_eq!(*v as usize, i);
        }
    }

    #[test]
    fn curves_hit_endpoints() {
        for e in [
            Easing::EaseInQuad,
            Easing::EaseOutQuad,
            Easing::EaseInOutQuad,
            Easing::EaseInCubic,
            Easing::EaseOutCubic,
            Easing::EaseOutBounce,
            Easing::EaseOutElastic,
        ] {
            let t = e.bake_table();
            assert_eq!(t[0], 0, "{e:?} must start at 0");
            assert_eq!(t[255], 255, "{e:?} must end at 255");
        }
    }
}
