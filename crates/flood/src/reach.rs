use uom::si::{
    f64::{Length, VolumeRate},
    length::meter,
    volume_rate::cubic_meter_per_second,
};

use crate::FloodError;

/// A straight river reach with a wide rectangular cross-section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiverReach {
    length: Length,
    width: Length,
    z_downstream: Length,
    z_upstream: Length,
}

impl RiverReach {
    /// Creates a reach from its geometry.
    ///
    /// # Errors
    ///
    /// Returns an error if the length or width is not positive, or the
    /// upstream bed is not above the downstream bed.
    pub fn new(
        length: Length,
        width: Length,
        z_downstream: Length,
        z_upstream: Length,
    ) -> Result<Self, FloodError> {
        let l = length.get::<meter>();
        let b = width.get::<meter>();
        // Negated comparisons also reject NaN.
        if !(l > 0.0 && l.is_finite()) {
            return Err(FloodError::NonPositiveLength(l));
        }
        if !(b > 0.0 && b.is_finite()) {
            return Err(FloodError::NonPositiveWidth(b));
        }

        let reach = Self {
            length,
            width,
            z_downstream,
            z_upstream,
        };
        let slope = reach.slope();
        if !(slope > 0.0 && slope.is_finite()) {
            return Err(FloodError::NonPositiveSlope(slope));
        }

        Ok(reach)
    }

    /// The reference reach: 5 km long, 300 m wide, falling from 51 m to 49 m.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            length: Length::new::<meter>(5.0e3),
            width: Length::new::<meter>(300.0),
            z_downstream: Length::new::<meter>(49.0),
            z_upstream: Length::new::<meter>(51.0),
        }
    }

    /// Bed slope `α = (Zm − Zv) / L`.
    #[must_use]
    pub fn slope(&self) -> f64 {
        ((self.z_upstream - self.z_downstream) / self.length).value
    }

    /// Water height for `discharge` at roughness `strickler` (m^(1/3)/s).
    ///
    /// # Errors
    ///
    /// Returns an error if `strickler` is not finite and positive, or
    /// `discharge` is not finite and non-negative.
    pub fn height(&self, discharge: VolumeRate, strickler: f64) -> Result<Length, FloodError> {
        if !(strickler > 0.0 && strickler.is_finite()) {
            return Err(FloodError::NonPositiveStrickler(strickler));
        }
        let q = discharge.get::<cubic_meter_per_second>();
        if !(q >= 0.0 && q.is_finite()) {
            return Err(FloodError::NegativeDischarge(q));
        }

        let b = self.width.get::<meter>();
        let h = (q / (strickler * b * self.slope().sqrt())).powf(0.6);
        Ok(Length::new::<meter>(h))
    }

    /// Water heights for each discharge, in order.
    ///
    /// # Errors
    ///
    /// See [`RiverReach::height`].
    pub fn heights(
        &self,
        discharges: &[VolumeRate],
        strickler: f64,
    ) -> Result<Vec<Length>, FloodError> {
        discharges
            .iter()
            .map(|&q| self.height(q, strickler))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn discharges() -> Vec<VolumeRate> {
        [10.0, 20.0, 30.0, 40.0]
            .into_iter()
            .map(VolumeRate::new::<cubic_meter_per_second>)
            .collect()
    }

    fn meters(heights: &[Length]) -> Vec<f64> {
        heights.iter().map(|h| h.get::<meter>()).collect()
    }

    #[test]
    fn reference_heights() {
        let reach = RiverReach::reference();

        let at_25 = meters(&reach.heights(&discharges(), 25.0).unwrap());
        let at_20 = meters(&reach.heights(&discharges(), 20.0).unwrap());

        for (h, expected) in at_25.iter().zip([0.19694513, 0.298513, 0.38073079, 0.45246109]) {
            assert_relative_eq!(*h, expected, epsilon = 1e-5);
        }
        for (h, expected) in at_20.iter().zip([0.22516001, 0.34127875, 0.43527528, 0.51728186]) {
            assert_relative_eq!(*h, expected, epsilon = 1e-5);
        }
    }

    #[test]
    fn monotonic_in_discharge_and_roughness() {
        let reach = RiverReach::reference();
        let heights = meters(&reach.heights(&discharges(), 30.0).unwrap());

        assert!(heights.windows(2).all(|pair| pair[0] < pair[1]));

        let q = VolumeRate::new::<cubic_meter_per_second>(25.0);
        let smooth = reach.height(q, 40.0).unwrap();
        let rough = reach.height(q, 20.0).unwrap();
        assert!(smooth < rough);
    }

    #[test]
    fn zero_discharge_gives_zero_height() {
        let reach = RiverReach::reference();
        let q = VolumeRate::new::<cubic_meter_per_second>(0.0);

        assert_eq!(reach.height(q, 25.0).unwrap().get::<meter>(), 0.0);
    }

    #[test]
    fn rejects_invalid_inputs() {
        let reach = RiverReach::reference();
        let q = VolumeRate::new::<cubic_meter_per_second>(10.0);

        assert_eq!(
            reach.height(q, 0.0),
            Err(FloodError::NonPositiveStrickler(0.0))
        );
        assert_eq!(
            reach.height(-q, 25.0),
            Err(FloodError::NegativeDischarge(-10.0))
        );
        assert!(matches!(
            reach.height(q, f64::NAN),
            Err(FloodError::NonPositiveStrickler(_))
        ));
    }

    #[test]
    fn rejects_flat_or_degenerate_geometry() {
        let m = Length::new::<meter>;

        assert_eq!(
            RiverReach::new(m(5.0e3), m(300.0), m(51.0), m(49.0)),
            Err(FloodError::NonPositiveSlope(-4.0e-4))
        );
        assert!(matches!(
            RiverReach::new(m(0.0), m(300.0), m(49.0), m(51.0)),
            Err(FloodError::NonPositiveLength(_))
        ));
        assert!(matches!(
            RiverReach::new(m(5.0e3), m(-1.0), m(49.0), m(51.0)),
            Err(FloodError::NonPositiveWidth(_))
        ));

        let reach = RiverReach::new(m(5.0e3), m(300.0), m(49.0), m(51.0)).unwrap();
        assert_eq!(reach, RiverReach::reference());
        assert_relative_eq!(reach.slope(), 4.0e-4);
    }
}
