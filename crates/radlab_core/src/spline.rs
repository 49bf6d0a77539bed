//! Natural cubic spline interpolation.
//!
//! Dose coefficients and sensitivities vary over orders of magnitude across
//! the covered energy range, so both calibration stages interpolate in
//! log-energy space with a natural spline (zero second derivative at both
//! boundary knots). The tridiagonal system for the interior second
//! derivatives is solved with the Thomas algorithm; per-segment polynomial
//! coefficients are precomputed once so evaluation is a binary search plus a
//! Horner step. Evaluation outside the knot range extends the first/last
//! segment's cubic, so extrapolation is smooth rather than clamped.

use crate::error::SplineError;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    /// Left knot of the segment
    x: f64,
    a: f64,
    b: f64,
    c: f64,
    d: f64,
}

impl Segment {
    #[inline]
    fn eval(&self, x: f64) -> f64 {
        let t = x - self.x;
        self.a + t * (self.b + t * (self.c + t * self.d))
    }
}

/// Piecewise-cubic interpolant with natural boundary conditions
#[derive(Debug, Clone, PartialEq)]
pub struct NaturalCubicSpline {
    knots: Vec<f64>,
    segments: Vec<Segment>,
}

impl NaturalCubicSpline {
    /// Fit a natural cubic spline through `(knots[i], values[i])`.
    ///
    /// Knots must be finite and strictly increasing; values must be finite;
    /// at least two points are required (two points degenerate to a line).
    pub fn fit(knots: &[f64], values: &[f64]) -> Result<Self, SplineError> {
        if knots.len() != values.len() {
            return Err(SplineError::LengthMismatch {
                knots: knots.len(),
                values: values.len(),
            });
        }
        if knots.len() < 2 {
            return Err(SplineError::TooFewKnots(knots.len()));
        }
        for (index, (&x, &y)) in knots.iter().zip(values).enumerate() {
            if !x.is_finite() || !y.is_finite() {
                return Err(SplineError::NonFiniteInput { index });
            }
        }
        for (i, w) in knots.windows(2).enumerate() {
            if w[1] <= w[0] {
                return Err(SplineError::NonIncreasingKnots { index: i + 1 });
            }
        }

        let n = knots.len();
        let h: Vec<f64> = knots.windows(2).map(|w| w[1] - w[0]).collect();
        let sigma = second_derivatives(knots, values, &h);

        let segments = (0..n - 1)
            .map(|i| {
                let slope = (values[i + 1] - values[i]) / h[i];
                Segment {
                    x: knots[i],
                    a: values[i],
                    b: slope - h[i] * (2.0 * sigma[i] + sigma[i + 1]) / 6.0,
                    c: sigma[i] / 2.0,
                    d: (sigma[i + 1] - sigma[i]) / (6.0 * h[i]),
                }
            })
            .collect();

        Ok(Self {
            knots: knots.to_vec(),
            segments,
        })
    }

    /// Evaluate the spline at `x`, extrapolating with the end segments
    /// outside the knot range
    #[must_use]
    pub fn eval(&self, x: f64) -> f64 {
        let upper = self.knots.partition_point(|&k| k <= x);
        let index = upper.saturating_sub(1).min(self.segments.len() - 1);
        self.segments[index].eval(x)
    }

    /// First and last knot
    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[0], self.knots[self.knots.len() - 1])
    }
}

/// Second derivatives at every knot; natural boundaries pin the ends to zero
fn second_derivatives(knots: &[f64], values: &[f64], h: &[f64]) -> Vec<f64> {
    let n = knots.len();
    let mut sigma = vec![0.0; n];
    if n <= 2 {
        return sigma;
    }

    // Thomas algorithm on the interior unknowns sigma[1..n-1]
    let m = n - 2;
    let mut diag = vec![0.0; m];
    let mut rhs = vec![0.0; m];
    for k in 0..m {
        let i = k + 1;
        diag[k] = 2.0 * (h[i - 1] + h[i]);
        rhs[k] = 6.0
            * ((values[i + 1] - values[i]) / h[i] - (values[i] - values[i - 1]) / h[i - 1]);
    }
    for k in 1..m {
        let w = h[k] / diag[k - 1];
        diag[k] -= w * h[k];
        rhs[k] -= w * rhs[k - 1];
    }

    sigma[m] = rhs[m - 1] / diag[m - 1];
    for k in (0..m - 1).rev() {
        sigma[k + 1] = (rhs[k] - h[k + 1] * sigma[k + 2]) / diag[k];
    }
    sigma
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolates_knots_exactly() {
        let knots = [0.0, 1.0, 2.5, 4.0, 7.0];
        let values = [1.0, -2.0, 0.5, 3.0, 3.5];
        let spline = NaturalCubicSpline::fit(&knots, &values).unwrap();

        for (&x, &y) in knots.iter().zip(&values) {
            assert!((spline.eval(x) - y).abs() < 1e-12, "at {x}");
        }
    }

    #[test]
    fn test_linear_data_reproduced_everywhere() {
        let knots = [0.0, 1.0, 2.0, 3.0, 4.0];
        let values: Vec<f64> = knots.iter().map(|x| 2.0 * x - 1.0).collect();
        let spline = NaturalCubicSpline::fit(&knots, &values).unwrap();

        // linear input has zero curvature, so even extrapolation stays linear
        for &x in &[-1.0, 0.3, 1.5, 2.9, 4.0, 6.0] {
            assert!((spline.eval(x) - (2.0 * x - 1.0)).abs() < 1e-10, "at {x}");
        }
    }

    #[test]
    fn test_constant_data_stays_constant() {
        let knots = [1.0, 2.0, 3.0];
        let values = [5.0, 5.0, 5.0];
        let spline = NaturalCubicSpline::fit(&knots, &values).unwrap();

        for &x in &[0.0, 1.0, 1.7, 3.0, 10.0] {
            assert!((spline.eval(x) - 5.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_two_knots_degenerate_to_line() {
        let spline = NaturalCubicSpline::fit(&[0.0, 2.0], &[0.0, 4.0]).unwrap();
        assert!((spline.eval(1.0) - 2.0).abs() < 1e-12);
        assert!((spline.eval(3.0) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_natural_boundary_second_derivative_is_zero() {
        let knots = [0.0, 1.0, 2.0, 3.0, 4.0];
        let values = [0.0, 1.0, 0.0, 1.0, 0.0];
        let spline = NaturalCubicSpline::fit(&knots, &values).unwrap();

        // central finite difference of the second derivative at both ends
        let dd = |x: f64| {
            let eps = 1e-5;
            (spline.eval(x + eps) - 2.0 * spline.eval(x) + spline.eval(x - eps)) / (eps * eps)
        };
        assert!(dd(0.0).abs() < 1e-3, "left end: {}", dd(0.0));
        assert!(dd(4.0).abs() < 1e-3, "right end: {}", dd(4.0));
    }

    #[test]
    fn test_continuity_at_interior_knots() {
        let knots = [0.0, 0.5, 1.3, 2.0, 3.1, 4.0];
        let values = [1.0, 3.0, -1.0, 2.0, 0.0, 5.0];
        let spline = NaturalCubicSpline::fit(&knots, &values).unwrap();

        for &k in &knots[1..knots.len() - 1] {
            let eps = 1e-9;
            let left = spline.eval(k - eps);
            let right = spline.eval(k + eps);
            assert!((left - right).abs() < 1e-6, "jump at {k}");
        }
    }

    #[test]
    fn test_fit_errors() {
        assert_eq!(
            NaturalCubicSpline::fit(&[1.0], &[1.0]),
            Err(SplineError::TooFewKnots(1))
        );
        assert_eq!(
            NaturalCubicSpline::fit(&[1.0, 2.0], &[1.0]),
            Err(SplineError::LengthMismatch { knots: 2, values: 1 })
        );
        assert_eq!(
            NaturalCubicSpline::fit(&[1.0, 1.0, 2.0], &[0.0, 0.0, 0.0]),
            Err(SplineError::NonIncreasingKnots { index: 1 })
        );
        assert_eq!(
            NaturalCubicSpline::fit(&[1.0, 2.0], &[0.0, f64::NAN]),
            Err(SplineError::NonFiniteInput { index: 1 })
        );
    }
}
