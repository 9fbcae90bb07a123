// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Special functions in logarithmic form.

The kappa-distribution Gordeyev kernel contains `z^ν K_ν(z)` with `ν = κ +
1/2`, divided by `2^(ν-1) Γ(ν)`. For large κ both the numerator and the
denominator overflow long before their ratio stops being a perfectly ordinary
number, so everything here is computed as a logarithm.

We need `K_ν` for real, non-integral orders. Below `ν = 12` we evaluate the
integral representation

```text
K_ν(z) = ∫₀^∞ exp(-z cosh t) cosh(ν t) dt
```

with the trapezoid rule, accumulated as a running log-sum-exp. The integrand
is analytic and even in `t`, so the trapezoid rule converges geometrically.
Above that we use the uniform asymptotic expansion of Debye (Abramowitz &
Stegun 9.7.8) to fourth order.

*/

use std::f64;

use statrs::function::gamma;


/// Orders at or above this use the Debye expansion.
const DEBYE_THRESHOLD: f64 = 12.;

/// Bail out of the integral representation after this many samples.
const MAX_INTEGRAL_STEPS: usize = 1_000_000;


/// The natural logarithm of the gamma function.
#[inline]
pub fn ln_gamma(x: f64) -> f64 {
    gamma::ln_gamma(x)
}


/// `ln(z^ν K_ν(z))` for `ν > 0` and `z >= 0`.
///
/// At `z = 0` this is the finite limit `ln(2^(ν-1) Γ(ν))`. Negative or
/// non-finite arguments yield NaN.
pub fn ln_scaled_bessel_k(nu: f64, z: f64) -> f64 {
    if !(nu > 0.) || !(z >= 0.) || !z.is_finite() {
        return f64::NAN;
    }

    if z == 0. {
        return (nu - 1.) * f64::consts::LN_2 + ln_gamma(nu);
    }

    if nu >= DEBYE_THRESHOLD {
        debye_ln_scaled(nu, z)
    } else {
        nu * z.ln() + integral_ln_bessel_k(nu, z)
    }
}


/// `ln K_ν(z)` for `ν > 0` and `z > 0`.
pub fn ln_bessel_k(nu: f64, z: f64) -> f64 {
    if !(z > 0.) {
        return f64::NAN;
    }

    ln_scaled_bessel_k(nu, z) - nu * z.ln()
}


/// `ln cosh(x)` without overflow.
#[inline]
fn ln_cosh(x: f64) -> f64 {
    let x = x.abs();
    x + (-2. * x).exp().ln_1p() - f64::consts::LN_2
}


fn integral_ln_bessel_k(nu: f64, z: f64) -> f64 {
    // The integrand is a Gaussian of width ~1/sqrt(z) for large z.
    let step = 0.05_f64.min(0.25 / z.sqrt());
    let ln_z = z.ln();
    let phi = |t: f64| -(ln_z + ln_cosh(t)).exp() + ln_cosh(nu * t);

    let mut peak = phi(0.);
    let mut sum = 0.5;

    for i in 1..MAX_INTEGRAL_STEPS {
        let p = phi(i as f64 * step);

        if p > peak {
            sum = sum * (peak - p).exp() + 1.;
            peak = p;
        } else {
            sum += (p - peak).exp();

            // The exponent is unimodal in t; once we are this far below its
            // maximum we can only be on the far side of it.
            if p < peak - 50. {
                break;
            }
        }
    }

    peak + (sum * step).ln()
}


fn debye_ln_scaled(nu: f64, z: f64) -> f64 {
    let x = z / nu;
    let root = (1. + x * x).sqrt();
    let t = 1. / root;
    let t2 = t * t;

    let u1 = t * (3. - 5. * t2) / 24.;
    let u2 = t2 * (81. + t2 * (-462. + t2 * 385.)) / 1152.;
    let u3 = t * t2 * (30375. + t2 * (-369603. + t2 * (765765. - t2 * 425425.))) / 414720.;
    let u4 = t2 * t2 * (4465125. + t2 * (-94121676. + t2 * (349922430.
        + t2 * (-446185740. + t2 * 185910725.)))) / 39813120.;

    let inv = 1. / nu;
    let series = 1. + inv * (-u1 + inv * (u2 + inv * (-u3 + inv * u4)));
    let hyp = nu * root;

    nu * (nu + hyp).ln() - hyp
        + 0.5 * (f64::consts::PI / (2. * nu)).ln()
        - 0.5 * root.ln()
        + series.ln()
}
