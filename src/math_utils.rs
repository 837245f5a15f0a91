/// Mathematical utility functions for the thermal models
///
/// This module provides the small numerical helpers shared by the finite
/// difference solver and the closed-form solutions.

/// Assert that the deviation between two values is less than a threshold
///
/// This macro combines deviation calculation with assertion for cleaner test code.
/// It calculates the percentage deviation between `actual` and `expected`, then
/// asserts that this deviation is less than the specified `max_deviation`.
///
/// # Examples
/// See the test cases below for usage examples.
#[macro_export]
macro_rules! assert_deviation {
    ($actual:expr, $expected:expr, $max_deviation:expr) => {
        {
            let actual_val = $actual;
            let expected_val = $expected;
            let max_dev = $max_deviation;
            let actual_deviation = $crate::math_utils::deviation(actual_val, expected_val);

            if actual_deviation >= max_dev {
                panic!(
                    "assertion failed: deviation {:.2}% >= {:.2}%\n  actual: {:?},\n  expected: {:?}",
                    actual_deviation, max_dev, actual_val, expected_val
                );
            }
        }
    };
    ($actual:expr, $expected:expr, $max_deviation:expr, $($arg:tt)+) => {
        {
            let actual_val = $actual;
            let expected_val = $expected;
            let max_dev = $max_deviation;
            let actual_deviation = $crate::math_utils::deviation(actual_val, expected_val);

            if actual_deviation >= max_dev {
                panic!(
                    "assertion failed: deviation {:.2}% >= {:.2}%: {}\n  actual: {:?},\n  expected: {:?}",
                    actual_deviation, max_dev, format_args!($($arg)+), actual_val, expected_val
                );
            }
        }
    };
}

/// Linear interpolation between two values
///
/// # Examples
/// ```
/// use geotherm_rust::math_utils::lerp;
///
/// assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
/// assert_eq!(lerp(100.0, 200.0, 0.25), 125.0);
/// ```
pub fn lerp(a: f64, b: f64, ratio: f64) -> f64 {
    a + (b - a) * ratio
}

/// Inverse linear interpolation - find the ratio for a given value
///
/// Given a value between a and b, returns the ratio that would produce
/// that value via linear interpolation. The ratio is not clamped, so values
/// outside [a, b] map outside [0, 1].
///
/// # Examples
/// ```
/// use geotherm_rust::math_utils::inverse_lerp;
///
/// assert_eq!(inverse_lerp(100.0, 200.0, 150.0), 0.5);
/// // works with a descending range too
/// assert_eq!(inverse_lerp(1200.0, 700.0, 950.0), 0.5);
/// ```
pub fn inverse_lerp(a: f64, b: f64, value: f64) -> f64 {
    if (b - a).abs() < f64::EPSILON {
        0.0 // Avoid division by zero
    } else {
        (value - a) / (b - a)
    }
}

/// `n` evenly spaced samples over the closed interval [start, end]
///
/// The last sample is exactly `end`; a single sample returns `[start]`.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let last = (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { lerp(start, end, i as f64 / last) })
                .collect()
        }
    }
}

/// Error function, Abramowitz and Stegun approximation 7.1.26
///
/// Maximum absolute error is about 1.5e-7. The approximation is evaluated on
/// |x| and the sign restored afterwards, so `erf(-x) == -erf(x)` holds exactly.
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();

    sign * y
}

/// Calculate the percentage deviation between two values
///
/// Returns the percentage difference of `actual` from `expected`.
///
/// # Examples
/// ```
/// use geotherm_rust::math_utils::deviation;
///
/// assert_eq!(deviation(105.0, 100.0), 5.0);
/// assert_eq!(deviation(95.0, 100.0), 5.0);
/// ```
pub fn deviation(actual: f64, expected: f64) -> f64 {
    if expected.abs() < f64::EPSILON {
        // if expected is 0, return 0 if actual is also 0
        if actual.abs() < f64::EPSILON {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        ((actual - expected).abs() / expected.abs()) * 100.0
    }
}
