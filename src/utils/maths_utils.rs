use argminmax::ArgMinMax;
use statrs::statistics::Statistics;

/// Largest value in `vec`, `None` when empty.
pub fn get_max(vec: &[f64]) -> Option<f64> {
    if vec.is_empty() {
        return None;
    }
    let max_index: usize = vec.argmax();
    Some(vec[max_index])
}

/// Arithmetic mean, `None` when empty.
pub fn mean(vec: &[f64]) -> Option<f64> {
    if vec.is_empty() {
        return None;
    }
    Some(vec.iter().mean())
}

/// Mean over the defined (Some and finite) values only.
/// Returns `None` when nothing is defined, so callers never compare against NaN.
pub fn mean_defined<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let defined: Vec<f64> = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();
    mean(&defined)
}

/// `(current - previous) / previous * 100`. Undefined when `previous` is zero.
pub fn percent_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    let pct = (current - previous) / previous * 100.0;
    pct.is_finite().then_some(pct)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_and_mean_handle_empty_input() {
        assert_eq!(get_max(&[]), None);
        assert_eq!(mean(&[]), None);
        assert_eq!(get_max(&[1.0, 5.0, 3.0]), Some(5.0));
        assert!((mean(&[1.0, 2.0, 3.0]).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn percent_change_is_undefined_for_zero_base() {
        assert_eq!(percent_change(0.0, 5.0), None);
        assert!((percent_change(10.0, 11.0).unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn mean_defined_skips_missing_values() {
        assert_eq!(mean_defined(vec![None, None]), None);
        let m = mean_defined(vec![None, Some(2.0), Some(4.0), Some(f64::NAN)]).unwrap();
        assert!((m - 3.0).abs() < 1e-12);
    }
}
