/// The arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// The population standard deviation, `None` for an empty slice
pub fn standard_deviation(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    Some(
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64).sqrt(),
    )
}

/// The mass error of `observed` relative to `reference` in ppm
pub fn ppm(observed: f64, reference: f64) -> f64 {
    (observed - reference) / reference * 1e6
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn statistics() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(standard_deviation(&[2.0, 2.0]), Some(0.0));
        assert_eq!(standard_deviation(&[1.0, 3.0]), Some(1.0));
    }

    #[test]
    fn ppm_error() {
        assert!((ppm(1000.01, 1000.0) - 10.0).abs() < 1e-6);
        assert!((ppm(999.99, 1000.0) + 10.0).abs() < 1e-6);
    }
}
