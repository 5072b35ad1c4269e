//! Quantizes a numeric series into 8 block glyphs, lowest to tallest.

pub const SPARK_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Converts a series to a sparkline string.
///
/// The bounds default to the observed minimum and maximum of the series;
/// explicit overrides narrow or widen the scale, with out-of-range values
/// clamping to the end glyphs. A flat series graphs as a baseline.
pub fn sparkify(series: &[f64], minimum: Option<f64>, maximum: Option<f64>) -> String {
    if series.is_empty() {
        return String::new();
    }

    let observed_min = series.iter().copied().fold(f64::INFINITY, f64::min);
    let observed_max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let minimum = minimum.unwrap_or(observed_min);
    let maximum = maximum.unwrap_or(observed_max);

    let range = maximum - minimum;
    if range == 0.0 {
        // Graph a baseline if every input value is equal.
        return SPARK_CHARS[0].to_string().repeat(series.len());
    }

    let top = (SPARK_CHARS.len() - 1) as f64;
    let coefficient = top / range;

    series
        .iter()
        .map(|value| {
            let level = ((value - minimum) * coefficient).round().clamp(0.0, top);
            SPARK_CHARS[level as usize]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_series_graph_as_a_baseline() {
        assert_eq!(sparkify(&[1.0, 1.0, 1.0], None, None), "▁▁▁");
    }

    #[test]
    fn extremes_map_to_the_end_glyphs() {
        assert_eq!(sparkify(&[0.0, 7.0], None, None), "▁█");
    }

    #[test]
    fn a_typical_series_quantizes_to_eight_levels() {
        let series = [
            0.5, 1.2, 3.5, 7.3, 8.0, 12.5, 13.2, 15.0, 14.2, 11.8, 6.1, 1.9,
        ];

        assert_eq!(sparkify(&series, None, None), "▁▁▂▄▅▇▇██▆▄▂");
    }

    #[test]
    fn negative_values_are_fine() {
        assert_eq!(
            sparkify(&[1.0, 1.0, -2.0, 3.0, -5.0, 8.0, -13.0], None, None),
            "▆▆▅▆▄█▁"
        );
    }

    #[test]
    fn explicit_bounds_override_the_observed_ones() {
        // with the observed minimum of 5 this would graph ▁█
        assert_eq!(sparkify(&[5.0, 10.0], Some(0.0), None), "▅█");
    }

    #[test]
    fn values_outside_explicit_bounds_clamp() {
        assert_eq!(sparkify(&[0.0, 50.0], None, Some(10.0)), "▁█");
    }

    #[test]
    fn an_empty_series_graphs_as_nothing() {
        assert_eq!(sparkify(&[], None, None), "");
    }
}
