pub struct StatsHelper;

impl StatsHelper {
    /// Percentile with linear interpolation between the two nearest order
    /// statistics. `q` is in percent.
    pub fn percentile(samples: &[f32], q: f32) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f32;
        let lower = rank.floor() as usize;
        let upper = rank.ceil() as usize;
        let frac = rank - lower as f32;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }

    pub fn min_max<'a, I>(samples: I) -> Option<(f32, f32)>
    where
        I: IntoIterator<Item = &'a f32>,
    {
        samples.into_iter().fold(None, |acc, &value| match acc {
            None => Some((value, value)),
            Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
        })
    }
}
