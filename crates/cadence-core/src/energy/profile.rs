//! Energy profile types and builder.
//!
//! An energy profile maps an hour of day to the user's typical energy
//! (0.0-1.0), learned from timestamped health samples.

use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EnergyConfig;

/// Neutral energy used when there is no history at all.
pub const NEUTRAL_ENERGY: f64 = 0.5;

/// Longest accepted lookback window (about ten years).
pub const MAX_LOOKBACK_DAYS: i64 = 3660;

/// One historical energy reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergySample {
    pub timestamp: DateTime<Utc>,
    /// Reported energy (0-100)
    pub energy: f64,
}

impl EnergySample {
    pub fn new(timestamp: DateTime<Utc>, energy: f64) -> Self {
        Self { timestamp, energy }
    }

    fn is_well_formed(&self) -> bool {
        self.energy.is_finite() && (0.0..=100.0).contains(&self.energy)
    }
}

/// Averaged energy for one hour of the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourBucket {
    /// Hour of day (0-23)
    pub hour: u8,
    /// Mean energy of the samples in this hour (0.0-1.0)
    pub average: f64,
    /// Number of samples used for this hour
    pub sample_count: u64,
}

impl HourBucket {
    fn empty(hour: u8) -> Self {
        Self {
            hour,
            average: NEUTRAL_ENERGY,
            sample_count: 0,
        }
    }

    pub fn is_populated(&self) -> bool {
        self.sample_count > 0
    }
}

/// Hour-of-day energy model for one user.
///
/// Read-only once built; every lookup is deterministic for a fixed sample
/// set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyProfile {
    /// 24 buckets, indexed by hour
    buckets: Vec<HourBucket>,
    /// Interpolated energy per hour, indexed by hour
    resolved: Vec<f64>,
    peak_hours: Vec<u8>,
    peak_threshold: f64,
    neutral_energy: f64,
}

impl Default for EnergyProfile {
    fn default() -> Self {
        EnergyProfileBuilder::new().build(&[], DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl EnergyProfile {
    /// Estimated energy (0.0-1.0) at a time of day.
    pub fn energy_at(&self, time: NaiveTime) -> f64 {
        self.energy_at_hour(time.hour() as u8)
    }

    pub fn energy_at_hour(&self, hour: u8) -> f64 {
        self.resolved
            .get(hour as usize)
            .copied()
            .unwrap_or(self.neutral_energy)
    }

    /// Hours whose energy is in the top quartile or above the absolute
    /// threshold, ascending.
    pub fn peak_hours(&self) -> &[u8] {
        &self.peak_hours
    }

    pub fn is_peak_hour(&self, hour: u8) -> bool {
        self.peak_hours.binary_search(&hour).is_ok()
    }

    pub fn hourly(&self) -> &[HourBucket] {
        &self.buckets
    }

    /// Number of samples the profile was built from.
    pub fn sample_count(&self) -> u64 {
        self.buckets.iter().map(|b| b.sample_count).sum()
    }

    pub fn has_history(&self) -> bool {
        self.sample_count() > 0
    }

    pub fn peak_threshold(&self) -> f64 {
        self.peak_threshold
    }

    /// Render the profile as an ASCII chart.
    pub fn render_ascii_chart(&self) -> String {
        let mut output = String::from("\nEnergy Profile:\n");
        output.push_str(&"─".repeat(50));
        output.push('\n');

        for bucket in &self.buckets {
            let energy = self.energy_at_hour(bucket.hour);
            let bar_length = ((energy * 30.0) as usize).min(30);
            let bar = "█".repeat(bar_length);
            let empty = " ".repeat(30 - bar_length);

            let marker = if self.is_peak_hour(bucket.hour) {
                "▲"
            } else if bucket.is_populated() {
                "●"
            } else {
                "·"
            };

            output.push_str(&format!(
                "{:02}:00 {}{}{} {:.0}%\n",
                bucket.hour,
                bar,
                empty,
                marker,
                energy * 100.0
            ));
        }

        output.push_str(&"─".repeat(50));
        output.push_str("\n▲ Peak  ● Measured  · Interpolated\n");
        output
    }

    /// Best-hours recommendations, strongest first.
    pub fn recommendations(&self) -> Vec<String> {
        let mut populated: Vec<_> = self.buckets.iter().filter(|b| b.is_populated()).collect();

        if populated.is_empty() {
            return vec![
                "Not enough data yet. Keep logging energy readings to build your profile.".to_string(),
            ];
        }

        populated.sort_by(|a, b| b.average.total_cmp(&a.average).then(a.hour.cmp(&b.hour)));

        let mut recommendations: Vec<String> = populated
            .iter()
            .take(3)
            .enumerate()
            .map(|(i, bucket)| {
                format!(
                    "{}. Best time: {:02}:00 ({}% energy, {} samples)",
                    i + 1,
                    bucket.hour,
                    (bucket.average * 100.0).round() as u32,
                    bucket.sample_count
                )
            })
            .collect();

        if let Some(worst) = populated.last() {
            if worst.average < 0.4 {
                recommendations.push(format!(
                    "⚠ Avoid demanding work around {:02}:00 (low energy period)",
                    worst.hour
                ));
            }
        }

        recommendations
    }
}

/// Builds [`EnergyProfile`]s from raw samples.
#[derive(Debug, Clone)]
pub struct EnergyProfileBuilder {
    /// Samples older than this many days before `as_of` are ignored
    pub lookback_days: i64,
    /// Absolute peak threshold (0.0-1.0)
    pub peak_threshold: f64,
    /// Energy reported when there is no history
    pub neutral_energy: f64,
}

impl Default for EnergyProfileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EnergyProfileBuilder {
    pub fn new() -> Self {
        Self {
            lookback_days: 30,
            peak_threshold: 0.75,
            neutral_energy: NEUTRAL_ENERGY,
        }
    }

    pub fn from_config(config: &EnergyConfig) -> Self {
        Self {
            lookback_days: config.lookback_days,
            peak_threshold: config.peak_threshold,
            neutral_energy: config.neutral_energy,
        }
    }

    /// Build a profile from the samples inside the lookback window ending at
    /// `as_of`. Malformed samples are skipped; never fails.
    pub fn build(&self, samples: &[EnergySample], as_of: DateTime<Utc>) -> EnergyProfile {
        let window_start = Duration::try_days(self.lookback_days.max(0))
            .and_then(|lookback| as_of.checked_sub_signed(lookback))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut sums = [0.0f64; 24];
        let mut counts = [0u64; 24];
        let mut skipped = 0usize;

        for sample in samples {
            if !sample.is_well_formed() {
                skipped += 1;
                continue;
            }
            if sample.timestamp < window_start || sample.timestamp > as_of {
                continue;
            }
            let hour = sample.timestamp.hour() as usize;
            sums[hour] += sample.energy / 100.0;
            counts[hour] += 1;
        }

        if skipped > 0 {
            tracing::warn!(skipped, "ignored malformed energy samples");
        }

        let buckets: Vec<HourBucket> = (0..24u8)
            .map(|hour| {
                let i = hour as usize;
                if counts[i] == 0 {
                    HourBucket {
                        average: self.neutral_energy,
                        ..HourBucket::empty(hour)
                    }
                } else {
                    HourBucket {
                        hour,
                        average: sums[i] / counts[i] as f64,
                        sample_count: counts[i],
                    }
                }
            })
            .collect();

        let resolved = self.interpolate(&buckets);
        let peak_hours = self.compute_peak_hours(&buckets);

        tracing::debug!(
            samples = buckets.iter().map(|b| b.sample_count).sum::<u64>(),
            populated = buckets.iter().filter(|b| b.is_populated()).count(),
            ?peak_hours,
            "built energy profile"
        );

        EnergyProfile {
            buckets,
            resolved,
            peak_hours,
            peak_threshold: self.peak_threshold,
            neutral_energy: self.neutral_energy,
        }
    }

    /// Fill empty hours from the nearest populated hour; the earlier hour
    /// wins a tie.
    fn interpolate(&self, buckets: &[HourBucket]) -> Vec<f64> {
        let populated: Vec<&HourBucket> = buckets.iter().filter(|b| b.is_populated()).collect();
        if populated.is_empty() {
            return vec![self.neutral_energy; 24];
        }

        buckets
            .iter()
            .map(|bucket| {
                if bucket.is_populated() {
                    return bucket.average;
                }
                populated
                    .iter()
                    .min_by_key(|p| ((p.hour as i32 - bucket.hour as i32).abs(), p.hour))
                    .map(|p| p.average)
                    .unwrap_or(self.neutral_energy)
            })
            .collect()
    }

    fn compute_peak_hours(&self, buckets: &[HourBucket]) -> Vec<u8> {
        let mut averages: Vec<f64> = buckets
            .iter()
            .filter(|b| b.is_populated())
            .map(|b| b.average)
            .collect();
        if averages.is_empty() {
            return Vec::new();
        }
        averages.sort_by(|a, b| a.total_cmp(b));
        let (bottom_cut, top_cut) = quartile_cuts(&averages);

        buckets
            .iter()
            .filter(|b| b.is_populated())
            .filter(|b| {
                b.average >= self.peak_threshold || (b.average >= top_cut && b.average > bottom_cut)
            })
            .map(|b| b.hour)
            .collect()
    }
}

/// Largest value of the bottom quartile and smallest value of the top
/// quartile of an ascending, non-empty slice.
fn quartile_cuts(sorted: &[f64]) -> (f64, f64) {
    let n = sorted.len();
    let k = n.div_ceil(4);
    (sorted[k - 1], sorted[n - k])
}
