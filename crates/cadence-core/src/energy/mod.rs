//! Energy profile module.
//!
//! Learns the user's typical energy at each hour of the day from historical
//! health samples, and derives the peak hours used by ranking and insights.

mod profile;

pub use profile::{
    EnergyProfile, EnergyProfileBuilder, EnergySample, HourBucket, MAX_LOOKBACK_DAYS, NEUTRAL_ENERGY,
};
