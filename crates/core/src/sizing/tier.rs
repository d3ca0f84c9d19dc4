use crate::domain::catalog::Tier;

/// Escalation thresholds, lowest first. Exceeding either figure of a step
/// raises the tier by one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TierThreshold {
    pub kw: f64,
    pub kwh: f64,
}

pub const TIER_THRESHOLDS: [TierThreshold; 3] = [
    TierThreshold { kw: 1.5, kwh: 2.0 },
    TierThreshold { kw: 3.5, kwh: 5.0 },
    TierThreshold { kw: 6.5, kwh: 12.0 },
];

pub fn classify(raw_kw: f64, raw_kwh: f64) -> Tier {
    TIER_THRESHOLDS.iter().fold(Tier::A, |tier, threshold| {
        if raw_kw > threshold.kw || raw_kwh > threshold.kwh {
            tier.escalate()
        } else {
            tier
        }
    })
}
