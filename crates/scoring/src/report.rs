//! Conversion rate report by status tier

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use lead_qualifier_core::LeadStatus;

/// One observed lead outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadOutcome {
    pub status: LeadStatus,
    pub converted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierConversion {
    pub status: LeadStatus,
    pub leads: usize,
    pub conversions: usize,
    /// `conversions / leads`, 0 when the tier is empty
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionReport {
    pub total_leads: usize,
    /// Hot, Warm, Cold in that order
    pub tiers: Vec<TierConversion>,
}

impl ConversionReport {
    pub fn from_outcomes<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = (LeadStatus, bool)>,
    {
        let mut counts = [(0usize, 0usize); 3];
        for (status, converted) in outcomes {
            let slot = &mut counts[tier_index(status)];
            slot.0 += 1;
            slot.1 += usize::from(converted);
        }

        let tiers = LeadStatus::ALL
            .iter()
            .zip(counts)
            .map(|(&status, (leads, conversions))| TierConversion {
                status,
                leads,
                conversions,
                conversion_rate: if leads > 0 {
                    conversions as f64 / leads as f64
                } else {
                    0.0
                },
            })
            .collect();

        Self {
            total_leads: counts.iter().map(|(leads, _)| leads).sum(),
            tiers,
        }
    }

    pub fn tier(&self, status: LeadStatus) -> Option<&TierConversion> {
        self.tiers.iter().find(|t| t.status == status)
    }

    /// Human-readable summary with percentages to two decimals
    pub fn summary(&self) -> String {
        let mut out = format!("Total Leads: {}\n", self.total_leads);
        for tier in &self.tiers {
            let _ = writeln!(
                out,
                "{} Lead Conversion Rate: {:.2}%",
                tier.status,
                tier.conversion_rate * 100.0
            );
        }
        out
    }
}

impl FromIterator<LeadOutcome> for ConversionReport {
    fn from_iter<T: IntoIterator<Item = LeadOutcome>>(iter: T) -> Self {
        Self::from_outcomes(iter.into_iter().map(|o| (o.status, o.converted)))
    }
}

fn tier_index(status: LeadStatus) -> usize {
    match status {
        LeadStatus::Hot => 0,
        LeadStatus::Warm => 1,
        LeadStatus::Cold => 2,
    }
}
