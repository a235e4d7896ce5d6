//! Dashboard content around a prediction: risk band, headline, key factors
//! and the static retention material.

use serde::Serialize;

use crate::form::AttributeRecord;
use crate::predictor::{ChurnLabel, PredictionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    Moderate,
    High,
}

impl RiskBand {
    /// Gauge steps: [0, 30) low, [30, 70) moderate, [70, 100] high.
    pub fn from_percent(percent: f64) -> Self {
        if percent < 30.0 {
            RiskBand::Low
        } else if percent < 70.0 {
            RiskBand::Moderate
        } else {
            RiskBand::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub title: String,
    pub detail: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Factor {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub title: &'static str,
    pub actions: &'static [&'static str],
}

pub static RECOMMENDATIONS: [Recommendation; 2] = [
    Recommendation {
        title: "Retention Strategies",
        actions: &[
            "Personalized retention call",
            "15-20% discount offer",
            "Free service upgrade",
        ],
    },
    Recommendation {
        title: "Growth Opportunities",
        actions: &[
            "Upsell premium features",
            "Referral program",
            "Family plan options",
        ],
    },
];

pub static TIPS: [&str; 2] = [
    "Customers with longer contracts churn less",
    "Tech support reduces churn by 18%",
];

/// Everything the result panel shows for one prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub churn_percent: f64,
    pub risk_band: RiskBand,
    pub headline: Headline,
    pub key_factors: Vec<Factor>,
    pub profile: Vec<Factor>,
    pub recommendations: &'static [Recommendation],
    pub tips: &'static [&'static str],
}

impl Summary {
    pub fn new(result: &PredictionResult, record: &AttributeRecord) -> Self {
        let percent = result.churn_percent();

        let headline = match result.label {
            ChurnLabel::Churn => Headline {
                title: format!("High Churn Risk: {percent:.1}%"),
                detail: "This customer is likely to cancel service",
            },
            ChurnLabel::Stay => Headline {
                title: format!("Low Churn Risk: {percent:.1}%"),
                detail: "This customer is likely to stay",
            },
        };

        let key_factors = vec![
            factor("Contract", record.contract().to_string()),
            factor("Monthly", dollars(record.monthly_charges().value())),
            factor("Payment", record.payment_method().to_string()),
            factor("Internet", record.internet_service().to_string()),
        ];

        let profile = vec![
            factor("Contract", record.contract().to_string()),
            factor("Tenure", record.tenure_group().to_string()),
            factor("Monthly", dollars(record.monthly_charges().value())),
            factor("Total Spent", dollars_grouped(record.total_charges().value())),
        ];

        Summary {
            churn_percent: percent,
            risk_band: RiskBand::from_percent(percent),
            headline,
            key_factors,
            profile,
            recommendations: &RECOMMENDATIONS,
            tips: &TIPS,
        }
    }
}

fn factor(label: &'static str, value: String) -> Factor {
    Factor { label, value }
}

// Slider values are whole dollars; keep cents only when present
fn dollars(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("${amount:.0}")
    } else {
        format!("${amount:.2}")
    }
}

/// `$1,234` style: rounded to whole dollars with thousands separators.
fn dollars_grouped(amount: f64) -> String {
    let whole = format!("{:.0}", amount.abs());
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{Contract, TotalCharges};
    use crate::form::FormSelections;

    #[test]
    fn test_risk_band_boundaries() {
        assert_eq!(RiskBand::from_percent(0.0), RiskBand::Low);
        assert_eq!(RiskBand::from_percent(29.9), RiskBand::Low);
        assert_eq!(RiskBand::from_percent(30.0), RiskBand::Moderate);
        assert_eq!(RiskBand::from_percent(69.9), RiskBand::Moderate);
        assert_eq!(RiskBand::from_percent(70.0), RiskBand::High);
        assert_eq!(RiskBand::from_percent(100.0), RiskBand::High);
    }

    #[test]
    fn test_money_formatting() {
        assert_eq!(dollars(70.0), "$70");
        assert_eq!(dollars(70.5), "$70.50");
        assert_eq!(dollars_grouped(100.0), "$100");
        assert_eq!(dollars_grouped(2000.0), "$2,000");
        assert_eq!(dollars_grouped(10000.0), "$10,000");
        assert_eq!(dollars_grouped(1234567.4), "$1,234,567");
    }

    #[test]
    fn test_summary_for_churn() {
        let record = FormSelections {
            contract: Contract::Monthly,
            total_charges: TotalCharges::try_from(2000.0).unwrap(),
            ..Default::default()
        }
        .resolve();
        let result = PredictionResult {
            label: ChurnLabel::Churn,
            churn_probability: 0.8234,
        };
        let summary = Summary::new(&result, &record);

        assert_eq!(summary.churn_percent, 82.3);
        assert_eq!(summary.risk_band, RiskBand::High);
        assert_eq!(summary.headline.title, "High Churn Risk: 82.3%");
        assert_eq!(summary.headline.detail, "This customer is likely to cancel service");
        assert_eq!(summary.key_factors[0].value, "Monthly");
        assert_eq!(summary.key_factors[1].value, "$70");
        assert_eq!(summary.key_factors[2].value, "Electronic Check");
        assert_eq!(summary.key_factors[3].value, "DSL");
        assert_eq!(summary.profile[3].value, "$2,000");
        assert_eq!(summary.recommendations.len(), 2);
    }

    #[test]
    fn test_summary_for_stay() {
        let record = FormSelections::default().resolve();
        let result = PredictionResult {
            label: ChurnLabel::Stay,
            churn_probability: 0.12,
        };
        let summary = Summary::new(&result, &record);
        assert_eq!(summary.headline.title, "Low Churn Risk: 12.0%");
        assert_eq!(summary.risk_band, RiskBand::Low);
    }
}
