//! Customer attribute domains.
//!
//! Every categorical field is a closed enum whose labels are exactly the
//! strings the classifier saw at training time, so `<field>_<label>` is the
//! one-hot column name. Bounded numerics are newtypes that can only be
//! built through a range check.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Column names of the customer frame, in training-frame order.
pub mod columns {
    pub const SENIOR_CITIZEN: &str = "SeniorCitizen";
    pub const PARTNER: &str = "Partner";
    pub const DEPENDENTS: &str = "Dependents";
    pub const PHONE_SERVICE: &str = "PhoneService";
    pub const MULTIPLE_LINES: &str = "MultipleLines";
    pub const INTERNET_SERVICE: &str = "InternetService";
    pub const ONLINE_SECURITY: &str = "OnlineSecurity";
    pub const ONLINE_BACKUP: &str = "OnlineBackup";
    pub const DEVICE_PROTECTION: &str = "DeviceProtection";
    pub const TECH_SUPPORT: &str = "TechSupport";
    pub const STREAMING_TV: &str = "StreamingTV";
    pub const STREAMING_MOVIES: &str = "StreamingMovies";
    pub const CONTRACT: &str = "Contract";
    pub const PAPERLESS_BILLING: &str = "PaperlessBilling";
    pub const PAYMENT_METHOD: &str = "PaymentMethod";
    pub const MONTHLY_CHARGES: &str = "MonthlyCharges";
    pub const TOTAL_CHARGES: &str = "TotalCharges";
    pub const TENURE_GROUP: &str = "tenure_group";

    /// Columns that pass through encoding unchanged.
    pub const NUMERIC: [&str; 3] = [SENIOR_CITIZEN, MONTHLY_CHARGES, TOTAL_CHARGES];

    /// The six fields gated by the internet service selection.
    pub const INTERNET_ADDONS: [&str; 6] = [
        ONLINE_SECURITY,
        ONLINE_BACKUP,
        DEVICE_PROTECTION,
        TECH_SUPPORT,
        STREAMING_TV,
        STREAMING_MOVIES,
    ];
}

/// A closed set of labels for one categorical column.
pub trait Categorical: Copy + Eq + 'static {
    /// Every value, in the order the form offers them.
    const DOMAIN: &'static [Self];

    /// The "not applicable" value forced by a closed gate, if the type has one.
    const SENTINEL: Option<Self> = None;

    fn label(self) -> &'static str;
}

macro_rules! categorical {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $label:literal),+ $(,)? }
        $(sentinel = $sentinel:ident)?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl Categorical for $name {
            const DOMAIN: &'static [Self] = &[$(Self::$variant),+];
            $(const SENTINEL: Option<Self> = Some(Self::$sentinel);)?

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        // First option of the select is the form default
        impl Default for $name {
            fn default() -> Self {
                Self::DOMAIN[0]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

categorical! {
    /// Plain binary choice.
    YesNo { No => "No", Yes => "Yes" }
}

categorical! {
    /// `MultipleLines`, gated by phone service.
    LineOption { No => "No", Yes => "Yes", NoPhoneService => "No phone service" }
    sentinel = NoPhoneService
}

categorical! {
    /// The six internet add-ons, gated by internet service.
    AddonOption { No => "No", Yes => "Yes", NoInternetService => "No internet service" }
    sentinel = NoInternetService
}

categorical! {
    InternetService { Dsl => "DSL", FiberOptic => "Fiber optic", None => "None" }
}

categorical! {
    Contract { Monthly => "Monthly", OneYear => "1 Year", TwoYears => "2 Years" }
}

categorical! {
    PaymentMethod {
        ElectronicCheck => "Electronic Check",
        MailedCheck => "Mailed Check",
        BankTransfer => "Bank Transfer",
        CreditCard => "Credit Card",
    }
}

categorical! {
    /// Twelve-month tenure buckets covering 1-72 months.
    TenureGroup {
        Months1To12 => "1-12 mo",
        Months13To24 => "13-24 mo",
        Months25To36 => "25-36 mo",
        Months37To48 => "37-48 mo",
        Months49To60 => "49-60 mo",
        Months61To72 => "61-72 mo",
    }
}

categorical! {
    /// How the form asks for `SeniorCitizen`.
    AgeGroup { Under60 => "Under 60", SixtyPlus => "60+" }
}

impl YesNo {
    pub fn is_yes(self) -> bool {
        self == YesNo::Yes
    }
}

impl From<YesNo> for LineOption {
    fn from(choice: YesNo) -> Self {
        match choice {
            YesNo::No => LineOption::No,
            YesNo::Yes => LineOption::Yes,
        }
    }
}

impl From<YesNo> for AddonOption {
    fn from(choice: YesNo) -> Self {
        match choice {
            YesNo::No => AddonOption::No,
            YesNo::Yes => AddonOption::Yes,
        }
    }
}

impl InternetService {
    pub fn is_subscribed(self) -> bool {
        self != InternetService::None
    }
}

impl TenureGroup {
    /// Months covered by the bucket.
    pub fn months(self) -> RangeInclusive<u32> {
        let index = Self::DOMAIN
            .iter()
            .position(|&g| g == self)
            .unwrap_or_default() as u32;
        let start = index * 12 + 1;
        start..=start + 11
    }
}

impl AgeGroup {
    /// `SeniorCitizen` as the 0/1 flag the classifier was trained on.
    pub fn senior_flag(self) -> f64 {
        match self {
            AgeGroup::Under60 => 0.0,
            AgeGroup::SixtyPlus => 1.0,
        }
    }
}

/// A numeric input outside its allowed range.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field} must be within [{min}, {max}], got {value}")]
pub struct RangeError {
    pub field: &'static str,
    pub min: f64,
    pub max: f64,
    pub value: f64,
}

macro_rules! bounded {
    ($(#[$meta:meta])* $name:ident, $field:expr, $min:literal ..= $max:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
        #[serde(try_from = "f64", into = "f64")]
        pub struct $name(f64);

        impl $name {
            pub const MIN: f64 = $min;
            pub const MAX: f64 = $max;

            pub fn value(self) -> f64 {
                self.0
            }
        }

        impl TryFrom<f64> for $name {
            type Error = RangeError;

            fn try_from(value: f64) -> Result<Self, Self::Error> {
                // NaN fails the contains check as well
                if (Self::MIN..=Self::MAX).contains(&value) {
                    Ok(Self(value))
                } else {
                    Err(RangeError {
                        field: $field,
                        min: Self::MIN,
                        max: Self::MAX,
                        value,
                    })
                }
            }
        }

        impl From<$name> for f64 {
            fn from(v: $name) -> f64 {
                v.0
            }
        }
    };
}

bounded! {
    /// Monthly bill in dollars.
    MonthlyCharges, columns::MONTHLY_CHARGES, 20.0 ..= 120.0
}

bounded! {
    /// Lifetime spend in dollars.
    TotalCharges, columns::TOTAL_CHARGES, 100.0 ..= 10000.0
}

impl Default for MonthlyCharges {
    fn default() -> Self {
        Self(70.0)
    }
}

impl Default for TotalCharges {
    fn default() -> Self {
        Self(2000.0)
    }
}

/// Labels of one categorical column, used to enumerate every one-hot column
/// an attribute record can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDomain {
    pub field: &'static str,
    pub labels: Vec<&'static str>,
    pub sentinel: Option<&'static str>,
}

impl FieldDomain {
    pub fn of<T: Categorical>(field: &'static str) -> Self {
        Self {
            field,
            labels: T::DOMAIN.iter().map(|v| v.label()).collect(),
            sentinel: T::SENTINEL.map(|v| v.label()),
        }
    }

    /// `<field>_<label>` for every label.
    pub fn column_names(&self) -> impl Iterator<Item = String> + '_ {
        self.labels.iter().map(move |label| one_hot_name(self.field, label))
    }

    pub fn sentinel_column(&self) -> Option<String> {
        self.sentinel.map(|label| one_hot_name(self.field, label))
    }
}

/// Column name of a one-hot indicator.
pub fn one_hot_name(field: &str, label: &str) -> String {
    format!("{field}_{label}")
}

/// Every categorical column of the customer frame with its domain.
pub fn field_domains() -> Vec<FieldDomain> {
    use columns::*;

    vec![
        FieldDomain::of::<YesNo>(PARTNER),
        FieldDomain::of::<YesNo>(DEPENDENTS),
        FieldDomain::of::<YesNo>(PHONE_SERVICE),
        FieldDomain::of::<LineOption>(MULTIPLE_LINES),
        FieldDomain::of::<InternetService>(INTERNET_SERVICE),
        FieldDomain::of::<AddonOption>(ONLINE_SECURITY),
        FieldDomain::of::<AddonOption>(ONLINE_BACKUP),
        FieldDomain::of::<AddonOption>(DEVICE_PROTECTION),
        FieldDomain::of::<AddonOption>(TECH_SUPPORT),
        FieldDomain::of::<AddonOption>(STREAMING_TV),
        FieldDomain::of::<AddonOption>(STREAMING_MOVIES),
        FieldDomain::of::<Contract>(CONTRACT),
        FieldDomain::of::<YesNo>(PAPERLESS_BILLING),
        FieldDomain::of::<PaymentMethod>(PAYMENT_METHOD),
        FieldDomain::of::<TenureGroup>(TENURE_GROUP),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_through_serde() {
        let json = serde_json::to_string(&InternetService::FiberOptic).unwrap();
        assert_eq!(json, "\"Fiber optic\"");
        let back: AddonOption = serde_json::from_str("\"No internet service\"").unwrap();
        assert_eq!(back, AddonOption::NoInternetService);
        let contract: Contract = serde_json::from_str("\"2 Years\"").unwrap();
        assert_eq!(contract, Contract::TwoYears);
        assert!(serde_json::from_str::<Contract>("\"Month-to-month\"").is_err());
    }

    #[test]
    fn test_form_defaults_are_first_option() {
        assert_eq!(YesNo::default(), YesNo::No);
        assert_eq!(InternetService::default(), InternetService::Dsl);
        assert_eq!(TenureGroup::default(), TenureGroup::Months1To12);
        assert_eq!(PaymentMethod::default(), PaymentMethod::ElectronicCheck);
        assert_eq!(MonthlyCharges::default().value(), 70.0);
        assert_eq!(TotalCharges::default().value(), 2000.0);
    }

    #[test]
    fn test_charge_endpoints_accepted() {
        assert!(MonthlyCharges::try_from(20.0).is_ok());
        assert!(MonthlyCharges::try_from(120.0).is_ok());
        assert!(TotalCharges::try_from(100.0).is_ok());
        assert!(TotalCharges::try_from(10000.0).is_ok());
    }

    #[test]
    fn test_charges_outside_range_rejected() {
        let err = MonthlyCharges::try_from(19.99).unwrap_err();
        assert_eq!(err.field, "MonthlyCharges");
        assert!(MonthlyCharges::try_from(120.5).is_err());
        assert!(MonthlyCharges::try_from(f64::NAN).is_err());
        assert!(TotalCharges::try_from(10000.01).is_err());

        // Deserialization goes through the same check
        assert!(serde_json::from_str::<MonthlyCharges>("121").is_err());
        assert!(serde_json::from_str::<MonthlyCharges>("20").is_ok());
    }

    #[test]
    fn test_tenure_months() {
        assert_eq!(TenureGroup::Months1To12.months(), 1..=12);
        assert_eq!(TenureGroup::Months37To48.months(), 37..=48);
        assert_eq!(TenureGroup::Months61To72.months(), 61..=72);
    }

    #[test]
    fn test_field_domains_cover_the_frame() {
        let domains = field_domains();
        assert_eq!(domains.len(), 15);

        let columns: usize = domains.iter().map(|d| d.labels.len()).sum();
        assert_eq!(columns, 45);

        let sentinels: Vec<String> = domains.iter().filter_map(|d| d.sentinel_column()).collect();
        assert_eq!(sentinels.len(), 7);
        assert!(sentinels.contains(&"MultipleLines_No phone service".to_string()));
        assert!(sentinels.contains(&"StreamingTV_No internet service".to_string()));
    }
}
