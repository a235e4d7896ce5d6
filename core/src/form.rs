//! Form state controller.
//!
//! The form has two gates. Phone service gates `MultipleLines`; internet
//! service gates the six add-on fields. While a gate is closed the dependent
//! selects are not choosable and resolve to their sentinel, whatever the user
//! picked before closing it.

use serde::{Deserialize, Serialize, Serializer};

use crate::attributes::{
    AddonOption, AgeGroup, Contract, InternetService, LineOption, MonthlyCharges, PaymentMethod,
    TenureGroup, TotalCharges, YesNo,
};

/// Raw form state as the input surface delivers it.
///
/// Missing fields take the form's defaults, so partial input is accepted.
/// Charges are range checked during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct FormSelections {
    pub age_group: AgeGroup,
    pub partner: YesNo,
    pub dependents: YesNo,
    pub tenure_group: TenureGroup,

    pub phone_service: YesNo,
    pub multiple_lines: YesNo,

    pub internet_service: InternetService,
    pub online_security: YesNo,
    pub online_backup: YesNo,
    pub device_protection: YesNo,
    pub tech_support: YesNo,
    pub streaming_tv: YesNo,
    pub streaming_movies: YesNo,

    pub contract: Contract,
    pub paperless_billing: YesNo,
    pub payment_method: PaymentMethod,
    pub monthly_charges: MonthlyCharges,
    pub total_charges: TotalCharges,
}

/// Which dependent selects are currently choosable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Gates {
    pub multiple_lines: bool,
    pub internet_addons: bool,
}

impl FormSelections {
    pub fn gates(&self) -> Gates {
        Gates {
            multiple_lines: self.phone_service.is_yes(),
            internet_addons: self.internet_service.is_subscribed(),
        }
    }

    /// Resolve the form into a consistent record. Infallible: every
    /// combination of selections is legal once the gates are applied.
    pub fn resolve(&self) -> AttributeRecord {
        let gates = self.gates();

        let multiple_lines = if gates.multiple_lines {
            LineOption::from(self.multiple_lines)
        } else {
            LineOption::NoPhoneService
        };

        let addon = |choice: YesNo| {
            if gates.internet_addons {
                AddonOption::from(choice)
            } else {
                AddonOption::NoInternetService
            }
        };

        AttributeRecord {
            senior_citizen: self.age_group,
            partner: self.partner,
            dependents: self.dependents,
            phone_service: self.phone_service,
            multiple_lines,
            internet_service: self.internet_service,
            online_security: addon(self.online_security),
            online_backup: addon(self.online_backup),
            device_protection: addon(self.device_protection),
            tech_support: addon(self.tech_support),
            streaming_tv: addon(self.streaming_tv),
            streaming_movies: addon(self.streaming_movies),
            contract: self.contract,
            paperless_billing: self.paperless_billing,
            payment_method: self.payment_method,
            monthly_charges: self.monthly_charges,
            total_charges: self.total_charges,
            tenure_group: self.tenure_group,
        }
    }
}

/// One fully populated customer, built fresh per prediction and never
/// mutated. Only [`FormSelections::resolve`] constructs it, so the gate
/// invariants always hold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeRecord {
    #[serde(rename = "SeniorCitizen", serialize_with = "senior_flag")]
    senior_citizen: AgeGroup,
    #[serde(rename = "Partner")]
    partner: YesNo,
    #[serde(rename = "Dependents")]
    dependents: YesNo,
    #[serde(rename = "PhoneService")]
    phone_service: YesNo,
    #[serde(rename = "MultipleLines")]
    multiple_lines: LineOption,
    #[serde(rename = "InternetService")]
    internet_service: InternetService,
    #[serde(rename = "OnlineSecurity")]
    online_security: AddonOption,
    #[serde(rename = "OnlineBackup")]
    online_backup: AddonOption,
    #[serde(rename = "DeviceProtection")]
    device_protection: AddonOption,
    #[serde(rename = "TechSupport")]
    tech_support: AddonOption,
    #[serde(rename = "StreamingTV")]
    streaming_tv: AddonOption,
    #[serde(rename = "StreamingMovies")]
    streaming_movies: AddonOption,
    #[serde(rename = "Contract")]
    contract: Contract,
    #[serde(rename = "PaperlessBilling")]
    paperless_billing: YesNo,
    #[serde(rename = "PaymentMethod")]
    payment_method: PaymentMethod,
    #[serde(rename = "MonthlyCharges")]
    monthly_charges: MonthlyCharges,
    #[serde(rename = "TotalCharges")]
    total_charges: TotalCharges,
    tenure_group: TenureGroup,
}

// The frame column holds 0/1, not the form's age label
fn senior_flag<S: Serializer>(age: &AgeGroup, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(age.senior_flag() > 0.0))
}

impl AttributeRecord {
    pub fn senior_citizen(&self) -> AgeGroup {
        self.senior_citizen
    }

    pub fn partner(&self) -> YesNo {
        self.partner
    }

    pub fn dependents(&self) -> YesNo {
        self.dependents
    }

    pub fn phone_service(&self) -> YesNo {
        self.phone_service
    }

    pub fn multiple_lines(&self) -> LineOption {
        self.multiple_lines
    }

    pub fn internet_service(&self) -> InternetService {
        self.internet_service
    }

    /// The six internet add-ons in column order.
    pub fn internet_addons(&self) -> [AddonOption; 6] {
        [
            self.online_security,
            self.online_backup,
            self.device_protection,
            self.tech_support,
            self.streaming_tv,
            self.streaming_movies,
        ]
    }

    pub fn tech_support(&self) -> AddonOption {
        self.tech_support
    }

    pub fn contract(&self) -> Contract {
        self.contract
    }

    pub fn paperless_billing(&self) -> YesNo {
        self.paperless_billing
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn monthly_charges(&self) -> MonthlyCharges {
        self.monthly_charges
    }

    pub fn total_charges(&self) -> TotalCharges {
        self.total_charges
    }

    pub fn tenure_group(&self) -> TenureGroup {
        self.tenure_group
    }

    /// Advisory check of `TotalCharges` against what the tenure bucket and
    /// monthly bill allow. Never rejects the record.
    pub fn charge_consistency(&self) -> Option<ChargeWarning> {
        let months = self.tenure_group.months();
        let monthly = self.monthly_charges.value();
        let low = monthly * f64::from(*months.start());
        let high = monthly * f64::from(*months.end());
        let total = self.total_charges.value();

        if (low..=high).contains(&total) {
            None
        } else {
            Some(ChargeWarning {
                tenure_group: self.tenure_group,
                total_charges: total,
                expected_min: low,
                expected_max: high,
            })
        }
    }
}

/// `TotalCharges` outside `[monthly x first month, monthly x last month]`
/// of the tenure bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeWarning {
    pub tenure_group: TenureGroup,
    pub total_charges: f64,
    pub expected_min: f64,
    pub expected_max: f64,
}

impl std::fmt::Display for ChargeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TotalCharges {} is outside the {:.0}-{:.0} range implied by tenure {} and MonthlyCharges",
            self.total_charges, self.expected_min, self.expected_max, self.tenure_group
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::attributes::Categorical;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn pick<T: Categorical>(rng: &mut StdRng) -> T {
        T::DOMAIN[rng.gen_range(0..T::DOMAIN.len())]
    }

    /// A random but legal form state. Charges are integers like the sliders.
    pub(crate) fn random_selections(rng: &mut StdRng) -> FormSelections {
        FormSelections {
            age_group: pick(rng),
            partner: pick(rng),
            dependents: pick(rng),
            tenure_group: pick(rng),
            phone_service: pick(rng),
            multiple_lines: pick(rng),
            internet_service: pick(rng),
            online_security: pick(rng),
            online_backup: pick(rng),
            device_protection: pick(rng),
            tech_support: pick(rng),
            streaming_tv: pick(rng),
            streaming_movies: pick(rng),
            contract: pick(rng),
            paperless_billing: pick(rng),
            payment_method: pick(rng),
            monthly_charges: MonthlyCharges::try_from(rng.gen_range(20..=120) as f64).unwrap(),
            total_charges: TotalCharges::try_from(rng.gen_range(100..=10000) as f64).unwrap(),
        }
    }

    #[test]
    fn test_phone_gate_forces_sentinel() {
        let form = FormSelections {
            phone_service: YesNo::No,
            multiple_lines: YesNo::Yes,
            ..Default::default()
        };
        assert!(!form.gates().multiple_lines);
        assert_eq!(form.resolve().multiple_lines(), LineOption::NoPhoneService);

        let form = FormSelections {
            phone_service: YesNo::Yes,
            ..form
        };
        assert_eq!(form.resolve().multiple_lines(), LineOption::Yes);
    }

    #[test]
    fn test_internet_gate_forces_sentinels() {
        let form = FormSelections {
            internet_service: InternetService::None,
            online_security: YesNo::Yes,
            tech_support: YesNo::Yes,
            streaming_movies: YesNo::Yes,
            ..Default::default()
        };
        assert!(!form.gates().internet_addons);
        let record = form.resolve();
        assert!(record
            .internet_addons()
            .iter()
            .all(|&a| a == AddonOption::NoInternetService));

        let record = FormSelections {
            internet_service: InternetService::FiberOptic,
            ..form
        }
        .resolve();
        assert_eq!(record.tech_support(), AddonOption::Yes);
        assert_eq!(record.internet_addons()[1], AddonOption::No);
    }

    #[test]
    fn test_gate_invariants_hold_for_random_forms() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let form = random_selections(&mut rng);
            let record = form.resolve();

            if record.phone_service() == YesNo::No {
                assert_eq!(record.multiple_lines(), LineOption::NoPhoneService);
            } else {
                assert_ne!(record.multiple_lines(), LineOption::NoPhoneService);
            }

            let addons = record.internet_addons();
            if record.internet_service() == InternetService::None {
                assert!(addons.iter().all(|&a| a == AddonOption::NoInternetService));
            } else {
                assert!(addons.iter().all(|&a| a != AddonOption::NoInternetService));
            }
        }
    }

    #[test]
    fn test_resolve_is_pure() {
        let mut rng = StdRng::seed_from_u64(11);
        let form = random_selections(&mut rng);
        assert_eq!(form.resolve(), form.resolve());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let form: FormSelections =
            serde_json::from_str(r#"{"contract": "2 Years", "internet_service": "None"}"#).unwrap();
        assert_eq!(form.contract, Contract::TwoYears);
        assert_eq!(form.monthly_charges.value(), 70.0);
        assert_eq!(form.payment_method, PaymentMethod::ElectronicCheck);

        let err = serde_json::from_str::<FormSelections>(r#"{"monthly_charges": 150}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_record_serializes_with_frame_column_names() {
        let record = FormSelections::default().resolve();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["MultipleLines"], "No phone service");
        assert_eq!(value["SeniorCitizen"], 0);
        assert_eq!(value["tenure_group"], "1-12 mo");
        assert_eq!(value["MonthlyCharges"], 70.0);

        let senior = FormSelections {
            age_group: AgeGroup::SixtyPlus,
            ..Default::default()
        }
        .resolve();
        assert_eq!(serde_json::to_value(&senior).unwrap()["SeniorCitizen"], 1);
    }

    #[test]
    fn test_charge_consistency_is_advisory() {
        // 1-12 months at $70 allows at most $840
        let record = FormSelections::default().resolve();
        let warning = record.charge_consistency().expect("2000 exceeds a year at $70");
        assert_eq!(warning.expected_min, 70.0);
        assert_eq!(warning.expected_max, 840.0);

        let record = FormSelections {
            tenure_group: TenureGroup::Months25To36,
            ..Default::default()
        }
        .resolve();
        assert!(record.charge_consistency().is_none());
    }
}
