use crate::schemas::requisition::{
    Destination, DetailedRequisition, Grade, Housing, OccupationType, Requisition,
};
use config::{Config, ConfigError, File, FileFormat};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum FilterError {
    Load { path: PathBuf, source: ConfigError },
    Parse(ConfigError),
}

impl std::fmt::Display for FilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterError::Load { path, source } => {
                write!(f, "failed to load filters from {}: {}", path.display(), source)
            }
            FilterError::Parse(e) => write!(f, "failed to parse filters: {}", e),
        }
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FilterError::Load { source, .. } => Some(source),
            FilterError::Parse(e) => Some(e),
        }
    }
}

/// Something that can accept or reject a requisition of type `R`.
pub trait RequisitionFilter<R> {
    fn matches(&self, requisition: &R) -> bool;
}

/// Criteria over the fields of a listed [`Requisition`].
///
/// Every criterion is optional and ignored when absent. Bounds are inclusive.
/// An item present in both a whitelist and a blacklist is rejected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Filter {
    pub minimum_risk_grade: Option<Grade>,
    pub maximum_risk_grade: Option<Grade>,
    pub minimum_score: Option<u32>,
    pub maximum_score: Option<u32>,
    pub minimum_interest_rate: Option<f64>,
    pub maximum_interest_rate: Option<f64>,
    pub destination_whitelist: Option<Vec<Destination>>,
    pub destination_blacklist: Option<Vec<Destination>>,
    pub minimum_term: Option<u32>,
    pub maximum_term: Option<u32>,
    pub minimum_amount: Option<f64>,
    pub maximum_amount: Option<f64>,
    pub minimum_remaining_funding_amount: Option<f64>,
    pub maximum_remaining_funding_amount: Option<f64>,
    pub minimum_loan_number: Option<u32>,
    pub maximum_loan_number: Option<u32>,
}

/// A [`Filter`] extended with criteria over the applicant profile of a
/// [`DetailedRequisition`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DetailedFilter {
    #[serde(flatten)]
    pub base: Filter,
    pub minimum_monthly_payment: Option<f64>,
    pub maximum_monthly_payment: Option<f64>,
    pub minimum_credit_history_length: Option<u32>,
    pub maximum_credit_history_length: Option<u32>,
    pub minimum_credit_history_inquiries: Option<u32>,
    pub maximum_credit_history_inquiries: Option<u32>,
    pub minimum_opened_accounts: Option<u32>,
    pub maximum_opened_accounts: Option<u32>,
    pub minimum_total_income: Option<f64>,
    pub maximum_total_income: Option<f64>,
    pub minimum_total_expenses: Option<f64>,
    pub maximum_total_expenses: Option<f64>,
    pub minimum_age: Option<u32>,
    pub maximum_age: Option<u32>,
    pub minimum_dependents: Option<u32>,
    pub maximum_dependents: Option<u32>,
    pub has_major_medical_insurance: Option<bool>,
    pub has_own_vehicle: Option<bool>,
    pub housing_whitelist: Option<Vec<Housing>>,
    pub housing_blacklist: Option<Vec<Housing>>,
    pub minimum_tenure: Option<u32>,
    pub maximum_tenure: Option<u32>,
    pub occupation_type_whitelist: Option<Vec<OccupationType>>,
    pub occupation_type_blacklist: Option<Vec<OccupationType>>,
}

fn within<T: PartialOrd>(value: T, minimum: Option<T>, maximum: Option<T>) -> bool {
    if minimum.is_some_and(|min| min > value) {
        return false;
    }
    !maximum.is_some_and(|max| max < value)
}

fn listed<T: PartialEq>(value: &T, whitelist: &Option<Vec<T>>, blacklist: &Option<Vec<T>>) -> bool {
    if let Some(allowed) = whitelist {
        if !allowed.contains(value) {
            return false;
        }
    }
    match blacklist {
        Some(denied) => !denied.contains(value),
        None => true,
    }
}

impl RequisitionFilter<Requisition> for Filter {
    fn matches(&self, r: &Requisition) -> bool {
        within(r.grade, self.minimum_risk_grade, self.maximum_risk_grade)
            && within(r.score, self.minimum_score, self.maximum_score)
            && within(
                r.interest_rate,
                self.minimum_interest_rate,
                self.maximum_interest_rate,
            )
            && listed(
                &r.destination,
                &self.destination_whitelist,
                &self.destination_blacklist,
            )
            && within(r.term, self.minimum_term, self.maximum_term)
            && within(r.amount, self.minimum_amount, self.maximum_amount)
            && within(
                r.remaining_funding_amount,
                self.minimum_remaining_funding_amount,
                self.maximum_remaining_funding_amount,
            )
            && within(r.loan_number, self.minimum_loan_number, self.maximum_loan_number)
    }
}

/// Base criteria only: profile fields are not looked at.
impl RequisitionFilter<DetailedRequisition> for Filter {
    fn matches(&self, r: &DetailedRequisition) -> bool {
        self.matches(&r.base)
    }
}

impl RequisitionFilter<DetailedRequisition> for DetailedFilter {
    fn matches(&self, r: &DetailedRequisition) -> bool {
        if !self.base.matches(&r.base) {
            return false;
        }
        within(
            r.monthly_payment,
            self.minimum_monthly_payment,
            self.maximum_monthly_payment,
        ) && within(
            r.credit_history_length,
            self.minimum_credit_history_length,
            self.maximum_credit_history_length,
        ) && within(
            r.credit_history_inquiries,
            self.minimum_credit_history_inquiries,
            self.maximum_credit_history_inquiries,
        ) && within(
            r.opened_accounts,
            self.minimum_opened_accounts,
            self.maximum_opened_accounts,
        ) && within(
            r.total_income,
            self.minimum_total_income,
            self.maximum_total_income,
        ) && within(
            r.total_expenses,
            self.minimum_total_expenses,
            self.maximum_total_expenses,
        ) && within(r.age, self.minimum_age, self.maximum_age)
            && within(r.dependents, self.minimum_dependents, self.maximum_dependents)
            && self
                .has_major_medical_insurance
                .map_or(true, |wanted| wanted == r.has_major_medical_insurance)
            && self
                .has_own_vehicle
                .map_or(true, |wanted| wanted == r.has_own_vehicle)
            && listed(&r.housing, &self.housing_whitelist, &self.housing_blacklist)
            && within(r.tenure, self.minimum_tenure, self.maximum_tenure)
            && listed(
                &r.occupation_type,
                &self.occupation_type_whitelist,
                &self.occupation_type_blacklist,
            )
    }
}

impl Requisition {
    pub fn meets_filter<F: RequisitionFilter<Self>>(&self, filter: &F) -> bool {
        filter.matches(self)
    }
}

impl DetailedRequisition {
    pub fn meets_filter<F: RequisitionFilter<Self>>(&self, filter: &F) -> bool {
        filter.matches(self)
    }
}

/// The filters of one YAML document, read from its top-level `filters` list.
///
/// Keys that are not criteria of `F` are ignored, so a file written for
/// [`DetailedFilter`] can also be loaded as a set of base [`Filter`]s.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterSet<F> {
    pub filters: Vec<F>,
}

impl<F: DeserializeOwned> FilterSet<F> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FilterError> {
        let path = path.as_ref();
        let load = |source: ConfigError| FilterError::Load {
            path: path.to_path_buf(),
            source,
        };

        Config::builder()
            .add_source(File::from(path).format(FileFormat::Yaml).required(true))
            .build()
            .map_err(load)?
            .try_deserialize()
            .map_err(load)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, FilterError> {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .map_err(FilterError::Parse)?
            .try_deserialize()
            .map_err(FilterError::Parse)
    }
}

impl<F> FilterSet<F> {
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Union of all filters: keeps every item matched by at least one filter,
    /// in input order. An empty set keeps nothing.
    pub fn select<'a, R>(&self, items: &'a [R]) -> Vec<&'a R>
    where
        F: RequisitionFilter<R>,
    {
        items
            .iter()
            .filter(|item| self.filters.iter().any(|filter| filter.matches(*item)))
            .collect()
    }
}
