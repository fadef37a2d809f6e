use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Risk grade of a requisition. `A1` carries the lowest default risk and the
/// lowest interest rate, `C7` the highest; variants are declared in that order
/// so the derived `Ord` sorts by risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    A7,
    B1,
    B2,
    B3,
    B4,
    B5,
    B6,
    B7,
    C1,
    C2,
    C3,
    C4,
    C5,
    C6,
    C7,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A1 => "A1",
            Grade::A2 => "A2",
            Grade::A3 => "A3",
            Grade::A4 => "A4",
            Grade::A5 => "A5",
            Grade::A6 => "A6",
            Grade::A7 => "A7",
            Grade::B1 => "B1",
            Grade::B2 => "B2",
            Grade::B3 => "B3",
            Grade::B4 => "B4",
            Grade::B5 => "B5",
            Grade::B6 => "B6",
            Grade::B7 => "B7",
            Grade::C1 => "C1",
            Grade::C2 => "C2",
            Grade::C3 => "C3",
            Grade::C4 => "C4",
            Grade::C5 => "C5",
            Grade::C6 => "C6",
            Grade::C7 => "C7",
        }
    }
}

/// Alleged destination of the loan, as stated by the requisitioner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Destination {
    #[serde(rename = "Familiar")]
    Family,
    #[serde(rename = "Pagar Deudas")]
    PayDebts,
    #[serde(rename = "Automóvil")]
    Car,
    #[serde(rename = "Negocio")]
    Business,
    #[serde(rename = "Educación")]
    Education,
    #[serde(rename = "Vivienda")]
    Housing,
    #[serde(rename = "Gastos Personales")]
    PersonalExpenses,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Family => "Familiar",
            Destination::PayDebts => "Pagar Deudas",
            Destination::Car => "Automóvil",
            Destination::Business => "Negocio",
            Destination::Education => "Educación",
            Destination::Housing => "Vivienda",
            Destination::PersonalExpenses => "Gastos Personales",
        }
    }
}

/// Basic information about a requisition, as shown on the listings page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requisition {
    pub id: String,
    pub url: String,
    pub grade: Grade,
    /// Percentage, not decimal form.
    pub interest_rate: f64,
    pub score: u32,
    pub destination: Destination,
    /// Months.
    pub term: u32,
    /// MXN.
    pub amount: f64,
    /// Last seen remaining funding amount in MXN.
    pub remaining_funding_amount: f64,
    /// Loans previously taken and repaid, plus one.
    pub loan_number: u32,
}

impl Requisition {
    pub fn from_listing(entry: &Value) -> Result<Self, serde_json::Error> {
        Requisition::deserialize(entry)
    }
}

/// Education level, ordered from unknown to doctorate.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "Option<String>")]
pub enum Education {
    #[default]
    #[serde(rename = "")]
    Unknown,
    #[serde(rename = "Técnico")]
    Technician,
    #[serde(rename = "Profesional")]
    Profesional,
    #[serde(rename = "Maestría")]
    Masters,
    #[serde(rename = "Doctorado")]
    Phd,
}

impl Education {
    /// Labels are matched case-insensitively; anything unrecognized, including
    /// an empty label, is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "TÉCNICO" | "TECNICO" => Education::Technician,
            "PROFESIONAL" => Education::Profesional,
            "MAESTRÍA" | "MAESTRIA" => Education::Masters,
            "DOCTORADO" => Education::Phd,
            _ => Education::Unknown,
        }
    }
}

impl From<Option<String>> for Education {
    fn from(label: Option<String>) -> Self {
        label.as_deref().map_or(Education::Unknown, Education::from_label)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Housing {
    #[default]
    #[serde(rename = "")]
    Unknown,
    #[serde(rename = "Rentada")]
    Rented,
    #[serde(rename = "Vivo con familia")]
    LivesWithFamily,
    #[serde(rename = "Propietario")]
    Owner,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OccupationType {
    #[default]
    #[serde(rename = "")]
    Unknown,
    #[serde(rename = "Empleado")]
    Employee,
    #[serde(rename = "Trabajo por mi cuenta")]
    Freelancer,
    #[serde(rename = "Tengo un negocio")]
    BusinessOwner,
}

/// A requisition with the anonymized credit profile from its own page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedRequisition {
    #[serde(flatten)]
    pub base: Requisition,
    pub monthly_payment: f64,
    /// Years.
    pub credit_history_length: u32,
    pub credit_history_inquiries: u32,
    pub opened_accounts: u32,
    pub total_income: f64,
    pub total_expenses: f64,
    pub age: u32,
    pub dependents: u32,
    pub has_major_medical_insurance: bool,
    pub has_own_vehicle: bool,
    #[serde(default)]
    pub education: Education,
    #[serde(default)]
    pub state_of_residence: String,
    #[serde(default)]
    pub housing: Housing,
    #[serde(default)]
    pub occupation: String,
    /// Years at the last reported occupation.
    pub tenure: u32,
    #[serde(default)]
    pub occupation_type: OccupationType,
}
