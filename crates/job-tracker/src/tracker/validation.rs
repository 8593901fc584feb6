use chrono::NaiveDate;

use super::domain::{ApplicationDraft, ApplicationFields};

/// Required fields, in the order they are reported when missing.
pub const REQUIRED_FIELDS: [&str; 4] = ["company_name", "job_role", "applied_date", "status"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validation errors raised before anything is written to the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("applied_date must be formatted as YYYY-MM-DD (got '{value}')")]
    InvalidDate { value: String },
}

impl ValidationError {
    /// Offending field names, for structured error payloads.
    pub fn fields(&self) -> Vec<&'static str> {
        match self {
            ValidationError::MissingFields(fields) => fields.clone(),
            ValidationError::InvalidDate { .. } => vec!["applied_date"],
        }
    }
}

impl ApplicationDraft {
    /// Checks every required field and reports all missing ones at once.
    pub fn validate(self) -> Result<ApplicationFields, ValidationError> {
        let company_name = required(self.company_name);
        let job_role = required(self.job_role);
        let applied_date = required(self.applied_date);
        let status = required(self.status);

        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .iter()
            .zip([&company_name, &job_role, &applied_date, &status])
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();

        let (Some(company_name), Some(job_role), Some(applied_date), Some(status)) =
            (company_name, job_role, applied_date, status)
        else {
            return Err(ValidationError::MissingFields(missing));
        };

        let applied_date = parse_applied_date(&applied_date)?;

        Ok(ApplicationFields {
            company_name,
            job_role,
            applied_date,
            url: self.url.unwrap_or_default(),
            status,
            notes: self.notes.unwrap_or_default(),
        })
    }
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

pub fn parse_applied_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
        value: raw.to_string(),
    })
}
