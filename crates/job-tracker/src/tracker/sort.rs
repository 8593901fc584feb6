//! Allow-listed ordering for application listings.
//!
//! Query parameters are only ever used as lookup keys; the SQL fragments come
//! from the fixed tables below.

use serde::{Deserialize, Serialize};

/// Columns a listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    CompanyName,
    JobRole,
    #[default]
    AppliedDate,
    Status,
    LastUpdated,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::CompanyName,
        SortField::JobRole,
        SortField::AppliedDate,
        SortField::Status,
        SortField::LastUpdated,
    ];

    /// Parameter spelling accepted from clients; doubles as the column name.
    pub const fn as_str(self) -> &'static str {
        match self {
            SortField::CompanyName => "company_name",
            SortField::JobRole => "job_role",
            SortField::AppliedDate => "applied_date",
            SortField::Status => "status",
            SortField::LastUpdated => "last_updated",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub const fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Validated ordering for a listing query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl SortSpec {
    pub const fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Maps untrusted parameters onto the allow-list. Each parameter falls back
    /// to its default independently when it is absent or unrecognised.
    pub fn from_params(sort: Option<&str>, order: Option<&str>) -> Self {
        Self {
            field: sort.and_then(SortField::parse).unwrap_or_default(),
            order: order.and_then(SortOrder::parse).unwrap_or_default(),
        }
    }

    /// `ORDER BY` body for this ordering. `id` keeps ties in insertion order.
    pub const fn order_by(self) -> &'static str {
        match (self.field, self.order) {
            (SortField::CompanyName, SortOrder::Asc) => "company_name ASC, id ASC",
            (SortField::CompanyName, SortOrder::Desc) => "company_name DESC, id ASC",
            (SortField::JobRole, SortOrder::Asc) => "job_role ASC, id ASC",
            (SortField::JobRole, SortOrder::Desc) => "job_role DESC, id ASC",
            (SortField::AppliedDate, SortOrder::Asc) => "applied_date ASC, id ASC",
            (SortField::AppliedDate, SortOrder::Desc) => "applied_date DESC, id ASC",
            (SortField::Status, SortOrder::Asc) => "status ASC, id ASC",
            (SortField::Status, SortOrder::Desc) => "status DESC, id ASC",
            (SortField::LastUpdated, SortOrder::Asc) => "last_updated ASC, id ASC",
            (SortField::LastUpdated, SortOrder::Desc) => "last_updated DESC, id ASC",
        }
    }
}

/// Query-string shape shared by the listing routes.
#[derive(Debug, Clone, Default)]
pub struct SortParams {
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl SortParams {
    /// Collects `sort` and `order` from raw query pairs. A repeated key keeps
    /// its first value; unrelated keys are ignored.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.clone())
        };
        Self {
            sort: first("sort"),
            order: first("order"),
        }
    }

    pub fn spec(&self) -> SortSpec {
        SortSpec::from_params(self.sort.as_deref(), self.order.as_deref())
    }
}
