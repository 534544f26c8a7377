/// Search query validation and SQL filter generation
///
/// This module turns the raw query parameters of `GET /notes/search` into a
/// validated [`NoteSearch`] (filter + sort + page window) and generates the
/// parameterized SQL WHERE fragment the store adapter executes.
///
/// Validation happens entirely at this boundary, before any database work:
/// a [`SearchQueryError`] maps 1:1 to a 400 response.
///
/// # Example
///
/// ```
/// use cashnotes_shared::search::{NoteSearch, NoteSearchParams};
///
/// let params = NoteSearchParams {
///     q: Some("rent".to_string()),
///     ..Default::default()
/// };
/// let search = NoteSearch::from_params(&params).unwrap();
/// assert_eq!(search.filter.q.as_deref(), Some("rent"));
/// ```
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::note::NoteStatus;

/// Error type for search query validation
///
/// Each variant's message is the human-readable text returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchQueryError {
    /// Free-text query shorter than 2 characters after trimming
    #[error("General search query (q) must be at least 2 characters long.")]
    ShortQuery,

    /// startDate did not parse as YYYY-MM-DD
    #[error("Invalid startDate format. Use YYYY-MM-DD.")]
    InvalidStartDate,

    /// endDate did not parse as YYYY-MM-DD
    #[error("Invalid endDate format. Use YYYY-MM-DD.")]
    InvalidEndDate,

    /// minAmount was not a non-negative number
    #[error("Invalid minAmount. Must be a positive number.")]
    InvalidMinAmount,

    /// maxAmount was not a non-negative number
    #[error("Invalid maxAmount. Must be a positive number.")]
    InvalidMaxAmount,

    /// No discriminating parameter was supplied
    ///
    /// An unscoped "search everything" is not permitted through the search
    /// endpoint; the plain listing endpoint covers that case.
    #[error("At least one search parameter (q, title, description, startDate, endDate, minAmount, maxAmount or includeArchived=true) is required.")]
    Underspecified,
}

/// Raw query parameters of the search endpoint, exactly as deserialized
///
/// Everything is an optional string: normalization and validation belong to
/// [`NoteSearch::from_params`], not to the deserializer, so malformed values
/// produce the documented validation errors instead of a framework 400.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSearchParams {
    /// Free-text query matched against title OR description
    pub q: Option<String>,

    /// Title substring filter
    pub title: Option<String>,

    /// Description substring filter
    pub description: Option<String>,

    /// Comma-separated tag list (match ANY)
    pub tags: Option<String>,

    /// Inclusive lower date bound, YYYY-MM-DD
    pub start_date: Option<String>,

    /// Inclusive upper date bound, YYYY-MM-DD (through 23:59:59.999)
    pub end_date: Option<String>,

    /// Inclusive lower amount bound
    pub min_amount: Option<String>,

    /// Inclusive upper amount bound
    pub max_amount: Option<String>,

    /// "true" widens the status scope to {active, archived}
    pub include_archived: Option<String>,

    /// Sort field (allow-list: title, date, amount, createdAt, updatedAt)
    pub sort_by: Option<String>,

    /// "desc" for descending; anything else is ascending
    pub sort_order: Option<String>,

    /// Requested page (lenient; see pagination module)
    pub page: Option<String>,

    /// Requested page size (lenient)
    pub limit: Option<String>,
}

/// Sortable note columns
///
/// Restricted to an allow-list so the ORDER BY clause is never built from
/// raw user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Title,
    Date,
    Amount,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Parses a sortBy parameter; unknown fields yield None
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "title" => Some(SortField::Title),
            "date" => Some(SortField::Date),
            "amount" => Some(SortField::Amount),
            "createdAt" => Some(SortField::CreatedAt),
            "updatedAt" => Some(SortField::UpdatedAt),
            _ => None,
        }
    }

    /// Column name for the ORDER BY clause
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Date => "date",
            SortField::Amount => "amount",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A validated sort specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for Sort {
    /// Fallback used whenever sortBy is absent or not on the allow-list
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

impl Sort {
    /// Resolves the sort specification from raw parameters
    ///
    /// Direction is descending only when sortOrder is exactly "desc"; an
    /// invalid or missing sortBy ignores sortOrder entirely and falls back
    /// to createdAt descending.
    pub fn from_params(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        match sort_by.and_then(SortField::parse) {
            Some(field) => Self {
                field,
                order: if sort_order == Some("desc") {
                    SortOrder::Desc
                } else {
                    SortOrder::Asc
                },
            },
            None => Self::default(),
        }
    }

    /// Renders the ORDER BY clause
    pub fn order_by_sql(&self) -> String {
        format!("ORDER BY {} {}", self.field.column(), self.order.as_sql())
    }
}

/// Validated, normalized filter consumed by the store adapter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteFilter {
    /// Widen the status scope from {active} to {active, archived}
    ///
    /// Trashed notes are never reachable through search.
    pub include_archived: bool,

    /// Free-text substring matched against title OR description
    pub q: Option<String>,

    /// Title substring filter
    pub title: Option<String>,

    /// Description substring filter
    pub description: Option<String>,

    /// Match notes carrying ANY of these tags
    pub tags: Vec<String>,

    /// Inclusive lower bound on the note date
    pub date_from: Option<DateTime<Utc>>,

    /// Inclusive upper bound on the note date (end of day)
    pub date_to: Option<DateTime<Utc>>,

    /// Inclusive lower bound on amount
    pub amount_min: Option<f64>,

    /// Inclusive upper bound on amount
    pub amount_max: Option<f64>,
}

/// A fully validated search request: filter, sort, and page window
#[derive(Debug, Clone, PartialEq)]
pub struct NoteSearch {
    pub filter: NoteFilter,
    pub sort: Sort,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl NoteSearch {
    /// Validates and normalizes raw search parameters
    ///
    /// # Errors
    ///
    /// Returns a [`SearchQueryError`] when:
    /// - `q` is shorter than 2 characters after trimming
    /// - a date bound is not `YYYY-MM-DD`
    /// - an amount bound is not a non-negative number
    /// - no discriminating parameter is present
    pub fn from_params(params: &NoteSearchParams) -> Result<Self, SearchQueryError> {
        let q = opt_text(params.q.as_deref());
        if let Some(ref q) = q {
            if q.chars().count() < 2 {
                return Err(SearchQueryError::ShortQuery);
            }
        }

        let title = opt_text(params.title.as_deref());
        let description = opt_text(params.description.as_deref());

        let tags = params
            .tags
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let date_from = match opt_text(params.start_date.as_deref()) {
            Some(raw) => Some(
                parse_day_start(&raw).ok_or(SearchQueryError::InvalidStartDate)?,
            ),
            None => None,
        };
        let date_to = match opt_text(params.end_date.as_deref()) {
            Some(raw) => Some(parse_day_end(&raw).ok_or(SearchQueryError::InvalidEndDate)?),
            None => None,
        };

        let amount_min = match opt_text(params.min_amount.as_deref()) {
            Some(raw) => Some(parse_amount(&raw).ok_or(SearchQueryError::InvalidMinAmount)?),
            None => None,
        };
        let amount_max = match opt_text(params.max_amount.as_deref()) {
            Some(raw) => Some(parse_amount(&raw).ok_or(SearchQueryError::InvalidMaxAmount)?),
            None => None,
        };

        let include_archived = params.include_archived.as_deref() == Some("true");

        // Tags alone do not scope a search; see the listing endpoints.
        let discriminating = q.is_some()
            || title.is_some()
            || description.is_some()
            || date_from.is_some()
            || date_to.is_some()
            || amount_min.is_some()
            || amount_max.is_some()
            || include_archived;
        if !discriminating {
            return Err(SearchQueryError::Underspecified);
        }

        Ok(Self {
            filter: NoteFilter {
                include_archived,
                q,
                title,
                description,
                tags,
                date_from,
                date_to,
                amount_min,
                amount_max,
            },
            sort: Sort::from_params(params.sort_by.as_deref(), params.sort_order.as_deref()),
            page: params.page.clone(),
            limit: params.limit.clone(),
        })
    }
}

fn opt_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn parse_day_start(raw: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

fn parse_day_end(raw: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(date.and_hms_milli_opt(23, 59, 59, 999)?.and_utc())
}

fn parse_amount(raw: &str) -> Option<f64> {
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Type-safe parameter binding for the generated SQL
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    /// String parameter (ILIKE patterns)
    String(String),
    /// Array of strings (tag overlap)
    StringArray(Vec<String>),
    /// Floating-point parameter (amount bounds)
    Float(f64),
    /// Timestamp parameter (date bounds)
    Timestamp(DateTime<Utc>),
}

/// Generates the SQL WHERE fragment for a [`NoteFilter`]
///
/// Converts a validated filter into WHERE clauses with parameterized queries
/// for safe execution. The status clause is rendered from the enum allow-list
/// and never binds user input; everything else binds a [`QueryParam`].
///
/// # Example
///
/// ```
/// use cashnotes_shared::search::{NoteFilter, NoteFilterQueryBuilder};
///
/// let filter = NoteFilter {
///     q: Some("rent".to_string()),
///     ..Default::default()
/// };
/// let (sql, params) = NoteFilterQueryBuilder::new(&filter, 0).build();
/// assert!(sql.starts_with("status = 'active'"));
/// assert_eq!(params.len(), 1);
/// ```
pub struct NoteFilterQueryBuilder<'a> {
    filter: &'a NoteFilter,
    param_offset: usize,
}

impl<'a> NoteFilterQueryBuilder<'a> {
    /// Creates a new builder for the given filter
    ///
    /// `param_offset` is the number of parameters already bound in the query
    /// the fragment will be appended to.
    pub fn new(filter: &'a NoteFilter, param_offset: usize) -> Self {
        Self {
            filter,
            param_offset,
        }
    }

    /// Builds the WHERE fragment
    ///
    /// Returns the SQL fragment and the parameters in the order they appear.
    pub fn build(&self) -> (String, Vec<QueryParam>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        let mut param_idx = self.param_offset;

        // Status scoping: trashed notes are never searchable.
        if self.filter.include_archived {
            clauses.push(format!(
                "status IN ('{}', '{}')",
                NoteStatus::Active.as_str(),
                NoteStatus::Archived.as_str()
            ));
        } else {
            clauses.push(format!("status = '{}'", NoteStatus::Active.as_str()));
        }

        // Free-text: one bound pattern matched against title OR description.
        if let Some(ref q) = self.filter.q {
            param_idx += 1;
            clauses.push(format!(
                "(title ILIKE ${idx} ESCAPE '\\' OR description ILIKE ${idx} ESCAPE '\\')",
                idx = param_idx
            ));
            params.push(QueryParam::String(format!("%{}%", escape_like(q))));
        }

        if let Some(ref title) = self.filter.title {
            param_idx += 1;
            clauses.push(format!("title ILIKE ${} ESCAPE '\\'", param_idx));
            params.push(QueryParam::String(format!("%{}%", escape_like(title))));
        }

        if let Some(ref description) = self.filter.description {
            param_idx += 1;
            clauses.push(format!("description ILIKE ${} ESCAPE '\\'", param_idx));
            params.push(QueryParam::String(format!("%{}%", escape_like(description))));
        }

        // Match-ANY tags via array overlap.
        if !self.filter.tags.is_empty() {
            param_idx += 1;
            clauses.push(format!("tags && ${}", param_idx));
            params.push(QueryParam::StringArray(self.filter.tags.clone()));
        }

        if let Some(date_from) = self.filter.date_from {
            param_idx += 1;
            clauses.push(format!("date >= ${}", param_idx));
            params.push(QueryParam::Timestamp(date_from));
        }

        if let Some(date_to) = self.filter.date_to {
            param_idx += 1;
            clauses.push(format!("date <= ${}", param_idx));
            params.push(QueryParam::Timestamp(date_to));
        }

        if let Some(amount_min) = self.filter.amount_min {
            param_idx += 1;
            clauses.push(format!("amount >= ${}", param_idx));
            params.push(QueryParam::Float(amount_min));
        }

        if let Some(amount_max) = self.filter.amount_max {
            param_idx += 1;
            clauses.push(format!("amount <= ${}", param_idx));
            params.push(QueryParam::Float(amount_max));
        }

        (clauses.join(" AND "), params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params_with(f: impl FnOnce(&mut NoteSearchParams)) -> NoteSearchParams {
        let mut p = NoteSearchParams::default();
        f(&mut p);
        p
    }

    #[test]
    fn test_q_length_one_rejected_length_two_accepted() {
        let short = params_with(|p| p.q = Some("a".to_string()));
        assert_eq!(
            NoteSearch::from_params(&short),
            Err(SearchQueryError::ShortQuery)
        );

        let ok = params_with(|p| p.q = Some("ab".to_string()));
        let search = NoteSearch::from_params(&ok).unwrap();
        assert_eq!(search.filter.q.as_deref(), Some("ab"));
    }

    #[test]
    fn test_whitespace_only_q_is_absent() {
        // Whitespace-only q neither matches nor scopes the search.
        let p = params_with(|p| p.q = Some("   ".to_string()));
        assert_eq!(
            NoteSearch::from_params(&p),
            Err(SearchQueryError::Underspecified)
        );
    }

    #[test]
    fn test_underspecified_query_rejected() {
        assert_eq!(
            NoteSearch::from_params(&NoteSearchParams::default()),
            Err(SearchQueryError::Underspecified)
        );

        // Tags alone are not a discriminating parameter.
        let tags_only = params_with(|p| p.tags = Some("rent,may".to_string()));
        assert_eq!(
            NoteSearch::from_params(&tags_only),
            Err(SearchQueryError::Underspecified)
        );
    }

    #[test]
    fn test_include_archived_scopes_and_discriminates() {
        let p = params_with(|p| p.include_archived = Some("true".to_string()));
        let search = NoteSearch::from_params(&p).unwrap();
        assert!(search.filter.include_archived);

        // Only the literal "true" counts.
        let p = params_with(|p| p.include_archived = Some("yes".to_string()));
        assert_eq!(
            NoteSearch::from_params(&p),
            Err(SearchQueryError::Underspecified)
        );
    }

    #[test]
    fn test_negative_min_amount_rejected() {
        let p = params_with(|p| p.min_amount = Some("-5".to_string()));
        assert_eq!(
            NoteSearch::from_params(&p),
            Err(SearchQueryError::InvalidMinAmount)
        );
    }

    #[test]
    fn test_non_numeric_max_amount_rejected() {
        let p = params_with(|p| p.max_amount = Some("lots".to_string()));
        assert_eq!(
            NoteSearch::from_params(&p),
            Err(SearchQueryError::InvalidMaxAmount)
        );
    }

    #[test]
    fn test_amount_bounds_accepted() {
        let p = params_with(|p| {
            p.min_amount = Some("0".to_string());
            p.max_amount = Some("1200.50".to_string());
        });
        let search = NoteSearch::from_params(&p).unwrap();
        assert_eq!(search.filter.amount_min, Some(0.0));
        assert_eq!(search.filter.amount_max, Some(1200.50));
    }

    #[test]
    fn test_invalid_date_formats_rejected() {
        let p = params_with(|p| p.start_date = Some("05/01/2024".to_string()));
        assert_eq!(
            NoteSearch::from_params(&p),
            Err(SearchQueryError::InvalidStartDate)
        );

        let p = params_with(|p| p.end_date = Some("2024-13-01".to_string()));
        assert_eq!(
            NoteSearch::from_params(&p),
            Err(SearchQueryError::InvalidEndDate)
        );
    }

    #[test]
    fn test_end_date_inclusive_through_end_of_day() {
        let p = params_with(|p| p.end_date = Some("2024-05-01".to_string()));
        let search = NoteSearch::from_params(&p).unwrap();
        let date_to = search.filter.date_to.unwrap();
        assert_eq!(date_to.to_rfc3339(), "2024-05-01T23:59:59.999+00:00");
    }

    #[test]
    fn test_tags_trimmed_and_blanks_dropped() {
        let p = params_with(|p| {
            p.q = Some("ab".to_string());
            p.tags = Some(" rent , , may ,".to_string());
        });
        let search = NoteSearch::from_params(&p).unwrap();
        assert_eq!(search.filter.tags, vec!["rent", "may"]);
    }

    #[test]
    fn test_sort_fallback_and_explicit_desc() {
        let sort = Sort::from_params(None, None);
        assert_eq!(sort, Sort::default());
        assert_eq!(sort.order_by_sql(), "ORDER BY created_at DESC");

        let sort = Sort::from_params(Some("amount"), Some("desc"));
        assert_eq!(sort.order_by_sql(), "ORDER BY amount DESC");

        // Anything but "desc" is ascending.
        let sort = Sort::from_params(Some("title"), Some("descending"));
        assert_eq!(sort.order_by_sql(), "ORDER BY title ASC");

        // Unknown sort field falls back entirely.
        let sort = Sort::from_params(Some("password_hash"), Some("desc"));
        assert_eq!(sort.order_by_sql(), "ORDER BY created_at DESC");
    }

    #[test]
    fn test_builder_default_scope() {
        let filter = NoteFilter::default();
        let (sql, params) = NoteFilterQueryBuilder::new(&filter, 0).build();
        assert_eq!(sql, "status = 'active'");
        assert!(params.is_empty());
    }

    #[test]
    fn test_builder_archived_scope() {
        let filter = NoteFilter {
            include_archived: true,
            ..Default::default()
        };
        let (sql, _) = NoteFilterQueryBuilder::new(&filter, 0).build();
        assert_eq!(sql, "status IN ('active', 'archived')");
    }

    #[test]
    fn test_builder_free_text_binds_one_param_twice() {
        let filter = NoteFilter {
            q: Some("rent".to_string()),
            ..Default::default()
        };
        let (sql, params) = NoteFilterQueryBuilder::new(&filter, 0).build();
        assert!(sql.contains("title ILIKE $1 ESCAPE '\\' OR description ILIKE $1 ESCAPE '\\'"));
        assert_eq!(params, vec![QueryParam::String("%rent%".to_string())]);
    }

    #[test]
    fn test_builder_respects_param_offset() {
        let filter = NoteFilter {
            title: Some("rent".to_string()),
            ..Default::default()
        };
        let (sql, _) = NoteFilterQueryBuilder::new(&filter, 3).build();
        assert!(sql.contains("title ILIKE $4"));
    }

    #[test]
    fn test_builder_escapes_like_wildcards() {
        let filter = NoteFilter {
            q: Some("50%_off".to_string()),
            ..Default::default()
        };
        let (_, params) = NoteFilterQueryBuilder::new(&filter, 0).build();
        assert_eq!(
            params,
            vec![QueryParam::String("%50\\%\\_off%".to_string())]
        );
    }

    #[test]
    fn test_builder_full_filter_param_order() {
        let filter = NoteFilter {
            include_archived: true,
            q: Some("ab".to_string()),
            title: Some("t".to_string()),
            description: Some("d".to_string()),
            tags: vec!["rent".to_string()],
            date_from: parse_day_start("2024-01-01"),
            date_to: parse_day_end("2024-12-31"),
            amount_min: Some(1.0),
            amount_max: Some(2.0),
        };
        let (sql, params) = NoteFilterQueryBuilder::new(&filter, 0).build();
        assert_eq!(params.len(), 8);
        assert!(sql.contains("tags && $4"));
        assert!(sql.contains("date >= $5"));
        assert!(sql.contains("date <= $6"));
        assert!(sql.contains("amount >= $7"));
        assert!(sql.contains("amount <= $8"));
    }
}
