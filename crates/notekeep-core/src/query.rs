//! Note list queries.
//!
//! Raw query parameters (`isArchived`, `isPinned`, `labels`, `search`,
//! `sortBy`) are parsed into a [`ListNotesRequest`]. Stores translate the
//! request into their own query language; the predicate and comparator here
//! define the semantics they must match.

use std::cmp::Ordering;
use std::fmt;

use serde::Deserialize;

use crate::defaults::NOTE_SORT;
use crate::error::{Error, Result};
use crate::models::Note;
use crate::object_id::ObjectId;
use crate::validation;

/// Sortable note fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Description,
    Color,
    IsPinned,
    IsArchived,
    Order,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Parse the API (camelCase) field name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::Title),
            "description" => Some(Self::Description),
            "color" => Some(Self::Color),
            "isPinned" => Some(Self::IsPinned),
            "isArchived" => Some(Self::IsArchived),
            "order" => Some(Self::Order),
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            _ => None,
        }
    }

    pub fn api_name(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Color => "color",
            Self::IsPinned => "isPinned",
            Self::IsArchived => "isArchived",
            Self::Order => "order",
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
        }
    }

    fn compare(&self, a: &Note, b: &Note) -> Ordering {
        match self {
            Self::Title => a.title.cmp(&b.title),
            Self::Description => a.description.cmp(&b.description),
            Self::Color => a.color.cmp(&b.color),
            Self::IsPinned => a.is_pinned.cmp(&b.is_pinned),
            Self::IsArchived => a.is_archived.cmp(&b.is_archived),
            Self::Order => a.order.cmp(&b.order),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

/// One component of a sort specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-{}", self.field.api_name())
        } else {
            f.write_str(self.field.api_name())
        }
    }
}

/// Parse `"-isPinned,-createdAt"` style sort specifications.
///
/// An empty specification yields the default sort.
pub fn parse_sort(spec: &str) -> Result<Vec<SortKey>> {
    let mut keys = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (descending, name) = match part.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, part.strip_prefix('+').unwrap_or(part)),
        };
        let field = SortField::parse(name)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown sort field: {}", name)))?;
        if keys.iter().any(|k: &SortKey| k.field == field) {
            continue;
        }
        keys.push(SortKey { field, descending });
    }
    if keys.is_empty() {
        return default_sort();
    }
    Ok(keys)
}

/// Pinned first, then newest first.
pub fn default_sort() -> Result<Vec<SortKey>> {
    parse_sort(NOTE_SORT)
}

/// Split free text into lowercase search words.
pub fn search_terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
    {
        if !terms.contains(&word) {
            terms.push(word);
        }
    }
    terms
}

/// Raw list parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotesParams {
    pub is_archived: Option<String>,
    pub is_pinned: Option<String>,
    /// Comma-separated label ids
    pub labels: Option<String>,
    pub search: Option<String>,
    /// Comma-separated fields, `-` prefix for descending
    pub sort_by: Option<String>,
}

/// A parsed note list query. Every set filter must hold (logical AND).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListNotesRequest {
    pub is_archived: Option<bool>,
    pub is_pinned: Option<bool>,
    /// Note matches if it carries any of these labels
    pub labels: Option<Vec<ObjectId>>,
    /// Note matches if title or description contains any of these words
    pub search: Option<Vec<String>>,
    pub sort: Vec<SortKey>,
}

impl Default for ListNotesRequest {
    fn default() -> Self {
        Self {
            is_archived: None,
            is_pinned: None,
            labels: None,
            search: None,
            sort: vec![
                SortKey {
                    field: SortField::IsPinned,
                    descending: true,
                },
                SortKey {
                    field: SortField::CreatedAt,
                    descending: true,
                },
            ],
        }
    }
}

impl ListNotesRequest {
    /// Validate and parse raw query parameters.
    pub fn from_params(params: &ListNotesParams) -> Result<Self> {
        let is_archived = params
            .is_archived
            .as_deref()
            .map(|v| validation::bool_flag(v, "isArchived"))
            .transpose()?;
        let is_pinned = params
            .is_pinned
            .as_deref()
            .map(|v| validation::bool_flag(v, "isPinned"))
            .transpose()?;

        let labels = match params.labels.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                let ids = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| {
                        s.parse::<ObjectId>()
                            .map_err(|_| Error::InvalidInput("Invalid label ID format".to_string()))
                    })
                    .collect::<Result<Vec<_>>>()?;
                if ids.is_empty() {
                    None
                } else {
                    Some(ids)
                }
            }
            _ => None,
        };

        let search = match params.search.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Some(search_terms(text)),
            _ => None,
        };

        let sort = match params.sort_by.as_deref() {
            Some(spec) => parse_sort(spec)?,
            None => default_sort()?,
        };

        Ok(Self {
            is_archived,
            is_pinned,
            labels,
            search,
            sort,
        })
    }

    /// Filter predicate (owner scoping is applied separately by the store).
    pub fn matches(&self, note: &Note) -> bool {
        if let Some(archived) = self.is_archived {
            if note.is_archived != archived {
                return false;
            }
        }
        if let Some(pinned) = self.is_pinned {
            if note.is_pinned != pinned {
                return false;
            }
        }
        if let Some(labels) = &self.labels {
            if !labels.iter().any(|l| note.labels.contains(l)) {
                return false;
            }
        }
        if let Some(terms) = &self.search {
            let words = search_terms(&format!("{} {}", note.title, note.description));
            if !terms.iter().any(|t| words.contains(t)) {
                return false;
            }
        }
        true
    }

    /// Comparator implementing `sort`, ties broken by id (creation order).
    pub fn compare(&self, a: &Note, b: &Note) -> Ordering {
        for key in &self.sort {
            let ord = key.field.compare(a, b);
            let ord = if key.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.id.cmp(&b.id)
    }
}
