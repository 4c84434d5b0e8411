//! Typed term query sent to the search backend.
//!
//! The term travels as a JSON string value inside [`SearchRequest`], so
//! quotes or braces in user input cannot change the shape of the query.

use serde::{Deserialize, Serialize};

use crate::error::{PostalError, Result};
use crate::schema::COLONIA_SORT_FIELD;

/// Maximum number of hits returned by a term search.
pub const SEARCH_SIZE: usize = 10;

/// Fields matched by a term query.
pub const SEARCH_FIELDS: [&str; 5] = ["id", "ciudad", "colonia", "cp", "delegacion"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: Query,
    pub size: usize,
    pub sort: Vec<SortClause>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    MultiMatch(MultiMatch),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiMatch {
    pub query: String,
    pub fields: Vec<String>,
    #[serde(rename = "type")]
    pub match_type: MatchType,
    pub operator: Operator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Every token must appear in at least one field; fields are treated as
    /// one combined field.
    CrossFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// One entry of the `sort` array, serialized as `{"<field>": {"order": ...}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    pub field: String,
    pub order: SortOrder,
}

#[derive(Serialize, Deserialize)]
struct SortSpec {
    order: SortOrder,
}

impl Serialize for SortClause {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &SortSpec { order: self.order })?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for SortClause {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = std::collections::BTreeMap::<String, SortSpec>::deserialize(deserializer)?;
        let mut entries = map.into_iter();
        match (entries.next(), entries.next()) {
            (Some((field, spec)), None) => Ok(SortClause {
                field,
                order: spec.order,
            }),
            _ => Err(serde::de::Error::custom(
                "sort clause must name exactly one field",
            )),
        }
    }
}

impl SearchRequest {
    /// The query text of the term search.
    pub fn term(&self) -> &str {
        match &self.query {
            Query::MultiMatch(m) => &m.query,
        }
    }
}

/// Build the term query for `term`.
///
/// Empty or whitespace-only terms are rejected with [`PostalError::EmptyQuery`]
/// before anything reaches the backend.
pub fn build_term_query(term: &str) -> Result<SearchRequest> {
    let term = term.trim();
    if term.is_empty() {
        return Err(PostalError::EmptyQuery);
    }
    Ok(SearchRequest {
        query: Query::MultiMatch(MultiMatch {
            query: term.to_string(),
            fields: SEARCH_FIELDS.iter().map(|f| f.to_string()).collect(),
            match_type: MatchType::CrossFields,
            operator: Operator::And,
        }),
        size: SEARCH_SIZE,
        sort: vec![SortClause {
            field: COLONIA_SORT_FIELD.to_string(),
            order: SortOrder::Asc,
        }],
    })
}
