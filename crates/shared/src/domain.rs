use std::fmt;

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use crate::error::FieldError;

const ITEM_ROUTE_PREFIX: &str = "/item/";

/// Identifier of a reservable item, as it appears in the `/item/{id}` route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Parses a bare route segment such as `"42"`.
    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(FieldError::MissingItemId);
        }
        if raw.contains('/') || raw.chars().any(char::is_control) {
            return Err(FieldError::MalformedItemId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Accepts either a bare id or a route path like `/item/42` (query and
    /// fragment are ignored). The segment of a route path is percent-decoded.
    pub fn from_route(route: &str) -> Result<Self, FieldError> {
        let route = route.trim();
        let path = route.split(['?', '#']).next().unwrap_or_default();

        match path.find(ITEM_ROUTE_PREFIX) {
            Some(start) => {
                let segment = path[start + ITEM_ROUTE_PREFIX.len()..].trim_end_matches('/');
                let decoded = percent_decode_str(segment)
                    .decode_utf8()
                    .map_err(|_| FieldError::MalformedItemId(segment.to_string()))?;
                Self::parse(&decoded)
            }
            None if path.starts_with('/') => Err(FieldError::MalformedItemId(route.to_string())),
            None => Self::parse(path),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionAction {
    #[default]
    Add,
    Remove,
}

impl TransactionAction {
    pub const ALL: [TransactionAction; 2] = [TransactionAction::Add, TransactionAction::Remove];

    pub fn label(self) -> &'static str {
        match self {
            TransactionAction::Add => "Add",
            TransactionAction::Remove => "Remove",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionAction::Add => "add",
            TransactionAction::Remove => "remove",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub location: String,
    pub remaining_quantity: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requester {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl Requester {
    pub fn clear(&mut self) {
        self.first_name.clear();
        self.last_name.clear();
        self.email.clear();
    }

    pub fn has_names(&self) -> bool {
        !self.first_name.trim().is_empty() && !self.last_name.trim().is_empty()
    }
}
