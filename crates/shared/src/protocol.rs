//! JSON bodies exchanged with the reservation backend.

use serde::{Deserialize, Serialize};

use crate::domain::{ItemId, TransactionAction};

/// Fields every backend response carries. A missing `success` counts as a
/// failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseStatus {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResponse {
    pub name: String,
    pub location: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckEmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckEmailResponse {
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub id: ItemId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Item display name.
    pub name: String,
    /// Item location/room.
    pub location: String,
    pub quantity: u32,
    pub action: TransactionAction,
}
