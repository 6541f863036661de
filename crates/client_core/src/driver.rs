//! Effects requested by the form and the outcomes fed back into it.

use shared::{
    domain::{Item, ItemId},
    protocol::{RegisterUserRequest, TransactionRequest},
};
use tracing::warn;

use crate::{error::ClientError, form::ReservationForm, EmailLookup, ReservationApi};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEffect {
    LoadItem(ItemId),
    CheckEmail(String),
    RegisterUser(RegisterUserRequest),
    SubmitTransaction(TransactionRequest),
}

impl FormEffect {
    pub fn name(&self) -> &'static str {
        match self {
            FormEffect::LoadItem(_) => "load_item",
            FormEffect::CheckEmail(_) => "check_email",
            FormEffect::RegisterUser(_) => "register_user",
            FormEffect::SubmitTransaction(_) => "submit_transaction",
        }
    }
}

#[derive(Debug)]
pub enum FormOutcome {
    ItemLoaded {
        id: ItemId,
        result: Result<Item, ClientError>,
    },
    EmailChecked {
        email: String,
        result: Result<EmailLookup, ClientError>,
    },
    UserRegistered {
        email: String,
        result: Result<(), ClientError>,
    },
    TransactionSubmitted(Result<(), ClientError>),
}

impl FormOutcome {
    pub fn is_success(&self) -> bool {
        match self {
            FormOutcome::ItemLoaded { result, .. } => result.is_ok(),
            FormOutcome::EmailChecked { result, .. } => result.is_ok(),
            FormOutcome::UserRegistered { result, .. } => result.is_ok(),
            FormOutcome::TransactionSubmitted(result) => result.is_ok(),
        }
    }
}

/// Runs one effect against `api`.
pub async fn perform<A: ReservationApi + ?Sized>(api: &A, effect: FormEffect) -> FormOutcome {
    let name = effect.name();
    let outcome = match effect {
        FormEffect::LoadItem(id) => {
            let result = api.fetch_item(&id).await;
            FormOutcome::ItemLoaded { id, result }
        }
        FormEffect::CheckEmail(email) => {
            let result = api.check_email(&email).await;
            FormOutcome::EmailChecked { email, result }
        }
        FormEffect::RegisterUser(request) => {
            let result = api.register_user(&request).await;
            FormOutcome::UserRegistered {
                email: request.email,
                result,
            }
        }
        FormEffect::SubmitTransaction(request) => {
            FormOutcome::TransactionSubmitted(api.submit_transaction(&request).await)
        }
    };
    if !outcome.is_success() {
        warn!(effect = name, outcome = ?outcome, "effect failed");
    }
    outcome
}

/// Performs `effect` and every follow-up effect the form asks for.
pub async fn drive<A: ReservationApi + ?Sized>(
    api: &A,
    form: &mut ReservationForm,
    effect: Option<FormEffect>,
) {
    let mut next = effect;
    while let Some(effect) = next.take() {
        let outcome = perform(api, effect).await;
        next = form.apply(outcome);
    }
}
