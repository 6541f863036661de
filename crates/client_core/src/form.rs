//! Headless reservation form controller.
//!
//! All inputs are explicit method calls (route, field edits, blur, button
//! presses). Methods that need the network return a [`FormEffect`]; the
//! caller performs it and hands the [`FormOutcome`] back to
//! [`ReservationForm::apply`]. Rendering layers only read the state.

use shared::{
    domain::{Item, ItemId, Requester, TransactionAction},
    error::FieldError,
    protocol::{RegisterUserRequest, TransactionRequest},
};
use tracing::{debug, info};

use crate::{
    config::Settings,
    driver::{FormEffect, FormOutcome},
    error::ClientError,
    validation::{is_unsupported_domain, parse_quantity, validate_email},
    EmailLookup,
};

pub const LOAD_ITEM_ERROR: &str = "Failed to load item data.";
pub const EMAIL_CHECK_ERROR: &str = "Email verification failed.";
pub const REGISTRATION_ERROR: &str = "Email validation failed.";
pub const SUBMISSION_ERROR: &str = "The transaction could not be submitted.";
pub const VERIFY_EMAIL_FIRST: &str = "Please verify your email before submitting.";
pub const REGISTRATION_SENT: &str =
    "A confirmation email has been sent. Please check your inbox.";
pub const TRANSACTION_SUBMITTED: &str = "Transaction submitted successfully!";
pub const UNSUPPORTED_PROVIDER_NOTICE: &str =
    "Addresses from this provider are not supported for verification.";

const DEFAULT_QUANTITY: &str = "1";

/// Verification state of the email currently in the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailStatus {
    Unverified,
    Checking,
    Recognized,
    NeedsRegistration,
    Registering,
    Registered,
}

impl EmailStatus {
    /// Submission is reachable only from these two states.
    pub fn is_verified(self) -> bool {
        matches!(self, EmailStatus::Recognized | EmailStatus::Registered)
    }

    /// Registration is required but not finished yet.
    pub fn is_registration_pending(self) -> bool {
        matches!(self, EmailStatus::NeedsRegistration | EmailStatus::Registering)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// No route has been mounted yet, or the item request is in flight.
    Loading,
    Ready,
    /// Terminal: only this message is rendered.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ReservationForm {
    item_id: Option<ItemId>,
    load: LoadState,
    item: Option<Item>,
    requester: Requester,
    email_status: EmailStatus,
    /// The email `email_status` was established for.
    status_email: Option<String>,
    names_autofilled: bool,
    action: TransactionAction,
    quantity_input: String,
    submitting: bool,
    email_error: Option<FieldError>,
    quantity_error: Option<FieldError>,
    error: Option<String>,
    notice: Option<String>,
    unsupported_domains: Vec<String>,
}

impl Default for ReservationForm {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl ReservationForm {
    pub fn new(settings: &Settings) -> Self {
        Self {
            item_id: None,
            load: LoadState::Loading,
            item: None,
            requester: Requester::default(),
            email_status: EmailStatus::Unverified,
            status_email: None,
            names_autofilled: false,
            action: TransactionAction::default(),
            quantity_input: DEFAULT_QUANTITY.to_string(),
            submitting: false,
            email_error: None,
            quantity_error: None,
            error: None,
            notice: None,
            unsupported_domains: settings.unsupported_verification_domains.clone(),
        }
    }

    /// Reads the item id from `route` (a bare id or an `/item/{id}` path) and
    /// requests the item. A missing or malformed id is terminal.
    pub fn mount(&mut self, route: Option<&str>) -> Option<FormEffect> {
        let parsed = match route {
            Some(route) => ItemId::from_route(route),
            None => Err(FieldError::MissingItemId),
        };

        match parsed {
            Ok(id) => {
                debug!(item_id = %id, "mounting reservation form");
                self.item_id = Some(id.clone());
                self.load = LoadState::Loading;
                Some(FormEffect::LoadItem(id))
            }
            Err(err) => {
                debug!(error = %err, "route carries no usable item id");
                self.item_id = None;
                self.load = LoadState::Failed(err.to_string());
                None
            }
        }
    }

    pub fn set_email(&mut self, value: &str) {
        let email = value.trim();
        if email == self.requester.email {
            return;
        }
        self.requester.email = email.to_string();
        self.email_error = None;

        if self.status_email.as_deref() != Some(email) {
            if self.names_autofilled {
                self.requester.first_name.clear();
                self.requester.last_name.clear();
                self.names_autofilled = false;
            }
            self.email_status = EmailStatus::Unverified;
            self.status_email = None;
        }
    }

    /// Email field lost focus: validate and, if needed, look the email up.
    pub fn blur_email(&mut self) -> Option<FormEffect> {
        if self.load != LoadState::Ready {
            return None;
        }
        if let Err(err) = validate_email(&self.requester.email) {
            self.email_error = Some(err);
            return None;
        }
        self.email_error = None;

        if self.email_status != EmailStatus::Unverified
            && self.status_email.as_deref() == Some(self.requester.email.as_str())
        {
            return None;
        }

        let email = self.requester.email.clone();
        self.email_status = EmailStatus::Checking;
        self.status_email = Some(email.clone());
        self.error = None;
        self.notice = None;
        Some(FormEffect::CheckEmail(email))
    }

    pub fn set_first_name(&mut self, value: &str) -> bool {
        if !self.names_editable() {
            return false;
        }
        self.requester.first_name = value.to_string();
        true
    }

    pub fn set_last_name(&mut self, value: &str) -> bool {
        if !self.names_editable() {
            return false;
        }
        self.requester.last_name = value.to_string();
        true
    }

    pub fn set_action(&mut self, action: TransactionAction) {
        self.action = action;
    }

    pub fn set_quantity_input(&mut self, raw: &str) {
        self.quantity_input = raw.to_string();
        self.quantity_error = parse_quantity(raw).err();
    }

    /// Sends the registration for a new email. Only possible once both names
    /// are filled in.
    pub fn register(&mut self) -> Option<FormEffect> {
        if let Err(err) = validate_email(&self.requester.email) {
            self.email_error = Some(err);
            return None;
        }
        if !self.can_register() {
            return None;
        }

        self.email_status = EmailStatus::Registering;
        self.error = None;
        self.notice = None;
        Some(FormEffect::RegisterUser(RegisterUserRequest {
            email: self.requester.email.clone(),
            first_name: self.requester.first_name.trim().to_string(),
            last_name: self.requester.last_name.trim().to_string(),
        }))
    }

    pub fn submit(&mut self) -> Option<FormEffect> {
        if self.submitting || self.load != LoadState::Ready {
            return None;
        }
        let item = self.item.clone()?;

        let email = validate_email(&self.requester.email);
        let quantity = parse_quantity(&self.quantity_input);
        self.email_error = email.err();
        self.quantity_error = quantity.clone().err();
        let Ok(quantity) = quantity else {
            return None;
        };
        if self.email_error.is_some() {
            return None;
        }

        if !self.email_verified() {
            self.error = Some(VERIFY_EMAIL_FIRST.to_string());
            return None;
        }

        let request = TransactionRequest {
            id: item.id,
            first_name: self.requester.first_name.trim().to_string(),
            last_name: self.requester.last_name.trim().to_string(),
            email: self.requester.email.clone(),
            name: item.name,
            location: item.location,
            quantity,
            action: self.action,
        };
        info!(
            item_id = %request.id,
            action = request.action.as_str(),
            quantity,
            "submitting transaction"
        );
        self.submitting = true;
        self.error = None;
        self.notice = None;
        Some(FormEffect::SubmitTransaction(request))
    }

    /// Folds a finished request back into the form. May return a follow-up
    /// effect.
    pub fn apply(&mut self, outcome: FormOutcome) -> Option<FormEffect> {
        match outcome {
            FormOutcome::ItemLoaded { id, result } => {
                self.on_item_loaded(id, result);
                None
            }
            FormOutcome::EmailChecked { email, result } => {
                self.on_email_checked(&email, result);
                None
            }
            FormOutcome::UserRegistered { email, result } => {
                self.on_user_registered(&email, result);
                None
            }
            FormOutcome::TransactionSubmitted(result) => self.on_transaction_submitted(result),
        }
    }

    fn on_item_loaded(&mut self, id: ItemId, result: Result<Item, ClientError>) {
        if self.item_id.as_ref() != Some(&id) {
            debug!(item_id = %id, "discarding item response for another route");
            return;
        }
        match result {
            Ok(item) => {
                self.item = Some(item);
                self.load = LoadState::Ready;
            }
            Err(err) => {
                let message = err.user_message(LOAD_ITEM_ERROR);
                if self.load == LoadState::Ready {
                    // A refresh failing keeps the form usable.
                    self.error = Some(message);
                } else {
                    self.load = LoadState::Failed(message);
                }
            }
        }
    }

    fn on_email_checked(&mut self, email: &str, result: Result<EmailLookup, ClientError>) {
        if self.email_status != EmailStatus::Checking || self.status_email.as_deref() != Some(email)
        {
            debug!(email, "discarding stale email lookup");
            return;
        }
        match result {
            Ok(EmailLookup::Known {
                first_name,
                last_name,
            }) => {
                self.requester.first_name = first_name;
                self.requester.last_name = last_name;
                self.names_autofilled = true;
                self.email_status = EmailStatus::Recognized;
            }
            Ok(EmailLookup::Unknown) => {
                self.email_status = EmailStatus::NeedsRegistration;
            }
            Err(err) => {
                self.error = Some(err.user_message(EMAIL_CHECK_ERROR));
                self.email_status = EmailStatus::Unverified;
                self.status_email = None;
            }
        }
    }

    fn on_user_registered(&mut self, email: &str, result: Result<(), ClientError>) {
        if self.email_status != EmailStatus::Registering
            || self.status_email.as_deref() != Some(email)
        {
            debug!(email, "discarding stale registration response");
            return;
        }
        match result {
            Ok(()) => {
                self.email_status = EmailStatus::Registered;
                self.notice = Some(REGISTRATION_SENT.to_string());
            }
            Err(err) => {
                self.email_status = EmailStatus::NeedsRegistration;
                self.error = Some(err.user_message(REGISTRATION_ERROR));
            }
        }
    }

    fn on_transaction_submitted(&mut self, result: Result<(), ClientError>) -> Option<FormEffect> {
        if !self.submitting {
            return None;
        }
        self.submitting = false;
        match result {
            Ok(()) => {
                self.requester.clear();
                self.email_status = EmailStatus::Unverified;
                self.status_email = None;
                self.names_autofilled = false;
                self.email_error = None;
                self.quantity_input = DEFAULT_QUANTITY.to_string();
                self.quantity_error = None;
                self.notice = Some(TRANSACTION_SUBMITTED.to_string());
                self.item_id.clone().map(FormEffect::LoadItem)
            }
            Err(err) => {
                self.error = Some(err.user_message(SUBMISSION_ERROR));
                None
            }
        }
    }

    fn email_verified(&self) -> bool {
        self.email_status.is_verified()
            && self.status_email.as_deref() == Some(self.requester.email.as_str())
    }

    pub fn names_editable(&self) -> bool {
        self.email_status == EmailStatus::NeedsRegistration
    }

    pub fn can_register(&self) -> bool {
        self.email_status == EmailStatus::NeedsRegistration && self.requester.has_names()
    }

    /// The "validate email" action is shown for a new email once both names
    /// are present, and stays visible (busy) while registering.
    pub fn registration_visible(&self) -> bool {
        self.email_status.is_registration_pending() && self.requester.has_names()
    }

    pub fn is_registering(&self) -> bool {
        self.email_status == EmailStatus::Registering
    }

    /// Submission needs a loaded item, no request in flight, and a verified
    /// current email.
    pub fn submit_enabled(&self) -> bool {
        self.load == LoadState::Ready && !self.submitting && self.email_verified()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    /// The terminal error that replaces the whole form.
    pub fn fatal_error(&self) -> Option<&str> {
        match &self.load {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn item_id(&self) -> Option<&ItemId> {
        self.item_id.as_ref()
    }

    pub fn item(&self) -> Option<&Item> {
        self.item.as_ref()
    }

    pub fn requester(&self) -> &Requester {
        &self.requester
    }

    pub fn email_status(&self) -> EmailStatus {
        self.email_status
    }

    pub fn action(&self) -> TransactionAction {
        self.action
    }

    pub fn quantity_input(&self) -> &str {
        &self.quantity_input
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn email_error(&self) -> Option<&FieldError> {
        self.email_error.as_ref()
    }

    pub fn quantity_error(&self) -> Option<&FieldError> {
        self.quantity_error.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Non-blocking hint shown under the email field.
    pub fn email_notice(&self) -> Option<&'static str> {
        is_unsupported_domain(&self.requester.email, &self.unsupported_domains)
            .then_some(UNSUPPORTED_PROVIDER_NOTICE)
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
