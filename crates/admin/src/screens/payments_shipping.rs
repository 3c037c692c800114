//! Payment and shipping settings form.

use std::str::FromStr;

use rust_decimal::Decimal;

use tutaviendo_core::{CurrencyCode, Price};

use crate::error::SessionError;
use crate::messages;
use crate::models::{SessionState, Store, StoreUpdate};
use crate::services::Notifier;
use crate::state::StoreContext;

/// Editable payment and shipping configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSettings {
    pub accept_cash: bool,
    pub accept_bank_transfer: bool,
    pub bank_details: String,
    pub allow_pickup: bool,
    pub allow_delivery: bool,
    pub delivery_cost: Decimal,
    pub delivery_zone: String,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            accept_cash: true,
            accept_bank_transfer: false,
            bank_details: String::new(),
            allow_pickup: true,
            allow_delivery: false,
            delivery_cost: Decimal::ZERO,
            delivery_zone: String::new(),
        }
    }
}

impl PaymentSettings {
    /// The saved configuration of `store`.
    #[must_use]
    pub fn from_store(store: &Store) -> Self {
        Self {
            accept_cash: store.accept_cash,
            accept_bank_transfer: store.accept_bank_transfer,
            bank_details: store.bank_details.clone().unwrap_or_default(),
            allow_pickup: store.allow_pickup,
            allow_delivery: store.allow_delivery,
            delivery_cost: store.delivery_cost,
            delivery_zone: store.delivery_zone.clone().unwrap_or_default(),
        }
    }

    /// The update saving all seven fields. Blank text clears the column.
    #[must_use]
    pub fn to_update(&self) -> StoreUpdate {
        StoreUpdate {
            accept_cash: Some(self.accept_cash),
            accept_bank_transfer: Some(self.accept_bank_transfer),
            bank_details: Some(non_blank(&self.bank_details)),
            allow_pickup: Some(self.allow_pickup),
            allow_delivery: Some(self.allow_delivery),
            delivery_cost: Some(self.delivery_cost),
            delivery_zone: Some(non_blank(&self.delivery_zone)),
            ..StoreUpdate::default()
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Parse the delivery cost input. Anything unparsable or negative is zero.
#[must_use]
pub fn parse_delivery_cost(input: &str) -> Decimal {
    Decimal::from_str(input.trim())
        .ok()
        .filter(|cost| !cost.is_sign_negative())
        .unwrap_or(Decimal::ZERO)
}

/// One edit made in the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsChange {
    AcceptCash(bool),
    AcceptBankTransfer(bool),
    BankDetails(String),
    AllowPickup(bool),
    AllowDelivery(bool),
    /// Raw text of the cost input.
    DeliveryCost(String),
    DeliveryZone(String),
}

/// Result of a save attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Saved; carries the store as confirmed by the backend.
    Saved(Box<Store>),
    /// The backend refused; an error toast was shown.
    Failed,
    /// There is no current store to save to.
    NoStore,
    /// A save is already in flight.
    Busy,
}

/// Read-only recap of the active methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsSummary {
    pub payment_methods: Vec<String>,
    pub shipping_methods: Vec<String>,
    /// Shown instead of the list when no payment method is active.
    pub payment_warning: Option<&'static str>,
    /// Shown instead of the list when no shipping method is active.
    pub shipping_warning: Option<&'static str>,
}

/// State of the payments and shipping screen.
#[derive(Debug, Clone)]
pub struct PaymentsShippingForm {
    settings: PaymentSettings,
    currency: CurrencyCode,
    has_store: bool,
    has_unsaved_changes: bool,
    is_saving: bool,
}

impl PaymentsShippingForm {
    /// A form showing the configuration of `store`, or the defaults.
    #[must_use]
    pub fn new(store: Option<&Store>) -> Self {
        Self {
            settings: store.map(PaymentSettings::from_store).unwrap_or_default(),
            currency: store.map(|store| store.currency).unwrap_or_default(),
            has_store: store.is_some(),
            has_unsaved_changes: false,
            is_saving: false,
        }
    }

    /// A form for the current store of `state`.
    #[must_use]
    pub fn for_session(state: &SessionState) -> Self {
        Self::new(state.current_store())
    }

    #[must_use]
    pub const fn settings(&self) -> &PaymentSettings {
        &self.settings
    }

    /// Whether there is a store to configure. Without one the screen shows
    /// [`messages::NO_STORE_TITLE`] instead of the form.
    #[must_use]
    pub const fn has_store(&self) -> bool {
        self.has_store
    }

    #[must_use]
    pub const fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    #[must_use]
    pub const fn is_saving(&self) -> bool {
        self.is_saving
    }

    /// Whether the save button is enabled.
    #[must_use]
    pub const fn can_save(&self) -> bool {
        self.has_unsaved_changes && !self.is_saving
    }

    /// Apply one edit.
    pub fn apply(&mut self, change: SettingsChange) {
        let settings = &mut self.settings;
        match change {
            SettingsChange::AcceptCash(value) => settings.accept_cash = value,
            SettingsChange::AcceptBankTransfer(value) => settings.accept_bank_transfer = value,
            SettingsChange::BankDetails(value) => settings.bank_details = value,
            SettingsChange::AllowPickup(value) => settings.allow_pickup = value,
            SettingsChange::AllowDelivery(value) => settings.allow_delivery = value,
            SettingsChange::DeliveryCost(input) => {
                settings.delivery_cost = parse_delivery_cost(&input);
            }
            SettingsChange::DeliveryZone(value) => settings.delivery_zone = value,
        }
        self.has_unsaved_changes = true;
    }

    /// Lock the form and build the update for the current store.
    ///
    /// # Errors
    ///
    /// Returns `SaveOutcome::Busy` while a save is in flight and
    /// `SaveOutcome::NoStore` if `state` has no current store.
    pub fn begin_save(&mut self, state: &SessionState) -> Result<StoreUpdate, SaveOutcome> {
        if self.is_saving {
            return Err(SaveOutcome::Busy);
        }
        if state.current_store().is_none() {
            return Err(SaveOutcome::NoStore);
        }
        self.is_saving = true;
        Ok(self.settings.to_update())
    }

    /// Apply the outcome of a save, notify, and unlock the form.
    pub fn finish_save(
        &mut self,
        result: Result<Store, SessionError>,
        notifier: &dyn Notifier,
    ) -> SaveOutcome {
        self.is_saving = false;
        match result {
            Ok(store) => {
                self.settings = PaymentSettings::from_store(&store);
                self.currency = store.currency;
                self.has_unsaved_changes = false;
                notifier.success(messages::SETTINGS_SAVED_TITLE, messages::SETTINGS_SAVED_MESSAGE);
                SaveOutcome::Saved(Box::new(store))
            }
            Err(err) => {
                let message = err.to_string();
                notifier.error(
                    messages::SETTINGS_SAVE_FAILED_TITLE,
                    messages::or_fallback(&message, messages::SETTINGS_SAVE_FAILED_MESSAGE),
                );
                SaveOutcome::Failed
            }
        }
    }

    /// Save the settings to the current store.
    pub async fn save(&mut self, context: &StoreContext, notifier: &dyn Notifier) -> SaveOutcome {
        let update = match self.begin_save(&context.snapshot()) {
            Ok(update) => update,
            Err(outcome) => return outcome,
        };
        let result = context.update_store(&update).await;
        self.finish_save(result, notifier)
    }

    /// Label of the save button.
    #[must_use]
    pub const fn save_label(&self) -> &'static str {
        if self.is_saving {
            messages::SAVING
        } else if self.has_unsaved_changes {
            messages::SAVE_CHANGES
        } else {
            messages::NO_CHANGES
        }
    }

    /// Banner shown while there are unsaved edits.
    #[must_use]
    pub const fn unsaved_warning(&self) -> Option<&'static str> {
        if self.has_unsaved_changes {
            Some(messages::UNSAVED_CHANGES)
        } else {
            None
        }
    }

    /// Recap of the methods currently switched on in the form.
    #[must_use]
    pub fn summary(&self) -> SettingsSummary {
        let settings = &self.settings;

        let mut payment_methods = Vec::new();
        if settings.accept_cash {
            payment_methods.push(messages::PAYMENT_CASH.to_string());
        }
        if settings.accept_bank_transfer {
            payment_methods.push(messages::PAYMENT_BANK_TRANSFER.to_string());
        }

        let mut shipping_methods = Vec::new();
        if settings.allow_pickup {
            shipping_methods.push(messages::SHIPPING_PICKUP.to_string());
        }
        if settings.allow_delivery {
            let cost = Price::new(settings.delivery_cost, self.currency);
            shipping_methods.push(format!("{} ({cost})", messages::SHIPPING_DELIVERY));
        }

        SettingsSummary {
            payment_warning: payment_methods
                .is_empty()
                .then_some(messages::NO_PAYMENT_METHODS),
            shipping_warning: shipping_methods
                .is_empty()
                .then_some(messages::NO_SHIPPING_METHODS),
            payment_methods,
            shipping_methods,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tutaviendo_core::{Email, Password};

    use super::*;
    use crate::memory::MemoryBackend;
    use crate::models::store::fixtures::store;
    use crate::services::{MemoryNotifier, PersistenceError, ToastKind};

    async fn signed_in_with(store: Store) -> (StoreContext, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let email = Email::parse("ana@tienda.com").unwrap();
        let user = backend.add_account(&email, "secreto1", "Ana");
        backend.add_store(user.id, store);
        let context = StoreContext::with_backend(backend.clone());
        context.initialize().await;
        context
            .login(&email, &Password::parse("secreto1").unwrap())
            .await
            .unwrap();
        (context, backend)
    }

    #[test]
    fn test_defaults_without_store() {
        let form = PaymentsShippingForm::new(None);
        assert!(!form.has_store());
        assert_eq!(*form.settings(), PaymentSettings::default());
        assert!(form.settings().accept_cash);
        assert!(!form.settings().accept_bank_transfer);
        assert!(form.settings().allow_pickup);
        assert!(!form.settings().allow_delivery);
    }

    #[test]
    fn test_initialised_from_store() {
        let form = PaymentsShippingForm::new(Some(&store("Tienda")));
        assert!(!form.settings().accept_cash);
        assert!(form.settings().accept_bank_transfer);
        assert_eq!(form.settings().bank_details, "Banco Uno 0001");
        assert!(!form.has_unsaved_changes());
        assert_eq!(form.save_label(), messages::NO_CHANGES);
    }

    #[test]
    fn test_parse_delivery_cost() {
        assert_eq!(parse_delivery_cost("5"), Decimal::from(5));
        assert_eq!(parse_delivery_cost(" 2.50 "), Decimal::new(250, 2));
        assert_eq!(parse_delivery_cost("-3"), Decimal::ZERO);
        assert_eq!(parse_delivery_cost("abc"), Decimal::ZERO);
        assert_eq!(parse_delivery_cost(""), Decimal::ZERO);
    }

    #[test]
    fn test_any_change_marks_unsaved() {
        let mut form = PaymentsShippingForm::new(Some(&store("Tienda")));
        form.apply(SettingsChange::AllowPickup(true));

        assert!(form.has_unsaved_changes());
        assert!(form.can_save());
        assert_eq!(form.unsaved_warning(), Some(messages::UNSAVED_CHANGES));
    }

    #[test]
    fn test_update_trims_and_clears_text() {
        let mut settings = PaymentSettings::default();
        settings.bank_details = "  Banco Dos 0002 \n".to_string();
        settings.delivery_zone = "   ".to_string();

        let update = settings.to_update();

        assert_eq!(update.bank_details, Some(Some("Banco Dos 0002".to_string())));
        assert_eq!(update.delivery_zone, Some(None));
        assert_eq!(update.name, None);
        assert_eq!(update.currency, None);
    }

    #[test]
    fn test_summary() {
        let mut form = PaymentsShippingForm::new(Some(&Store {
            currency: CurrencyCode::EUR,
            ..store("Tienda")
        }));
        form.apply(SettingsChange::AllowDelivery(true));
        form.apply(SettingsChange::DeliveryCost("3.5".to_string()));

        let summary = form.summary();
        assert_eq!(summary.payment_methods, vec![messages::PAYMENT_BANK_TRANSFER]);
        assert_eq!(summary.shipping_methods, vec!["Recogida en Tienda", "Delivery (€3.5)"]);
        assert_eq!(summary.payment_warning, None);

        form.apply(SettingsChange::AcceptBankTransfer(false));
        form.apply(SettingsChange::AllowPickup(false));
        form.apply(SettingsChange::AllowDelivery(false));
        let summary = form.summary();
        assert_eq!(summary.payment_warning, Some(messages::NO_PAYMENT_METHODS));
        assert_eq!(summary.shipping_warning, Some(messages::NO_SHIPPING_METHODS));
    }

    #[tokio::test]
    async fn test_save_persists_and_notifies() {
        let original = store("Tienda");
        let (context, backend) = signed_in_with(original.clone()).await;
        let notifier = MemoryNotifier::new();

        let mut form = PaymentsShippingForm::for_session(&context.snapshot());
        form.apply(SettingsChange::AcceptCash(true));
        form.apply(SettingsChange::AllowDelivery(true));
        form.apply(SettingsChange::DeliveryCost("5".to_string()));
        let outcome = form.save(&context, &notifier).await;

        assert!(matches!(outcome, SaveOutcome::Saved(_)));
        assert!(!form.has_unsaved_changes());
        assert!(!form.is_saving());

        let saved = backend.store(original.id).unwrap();
        assert!(saved.accept_cash);
        assert!(saved.allow_delivery);
        assert_eq!(saved.delivery_cost, Decimal::from(5));
        assert_eq!(context.snapshot().current_store(), Some(&saved));

        let toasts = notifier.drain();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].kind, ToastKind::Success);
        assert_eq!(toasts[0].title, messages::SETTINGS_SAVED_TITLE);
    }

    #[tokio::test]
    async fn test_save_failure_keeps_changes() {
        let (context, backend) = signed_in_with(store("Tienda")).await;
        backend.fail_next_update_store(PersistenceError::Rejected(
            "new row violates check constraint".to_string(),
        ));
        let notifier = MemoryNotifier::new();
        let before = context.snapshot();

        let mut form = PaymentsShippingForm::for_session(&before);
        form.apply(SettingsChange::AcceptCash(true));
        let outcome = form.save(&context, &notifier).await;

        assert_eq!(outcome, SaveOutcome::Failed);
        assert!(form.has_unsaved_changes());
        assert!(form.settings().accept_cash);
        assert_eq!(*context.snapshot(), *before);

        let toasts = notifier.drain();
        assert_eq!(toasts[0].kind, ToastKind::Error);
        assert_eq!(toasts[0].message, "new row violates check constraint");
    }

    #[tokio::test]
    async fn test_save_without_store() {
        let backend = Arc::new(MemoryBackend::new());
        let context = StoreContext::with_backend(backend.clone());
        context.initialize().await;
        let notifier = MemoryNotifier::new();

        let mut form = PaymentsShippingForm::for_session(&context.snapshot());
        form.apply(SettingsChange::AcceptCash(false));

        assert_eq!(form.save(&context, &notifier).await, SaveOutcome::NoStore);
        assert!(notifier.toasts().is_empty());
        assert!(!form.is_saving());
    }

    #[test]
    fn test_double_save_is_rejected() {
        let state = SessionState::signed_in(
            crate::models::session::fixtures::user("Ana"),
            vec![store("Tienda")],
        );
        let mut form = PaymentsShippingForm::for_session(&state);
        form.apply(SettingsChange::AcceptCash(true));

        assert!(form.begin_save(&state).is_ok());
        assert_eq!(form.save_label(), messages::SAVING);
        assert_eq!(form.begin_save(&state), Err(SaveOutcome::Busy));
    }
}
