//! Payment and shipping settings of the current store.

use clap::Args;
use tracing::info;

use tutaviendo_admin::messages;
use tutaviendo_admin::screens::{PaymentsShippingForm, SaveOutcome, SettingsChange};
use tutaviendo_admin::services::TracingNotifier;

use super::CommandError;
use super::session::Session;

/// Settings to change; omitted flags keep their value.
#[derive(Debug, Default, Args)]
pub struct PaymentArgs {
    /// Accept cash
    #[arg(long)]
    pub cash: Option<bool>,

    /// Accept bank transfers
    #[arg(long)]
    pub bank_transfer: Option<bool>,

    /// Bank account details shown to buyers (empty to clear)
    #[arg(long)]
    pub bank_details: Option<String>,

    /// Allow in-store pickup
    #[arg(long)]
    pub pickup: Option<bool>,

    /// Offer delivery
    #[arg(long)]
    pub delivery: Option<bool>,

    /// Flat delivery fee
    #[arg(long)]
    pub delivery_cost: Option<String>,

    /// Delivery coverage area (empty to clear)
    #[arg(long)]
    pub delivery_zone: Option<String>,
}

impl PaymentArgs {
    /// Form edits for the flags that were given.
    #[must_use]
    pub fn changes(self) -> Vec<SettingsChange> {
        [
            self.cash.map(SettingsChange::AcceptCash),
            self.bank_transfer.map(SettingsChange::AcceptBankTransfer),
            self.bank_details.map(SettingsChange::BankDetails),
            self.pickup.map(SettingsChange::AllowPickup),
            self.delivery.map(SettingsChange::AllowDelivery),
            self.delivery_cost.map(SettingsChange::DeliveryCost),
            self.delivery_zone.map(SettingsChange::DeliveryZone),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

fn current_form(session: &Session) -> Result<PaymentsShippingForm, CommandError> {
    let state = session.context.snapshot();
    if !state.is_authenticated() {
        return Err(CommandError::NotSignedIn);
    }
    let form = PaymentsShippingForm::for_session(&state);
    if form.has_store() {
        Ok(form)
    } else {
        Err(CommandError::NoStore)
    }
}

fn log_summary(form: &PaymentsShippingForm) {
    let summary = form.summary();
    let settings = form.settings();

    match summary.payment_warning {
        Some(warning) => info!("{warning}"),
        None => info!(methods = %summary.payment_methods.join(", "), "Payment methods"),
    }
    if settings.accept_bank_transfer && !settings.bank_details.is_empty() {
        info!(details = %settings.bank_details, "Bank details");
    }

    match summary.shipping_warning {
        Some(warning) => info!("{warning}"),
        None => info!(methods = %summary.shipping_methods.join(", "), "Shipping methods"),
    }
    if settings.allow_delivery && !settings.delivery_zone.is_empty() {
        info!(zone = %settings.delivery_zone, "Delivery zone");
    }
}

/// Show the active methods of the current store.
///
/// # Errors
///
/// Returns `CommandError::NotSignedIn` or `CommandError::NoStore`.
pub fn show(session: &Session) -> Result<(), CommandError> {
    log_summary(&current_form(session)?);
    Ok(())
}

/// Apply `args` to the current store's settings and save them.
///
/// # Errors
///
/// Returns `CommandError::Invalid` when no flag was given, and
/// `CommandError::Rejected` when the backend refused the update.
pub async fn set(session: &Session, args: PaymentArgs) -> Result<(), CommandError> {
    let changes = args.changes();
    if changes.is_empty() {
        return Err(CommandError::Invalid("nothing to change".to_string()));
    }

    let mut form = current_form(session)?;
    for change in changes {
        form.apply(change);
    }

    match form.save(&session.context, &TracingNotifier).await {
        SaveOutcome::Saved(store) => {
            info!(store = %store.name, "Settings saved");
            log_summary(&form);
            Ok(())
        }
        SaveOutcome::NoStore => Err(CommandError::NoStore),
        SaveOutcome::Failed | SaveOutcome::Busy => Err(CommandError::Rejected(
            messages::SETTINGS_SAVE_FAILED_MESSAGE.to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_given_flags_become_changes() {
        let args = PaymentArgs {
            cash: Some(true),
            delivery: Some(true),
            delivery_cost: Some("5".to_string()),
            ..PaymentArgs::default()
        };

        assert_eq!(
            args.changes(),
            vec![
                SettingsChange::AcceptCash(true),
                SettingsChange::AllowDelivery(true),
                SettingsChange::DeliveryCost("5".to_string()),
            ]
        );
    }

    #[test]
    fn test_no_flags_no_changes() {
        assert!(PaymentArgs::default().changes().is_empty());
    }
}
