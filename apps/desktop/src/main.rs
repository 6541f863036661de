use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use client_core::{
    config::load_settings, drive, form::TRANSACTION_SUBMITTED, EmailStatus,
    HttpReservationClient, ReservationForm,
};
use shared::domain::TransactionAction;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ActionArg {
    Add,
    Remove,
}

impl From<ActionArg> for TransactionAction {
    fn from(value: ActionArg) -> Self {
        match value {
            ActionArg::Add => TransactionAction::Add,
            ActionArg::Remove => TransactionAction::Remove,
        }
    }
}

/// Add or remove stock for one item, identifying yourself by email.
#[derive(Parser, Debug)]
struct Args {
    /// Item id, or an `/item/{id}` route.
    #[arg(long)]
    item: String,
    #[arg(long)]
    email: String,
    /// Required only when the email is not registered yet.
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long, value_enum, default_value_t = ActionArg::Add)]
    action: ActionArg,
    #[arg(long, default_value = "1")]
    quantity: String,
    /// Overrides `server_url` from the settings file and environment.
    #[arg(long)]
    server_url: Option<String>,
    /// Settings file (defaults to ./reservation.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();
    run(args).await
}

async fn run(args: Args) -> Result<()> {
    let settings =
        load_settings(args.config.as_deref())?.with_server_url_override(args.server_url.clone());
    let client = HttpReservationClient::from_settings(&settings)
        .with_context(|| format!("cannot use server url '{}'", settings.server_url))?;
    let mut form = ReservationForm::new(&settings);

    let effect = form.mount(Some(&args.item));
    drive(&client, &mut form, effect).await;
    if let Some(message) = form.fatal_error() {
        bail!("{message}");
    }
    let item = form.item().context("item details missing after load")?;
    println!(
        "Item: {} | Room: {} | Remaining quantity: {}",
        item.name, item.location, item.remaining_quantity
    );

    form.set_email(&args.email);
    if let Some(notice) = form.email_notice() {
        eprintln!("note: {notice}");
    }
    let effect = form.blur_email();
    if let Some(err) = form.email_error() {
        bail!("{err}");
    }
    drive(&client, &mut form, effect).await;
    fail_on_error(&form)?;

    match form.email_status() {
        EmailStatus::Recognized => {
            let requester = form.requester();
            println!(
                "Recognized {} {} <{}>",
                requester.first_name, requester.last_name, requester.email
            );
        }
        EmailStatus::NeedsRegistration => {
            let (Some(first_name), Some(last_name)) =
                (args.first_name.as_deref(), args.last_name.as_deref())
            else {
                bail!(
                    "{} is not registered yet; pass --first-name and --last-name to register it",
                    form.requester().email
                );
            };
            form.set_first_name(first_name);
            form.set_last_name(last_name);
            let effect = form.register();
            if effect.is_none() {
                bail!("first and last name must not be empty");
            }
            drive(&client, &mut form, effect).await;
            fail_on_error(&form)?;
            if let Some(notice) = form.notice() {
                println!("{notice}");
            }
        }
        other => bail!("email could not be verified (status: {other:?})"),
    }

    form.set_action(args.action.into());
    form.set_quantity_input(&args.quantity);
    let effect = form.submit();
    if let Some(err) = form.quantity_error() {
        bail!("{err}");
    }
    fail_on_error(&form)?;
    drive(&client, &mut form, effect).await;

    if form.notice() != Some(TRANSACTION_SUBMITTED) {
        bail!(
            "{}",
            form.error().unwrap_or("the transaction was not submitted")
        );
    }
    println!("{TRANSACTION_SUBMITTED}");
    match (form.error(), form.item()) {
        (Some(err), _) => tracing::warn!(error = err, "could not refresh item after submission"),
        (None, Some(item)) => println!("Remaining quantity: {}", item.remaining_quantity),
        (None, None) => {}
    }
    Ok(())
}

fn fail_on_error(form: &ReservationForm) -> Result<()> {
    match form.error() {
        Some(message) => bail!("{message}"),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_command_line() {
        let args = Args::try_parse_from([
            "desktop",
            "--item",
            "/item/42",
            "--email",
            "a@b.com",
            "--first-name",
            "Grace",
            "--last-name",
            "Hopper",
            "--action",
            "remove",
            "--quantity",
            "2",
        ])
        .expect("parse");
        assert_eq!(args.item, "/item/42");
        assert_eq!(TransactionAction::from(args.action), TransactionAction::Remove);
        assert_eq!(args.quantity, "2");
        assert!(args.server_url.is_none());
    }

    #[test]
    fn action_defaults_to_add() {
        let args = Args::try_parse_from(["desktop", "--item", "42", "--email", "a@b.com"])
            .expect("parse");
        assert_eq!(TransactionAction::from(args.action), TransactionAction::Add);
        assert_eq!(args.quantity, "1");
    }
}
