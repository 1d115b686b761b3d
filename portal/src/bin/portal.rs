//! OurBusWay portal CLI
//!
//! Drives the portal flows against a running gateway.
//!
//! # Usage
//!
//! ```bash
//! # Sign in and print the bearer token
//! portal login --email amina@example.com --password secret
//!
//! # Pay for a ticket request created by the ticket service
//! OURBUSWAY_TOKEN=... STRIPE_PUBLISHABLE_KEY=pk_test_... \
//!     portal pay-ticket --request-id tr-42 --payment-method pm_card_visa
//!
//! # Back-office figures (admin token)
//! OURBUSWAY_TOKEN=... portal stats
//! ```

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use ourbusway_client::{ApiClient, LoginRequest, StripeCardConfirmer};
use ourbusway_core::navigation::{NavigationTarget, Navigator};
use ourbusway_core::types::CardInput;
use ourbusway_portal::{
    BookingRequest, CheckoutEnvironment, CheckoutKind, CheckoutPhase, Config,
    DashboardOverview, ReferenceParts, SessionStore, checkout_store, close_checkout,
    complete_checkout,
};
use ourbusway_runtime::PaymentInitializer;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "portal")]
#[command(about = "OurBusWay passenger and back-office portal", long_about = None)]
struct Cli {
    /// Bearer token from `portal login`
    #[arg(long, env = "OURBUSWAY_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and print the bearer token
    Login {
        /// Account email
        #[arg(long)]
        email: String,
        /// Account password
        #[arg(long)]
        password: String,
    },
    /// Pay for a ticket request
    PayTicket {
        /// Ticket request id
        #[arg(long)]
        request_id: String,
        /// Provider payment method (`pm_card_visa`, ...)
        #[arg(long)]
        payment_method: String,
    },
    /// Pay for a subscription request
    PaySubscription {
        /// Subscription request id
        #[arg(long)]
        request_id: String,
        /// Provider payment method (`pm_card_visa`, ...)
        #[arg(long)]
        payment_method: String,
    },
    /// Print the back-office overview
    Stats,
    /// Check a trip search
    Book {
        /// Departure
        #[arg(long)]
        from: String,
        /// Destination
        #[arg(long)]
        to: String,
    },
}

/// Navigator for a terminal: there is no page to move to, so log the request.
struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, target: NavigationTarget) {
        tracing::info!(path = %target, "Navigate");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    ourbusway_runtime::metrics::describe_metrics();

    let cli = Cli::parse();
    tracing::debug!(api = %config.api.base_url, "Configuration loaded");

    let client = ApiClient::new(&config.api_config()).context("building gateway client")?;
    let client = match cli.token.as_deref() {
        Some(token) => client.with_token(token),
        None => client,
    };

    match cli.command {
        Command::Login { email, password } => {
            let sessions = SessionStore::new(client, Arc::new(LogNavigator));
            let home = sessions
                .login(&LoginRequest { email, password })
                .await
                .context("login failed")?;
            let Some(session) = sessions.current() else {
                bail!("login returned no session");
            };
            println!("Signed in as {} ({home})", session.user.display_name());
            println!("{}", session.token());
        },
        Command::PayTicket {
            request_id,
            payment_method,
        } => {
            pay(
                &config,
                client,
                CheckoutKind::Ticket,
                ReferenceParts::ticket(request_id),
                CardInput::new(payment_method),
            )
            .await?;
        },
        Command::PaySubscription {
            request_id,
            payment_method,
        } => {
            pay(
                &config,
                client,
                CheckoutKind::Subscription,
                ReferenceParts::subscription(request_id),
                CardInput::new(payment_method),
            )
            .await?;
        },
        Command::Stats => {
            let overview = DashboardOverview::load(&client.admin_stats())
                .await
                .context("loading statistics")?;
            println!("Tickets sold today:      {}", overview.tickets_sold_today.count);
            println!(
                "Revenue today:           {} {}",
                overview.combined_revenue_today(),
                overview.ticket_revenue_today.currency
            );
            println!(
                "Active subscriptions:    {}",
                overview.active_subscriptions.count
            );
            println!(
                "Total transactions:      {}",
                overview.transactions.total_transactions
            );
            println!(
                "Subscription revenue:    {} {}",
                overview.subscription_revenue_total.total_revenue,
                overview.subscription_revenue_total.currency
            );
        },
        Command::Book { from, to } => {
            let request = BookingRequest::new(from, to);
            let (from, to) = request.validate()?;
            println!("Searching trips from {from} to {to}");
        },
    }

    Ok(())
}

async fn pay(
    config: &Config,
    client: ApiClient,
    kind: CheckoutKind,
    parts: ReferenceParts,
    card: CardInput,
) -> anyhow::Result<()> {
    let confirmer = StripeCardConfirmer::with_api_url(config.stripe_key()?, &config.stripe.api_url)
        .context("building payment provider client")?;
    let policy = config.retry_policy();
    let step_timeout = policy.total_delay_budget() + config.redirect_delay() + Duration::from_secs(60);

    let initializer = PaymentInitializer::new(Arc::new(client.payments())).with_retry_policy(policy);
    let environment = CheckoutEnvironment::new(initializer, Arc::new(confirmer), Arc::new(LogNavigator))
        .with_redirect_delay(config.redirect_delay());
    let store = checkout_store(kind, environment);

    let outcome = complete_checkout(&store, parts, card, step_timeout).await;
    close_checkout(&store).await;
    let state = outcome?;

    for notice in &state.notices {
        println!("[{:?}] {}", notice.level, notice.text);
    }
    if state.phase != CheckoutPhase::Succeeded {
        bail!(
            "checkout ended in {:?}{}",
            state.phase,
            state
                .error
                .as_deref()
                .map(|e| format!(": {e}"))
                .unwrap_or_default()
        );
    }
    if let Some(amount) = state.amount_label() {
        println!("Paid {amount}");
    }
    Ok(())
}
