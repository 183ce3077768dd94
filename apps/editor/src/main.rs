use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{config::load_client_settings, UserApi, UserQueries, UsersClient};
use profile_form::{FormError, FormPolicy, ProfileForm};
use shared::{
    domain::{UserField, UserId},
    protocol::NewUser,
};
use tracing_subscriber::EnvFilter;

mod render;

use render::{render_form, render_record};

#[derive(Parser, Debug)]
#[command(about = "Inspect and edit user profiles")]
struct Cli {
    /// Overrides the configured API base url.
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    fetch_delay_ms: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List {
        #[arg(long)]
        json: bool,
    },
    Get {
        id: String,
        #[arg(long)]
        json: bool,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
    },
    Delete {
        id: String,
    },
    /// Loads a user, applies the given edits and saves them.
    Edit(EditArgs),
}

#[derive(clap::Args, Debug)]
struct EditArgs {
    id: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    /// Discard the edits again before saving.
    #[arg(long)]
    reset: bool,
    /// Show the resulting form without saving.
    #[arg(long)]
    dry_run: bool,
    /// Save without validating first.
    #[arg(long)]
    unchecked: bool,
}

impl EditArgs {
    fn edits(&self) -> impl Iterator<Item = (UserField, &str)> + '_ {
        [
            (UserField::Name, self.name.as_deref()),
            (UserField::Email, self.email.as_deref()),
            (UserField::Phone, self.phone.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|value| (field, value)))
    }

    fn policy(&self) -> FormPolicy {
        if self.unchecked {
            FormPolicy::Seeded
        } else {
            FormPolicy::Overlay
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let cli = Cli::parse();

    let mut settings = load_client_settings();
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }
    if let Some(delay) = cli.fetch_delay_ms {
        settings.fetch_delay_ms = delay;
    }

    let client = UsersClient::from_settings(&settings)
        .with_context(|| format!("cannot use api url '{}'", settings.api_url))?;
    let api: Arc<dyn UserApi> = Arc::new(client);
    let queries = UserQueries::with_retry(api.clone(), settings.retry_policy());

    match cli.command {
        Command::List { json } => {
            let users = api.list_users().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&users)?);
            } else {
                for user in &users {
                    println!("{}", render_record(user));
                }
            }
        }
        Command::Get { id, json } => {
            let user = api.fetch_user(&UserId(id)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&user)?);
            } else {
                println!("{}", render_record(&user));
            }
        }
        Command::Create { name, email, phone } => {
            let created = api
                .create_user(&NewUser::new(name, email, phone))
                .await?;
            println!("created {}", render_record(&created));
        }
        Command::Delete { id } => {
            api.delete_user(&UserId(id.clone())).await?;
            println!("deleted {id}");
        }
        Command::Edit(args) => run_edit(&queries, args, settings.fetch_delay()).await?,
    }

    Ok(())
}

async fn run_edit(queries: &UserQueries, args: EditArgs, fetch_delay: Duration) -> Result<()> {
    let mut form = ProfileForm::new(queries, UserId(args.id.clone()), args.policy());

    if !fetch_delay.is_zero() {
        println!("loading {} ...", args.id);
    }
    form.load()
        .await
        .with_context(|| format!("failed to load user {}", args.id))?;

    for (field, value) in args.edits() {
        form.edit(field, value);
    }
    tracing::debug!(user_id = %form.id(), dirty = form.is_dirty(), "edits applied");
    if args.reset {
        match form.reset() {
            Ok(()) => println!("edits discarded"),
            Err(err) => println!("reset skipped: {err}"),
        }
    }

    print!("{}", render_form(&form));

    if args.dry_run {
        return Ok(());
    }
    if !form.is_dirty() {
        println!("nothing to save");
        return Ok(());
    }

    match form.submit().await {
        Ok(saved) => {
            println!("saved {}", render_record(&saved));
            Ok(())
        }
        Err(FormError::Invalid(errors)) => bail!("user not saved: {errors}"),
        Err(err) => Err(err).context("failed to save user"),
    }
}
