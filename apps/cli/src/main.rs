use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shared::domain::{FieldName, TextField, TICKET_STORAGE_KEY};
use storage::{KeyValueStore, Storage};
use ticket_core::{
    decode_data_url, load_settings, resolve_database_url, AvatarFile, AvatarSrc, FormController,
    PreviewRegistry, Settings, SubmitOutcome, SubmitRejection, TicketRenderer, TicketView,
};

#[derive(Parser, Debug)]
#[command(name = "conf-ticket-cli", about = "Generate and inspect conference tickets")]
struct Cli {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the details and store them as the current ticket.
    Submit {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        github: String,
        #[arg(long)]
        avatar: Option<PathBuf>,
        /// Accept a submission without an avatar.
        #[arg(long)]
        no_avatar_required: bool,
    },
    /// Print the stored ticket.
    Show,
    /// Forget the stored ticket.
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;
    let database_url = resolve_database_url(
        cli.database_url.as_deref(),
        &settings,
        cli.data_dir.as_deref(),
    )?;
    let storage = Storage::new(&database_url).await?;

    match cli.command {
        Command::Submit {
            full_name,
            email,
            github,
            avatar,
            no_avatar_required,
        } => {
            let avatar = avatar
                .map(|path| {
                    AvatarFile::from_path(&path)
                        .with_context(|| format!("cannot use avatar '{}'", path.display()))
                })
                .transpose()?;
            submit(
                &settings,
                &storage,
                [full_name, email, github],
                avatar,
                !no_avatar_required,
            )
            .await?;
        }
        Command::Show => {
            let view = TicketRenderer::new(settings.event.clone())
                .load(&storage)
                .await;
            print!("{}", render_ticket_text(&view, &settings));
        }
        Command::Clear => {
            storage.remove_item(TICKET_STORAGE_KEY).await?;
            println!("cleared stored ticket");
        }
    }

    Ok(())
}

async fn submit(
    settings: &Settings,
    store: &dyn KeyValueStore,
    texts: [String; 3],
    avatar: Option<AvatarFile>,
    avatar_required: bool,
) -> Result<()> {
    let mut form = FormController::new(PreviewRegistry::new())
        .with_avatar_required(avatar_required && settings.avatar_required);
    for (field, value) in TextField::ALL.into_iter().zip(texts) {
        form.update_field(field, value);
    }
    form.set_avatar(avatar);

    let navigator = |path: &str| tracing::info!(route = path, "navigation requested");
    match form.submit(store, &navigator).await {
        SubmitOutcome::Stored(ticket) => {
            println!("ticket generated for {}", ticket.full_name);
            Ok(())
        }
        SubmitOutcome::Rejected(SubmitRejection::Invalid(fields)) => {
            for field in &fields {
                eprintln!("{}: {}", field, form.error(*field));
            }
            bail!("{} field(s) need attention", fields.len())
        }
        SubmitOutcome::Rejected(SubmitRejection::Busy) => bail!("a submission is already running"),
        SubmitOutcome::Failed(reason) => {
            let avatar_error = form.error(FieldName::Avatar);
            if !avatar_error.is_empty() {
                eprintln!("{}: {avatar_error}", FieldName::Avatar);
            }
            bail!("{reason}")
        }
    }
}

fn render_ticket_text(view: &TicketView, settings: &Settings) -> String {
    let avatar = match &view.avatar {
        AvatarSrc::Embedded(url) => match decode_data_url(url) {
            Some((mime, bytes)) => format!("embedded {mime}, {} bytes", bytes.len()),
            None => "embedded image".to_string(),
        },
        AvatarSrc::Default => settings
            .resolve_asset(view.avatar.as_str())
            .display()
            .to_string(),
    };
    format!(
        concat!(
            "{headline}\n{notice}\n\n",
            "{event} {number}\n{schedule}\n\n",
            "{name}\n{github}\navatar: {avatar}\n",
        ),
        headline = view.headline(),
        notice = view.email_notice(),
        event = view.event.name,
        number = view.event.ticket_number,
        schedule = view.event_line(),
        name = view.name.full(),
        github = view.github_username,
        avatar = avatar,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::PersistedTicket;
    use storage::MemoryStore;

    fn sample_view(avatar: &str) -> TicketView {
        TicketRenderer::new(Default::default()).render(&PersistedTicket {
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            github_username: "@ada".to_string(),
            avatar: avatar.to_string(),
        })
    }

    #[test]
    fn text_ticket_lists_name_and_event() {
        let text = render_ticket_text(&sample_view(""), &Settings::default());
        assert!(text.starts_with("Congrats, Ada Lovelace! Your ticket is ready."));
        assert!(text.contains("Coding Conf #01609"));
        assert!(text.contains("Jan 31, 2025 / Austin, TX"));
        assert!(text.contains("avatar: public/assets/images/image-avatar.jpg"));
    }

    #[test]
    fn text_ticket_summarises_embedded_avatar() {
        let text = render_ticket_text(
            &sample_view("data:image/png;base64,AQID"),
            &Settings::default(),
        );
        assert!(text.contains("avatar: embedded image/png, 3 bytes"));
    }

    #[tokio::test]
    async fn submit_reports_invalid_fields_without_storing() {
        let store = MemoryStore::new();
        let err = submit(
            &Settings::default(),
            &store,
            ["A".to_string(), "bad".to_string(), String::new()],
            None,
            true,
        )
        .await
        .expect_err("rejected");
        assert!(err.to_string().contains("4 field(s)"));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn submit_without_required_avatar_stores_default() {
        let store = MemoryStore::new();
        submit(
            &Settings::default(),
            &store,
            [
                "Ada Lovelace".to_string(),
                "ada@example.com".to_string(),
                "ada".to_string(),
            ],
            None,
            false,
        )
        .await
        .expect("stored");
        let raw = store
            .get_item(TICKET_STORAGE_KEY)
            .await
            .expect("get")
            .expect("present");
        assert!(raw.contains("\"fullName\":\"Ada Lovelace\""));
    }
}
