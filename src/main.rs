//! docdesk command-line interface.
//!
//! Each subcommand maps onto one workspace intent; all state transitions
//! live in the library.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::ProgressBar;
use tracing_subscriber::EnvFilter;
use url::Url;

use docdesk::api::ApiClient;
use docdesk::config::{Config, Settings};
use docdesk::models::{DocumentSummary, PendingUpload, Role};
use docdesk::workspace::{Modal, Notice, Screen, Workspace};

#[derive(Parser)]
#[command(
    name = "docdesk",
    version,
    about = "Workspace client for a document management service"
)]
struct Cli {
    /// Override the service base URL.
    #[arg(long, env = "DOCDESK_API_URL", global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and persist the session token.
    Login {
        username: String,
        /// Password (prompted when omitted).
        #[arg(long, env = "DOCDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Register a new account, then log in separately.
    Register {
        username: String,
        /// Role for the new account (HR, Finance, Legal or Admin).
        #[arg(long, default_value = "HR")]
        role: Role,
        #[arg(long)]
        email: Option<String>,
        /// Password (prompted twice when omitted).
        #[arg(long, env = "DOCDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the persisted session.
    Logout,
    /// Show the authenticated identity.
    Whoami,
    /// List all documents.
    List,
    /// Ranked search over documents.
    Search { query: String },
    /// Show full detail for one document.
    Show { docid: i64 },
    /// Download a document's content.
    Download {
        docid: i64,
        /// Output path (defaults to the document's filename).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Upload a document.
    Upload {
        path: PathBuf,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        summary: Option<String>,
    },
    /// Show access logs (HR and Admin only).
    Logs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::load().await;
    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    if let Some(ref api_url) = cli.api_url {
        settings.api_url = api_url.trim_end_matches('/').to_string();
    }
    Url::parse(&settings.api_url)
        .with_context(|| format!("invalid service URL: {}", settings.api_url))?;
    settings
        .ensure_directories()
        .context("failed to create data directory")?;

    let api = ApiClient::new(&settings.api_url, Duration::from_secs(settings.request_timeout));
    let mut workspace = Workspace::new(api, settings.token_path());

    // Login and register start from a clean slate; everything else restores
    // the persisted session first.
    match cli.command {
        Command::Login { .. } | Command::Register { .. } | Command::Logout => {}
        _ => {
            workspace.start().await;
            report(&mut workspace);
            if !matches!(workspace.screen(), Screen::Workspace { .. }) {
                eprintln!(
                    "{}",
                    style("Not logged in. Run `docdesk login <username>` first.").yellow()
                );
                std::process::exit(1);
            }
        }
    }

    let failed = run(cli.command, &mut workspace).await?;
    if failed {
        std::process::exit(1);
    }
    Ok(())
}

async fn run(command: Command, workspace: &mut Workspace) -> anyhow::Result<bool> {
    let mut failed = false;
    match command {
        Command::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt_password("Password: ")?,
            };
            workspace.login(&username, &password).await;
            failed |= report(workspace);
            if let Screen::Workspace { .. } = workspace.screen() {
                println!("{}", style(format!("Logged in as {}", identity_line(workspace))).green());
            }
        }
        Command::Register {
            username,
            role,
            email,
            password,
        } => {
            let (password, confirm) = match password {
                Some(password) => (password.clone(), password),
                None => (
                    prompt_password("Password: ")?,
                    prompt_password("Confirm password: ")?,
                ),
            };
            workspace
                .register(&username, &password, &confirm, role, email.as_deref())
                .await;
            failed |= report(workspace);
        }
        Command::Logout => {
            workspace.logout();
            println!("Logged out.");
        }
        Command::Whoami => {
            println!("{}", identity_line(workspace));
        }
        Command::List => {
            workspace.refresh_documents().await;
            failed |= report(workspace);
            print_documents(workspace.documents().documents());
        }
        Command::Search { query } => {
            workspace.search(&query).await;
            failed |= report(workspace);
            print_documents(workspace.documents().documents());
        }
        Command::Show { docid } => {
            workspace.view_document(docid).await;
            failed |= report(workspace);
            if matches!(workspace.screen(), Screen::Workspace { modal: Modal::Detail }) {
                if let Some(detail) = workspace.documents().selected() {
                    println!("{}", style(&detail.filename).bold());
                    println!("  Category: {}", detail.category);
                    if let Some(ref author) = detail.author {
                        println!("  Author:   {author}");
                    }
                    if let Some(ref summary) = detail.summary {
                        println!("\n{}\n{summary}", style("Summary").bold());
                    }
                    println!("\n{}\n{}", style("Content Preview").bold(), detail.content_preview);
                }
                workspace.close_modal();
            }
        }
        Command::Download { docid, output } => {
            let spinner = ProgressBar::new_spinner();
            spinner.set_message(format!("Downloading document {docid}"));
            spinner.enable_steady_tick(Duration::from_millis(100));
            let blob = workspace.download(docid).await;
            spinner.finish_and_clear();
            failed |= report(workspace);
            if let Some(blob) = blob {
                let path = output.unwrap_or_else(|| PathBuf::from(&blob.filename));
                fs::write(&path, &blob.bytes)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("Saved {} ({} bytes)", path.display(), blob.bytes.len());
            }
        }
        Command::Upload {
            path,
            category,
            author,
            summary,
        } => {
            let bytes =
                fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
            let filename = path
                .file_name()
                .and_then(|name| name.to_str())
                .context("upload path has no filename")?
                .to_string();
            let mut upload = PendingUpload::new(filename, bytes);
            if let Some(category) = category {
                upload = upload.with_category(category);
            }
            if let Some(author) = author {
                upload = upload.with_author(author);
            }
            if let Some(summary) = summary {
                upload = upload.with_summary(summary);
            }

            workspace.open_upload();
            workspace.select_file(upload);
            workspace.submit_upload().await;
            failed |= report(workspace);
        }
        Command::Logs => {
            if !workspace.can_view_logs() {
                eprintln!(
                    "{}",
                    style("Access logs are restricted to HR and Admin roles.").red()
                );
                std::process::exit(1);
            }
            workspace.open_logs().await;
            failed |= report(workspace);
            if matches!(workspace.screen(), Screen::Workspace { modal: Modal::Logs }) {
                for entry in workspace.logs().entries() {
                    let doc = entry
                        .doc_uuid
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{}  {:<12} user={} doc={}",
                        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        entry.action,
                        entry.user_uuid,
                        doc
                    );
                }
                if workspace.logs().entries().is_empty() {
                    println!("No logs found.");
                }
                workspace.close_modal();
            }
        }
    }
    Ok(failed)
}

/// Print and consume the workspace notice. Returns true for an error notice.
fn report(workspace: &mut Workspace) -> bool {
    match workspace.take_notice() {
        Some(Notice::Error(msg)) => {
            eprintln!("{}", style(msg).red());
            true
        }
        Some(Notice::Info(msg)) => {
            println!("{}", style(msg).green());
            false
        }
        None => false,
    }
}

fn identity_line(workspace: &Workspace) -> String {
    workspace
        .identity()
        .map(|identity| format!("{} ({})", identity.username, identity.role))
        .unwrap_or_else(|| "anonymous".to_string())
}

fn print_documents(documents: &[DocumentSummary]) {
    if documents.is_empty() {
        println!("No documents found. Try uploading one!");
        return;
    }
    for doc in documents {
        let author = doc.author.as_deref().unwrap_or("-");
        let mut line = format!(
            "{:>6}  {:<32} {:<12} {:<16} {}",
            doc.docid,
            doc.filename,
            doc.category,
            author,
            doc.upload_date.format("%Y-%m-%d")
        );
        if let Some(score) = doc.relevance_score {
            line.push_str(&format!("  relevance {:.2}%", score * 100.0));
        }
        println!("{line}");
    }
}

fn prompt_password(prompt: &str) -> anyhow::Result<String> {
    let term = console::Term::stderr();
    term.write_str(prompt)?;
    let password = term.read_secure_line()?;
    Ok(password)
}
