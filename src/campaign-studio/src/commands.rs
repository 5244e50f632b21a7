//! Subcommand implementations. Results go to stdout; step progress and
//! notifications go to stderr.

use crate::{CreateArgs, EditArgs};
use anyhow::{anyhow, bail, Context};
use campaign_api::store::DEV_EMAIL;
use campaign_api::{ApiServer, CampaignStore};
use campaign_api_client::HttpCampaignApi;
use campaign_core::config::AppConfig;
use campaign_core::types::parse_schedule;
use campaign_core::{CampaignApi, CampaignError, Session, SessionStore};
use campaign_preview::{render_preview, PreviewPipeline};
use campaign_wizard::{NotificationLevel, SubmitOutcome, WizardController, WizardStep};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// How often `preview --watch` re-reads the source file.
const WATCH_POLL: Duration = Duration::from_millis(200);

// ─── Server ────────────────────────────────────────────────────────────────

pub async fn serve(config: AppConfig, with_metrics: bool) -> anyhow::Result<()> {
    let server = ApiServer::new(config, Arc::new(CampaignStore::new()));

    if with_metrics {
        if let Err(e) = server.start_metrics() {
            error!(error = %e, "Failed to start metrics exporter");
        }
    }

    info!(email = DEV_EMAIL, "Development login available");
    server.start_http().await
}

// ─── Preview ───────────────────────────────────────────────────────────────

pub fn preview(file: Option<&Path>) -> anyhow::Result<()> {
    let content = match file {
        Some(path) => read_file(path)?,
        None => std::io::read_to_string(std::io::stdin()).context("failed to read stdin")?,
    };
    println!("{}", render_preview(&content));
    Ok(())
}

/// Re-render `path` after every change, once the file has been quiet for
/// `quiet`. Runs until Ctrl-C.
pub async fn watch_preview(path: &Path, quiet: Duration) -> anyhow::Result<()> {
    let pipeline = PreviewPipeline::spawn(quiet);
    let mut html = pipeline.subscribe();
    let mut ticker = tokio::time::interval(WATCH_POLL);
    let mut last: Option<String> = None;

    eprintln!("Watching {} (Ctrl-C to stop)", path.display());
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(content) = read_if_changed(path, &mut last).await {
                    if !pipeline.submit(content) {
                        bail!("preview renderer stopped");
                    }
                }
            }
            changed = html.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", html.borrow_and_update().as_str());
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

/// New file content since the last successful read. A failed read (the file
/// is briefly missing while an editor swaps it in) is skipped.
async fn read_if_changed(path: &Path, last: &mut Option<String>) -> Option<String> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read preview source, skipping");
            return None;
        }
    };
    if last.as_deref() == Some(content.as_str()) {
        return None;
    }
    *last = Some(content.clone());
    Some(content)
}

// ─── Session ───────────────────────────────────────────────────────────────

fn session_store(config: &AppConfig) -> SessionStore {
    SessionStore::new(config.session.path.clone())
}

fn client(config: &AppConfig) -> anyhow::Result<HttpCampaignApi> {
    let session = session_store(config).hydrate();
    Ok(HttpCampaignApi::new(&config.api, session)?)
}

/// Map a backend error to something a user can act on.
fn cli_error(e: CampaignError) -> anyhow::Error {
    match e {
        CampaignError::Unauthorized(_) => {
            anyhow!("Not authenticated; run `campaign-studio login` first")
        }
        other => anyhow!(other.user_message()),
    }
}

pub async fn login(config: &AppConfig, email: &str, password: &str) -> anyhow::Result<()> {
    let api = HttpCampaignApi::new(&config.api, Session::default())?;
    let session = api
        .login(email, password)
        .await
        .map_err(|e| anyhow!("Login failed: {}", e.user_message()))?;
    session_store(config).save(&session)?;
    println!("Logged in as {}", email);
    Ok(())
}

pub fn logout(config: &AppConfig) -> anyhow::Result<()> {
    session_store(config).clear()?;
    println!("Logged out");
    Ok(())
}

pub async fn whoami(config: &AppConfig) -> anyhow::Result<()> {
    let api = client(config)?;
    if !api.session().is_authenticated() {
        println!("Not logged in");
        return Ok(());
    }
    let user = api.current_user().await.map_err(cli_error)?;
    println!("{} (id {})", user.email, user.id);
    Ok(())
}

// ─── Reference data ────────────────────────────────────────────────────────

pub async fn templates(config: &AppConfig) -> anyhow::Result<()> {
    let api = client(config)?;
    for template in api.list_templates().await.map_err(cli_error)? {
        println!("{}\t{}", template.id, template.name);
    }
    Ok(())
}

pub async fn segments(config: &AppConfig) -> anyhow::Result<()> {
    let api = client(config)?;
    for segment in api.list_segments().await.map_err(cli_error)? {
        println!("{}\t{}", segment.id, segment.name);
    }
    Ok(())
}

// ─── Wizard ────────────────────────────────────────────────────────────────

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn schedule(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    parse_schedule(raw).ok_or_else(|| anyhow!("Invalid send time {:?}", raw))
}

pub async fn create(config: &AppConfig, args: CreateArgs) -> anyhow::Result<SubmitOutcome> {
    let api = client(config)?;
    if !api.session().is_authenticated() {
        warn!("No session, requests are sent anonymously");
    }

    let mut wizard = WizardController::new().with_preview_quiet(config.preview.debounce());
    wizard.load_reference_data(&api).await;

    wizard.set_name(args.name);
    wizard.set_template(args.template);
    wizard.set_segment(args.segment);
    if let Some(raw) = args.send_at {
        wizard.set_schedule(schedule(&raw)?);
    }
    let content = args.content.as_deref().map(read_file).transpose()?;

    run_wizard(wizard, &api, content, false).await
}

pub async fn edit(config: &AppConfig, args: EditArgs) -> anyhow::Result<SubmitOutcome> {
    let api = client(config)?;
    let wizard = WizardController::open_for_edit(&api, args.id)
        .await
        .map_err(cli_error)?;
    let mut wizard = wizard.with_preview_quiet(config.preview.debounce());

    if let Some(name) = args.name {
        wizard.set_name(name);
    }
    if let Some(id) = args.template {
        wizard.set_template(id);
    }
    if let Some(id) = args.segment {
        wizard.set_segment(id);
    }
    if args.draft {
        wizard.clear_schedule();
    } else if let Some(raw) = args.send_at {
        wizard.set_schedule(schedule(&raw)?);
    }
    let content = args.content.as_deref().map(read_file).transpose()?;

    run_wizard(wizard, &api, content, args.reset_content).await
}

/// Walk the wizard through details, content and review, then submit.
async fn run_wizard(
    mut wizard: WizardController,
    api: &dyn CampaignApi,
    content: Option<String>,
    reset_content: bool,
) -> anyhow::Result<SubmitOutcome> {
    print_step(&wizard);
    if !wizard.advance() {
        print_notifications(&mut wizard);
        bail!("Campaign details are incomplete: name, template and segment are required");
    }

    print_step(&wizard);
    let has_content = content.is_some()
        || wizard
            .draft()
            .content_override
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty());
    if !has_content && wizard.selected_template().is_none() {
        print_notifications(&mut wizard);
        bail!(
            "Template {} is not available; run `campaign-studio templates` to list them",
            wizard.draft().template_ref
        );
    }
    if reset_content && !wizard.reset_to_template() {
        warn!(
            template_id = wizard.draft().template_ref,
            "Selected template is not available, keeping current content"
        );
    }
    let saved = match content {
        Some(text) => wizard.save_content(text),
        None => wizard.advance(),
    };
    print_notifications(&mut wizard);
    if !saved {
        bail!("Email content was not accepted");
    }

    print_step(&wizard);
    println!("{}", serde_json::to_string_pretty(&wizard.review_summary())?);

    let result = wizard.submit(api).await;
    print_notifications(&mut wizard);
    let outcome = result.map_err(cli_error)?;
    match outcome {
        SubmitOutcome::Created(id) => println!("Created campaign {}", id),
        SubmitOutcome::Updated(id) => println!("Updated campaign {}", id),
    }
    Ok(outcome)
}

fn print_step(wizard: &WizardController) {
    let step = wizard.step();
    eprintln!(
        "[{}/{}] {}: {}",
        step.number(),
        WizardStep::ALL.len(),
        wizard.step_title(),
        wizard.step_description()
    );
}

fn print_notifications(wizard: &mut WizardController) {
    for n in wizard.drain_notifications() {
        match n.level {
            NotificationLevel::Success => eprintln!("  ok: {}", n.message),
            NotificationLevel::Error => eprintln!("  error: {}", n.message),
        }
    }
}
