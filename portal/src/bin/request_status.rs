//! Report the workflow stage of one emergency blood request.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io;
use std::sync::Arc;

use clap::Parser;
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use portal::config::PortalSettings;
use portal::domain::ports::DictionarySource;
use portal::domain::workflow::{BloodRequestWorkflow, FulfilmentMethod, Outcome, WorkflowStage};
use portal::domain::{
    BloodRequestId, Dictionary, GuardDecision, LanguageCode, PortalView, RefreshOutcome,
    RequestRegistry, RequestStatus, SessionStore,
};
use portal::outbound::http::HttpPortalApi;

/// `request-status` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "request-status",
    about = "Open an emergency blood request and print its derived workflow stage",
    version
)]
struct CliArgs {
    /// Identifier of the blood request to open.
    #[arg(long = "request-id", value_name = "id")]
    request_id: String,
    /// Language for status and stage labels. Falls back to `PORTAL_DEFAULT_LANGUAGE`.
    #[arg(long = "language", value_name = "code")]
    language: Option<String>,
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = PortalSettings::load_from_iter([OsString::from("request-status")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;

    let request_id = BloodRequestId::new(args.request_id).map_err(io::Error::other)?;
    let language = match args.language {
        Some(raw) => LanguageCode::new(raw).map_err(io::Error::other)?,
        None => settings.default_language().map_err(io::Error::other)?,
    };
    let base_url = settings.api_base_url().map_err(io::Error::other)?;

    let api = Arc::new(
        HttpPortalApi::new(base_url, settings.request_timeout())
            .map_err(|error| io::Error::other(format!("create HTTP client: {error}")))?,
    );
    let dictionary = api.get_dictionary(&language).await;

    let session = SessionStore::new(api.clone(), Arc::new(DefaultClock));
    if let RefreshOutcome::LoggedOut(hint) = session.refresh().await {
        return Err(io::Error::other(format!(
            "{} ({hint:?})",
            dictionary.translate_or("session.logged_out", "no portal session")
        )));
    }

    match PortalView::RequestDetail.guard().evaluate(&session.current()) {
        GuardDecision::Render => {}
        denied => {
            return Err(io::Error::other(format!(
                "{}: {denied:?}",
                dictionary.translate_or("guard.denied", "access denied")
            )));
        }
    }

    let registry = Arc::new(RequestRegistry::new(api.clone()));
    let workflow = BloodRequestWorkflow::new(registry, api);
    workflow
        .open(&request_id)
        .await
        .map_err(|error| io::Error::other(format!("open request {request_id}: {error}")))?;

    let state = workflow.current();
    if let Some(request) = state.request() {
        println!("request_id={}", request.id());
        println!("requester={}", request.requester_name());
        println!("blood_type={}", request.blood_type());
        println!("urgency={:?}", request.urgency());
        println!("status={}", status_label(&dictionary, request.status()));
    }
    if let Some(stage) = state.stage() {
        println!("stage={}", stage_label(&dictionary, stage));
        if let Some(method) = stage.method() {
            println!("method={}", method_label(&dictionary, method));
        }
        println!("resolved={}", stage.is_terminal());
    }

    Ok(())
}

fn status_label(dictionary: &Dictionary, status: RequestStatus) -> &str {
    let (key, fallback) = match status {
        RequestStatus::Pending => ("request.status.pending", "pending"),
        RequestStatus::Processing => ("request.status.processing", "processing"),
        RequestStatus::Fulfilled => ("request.status.fulfilled", "fulfilled"),
        RequestStatus::Failed => ("request.status.failed", "failed"),
    };
    dictionary.translate_or(key, fallback)
}

fn stage_label(dictionary: &Dictionary, stage: WorkflowStage) -> &str {
    let (key, fallback) = match stage {
        WorkflowStage::Created => ("workflow.stage.created", "created"),
        WorkflowStage::MethodChosen { .. } => ("workflow.stage.method_chosen", "method chosen"),
        WorkflowStage::Executing { .. } => ("workflow.stage.executing", "executing"),
        WorkflowStage::Resolved {
            outcome: Outcome::Fulfilled,
            ..
        } => ("workflow.stage.fulfilled", "fulfilled"),
        WorkflowStage::Resolved {
            outcome: Outcome::Failed,
            ..
        } => ("workflow.stage.failed", "failed"),
    };
    dictionary.translate_or(key, fallback)
}

fn method_label(dictionary: &Dictionary, method: FulfilmentMethod) -> &str {
    let (key, fallback) = match method {
        FulfilmentMethod::Stock => ("workflow.method.stock", "stock withdrawal"),
        FulfilmentMethod::Donor => ("workflow.method.donor", "donor fulfilment"),
    };
    dictionary.translate_or(key, fallback)
}
