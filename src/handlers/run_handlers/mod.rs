pub mod forms;

use actix_multipart::form::MultipartForm;
use actix_web::{web, Either, HttpRequest, HttpResponse};

use crate::config::Config;
use crate::errors::{AppError, render};
use crate::fetch::HttpFetcher;
use crate::populate::populate;
use crate::service::{ProcessRequest, ProcessResponse, UdpipeClient};

use self::forms::{RunSubmission, RunUpload};

/// Model names from the service, or the page error to show instead.
async fn model_names(client: &UdpipeClient) -> (Vec<String>, Option<String>) {
    match client.models().await {
        Ok(models) if !models.models.is_empty() => (models.names(), None),
        Ok(_) => (Vec::new(), Some(forms::MODELS_UNAVAILABLE.to_string())),
        Err(e) => {
            log::warn!("Model list unavailable: {e}");
            (Vec::new(), Some(forms::MODELS_UNAVAILABLE.to_string()))
        }
    }
}

/// Service failures are shown on the page rather than failing the request.
async fn run_process(
    client: &UdpipeClient,
    request: Option<ProcessRequest>,
    error: &mut Option<String>,
) -> Option<ProcessResponse> {
    let request = request?;
    match client.process(&request).await {
        Ok(response) => Some(response),
        Err(e) => {
            log::warn!("Processing with {} failed: {e}", request.model);
            *error = Some(format!("An error occurred: {e}"));
            None
        }
    }
}

/// GET /run
/// Renders the run form pre-filled from the query string. A link carrying
/// `data` is processed right away.
pub async fn page(
    req: HttpRequest,
    config: web::Data<Config>,
    client: web::Data<UdpipeClient>,
    fetcher: web::Data<HttpFetcher>,
) -> Result<HttpResponse, AppError> {
    let (models, mut error) = model_names(&client).await;

    let mut form = forms::run_form(models);
    let bindings = forms::run_bindings(&config.catalog_url);
    let request = populate(
        &req.uri().to_string(),
        &mut form,
        bindings,
        fetcher.get_ref(),
        config.fetch_timeout,
        forms::auto_submit,
    )
    .await?;

    let response = run_process(&client, request, &mut error).await;
    render(forms::template(&form, error, response))
}

/// POST /run
/// Accepts the form url-encoded, or as multipart with an optional input file.
pub async fn submit(
    client: web::Data<UdpipeClient>,
    submission: Either<web::Form<RunSubmission>, MultipartForm<RunUpload>>,
) -> Result<HttpResponse, AppError> {
    let submission = match submission {
        Either::Left(form) => form.into_inner(),
        Either::Right(MultipartForm(upload)) => upload.into_submission()?,
    };
    let (models, mut error) = model_names(&client).await;
    let form = forms::submitted_form(models, &submission);

    let request = forms::process_request(&form);
    if request.is_none() && error.is_none() {
        error = Some("Please select a model and enter some input.".to_string());
    }

    let response = run_process(&client, request, &mut error).await;
    render(forms::template(&form, error, response))
}

/// Largest `POST /run` body, uploaded input file included.
const MAX_SUBMISSION_BYTES: usize = 4 * 1024 * 1024;

/// Register the run page routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_SUBMISSION_BYTES))
        .route("/run", web::get().to(page))
        .route("/run", web::post().to(submit))
        .route("/", web::get().to(|| async {
            HttpResponse::SeeOther()
                .insert_header(("Location", "/run"))
                .finish()
        }));
}
