//! HTTP handlers for the upload page.

use axum::{body::Body, extract::State, http::HeaderMap, response::Html};
use tracing::instrument;

use crate::AppState;
use crate::api::models::upload::UploadPage;
use crate::errors::{Error, Result};
use crate::upload::{IntakeError, UploadError, UploadResult, intake, store};

const FAILURE_LOG: &str = "文件上传失败";

/// Show the upload form
#[instrument(skip_all)]
pub async fn upload_form(State(state): State<AppState>) -> Result<Html<String>> {
    let page = UploadPage::new(&state.config.limits, None);
    Ok(Html(state.views.render_upload(&page)?))
}

/// Store every part of a multipart upload and redisplay the form with the outcome.
///
/// The upload directory is created before the body is read, so it exists after any request that
/// passed the declared-length check. Upload failures never change the status code: they are
/// logged and shown in the page. The only non-200 answers are a 413 for bodies over the configured
/// limits and a 500 if the page itself cannot be rendered.
#[instrument(skip_all)]
pub async fn upload(State(state): State<AppState>, headers: HeaderMap, body: Body) -> Result<Html<String>> {
    let limits = &state.config.limits;
    intake::check_declared_length(&headers, limits).map_err(payload_too_large)?;

    let result = match store_upload(&state, &headers, body).await {
        Ok(result) => result,
        Err(UploadError::Intake(err)) if err.is_size_limit() => return Err(payload_too_large(err)),
        Err(err) => {
            state.upload_log.error(FAILURE_LOG, &err);
            UploadResult::failure(&err)
        }
    };

    let page = UploadPage::new(limits, Some(result.message()));
    Ok(Html(state.views.render_upload(&page)?))
}

async fn store_upload(state: &AppState, headers: &HeaderMap, body: Body) -> std::result::Result<UploadResult, UploadError> {
    let upload_dir = state.config.upload_dir_path();
    store::ensure_upload_dir(&upload_dir).await?;

    let parts = intake::receive_parts(headers, body, &state.config.limits).await?;
    let report = store::store_parts(&upload_dir, parts, state.upload_log.as_ref()).await;
    if let Some(err) = report.failure() {
        state.upload_log.error(FAILURE_LOG, err);
    }
    Ok(report.result())
}

fn payload_too_large(err: IntakeError) -> Error {
    Error::PayloadTooLarge { message: err.to_string() }
}
