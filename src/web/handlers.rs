use axum::extract::{Form, Multipart, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{Html, IntoResponse, Redirect};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{Instrument, error, info, info_span, warn};

use super::page;
use super::{AppError, AppResult, AppState, OperatorSession};
use crate::heuristics::refine_optional;
use crate::imaging::{self, prepare_for_scan};
use crate::material::{KEY_BATCH, KEY_FILM, Material};
use crate::session::{Flash, Photo, ScanResult};

fn back() -> Redirect {
    Redirect::to("/")
}

pub async fn index(Extension(op): Extension<OperatorSession>) -> Html<String> {
    let mut session = op.session.lock().await;
    let notices = session.take_flashes();
    Html(page::render(&session, &notices))
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.sessions.len(),
    }))
}

/// Multipart upload of `photo` (JPEG/PNG) and `material`.
pub async fn upload(
    Extension(op): Extension<OperatorSession>,
    mut multipart: Multipart,
) -> AppResult<Redirect> {
    let mut photo = None;
    let mut material = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("photo") => {
                let filename = field.file_name().unwrap_or("photo").to_string();
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    photo = Some((filename, bytes.to_vec()));
                }
            }
            Some("material") => material = Some(field.text().await?.parse::<Material>()?),
            _ => {}
        }
    }

    let mut session = op.session.lock().await;
    if let Some(material) = material {
        session.material = material;
    }

    let Some((filename, bytes)) = photo else {
        session.flash(Flash::Warning("Choose a checksheet photo first.".into()));
        return Ok(back());
    };

    if let Err(e) = imaging::sniff_format(&bytes) {
        warn!(session = %op.id, filename = %filename, error = %e, "Upload rejected");
        session.flash(Flash::Error(format!("{filename}: {e}")));
        return Ok(back());
    }

    let digest = imaging::digest(&bytes);
    info!(session = %op.id, filename = %filename, bytes = bytes.len(), digest = %digest, "Photo uploaded");
    session.set_photo(Photo {
        bytes,
        digest,
        filename,
    });
    Ok(back())
}

#[derive(Debug, Deserialize)]
pub struct MaterialForm {
    #[serde(default)]
    material: Option<String>,
}

pub async fn select_material(
    Extension(op): Extension<OperatorSession>,
    Form(form): Form<MaterialForm>,
) -> AppResult<Redirect> {
    let Some(raw) = form.material else {
        return Err(AppError::BadRequest("material is required".into()));
    };
    op.session.lock().await.material = raw.parse()?;
    Ok(back())
}

pub async fn rotate(Extension(op): Extension<OperatorSession>) -> Redirect {
    let mut session = op.session.lock().await;
    session.rotate();
    info!(session = %op.id, rotation = session.rotation.degrees(), "Photo rotated");
    back()
}

/// Rotated, shrunk JPEG of the current upload.
pub async fn photo(
    State(state): State<AppState>,
    Extension(op): Extension<OperatorSession>,
) -> AppResult<impl IntoResponse> {
    let (bytes, rotation) = {
        let session = op.session.lock().await;
        let photo = session.photo.as_ref().ok_or(AppError::NoPhoto)?;
        (photo.bytes.clone(), session.rotation)
    };

    let image = state.image.clone();
    let jpeg = tokio::task::spawn_blocking(move || {
        prepare_for_scan(&bytes, rotation, image.max_dimension, image.jpeg_quality)
    })
    .await??;

    Ok((
        [(CONTENT_TYPE, "image/jpeg"), (CACHE_CONTROL, "no-store")],
        jpeg,
    ))
}

/// Run the vision model on the current photo and cache the result.
///
/// The session is unlocked while the model runs; the result is only kept if
/// the photo it was made from is still the current one.
pub async fn analyze(
    State(state): State<AppState>,
    Extension(op): Extension<OperatorSession>,
    Form(form): Form<MaterialForm>,
) -> AppResult<Redirect> {
    let (bytes, digest, material, rotation) = {
        let mut session = op.session.lock().await;
        if let Some(raw) = form.material {
            session.material = raw.parse()?;
        }
        session.begin_analysis();

        let Some(photo) = session.photo.as_ref() else {
            session.flash(Flash::Error("Upload a checksheet photo before analysing.".into()));
            return Ok(back());
        };
        (
            photo.bytes.clone(),
            photo.digest.clone(),
            session.material,
            session.rotation,
        )
    };

    let span = info_span!("analyze", session = %op.id, material = %material, rotation = rotation.degrees());
    let started = Instant::now();

    let image = state.image.clone();
    let prepared = tokio::task::spawn_blocking(move || {
        prepare_for_scan(&bytes, rotation, image.max_dimension, image.jpeg_quality)
    })
    .await?;

    let extracted = match prepared {
        Ok(jpeg) => state
            .extractor
            .extract(&jpeg, material.profile().prompt)
            .instrument(span.clone())
            .await
            .map_err(|e| format!("Extraction failed: {e}")),
        Err(e) => Err(format!("Photo could not be read: {e}")),
    };

    let mut session = op.session.lock().await;
    let current = session.photo.as_ref().map(|p| p.digest.as_str());
    if current != Some(digest.as_str()) {
        span.in_scope(|| warn!("Photo replaced during analysis, result discarded"));
        session.flash(Flash::Warning(
            "The photo changed during analysis. Run the analysis again.".into(),
        ));
        return Ok(back());
    }

    match extracted {
        Ok(fields) => {
            let batch = refine_optional(fields.get(KEY_BATCH).map(String::as_str));
            let duration = started.elapsed();
            span.in_scope(|| {
                info!(
                    fields = fields.len(),
                    batch = %batch.canonical,
                    arrival = %batch.arrival,
                    elapsed_ms = duration.as_millis() as u64,
                    "Analysis complete"
                )
            });
            session.store_scan(ScanResult {
                fields,
                batch,
                material,
                rotation,
                digest,
                duration,
            });
            session.flash(Flash::Success(format!(
                "Analysis done in {:.2} s.",
                duration.as_secs_f64()
            )));
        }
        Err(message) => {
            span.in_scope(|| error!(error = %message, "Analysis failed"));
            session.flash(Flash::Error(message));
        }
    }
    Ok(back())
}

/// Append the corrected row, at most once per analysis.
pub async fn submit(
    State(state): State<AppState>,
    Extension(op): Extension<OperatorSession>,
    Form(form): Form<HashMap<String, String>>,
) -> Redirect {
    let mut session = op.session.lock().await;

    if session.submitted {
        session.flash(Flash::Warning("This data has already been sent.".into()));
        return back();
    }
    let Some(scan) = session.scan.as_ref() else {
        session.flash(Flash::Warning("Nothing to send yet. Run an analysis first.".into()));
        return back();
    };

    let profile = scan.material.profile();
    let mut values = scan.form_values();
    let editable = std::iter::once(KEY_FILM).chain(profile.fields.iter().map(|f| f.key));
    for key in editable {
        if let Some(v) = form.get(key) {
            values.insert(key.to_string(), v.trim().to_string());
        }
    }
    let row = profile.assemble_row(&values);
    let digest = scan.digest.clone();

    let started = Instant::now();
    match state.sink.append_row(&row).await {
        Ok(row_number) => {
            info!(session = %op.id, material = %profile.material, photo = %digest, row = row_number, "Checksheet sent");
            session.mark_submitted();
            session.flash(Flash::Success(format!(
                "Sent to row {row_number} (took {:.2} s).",
                started.elapsed().as_secs_f64()
            )));
        }
        Err(e) => {
            error!(session = %op.id, error = %e, "Append failed");
            session.flash(Flash::Error(format!("Could not write to Google Sheets: {e}")));
        }
    }
    back()
}
