//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{
    AutoGenerateRequest, CageScheduleResponse, DashboardQuery, ErrorResponse, FieldErrorBody,
    ScheduleView,
};
use crate::analytics::{
    Dashboard, DashboardPeriod, anticipate_harvests, cage_history, dashboard, estimate_for_cage,
    overall_summary, sampling_report,
};
use crate::config::HarvestSettings;
use crate::error::GrowoutError;
use crate::model::{CageId, SamplingId};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: GrowoutError) -> ApiError {
    let status = match &err {
        GrowoutError::CageNotFound(_)
        | GrowoutError::SamplingNotFound(_)
        | GrowoutError::ScheduleNotFound(_) => StatusCode::NOT_FOUND,
        GrowoutError::Validation { .. } | GrowoutError::Config(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        GrowoutError::ActiveScheduleExists(_) | GrowoutError::SlotsFull(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let fields = match &err {
        GrowoutError::Validation { field, message } => vec![FieldErrorBody {
            field: field.clone(),
            message: message.clone(),
        }],
        _ => Vec::new(),
    };
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            fields,
        }),
    )
}

/// `GET /harvest` → 200 + outlook for every cage with sampled history.
pub async fn get_harvest_outlook(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let settings = state.settings.snapshot();
    Json(anticipate_harvests(&state.data, &settings))
}

/// `GET /cages/{id}/harvest` → 200 + estimate, 404 for an unknown cage.
pub async fn get_cage_harvest(
    State(state): State<Arc<AppState>>,
    Path(cage_id): Path<CageId>,
) -> impl IntoResponse {
    let settings = state.settings.snapshot();
    estimate_for_cage(&state.data, cage_id, &settings)
        .map(Json)
        .map_err(error_response)
}

/// `GET /cages/{id}/history` → 200 + history rows, 404 for an unknown cage.
pub async fn get_cage_history(
    State(state): State<Arc<AppState>>,
    Path(cage_id): Path<CageId>,
) -> impl IntoResponse {
    cage_history(
        &state.data,
        cage_id,
        state.config.feeding.feeding_rate_percent,
    )
    .map(Json)
    .map_err(error_response)
}

/// `GET /cages/{id}/schedule` → 200 with `has_schedule` false when the cage
/// has no active schedule.
pub async fn get_cage_schedule(
    State(state): State<Arc<AppState>>,
    Path(cage_id): Path<CageId>,
) -> impl IntoResponse {
    let Some(cage) = state.data.cage(cage_id) else {
        return Err(error_response(GrowoutError::CageNotFound(cage_id)));
    };
    let now = state.now();
    let active = state.schedules.active_for(cage_id);

    Ok(Json(CageScheduleResponse {
        has_schedule: active.is_some(),
        message: active
            .is_none()
            .then(|| "No active schedule found for this cage".to_string()),
        cage_id,
        fingerlings: cage.fingerlings,
        feed_type: cage.feed_type.clone(),
        schedule: active.as_ref().map(|s| ScheduleView::new(s, now)),
        upcoming_feedings: active
            .map(|s| s.upcoming_feedings(now))
            .unwrap_or_default(),
    }))
}

/// `POST /schedules/auto-generate` → 200 + per-cage report. Skips and
/// failures are listed in `errors`; the request itself still succeeds.
pub async fn auto_generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AutoGenerateRequest>,
) -> impl IntoResponse {
    if req.cage_ids.is_empty() {
        return Err(error_response(GrowoutError::validation(
            "cage_ids",
            "at least one cage id is required",
        )));
    }
    let report = state.schedules.auto_generate(
        &state.data,
        &req.cage_ids,
        req.overwrite_existing,
        &state.config.feeding,
        state.now(),
    );
    Ok(Json(report))
}

/// `GET /samplings/{id}/report` → 200 + report, 404 for an unknown sampling.
pub async fn get_sampling_report(
    State(state): State<Arc<AppState>>,
    Path(sampling_id): Path<SamplingId>,
) -> impl IntoResponse {
    sampling_report(
        &state.data,
        sampling_id,
        state.config.feeding.feeding_rate_percent,
    )
    .map(Json)
    .map_err(error_response)
}

/// `GET /reports/summary` → 200 + totals across all samplings.
pub async fn get_summary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(overall_summary(&state.data))
}

/// `GET /dashboard` → 200 + period analytics, 422 for an unknown period or
/// an inverted custom range.
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Dashboard>, ApiError> {
    let has_bounds = query.start_date.is_some() || query.end_date.is_some();
    let period = match query.period.as_deref() {
        Some(raw) => raw.parse::<DashboardPeriod>().map_err(error_response)?,
        None if has_bounds => DashboardPeriod::Custom {
            start: None,
            end: None,
        },
        None => DashboardPeriod::default(),
    };
    let period = match period {
        DashboardPeriod::Custom { .. } => DashboardPeriod::Custom {
            start: query.start_date,
            end: query.end_date,
        },
        other => other,
    };
    let range = period
        .resolve(state.now().date())
        .map_err(error_response)?;
    Ok(Json(dashboard(&state.data, range)))
}

/// `GET /settings` → 200 + current harvest settings.
pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<HarvestSettings> {
    Json(state.settings.snapshot())
}

/// `PUT /settings` → 200 + stored settings, 422 + field errors when out of range.
pub async fn put_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<HarvestSettings>,
) -> impl IntoResponse {
    match state.settings.replace(settings) {
        Ok(()) => Ok(Json(state.settings.snapshot())),
        Err(errors) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: "invalid settings".into(),
                fields: errors.iter().map(FieldErrorBody::from).collect(),
            }),
        )),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDate;
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;
    use crate::config::AnalyticsConfig;
    use crate::dataset::FarmData;

    const DATA: &str = r#"
[[investors]]
id = 1
name = "Garcia"

[[cages]]
id = 1
fingerlings = 5000
investor_id = 1

[[cages]]
id = 2
fingerlings = 10000
investor_id = 1

[[samplings]]
id = 1
cage_id = 1
investor_id = 1
date = "2025-01-01"

[[samplings]]
id = 2
cage_id = 1
investor_id = 1
date = "2025-02-22"

[[samples]]
sampling_id = 1
sample_no = 1
weight_g = 48.0

[[samples]]
sampling_id = 2
sample_no = 1
weight_g = 161.0
"#;

    fn make_test_state() -> Arc<AppState> {
        let data = FarmData::from_toml_str(DATA).expect("dataset");
        let mut state = AppState::new(data, AnalyticsConfig::defaults());
        state.fixed_now = NaiveDate::from_ymd_opt(2025, 3, 1).and_then(|d| d.and_hms_opt(9, 30, 0));
        Arc::new(state)
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn cage_harvest_returns_projection() {
        let app = router(make_test_state());
        let req = Request::builder()
            .uri("/cages/1/harvest")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json["days_until_harvest"], 157);
        assert_eq!(json["growth_rate_used"], 2.17);
        assert_eq!(json["is_ready"], false);
    }

    #[tokio::test]
    async fn unknown_cage_returns_404() {
        let app = router(make_test_state());
        let req = Request::builder()
            .uri("/cages/99/harvest")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert!(json.get("error").is_some());
    }

    #[tokio::test]
    async fn outlook_drops_unsampled_cages() {
        let app = router(make_test_state());
        let req = Request::builder()
            .uri("/harvest")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json.as_array().map(Vec::len), Some(1));
        assert_eq!(json[0]["cage_id"], 1);
    }

    #[tokio::test]
    async fn auto_generate_then_read_schedule() {
        let state = make_test_state();
        let req = Request::builder()
            .method("POST")
            .uri("/schedules/auto-generate")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"cage_ids":[2]}"#))
            .unwrap();
        let resp = router(Arc::clone(&state)).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["generated_schedules"][0]["calculation_method"], "age-based");

        let req = Request::builder()
            .uri("/cages/2/schedule")
            .body(Body::empty())
            .unwrap();
        let resp = router(state).oneshot(req).await.unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["has_schedule"], true);
        assert_eq!(json["schedule"]["frequency"], "thrice_daily");
        assert_eq!(json["schedule"]["next_feeding_time"], "12:00");
        assert_eq!(json["upcoming_feedings"].as_array().map(Vec::len), Some(5));
    }

    #[tokio::test]
    async fn invalid_settings_are_rejected() {
        let state = make_test_state();
        let req = Request::builder()
            .method("PUT")
            .uri("/settings")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"target_weight_grams":0,"default_growth_rate_g_per_day":3}"#,
            ))
            .unwrap();
        let resp = router(Arc::clone(&state)).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(resp).await;
        assert_eq!(json["fields"][0]["field"], "harvest.target_weight_grams");
        assert_eq!(state.settings.snapshot().target_weight_grams, 500.0);
    }

    #[tokio::test]
    async fn dashboard_compares_with_preceding_period() {
        let state = make_test_state();
        let req = Request::builder()
            .uri("/dashboard?start_date=2025-01-27&end_date=2025-02-28")
            .body(Body::empty())
            .unwrap();
        let resp = router(Arc::clone(&state)).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["period_label"], "Custom Period");
        assert_eq!(json["previous_range"]["start"], "2024-12-25");
        assert_eq!(json["growth"]["current_samplings"], 1);
        assert_eq!(json["growth"]["previous_samplings"], 1);
        assert_eq!(json["growth"]["sampling_growth_pct"], 0.0);
        assert_eq!(json["growth"]["current_avg_weight_g"], 161.0);
        assert_eq!(json["growth"]["previous_avg_weight_g"], 48.0);
        assert_eq!(json["growth"]["weight_growth_pct"], 235.42);
    }

    #[tokio::test]
    async fn dashboard_rejects_unknown_period() {
        let state = make_test_state();
        let req = Request::builder()
            .uri("/dashboard?period=fortnight")
            .body(Body::empty())
            .unwrap();
        let resp = router(state).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(resp).await;
        assert_eq!(json["fields"][0]["field"], "period");
    }

    #[tokio::test]
    async fn settings_change_applies_to_next_request() {
        let state = make_test_state();
        let req = Request::builder()
            .method("PUT")
            .uri("/settings")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"target_weight_grams":161,"default_growth_rate_g_per_day":3}"#,
            ))
            .unwrap();
        let resp = router(Arc::clone(&state)).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let req = Request::builder()
            .uri("/cages/1/harvest")
            .body(Body::empty())
            .unwrap();
        let json = body_json(router(state).oneshot(req).await.unwrap()).await;
        assert_eq!(json["is_ready"], true);
        assert_eq!(json["days_until_harvest"], 0);
    }
}
