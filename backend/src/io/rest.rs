//! Axum REST handlers over the domain services.
//!
//! Handlers are thin: extract the actor and path/body inputs, call the
//! service, map the result (or the engine error) onto a status code and a
//! JSON body. The actor comes from the `x-actor` header and is only ever
//! recorded, never evaluated.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::{error, info};

use crate::domain::commands::closing::{ReopenClosingCommand, RunClosingCommand};
use crate::domain::commands::rules::{CreateBonusPolicyCommand, CreateCommissionRuleCommand};
use crate::domain::errors::{parse_reference_month, EngineError};
use crate::domain::models::ReferenceMonth;
use crate::domain::{
    AuditService, BonusService, ClosingService, CommissionService, ExportService,
};
use crate::io::mappers;
use crate::storage::csv::CsvConnection;
use chrono::NaiveDate;
use shared::{
    BonusPolicyRequest, CommissionRuleRequest, ErrorResponse, ReopenClosingRequest,
};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub closing_service: ClosingService<CsvConnection>,
    pub commission_service: CommissionService<CsvConnection>,
    pub bonus_service: BonusService<CsvConnection>,
    pub audit_service: AuditService<CsvConnection>,
    pub export_service: ExportService,
}

impl AppState {
    /// Wire all services against one storage connection.
    pub fn new(connection: Arc<CsvConnection>) -> Self {
        let commission_service = CommissionService::new(connection.clone());
        let audit_service = AuditService::new(connection.clone());
        let closing_service = ClosingService::new(
            connection.clone(),
            commission_service.clone(),
            audit_service.clone(),
        );
        let bonus_service = BonusService::new(connection);

        Self {
            closing_service,
            commission_service,
            bonus_service,
            audit_service,
            export_service: ExportService::new(),
        }
    }
}

/// API routes, nested under `/api` by the binary.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/closings", get(list_closings))
        .route("/closings/:month", get(get_closing))
        .route("/closings/:month/run", post(run_closing))
        .route("/closings/:month/reopen", post(reopen_closing))
        .route("/closings/:month/partners", get(partner_summaries))
        .route("/closings/:month/export.csv", get(export_closing_csv))
        .route("/partners/:partner_id/bonus/:month", get(partner_bonus))
        .route("/commission-rules", get(list_commission_rules).post(create_commission_rule))
        .route("/bonus-policies", get(list_bonus_policies).post(create_bonus_policy))
        .route("/audit/reopens", get(reopen_audit_entries))
}

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "up" })))
}

async fn run_closing(
    State(state): State<AppState>,
    Path(month): Path<String>,
    headers: HeaderMap,
) -> Response {
    info!("POST /api/closings/{}/run", month);

    let month = match parse_month(&month) {
        Ok(month) => month,
        Err(response) => return response,
    };

    let command = RunClosingCommand {
        reference_month: month,
        actor: actor_from_headers(&headers),
    };

    match state.closing_service.run_closing(command) {
        Ok(result) => (StatusCode::OK, Json(mappers::closing_result_to_dto(&result))).into_response(),
        Err(e) => error_response(e),
    }
}

async fn reopen_closing(
    State(state): State<AppState>,
    Path(month): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ReopenClosingRequest>,
) -> Response {
    info!("POST /api/closings/{}/reopen", month);

    let month = match parse_month(&month) {
        Ok(month) => month,
        Err(response) => return response,
    };

    let command = ReopenClosingCommand {
        reference_month: month,
        justification: request.justification,
        actor: actor_from_headers(&headers),
    };

    match state.closing_service.reopen_closing(command) {
        Ok(closing) => (StatusCode::OK, Json(mappers::closing_to_dto(&closing, &[]))).into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_closing(State(state): State<AppState>, Path(month): Path<String>) -> Response {
    info!("GET /api/closings/{}", month);

    let month = match parse_month(&month) {
        Ok(month) => month,
        Err(response) => return response,
    };

    match state.closing_service.get_closing(month) {
        Ok(result) => (StatusCode::OK, Json(mappers::closing_result_to_dto(&result))).into_response(),
        Err(e) => error_response(e),
    }
}

async fn list_closings(State(state): State<AppState>) -> Response {
    info!("GET /api/closings");

    match state.closing_service.list_closings() {
        Ok(closings) => {
            let dtos: Vec<_> = closings
                .iter()
                .map(|closing| mappers::closing_to_dto(closing, &[]))
                .collect();
            (StatusCode::OK, Json(dtos)).into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn partner_summaries(State(state): State<AppState>, Path(month): Path<String>) -> Response {
    info!("GET /api/closings/{}/partners", month);

    let month = match parse_month(&month) {
        Ok(month) => month,
        Err(response) => return response,
    };

    match state.closing_service.partner_summaries(month) {
        Ok(summaries) => {
            let dtos: Vec<_> = summaries.iter().map(mappers::partner_summary_to_dto).collect();
            (StatusCode::OK, Json(dtos)).into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn export_closing_csv(State(state): State<AppState>, Path(month): Path<String>) -> Response {
    info!("GET /api/closings/{}/export.csv", month);

    let month = match parse_month(&month) {
        Ok(month) => month,
        Err(response) => return response,
    };

    let result = match state.closing_service.get_closing(month) {
        Ok(result) => result,
        Err(e) => return error_response(e),
    };

    match state.export_service.closing_details_csv(&result) {
        Ok(csv) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            csv,
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

async fn partner_bonus(
    State(state): State<AppState>,
    Path((partner_id, month)): Path<(String, String)>,
) -> Response {
    info!("GET /api/partners/{}/bonus/{}", partner_id, month);

    let month = match parse_month(&month) {
        Ok(month) => month,
        Err(response) => return response,
    };

    match state.bonus_service.calculate_partner_bonus(&partner_id, month) {
        Ok(breakdown) => {
            (StatusCode::OK, Json(mappers::bonus_breakdown_to_dto(&breakdown))).into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn create_commission_rule(
    State(state): State<AppState>,
    Json(request): Json<CommissionRuleRequest>,
) -> Response {
    info!("POST /api/commission-rules");

    let effective_from = match parse_date_field(&request.effective_from) {
        Ok(date) => date,
        Err(response) => return response,
    };
    let effective_to = match parse_opt_date_field(request.effective_to.as_deref()) {
        Ok(date) => date,
        Err(response) => return response,
    };

    let command = CreateCommissionRuleCommand {
        category: mappers::category_from_dto(request.category),
        fixed_amount: request.fixed_amount,
        percentage_rate: request.percentage_rate,
        min_billing_threshold: request.min_billing_threshold,
        max_billing_threshold: request.max_billing_threshold,
        effective_from,
        effective_to,
    };

    match state.commission_service.create_rule(command) {
        Ok(rule) => (StatusCode::CREATED, Json(mappers::rule_to_dto(&rule))).into_response(),
        Err(e) => error_response(e),
    }
}

async fn list_commission_rules(State(state): State<AppState>) -> Response {
    info!("GET /api/commission-rules");

    match state.commission_service.list_rules() {
        Ok(rules) => {
            let dtos: Vec<_> = rules.iter().map(mappers::rule_to_dto).collect();
            (StatusCode::OK, Json(dtos)).into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn create_bonus_policy(
    State(state): State<AppState>,
    Json(request): Json<BonusPolicyRequest>,
) -> Response {
    info!("POST /api/bonus-policies");

    let effective_from = match parse_date_field(&request.effective_from) {
        Ok(date) => date,
        Err(response) => return response,
    };
    let effective_to = match parse_opt_date_field(request.effective_to.as_deref()) {
        Ok(date) => date,
        Err(response) => return response,
    };

    let command = CreateBonusPolicyCommand {
        name: request.name,
        description: request.description,
        kind: mappers::bonus_kind_from_dto(request.kind),
        threshold_clients: request.threshold_clients,
        revenue_threshold: request.revenue_threshold,
        bonus_amount: request.bonus_amount,
        effective_from,
        effective_to,
    };

    match state.bonus_service.create_policy(command) {
        Ok(policy) => (StatusCode::CREATED, Json(mappers::policy_to_dto(&policy))).into_response(),
        Err(e) => error_response(e),
    }
}

async fn list_bonus_policies(State(state): State<AppState>) -> Response {
    info!("GET /api/bonus-policies");

    match state.bonus_service.list_policies() {
        Ok(policies) => {
            let dtos: Vec<_> = policies.iter().map(mappers::policy_to_dto).collect();
            (StatusCode::OK, Json(dtos)).into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn reopen_audit_entries(State(state): State<AppState>) -> Response {
    info!("GET /api/audit/reopens");

    match state.audit_service.reopen_entries() {
        Ok(entries) => {
            let dtos: Vec<_> = entries.iter().map(mappers::audit_entry_to_dto).collect();
            (StatusCode::OK, Json(dtos)).into_response()
        }
        Err(e) => error_response(e),
    }
}

fn actor_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-actor")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "system".to_string())
}

fn parse_month(raw: &str) -> Result<ReferenceMonth, Response> {
    parse_reference_month(raw).map_err(error_response)
}

fn parse_date_field(raw: &str) -> Result<NaiveDate, Response> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                code: "MALFORMED_DATE".to_string(),
                message: format!("invalid date '{}', expected YYYY-MM-DD", raw),
            }),
        )
            .into_response()
    })
}

fn parse_opt_date_field(raw: Option<&str>) -> Result<Option<NaiveDate>, Response> {
    match raw {
        Some(value) => parse_date_field(value).map(Some),
        None => Ok(None),
    }
}

fn error_response(error: EngineError) -> Response {
    let status = match &error {
        EngineError::RuleNotFound { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::ClosingAlreadyCompleted(_)
        | EngineError::ClosingNotReopenable { .. }
        | EngineError::OverlappingRule { .. } => StatusCode::CONFLICT,
        EngineError::ClosingNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::InvalidJustification(_)
        | EngineError::MalformedReferenceMonth(_)
        | EngineError::InvalidBonusPolicy(_)
        | EngineError::InvalidCommissionRule(_) => StatusCode::BAD_REQUEST,
        EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Internal error: {:#}", error);
        "internal error".to_string()
    } else {
        error.to_string()
    };

    (
        status,
        Json(ErrorResponse {
            code: error.code().to_string(),
            message,
        }),
    )
        .into_response()
}
