//! SMS templates.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use shopcrm_core::{Role, SmsTemplateId};

use crate::backend::{NewSmsTemplate, SmsTemplate, SmsTemplateUpdate};
use crate::error::AppError;
use crate::middleware::{Authenticated, RequireAuth};
use crate::routes::ShopQuery;
use crate::services::sms;
use crate::state::AppState;
use crate::validation::FieldErrors;

const TEMPLATE_MANAGERS: &[Role] = &[Role::SuperAdmin, Role::Admin];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sms-templates", get(list_templates).post(create_template))
        .route(
            "/api/sms-templates/{id}",
            get(get_template)
                .patch(update_template)
                .delete(delete_template),
        )
        .route("/api/sms-templates/{id}/render", post(render_template))
}

async fn template_in_scope(
    auth: &Authenticated,
    id: &SmsTemplateId,
) -> Result<SmsTemplate, AppError> {
    let template = auth.api.get_sms_template(id).await?;
    auth.scope_shop(Some(&template.shop_id))?;
    Ok(template)
}

async fn list_templates(
    RequireAuth(auth): RequireAuth,
    Query(query): Query<ShopQuery>,
) -> Result<Json<Vec<SmsTemplate>>, AppError> {
    auth.require_staff()?;
    let shop_id = auth.scope_shop(query.shop_id.as_ref())?;
    Ok(Json(auth.api.list_sms_templates(&shop_id).await?))
}

async fn create_template(
    RequireAuth(auth): RequireAuth,
    Json(template): Json<NewSmsTemplate>,
) -> Result<(StatusCode, Json<SmsTemplate>), AppError> {
    auth.require_any(TEMPLATE_MANAGERS)?;
    auth.scope_shop(Some(&template.shop_id))?;

    let mut errors = FieldErrors::new();
    sms::validate(&mut errors, Some(&template.name), Some(&template.body));
    errors.finish()?;

    Ok((
        StatusCode::CREATED,
        Json(auth.api.create_sms_template(&template).await?),
    ))
}

async fn get_template(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<SmsTemplateId>,
) -> Result<Json<SmsTemplate>, AppError> {
    auth.require_staff()?;
    Ok(Json(template_in_scope(&auth, &id).await?))
}

async fn update_template(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<SmsTemplateId>,
    Json(update): Json<SmsTemplateUpdate>,
) -> Result<Json<SmsTemplate>, AppError> {
    auth.require_any(TEMPLATE_MANAGERS)?;
    template_in_scope(&auth, &id).await?;

    let mut errors = FieldErrors::new();
    sms::validate(&mut errors, update.name.as_deref(), update.body.as_deref());
    errors.finish()?;

    Ok(Json(auth.api.update_sms_template(&id, &update).await?))
}

async fn delete_template(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<SmsTemplateId>,
) -> Result<StatusCode, AppError> {
    auth.require_any(TEMPLATE_MANAGERS)?;
    template_in_scope(&auth, &id).await?;

    auth.api.delete_sms_template(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct RenderForm {
    #[serde(default)]
    pub vars: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct RenderedTemplate {
    pub text: String,
    /// Placeholders in the template that `vars` did not fill.
    pub missing: Vec<String>,
}

async fn render_template(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<SmsTemplateId>,
    Json(form): Json<RenderForm>,
) -> Result<Json<RenderedTemplate>, AppError> {
    auth.require_staff()?;
    let template = template_in_scope(&auth, &id).await?;

    let missing = sms::placeholders(&template.body)
        .into_iter()
        .filter(|name| !form.vars.contains_key(name))
        .collect();

    Ok(Json(RenderedTemplate {
        text: sms::render(&template.body, &form.vars),
        missing,
    }))
}
