use crate::{
    error::AppError,
    items::{Credentials, IntegrationItem},
    oauth::{CallbackQuery, CLOSE_WINDOW_HTML},
    server::Server,
};
use axum::{
    extract::{Form, FromRequest, Multipart, Query, Request, State},
    http::header,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

#[derive(Deserialize)]
pub struct UserOrgForm {
    pub user_id: String,
    pub org_id: String,
}

#[derive(Deserialize)]
pub struct LoadForm {
    pub credentials: String,
}

/// Form extractor accepting both encodings browsers produce: the
/// integration UI submits `FormData` (multipart/form-data), while plain
/// clients and tests send urlencoded bodies.
pub struct FormData<T>(pub T);

impl<S, T> FromRequest<S> for FormData<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;

            let mut fields = serde_json::Map::new();
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?
            {
                let name = match field.name() {
                    Some(name) => name.to_string(),
                    None => continue,
                };
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                fields.insert(name, Value::String(text));
            }

            let value = serde_json::from_value(Value::Object(fields))
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            Ok(FormData(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            Ok(FormData(value))
        }
    }
}

pub fn create_hubspot_routes() -> Router<Server> {
    Router::new()
        .route("/authorize", post(authorize_handler))
        .route("/oauth2callback", get(callback_handler))
        .route("/credentials", post(credentials_handler))
        .route("/load", post(load_handler))
}

/// Start an authorization round-trip; the caller opens the returned URL in
/// a popup window.
pub async fn authorize_handler(
    State(server): State<Server>,
    FormData(form): FormData<UserOrgForm>,
) -> Result<Json<String>, AppError> {
    let url = server
        .oauth_flows
        .authorize(&form.user_id, &form.org_id)
        .await?;
    Ok(Json(url))
}

/// Redirect target registered with HubSpot. Responds with markup that
/// closes the popup window once the flow has completed.
pub async fn callback_handler(
    State(server): State<Server>,
    Query(params): Query<CallbackQuery>,
) -> Result<Html<&'static str>, AppError> {
    server.oauth_flows.handle_callback(params).await?;
    Ok(Html(CLOSE_WINDOW_HTML))
}

/// One-shot credential pickup after a completed callback
pub async fn credentials_handler(
    State(server): State<Server>,
    FormData(form): FormData<UserOrgForm>,
) -> Result<Json<Value>, AppError> {
    let credentials = server
        .oauth_flows
        .credentials(&form.user_id, &form.org_id)
        .await?;
    Ok(Json(credentials))
}

/// List the contacts visible to the submitted credentials
pub async fn load_handler(
    State(server): State<Server>,
    FormData(form): FormData<LoadForm>,
) -> Result<Json<Vec<IntegrationItem>>, AppError> {
    let items = server
        .contact_service
        .list_items(Credentials::Raw(form.credentials))
        .await?;
    Ok(Json(items))
}
