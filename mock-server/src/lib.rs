//! In-memory HAL items API used to exercise the REST client end to end.
//!
//! Every route sits behind HTTP Basic authentication with the fixed
//! `USER`/`PASSWORD` pair.

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Multipart, Path, RawQuery, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const USER: &str = "alice";
pub const PASSWORD: &str = "secret";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct CreateItem {
    pub name: String,
    #[serde(default)]
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateItem {
    pub name: Option<String>,
    pub quantity: Option<u32>,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Item>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", get(get_item).put(update_item).delete(delete_item))
        .route("/items/{id}/attachments", post(upload_attachments))
        .route("/echo", any(echo))
        .layer(middleware::from_fn(require_basic_auth))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// HAL representation of one item.
pub fn item_resource(item: &Item) -> Value {
    json!({
        "id": item.id,
        "name": item.name,
        "quantity": item.quantity,
        "_links": {
            "self": { "href": format!("/items/{}", item.id) },
            "attachments": { "href": format!("/items/{}/attachments", item.id) },
            "collection": { "href": "/items" }
        }
    })
}

async fn require_basic_auth(request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
        .and_then(|encoded| STANDARD.decode(encoded).ok())
        .is_some_and(|decoded| decoded == format!("{USER}:{PASSWORD}").as_bytes());

    if !authorized {
        tracing::warn!(method = %request.method(), uri = %request.uri(), "rejected credentials");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid credentials" })),
        )
            .into_response();
    }

    tracing::debug!(method = %request.method(), uri = %request.uri(), "serving");
    next.run(request).await
}

async fn list_items(State(db): State<Db>) -> Json<Value> {
    let items = db.read().await;
    let mut embedded: Vec<&Item> = items.values().collect();
    embedded.sort_by(|a, b| a.name.cmp(&b.name));
    Json(json!({
        "count": embedded.len(),
        "_links": { "self": { "href": "/items" } },
        "_embedded": {
            "items": embedded.into_iter().map(item_resource).collect::<Vec<_>>()
        }
    }))
}

async fn create_item(
    State(db): State<Db>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let input = parse_create(&headers, &body).ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;
    let item = Item {
        id: Uuid::new_v4(),
        name: input.name,
        quantity: input.quantity,
    };
    db.write().await.insert(item.id, item.clone());
    Ok((StatusCode::CREATED, Json(item_resource(&item))))
}

/// Accepts JSON or `application/x-www-form-urlencoded` bodies.
fn parse_create(headers: &HeaderMap, body: &[u8]) -> Option<CreateItem> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let fields: HashMap<String, String> = url::form_urlencoded::parse(body)
            .into_owned()
            .collect();
        let name = fields.get("name")?.clone();
        let quantity = match fields.get("quantity") {
            Some(raw) => raw.parse().ok()?,
            None => 0,
        };
        return Some(CreateItem { name, quantity });
    }

    serde_json::from_slice(body).ok()
}

async fn get_item(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Json<Value>, StatusCode> {
    let items = db.read().await;
    items
        .get(&id)
        .map(|item| Json(item_resource(item)))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_item(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateItem>,
) -> Result<Json<Value>, StatusCode> {
    let mut items = db.write().await;
    let item = items.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(name) = input.name {
        item.name = name;
    }
    if let Some(quantity) = input.quantity {
        item.quantity = quantity;
    }
    Ok(Json(item_resource(item)))
}

async fn delete_item(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let mut items = db.write().await;
    items.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

async fn upload_attachments(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    if !db.read().await.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        files.push(json!({
            "field": name,
            "file_name": file_name,
            "content_type": content_type,
            "size": data.len(),
            "text": String::from_utf8_lossy(&data),
        }));
    }

    let request_content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "content_type": request_content_type,
            "files": files,
            "_links": { "item": { "href": format!("/items/{id}") } }
        })),
    ))
}

/// Reflects the request back so clients can inspect what they sent.
async fn echo(
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    Json(json!({
        "method": method.as_str(),
        "query": query,
        "content_type": header_value(header::CONTENT_TYPE),
        "accept": header_value(header::ACCEPT),
        "user_agent": header_value(header::USER_AGENT),
        "body": String::from_utf8_lossy(&body),
    }))
}
