//! The generic table proxy: one parameterized CRUD surface over every
//! logical table, mounted at `/api/db/{table}`.
//!
//! Each operation is a single pass through translate -> store -> translate;
//! there is no cache, no transaction and no retry. A batched POST inserts
//! strictly in input order, and a failure partway through leaves the
//! records created before it committed.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::{
    store::{Filter, RecordStore},
    tables::TableRef,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use services::services::{
    query::QueryTranslator,
    translator::{FieldTranslator, WriteMode},
    user_resolver::requires_user_id,
};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

/// Sentinel carried on a `single=true` miss, kept compatible with what
/// PostgREST-style clients already check for.
const SINGLE_NOT_FOUND_CODE: &str = "PGRST116";

#[derive(Debug, Deserialize, TS)]
pub struct CreateRecords {
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize, TS)]
pub struct BulkUpdateRecords {
    pub data: Option<Value>,
    #[serde(default, rename = "where")]
    #[ts(rename = "where")]
    pub filter: Option<Value>,
}

/// GET: list records matching the query-string filters, or the first match
/// when `single=true`.
pub async fn get_records(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<ResponseJson<ApiResponse<Value>>, ApiError> {
    let table = TableRef::resolve(&table);
    let parsed = QueryTranslator::parse(&table, &params);
    let store = RecordStore::new(state.db.pool.clone());

    let rows = store
        .select(table.physical(), &parsed.filters, parsed.sort.as_ref())
        .await?;
    let mut records = rows
        .into_iter()
        .map(|row| Value::Object(FieldTranslator::to_external(&table, row)));

    if parsed.single {
        return Ok(ResponseJson(match records.next() {
            Some(record) => ApiResponse::success(record),
            None => ApiResponse::error_with_code(
                "JSON object requested, multiple (or no) rows returned",
                SINGLE_NOT_FOUND_CODE,
            ),
        }));
    }
    Ok(ResponseJson(ApiResponse::success(Value::Array(
        records.collect(),
    ))))
}

/// POST: create one record or a batch. The body's `data` may be a bare
/// object or an array; the response is always an array of created records.
pub async fn create_records(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(payload): Json<CreateRecords>,
) -> Result<ResponseJson<ApiResponse<Value>>, ApiError> {
    let table = TableRef::resolve(&table);
    let data = payload
        .data
        .ok_or_else(|| ApiError::MissingInput("data is required".to_string()))?;
    let items = normalize_items(data)?;
    let store = RecordStore::new(state.db.pool.clone());

    let mut created = Vec::with_capacity(items.len());
    for item in &items {
        let mut row = FieldTranslator::to_internal(&table, item, WriteMode::Create);
        if requires_user_id(&table) && !row.contains_key("userId") {
            if let Some(user_id) = state.user_resolver.resolve_user_id(&table, &row).await? {
                row.insert("userId".to_string(), Value::from(user_id));
            }
        }
        let record = store.insert(table.physical(), &row).await?;
        created.push(Value::Object(FieldTranslator::to_external(&table, record)));
    }
    Ok(ResponseJson(ApiResponse::success(Value::Array(created))))
}

/// PUT: bulk-update every record matching the translated `where` clause.
pub async fn bulk_update_records(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(payload): Json<BulkUpdateRecords>,
) -> Result<ResponseJson<ApiResponse<Value>>, ApiError> {
    let table = TableRef::resolve(&table);
    let data = payload
        .data
        .ok_or_else(|| ApiError::MissingInput("data is required".to_string()))?;
    let data = as_object(data, "data")?;
    let filter = match payload.filter {
        Some(value) => as_object(value, "where")?,
        None => Map::new(),
    };

    let changes = FieldTranslator::to_internal(&table, &data, WriteMode::Update);
    let filters: Vec<Filter> = FieldTranslator::where_to_internal(&table, &filter)
        .into_iter()
        .map(|(column, value)| Filter::eq(column, value))
        .collect();

    let store = RecordStore::new(state.db.pool.clone());
    let count = store
        .update_where(table.physical(), &changes, &filters)
        .await?;
    Ok(ResponseJson(ApiResponse::success(
        serde_json::json!({ "count": count }),
    )))
}

/// PATCH: update a single record addressed by the numeric `id` query
/// parameter.
pub async fn update_record(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    Json(body): Json<Value>,
) -> Result<ResponseJson<ApiResponse<Value>>, ApiError> {
    let table = TableRef::resolve(&table);
    let id = require_id(&params)?;
    let item = as_object(body, "request body")?;
    let changes = FieldTranslator::to_internal(&table, &item, WriteMode::Update);

    let store = RecordStore::new(state.db.pool.clone());
    let record = store.update_by_id(table.physical(), id, &changes).await?;
    Ok(ResponseJson(ApiResponse::success(Value::Object(
        FieldTranslator::to_external(&table, record),
    ))))
}

/// DELETE: remove a single record by numeric `id`, returning it.
pub async fn delete_record(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<ResponseJson<ApiResponse<Value>>, ApiError> {
    let table = TableRef::resolve(&table);
    let id = require_id(&params)?;

    let store = RecordStore::new(state.db.pool.clone());
    let record = store.delete_by_id(table.physical(), id).await?;
    Ok(ResponseJson(ApiResponse::success(Value::Object(
        FieldTranslator::to_external(&table, record),
    ))))
}

fn require_id(params: &[(String, String)]) -> Result<i64, ApiError> {
    let raw = params
        .iter()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.as_str())
        .ok_or_else(|| ApiError::MissingInput("id is required".to_string()))?;
    raw.parse()
        .map_err(|_| ApiError::MissingInput("id must be a numeric value".to_string()))
}

fn as_object(value: Value, what: &str) -> Result<Map<String, Value>, ApiError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::MissingInput(format!("{what} must be an object"))),
    }
}

fn normalize_items(data: Value) -> Result<Vec<Map<String, Value>>, ApiError> {
    match data {
        Value::Object(map) => Ok(vec![map]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| as_object(item, "each data item"))
            .collect(),
        _ => Err(ApiError::MissingInput(
            "data must be an object or an array of objects".to_string(),
        )),
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/db/{table}",
        get(get_records)
            .post(create_records)
            .put(bulk_update_records)
            .patch(update_record)
            .delete(delete_record),
    )
}
