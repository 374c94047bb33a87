//! REST API for the packing engine.
//!
//! Provides HTTP endpoints for communication with callers. Uses Axum as the
//! web framework and supports CORS.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::config::ApiConfig;
use crate::model::{BoxType, FitReport, Item, PackError, PackResult, SpaceReport, ValidationError};
use crate::packer;
use crate::types::Dims;
use crate::units::{DimensionUnit, MassUnit};

#[derive(Clone)]
struct ApiState {
    default_max_weight: f64,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// A single item to be packed, as received over the wire.
#[derive(Deserialize, Clone, ToSchema)]
pub struct ItemRequest {
    pub id: u64,
    #[schema(value_type = [f64; 3], example = json!([30.0, 40.0, 20.0]))]
    pub dims: (f64, f64, f64),
    pub weight: f64,
    #[serde(default)]
    pub dimension_unit: DimensionUnit,
    #[serde(default)]
    pub mass_unit: MassUnit,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl ItemRequest {
    fn into_items(self) -> Result<Vec<Item>, ValidationError> {
        let (a, b, c) = self.dims;
        let dims = Dims::new(
            self.dimension_unit.to_cm(a),
            self.dimension_unit.to_cm(b),
            self.dimension_unit.to_cm(c),
        )?;
        let weight = self.mass_unit.to_g(self.weight);
        let template = Item::new(self.id, dims, weight)?;
        Ok(std::iter::repeat(template).take(self.quantity.max(1) as usize).collect())
    }
}

/// A candidate shipping box, as received over the wire.
#[derive(Deserialize, Clone, ToSchema)]
pub struct BoxRequest {
    pub name: String,
    #[schema(value_type = [f64; 3], example = json!([120.0, 100.0, 80.0]))]
    pub dims: (f64, f64, f64),
    pub tare_weight: f64,
    #[serde(default)]
    pub dimension_unit: DimensionUnit,
    #[serde(default)]
    pub mass_unit: MassUnit,
}

impl BoxRequest {
    fn into_box_type(self) -> Result<BoxType, ValidationError> {
        let (a, b, c) = self.dims;
        let dims = Dims::new(
            self.dimension_unit.to_cm(a),
            self.dimension_unit.to_cm(b),
            self.dimension_unit.to_cm(c),
        )?;
        let tare_weight = self.mass_unit.to_g(self.tare_weight);
        BoxType::new(self.name, dims, tare_weight)
    }
}

#[derive(Deserialize, ToSchema)]
pub struct PackRequest {
    pub items: Vec<ItemRequest>,
    pub boxes: Vec<BoxRequest>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub max_weight: Option<f64>,
}

#[derive(Serialize, ToSchema)]
pub struct ItemResponse {
    pub id: u64,
    pub dims: [f64; 3],
    pub weight: f64,
}

impl From<&Item> for ItemResponse {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            dims: item.dims.as_array(),
            weight: item.weight,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct BoxResponse {
    pub name: String,
    pub dims: [f64; 3],
    pub tare_weight: f64,
}

impl From<&BoxType> for BoxResponse {
    fn from(b: &BoxType) -> Self {
        Self {
            name: b.name.clone(),
            dims: b.dims.as_array(),
            tare_weight: b.tare_weight,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ParcelResponse {
    pub items: Vec<ItemResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct PackResponse {
    pub chosen_box: BoxResponse,
    pub parcels: Vec<ParcelResponse>,
    pub last_parcel_box: Option<BoxResponse>,
}

impl From<PackResult> for PackResponse {
    fn from(result: PackResult) -> Self {
        Self {
            chosen_box: BoxResponse::from(&result.chosen_box),
            parcels: result
                .parcels
                .iter()
                .map(|p| ParcelResponse {
                    items: p.items.iter().map(ItemResponse::from).collect(),
                })
                .collect(),
            last_parcel_box: result.last_parcel.as_ref().map(BoxResponse::from),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct SpaceRequest {
    pub item: ItemRequest,
    #[serde(rename = "box")]
    pub box_: BoxRequest,
}

#[derive(Deserialize, ToSchema)]
pub struct FitRequest {
    pub item: ItemRequest,
    #[serde(rename = "box")]
    pub box_: BoxRequest,
    #[serde(default)]
    #[schema(nullable = true)]
    pub cap: Option<usize>,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(status: StatusCode, error: impl Into<String>, details: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(StatusCode::UNPROCESSABLE_ENTITY, "Invalid JSON data", err.to_string())
}

fn pack_error_response(err: PackError) -> Response {
    error_response(StatusCode::UNPROCESSABLE_ENTITY, "Packing failed", err.to_string())
}

fn validation_error_response(err: ValidationError) -> Response {
    error_response(StatusCode::UNPROCESSABLE_ENTITY, "Invalid input data", err.to_string())
}

fn build_items(requests: Vec<ItemRequest>) -> Result<Vec<Item>, Response> {
    let mut items = Vec::new();
    for req in requests {
        items.extend(req.into_items().map_err(validation_error_response)?);
    }
    Ok(items)
}

fn build_boxes(requests: Vec<BoxRequest>) -> Result<Vec<BoxType>, Response> {
    let mut seen = std::collections::HashSet::new();
    let mut boxes = Vec::new();
    for req in requests {
        let name = req.name.clone();
        if !seen.insert(name.clone()) {
            return Err(pack_error_response(PackError::DuplicateBoxName(name)));
        }
        boxes.push(req.into_box_type().map_err(validation_error_response)?);
    }
    Ok(boxes)
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_pack, handle_space, handle_fit),
    components(
        schemas(
            PackRequest,
            ItemRequest,
            BoxRequest,
            PackResponse,
            ItemResponse,
            BoxResponse,
            ParcelResponse,
            SpaceRequest,
            FitRequest,
            ErrorResponse
        )
    ),
    tags((name = "packing", description = "Endpoints for 3D bin packing"))
)]
struct ApiDoc;

/// Starts the API server.
///
/// Configures CORS for cross-origin requests. Blocks until the server is
/// terminated.
pub async fn start_api_server(config: ApiConfig, default_max_weight: f64) {
    let cors = CorsLayer::new().allow_methods(Any).allow_origin(Any).allow_headers(Any);

    let state = ApiState { default_max_weight };

    let app = Router::new()
        .route("/pack", post(handle_pack))
        .route("/diagnostics/space", post(handle_space))
        .route("/diagnostics/fit", post(handle_fit))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            panic!("❌ Could not bind API server to {}: {}", addr, err);
        }
    };

    let display_host = config.display_host().to_string();
    println!("🚀 Server running on http://{}:{}", display_host, config.port());
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        println!("💡 Local access: http://localhost:{}", config.port());
    }
    println!("📦 API Endpoints:");
    println!("   - POST /pack");
    println!("   - POST /diagnostics/space");
    println!("   - POST /diagnostics/fit");
    println!("📑 Documentation:");
    println!("   - GET /docs");
    println!("   - GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        eprintln!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for POST /pack.
///
/// Packs the supplied items into the best candidate box.
#[utoipa::path(
    post,
    path = "/pack",
    request_body = PackRequest,
    responses(
        (status = 200, description = "Successfully packed items", body = PackResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request or packing failure", body = ErrorResponse)
    ),
    tag = "packing"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    let items = match build_items(payload.items) {
        Ok(items) => items,
        Err(response) => return response,
    };
    let boxes = match build_boxes(payload.boxes) {
        Ok(boxes) => boxes,
        Err(response) => return response,
    };

    let max_weight = payload.max_weight.unwrap_or(state.default_max_weight);
    println!("📥 New pack request: {} items, {} box types", items.len(), boxes.len());

    match packer::pack(items, boxes, Some(max_weight)) {
        Ok(result) => {
            println!("📦 Packed into {} parcel(s) of '{}'", result.parcels.len(), result.chosen_box.name);
            (StatusCode::OK, Json(PackResponse::from(result))).into_response()
        }
        Err(err) => pack_error_response(err),
    }
}

/// Handler for POST /diagnostics/space.
#[utoipa::path(
    post,
    path = "/diagnostics/space",
    request_body = SpaceRequest,
    responses(
        (status = 200, description = "Residual space after placing one item", body = [[f64; 3]]),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "packing"
)]
async fn handle_space(payload: Result<Json<SpaceRequest>, JsonRejection>) -> impl IntoResponse {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    let item = match payload.item.into_items() {
        Ok(items) => items[0].dims,
        Err(err) => return validation_error_response(err),
    };
    let box_dims = match payload.box_.into_box_type() {
        Ok(b) => b.dims,
        Err(err) => return validation_error_response(err),
    };

    match packer::space_after_packing(item, box_dims) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => pack_error_response(err),
    }
}

/// Handler for POST /diagnostics/fit.
#[utoipa::path(
    post,
    path = "/diagnostics/fit",
    request_body = FitRequest,
    responses(
        (status = 200, description = "Number of copies of an item that fit a box", body = FitReport),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "packing"
)]
async fn handle_fit(payload: Result<Json<FitRequest>, JsonRejection>) -> impl IntoResponse {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    let item = match payload.item.into_items() {
        Ok(items) => items[0].dims,
        Err(err) => return validation_error_response(err),
    };
    let box_dims = match payload.box_.into_box_type() {
        Ok(b) => b.dims,
        Err(err) => return validation_error_response(err),
    };

    let report = packer::how_many_fit(item, box_dims, payload.cap);
    (StatusCode::OK, Json(report)).into_response()
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html("<!DOCTYPE html><html><body><p>See <a href=\"/docs/openapi.json\">/docs/openapi.json</a>.</p></body></html>")
}
