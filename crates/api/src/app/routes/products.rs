use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Extension, Path, Query},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use catalog_core::{DomainError, ProductId};
use catalog_infra::ListFilter;
use catalog_products::Product;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/products", post(create_product).get(list_products))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

/// Only integer ids are routable; anything else cannot name a product.
fn parse_id(raw: &str) -> Result<ProductId, ApiError> {
    raw.parse::<ProductId>().map_err(|_| {
        DomainError::not_found(format!("Product with id '{raw}' was not found.")).into()
    })
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    tracing::info!("Request to create a product");
    dto::require_json(&headers)?;

    let record = dto::parse_record(&body)?;
    let mut product = Product::from_record(&record)?;
    let id = services.products.create(&mut product).await?;
    tracing::info!("Product with id [{id}] created");

    let location = dto::product_location(&headers, &services.public_base_url, id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(product.serialize()),
    )
        .into_response())
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::ListProductsQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    tracing::info!("Request to list products");
    let Query(query) =
        query.map_err(|rejection| ApiError::MalformedQuery(rejection.body_text()))?;
    let filter = ListFilter::from_params(
        query.name.as_deref(),
        query.category.as_deref(),
        query.available.as_deref(),
    )?;

    let results = services
        .products
        .list(&filter)
        .await?
        .iter()
        .map(Product::serialize)
        .collect::<Vec<_>>();

    tracing::info!("Returning {} products", results.len());
    Ok((StatusCode::OK, Json(results)).into_response())
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    tracing::info!("Request to retrieve product with id {id}");

    let product = services.products.get(id).await?;
    Ok((StatusCode::OK, Json(product.serialize())).into_response())
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    dto::require_json(&headers)?;
    let id = parse_id(&id)?;
    tracing::info!("Request to update product with id {id}");

    let mut product = services.products.get(id).await?;
    let record = dto::parse_record(&body)?;
    product.deserialize(&record)?;
    product.assign_id(id);
    services.products.update(&product).await?;

    Ok((StatusCode::OK, Json(product.serialize())).into_response())
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    // An id that cannot exist is just another absent product.
    let Ok(id) = id.parse::<ProductId>() else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };
    tracing::info!("Request to delete product with id {id}");

    if let Some(product) = services.products.find(id).await? {
        services.products.delete(&product).await?;
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}
