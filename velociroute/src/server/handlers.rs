use crate::fetch::ImageFetcher;
use crate::route::aggregator::RouteAggregator;
use crate::server::schema::{HealthResponse, ImageRequest, RouteRequest, RouteResponse};
use crate::server::ApiError;
use actix_web::{web, HttpResponse};
use log::info;
use velociroute_inference::ImageClassifier;

pub async fn health<F, C>(aggregator: web::Data<RouteAggregator<F, C>>) -> HttpResponse
where
    F: ImageFetcher + 'static,
    C: ImageClassifier + 'static,
{
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        labels: aggregator.point_classifier().classifier().vocabulary().len(),
    })
}

pub async fn classify_image<F, C>(
    aggregator: web::Data<RouteAggregator<F, C>>,
    request: web::Json<ImageRequest>,
) -> Result<HttpResponse, ApiError>
where
    F: ImageFetcher + 'static,
    C: ImageClassifier + 'static,
{
    let url = request.validate()?;
    info!("Classifying image {}", url);

    let result = aggregator.point_classifier().classify_image(url).await?;
    Ok(HttpResponse::Ok().json(result))
}

pub async fn classify_route<F, C>(
    aggregator: web::Data<RouteAggregator<F, C>>,
    request: web::Json<RouteRequest>,
) -> Result<HttpResponse, ApiError>
where
    F: ImageFetcher + 'static,
    C: ImageClassifier + 'static,
{
    let points = request.into_inner().into_points()?;
    info!("Classifying route of {} points", points.len());

    let report = aggregator.aggregate(&points).await?;
    Ok(HttpResponse::Ok().json(RouteResponse::from(report)))
}

pub async fn preflight() -> HttpResponse {
    HttpResponse::NoContent().finish()
}
