use crate::config::Config;
use crate::error::{ClassifyError, RouteError};
use crate::fetch::{HttpFetcher, ImageFetcher};
use crate::route::aggregator::RouteAggregator;
use crate::route::classifier::PointClassifier;
use crate::server::schema::ErrorBody;
use actix_web::http::{Method, StatusCode};
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpResponse, HttpServer, ResponseError};
use anyhow::Result;
use log::info;
use std::sync::Arc;
use thiserror::Error;
use velociroute_inference::{ClassifierSession, ImageClassifier};

pub mod handlers;
pub mod schema;

pub type ServiceAggregator = RouteAggregator<HttpFetcher, ClassifierSession>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Route(#[from] RouteError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Classify(_) | ApiError::Route(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            detail: self.to_string(),
        })
    }
}

/// Loads the model and wires the production fetcher and classifier together.
pub fn build_aggregator(config: &Config) -> Result<ServiceAggregator> {
    let classifier = ClassifierSession::new(
        &config.model.path,
        &config.model.labels,
        config.model.classifier_config()?,
    )?;
    let fetcher = HttpFetcher::new(&config.fetch)?;

    Ok(
        RouteAggregator::new(PointClassifier::new(
            fetcher,
            Arc::new(classifier),
            config.mapping.label_mapper(),
        ))
        .with_timeout(config.route.timeout())
        .with_narrative_min_share(config.route.narrative_min_share),
    )
}

/// Registers the service routes for any fetcher/classifier pair.
pub fn configure<F, C>(
    aggregator: web::Data<RouteAggregator<F, C>>,
) -> impl FnOnce(&mut web::ServiceConfig)
where
    F: ImageFetcher + 'static,
    C: ImageClassifier + 'static,
{
    move |cfg| {
        cfg.app_data(aggregator)
            .app_data(web::JsonConfig::default().error_handler(|err, _| {
                ApiError::BadRequest(format!("Malformed request body: {}", err)).into()
            }))
            .route("/health", web::get().to(handlers::health::<F, C>))
            .service(
                web::resource("/classify-image")
                    .route(web::post().to(handlers::classify_image::<F, C>))
                    .route(web::method(Method::OPTIONS).to(handlers::preflight)),
            )
            .service(
                web::resource("/classify-route")
                    .route(web::post().to(handlers::classify_route::<F, C>))
                    .route(web::method(Method::OPTIONS).to(handlers::preflight)),
            );
    }
}

/// Allow-all CORS headers.
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
        .add(("Access-Control-Allow-Headers", "*"))
}

pub async fn run(config: Config, bind: Option<String>) -> Result<()> {
    let aggregator = web::Data::new(build_aggregator(&config)?);
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    info!("VelociRoute listening on {}", bind);

    HttpServer::new(move || {
        App::new()
            .wrap(cors_headers())
            .wrap(Logger::default())
            .configure(configure(aggregator.clone()))
    })
    .workers(config.server.workers.max(1))
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}
