//! Prometheus wiring: the HTTP middleware and the chat recorder share one
//! registry, so `/metrics` reports request latencies next to socket gauges.

use std::io;
use std::sync::Arc;

use actix_service::{
    Service, ServiceExt as _, Transform,
    boxed::{self, BoxService},
};
use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Compat;
use actix_web_prom::PrometheusMetrics;
use futures_util::future::LocalBoxFuture;
use tracing::info;

use portal::domain::ports::{ChatMetrics, NoOpChatMetrics};
use portal::outbound::metrics::PrometheusChatMetrics;

/// Request metrics middleware; passes requests through untouched when
/// Prometheus is not configured.
#[derive(Clone)]
pub(crate) enum HttpMetrics {
    Recording(Arc<PrometheusMetrics>),
    Passthrough,
}

impl From<Option<PrometheusMetrics>> for HttpMetrics {
    fn from(metrics: Option<PrometheusMetrics>) -> Self {
        metrics.map_or(Self::Passthrough, |metrics| Self::Recording(Arc::new(metrics)))
    }
}

/// Chat recorder registered on the middleware's registry.
pub(super) fn chat_metrics(
    prometheus: Option<&PrometheusMetrics>,
) -> io::Result<Arc<dyn ChatMetrics>> {
    let Some(prom) = prometheus else {
        return Ok(Arc::new(NoOpChatMetrics));
    };
    let recorder = PrometheusChatMetrics::new(&prom.registry)
        .map_err(|err| io::Error::other(format!("chat metrics registration failed: {err}")))?;
    info!("chat metrics registered");
    Ok(Arc::new(recorder))
}

type BoxedService = BoxService<ServiceRequest, ServiceResponse<BoxBody>, actix_web::Error>;

impl<S, B> Transform<S, ServiceRequest> for HttpMetrics
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = BoxedService;
    type Future = LocalBoxFuture<'static, Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        match self {
            Self::Recording(metrics) => {
                let pending = Compat::new(metrics.as_ref().clone()).new_transform(service);
                Box::pin(async move { Ok(boxed::service(pending.await?)) })
            }
            Self::Passthrough => {
                let svc = service.map(ServiceResponse::map_into_boxed_body);
                Box::pin(async move { Ok(boxed::service(svc)) })
            }
        }
    }
}
