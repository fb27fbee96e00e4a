/// HTTP middleware utilities for board-service
///
/// Provides viewer identification from the gateway header and request
/// latency metrics.
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::time::Instant;

use crate::metrics::activity::HTTP_REQUEST_DURATION_SECONDS;

/// Header carrying the Firebase uid verified by the upstream auth gateway.
pub const VIEWER_HEADER: &str = "x-viewer-id";

// =====================================================================
// Viewer identification
// =====================================================================

/// Viewer identifier stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerId(pub String);

/// Optional viewer for a request; anonymous when the header is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaybeViewer(pub Option<ViewerId>);

impl MaybeViewer {
    pub fn into_firebase_id(self) -> Option<String> {
        self.0.map(|viewer| viewer.0)
    }
}

/// Actix middleware that copies the viewer header into request extensions.
pub struct ViewerIdentity;

impl<S, B> Transform<S, ServiceRequest> for ViewerIdentity
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ViewerIdentityService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ViewerIdentityService {
            service: Rc::new(service),
        }))
    }
}

pub struct ViewerIdentityService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ViewerIdentityService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let viewer = req
                .headers()
                .get(VIEWER_HEADER)
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| ViewerId(v.to_string()));

            if let Some(viewer) = viewer {
                req.extensions_mut().insert(viewer);
            }

            service.call(req).await
        })
    }
}

impl FromRequest for MaybeViewer {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(Ok(MaybeViewer(req.extensions().get::<ViewerId>().cloned())))
    }
}

// =====================================================================
// Metrics middleware
// =====================================================================

pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let path = req.path().to_string();
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = start.elapsed();
            let status = match &res {
                Ok(response) => response.status().as_u16().to_string(),
                Err(err) => err.as_response_error().status_code().as_u16().to_string(),
            };

            HTTP_REQUEST_DURATION_SECONDS
                .with_label_values(&[method.as_str(), status.as_str()])
                .observe(elapsed.as_secs_f64());
            tracing::debug!(%method, %path, %status, elapsed_ms = %elapsed.as_millis(), "request completed");
            res
        })
    }
}
