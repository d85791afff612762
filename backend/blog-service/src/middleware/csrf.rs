//! Cross-site request forgery check.
//!
//! State-changing requests whose `Origin` (or, failing that, `Referer`) names a
//! site other than this one or a trusted origin are rejected with the CSRF
//! failure view. Requests carrying neither header pass: authentication is by
//! bearer token, which browsers never attach on their own.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, Method},
    Error,
};
use futures::future::{ready, Ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::error::AppError;

#[derive(Clone, Default)]
pub struct CsrfMiddleware {
    trusted_origins: Rc<Vec<String>>,
}

impl CsrfMiddleware {
    pub fn new(trusted_origins: Vec<String>) -> Self {
        Self {
            trusted_origins: Rc::new(trusted_origins),
        }
    }
}

fn is_safe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// `scheme://host[:port]` part of a URL.
fn origin_of(url: &str) -> Option<&str> {
    let scheme_end = url.find("://")?;
    let rest = &url[scheme_end + 3..];
    let authority_len = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    if authority_len == 0 {
        return None;
    }
    Some(&url[..scheme_end + 3 + authority_len])
}

fn check_request(req: &ServiceRequest, trusted_origins: &[String]) -> Result<(), AppError> {
    if is_safe_method(req.method()) {
        return Ok(());
    }

    let headers = req.headers();
    let (source, claimed) = match headers.get(header::ORIGIN) {
        Some(origin) => ("origin", origin.to_str().ok()),
        None => match headers.get(header::REFERER) {
            Some(referer) => ("referer", referer.to_str().ok().and_then(origin_of)),
            None => return Ok(()),
        },
    };

    let Some(claimed) = claimed else {
        return Err(AppError::CsrfFailure(format!("{} header is malformed", source)));
    };
    let claimed = claimed.trim_end_matches('/');

    let info = req.connection_info();
    let own_origin = format!("{}://{}", info.scheme(), info.host());
    if claimed.eq_ignore_ascii_case(&own_origin)
        || trusted_origins
            .iter()
            .any(|trusted| trusted == "*" || trusted.eq_ignore_ascii_case(claimed))
    {
        return Ok(());
    }

    Err(AppError::CsrfFailure(format!(
        "{} {} is not trusted",
        source, claimed
    )))
}

impl<S, B> Transform<S, ServiceRequest> for CsrfMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CsrfMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CsrfMiddlewareService {
            service,
            trusted_origins: self.trusted_origins.clone(),
        }))
    }
}

pub struct CsrfMiddlewareService<S> {
    service: S,
    trusted_origins: Rc<Vec<String>>,
}

impl<S, B> Service<ServiceRequest> for CsrfMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Err(e) = check_request(&req, &self.trusted_origins) {
            let resp = req.error_response(e).map_into_right_body();
            return Box::pin(async move { Ok(resp) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}
