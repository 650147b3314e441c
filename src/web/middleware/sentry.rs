use std::collections::BTreeMap;

use poem::http::header::CONTENT_LENGTH;
use poem::{Endpoint, Middleware, Request, Result};
use sentry::protocol::{Breadcrumb, Context};

/// Tags the Sentry scope with the request, so that training and prediction failures
/// can be told apart in the reports.
pub struct SentryMiddleware;

impl<E: Endpoint> Middleware<E> for SentryMiddleware {
    type Output = SentryMiddlewareImpl<E>;

    fn transform(&self, ep: E) -> Self::Output {
        SentryMiddlewareImpl { ep }
    }
}

pub struct SentryMiddlewareImpl<E> {
    ep: E,
}

#[poem::async_trait]
impl<E: Endpoint> Endpoint for SentryMiddlewareImpl<E> {
    type Output = E::Output;

    async fn call(&self, request: Request) -> Result<Self::Output> {
        let path = request.uri().path().to_string();
        sentry::configure_scope(|scope| {
            scope.set_tag("request.method", request.method().as_str());
            scope.set_tag("request.path", &path);
            scope.set_tag("request.remote_addr", request.remote_addr());

            // Sample vectors are too large and too sensitive to attach, their size is enough.
            let mut context = BTreeMap::new();
            if let Some(content_length) = request
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|value| value.to_str().ok())
            {
                context.insert("content_length".to_string(), content_length.into());
            }
            scope.set_context("request", Context::Other(context));
        });
        sentry::add_breadcrumb(Breadcrumb {
            category: Some("request".into()),
            message: Some(format!("{} {}", request.method(), path)),
            ..Default::default()
        });
        self.ep.call(request).await
    }
}
