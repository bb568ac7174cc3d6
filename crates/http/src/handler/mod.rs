//! Request handler abstraction.
//!
//! A [`Handler`] turns one decoded [`Request`] into a [`Response`]; the
//! connection layer maps a handler failure to a `500` response. Use
//! [`make_handler`] to lift an async function into a handler.

use std::error::Error;
use std::future::Future;

use async_trait::async_trait;

use crate::protocol::{Request, Response};

#[async_trait]
pub trait Handler: Send + Sync {
    type Error: Into<Box<dyn Error + Send + Sync>> + Send;

    async fn call(&self, request: Request) -> Result<Response, Self::Error>;
}

#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<Err, F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Err: Into<Box<dyn Error + Send + Sync>> + Send,
    Fut: Future<Output = Result<Response, Err>> + Send,
{
    type Error = Err;

    async fn call(&self, request: Request) -> Result<Response, Self::Error> {
        (self.f)(request).await
    }
}

pub fn make_handler<F, Err, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Err: Into<Box<dyn Error + Send + Sync>> + Send,
    Fut: Future<Output = Result<Response, Err>> + Send,
{
    HandlerFn { f }
}
