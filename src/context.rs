//! Request-scoped correlation id storage.
//!
//! The id is established by the request-context middleware before any handler
//! or service logic runs, and torn down automatically when the scoped future
//! completes. Task-local storage keeps concurrent requests isolated without
//! threading the id through every call signature.
use std::future::Future;

tokio::task_local! {
    static REQUEST_ID: String;
}

/// Run `fut` with `request_id` as the ambient correlation id.
pub async fn scope<F>(request_id: String, fut: F) -> F::Output
where
    F: Future,
{
    REQUEST_ID.scope(request_id, fut).await
}

/// The correlation id of the current request, if one has been established.
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}
