//! Ordered fallback chains
//!
//! Each resolver lists its steps as an enum in precedence order and runs them
//! through [`first_success`], which stops at the first step that produces a
//! value.

use std::fmt::Debug;
use std::future::Future;
use tracing::debug;

/// Run `steps` in order and return the first step that yields a value,
/// together with that value. Later steps are never started.
pub async fn first_success<S, T, F, Fut>(steps: &[S], mut run: F) -> Option<(S, T)>
where
    S: Copy + Debug,
    F: FnMut(S) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for &step in steps {
        if let Some(value) = run(step).await {
            debug!("Resolved at step {:?}", step);
            return Some((step, value));
        }
        debug!("Step {:?} gave no answer", step);
    }
    None
}
