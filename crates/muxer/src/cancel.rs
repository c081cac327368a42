//! Cancellation of suspending negotiation operations.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use wire::error::NegotiationError;

/// Races `operation` against `cancel`.
///
/// The token is checked first, so an already-cancelled token aborts before
/// any byte crosses the wire; afterwards the operation is abandoned at
/// whichever suspension point it occupies when the token fires. Any stream
/// the operation was driving is left in an undefined protocol state.
pub(crate) async fn with_cancellation<T>(
    cancel: &CancellationToken,
    operation: impl Future<Output = Result<T, NegotiationError>>,
) -> Result<T, NegotiationError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(NegotiationError::Cancelled),
        result = operation => result,
    }
}
