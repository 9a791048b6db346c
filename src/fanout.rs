//! Per-slot parallel backend calls.

use std::thread;

use facemark_api::ApiError;

use crate::model::SlotRole;

/// Run `call` once per target on its own scoped thread.
///
/// Results come back in target order no matter which call finishes first, so a
/// slow slot delays only its own result.
pub(crate) fn fan_out<T, F>(targets: Vec<(SlotRole, String)>, call: F) -> Vec<(SlotRole, Result<T, ApiError>)>
where
    T: Send,
    F: Fn(&str) -> Result<T, ApiError> + Sync,
{
    let call = &call;
    thread::scope(|scope| {
        let handles: Vec<_> = targets
            .iter()
            .map(|(role, image_id)| (*role, scope.spawn(move || call(image_id.as_str()))))
            .collect();

        handles
            .into_iter()
            .map(|(role, handle)| {
                let result = handle.join().unwrap_or_else(|_| {
                    log::error!("{}: backend worker thread panicked", role);
                    Err(ApiError::transport(role.name(), "worker thread panicked"))
                });
                (role, result)
            })
            .collect()
    })
}
