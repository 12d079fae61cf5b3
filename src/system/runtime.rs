// src/system/runtime.rs

use std::future::Future;
use std::io;

/// A current-thread runtime for a worker that keeps issuing requests (and reuses pooled
/// connections) across several turns.
pub fn current_thread() -> io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread().enable_all().build()
}

/// Runs `future` to completion on a fresh current-thread runtime.
/// Used by worker threads that need async HTTP without owning a runtime themselves.
pub fn block_on<F: Future>(future: F) -> io::Result<F::Output> {
    Ok(current_thread()?.block_on(future))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_on_returns_output() {
        let value = block_on(async { 40 + 2 }).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_runtime_is_reusable() {
        let runtime = current_thread().unwrap();
        assert_eq!(runtime.block_on(async { 1 }), 1);
        assert_eq!(runtime.block_on(async { 2 }), 2);
    }
}
