//! Task spawning helpers
//!
//! All background work of the controller goes through [`spawn`], which needs
//! to be called from inside a tokio runtime context (the entry point runs the
//! UI inside `Runtime::block_on`, tests use `#[tokio::test]`).

/// Spawn an async task on the current tokio runtime.
pub fn spawn<F>(future: F) -> tokio::task::JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    // Tag the task with its future type so profiler traces can be filtered by task kind.
    #[cfg(feature = "profiling")]
    {
        tokio::spawn(async move {
            profiling::scope!(
                "runtime::spawn",
                format!("task_type={}", std::any::type_name::<F>()).as_str()
            );
            future.await
        })
    }
    #[cfg(not(feature = "profiling"))]
    {
        tokio::spawn(future)
    }
}

/// Check if we're running inside a tokio runtime context.
pub fn in_runtime_context() -> bool {
    tokio::runtime::Handle::try_current().is_ok()
}
