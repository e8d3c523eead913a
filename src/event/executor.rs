//! Pluggable execution of event callbacks.

/// A unit of callback work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs event callbacks somewhere other than the reader task.
///
/// Without an executor, [`EventSocket`](super::EventSocket) calls handlers
/// inline, so a slow handler delays the next read.
pub trait CallbackExecutor: Send + Sync {
    /// Submit one callback for execution.
    fn execute(&self, task: Task);
}

/// Runs each callback on the runtime's blocking thread pool.
impl CallbackExecutor for tokio::runtime::Handle {
    fn execute(&self, task: Task) {
        drop(self.spawn_blocking(task));
    }
}

/// Any `Fn(Task)` closure, e.g. one that forwards into a channel or thread pool.
impl<F> CallbackExecutor for F
where
    F: Fn(Task) + Send + Sync,
{
    fn execute(&self, task: Task) {
        self(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[tokio::test]
    async fn test_handle_runs_task_on_blocking_pool() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let executor = tokio::runtime::Handle::current();

        executor.execute(Box::new(move || {
            let _ = tx.send(std::thread::current().id());
        }));

        let id = rx.await.unwrap();
        assert_ne!(id, std::thread::current().id());
    }

    #[test]
    fn test_closure_executor() {
        let (tx, rx) = mpsc::channel::<Task>();
        let tx = std::sync::Mutex::new(tx);
        let executor = move |task: Task| {
            tx.lock().unwrap().send(task).unwrap();
        };

        let (done_tx, done_rx) = mpsc::channel();
        executor.execute(Box::new(move || done_tx.send(42).unwrap()));

        let task = rx.recv().unwrap();
        assert!(done_rx.try_recv().is_err());
        task();
        assert_eq!(done_rx.recv().unwrap(), 42);
    }
}
