use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::close::CloseInfo;
use crate::error::Error;
use crate::event::executor::CallbackExecutor;

/// A registered event handler.
pub type Handler<A> = Arc<dyn Fn(A) + Send + Sync>;

/// The set of optional handlers of an event socket.
#[derive(Default, Clone)]
pub(crate) struct Handlers {
    pub(crate) text: Option<Handler<String>>,
    pub(crate) binary: Option<Handler<Vec<u8>>>,
    pub(crate) ping: Option<Handler<Vec<u8>>>,
    pub(crate) pong: Option<Handler<Vec<u8>>>,
    pub(crate) close: Option<Handler<CloseInfo>>,
    pub(crate) error: Option<Handler<Error>>,
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handlers")
            .field("text", &self.text.is_some())
            .field("binary", &self.binary.is_some())
            .field("ping", &self.ping.is_some())
            .field("pong", &self.pong.is_some())
            .field("close", &self.close.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

/// Call `handler` inline or through `executor`, logging instead of
/// propagating panics.
pub(crate) fn dispatch<A>(
    event: &'static str,
    handler: Option<&Handler<A>>,
    executor: Option<&Arc<dyn CallbackExecutor>>,
    arg: A,
) where
    A: Send + 'static,
{
    let Some(handler) = handler else {
        return;
    };

    match executor {
        None => call_guarded(event, handler, arg),
        Some(executor) => {
            let handler = Arc::clone(handler);
            let submitted = catch_unwind(AssertUnwindSafe(|| {
                executor.execute(Box::new(move || call_guarded(event, &handler, arg)));
            }));
            if let Err(panic) = submitted {
                tracing::error!(
                    event,
                    panic = panic_message(panic.as_ref()),
                    "callback executor rejected handler"
                );
            }
        }
    }
}

fn call_guarded<A>(event: &'static str, handler: &Handler<A>, arg: A) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(arg))) {
        tracing::error!(
            event,
            panic = panic_message(panic.as_ref()),
            "event handler panicked"
        );
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
