//! Sequential handler pipeline

use std::sync::Arc;
use tracing::{debug, trace};

use super::Runtime;
use crate::context::Context;
use crate::errors::Result;

/// A pipeline step
///
/// Handlers get the runtime for stream and codec access plus the execution
/// context, and either succeed or stop the pipeline with an error.
pub type Handler = Arc<dyn Fn(&mut Runtime, &Context) -> Result<()> + Send + Sync>;

impl Runtime {
    /// Append `handler` to the pipeline
    ///
    /// Handlers run in the order they were added. The same handler may be
    /// added more than once.
    pub fn add_handler<F>(&mut self, handler: F)
    where
        F: Fn(&mut Runtime, &Context) -> Result<()> + Send + Sync + 'static,
    {
        self.handlers.push(Arc::new(handler));
    }

    /// Append an already shared handler
    pub fn add_shared_handler(&mut self, handler: Handler) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Whether at least one handler is registered
    pub fn runnable(&self) -> bool {
        !self.handlers.is_empty()
    }

    /// Run every handler in order, stopping at the first error
    ///
    /// The handler list is fixed when the run starts; handlers added by a
    /// running handler are kept for later runs but not executed by this one.
    /// Work done by handlers that already finished is not undone.
    ///
    /// `ctx` is passed through untouched. Unless
    /// [`RuntimeSettings::check_context_between_handlers`](super::RuntimeSettings)
    /// is set, cancellation is entirely up to the handlers.
    pub fn run(&mut self, ctx: &Context) -> Result<()> {
        let handlers = self.handlers.clone();
        debug!(handlers = handlers.len(), "running pipeline");

        for (index, handler) in handlers.iter().enumerate() {
            if self.settings.check_context_between_handlers {
                if let Err(e) = ctx.check() {
                    debug!(index, error = %e, "context done, stopping pipeline");
                    return Err(e);
                }
            }

            trace!(index, "invoking handler");
            if let Err(e) = handler(&mut *self, ctx) {
                debug!(index, error = %e, "handler failed, stopping pipeline");
                return Err(e);
            }
        }

        debug!("pipeline finished");
        Ok(())
    }
}
