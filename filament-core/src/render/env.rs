//! Render environment.
//!
//! Each thread renders either into a document (client) or to markup
//! (server). The choice is made on first use and never changes: a thread
//! with an installed [`Document`] renders in client mode, any other thread
//! in server mode.

use std::cell::{OnceCell, RefCell};

use tracing::debug;

use super::client::{render_to_node, render_with_cleanup};
use super::server::render_to_string;
use super::Value;
use crate::config::RenderOptions;
use crate::dom::Document;
use crate::error::{Error, Result};
use crate::reactive::ErrorHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Client,
    Server,
}

thread_local! {
    static MODE: OnceCell<RenderMode> = const { OnceCell::new() };
    static ERROR_HANDLER: RefCell<Option<ErrorHandler<Value>>> = const { RefCell::new(None) };
}

/// The render mode of this thread, fixing it on first call.
pub fn render_mode() -> RenderMode {
    MODE.with(|mode| {
        *mode.get_or_init(|| {
            let selected = if Document::current().is_some() {
                RenderMode::Client
            } else {
                RenderMode::Server
            };
            debug!(mode = ?selected, "render environment selected");
            selected
        })
    })
}

/// Fix this thread to client mode.
pub(crate) fn seal_client() -> Result<()> {
    MODE.with(|mode| match mode.get() {
        Some(RenderMode::Server) => Err(Error::EnvironmentSealed),
        Some(RenderMode::Client) => Ok(()),
        None => {
            let _ = mode.set(RenderMode::Client);
            debug!(mode = ?RenderMode::Client, "render environment selected");
            Ok(())
        }
    })
}

/// The error handler of the innermost [`jsx_render`] in progress.
pub fn current_error_handler() -> Option<ErrorHandler<Value>> {
    ERROR_HANDLER.with(|slot| slot.borrow().clone())
}

struct HandlerGuard {
    previous: Option<ErrorHandler<Value>>,
}

impl HandlerGuard {
    fn install(handler: Option<ErrorHandler<Value>>) -> Self {
        let previous = ERROR_HANDLER.with(|slot| slot.replace(handler));
        Self { previous }
    }
}

impl Drop for HandlerGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        ERROR_HANDLER.with(|slot| {
            slot.replace(previous);
        });
    }
}

/// Render `value` for the current environment.
///
/// Client mode yields [`Value::Node`]; with `clean` set, the cleanups of
/// effects created during the render are attached to that node. Server mode
/// yields [`Value::Markup`]. `on_error` is visible to components through
/// [`current_error_handler`] for the duration of the call.
pub fn jsx_render(value: &Value, options: &RenderOptions) -> Result<Value> {
    let _guard = HandlerGuard::install(options.on_error.clone());
    match render_mode() {
        RenderMode::Client => {
            let node = if options.clean {
                render_with_cleanup(value, options)?
            } else {
                render_to_node(value, options)?
            };
            Ok(Value::Node(node))
        }
        RenderMode::Server => Ok(Value::Markup(render_to_string(value)?.into())),
    }
}
