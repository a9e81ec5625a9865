//! Async rendering.
//!
//! [`suspense`] resolves its children on the current `tokio` [`LocalSet`]
//! and shows `fallback` until they are ready. Async components are awaited,
//! synchronous components are called, and tag elements have their children
//! resolved the same way, in order.
//!
//! [`LocalSet`]: tokio::task::LocalSet

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use futures_util::future::{FutureExt, LocalBoxFuture};
use tokio::runtime::Handle;
use tracing::error;

use crate::config::RenderOptions;
use crate::error::{Error, Result};
use crate::reactive::{untrack, ErrorHandler, Signal};
use crate::render::{
    create_element, current_error_handler, jsx_render, render_mode, Element, ElementType, Props,
    PropsProxy, RenderMode, Value,
};

/// Show `fallback` until every child has resolved, then the children.
///
/// On the server only `fallback` is rendered. On the client the children
/// resolve on the current [`LocalSet`](tokio::task::LocalSet); without a
/// tokio runtime this fails with [`Error::NoAsyncRuntime`]. A failure while
/// resolving is wrapped in [`Error::AsyncRejection`] and handed to the error
/// handler of the enclosing render, or logged when there is none.
pub fn suspense(props: PropsProxy) -> Result<Value> {
    let fallback = props.raw("fallback").unwrap_or(Value::Null);
    if render_mode() == RenderMode::Server {
        return Ok(fallback);
    }
    if Handle::try_current().is_err() {
        return Err(Error::NoAsyncRuntime);
    }

    let state = Signal::new(fallback);
    let on_error = current_error_handler();

    let children = props.child_list();
    let target = state.clone();
    let handler = on_error.clone();
    tokio::task::spawn_local(async move {
        let outcome = match resolve_async(children).await {
            Ok(resolved) => target.set(Value::list(resolved)),
            Err(err) => Err(Error::AsyncRejection(Box::new(err))),
        };
        if let Err(err) = outcome {
            reject(err, handler.as_ref());
        }
    });

    Ok(Value::thunk(move || {
        let content = create_element(ElementType::Fragment, Props::new(), vec![state.get()]);
        let options = RenderOptions::default().with_error_handler(on_error.clone());
        untrack(|| jsx_render(&content, &options))
    }))
}

fn reject(err: Error, handler: Option<&ErrorHandler<Value>>) {
    let unhandled = match handler {
        Some(handler) => handler(err).err(),
        None => Some(err),
    };
    if let Some(err) = unhandled {
        error!(%err, "unhandled async rejection");
    }
}

fn resolve_async(children: Vec<Value>) -> LocalBoxFuture<'static, Result<Vec<Value>>> {
    async move {
        let mut resolved = Vec::with_capacity(children.len());
        for child in children {
            let element = match child {
                Value::Element(element) => element,
                other => {
                    resolved.push(other);
                    continue;
                }
            };
            let proxy = || PropsProxy::new(element.props.clone());
            let value = match &element.kind {
                ElementType::Async(component) => component(proxy()).await?,
                ElementType::Component(component) => component(proxy())?,
                ElementType::Tag(_) | ElementType::Fragment => match element.children() {
                    Some(Value::List(items)) => {
                        let children = resolve_async(items.to_vec()).await?;
                        let mut props = element.props.clone();
                        props.insert("children".to_string(), Value::list(children));
                        Value::Element(Rc::new(Element {
                            kind: element.kind.clone(),
                            props,
                        }))
                    }
                    _ => Value::Element(Rc::clone(&element)),
                },
            };
            resolved.push(value);
        }
        Ok::<_, Error>(resolved)
    }
    .boxed_local()
}

/// An async component that loads its implementation on first render.
///
/// The loaded component is cached; later renders reuse it with their own
/// props.
///
/// ```rust,ignore
/// let settings = lazy(|_| async { Ok(ElementType::component(settings_page)) });
/// h(ElementType::component(suspense), props! { "fallback" => "Loading" }, vec![
///     h(settings, props! {}, vec![]),
/// ])
/// ```
pub fn lazy<F, Fut>(loader: F) -> ElementType
where
    F: Fn(PropsProxy) -> Fut + 'static,
    Fut: Future<Output = Result<ElementType>> + 'static,
{
    let loader = Rc::new(loader);
    let loaded: Rc<RefCell<Option<ElementType>>> = Rc::default();
    ElementType::async_component(move |props: PropsProxy| {
        let (loader, loaded) = (Rc::clone(&loader), Rc::clone(&loaded));
        async move {
            let cached = loaded.borrow().clone();
            let kind = match cached {
                Some(kind) => kind,
                None => {
                    let kind = loader(props.clone()).await?;
                    *loaded.borrow_mut() = Some(kind.clone());
                    kind
                }
            };
            Ok::<_, Error>(Value::Element(Rc::new(Element::new(kind, props.raw_props()))))
        }
    })
}
