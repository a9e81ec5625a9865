//! Headless Document
//!
//! A per-thread document owning the `<html>` tree, an animation-frame queue
//! and an optional mutation log. Installing a document fixes the thread's
//! render environment to client mode.

use std::cell::{Cell, OnceCell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::{Node, NodeId};
use crate::error::Result;
use crate::render::seal_client;

/// A structural change recorded while observing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Insert { parent: NodeId, node: NodeId },
    Remove { parent: NodeId, node: NodeId },
    Replace { parent: NodeId, old: NodeId, new: NodeId },
}

thread_local! {
    static DOCUMENT: OnceCell<Document> = const { OnceCell::new() };
    static MUTATIONS: RefCell<Option<Vec<Mutation>>> = const { RefCell::new(None) };
}

pub(crate) fn record(mutation: Mutation) {
    MUTATIONS.with(|log| {
        if let Some(log) = log.borrow_mut().as_mut() {
            trace!(?mutation, "dom mutation");
            log.push(mutation);
        }
    });
}

/// Start recording structural mutations on this thread, discarding any
/// previous log.
pub fn observe_mutations() {
    MUTATIONS.with(|log| *log.borrow_mut() = Some(Vec::new()));
}

/// Drain the recorded mutations. Recording continues.
pub fn take_mutations() -> Vec<Mutation> {
    MUTATIONS.with(|log| log.borrow_mut().as_mut().map(std::mem::take).unwrap_or_default())
}

/// Stop recording mutations.
pub fn stop_observing() {
    MUTATIONS.with(|log| log.borrow_mut().take());
}

type FrameCallback = Box<dyn FnOnce()>;

struct DocumentInner {
    root: Node,
    head: Node,
    body: Node,
    frames: RefCell<IndexMap<u32, FrameCallback>>,
    next_frame: Cell<u32>,
}

/// The thread's document.
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

impl Document {
    fn new() -> Result<Self> {
        let root = Node::element("html");
        let head = Node::element("head");
        let body = Node::element("body");
        root.append_child(&head)?;
        root.append_child(&body)?;
        Ok(Self {
            inner: Rc::new(DocumentInner {
                root,
                head,
                body,
                frames: RefCell::new(IndexMap::new()),
                next_frame: Cell::new(1),
            }),
        })
    }

    /// Install the thread's document, or return the one already installed.
    ///
    /// Fails with [`crate::Error::EnvironmentSealed`] when this thread has
    /// already rendered in server mode.
    pub fn install() -> Result<Document> {
        if let Some(document) = Self::current() {
            return Ok(document);
        }
        seal_client()?;
        let document = Self::new()?;
        DOCUMENT.with(|slot| {
            let installed = slot.get_or_init(|| document);
            debug!("document installed");
            Ok(installed.clone())
        })
    }

    pub fn current() -> Option<Document> {
        DOCUMENT.with(|slot| slot.get().cloned())
    }

    pub fn document_element(&self) -> Node {
        self.inner.root.clone()
    }

    pub fn head(&self) -> Node {
        self.inner.head.clone()
    }

    pub fn body(&self) -> Node {
        self.inner.body.clone()
    }

    pub fn create_element(&self, tag: &str) -> Node {
        Node::element(tag)
    }

    pub fn create_text_node(&self, text: &str) -> Node {
        Node::text(text)
    }

    /// Queue `callback` for the next frame. Handles start at 1.
    pub fn request_animation_frame(&self, callback: impl FnOnce() + 'static) -> u32 {
        let handle = self.inner.next_frame.get();
        self.inner.next_frame.set(handle.wrapping_add(1).max(1));
        self.inner
            .frames
            .borrow_mut()
            .insert(handle, Box::new(callback));
        handle
    }

    pub fn cancel_animation_frame(&self, handle: u32) {
        self.inner.frames.borrow_mut().shift_remove(&handle);
    }

    /// Run every callback queued before this call. Returns how many ran.
    pub fn run_animation_frame(&self) -> usize {
        let frames = std::mem::take(&mut *self.inner.frames.borrow_mut());
        let count = frames.len();
        for callback in frames.into_values() {
            callback();
        }
        trace!(count, "animation frame");
        count
    }

    pub fn pending_frames(&self) -> usize {
        self.inner.frames.borrow().len()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("pending_frames", &self.pending_frames())
            .finish()
    }
}
