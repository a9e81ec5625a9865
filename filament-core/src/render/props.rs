//! Component props.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use super::Value;
use crate::error::Result;

/// Props in declaration order.
pub type Props = IndexMap<String, Value>;

/// A replacement for one prop.
#[derive(Clone)]
pub enum PropUpdate {
    Value(Value),
    /// Receives the previous (read) value.
    Map(Rc<dyn Fn(Value) -> Result<Value>>),
}

impl PropUpdate {
    pub fn map(f: impl Fn(Value) -> Result<Value> + 'static) -> Self {
        Self::Map(Rc::new(f))
    }
}

impl From<Value> for PropUpdate {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// The view of props handed to a component.
///
/// Reads go through reactive values: a thunk prop is called, derived
/// values and cells are read (and tracked). Clones share the same props.
#[derive(Clone, Default)]
pub struct PropsProxy {
    props: Rc<RefCell<Props>>,
}

impl PropsProxy {
    pub fn new(props: Props) -> Self {
        Self {
            props: Rc::new(RefCell::new(props)),
        }
    }

    /// Read a prop. Missing props read as [`Value::Null`].
    pub fn get(&self, key: &str) -> Result<Value> {
        let raw = self.raw(key);
        raw.map_or(Ok(Value::Null), |value| value.current())
    }

    /// The stored prop without reading through it.
    pub fn raw(&self, key: &str) -> Option<Value> {
        self.props.borrow().get(key).cloned()
    }

    /// A copy of every stored prop.
    pub fn raw_props(&self) -> Props {
        self.props.borrow().clone()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.props.borrow().contains_key(key)
    }

    pub fn children(&self) -> Result<Value> {
        self.get("children")
    }

    /// Children as a list, whatever shape they were passed in.
    pub fn child_list(&self) -> Vec<Value> {
        match self.raw("children") {
            Some(Value::List(items)) => items.to_vec(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![other],
        }
    }

    /// Overwrite a prop. Later reads return exactly `value`.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        self.props
            .borrow_mut()
            .insert(key.into(), Value::thunk(move || Ok(value.clone())));
    }

    /// Rebind a prop lazily, optionally from its previous value.
    ///
    /// The previous binding is read each time the new one is.
    pub fn update(&self, key: impl Into<String>, update: impl Into<PropUpdate>) {
        let key = key.into();
        let previous = self.raw(&key).unwrap_or(Value::Null);
        let update = update.into();
        let binding = Value::thunk(move || {
            let previous = previous.current()?;
            match &update {
                PropUpdate::Value(value) => value.current(),
                PropUpdate::Map(map) => map(previous),
            }
        });
        self.props.borrow_mut().insert(key, binding);
    }

    /// Fill props that were not passed at all.
    pub fn defaults<K, I>(&self, defaults: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut props = self.props.borrow_mut();
        for (key, value) in defaults {
            props.entry(key.into()).or_insert(value);
        }
    }
}

impl std::fmt::Debug for PropsProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.props.borrow().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;
    use crate::reactive::Signal;

    #[test]
    fn reads_through_thunks_and_cells() {
        let cell = Signal::new(Value::from(2));
        let proxy = PropsProxy::new(props! {
            "plain" => "text",
            "lazy" => Value::thunk(|| Ok(Value::from(1))),
            "cell" => &cell,
        });

        assert_eq!(proxy.get("plain").unwrap(), Value::from("text"));
        assert_eq!(proxy.get("lazy").unwrap(), Value::from(1));
        assert_eq!(proxy.get("cell").unwrap(), Value::from(2));
        assert_eq!(proxy.get("missing").unwrap(), Value::Null);
        assert!(matches!(proxy.raw("lazy"), Some(Value::Thunk(_))));
    }

    #[test]
    fn set_overwrites() {
        let proxy = PropsProxy::new(props! { "label" => "a" });
        proxy.set("label", "b");
        assert_eq!(proxy.get("label").unwrap(), Value::from("b"));
    }

    #[test]
    fn update_maps_the_previous_value() {
        let proxy = PropsProxy::new(props! { "text" => "Hello" });
        proxy.update(
            "text",
            PropUpdate::map(|previous| Ok(Value::from(format!("{previous} World")))),
        );
        assert_eq!(proxy.get("text").unwrap(), Value::from("Hello World"));

        proxy.update("text", Value::from("replaced"));
        assert_eq!(proxy.get("text").unwrap(), Value::from("replaced"));
    }

    #[test]
    fn update_stays_reactive() {
        let cell = Signal::new(Value::from(1));
        let proxy = PropsProxy::new(props! { "count" => &cell });
        proxy.update(
            "count",
            PropUpdate::map(|previous| Ok(Value::from(previous.as_f64().unwrap_or(0.0) * 10.0))),
        );

        cell.set(Value::from(4)).unwrap();
        assert_eq!(proxy.get("count").unwrap(), Value::from(40));
    }

    #[test]
    fn defaults_fill_missing_keys_only() {
        let proxy = PropsProxy::new(props! { "size" => "small" });
        proxy.defaults([("size", Value::from("large")), ("count", Value::from(0))]);

        assert_eq!(proxy.get("size").unwrap(), Value::from("small"));
        assert_eq!(proxy.get("count").unwrap(), Value::from(0));
    }
}
