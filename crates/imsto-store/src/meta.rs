use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Engine-specific key-value metadata stored alongside an object.
///
/// Values written by [`Wagon::put`](crate::Wagon::put) always include the
/// engine name under [`Meta::ENGINE`] and the stored byte size under
/// [`Meta::SIZE`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meta(Map<String, Value>);

impl Meta {
    pub const ENGINE: &'static str = "engine";
    pub const SIZE: &'static str = "size";
    pub const KEY: &'static str = "key";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn engine(&self) -> Option<&str> {
        self.get_str(Self::ENGINE)
    }

    pub fn size(&self) -> Option<u64> {
        self.0.get(Self::SIZE).and_then(Value::as_u64)
    }

    /// Copy of `self` with the engine fields for a completed write.
    pub fn stamped(&self, engine: &str, key: &str, size: usize) -> Self {
        let mut out = self.clone();
        out.insert(Self::ENGINE, engine)
            .insert(Self::KEY, key)
            .insert(Self::SIZE, size as u64);
        out
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Meta {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
