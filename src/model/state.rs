use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::{fmt_model, take_string_field, BaseModel, Model, ModelKind};
use crate::error::Result;
use crate::storage::Store;

/// Geographic state a listing belongs to.
#[derive(Debug, Clone)]
pub struct State {
    pub base: BaseModel,
    pub name: String,
}

impl State {
    /// Create a fresh state and register it with the storage collaborator.
    pub fn new(store: &mut dyn Store, name: String) -> Result<Self> {
        let state = Self {
            base: BaseModel::fresh(),
            name,
        };
        store.register(&state)?;
        Ok(state)
    }

    /// Rebuild a state from its serialized form. Does not touch storage.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let mut base = BaseModel::from_map(map)?;
        let name = take_string_field(&mut base.extra, "name")?;
        Ok(Self { base, name })
    }
}

impl Model for State {
    fn kind(&self) -> ModelKind {
        ModelKind::State
    }

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }

    fn write_fields(&self, map: &mut Map<String, Value>) {
        map.insert("name".to_string(), Value::String(self.name.clone()));
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.base.id == other.base.id
    }
}

impl Eq for State {}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_model(self, f)
    }
}

impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for State {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        State::from_map(&map).map_err(serde::de::Error::custom)
    }
}
