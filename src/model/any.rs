use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::{fmt_model, BaseModel, Model, ModelKind, State, User, CLASS_KEY};
use crate::error::{HomebaseError, Result};

/// Union of the known record kinds, for tag-dispatched decoding.
#[derive(Debug, Clone)]
pub enum AnyModel {
    BaseModel(BaseModel),
    User(User),
    State(State),
}

impl AnyModel {
    /// Decode a serialized record, selecting the concrete kind by its type
    /// tag. Fails with [`HomebaseError::MissingTypeTag`] when the tag is
    /// absent and [`HomebaseError::UnknownKind`] when it names no known kind.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let tag = match map.get(CLASS_KEY) {
            Some(Value::String(s)) => s.as_str(),
            Some(other) => {
                return Err(HomebaseError::InvalidField {
                    field: CLASS_KEY,
                    value: other.to_string(),
                })
            }
            None => return Err(HomebaseError::MissingTypeTag),
        };

        let kind: ModelKind = tag
            .parse()
            .map_err(|_| HomebaseError::UnknownKind(tag.to_string()))?;

        Ok(match kind {
            ModelKind::BaseModel => AnyModel::BaseModel(BaseModel::from_map(map)?),
            ModelKind::User => AnyModel::User(User::from_map(map)?),
            ModelKind::State => AnyModel::State(State::from_map(map)?),
        })
    }
}

impl Model for AnyModel {
    fn kind(&self) -> ModelKind {
        match self {
            AnyModel::BaseModel(m) => m.kind(),
            AnyModel::User(m) => m.kind(),
            AnyModel::State(m) => m.kind(),
        }
    }

    fn base(&self) -> &BaseModel {
        match self {
            AnyModel::BaseModel(m) => m.base(),
            AnyModel::User(m) => m.base(),
            AnyModel::State(m) => m.base(),
        }
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        match self {
            AnyModel::BaseModel(m) => m.base_mut(),
            AnyModel::User(m) => m.base_mut(),
            AnyModel::State(m) => m.base_mut(),
        }
    }

    fn write_fields(&self, map: &mut Map<String, Value>) {
        match self {
            AnyModel::BaseModel(m) => m.write_fields(map),
            AnyModel::User(m) => m.write_fields(map),
            AnyModel::State(m) => m.write_fields(map),
        }
    }
}

/// Records of the family compare by id alone, whatever their kind.
impl PartialEq for AnyModel {
    fn eq(&self, other: &Self) -> bool {
        self.base().id == other.base().id
    }
}

impl Eq for AnyModel {}

impl fmt::Display for AnyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_model(self, f)
    }
}

impl Serialize for AnyModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AnyModel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        AnyModel::from_map(&map).map_err(serde::de::Error::custom)
    }
}
