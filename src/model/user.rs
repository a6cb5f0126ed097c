use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::{fmt_model, take_string_field, BaseModel, Model, ModelKind};
use crate::error::Result;
use crate::storage::Store;

/// Account holder of the application.
#[derive(Debug, Clone)]
pub struct User {
    pub base: BaseModel,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    /// Create a fresh user and register it with the storage collaborator.
    pub fn new(store: &mut dyn Store, email: String, password: String) -> Result<Self> {
        let user = Self {
            base: BaseModel::fresh(),
            email,
            password,
            first_name: String::new(),
            last_name: String::new(),
        };
        store.register(&user)?;
        Ok(user)
    }

    /// Rebuild a user from its serialized form. Does not touch storage.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let mut base = BaseModel::from_map(map)?;
        let email = take_string_field(&mut base.extra, "email")?;
        let password = take_string_field(&mut base.extra, "password")?;
        let first_name = take_string_field(&mut base.extra, "first_name")?;
        let last_name = take_string_field(&mut base.extra, "last_name")?;

        Ok(Self {
            base,
            email,
            password,
            first_name,
            last_name,
        })
    }
}

impl Model for User {
    fn kind(&self) -> ModelKind {
        ModelKind::User
    }

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }

    fn write_fields(&self, map: &mut Map<String, Value>) {
        map.insert("email".to_string(), Value::String(self.email.clone()));
        map.insert("password".to_string(), Value::String(self.password.clone()));
        map.insert(
            "first_name".to_string(),
            Value::String(self.first_name.clone()),
        );
        map.insert(
            "last_name".to_string(),
            Value::String(self.last_name.clone()),
        );
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.base.id == other.base.id
    }
}

impl Eq for User {}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_model(self, f)
    }
}

impl Serialize for User {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for User {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        User::from_map(&map).map_err(serde::de::Error::custom)
    }
}
