mod any;
mod state;
mod user;

pub use any::AnyModel;
pub use state::State;
pub use user::User;

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{HomebaseError, Result};
use crate::storage::Store;

/// Key under which a serialized record carries its type tag.
pub const CLASS_KEY: &str = "__class__";

/// Wire format for timestamps: ISO-8601 with microsecond precision, no offset.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Current time truncated to the wire format's microsecond resolution, so
/// that a serialize/reconstruct round trip is exact.
fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Render a timestamp in the wire format.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a wire-format timestamp, interpreted as UTC.
pub fn parse_timestamp(field: &'static str, raw: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|source| HomebaseError::InvalidTimestamp { field, source })
}

/// The known record kinds. The serialized type tag is always the concrete
/// type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    BaseModel,
    User,
    State,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::BaseModel => write!(f, "BaseModel"),
            ModelKind::User => write!(f, "User"),
            ModelKind::State => write!(f, "State"),
        }
    }
}

impl std::str::FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "BaseModel" => Ok(ModelKind::BaseModel),
            "User" => Ok(ModelKind::User),
            "State" => Ok(ModelKind::State),
            _ => Err(format!("Unknown model kind: {}", s)),
        }
    }
}

/// A persistable record of the model family.
pub trait Model {
    /// Concrete kind of this record, used as the serialized type tag.
    fn kind(&self) -> ModelKind;

    /// Shared fields of the record family.
    fn base(&self) -> &BaseModel;

    fn base_mut(&mut self) -> &mut BaseModel;

    /// Append the concrete type's own fields to a serialized map.
    fn write_fields(&self, _map: &mut Map<String, Value>) {}

    /// Record identifier.
    fn id(&self) -> &str {
        &self.base().id
    }

    /// Key under which the storage collaborator tracks this record.
    fn storage_key(&self) -> String {
        format!("{}.{}", self.kind(), self.base().id)
    }

    /// Every attribute of the record, timestamps rendered as wire-format text.
    fn attribute_map(&self) -> Map<String, Value> {
        let mut map = self.base().field_map();
        self.write_fields(&mut map);
        map
    }

    /// Serialized form of the record: all attributes plus the type tag.
    /// Exact inverse of the matching `from_map`.
    fn to_map(&self) -> Map<String, Value> {
        let mut map = self.attribute_map();
        map.insert(CLASS_KEY.to_string(), Value::String(self.kind().to_string()));
        map
    }

    /// Refresh `updated_at`, re-register the record's current state with the
    /// collaborator, then ask it to persist all tracked records.
    fn save(&mut self, store: &mut dyn Store) -> Result<()>
    where
        Self: Sized,
    {
        self.base_mut().touch();
        store.register(&*self)?;
        store.persist()
    }
}

/// Shared fields of every record, and itself the plain record kind.
#[derive(Debug, Clone)]
pub struct BaseModel {
    /// Unique identifier. Never reassigned after construction.
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every save. Expected to stay at or above `created_at`;
    /// reconstruction accepts historical data as-is.
    pub updated_at: DateTime<Utc>,
    /// Attributes carried through reconstruction that no schema claims.
    pub extra: Map<String, Value>,
}

impl BaseModel {
    /// Create a fresh record and register it with the storage collaborator.
    pub fn new(store: &mut dyn Store) -> Result<Self> {
        let model = Self::fresh();
        store.register(&model)?;
        Ok(model)
    }

    pub(crate) fn fresh() -> Self {
        let now = now_micros();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            extra: Map::new(),
        }
    }

    /// Rebuild a record from its serialized form.
    ///
    /// Does not touch storage: the caller is reloading state that already
    /// exists in the persisted store. The type tag is discarded if present;
    /// unknown keys land in `extra` verbatim.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let now = now_micros();

        let id = match map.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(HomebaseError::InvalidField {
                    field: "id",
                    value: other.to_string(),
                })
            }
            None => Uuid::new_v4().to_string(),
        };

        let created_at = match map.get("created_at") {
            Some(Value::String(s)) => parse_timestamp("created_at", s)?,
            Some(other) => {
                return Err(HomebaseError::InvalidField {
                    field: "created_at",
                    value: other.to_string(),
                })
            }
            None => now,
        };

        let updated_at = match map.get("updated_at") {
            Some(Value::String(s)) => parse_timestamp("updated_at", s)?,
            Some(other) => {
                return Err(HomebaseError::InvalidField {
                    field: "updated_at",
                    value: other.to_string(),
                })
            }
            None => now,
        };

        let mut extra = Map::new();
        for (key, value) in map {
            if !matches!(key.as_str(), "id" | "created_at" | "updated_at" | CLASS_KEY) {
                extra.insert(key.clone(), value.clone());
            }
        }

        Ok(Self {
            id,
            created_at,
            updated_at,
            extra,
        })
    }

    /// Set `updated_at` to the current time.
    pub fn touch(&mut self) {
        self.updated_at = now_micros();
    }

    pub(crate) fn field_map(&self) -> Map<String, Value> {
        let mut map = self.extra.clone();
        map.insert("id".to_string(), Value::String(self.id.clone()));
        map.insert(
            "created_at".to_string(),
            Value::String(format_timestamp(&self.created_at)),
        );
        map.insert(
            "updated_at".to_string(),
            Value::String(format_timestamp(&self.updated_at)),
        );
        map
    }
}

impl Model for BaseModel {
    fn kind(&self) -> ModelKind {
        ModelKind::BaseModel
    }

    fn base(&self) -> &BaseModel {
        self
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        self
    }
}

impl PartialEq for BaseModel {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for BaseModel {}

impl fmt::Display for BaseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_model(self, f)
    }
}

impl Serialize for BaseModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BaseModel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        BaseModel::from_map(&map).map_err(serde::de::Error::custom)
    }
}

/// `[<Kind>] (<id>) <attributes-as-map>`, diagnostic only.
pub(crate) fn fmt_model(model: &dyn Model, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
        f,
        "[{}] ({}) {}",
        model.kind(),
        model.id(),
        Value::Object(model.attribute_map())
    )
}

/// Remove a typed string field from a reconstruction `extra` map, defaulting
/// to empty when absent.
pub(crate) fn take_string_field(
    extra: &mut Map<String, Value>,
    field: &'static str,
) -> Result<String> {
    match extra.remove(field) {
        None => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(HomebaseError::InvalidField {
            field,
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{Duration, TimeZone, Utc};
    use serde_json::{json, Value};

    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_fresh_model_has_valid_uuid_id() {
        let mut store = MemoryStore::new();
        let model = BaseModel::new(&mut store).unwrap();
        assert!(Uuid::parse_str(&model.id).is_ok());
    }

    #[test]
    fn test_fresh_ids_are_unique() {
        let mut store = MemoryStore::new();
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let model = BaseModel::new(&mut store).unwrap();
            assert!(seen.insert(model.id));
        }
    }

    #[test]
    fn test_fresh_timestamps_match() {
        let mut store = MemoryStore::new();
        let model = BaseModel::new(&mut store).unwrap();
        assert_eq!(model.created_at, model.updated_at);
    }

    #[test]
    fn test_new_registers_with_store() {
        let mut store = MemoryStore::new();
        let model = BaseModel::new(&mut store).unwrap();

        assert_eq!(store.len(), 1);
        let tracked = store.get(&model.storage_key()).unwrap();
        assert_eq!(tracked.get("id"), Some(&Value::String(model.id.clone())));
    }

    #[test]
    fn test_storage_key_format() {
        let mut store = MemoryStore::new();
        let model = BaseModel::new(&mut store).unwrap();
        assert_eq!(model.storage_key(), format!("BaseModel.{}", model.id));
    }

    #[test]
    fn test_reconstruction_from_serialized_fields() {
        let value = json!({
            "id": "abc-123",
            "created_at": "2024-01-02T03:04:05.000000",
            "updated_at": "2024-01-02T03:04:06.000000",
            "name": "x",
        });
        let model = BaseModel::from_map(value.as_object().unwrap()).unwrap();

        assert_eq!(model.id, "abc-123");
        assert_eq!(model.extra.get("name"), Some(&json!("x")));
        let created = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(model.created_at, created);
        assert_eq!(model.updated_at, created + Duration::seconds(1));
    }

    #[test]
    fn test_reconstruction_discards_type_tag() {
        let value = json!({"__class__": "BaseModel", "id": "abc-123"});
        let model = BaseModel::from_map(value.as_object().unwrap()).unwrap();
        assert!(model.extra.is_empty());
    }

    #[test]
    fn test_reconstruction_defaults_missing_fields() {
        let value = json!({"name": "x"});
        let model = BaseModel::from_map(value.as_object().unwrap()).unwrap();

        assert!(Uuid::parse_str(&model.id).is_ok());
        assert_eq!(model.created_at, model.updated_at);
        assert_eq!(model.extra.get("name"), Some(&json!("x")));
    }

    #[test]
    fn test_reconstruction_rejects_malformed_timestamp() {
        let value = json!({"created_at": "2024-01-02 03:04:05"});
        let result = BaseModel::from_map(value.as_object().unwrap());
        assert!(matches!(
            result,
            Err(HomebaseError::InvalidTimestamp {
                field: "created_at",
                ..
            })
        ));
    }

    #[test]
    fn test_reconstruction_rejects_non_string_id() {
        let value = json!({"id": 42});
        let result = BaseModel::from_map(value.as_object().unwrap());
        assert!(matches!(
            result,
            Err(HomebaseError::InvalidField { field: "id", .. })
        ));
    }

    #[test]
    fn test_round_trip_preserves_record() {
        let mut store = MemoryStore::new();
        let mut model = BaseModel::new(&mut store).unwrap();
        model.extra.insert("name".to_string(), json!("Alameda"));

        let rebuilt = BaseModel::from_map(&model.to_map()).unwrap();
        assert_eq!(rebuilt.id, model.id);
        assert_eq!(rebuilt.created_at, model.created_at);
        assert_eq!(rebuilt.updated_at, model.updated_at);
        assert_eq!(rebuilt.extra, model.extra);
    }

    #[test]
    fn test_save_bumps_updated_at_and_flushes() {
        let mut store = MemoryStore::new();
        let mut model = BaseModel::new(&mut store).unwrap();
        let before = model.updated_at;

        std::thread::sleep(std::time::Duration::from_millis(2));
        model.save(&mut store).unwrap();

        assert!(model.updated_at > before);
        assert_eq!(store.persisted_len(), 1);
        let persisted = store.persisted(&model.storage_key()).unwrap();
        assert_eq!(
            persisted.get("updated_at"),
            Some(&Value::String(format_timestamp(&model.updated_at)))
        );
    }

    #[test]
    fn test_equality_is_by_id() {
        let mut store = MemoryStore::new();
        let a = BaseModel::new(&mut store).unwrap();
        let b = BaseModel::new(&mut store).unwrap();

        assert_ne!(a, b);
        assert_eq!(a, a.clone());

        let mut rebuilt = BaseModel::from_map(&a.to_map()).unwrap();
        rebuilt.extra.insert("name".to_string(), json!("different"));
        rebuilt.touch();
        assert_eq!(a, rebuilt);
    }

    #[test]
    fn test_type_tag_matches_kind() {
        let mut store = MemoryStore::new();
        let model = BaseModel::new(&mut store).unwrap();
        assert_eq!(model.to_map().get(CLASS_KEY), Some(&json!("BaseModel")));
    }

    #[test]
    fn test_display_representation() {
        let mut store = MemoryStore::new();
        let model = BaseModel::new(&mut store).unwrap();

        let rendered = model.to_string();
        assert!(rendered.starts_with(&format!("[BaseModel] ({})", model.id)));
        assert!(rendered.contains("created_at"));
    }

    #[test]
    fn test_timestamp_format_round_trip() {
        let now = now_micros();
        let parsed = parse_timestamp("created_at", &format_timestamp(&now)).unwrap();
        assert_eq!(parsed, now);
    }

    #[test]
    fn test_model_kind_parse() {
        assert_eq!("User".parse::<ModelKind>().unwrap(), ModelKind::User);
        assert!("Review".parse::<ModelKind>().is_err());
    }
}
