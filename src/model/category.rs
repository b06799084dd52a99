use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A flat category record. `parent_id == None` marks a root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "parent_id")]
    pub parent_id: Option<Uuid>,
    pub sequence: Option<i32>,
    pub status_id: i32,
    pub created_at: i64,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Column values written on insert and on update.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDraft {
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub sequence: Option<i32>,
    pub status_id: i32,
}

impl From<&Category> for CategoryDraft {
    fn from(c: &Category) -> Self {
        Self {
            name: c.name.clone(),
            parent_id: c.parent_id,
            sequence: c.sequence,
            status_id: c.status_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryPage {
    pub categories: Vec<Category>,
    pub total: i64,
    pub page: u64,
    pub limit: u64,
}

/// Roots travel as `""` on the wire.
mod parent_id {
    use serde::{Deserialize, Deserializer, Serializer};
    use uuid::Uuid;

    pub fn serialize<S: Serializer>(value: &Option<Uuid>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(id) => s.serialize_str(&id.to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Uuid>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => Uuid::parse_str(s)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
