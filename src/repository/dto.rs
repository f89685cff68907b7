use serde::Deserialize;
use serde_json::Value;

use crate::models::ClassEntry;

#[derive(Debug, Deserialize)]
pub struct ClassListResponse {
    #[serde(default)]
    pub classes: Vec<ClassDocument>,
}

/// A class as returned by the API; document stores hand out `_id` instead of `id`.
/// `_id` stays in [`ClassEntry::extra`] so updates echo it back.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct ClassDocument(pub ClassEntry);

impl From<ClassDocument> for ClassEntry {
    fn from(ClassDocument(mut entry): ClassDocument) -> Self {
        let document_id = entry
            .extra
            .get("_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        if let Some(id) = document_id {
            entry.id = id;
        }
        entry
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
