//! Knowledge base
//!
//! Faculty-authored topics and document metadata. Each collection lives as
//! one JSON array under a fixed key in a [`CollectionStore`]; a key that was
//! never written reads as the seed collection.

mod seed;

use crate::error::{Error, Result};
use crate::store::CollectionStore;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Store key for topics.
pub const TOPICS_KEY: &str = "knowledgeBase";
/// Store key for document metadata.
pub const DOCUMENTS_KEY: &str = "documents";

/// Subjects offered for categorization.
pub const SUBJECTS: &[&str] = &[
    "Mathematics",
    "Physics",
    "Chemistry",
    "Biology",
    "Computer Science",
    "History",
    "Literature",
    "Economics",
    "Business",
    "Art",
    "Music",
    "Other",
];

/// A written explanation of one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseItem {
    pub id: u64,
    pub topic: String,
    pub explanation: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Topic fields supplied by the author; id and date are assigned on insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTopic {
    pub topic: String,
    pub explanation: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub faculty_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Excel,
    Word,
    Other,
}

impl FileType {
    /// Guess the type from a file name's extension.
    pub fn from_file_name(name: &str) -> Self {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => FileType::Pdf,
            "xls" | "xlsx" | "csv" => FileType::Excel,
            "doc" | "docx" => FileType::Word,
            _ => FileType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Excel => "excel",
            FileType::Word => "word",
            FileType::Other => "other",
        }
    }
}

impl std::str::FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(FileType::Pdf),
            "excel" => Ok(FileType::Excel),
            "word" => Ok(FileType::Word),
            "other" => Ok(FileType::Other),
            _ => Err(format!("unknown file type: {}", s)),
        }
    }
}

/// Metadata for an uploaded course document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFile {
    pub id: u64,
    pub file_name: String,
    pub file_type: FileType,
    pub file_url: String,
    pub upload_date: String,
    pub subject: String,
    pub faculty_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub size: String,
}

/// Document fields supplied by the uploader; id is assigned on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    pub file_name: String,
    pub file_type: FileType,
    pub file_url: String,
    pub upload_date: String,
    pub subject: String,
    pub faculty_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub size: String,
}

/// Topics and documents over a collection store.
pub struct KnowledgeBase {
    store: Arc<dyn CollectionStore>,
}

impl KnowledgeBase {
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { store }
    }

    // ============================================
    // Topics
    // ============================================

    pub fn topics(&self) -> Result<Vec<KnowledgeBaseItem>> {
        self.load(TOPICS_KEY, seed::topics)
    }

    /// Insert a topic with the next id and today's date.
    pub fn add_topic(&self, topic: NewTopic) -> Result<KnowledgeBaseItem> {
        let mut topics = self.topics()?;
        let item = KnowledgeBaseItem {
            id: next_id(topics.iter().map(|t| t.id))?,
            topic: topic.topic,
            explanation: topic.explanation,
            image_url: topic.image_url,
            subject: topic.subject,
            faculty_name: topic.faculty_name,
            date: Some(Utc::now().format("%Y-%m-%d").to_string()),
        };
        topics.push(item.clone());
        self.save(TOPICS_KEY, &topics)?;
        tracing::info!(id = item.id, topic = %item.topic, "Added topic");
        Ok(item)
    }

    /// Replace the topic with the same id.
    pub fn update_topic(&self, item: KnowledgeBaseItem) -> Result<()> {
        let mut topics = self.topics()?;
        let slot = topics
            .iter_mut()
            .find(|t| t.id == item.id)
            .ok_or_else(|| Error::NotFound(format!("topic {}", item.id)))?;
        *slot = item;
        self.save(TOPICS_KEY, &topics)
    }

    pub fn delete_topic(&self, id: u64) -> Result<()> {
        let mut topics = self.topics()?;
        let before = topics.len();
        topics.retain(|t| t.id != id);
        if topics.len() == before {
            return Err(Error::NotFound(format!("topic {}", id)));
        }
        self.save(TOPICS_KEY, &topics)?;
        tracing::info!(id, "Deleted topic");
        Ok(())
    }

    pub fn topics_by_subject(&self, subject: &str) -> Result<Vec<KnowledgeBaseItem>> {
        Ok(self
            .topics()?
            .into_iter()
            .filter(|t| t.subject.as_deref() == Some(subject))
            .collect())
    }

    // ============================================
    // Documents
    // ============================================

    pub fn documents(&self) -> Result<Vec<DocumentFile>> {
        self.load(DOCUMENTS_KEY, seed::documents)
    }

    /// Insert a document with the next id.
    pub fn add_document(&self, doc: NewDocument) -> Result<DocumentFile> {
        let mut docs = self.documents()?;
        let file = DocumentFile {
            id: next_id(docs.iter().map(|d| d.id))?,
            file_name: doc.file_name,
            file_type: doc.file_type,
            file_url: doc.file_url,
            upload_date: doc.upload_date,
            subject: doc.subject,
            faculty_name: doc.faculty_name,
            description: doc.description,
            keywords: doc.keywords,
            size: doc.size,
        };
        docs.push(file.clone());
        self.save(DOCUMENTS_KEY, &docs)?;
        tracing::info!(id = file.id, file = %file.file_name, "Added document");
        Ok(file)
    }

    /// Replace the document with the same id.
    pub fn update_document(&self, file: DocumentFile) -> Result<()> {
        let mut docs = self.documents()?;
        let slot = docs
            .iter_mut()
            .find(|d| d.id == file.id)
            .ok_or_else(|| Error::NotFound(format!("document {}", file.id)))?;
        *slot = file;
        self.save(DOCUMENTS_KEY, &docs)
    }

    pub fn delete_document(&self, id: u64) -> Result<()> {
        let mut docs = self.documents()?;
        let before = docs.len();
        docs.retain(|d| d.id != id);
        if docs.len() == before {
            return Err(Error::NotFound(format!("document {}", id)));
        }
        self.save(DOCUMENTS_KEY, &docs)?;
        tracing::info!(id, "Deleted document");
        Ok(())
    }

    pub fn documents_by_subject(&self, subject: &str) -> Result<Vec<DocumentFile>> {
        Ok(self
            .documents()?
            .into_iter()
            .filter(|d| d.subject == subject)
            .collect())
    }

    pub fn documents_by_faculty(&self, faculty_name: &str) -> Result<Vec<DocumentFile>> {
        Ok(self
            .documents()?
            .into_iter()
            .filter(|d| d.faculty_name == faculty_name)
            .collect())
    }

    /// Documents where any query term occurs in a keyword, the file name,
    /// the description or the subject. A blank query returns everything.
    pub fn search_documents(&self, query: &str) -> Result<Vec<DocumentFile>> {
        let docs = self.documents()?;
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return Ok(docs);
        }
        Ok(docs
            .into_iter()
            .filter(|doc| document_matches(doc, &terms))
            .collect())
    }

    fn load<T: DeserializeOwned>(&self, key: &str, seed: fn() -> Vec<T>) -> Result<Vec<T>> {
        match self.store.load(key)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(seed()),
        }
    }

    fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let raw = serde_json::to_string(items)?;
        self.store.save(key, &raw)
    }
}

fn next_id(ids: impl Iterator<Item = u64>) -> Result<u64> {
    match ids.max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| Error::Validation(format!("no id left after {}", max))),
    }
}

fn document_matches(doc: &DocumentFile, terms: &[String]) -> bool {
    let contains = |haystack: &str| {
        let haystack = haystack.to_lowercase();
        terms.iter().any(|term| haystack.contains(term.as_str()))
    };
    doc.keywords.iter().any(|k| contains(k))
        || contains(&doc.file_name)
        || doc.description.as_deref().is_some_and(contains)
        || contains(&doc.subject)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::new(Arc::new(MemoryStore::new()))
    }

    fn new_doc(name: &str) -> NewDocument {
        NewDocument {
            file_name: name.to_string(),
            file_type: FileType::from_file_name(name),
            file_url: format!("/files/{}", name),
            upload_date: "2024-01-10".to_string(),
            subject: "Mathematics".to_string(),
            faculty_name: "Dr. Emmy Noether".to_string(),
            description: Some("Worked examples on rings".to_string()),
            keywords: vec!["algebra".to_string(), "rings".to_string()],
            size: "512 KB".to_string(),
        }
    }

    #[test]
    fn test_empty_store_reads_seed() {
        let kb = kb();
        assert_eq!(kb.topics().unwrap().len(), 3);
        assert_eq!(kb.documents().unwrap().len(), 3);
    }

    #[test]
    fn test_add_topic_assigns_next_id_and_date() {
        let kb = kb();
        let item = kb
            .add_topic(NewTopic {
                topic: "Photosynthesis".to_string(),
                explanation: "Light to sugar.".to_string(),
                subject: Some("Biology".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(item.id, 4);
        assert_eq!(item.date.as_deref().map(str::len), Some(10));
        assert_eq!(kb.topics_by_subject("Biology").unwrap().len(), 2);
    }

    #[test]
    fn test_add_rejected_when_ids_exhausted() {
        let store = Arc::new(MemoryStore::new());
        let kb = KnowledgeBase::new(store.clone());
        let mut topics = kb.topics().unwrap();
        topics[2].id = u64::MAX;
        let raw = serde_json::to_string(&topics).unwrap();
        store.save(TOPICS_KEY, &raw).unwrap();

        let err = kb
            .add_topic(NewTopic {
                topic: "Overflow".to_string(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.load(TOPICS_KEY).unwrap().as_deref(), Some(raw.as_str()));
    }

    #[test]
    fn test_add_after_deleting_everything_starts_at_one() {
        let kb = kb();
        for id in 1..=3 {
            kb.delete_document(id).unwrap();
        }
        assert!(kb.documents().unwrap().is_empty());
        let doc = kb.add_document(new_doc("rings.pdf")).unwrap();
        assert_eq!(doc.id, 1);
        assert_eq!(doc.file_type, FileType::Pdf);
    }

    #[test]
    fn test_update_and_delete_missing_ids() {
        let kb = kb();
        let mut topic = kb.topics().unwrap().remove(0);
        topic.id = 99;
        assert!(matches!(kb.update_topic(topic), Err(Error::NotFound(_))));
        assert!(matches!(kb.delete_topic(99), Err(Error::NotFound(_))));
        assert!(matches!(kb.delete_document(99), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_update_document_persists() {
        let kb = kb();
        let mut doc = kb.documents().unwrap().remove(2);
        doc.size = "2.0 MB".to_string();
        kb.update_document(doc).unwrap();
        assert_eq!(kb.documents().unwrap()[2].size, "2.0 MB");
    }

    #[test]
    fn test_search_matches_any_term_in_any_field() {
        let kb = kb();
        let names = |q: &str| -> Vec<u64> {
            kb.search_documents(q).unwrap().iter().map(|d| d.id).collect()
        };
        assert_eq!(names("   ").len(), 3);
        assert_eq!(names("QUANTUM"), vec![1]);
        assert_eq!(names("neural organelles"), vec![2, 3]);
        assert_eq!(names("xlsx"), vec![3]);
        assert_eq!(names("applications"), vec![2]);
        assert_eq!(names("computer"), vec![2]);
        assert!(names("geology").is_empty());
    }

    #[test]
    fn test_filters_by_subject_and_faculty() {
        let kb = kb();
        assert_eq!(kb.documents_by_subject("Physics").unwrap().len(), 1);
        assert_eq!(kb.documents_by_faculty("Dr. Andrew Ng").unwrap()[0].id, 2);
        assert!(kb.documents_by_faculty("Nobody").unwrap().is_empty());
    }

    #[test]
    fn test_blob_uses_camel_case_keys() {
        let store = Arc::new(MemoryStore::new());
        let kb = KnowledgeBase::new(store.clone());
        kb.add_document(new_doc("notes.docx")).unwrap();
        let raw = store.load(DOCUMENTS_KEY).unwrap().unwrap();
        assert!(raw.contains("\"fileName\":\"notes.docx\""));
        assert!(raw.contains("\"fileType\":\"word\""));
    }

    #[test]
    fn test_file_type_from_name() {
        assert_eq!(FileType::from_file_name("a.XLSX"), FileType::Excel);
        assert_eq!(FileType::from_file_name("README"), FileType::Other);
    }
}
