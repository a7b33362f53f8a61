use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Payload of a generated file. Text is published as its UTF-8 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileContent {
    Text(String),
    Binary(Vec<u8>),
}

impl FileContent {
    pub fn as_bytes(&self) -> Cow<'_, [u8]> {
        match self {
            FileContent::Text(text) => Cow::Borrowed(text.as_bytes()),
            FileContent::Binary(bytes) => Cow::Borrowed(bytes.as_slice()),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for FileContent {
    fn from(text: String) -> Self {
        FileContent::Text(text)
    }
}

impl From<&str> for FileContent {
    fn from(text: &str) -> Self {
        FileContent::Text(text.to_string())
    }
}

impl From<Vec<u8>> for FileContent {
    fn from(bytes: Vec<u8>) -> Self {
        FileContent::Binary(bytes)
    }
}

/// One file produced for a round. A later round supersedes it by publishing
/// a file with the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub name: String,
    pub content: Option<FileContent>,
}

impl GeneratedFile {
    pub fn new(name: impl Into<String>, content: impl Into<FileContent>) -> Self {
        Self {
            name: name.into(),
            content: Some(content.into()),
        }
    }

    pub fn without_content(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: None,
        }
    }

    /// Publishable entries have a non-empty name and some content.
    pub fn is_publishable(&self) -> bool {
        !self.name.trim().is_empty() && self.content.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_content_bytes() {
        let content = FileContent::from("héllo");
        assert_eq!(content.as_bytes().as_ref(), "héllo".as_bytes());
        assert_eq!(content.len(), 6);
    }

    #[test]
    fn test_binary_content_bytes() {
        let content = FileContent::from(vec![0x89, 0x50, 0x4e, 0x47]);
        assert_eq!(content.as_bytes().as_ref(), &[0x89, 0x50, 0x4e, 0x47]);
        assert!(!content.is_empty());
    }

    #[test]
    fn test_publishable() {
        assert!(GeneratedFile::new("index.html", "<html></html>").is_publishable());
        assert!(GeneratedFile::new("empty.txt", "").is_publishable());
        assert!(!GeneratedFile::new("", "content").is_publishable());
        assert!(!GeneratedFile::new("   ", "content").is_publishable());
        assert!(!GeneratedFile::without_content("README.md").is_publishable());
    }
}
