//! Ordered disease labels shared by every model output

use std::collections::HashSet;

use serde::Serialize;

use super::DomainError;

/// Ordered label list; index `i` names output `i` of every model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClassList(Vec<String>);

impl ClassList {
    pub fn new<I, S>(labels: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();

        if labels.is_empty() {
            return Err(DomainError::validation("Class list cannot be empty"));
        }

        let mut seen = HashSet::with_capacity(labels.len());
        for label in &labels {
            if label.trim().is_empty() {
                return Err(DomainError::validation("Class labels cannot be blank"));
            }
            if !seen.insert(label.as_str()) {
                return Err(DomainError::validation(format!(
                    "Duplicate class label '{}'",
                    label
                )));
            }
        }

        Ok(Self(labels))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_class_list() {
        let classes = ClassList::new(["Blight", "Rust", "GrayLeafSpot", "Healthy"]).unwrap();
        assert_eq!(classes.len(), 4);
        assert_eq!(classes.label(3), Some("Healthy"));
        assert_eq!(classes.label(4), None);
    }

    #[test]
    fn test_empty_class_list_rejected() {
        let result = ClassList::new(Vec::<String>::new());
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        let err = ClassList::new(["Rust", "Rust"]).unwrap_err();
        assert!(err.to_string().contains("Duplicate class label 'Rust'"));
    }
}
