//! Task ID generation
//!
//! All task IDs use the format: `{6-char-hex}-task-{slug}`
//! Example: `019430-task-water-the-plants`

/// Generate a task ID from a title
pub fn generate_task_id(title: &str) -> String {
    let uuid = uuid::Uuid::now_v7();
    let hex_prefix = &uuid.to_string()[..6];
    format!("{}-task-{}", hex_prefix, slugify(title))
}

/// Slugify a title for use in IDs
fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        // Strip apostrophes entirely, replace other non-alphanumeric with hyphens
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
                None
            } else {
                Some('-')
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Opaque task identity, immutable once assigned
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
    /// Create a new ID from a task title
    pub fn new(title: &str) -> Self {
        Self(generate_task_id(title))
    }

    /// Create from an existing ID string
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    /// Get the hex prefix (first 6 chars)
    pub fn hex_prefix(&self) -> &str {
        &self.0[..6]
    }

    /// Get the full ID string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for TaskId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_task_id() {
        let id = generate_task_id("Water The Plants");
        assert!(id.len() > 10);
        assert!(id.contains("-task-"));
        assert!(id.contains("water-the-plants"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Pay rent!"), "pay-rent");
        assert_eq!(slugify("Multiple   Spaces"), "multiple-spaces");
        // Apostrophes should be stripped, not converted to hyphens
        assert_eq!(slugify("don't forget"), "dont-forget");
    }

    #[test]
    fn test_task_id_parts() {
        let id = TaskId::from_string("019430-task-water-plants".to_string());
        assert_eq!(id.hex_prefix(), "019430");
        assert_eq!(id.as_str(), "019430-task-water-plants");
    }

    #[test]
    fn test_task_id_unique() {
        let a = TaskId::new("same title");
        let b = TaskId::new("same title");
        assert_ne!(a, b);
    }
}
