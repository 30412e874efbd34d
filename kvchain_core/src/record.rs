use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One contact-form submission.
///
/// Records are immutable once created. Field order here is the serialized
/// key order, so a collection always serializes to the same text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Record {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub subject: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub timestamp: DateTime<Utc>,
}

impl Record {
    /// Build a record stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        email: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            surname: surname.into(),
            email: email.into(),
            subject: subject.into(),
            body: body.into(),
            category: None,
            tags: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Check the record's shape. Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("name", &self.name),
            ("surname", &self.surname),
            ("subject", &self.subject),
            ("body", &self.body),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{field} is blank"));
            }
        }

        match self.email.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {}
            _ => return Err(format!("email {:?} is not an address", self.email)),
        }

        if let Some(category) = &self.category {
            if category.trim().is_empty() {
                return Err("category is present but blank".to_string());
            }
        }
        if let Some(tags) = &self.tags {
            if let Some(pos) = tags.iter().position(|t| t.trim().is_empty()) {
                return Err(format!("tag {pos} is blank"));
            }
        }
        Ok(())
    }
}
