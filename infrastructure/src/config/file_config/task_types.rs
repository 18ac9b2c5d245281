//! Task type definitions from TOML (`[task_types.<name>]` sections)
//!
//! ```toml
//! [task_types.find_table]
//! initial = true
//! required_submissions = 2
//! follow_on = ["transcribe_table"]
//! fields = { pages = "unordered_set" }
//!
//! [task_types.transcribe_table]
//! collection = "tables"
//! fields = { "rows" = "equals", "title" = "majority" }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tally_domain::task::DeclarativeTaskType;
use tally_domain::verification::FieldKinds;

/// One configured task type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTaskTypeConfig {
    /// Verifier kind by dotted field path (`""` is the submission root)
    pub fields: BTreeMap<String, String>,
    /// Submissions to collect; the global minimum applies when unset
    pub required_submissions: Option<usize>,
    /// Create a task of this type for every new document
    pub initial: bool,
    /// Types to create once a task of this type is verified
    pub follow_on: Vec<String>,
    /// Where verified answers are stored; the type name when unset
    pub collection: Option<String>,
}

impl FileTaskTypeConfig {
    pub fn to_task_type(&self, name: &str) -> DeclarativeTaskType {
        let mut task_type = DeclarativeTaskType::new(name).with_field_kinds(
            self.fields
                .iter()
                .map(|(path, kind)| (path.as_str(), kind.as_str()))
                .collect::<FieldKinds>(),
        );
        if let Some(n) = self.required_submissions {
            task_type = task_type.with_required_submissions(n);
        }
        if self.initial {
            task_type = task_type.initial();
        }
        for follow_on in &self.follow_on {
            task_type = task_type.with_follow_on(follow_on);
        }
        if let Some(collection) = &self.collection {
            task_type = task_type.with_collection(collection);
        }
        task_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_domain::task::TaskBehavior;

    #[test]
    fn test_task_type_deserialize() {
        let toml_str = r#"
[task_types.find_table]
initial = true
required_submissions = 3
follow_on = ["transcribe_table"]
fields = { pages = "unordered_set", "owner.name" = "majority" }
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        let find_table = &config.task_types["find_table"];
        assert!(find_table.initial);
        assert_eq!(find_table.required_submissions, Some(3));

        let task_type = find_table.to_task_type("find_table");
        assert!(task_type.is_initial());
        assert_eq!(task_type.required_submissions(), 3);
        assert_eq!(task_type.follow_on_types(), &["transcribe_table".to_string()]);
        assert_eq!(task_type.field_kinds().kind_at("owner.name"), Some("majority"));
        assert_eq!(task_type.collection(), "find_table");
    }

    #[test]
    fn test_collection_override() {
        let config = FileTaskTypeConfig {
            collection: Some("tables".to_string()),
            ..Default::default()
        };
        assert_eq!(config.to_task_type("t").collection(), "tables");
    }
}
