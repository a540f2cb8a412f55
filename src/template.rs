//! Seed content for new notes.
use serde::{Deserialize, Serialize};

/// Reusable seed content for new notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub content: String,
}

impl Template {
    /// Builds a template whose id is derived from its name.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        Template {
            id: template_id(&name),
            name,
            content: content.into(),
        }
    }
}

/// Lower-cases the name and turns each whitespace run into a hyphen.
///
/// Leading and trailing whitespace become hyphens too, matching how the id
/// has always been derived; callers that want clean ids trim first.
pub fn template_id(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    let mut in_space = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_space {
                id.push('-');
            }
            in_space = true;
        } else {
            id.extend(ch.to_lowercase());
            in_space = false;
        }
    }
    id
}

/// The templates every fresh store starts with.
pub fn builtin_templates() -> Vec<Template> {
    vec![
        Template {
            id: "meeting".to_string(),
            name: "Meeting Notes".to_string(),
            content: "# Meeting: [Title]\n\n## Date: [Date]\n\n## Attendees\n- \n\n## Agenda\n1. \n\n## Notes\n\n## Action Items\n- [ ] ".to_string(),
        },
        Template {
            id: "journal".to_string(),
            name: "Daily Journal".to_string(),
            content: "# Journal Entry: [Date]\n\n## Mood\n\n## Highlights\n- \n\n## Thoughts\n\n## Goals for Tomorrow\n- ".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_id_from_name() {
        assert_eq!(template_id("Weekly Review"), "weekly-review");
        assert_eq!(template_id("Bug  \t Report"), "bug-report");
        assert_eq!(template_id("ÉTÉ Plans"), "été-plans");
    }

    #[test]
    fn test_builtins() {
        let builtins = builtin_templates();
        let ids: Vec<&str> = builtins.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["meeting", "journal"]);
        assert!(builtins[0].content.starts_with("# Meeting: [Title]"));
        assert!(builtins[1].content.contains("## Goals for Tomorrow"));
    }
}
