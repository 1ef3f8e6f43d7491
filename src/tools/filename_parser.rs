use crate::error::PipelineError;
use std::path::Path;

/// `TAG_DESCRIPTION.ext` split on the first underscore of the stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub tag: String,
    pub description: String,
}

impl ParsedName {
    pub fn parse(file_name: &str) -> Result<Self, PipelineError> {
        let invalid = |reason| PipelineError::InvalidFilenameFormat {
            file_name: file_name.to_string(),
            reason,
        };

        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| invalid("no file stem"))?;

        let (tag, description) = stem.split_once('_').ok_or_else(|| invalid("no underscore"))?;
        if tag.is_empty() {
            return Err(invalid("empty tag"));
        }
        if description.is_empty() {
            return Err(invalid("empty description"));
        }

        Ok(Self {
            tag: tag.to_string(),
            description: description.to_string(),
        })
    }

    /// `#TAG description with spaces`
    #[must_use]
    pub fn caption(&self) -> String {
        format!("#{} {}", self.tag, self.description.replace('_', " "))
    }
}
