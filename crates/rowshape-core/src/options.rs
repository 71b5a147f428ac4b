use serde::{Deserialize, Serialize};

const DEFAULT_CONTEXT_LABEL: &str = "query";

///
/// MaterializeOptions
///
/// Per-query enumeration settings. Missing fields deserialize to defaults.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct MaterializeOptions {
    /// Route loading and fixup through the change tracker.
    pub tracking: bool,

    /// Label attached to iteration-failure diagnostics.
    pub context_label: String,

    /// Keep raw provider values in column read errors.
    pub detailed_errors: bool,

    /// Check plan column indices against the cursor right after open.
    pub validate_columns: bool,
}

impl MaterializeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_tracking(mut self, tracking: bool) -> Self {
        self.tracking = tracking;
        self
    }

    #[must_use]
    pub fn with_context_label(mut self, label: impl Into<String>) -> Self {
        self.context_label = label.into();
        self
    }

    #[must_use]
    pub const fn with_detailed_errors(mut self, detailed: bool) -> Self {
        self.detailed_errors = detailed;
        self
    }

    #[must_use]
    pub const fn with_validate_columns(mut self, validate: bool) -> Self {
        self.validate_columns = validate;
        self
    }
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self {
            tracking: false,
            context_label: DEFAULT_CONTEXT_LABEL.to_string(),
            detailed_errors: false,
            validate_columns: true,
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let options: MaterializeOptions =
            serde_json::from_str(r#"{ "tracking": true, "context_label": "blogs" }"#).unwrap();

        assert!(options.tracking);
        assert_eq!(options.context_label, "blogs");
        assert!(!options.detailed_errors);
        assert!(options.validate_columns);
    }

    #[test]
    fn builders_override_defaults() {
        let options = MaterializeOptions::new()
            .with_detailed_errors(true)
            .with_validate_columns(false);

        assert_eq!(options.context_label, DEFAULT_CONTEXT_LABEL);
        assert!(options.detailed_errors);
        assert!(!options.validate_columns);

        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(serde_json::from_str::<MaterializeOptions>(&json).unwrap(), options);
    }
}
