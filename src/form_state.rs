//! Editable state for one audit section on the client side.
//!
//! `FormState` mirrors what a form component keeps between renders: the values the
//! user is editing and whether they differ from what the server last sent. Server
//! data always wins when it arrives; local edits only live until the next sync or
//! reset. Nothing here persists; `payload()` is what gets handed to the save call.

use serde_json::{Map, Value};

/// Field name to value, the shape of one section's data.
pub type FieldMap = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    section_key: String,
    defaults: FieldMap,
    // Last section data received from the server, if the source held the section.
    loaded: Option<FieldMap>,
    form_data: FieldMap,
    is_modified: bool,
}

impl FormState {
    /// Builds the state from the current source data, so a section that is already
    /// present is shown immediately instead of the defaults.
    pub fn new(source: &FieldMap, section_key: impl Into<String>, defaults: FieldMap) -> Self {
        let mut state = Self {
            section_key: section_key.into(),
            form_data: defaults.clone(),
            defaults,
            loaded: None,
            is_modified: false,
        };
        state.sync(source);
        state
    }

    /// Upstream data changed. The tracked section replaces the form wholesale; a
    /// missing section (or `null`, or a non-object value) falls back to defaults.
    /// Local edits are discarded either way.
    pub fn sync(&mut self, source: &FieldMap) {
        self.loaded = match source.get(&self.section_key) {
            Some(Value::Object(section)) => Some(section.clone()),
            _ => None,
        };
        self.form_data = self.baseline().clone();
        self.is_modified = false;
    }

    /// Switches the tracked section and re-syncs against `source`.
    pub fn track_section(&mut self, section_key: impl Into<String>, source: &FieldMap) {
        self.section_key = section_key.into();
        self.sync(source);
    }

    /// Overwrites a single field. Other fields are left untouched and the value is
    /// not validated.
    pub fn handle_change(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.form_data.insert(field.into(), value.into());
        self.is_modified = self.form_data != *self.baseline();
    }

    /// Drops local edits, back to the last loaded section data or the defaults.
    pub fn reset_form(&mut self) {
        self.form_data = self.baseline().clone();
        self.is_modified = false;
    }

    pub fn form_data(&self) -> &FieldMap {
        &self.form_data
    }

    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    pub fn section_key(&self) -> &str {
        &self.section_key
    }

    /// The body for `PUT /api/college/audit/{section}`.
    pub fn payload(&self) -> Value {
        Value::Object(self.form_data.clone())
    }

    fn baseline(&self) -> &FieldMap {
        self.loaded.as_ref().unwrap_or(&self.defaults)
    }
}
