use crate::data::persistence::{Format, Persistable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Date,
    Textarea,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FieldDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub placeholder: String,
}

impl FieldDef {
    pub fn new(name: &str, label: &str, kind: FieldKind, placeholder: &str) -> Self {
        FieldDef {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            placeholder: placeholder.to_string(),
        }
    }

    /// Label text, falling back to the field name.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }
}

/// Field list, read from the `fields` key of config.yaml.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FormSchema {
    #[serde(default = "default_fields")]
    pub fields: Vec<FieldDef>,
}

impl Default for FormSchema {
    fn default() -> Self {
        FormSchema {
            fields: default_fields(),
        }
    }
}

impl Persistable for FormSchema {
    fn filename() -> &'static str {
        "config.yaml"
    }
    fn format() -> Format {
        Format::Yaml
    }
}

pub fn default_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("caller", "Caller", FieldKind::Text, "Caller name"),
        FieldDef::new("effDate", "Eff Date", FieldKind::Date, "YYYY-MM-DD"),
        FieldDef::new("policy", "Policy #", FieldKind::Text, "Policy number"),
        FieldDef::new("notes", "Notes", FieldKind::Textarea, "Details..."),
    ]
}

/// Current field values keyed by field name. Date fields hold ISO strings.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct FormValues {
    #[serde(flatten)]
    pub values: BTreeMap<String, String>,
}

impl Persistable for FormValues {
    fn filename() -> &'static str {
        "form.json"
    }
    fn format() -> Format {
        Format::Json
    }
}

impl FormValues {
    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
    }

    pub fn clear(&mut self, name: &str) {
        self.values.remove(name);
    }
}
