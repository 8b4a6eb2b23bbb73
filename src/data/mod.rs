pub mod app_settings;
pub mod form;
pub mod persistence;

pub use app_settings::AppSettings;
pub use form::{default_fields, FieldDef, FieldKind, FormSchema, FormValues};
pub use persistence::{Format, Persistable};
