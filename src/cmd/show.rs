use crate::calc::{format_display, parse_iso};
use crate::data::{FieldKind, FormSchema, FormValues, Persistable};
use anyhow::Result;

pub fn run() -> Result<()> {
    let schema = FormSchema::load()?;
    let values = FormValues::load()?;
    write_values(&schema, &values, &mut std::io::stdout())
}

/// One line per field in schema order. Date values are shown in display
/// form next to their stored ISO string.
pub(crate) fn write_values<W: std::io::Write>(
    schema: &FormSchema,
    values: &FormValues,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "Form")?;
    writeln!(out, "---")?;
    writeln!(out, "  {:<14} {}", "Field", "Value")?;
    let mut filled = 0;
    for field in &schema.fields {
        let raw = values.get(&field.name);
        if !raw.is_empty() {
            filled += 1;
        }
        let shown = match (field.kind, parse_iso(raw)) {
            (FieldKind::Date, Some(date)) => format!("{} ({raw})", format_display(date)),
            _ if raw.is_empty() => "-".to_string(),
            _ => raw.replace('\n', " "),
        };
        writeln!(out, "  {:<14} {}", field.display_label(), shown)?;
    }
    writeln!(out, "---")?;
    writeln!(out, "Filled: {filled} of {} field(s)", schema.fields.len())?;
    Ok(())
}
