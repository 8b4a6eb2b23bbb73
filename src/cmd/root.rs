use crate::data::{persistence::get_data_dir, AppSettings, FormSchema, FormValues, Persistable};
use crate::logging::init_logging;
use crate::ui::form_view::{run_app, App};
use crate::ui::{restore_terminal, setup_terminal};
use anyhow::Result;
use chrono::Local;
use log::info;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

pub fn run() -> Result<()> {
    let settings = AppSettings::load()?;
    let schema = FormSchema::load()?;
    let values = Rc::new(RefCell::new(FormValues::load()?));

    let data_dir = get_data_dir()?;
    if let Err(e) = init_logging(&settings.log_level, &data_dir.join("logs")) {
        eprintln!("File logging disabled: {e:#}");
    }

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::event::DisableMouseCapture
        );
        original_hook(info);
    }));

    let mut terminal = setup_terminal()?;

    let today = Local::now().date_naive();
    let mut app = App::new(schema, Rc::clone(&values), &settings, today);
    let result = run_app(&mut terminal, &mut app);

    let restored = restore_terminal(&mut terminal);
    drop(app);
    save_then(restored, &values.borrow(), &data_dir)?;

    result
}

/// Saves the form before reporting `restored`, so a terminal that failed to
/// restore never costs the user their input.
pub(crate) fn save_then(restored: Result<()>, values: &FormValues, dir: &Path) -> Result<()> {
    values.save_to(dir)?;
    info!("form saved to {}", dir.display());
    restored
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use tempfile::TempDir;

    #[test]
    fn test_values_saved_even_when_restore_fails() {
        let tmp = TempDir::new().unwrap();
        let mut values = FormValues::default();
        values.set("effDate", "2025-03-15");

        let err = save_then(Err(anyhow!("restore failed")), &values, tmp.path()).unwrap_err();
        assert!(err.to_string().contains("restore failed"));
        let loaded = FormValues::load_from(tmp.path()).unwrap();
        assert_eq!(loaded.get("effDate"), "2025-03-15");
    }

    #[test]
    fn test_save_then_passes_through_success() {
        let tmp = TempDir::new().unwrap();
        save_then(Ok(()), &FormValues::default(), tmp.path()).unwrap();
        assert!(tmp.path().join("form.json").exists());
    }
}
