pub mod calc;
pub mod cmd;
pub mod data;
pub mod logging;
pub mod picker;
pub mod ui;
