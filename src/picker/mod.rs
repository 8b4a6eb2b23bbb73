pub mod controller;
pub mod layout;
pub mod listeners;

pub use controller::{CloseReason, ControlState, DatePicker, PointerTarget, DEFAULT_PLACEHOLDER};
pub use layout::{LayoutError, LayoutSource, StaticLayout, UnmountedLayout, WidthHint};
pub use listeners::{ListenerKind, ListenerRegistry, ListenerStats, OwnerId, Subscription};
