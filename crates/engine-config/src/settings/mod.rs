pub mod env;
pub mod validated;

pub use validated::{TransferSettings, TransferSettingsBuilder};
