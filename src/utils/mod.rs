pub mod serde_helpers;
pub mod validators;
