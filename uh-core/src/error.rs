//! Error types re-exported from `uh-error`

pub use uh_error::{ErrorKind, Result, UpsHatError};
