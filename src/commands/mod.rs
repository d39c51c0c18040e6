//! CLI command implementations.
//!
//! - [`read`] - `get` and `defaults`
//! - [`write`] - `set` and `reset`

pub mod read;
pub mod write;

use anyhow::Result;
use serde::Serialize;

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
