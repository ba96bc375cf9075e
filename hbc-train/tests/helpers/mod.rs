//! Test Helper Utilities
//!
//! Shared utilities for hbc-train integration tests

use std::path::Path;

/// Write a `fname,label` manifest
pub fn write_manifest<S: AsRef<str>>(path: &Path, rows: &[(S, &str)]) -> anyhow::Result<()> {
    let mut content = String::from("dataset,fname,label\n");
    for (fname, label) in rows {
        content.push_str(&format!("set_a,{},{}\n", fname.as_ref(), label));
    }
    std::fs::write(path, content)?;
    Ok(())
}
