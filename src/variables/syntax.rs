//! Conversion of Terraform's native syntax into JSON.

use crate::{Error, Result};
use std::path::Path;

/// Converts a native-syntax variables document into an equivalent JSON
/// document, so that both file flavours are decoded the same way.
pub trait NativeSyntax {
    /// Convert `source` (read from `path`) into JSON bytes.
    fn to_json(&self, source: &[u8], path: &Path) -> Result<Vec<u8>>;
}

/// [`NativeSyntax`] backed by the `hcl` parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct HclSyntax;

impl NativeSyntax for HclSyntax {
    fn to_json(&self, source: &[u8], path: &Path) -> Result<Vec<u8>> {
        let text = std::str::from_utf8(source).map_err(|e| Error::parse(path, e))?;
        let value: serde_json::Value = hcl::from_str(text).map_err(|e| Error::parse(path, e))?;
        Ok(serde_json::to_vec(&value)?)
    }
}
