use thiserror::Error;

/// Main error type for catalog merging.
/// Aggregates errors from the standard library, the xlsx reader and writer, and the merge pipeline.
#[derive(Error, Debug)]
pub enum CatalogMergeError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    XlsxWriterError(#[from] rust_xlsxwriter::XlsxError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    // Merge module errors
    #[error("{0}")]
    LinkError(#[from] crate::merge::LinkError),
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, CatalogMergeError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| CatalogMergeError::WithContextError(format!("{}: {}", message, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_prefix_keeps_ok_values() {
        let result: Result<usize, CatalogMergeError> = Ok(3);
        assert_eq!(result.with_prefix("ignored").unwrap(), 3);
    }

    #[test]
    fn with_prefix_prepends_message() {
        let result: Result<(), CatalogMergeError> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no such file").into());
        let error = result.with_prefix("Open 'input.xlsx' failed").unwrap_err();
        assert_eq!(error.to_string(), "Open 'input.xlsx' failed: no such file");
    }
}
