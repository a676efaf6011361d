/// Upload allow-list check, run before any byte reaches disk
use crate::{
    error::{VaultError, VaultResult},
    storage::naming::file_extension,
};

/// Declared media type and the extensions it may carry
const MEDIA_TYPES: &[(&str, &[&str])] = &[
    ("application/pdf", &["pdf"]),
    ("application/msword", &["doc"]),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        &["docx"],
    ),
    ("application/vnd.ms-excel", &["xls"]),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        &["xlsx"],
    ),
    ("application/zip", &["zip"]),
    ("text/plain", &["txt"]),
    ("text/csv", &["csv"]),
];

/// Every extension the service accepts
const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx", "zip", "txt", "csv"];

pub struct UploadFilter;

impl UploadFilter {
    /// Accept or reject an upload from its declared media type and file name
    pub fn check(media_type: &str, original_name: &str) -> VaultResult<()> {
        let extension = file_extension(original_name).unwrap_or_default();

        let allowed_for_media = MEDIA_TYPES
            .iter()
            .find(|(media, _)| *media == media_type)
            .map(|(_, exts)| *exts);

        match allowed_for_media {
            Some(exts)
                if exts.contains(&extension.as_str())
                    && ALLOWED_EXTENSIONS.contains(&extension.as_str()) =>
            {
                Ok(())
            }
            _ => Err(VaultError::InvalidInput(format!(
                "The file extension .{} is not allowed, only [{}]",
                extension,
                ALLOWED_EXTENSIONS.join(",")
            ))),
        }
    }

    /// Exactly one file per upload
    pub fn check_count(files: usize) -> VaultResult<()> {
        match files {
            0 => Err(VaultError::InvalidInput("File is missing".to_string())),
            1 => Ok(()),
            _ => Err(VaultError::InvalidInput(
                "Only upload one file at a time please".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_matching_pairs() {
        assert!(UploadFilter::check("application/pdf", "budget.pdf").is_ok());
        assert!(UploadFilter::check("text/csv", "Q3.CSV").is_ok());
        assert!(UploadFilter::check(
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "sheet.xlsx"
        )
        .is_ok());
        assert!(UploadFilter::check("application/zip", "bundle.zip").is_ok());
    }

    #[test]
    fn test_rejects_disallowed_extension() {
        let err = UploadFilter::check("text/plain", "setup.exe").unwrap_err();
        let message = err.to_string();

        assert!(matches!(err, VaultError::InvalidInput(_)));
        assert!(message.contains(".exe"));
        assert!(message.contains("pdf,doc,docx,xls,xlsx,zip,txt,csv"));
    }

    #[test]
    fn test_rejects_media_type_mismatch() {
        assert!(UploadFilter::check("application/pdf", "notes.txt").is_err());
        assert!(UploadFilter::check("image/png", "photo.png").is_err());
    }

    #[test]
    fn test_file_count() {
        assert_eq!(
            UploadFilter::check_count(0).unwrap_err().to_string(),
            "File is missing"
        );
        assert!(UploadFilter::check_count(1).is_ok());
        assert!(UploadFilter::check_count(2).is_err());
    }
}
