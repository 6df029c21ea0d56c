//! crates/gramseva_core/src/validation.rs
//!
//! Pure input validation: phone numbers, Aadhaar numbers, and image upload
//! constraints. No I/O, no exceptions; booleans for format checks and typed
//! errors for file constraints.

use thiserror::Error;

/// Maximum accepted image size unless the caller overrides it.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Accepted image MIME types.
pub const ALLOWED_IMAGE_TYPES: [&str; 4] =
    ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Validates an Indian mobile number: after stripping non-digits, exactly
/// 10 digits with the first in 6..=9.
pub fn validate_phone(phone: &str) -> bool {
    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.len() == 10 && matches!(digits[0], '6'..='9')
}

/// Validates an Aadhaar number format: exactly 12 digits after stripping
/// non-digits. The Verhoeff checksum is not verified.
pub fn validate_aadhaar(aadhaar: &str) -> bool {
    aadhaar.chars().filter(|c| c.is_ascii_digit()).count() == 12
}

/// A single file's constraint violation. The message names the file and the
/// constraint that failed so multi-file submissions can report precisely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("{file_name}: invalid file type '{content_type}'. Only JPEG, PNG, and WebP are allowed.")]
    InvalidType {
        file_name: String,
        content_type: String,
    },
    #[error("{file_name}: file size {size} exceeds the {max_bytes} byte limit.")]
    TooLarge {
        file_name: String,
        size: usize,
        max_bytes: usize,
    },
}

/// Checks one image against the type and size constraints.
pub fn check_image(
    file_name: &str,
    content_type: &str,
    size: usize,
    max_bytes: usize,
) -> Result<(), ImageError> {
    if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
        return Err(ImageError::InvalidType {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
        });
    }
    if size > max_bytes {
        return Err(ImageError::TooLarge {
            file_name: file_name.to_string(),
            size,
            max_bytes,
        });
    }
    Ok(())
}

/// Checks a batch of images, collecting every offending file rather than
/// stopping at the first.
pub fn check_images<'a, I>(files: I, max_bytes: usize) -> Result<(), Vec<ImageError>>
where
    I: IntoIterator<Item = (&'a str, &'a str, usize)>,
{
    let errors: Vec<ImageError> = files
        .into_iter()
        .filter_map(|(name, content_type, size)| {
            check_image(name, content_type, size, max_bytes).err()
        })
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_accepts_ten_digits_starting_six_to_nine() {
        assert!(validate_phone("9876543210"));
        assert!(validate_phone("6000000000"));
        assert!(!validate_phone("1234567890"));
        assert!(!validate_phone("987654321"));
        assert!(!validate_phone("98765432100"));
    }

    #[test]
    fn phone_strips_non_digits() {
        assert!(validate_phone("98765-43210"));
        assert!(!validate_phone("+91 98765 43210")); // 12 digits after strip
        assert!(validate_phone("(98765) 43210"));
    }

    #[test]
    fn aadhaar_is_twelve_digits() {
        assert!(validate_aadhaar("123456789012"));
        assert!(validate_aadhaar("1234-5678-9012"));
        assert!(!validate_aadhaar("12345678901"));
        assert!(!validate_aadhaar("1234567890123"));
    }

    #[test]
    fn image_type_constraint_names_the_file() {
        let err = check_image("doc.pdf", "application/pdf", 10, MAX_IMAGE_BYTES).unwrap_err();
        assert!(matches!(err, ImageError::InvalidType { .. }));
        assert!(err.to_string().contains("doc.pdf"));
    }

    #[test]
    fn image_size_constraint_is_reported_separately() {
        let err =
            check_image("big.png", "image/png", MAX_IMAGE_BYTES + 1, MAX_IMAGE_BYTES).unwrap_err();
        assert!(matches!(err, ImageError::TooLarge { .. }));
    }

    #[test]
    fn batch_check_reports_every_offender() {
        let files = vec![
            ("a.png", "image/png", 100),
            ("b.gif", "image/gif", 100),
            ("c.png", "image/png", MAX_IMAGE_BYTES + 1),
        ];
        let errors = check_images(files, MAX_IMAGE_BYTES).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
