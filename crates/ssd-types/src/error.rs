// ─────────────────────────────────────────────────────────────────────
// SSD Kernel — Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all kernel failures.
///
/// Every variant is raised before a step produces output; there is no
/// partially-updated layer state to recover from.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SsdError {
    /// Invalid engine configuration (fatal, construction time only).
    #[error("config error: {0}")]
    Config(String),

    /// An array does not have the expected number of layers.
    #[error("length mismatch: `{field}` has {got} entries, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        got: usize,
    },

    /// Invalid caller input other than array lengths.
    #[error("validation error: {0}")]
    Validation(String),
}

pub type SsdResult<T> = Result<T, SsdError>;

/// Fail with [`SsdError::LengthMismatch`] unless `got == expected`.
#[inline]
pub fn check_len(field: &'static str, expected: usize, got: usize) -> SsdResult<()> {
    if got == expected {
        Ok(())
    } else {
        Err(SsdError::LengthMismatch {
            field,
            expected,
            got,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_len_ok() {
        assert!(check_len("p", 3, 3).is_ok());
    }

    #[test]
    fn test_check_len_mismatch() {
        let err = check_len("energy", 4, 2).unwrap_err();
        assert_eq!(
            err,
            SsdError::LengthMismatch {
                field: "energy",
                expected: 4,
                got: 2
            }
        );
        assert_eq!(
            err.to_string(),
            "length mismatch: `energy` has 2 entries, expected 4"
        );
    }
}
