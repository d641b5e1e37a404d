//! The closed vocabulary of UBSan check groups the firmware knows about.

use std::fmt;

/// A named batch of sanitizer test cases built into the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestGroup {
    Alignment,
    Builtin,
    Bounds,
    ImplicitConversion,
    Integer,
    Nonnull,
    Pointers,
    Undefined,
}

impl TestGroup {
    /// All recognized test groups.
    pub const ALL: &'static [Self] = &[
        Self::Alignment,
        Self::Builtin,
        Self::Bounds,
        Self::ImplicitConversion,
        Self::Integer,
        Self::Nonnull,
        Self::Pointers,
        Self::Undefined,
    ];

    /// Parse a single group name (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ALIGNMENT" => Some(Self::Alignment),
            "BUILTIN" => Some(Self::Builtin),
            "BOUNDS" => Some(Self::Bounds),
            "IMPLICIT_CONVERSION" => Some(Self::ImplicitConversion),
            "INTEGER" => Some(Self::Integer),
            "NONNULL" => Some(Self::Nonnull),
            "POINTERS" => Some(Self::Pointers),
            "UNDEFINED" => Some(Self::Undefined),
            _ => None,
        }
    }

    /// Parse a comma-separated list of group names (or "all").
    ///
    /// This is the caller-side validation gate: an unknown name is rejected
    /// here, before any firmware boot.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, String> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::ALL.to_vec());
        }
        s.split(',')
            .map(|part| {
                Self::parse(part.trim()).ok_or_else(|| {
                    format!(
                        "unknown test group '{}', expected a comma-separated selection from: {}",
                        part.trim(),
                        Self::ALL
                            .iter()
                            .map(|g| g.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )
                })
            })
            .collect()
    }

    /// Group name as it appears in the transcript markers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alignment => "ALIGNMENT",
            Self::Builtin => "BUILTIN",
            Self::Bounds => "BOUNDS",
            Self::ImplicitConversion => "IMPLICIT_CONVERSION",
            Self::Integer => "INTEGER",
            Self::Nonnull => "NONNULL",
            Self::Pointers => "POINTERS",
            Self::Undefined => "UNDEFINED",
        }
    }

    /// File name the captured transcript is persisted under.
    #[must_use]
    pub fn transcript_file_name(self) -> String {
        format!("{}.txt", self.as_str().to_lowercase())
    }
}

impl fmt::Display for TestGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(TestGroup::parse("bounds"), Some(TestGroup::Bounds));
        assert_eq!(TestGroup::parse("BOUNDS"), Some(TestGroup::Bounds));
        assert_eq!(
            TestGroup::parse("implicit_conversion"),
            Some(TestGroup::ImplicitConversion)
        );
        assert_eq!(TestGroup::parse("bogus"), None);
    }

    #[test]
    fn test_parse_list() {
        let groups = TestGroup::parse_list("alignment,BOUNDS , integer").unwrap();
        assert_eq!(
            groups,
            vec![TestGroup::Alignment, TestGroup::Bounds, TestGroup::Integer]
        );
    }

    #[test]
    fn test_parse_list_all() {
        assert_eq!(TestGroup::parse_list("ALL").unwrap(), TestGroup::ALL);
    }

    #[test]
    fn test_parse_list_rejects_unknown() {
        let err = TestGroup::parse_list("bounds,nonexistent").unwrap_err();
        assert!(err.contains("nonexistent"));
        assert!(err.contains("ALIGNMENT"));
    }

    #[test]
    fn test_transcript_file_name() {
        assert_eq!(TestGroup::Undefined.transcript_file_name(), "undefined.txt");
        assert_eq!(
            TestGroup::ImplicitConversion.transcript_file_name(),
            "implicit_conversion.txt"
        );
    }
}
