//! Marker vocabulary of the firmware console transcript.
//!
//! These strings must match the transcript producer bit-for-bit; the engine
//! has no tolerance for variations in the marker text.

/// Prefix of every test-harness line.
pub const UBT_MARKER: &str = "UBT:";

/// Prefix of every raw sanitizer diagnostic.
pub const UBSAN_MARKER: &str = "UBSan:";

/// Harness marker announcing the start of a check group.
pub const GROUP_OPEN_MARKER: &str = "Start testing cases with ";

/// First half of the harness marker closing a check group.
pub const GROUP_CLOSE_PREFIX: &str = "Checks with ";

/// Second half of the harness marker closing a check group.
pub const GROUP_CLOSE_SUFFIX: &str = " are done";

/// Terminal marker the firmware prints once the whole suite has run.
/// The boot capture layer waits for this; the engine never sees past it.
pub const ALL_TESTS_DONE_MARKER: &str = "UBT: All tests are done...";

/// Pointer-address placeholder a result report may carry. Matched literally
/// and replaced with [`WILDCARD`] before fragment splitting.
pub const PTR_PLACEHOLDER: &str = "[[ptr:0x[0-9a-f]*]]";

/// Wildcard token the placeholder is rewritten to. Fragments are the literal
/// text between wildcard occurrences.
pub const WILDCARD: &str = "'{{.*}}'";

/// Width of the decoration suffix trailing a group name in the open marker.
/// The transcript producer appends a fixed 3-character decoration after the
/// name; stripping exactly this many characters is a compatibility
/// constraint, not a general parsing rule.
pub const GROUP_NAME_SUFFIX_WIDTH: usize = 3;
