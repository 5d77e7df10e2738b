//! Shared constants: environment variable names and token format rules.

/// Bytes of entropy in a generated token.
pub const TOKEN_ENTROPY_BYTES: usize = 16;

/// Length of a generated token: 16 bytes in unpadded base64url.
pub const TOKEN_LENGTH: usize = 22;

/// Maximum length accepted for administrator-provisioned system tokens.
pub const SYSTEM_TOKEN_MAX_LENGTH: usize = 36;

/// Enables verbose internal diagnostics without changing behavior.
pub const ENV_DEBUG: &str = "AAU_DEBUG";

/// Converts normally swallowed internal failures into propagated errors.
pub const ENV_RAISE: &str = "AAU_RAISE";

/// Kind letters whose cache reads are forced to fail (testing only).
pub const ENV_READ_CHAOS: &str = "AAU_READ_CHAOS";

/// Kind letters whose cache writes are forced to fail (testing only).
pub const ENV_WRITE_CHAOS: &str = "AAU_WRITE_CHAOS";

/// Resolves and logs the heartbeat without sending it.
pub const ENV_HEARTBEAT_DRY_RUN: &str = "AAU_HEARTBEAT_DRY_RUN";

/// Returns `true` if `c` belongs to the URL-safe base64 alphabet.
pub fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Returns `true` if `value` is a well-formed generated token.
pub fn is_generated_token(value: &str) -> bool {
    value.len() == TOKEN_LENGTH && value.chars().all(is_token_char)
}

/// Returns `true` if `value` is a well-formed system (organization/machine) token.
pub fn is_system_token(value: &str) -> bool {
    !value.is_empty() && value.len() <= SYSTEM_TOKEN_MAX_LENGTH && value.chars().all(is_token_char)
}
