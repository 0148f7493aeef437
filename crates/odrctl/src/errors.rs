//! Exit codes for odrctl

use odr_shared::ClientError;

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Health check finished with at least one failed probe
pub const EXIT_DEGRADED: i32 = 2;

/// Exit code when the device answers with an error envelope
pub const EXIT_INVALID_RESPONSE: i32 = 65;

/// Exit code when the device is unavailable/unreachable
pub const EXIT_DEVICE_UNAVAILABLE: i32 = 70;

/// Map a failed command to its exit code.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(client) = err.downcast_ref::<ClientError>() {
        return match client {
            ClientError::Unreachable(_) => EXIT_DEVICE_UNAVAILABLE,
            ClientError::Device(_) => EXIT_INVALID_RESPONSE,
        };
    }
    EXIT_GENERAL_ERROR
}
