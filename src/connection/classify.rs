//! Connection Failure Classification
//!
//! Maps the numeric code reported by the MySQL client or server onto the
//! handful of reasons an operator can act on.

use serde::Serialize;

use super::ConnectionDescriptor;

/// Server: unknown database (ER_BAD_DB_ERROR)
pub const ER_BAD_DB_ERROR: u16 = 1049;

/// Server: access denied to a database (ER_DBACCESS_DENIED_ERROR)
pub const ER_DBACCESS_DENIED_ERROR: u16 = 1044;

/// Server: access denied for user (ER_ACCESS_DENIED_ERROR)
pub const ER_ACCESS_DENIED_ERROR: u16 = 1045;

/// Server: table does not exist (ER_NO_SUCH_TABLE)
pub const ER_NO_SUCH_TABLE: u16 = 1146;

/// Client: unknown error (CR_UNKNOWN_ERROR)
pub const CR_UNKNOWN_ERROR: u16 = 2000;

/// Client: connection refused by host (CR_CONN_HOST_ERROR)
pub const CR_CONN_HOST_ERROR: u16 = 2003;

/// Client: unknown or unreachable host (CR_UNKNOWN_HOST)
pub const CR_UNKNOWN_HOST: u16 = 2005;

/// Client: TLS handshake failed (CR_SSL_CONNECTION_ERROR)
pub const CR_SSL_CONNECTION_ERROR: u16 = 2026;

/// Client: malformed packet (CR_MALFORMED_PACKET)
pub const CR_MALFORMED_PACKET: u16 = 2027;

/// Why a connection attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "code", rename_all = "snake_case")]
pub enum FailureReason {
    /// The host does not exist or cannot be reached
    HostUnreachable,
    /// Username or password rejected by the server
    AuthenticationRejected,
    /// Any other connection-level failure, with the raw code
    Unknown(u16),
}

impl FailureReason {
    /// Classify a raw client/server error code
    pub fn classify(code: u16) -> Self {
        match code {
            CR_UNKNOWN_HOST => FailureReason::HostUnreachable,
            ER_ACCESS_DENIED_ERROR => FailureReason::AuthenticationRejected,
            other => FailureReason::Unknown(other),
        }
    }

    /// Diagnostic message for the operator.
    ///
    /// The password is never echoed back.
    pub fn describe(&self, descriptor: &ConnectionDescriptor) -> String {
        match self {
            FailureReason::HostUnreachable => {
                format!("The host [{}] does not exist.", descriptor.hostname())
            }
            FailureReason::AuthenticationRejected => format!(
                "The username [{}] or password is incorrect.",
                descriptor.username()
            ),
            FailureReason::Unknown(code) => format!("An error occurred: Code {}", code),
        }
    }

    /// Short machine-readable tag
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::HostUnreachable => "host_unreachable",
            FailureReason::AuthenticationRejected => "authentication_rejected",
            FailureReason::Unknown(_) => "unknown",
        }
    }
}

/// Whether a code means the demo database or its table has not been created yet
pub fn is_not_provisioned(code: u16) -> bool {
    matches!(code, ER_BAD_DB_ERROR | ER_NO_SUCH_TABLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Role;

    #[test]
    fn test_classify_priority() {
        assert_eq!(FailureReason::classify(2005), FailureReason::HostUnreachable);
        assert_eq!(FailureReason::classify(1045), FailureReason::AuthenticationRejected);
        assert_eq!(FailureReason::classify(2003), FailureReason::Unknown(2003));
        assert_eq!(FailureReason::classify(1049), FailureReason::Unknown(1049));
        assert_eq!(
            FailureReason::classify(ER_DBACCESS_DENIED_ERROR),
            FailureReason::Unknown(1044)
        );
        assert_eq!(FailureReason::classify(0), FailureReason::Unknown(0));
    }

    #[test]
    fn test_describe() {
        let descriptor = ConnectionDescriptor::new("nowhere.invalid", "scalr", "hunter2", Role::Replica);

        assert_eq!(
            FailureReason::HostUnreachable.describe(&descriptor),
            "The host [nowhere.invalid] does not exist."
        );
        let auth = FailureReason::AuthenticationRejected.describe(&descriptor);
        assert!(auth.contains("[scalr]"));
        assert!(!auth.contains("hunter2"));
        assert_eq!(
            FailureReason::Unknown(2026).describe(&descriptor),
            "An error occurred: Code 2026"
        );
    }

    #[test]
    fn test_not_provisioned_codes() {
        assert!(is_not_provisioned(ER_BAD_DB_ERROR));
        assert!(is_not_provisioned(ER_NO_SUCH_TABLE));
        assert!(!is_not_provisioned(ER_ACCESS_DENIED_ERROR));
        assert!(!is_not_provisioned(CR_UNKNOWN_HOST));
    }

    #[test]
    fn test_serialize_reason() {
        let json = serde_json::to_value(FailureReason::Unknown(2003)).unwrap();
        assert_eq!(json["reason"], "unknown");
        assert_eq!(json["code"], 2003);
    }
}
