//! FPort ranges.
//!
//! Port 0 carries MAC commands, 1-223 are application ports,
//! 224 is the certification test port and 225-255 are reserved.

/// MAC commands only (FRMPayload holds MAC commands, no application data).
pub const MAC_COMMANDS: u8 = 0;

/// LoRaWAN certification test protocol.
pub const TEST_PORT: u8 = 224;

/// Returns a human-readable name for a port.
pub fn port_name(port: u8) -> &'static str {
    match port {
        MAC_COMMANDS => "MAC",
        1..=223 => "APPLICATION",
        TEST_PORT => "TEST",
        _ => "RESERVED",
    }
}

/// Returns true if the port carries application data.
pub fn is_application(port: u8) -> bool {
    (1..TEST_PORT).contains(&port)
}
