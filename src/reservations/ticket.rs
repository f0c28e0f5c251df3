use lazy_static::lazy_static;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;

/// Bytes of randomness per ticket (128 bits).
const TICKET_BYTES: usize = 16;

/// Generates a new ticket number: 32 lowercase hex characters from the OS RNG.
pub fn generate_ticket() -> String {
    let mut buf = [0u8; TICKET_BYTES];
    OsRng.fill_bytes(&mut buf);
    buf.iter().map(|b| format!("{b:02x}")).collect()
}

/// Normalizes user-typed ticket numbers. Returns `None` for anything that
/// cannot be a ticket, so callers can skip the lookup entirely.
pub fn normalize_ticket(input: &str) -> Option<String> {
    lazy_static! {
        static ref TICKET_RE: Regex = Regex::new(r"^[0-9a-f]{16,64}$").unwrap();
    }
    let ticket = input.trim().to_ascii_lowercase();
    TICKET_RE.is_match(&ticket).then_some(ticket)
}
