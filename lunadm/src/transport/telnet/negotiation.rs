//! Telnet option negotiation (RFC 854).
//!
//! lunadm never enables Telnet options: every `DO` is answered with `WONT`
//! and every `WILL` with `DONT`. Commands and subnegotiations are removed
//! from the data stream; an escaped `IAC IAC` becomes a single 0xFF byte.

use std::borrow::Cow;

pub const IAC: u8 = 255;
pub const DONT: u8 = 254;
pub const DO: u8 = 253;
pub const WONT: u8 = 252;
pub const WILL: u8 = 251;
pub const SB: u8 = 250;
pub const SE: u8 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    Iac,
    Option(u8),
    Sub,
    SubIac,
}

/// Result of filtering one chunk from the peer.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Filtered {
    /// Application data with Telnet commands removed.
    pub data: Vec<u8>,

    /// Bytes to send back to the peer.
    pub replies: Vec<u8>,
}

/// Incremental Telnet command filter.
///
/// State is carried between chunks, so a command split across two reads
/// is still recognised.
#[derive(Debug)]
pub struct Negotiator {
    state: State,
}

impl Default for Negotiator {
    fn default() -> Self {
        Self::new()
    }
}

impl Negotiator {
    pub fn new() -> Self {
        Self { state: State::Data }
    }

    /// Filter a chunk received from the peer.
    pub fn feed(&mut self, input: &[u8]) -> Filtered {
        let mut out = Filtered::default();
        let mut rest = input;

        while !rest.is_empty() {
            if self.state == State::Data {
                match memchr::memchr(IAC, rest) {
                    Some(pos) => {
                        out.data.extend_from_slice(&rest[..pos]);
                        self.state = State::Iac;
                        rest = &rest[pos + 1..];
                    }
                    None => {
                        out.data.extend_from_slice(rest);
                        break;
                    }
                }
                continue;
            }

            let byte = rest[0];
            rest = &rest[1..];

            self.state = match (self.state, byte) {
                (State::Iac, IAC) => {
                    out.data.push(IAC);
                    State::Data
                }
                (State::Iac, DO | DONT | WILL | WONT) => State::Option(byte),
                (State::Iac, SB) => State::Sub,
                // NOP, GA, AYT and friends carry no option.
                (State::Iac, _) => State::Data,
                (State::Option(command), option) => {
                    match command {
                        DO => out.replies.extend_from_slice(&[IAC, WONT, option]),
                        WILL => out.replies.extend_from_slice(&[IAC, DONT, option]),
                        _ => {}
                    }
                    State::Data
                }
                (State::Sub, IAC) => State::SubIac,
                (State::Sub, _) => State::Sub,
                (State::SubIac, SE) => State::Data,
                (State::SubIac, _) => State::Sub,
                (State::Data, _) => {
                    out.data.push(byte);
                    State::Data
                }
            };
        }

        out
    }
}

/// Double every 0xFF byte so the peer reads it as data.
pub fn escape(data: &[u8]) -> Cow<'_, [u8]> {
    if memchr::memchr(IAC, data).is_none() {
        return Cow::Borrowed(data);
    }

    let mut escaped = Vec::with_capacity(data.len() + 4);
    for &byte in data {
        escaped.push(byte);
        if byte == IAC {
            escaped.push(IAC);
        }
    }
    Cow::Owned(escaped)
}
