//! Telnet command framing (RFC 854/855).
//!
//! The stream is raw bytes interleaved with sequences introduced by
//! [`IAC`]. A sequence is either `IAC <command>` or, for the four
//! negotiation verbs, `IAC <verb> <option>`. `IAC IAC` is an escaped 255
//! data byte.

use std::fmt;

pub const XEOF: u8 = 236;
pub const SUSP: u8 = 237;
pub const ABORT: u8 = 238;
pub const EOR: u8 = 239;
pub const SE: u8 = 240;
pub const NOP: u8 = 241;
pub const DM: u8 = 242;
pub const BRK: u8 = 243;
pub const IP: u8 = 244;
pub const AO: u8 = 245;
pub const AYT: u8 = 246;
pub const EC: u8 = 247;
pub const EL: u8 = 248;
pub const GA: u8 = 249;
pub const SB: u8 = 250;
pub const WILL: u8 = 251;
pub const WONT: u8 = 252;
pub const DO: u8 = 253;
pub const DONT: u8 = 254;
pub const IAC: u8 = 255;

/// Standard option codes
pub mod option {
    pub const BINARY: u8 = 0;
    pub const ECHO: u8 = 1;
    pub const RCP: u8 = 2;
    pub const SGA: u8 = 3;
    pub const NAMS: u8 = 4;
    pub const STATUS: u8 = 5;
    pub const TM: u8 = 6;
    pub const RCTE: u8 = 7;
    pub const NAOL: u8 = 8;
    pub const NAOP: u8 = 9;
    pub const NAOCRD: u8 = 10;
    pub const NAOHTS: u8 = 11;
    pub const NAOHTD: u8 = 12;
    pub const NAOFFD: u8 = 13;
    pub const NAOVTS: u8 = 14;
    pub const NAOVTD: u8 = 15;
    pub const NAOLFD: u8 = 16;
    pub const XASCII: u8 = 17;
    pub const LOGOUT: u8 = 18;
    pub const BM: u8 = 19;
    pub const DET: u8 = 20;
    pub const SUPDUP: u8 = 21;
    pub const SUPDUP_OUTPUT: u8 = 22;
    pub const SNDLOC: u8 = 23;
    pub const TTYPE: u8 = 24;
    pub const EOR: u8 = 25;
    pub const TUID: u8 = 26;
    pub const OUTMRK: u8 = 27;
    pub const TTYLOC: u8 = 28;
    pub const REGIME_3270: u8 = 29;
    pub const X3PAD: u8 = 30;
    pub const NAWS: u8 = 31;
    pub const TSPEED: u8 = 32;
    pub const LFLOW: u8 = 33;
    pub const LINEMODE: u8 = 34;
    pub const XDISPLOC: u8 = 35;
    pub const OLD_ENVIRON: u8 = 36;
    pub const AUTHENTICATION: u8 = 37;
    pub const ENCRYPT: u8 = 38;
    pub const NEW_ENVIRON: u8 = 39;
    pub const EXOPL: u8 = 255;
}

pub fn command_name(code: u8) -> Option<&'static str> {
    let name = match code {
        XEOF => "xEOF",
        SUSP => "SUSP",
        ABORT => "ABORT",
        EOR => "EOR",
        SE => "SE",
        NOP => "NOP",
        DM => "DM",
        BRK => "BRK",
        IP => "IP",
        AO => "AO",
        AYT => "AYT",
        EC => "EC",
        EL => "EL",
        GA => "GA",
        SB => "SB",
        WILL => "WILL",
        WONT => "WONT",
        DO => "DO",
        DONT => "DONT",
        IAC => "IAC",
        _ => return None,
    };
    Some(name)
}

pub fn option_name(code: u8) -> Option<&'static str> {
    use option::*;

    let name = match code {
        BINARY => "8-bit data path",
        ECHO => "echo",
        RCP => "prepare to reconnect",
        SGA => "suppress go ahead",
        NAMS => "approximate message size",
        STATUS => "give status",
        TM => "timing mark",
        RCTE => "remote controlled transmission and echo",
        NAOL => "negotiate about output line width",
        NAOP => "negotiate about output page size",
        NAOCRD => "negotiate about CR disposition",
        NAOHTS => "negotiate about horizontal tabstops",
        NAOHTD => "negotiate about horizontal tab disposition",
        NAOFFD => "negotiate about formfeed disposition",
        NAOVTS => "negotiate about vertical tab stops",
        NAOVTD => "negotiate about vertical tab disposition",
        NAOLFD => "negotiate about output LF disposition",
        XASCII => "extended ascii character set",
        LOGOUT => "force logout",
        BM => "byte macro",
        DET => "data entry terminal",
        SUPDUP => "supdup protocol",
        SUPDUP_OUTPUT => "supdup output",
        SNDLOC => "send location",
        TTYPE => "terminal type",
        option::EOR => "end or record",
        TUID => "TACACS user identification",
        OUTMRK => "output marking",
        TTYLOC => "terminal location number",
        REGIME_3270 => "3270 regime",
        X3PAD => "X.3 PAD",
        NAWS => "window size",
        TSPEED => "terminal speed",
        LFLOW => "remote flow control",
        LINEMODE => "Linemode option",
        XDISPLOC => "X Display Location",
        OLD_ENVIRON => "Old - Environment variables",
        AUTHENTICATION => "Authenticate",
        ENCRYPT => "Encryption option",
        NEW_ENVIRON => "New - Environment variables",
        EXOPL => "extended-options-list",
        _ => return None,
    };
    Some(name)
}

/// A decoded command sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub code: u8,
    /// Option named by a DO/DONT/WILL/WONT negotiation
    pub option: Option<u8>,
}

impl Command {
    /// Bytes the sequence occupies after its IAC byte
    pub fn extra_len(&self) -> usize {
        if self.option.is_some() { 2 } else { 1 }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match command_name(self.code) {
            Some(name) => f.write_str(name)?,
            None => write!(f, "{:#04x}", self.code)?,
        }
        if let Some(option) = self.option {
            match option_name(option) {
                Some(name) => write!(f, " {name}")?,
                None => write!(f, " option {option}")?,
            }
        }
        Ok(())
    }
}

/// Classification of the byte at a scan position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// Ordinary data, consumes only itself
    Data,
    /// A complete command sequence starting at the scan position
    Command(Command),
    /// The window ends inside a command sequence
    Incomplete,
}

impl Decoded {
    /// Bytes consumed beyond the byte at the scan position
    pub fn extra_len(&self) -> usize {
        match self {
            Decoded::Command(command) => command.extra_len(),
            Decoded::Data | Decoded::Incomplete => 0,
        }
    }
}

/// Decode the sequence at the start of `window`.
///
/// A window that does not start with IAC is data. A window holding only a
/// prefix of a sequence is [`Decoded::Incomplete`], never a shorter command,
/// so a sequence split across reads is not misread as text.
pub fn decode_command(window: &[u8]) -> Decoded {
    match window {
        [IAC, code @ (DO | DONT | WILL | WONT), option, ..] => Decoded::Command(Command {
            code: *code,
            option: Some(*option),
        }),
        [IAC] | [IAC, DO | DONT | WILL | WONT] => Decoded::Incomplete,
        [IAC, code, ..] => Decoded::Command(Command { code: *code, option: None }),
        _ => Decoded::Data,
    }
}

/// Text and commands found in one chunk of the stream
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Scan {
    pub text: Vec<u8>,
    pub commands: Vec<Command>,
}

/// Incremental scanner keeping framing across reads.
///
/// A sequence cut off at the end of a chunk is held back and completed by
/// the next call to [`Scanner::feed`].
#[derive(Debug, Default)]
pub struct Scanner {
    partial: Vec<u8>,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Scan {
        let mut buf = std::mem::take(&mut self.partial);
        buf.extend_from_slice(chunk);

        let mut scan = Scan::default();
        let mut i = 0;
        while i < buf.len() {
            match decode_command(&buf[i..]) {
                Decoded::Data => scan.text.push(buf[i]),
                Decoded::Incomplete => {
                    self.partial = buf[i..].to_vec();
                    break;
                }
                Decoded::Command(command) => {
                    if command.code == IAC {
                        scan.text.push(IAC);
                    } else {
                        scan.commands.push(command);
                    }
                    i += command.extra_len();
                }
            }
            i += 1;
        }

        scan
    }

    /// Bytes held back waiting for the rest of a sequence
    pub fn pending(&self) -> &[u8] {
        &self.partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_simple_command() {
        let decoded = decode_command(&[IAC, AYT]);
        assert_eq!(decoded, Decoded::Command(Command { code: AYT, option: None }));
        assert_eq!(decoded.extra_len(), 1);
    }

    #[test]
    fn test_decode_negotiation() {
        let decoded = decode_command(&[IAC, DO, option::ECHO]);
        assert_eq!(
            decoded,
            Decoded::Command(Command { code: DO, option: Some(option::ECHO) })
        );
        assert_eq!(decoded.extra_len(), 2);

        for verb in [DONT, WILL, WONT] {
            assert_eq!(decode_command(&[IAC, verb, option::NAWS, b'x']).extra_len(), 2);
        }
    }

    #[test]
    fn test_decode_data() {
        assert_eq!(decode_command(b"login:"), Decoded::Data);
        assert_eq!(decode_command(&[]), Decoded::Data);
        assert_eq!(decode_command(&[AYT, IAC]).extra_len(), 0);
    }

    #[test]
    fn test_decode_truncated() {
        assert_eq!(decode_command(&[IAC]), Decoded::Incomplete);
        assert_eq!(decode_command(&[IAC, WILL]), Decoded::Incomplete);
        assert_eq!(decode_command(&[IAC, WILL]).extra_len(), 0);
    }

    #[test]
    fn test_scan_skips_sequences() {
        let mut scanner = Scanner::new();
        let scan = scanner.feed(&[
            IAC, DO, option::TTYPE, b'o', b'k', IAC, AYT, IAC, WILL, option::SGA, b'!',
        ]);

        assert_eq!(scan.text, b"ok!");
        assert_eq!(
            scan.commands,
            vec![
                Command { code: DO, option: Some(option::TTYPE) },
                Command { code: AYT, option: None },
                Command { code: WILL, option: Some(option::SGA) },
            ]
        );
        assert!(scanner.pending().is_empty());
    }

    #[test]
    fn test_scan_ayt_has_no_text() {
        let scan = Scanner::new().feed(&[IAC, AYT]);
        assert!(scan.text.is_empty());
        assert_eq!(scan.commands.len(), 1);
    }

    #[test]
    fn test_scan_escaped_iac_is_data() {
        let scan = Scanner::new().feed(&[b'a', IAC, IAC, b'b']);
        assert_eq!(scan.text, vec![b'a', IAC, b'b']);
        assert!(scan.commands.is_empty());
    }

    #[test]
    fn test_scan_sequence_split_across_reads() {
        let mut scanner = Scanner::new();

        let first = scanner.feed(&[b'x', IAC, DO]);
        assert_eq!(first.text, b"x");
        assert!(first.commands.is_empty());
        assert_eq!(scanner.pending(), &[IAC, DO]);

        let second = scanner.feed(&[option::ECHO, b'y']);
        assert_eq!(second.text, b"y");
        assert_eq!(second.commands, vec![Command { code: DO, option: Some(option::ECHO) }]);
        assert!(scanner.pending().is_empty());
    }

    #[test]
    fn test_command_display() {
        assert_eq!(Command { code: AYT, option: None }.to_string(), "AYT");
        assert_eq!(Command { code: WONT, option: Some(option::NAWS) }.to_string(), "WONT window size");
        assert_eq!(Command { code: DO, option: Some(200) }.to_string(), "DO option 200");
    }
}
