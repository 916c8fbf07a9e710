//! Sticky-failure cursor over a single response payload.
//!
//! Every extraction step either advances the cursor or fails it; once failed
//! all further steps are no-ops, so a whole grammar reads as one chain that
//! is checked once at the end:
//!
//! ```
//! use vmodem_frame::parser::Parser;
//!
//! let (mut mode, mut state) = (0, 0);
//! let mut parser = Parser::new("2,1");
//! assert!(parser.int(&mut mode).skip(b',').int(&mut state).full_match());
//! assert_eq!((mode, state), (2, 1));
//! ```

/// Cursor over a response payload. `None` position means the parse failed.
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    input: &'a str,
    pos: Option<usize>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: Some(0),
        }
    }

    /// True while no step has failed.
    pub fn match_so_far(&self) -> bool {
        self.pos.is_some()
    }

    /// True when no step has failed and the whole input was consumed.
    pub fn full_match(&self) -> bool {
        self.pos == Some(self.input.len())
    }

    /// True when no step has failed and input remains.
    pub fn has_more(&self) -> bool {
        matches!(self.pos, Some(pos) if pos < self.input.len())
    }

    /// Next unconsumed byte, if any.
    pub fn front(&self) -> Option<u8> {
        self.pos
            .and_then(|pos| self.input.as_bytes().get(pos).copied())
    }

    /// Skip one expected byte. `b' '` instead skips every byte `<= 0x20`.
    pub fn skip(&mut self, c: u8) -> &mut Self {
        let Some(pos) = self.pos else {
            return self;
        };
        let bytes = self.input.as_bytes();

        if c == b' ' {
            let blanks = bytes[pos..].iter().take_while(|&&b| b <= b' ').count();
            self.pos = Some(pos + blanks);
        } else if bytes.get(pos) == Some(&c) {
            self.pos = Some(pos + 1);
        } else {
            self.pos = None;
        }
        self
    }

    /// Skip an expected literal. Running out of input before the literal ends fails.
    pub fn skip_str(&mut self, literal: &str) -> &mut Self {
        let Some(pos) = self.pos else {
            return self;
        };

        if self.input[pos..].starts_with(literal) {
            self.pos = Some(pos + literal.len());
        } else {
            self.pos = None;
        }
        self
    }

    /// Take the next character.
    pub fn char(&mut self, out: &mut char) -> &mut Self {
        let Some(pos) = self.pos else {
            return self;
        };

        match self.input[pos..].chars().next() {
            Some(c) => {
                *out = c;
                self.pos = Some(pos + c.len_utf8());
            }
            None => self.pos = None,
        }
        self
    }

    /// Take a decimal integer.
    pub fn int(&mut self, out: &mut i32) -> &mut Self {
        self.int_radix(out, 10)
    }

    /// Take an integer in `radix`: optional `-`, then at least one digit.
    /// Out-of-range values fail.
    pub fn int_radix(&mut self, out: &mut i32, radix: u32) -> &mut Self {
        let Some(pos) = self.pos else {
            return self;
        };

        match parse_int_prefix(&self.input.as_bytes()[pos..], radix) {
            Some((value, len)) => {
                *out = value;
                self.pos = Some(pos + len);
            }
            None => self.pos = None,
        }
        self
    }

    /// Take everything up to `end` and step past it. Fails when `end` is absent.
    pub fn field(&mut self, end: u8, out: &mut &'a str) -> &mut Self {
        let Some(pos) = self.pos else {
            return self;
        };

        match self.input.as_bytes()[pos..].iter().position(|&b| b == end) {
            Some(len) => {
                *out = &self.input[pos..pos + len];
                self.pos = Some(pos + len + 1);
            }
            None => self.pos = None,
        }
        self
    }

    /// Like [`Parser::field`], copying into an owned string.
    pub fn string(&mut self, end: u8, out: &mut String) -> &mut Self {
        let mut view = "";
        if self.field(end, &mut view).match_so_far() {
            *out = view.to_string();
        }
        self
    }

    /// Take the rest of the input. Empty when the parse has failed.
    pub fn remaining(&mut self) -> &'a str {
        match self.pos {
            Some(pos) => {
                self.pos = Some(self.input.len());
                &self.input[pos..]
            }
            None => "",
        }
    }

    /// Bytes consumed so far, `None` when the parse has failed.
    pub fn consumed(&self) -> Option<usize> {
        self.pos
    }
}

/// Parse a locale-free integer prefix of `bytes`.
///
/// Returns the value and the number of bytes it spans, or `None` when there
/// are no digits or the value does not fit in an `i32`.
pub fn parse_int_prefix(bytes: &[u8], radix: u32) -> Option<(i32, usize)> {
    let start = usize::from(bytes.first() == Some(&b'-'));
    let limit = i64::from(i32::MAX) + 1;

    let mut value: i64 = 0;
    let mut end = start;
    while let Some(digit) = bytes.get(end).and_then(|&b| char::from(b).to_digit(radix)) {
        value = value * i64::from(radix) + i64::from(digit);
        if value > limit {
            return None;
        }
        end += 1;
    }

    if end == start {
        return None;
    }

    let value = if start == 1 { -value } else { value };
    i32::try_from(value).ok().map(|value| (value, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_reads_fields_in_order() {
        let mut status = 0;
        let mut apn = "";
        let mut rest = String::new();

        let mut parser = Parser::new("1,\"epc.tmobile.com\",10.0.2.15");
        parser
            .int(&mut status)
            .skip(b',')
            .skip(b'"')
            .field(b'"', &mut apn)
            .skip(b',');
        rest.push_str(parser.remaining());

        assert!(parser.full_match());
        assert_eq!(status, 1);
        assert_eq!(apn, "epc.tmobile.com");
        assert_eq!(rest, "10.0.2.15");
    }

    #[test]
    fn failure_is_sticky() {
        let mut a = -1;
        let mut b = -1;
        let mut parser = Parser::new("x,2");

        parser.int(&mut a).skip(b',').int(&mut b);

        assert!(!parser.match_so_far());
        assert!(!parser.full_match());
        assert!(!parser.has_more());
        assert_eq!(parser.front(), None);
        assert_eq!(parser.consumed(), None);
        assert_eq!(parser.remaining(), "");
        assert_eq!((a, b), (-1, -1));
    }

    #[test]
    fn skip_space_eats_all_control_bytes() {
        let mut parser = Parser::new(" \t\r\n 7");
        let mut value = 0;
        parser.skip(b' ').int(&mut value);
        assert!(parser.full_match());
        assert_eq!(value, 7);

        let mut parser = Parser::new("7");
        parser.skip(b' ');
        assert_eq!(parser.consumed(), Some(0));
    }

    #[test]
    fn skip_byte_at_end_fails() {
        let mut parser = Parser::new("");
        parser.skip(b',');
        assert!(!parser.match_so_far());
    }

    #[test]
    fn skip_str_requires_whole_literal() {
        let mut parser = Parser::new("+COPS: 0");
        assert!(parser.skip_str("+COPS:").skip(b' ').has_more());
        assert_eq!(parser.front(), Some(b'0'));

        let mut parser = Parser::new("+CO");
        parser.skip_str("+COPS:");
        assert!(!parser.match_so_far());
    }

    #[test]
    fn integers_accept_sign_and_radix() {
        let mut value = 0;

        assert!(Parser::new("-32").int(&mut value).full_match());
        assert_eq!(value, -32);

        assert!(Parser::new("00C3").int_radix(&mut value, 16).full_match());
        assert_eq!(value, 0xC3);

        let mut parser = Parser::new("12ab");
        parser.int(&mut value);
        assert_eq!(value, 12);
        assert_eq!(parser.front(), Some(b'a'));
    }

    #[test]
    fn integers_reject_empty_plus_and_overflow() {
        let mut value = 5;
        assert!(!Parser::new("").int(&mut value).match_so_far());
        assert!(!Parser::new("-").int(&mut value).match_so_far());
        assert!(!Parser::new("+1").int(&mut value).match_so_far());
        assert!(!Parser::new("4294967296").int(&mut value).match_so_far());
        assert_eq!(value, 5);

        assert!(Parser::new("-2147483648").int(&mut value).full_match());
        assert_eq!(value, i32::MIN);
        assert!(Parser::new("2147483647").int(&mut value).full_match());
        assert_eq!(value, i32::MAX);
    }

    #[test]
    fn field_requires_terminator() {
        let mut view = "unchanged";
        let mut parser = Parser::new("abc");
        parser.field(b',', &mut view);
        assert!(!parser.match_so_far());
        assert_eq!(view, "unchanged");

        let mut parser = Parser::new(",tail");
        parser.field(b',', &mut view);
        assert_eq!(view, "");
        assert_eq!(parser.remaining(), "tail");
    }

    #[test]
    fn char_reads_one_character() {
        let mut sign = ' ';
        let mut parser = Parser::new("-3");
        parser.char(&mut sign);
        assert_eq!(sign, '-');
        assert_eq!(parser.consumed(), Some(1));

        assert!(!Parser::new("").char(&mut sign).match_so_far());
    }

    #[test]
    fn string_copies_field() {
        let mut name = String::new();
        let mut parser = Parser::new("T-Mobile\r");
        parser.string(b'\r', &mut name);
        assert!(parser.full_match());
        assert_eq!(name, "T-Mobile");
    }

    #[test]
    fn consumed_tracks_progress() {
        let mut pdu_size = 0;
        let mut parser = Parser::new("23\r0891\rtrailing");
        let mut pdu = "";
        parser.int(&mut pdu_size).skip(b'\r').field(b'\r', &mut pdu);
        assert_eq!(parser.consumed(), Some(8));
        assert_eq!(pdu, "0891");
    }
}
