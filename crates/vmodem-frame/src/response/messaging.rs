use crate::hexcodec;
use crate::parser::Parser;

use super::unquote;

/// SMS service centre address: `+CSCA: <sca>,<tosca>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Csca {
    pub sca: String,
    pub tosca: i32,
}

impl Csca {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut sca = "";
        let mut tosca = -1;
        Parser::new(payload)
            .field(b',', &mut sca)
            .int(&mut tosca)
            .full_match()
            .then(|| Self {
                sca: unquote(sca).to_string(),
                tosca,
            })
    }
}

/// Inclusive id range in a cell broadcast configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Association {
    pub from: i32,
    pub to: i32,
}

/// Cell broadcast configuration: `+CSCB: <mode>,"<mids>","<dcss>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cscb {
    pub mode: i32,
    pub service_id: Vec<Association>,
    pub code_scheme: Vec<Association>,
}

impl Cscb {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut mode = -1;
        let mut service_id = "";
        let mut code_scheme = "";

        if !Parser::new(payload)
            .int(&mut mode)
            .skip(b',')
            .skip(b'"')
            .field(b'"', &mut service_id)
            .skip(b',')
            .skip(b'"')
            .field(b'"', &mut code_scheme)
            .full_match()
        {
            return None;
        }

        Some(Self {
            mode,
            service_id: Self::parse_ids(service_id)?,
            code_scheme: Self::parse_ids(code_scheme)?,
        })
    }

    /// Parse an id list such as `0,1,5-7`. An empty list is valid.
    pub fn parse_ids(ids: &str) -> Option<Vec<Association>> {
        let mut associations = Vec::new();

        let mut parser = Parser::new(ids);
        while parser.has_more() {
            let mut from = 0;
            if !parser.int(&mut from).match_so_far() {
                return None;
            }

            if parser.full_match() {
                associations.push(Association { from, to: from });
                break;
            }

            match parser.front() {
                Some(b'-') => {
                    let mut to = 0;
                    if !parser.skip(b'-').int(&mut to).match_so_far() {
                        return None;
                    }
                    associations.push(Association { from, to });

                    match parser.front() {
                        None => {}
                        Some(b',') => {
                            parser.skip(b',');
                        }
                        Some(_) => return None,
                    }
                }
                Some(b',') => {
                    associations.push(Association { from, to: from });
                    parser.skip(b',');
                }
                _ => return None,
            }
        }

        Some(associations)
    }
}

/// Message reference of a sent SMS: `+CMGS: <mr>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cmgs {
    pub message_ref: i32,
}

impl Cmgs {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        parse_message_ref(payload).map(|message_ref| Self { message_ref })
    }
}

/// Storage index of a written SMS: `+CMGW: <index>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cmgw {
    pub message_ref: i32,
}

impl Cmgw {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        parse_message_ref(payload).map(|message_ref| Self { message_ref })
    }
}

fn parse_message_ref(payload: &str) -> Option<i32> {
    let mut message_ref = -1;
    Parser::new(payload)
        .int(&mut message_ref)
        .full_match()
        .then_some(message_ref)
}

/// Incoming SMS: `+CMT: <length>\r<pdu>\r`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cmt {
    pub length: i32,
    pub pdu: Vec<u8>,
}

impl Cmt {
    /// Build from the two lines following the header, terminators stripped.
    pub(crate) fn parse(header: &str, pdu: &str) -> Option<Self> {
        let (length, pdu) = parse_pdu_lines(header, pdu)?;
        Some(Self { length, pdu })
    }
}

/// SMS status report: `+CDS: <pdu size>\r<pdu>\r`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cds {
    pub pdu_size: i32,
    pub pdu: Vec<u8>,
}

impl Cds {
    /// Build from the two lines following the header, terminators stripped.
    pub(crate) fn parse(header: &str, pdu: &str) -> Option<Self> {
        let (pdu_size, pdu) = parse_pdu_lines(header, pdu)?;
        Some(Self { pdu_size, pdu })
    }
}

fn parse_pdu_lines(header: &str, pdu: &str) -> Option<(i32, Vec<u8>)> {
    let mut size = -1;
    if !Parser::new(header).int(&mut size).full_match() {
        return None;
    }
    Some((size, hexcodec::decode(pdu)?))
}
