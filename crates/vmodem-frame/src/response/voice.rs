use crate::parser::Parser;

use super::unquote;

/// One entry of the current call list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Call {
    /// 0 active, 1 held, 2 dialing, 3 alerting, 4 incoming, 5 waiting.
    pub state: i32,
    pub index: i32,
    /// Type of address (145 international, 129 national).
    pub toa: i32,
    pub is_mpty: bool,
    pub is_mt: bool,
    pub is_voice: bool,
    pub number: String,
}

/// `+CLCC: <idx>,<dir>,<stat>,<mode>,<mpty>,<number>,<type>` per call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Clcc {
    pub calls: Vec<Call>,
}

impl Clcc {
    /// `payload` still carries the `+CLCC:` header of every line.
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut calls = Vec::new();

        let mut parser = Parser::new(payload);
        while parser.has_more() {
            let (mut index, mut dir, mut state, mut mode, mut mpty, mut toa) = (0, 0, 0, 0, 0, 0);
            let mut number = "";

            if !parser
                .skip_str("+CLCC:")
                .skip(b' ')
                .int(&mut index)
                .skip(b',')
                .int(&mut dir)
                .skip(b',')
                .int(&mut state)
                .skip(b',')
                .int(&mut mode)
                .skip(b',')
                .int(&mut mpty)
                .skip(b',')
                .field(b',', &mut number)
                .int(&mut toa)
                .skip(b'\r')
                .match_so_far()
            {
                return None;
            }

            calls.push(Call {
                state,
                index,
                toa,
                is_mpty: mpty != 0,
                is_mt: dir != 0,
                is_voice: mode == 0,
                number: unquote(number).to_string(),
            });
        }

        Some(Self { calls })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CallForwardInfo {
    /// 0 inactive, 1 active.
    pub status: i32,
    pub service_class: i32,
    pub toa: i32,
    pub number: String,
    pub time_seconds: i32,
}

/// `+CCFCU: <status>,<class>,<numtype>,<toa>,"<number>"[,<subaddr>,<satype>,<pcalled>,<time>]`
/// per forwarding rule.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Ccfcu {
    pub call_forward_infos: Vec<CallForwardInfo>,
}

impl Ccfcu {
    /// `payload` still carries the `+CCFCU:` header of every line.
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut call_forward_infos = Vec::new();

        let mut parser = Parser::new(payload);
        while parser.has_more() {
            let mut info = CallForwardInfo {
                status: 0,
                service_class: 0,
                toa: 0,
                number: String::new(),
                time_seconds: 0,
            };
            let mut number_type = 0;

            if !parser
                .skip_str("+CCFCU:")
                .skip(b' ')
                .int(&mut info.status)
                .skip(b',')
                .int(&mut info.service_class)
                .skip(b',')
                .int(&mut number_type)
                .skip(b',')
                .int(&mut info.toa)
                .skip(b',')
                .skip(b'"')
                .string(b'"', &mut info.number)
                .match_so_far()
            {
                return None;
            }

            match parser.front() {
                Some(b',') => {
                    let mut ignored = "";
                    if !parser
                        .skip(b',')
                        .field(b',', &mut ignored)
                        .field(b',', &mut ignored)
                        .field(b',', &mut ignored)
                        .int(&mut info.time_seconds)
                        .skip(b'\r')
                        .match_so_far()
                    {
                        return None;
                    }
                }
                Some(b'\r') => {
                    parser.skip(b'\r');
                }
                _ => return None,
            }

            call_forward_infos.push(info);
        }

        Some(Self { call_forward_infos })
    }
}

/// Call waiting: `+CCWA: <mode>,<class>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Ccwa {
    pub enable: bool,
    pub service_class: i32,
}

impl Ccwa {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut mode = 0;
        let mut service_class = -1;
        Parser::new(payload)
            .int(&mut mode)
            .skip(b',')
            .int(&mut service_class)
            .full_match()
            .then_some(Self {
                enable: mode == 1,
                service_class,
            })
    }
}

/// Calling line identification presentation: `+CLIP: <n>,<m>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Clip {
    pub enable: bool,
    /// 0 not provisioned, 1 provisioned, 2 unknown.
    pub status: i32,
}

impl Clip {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut enable = 0;
        let mut status = 0;
        Parser::new(payload)
            .int(&mut enable)
            .skip(b',')
            .int(&mut status)
            .full_match()
            .then_some(Self {
                enable: enable != 0,
                status,
            })
    }
}

/// Calling line identification restriction: `+CLIR: <n>,<m>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Clir {
    pub n: i32,
    pub m: i32,
}

impl Clir {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut clir = Self { n: -1, m: -1 };
        Parser::new(payload)
            .int(&mut clir.n)
            .skip(b',')
            .int(&mut clir.m)
            .full_match()
            .then_some(clir)
    }
}

/// Microphone mute: `+CMUT: <n>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cmut {
    pub on: bool,
}

impl Cmut {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut on = 0;
        Parser::new(payload)
            .int(&mut on)
            .full_match()
            .then_some(Self { on: on != 0 })
    }
}

/// Emergency callback mode: `+WSOS: <n>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Wsos {
    pub is_emergency_mode: bool,
}

impl Wsos {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut mode = 0;
        Parser::new(payload)
            .int(&mut mode)
            .full_match()
            .then_some(Self {
                is_emergency_mode: mode != 0,
            })
    }
}
