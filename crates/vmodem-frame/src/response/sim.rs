use crate::hexcodec;
use crate::parser::Parser;

/// SIM lock state reported by `+CPIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SimState {
    Absent,
    NotReady,
    Ready,
    Pin,
    Puk,
}

/// `+CPIN: READY | SIM PIN | SIM PUK`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cpin {
    pub state: SimState,
}

impl Cpin {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let state = match payload {
            "READY" => SimState::Ready,
            "SIM PIN" => SimState::Pin,
            "SIM PUK" => SimState::Puk,
            _ => return None,
        };
        Some(Self { state })
    }
}

/// `+CPINR: <code>,<retries>,<max retries>,`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cpinr {
    pub remaining_retry_times: i32,
    pub max_retry_times: i32,
}

impl Cpinr {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut code = "";
        let mut cpinr = Self {
            remaining_retry_times: -1,
            max_retry_times: -1,
        };

        let mut parser = Parser::new(payload);
        parser
            .field(b',', &mut code)
            .int(&mut cpinr.remaining_retry_times)
            .skip(b',')
            .int(&mut cpinr.max_retry_times);
        if parser.front() == Some(b',') {
            parser.skip(b',');
        }

        parser.full_match().then_some(cpinr)
    }
}

/// Restricted SIM access: `+CRSM: <sw1>,<sw2>[,<response>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Crsm {
    pub sw1: i32,
    pub sw2: i32,
    pub response: String,
}

impl Crsm {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut crsm = Self {
            sw1: -1,
            sw2: -1,
            response: String::new(),
        };

        let mut parser = Parser::new(payload);
        if parser
            .int(&mut crsm.sw1)
            .skip(b',')
            .int(&mut crsm.sw2)
            .has_more()
        {
            if !parser.skip(b',').match_so_far() {
                return None;
            }
            crsm.response = parser.remaining().to_string();
        } else if !parser.full_match() {
            return None;
        }

        Some(crsm)
    }
}

/// Facility lock query: `+CLCK: <status>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Clck {
    pub locked: bool,
}

impl Clck {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        match payload.as_bytes().first() {
            Some(b'0') => Some(Self { locked: false }),
            Some(b'1') => Some(Self { locked: true }),
            _ => None,
        }
    }
}

/// `<len>,<response>` where `len` must equal the response length.
fn parse_sized_apdu(payload: &str) -> Option<String> {
    let mut len = 0;
    let mut parser = Parser::new(payload);
    if !parser.int(&mut len).skip(b',').match_so_far() {
        return None;
    }

    let response = parser.remaining();
    (usize::try_from(len).ok() == Some(response.len())).then(|| response.to_string())
}

/// Generic SIM access: `+CSIM: <len>,<response>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Csim {
    pub response: String,
}

impl Csim {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        parse_sized_apdu(payload).map(|response| Self { response })
    }
}

/// APDU over a logical channel: `+CGLA: <len>,<response>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cgla {
    pub response: String,
}

impl Cgla {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        parse_sized_apdu(payload).map(|response| Self { response })
    }
}

/// CDMA subscription source (0 RUIM/SIM, 1 NV): `+CCSS: <source>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Ccss {
    pub source: i32,
}

impl Ccss {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut source = -1;
        Parser::new(payload)
            .int(&mut source)
            .full_match()
            .then_some(Self { source })
    }
}

/// SIM authentication: `^MBAU: <status>[,<kc>,<sres>][,<ck>,<ik>,<res/auts>]`.
///
/// Hex fields are decoded; the ones the shape does not carry stay empty.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Mbau {
    pub status: i32,
    pub kc: Vec<u8>,
    pub sres: Vec<u8>,
    pub ck: Vec<u8>,
    pub ik: Vec<u8>,
    pub res_auts: Vec<u8>,
}

impl Mbau {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut status = 0;
        let (mut kc, mut sres, mut ck, mut ik, mut res_auts) = ("", "", "", "", "");

        let mut parser = Parser::new(payload);
        match payload.bytes().filter(|&b| b == b',').count() {
            0 => {
                if !parser.int(&mut status).full_match() {
                    return None;
                }
            }
            2 => {
                if !parser
                    .int(&mut status)
                    .skip(b',')
                    .field(b',', &mut kc)
                    .match_so_far()
                {
                    return None;
                }
                sres = parser.remaining();
            }
            5 => {
                if !parser
                    .int(&mut status)
                    .skip(b',')
                    .field(b',', &mut kc)
                    .field(b',', &mut sres)
                    .field(b',', &mut ck)
                    .field(b',', &mut ik)
                    .match_so_far()
                {
                    return None;
                }
                res_auts = parser.remaining();
            }
            _ => return None,
        }

        Some(Self {
            status,
            kc: hexcodec::decode(kc)?,
            sres: hexcodec::decode(sres)?,
            ck: hexcodec::decode(ck)?,
            ik: hexcodec::decode(ik)?,
            res_auts: hexcodec::decode(res_auts)?,
        })
    }
}

/// STK profile download settings: `+CUSATD: <a>, <b>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cusatd {
    pub a: i32,
    pub b: i32,
}

impl Cusatd {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut cusatd = Self { a: 0, b: 0 };
        Parser::new(payload)
            .int(&mut cusatd.a)
            .skip(b',')
            .skip(b' ')
            .int(&mut cusatd.b)
            .full_match()
            .then_some(cusatd)
    }
}

/// Hex BER-TLV from the SIM toolkit: `+CUSATP: <proactive command>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cusatp {
    pub cmd: String,
}

/// `+CUSATE: <envelope response>`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cusate {
    pub response: String,
}

/// Terminal response status: `+CUSATT: <value>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cusatt {
    pub value: i32,
}

impl Cusatt {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut value = 0;
        Parser::new(payload)
            .int(&mut value)
            .full_match()
            .then_some(Self { value })
    }
}
