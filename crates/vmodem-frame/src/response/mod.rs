//! Typed AT response values.
//!
//! Every complete response the modem sends becomes one immutable
//! [`AtResponse`], shared between the conversation and subscribers as an
//! [`AtResponsePtr`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

mod data;
mod errors;
mod messaging;
mod modem;
mod network;
mod sim;
mod voice;

pub use data::{Cgcontrdp, Cgdcont, PdpContext};
pub use errors::{CmeError, CmsError, RadioError};
pub use messaging::{Association, Cds, Cmgs, Cmgw, Cmt, Csca, Cscb};
pub use modem::{Cfun, Cgfpccfg, Ctec, Ctzv, ModemTechnology, RadioState};
pub use network::{
    CdmaSignal, Cops, Csq, EvdoSignal, GsmSignal, LteSignal, NetworkSelectionMode, NrSignal,
    OperatorInfo, OperatorState, RegState, Registration, TdscdmaSignal, WcdmaSignal, Wrmp,
    UNKNOWN,
};
pub use sim::{Ccss, Cgla, Clck, Cpin, Cpinr, Crsm, Csim, Cusatd, Cusate, Cusatp, Cusatt, Mbau, SimState};
pub use voice::{Call, CallForwardInfo, Ccfcu, Ccwa, Clcc, Clip, Clir, Cmut, Wsos};

/// Strip one pair of surrounding double quotes.
pub(crate) fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
}

/// Shared handle to a parsed response.
pub type AtResponsePtr = Arc<AtResponse>;

/// One parsed AT response.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AtResponse {
    Ok,
    Error,
    Ring,
    /// `> `, the modem waits for an SMS PDU.
    SmsPrompt,
    /// A recognized command whose payload did not match its grammar.
    ParseError(ResponseKind),
    /// Untagged text terminated by `OK` (e.g. the IMSI from `AT+CIMI`).
    Text(String),
    CmeError(CmeError),
    CmsError(CmsError),
    Cpin(Cpin),
    Cpinr(Cpinr),
    Crsm(Crsm),
    Cfun(Cfun),
    Creg(Registration),
    Cereg(Registration),
    Cgreg(Registration),
    Ctec(Ctec),
    Cops(Cops),
    Wrmp(Wrmp),
    Ccss(Ccss),
    Csq(Csq),
    Clcc(Clcc),
    Ccfcu(Ccfcu),
    Ccwa(Ccwa),
    Cusatd(Cusatd),
    Cusatp(Cusatp),
    Cusate(Cusate),
    Cusatt(Cusatt),
    Cusatend,
    Cgdcont(Cgdcont),
    Cgcontrdp(Cgcontrdp),
    Clck(Clck),
    Csim(Csim),
    Cgla(Cgla),
    Cchc,
    Clip(Clip),
    Clir(Clir),
    Cmut(Cmut),
    Wsos(Wsos),
    Csca(Csca),
    Cscb(Cscb),
    Cmgs(Cmgs),
    Cmgw(Cmgw),
    Cmt(Cmt),
    Cds(Cds),
    Ctzv(Ctzv),
    Cgfpccfg(Cgfpccfg),
    Mbau(Mbau),
}

impl AtResponse {
    /// The stable tag of this response.
    pub fn kind(&self) -> ResponseKind {
        use ResponseKind as K;

        match self {
            Self::Ok => K::Ok,
            Self::Error => K::Error,
            Self::Ring => K::Ring,
            Self::SmsPrompt => K::SmsPrompt,
            Self::ParseError(_) => K::ParseError,
            Self::Text(_) => K::Text,
            Self::CmeError(_) => K::CmeError,
            Self::CmsError(_) => K::CmsError,
            Self::Cpin(_) => K::Cpin,
            Self::Cpinr(_) => K::Cpinr,
            Self::Crsm(_) => K::Crsm,
            Self::Cfun(_) => K::Cfun,
            Self::Creg(_) => K::Creg,
            Self::Cereg(_) => K::Cereg,
            Self::Cgreg(_) => K::Cgreg,
            Self::Ctec(_) => K::Ctec,
            Self::Cops(_) => K::Cops,
            Self::Wrmp(_) => K::Wrmp,
            Self::Ccss(_) => K::Ccss,
            Self::Csq(_) => K::Csq,
            Self::Clcc(_) => K::Clcc,
            Self::Ccfcu(_) => K::Ccfcu,
            Self::Ccwa(_) => K::Ccwa,
            Self::Cusatd(_) => K::Cusatd,
            Self::Cusatp(_) => K::Cusatp,
            Self::Cusate(_) => K::Cusate,
            Self::Cusatt(_) => K::Cusatt,
            Self::Cusatend => K::Cusatend,
            Self::Cgdcont(_) => K::Cgdcont,
            Self::Cgcontrdp(_) => K::Cgcontrdp,
            Self::Clck(_) => K::Clck,
            Self::Csim(_) => K::Csim,
            Self::Cgla(_) => K::Cgla,
            Self::Cchc => K::Cchc,
            Self::Clip(_) => K::Clip,
            Self::Clir(_) => K::Clir,
            Self::Cmut(_) => K::Cmut,
            Self::Wsos(_) => K::Wsos,
            Self::Csca(_) => K::Csca,
            Self::Cscb(_) => K::Cscb,
            Self::Cmgs(_) => K::Cmgs,
            Self::Cmgw(_) => K::Cmgw,
            Self::Cmt(_) => K::Cmt,
            Self::Cds(_) => K::Cds,
            Self::Ctzv(_) => K::Ctzv,
            Self::Cgfpccfg(_) => K::Cgfpccfg,
            Self::Mbau(_) => K::Mbau,
        }
    }

    /// The tag as text: `"OK"`, `"ParseError"`, `"string"`, `"CREG"`, ...
    pub fn what(&self) -> &'static str {
        self.kind().as_str()
    }

    /// True for a response of `kind`, and for a parse failure of `kind`.
    ///
    /// The second case lets a caller waiting for a command be released with
    /// the parse error instead of timing out.
    pub fn holds(&self, kind: ResponseKind) -> bool {
        match self {
            Self::ParseError(failed) => kind == ResponseKind::ParseError || *failed == kind,
            other => other.kind() == kind,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::ParseError(_))
    }

    /// Final result codes that terminate any command: `OK`, `ERROR`,
    /// `+CME ERROR` and `+CMS ERROR`.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Self::Ok | Self::Error | Self::CmeError(_) | Self::CmsError(_)
        )
    }
}

impl fmt::Display for AtResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseError(kind) => write!(f, "ParseError({kind})"),
            other => f.write_str(other.what()),
        }
    }
}

/// Stable tag identifying a response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ResponseKind {
    Ok,
    Error,
    Ring,
    SmsPrompt,
    ParseError,
    Text,
    CmeError,
    CmsError,
    Cpin,
    Cpinr,
    Crsm,
    Cfun,
    Creg,
    Cereg,
    Cgreg,
    Ctec,
    Cops,
    Wrmp,
    Ccss,
    Csq,
    Clcc,
    Ccfcu,
    Ccwa,
    Cusatd,
    Cusatp,
    Cusate,
    Cusatt,
    Cusatend,
    Cgdcont,
    Cgcontrdp,
    Clck,
    Csim,
    Cgla,
    Cchc,
    Clip,
    Clir,
    Cmut,
    Wsos,
    Csca,
    Cscb,
    Cmgs,
    Cmgw,
    Cmt,
    Cds,
    Ctzv,
    Cgfpccfg,
    Mbau,
}

impl ResponseKind {
    pub const ALL: [ResponseKind; 47] = [
        Self::Ok,
        Self::Error,
        Self::Ring,
        Self::SmsPrompt,
        Self::ParseError,
        Self::Text,
        Self::CmeError,
        Self::CmsError,
        Self::Cpin,
        Self::Cpinr,
        Self::Crsm,
        Self::Cfun,
        Self::Creg,
        Self::Cereg,
        Self::Cgreg,
        Self::Ctec,
        Self::Cops,
        Self::Wrmp,
        Self::Ccss,
        Self::Csq,
        Self::Clcc,
        Self::Ccfcu,
        Self::Ccwa,
        Self::Cusatd,
        Self::Cusatp,
        Self::Cusate,
        Self::Cusatt,
        Self::Cusatend,
        Self::Cgdcont,
        Self::Cgcontrdp,
        Self::Clck,
        Self::Csim,
        Self::Cgla,
        Self::Cchc,
        Self::Clip,
        Self::Clir,
        Self::Cmut,
        Self::Wsos,
        Self::Csca,
        Self::Cscb,
        Self::Cmgs,
        Self::Cmgw,
        Self::Cmt,
        Self::Cds,
        Self::Ctzv,
        Self::Cgfpccfg,
        Self::Mbau,
    ];

    /// Wire tag for commands, fixed names for the rest.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Error => "ERROR",
            Self::Ring => "RING",
            Self::SmsPrompt => "SmsPrompt",
            Self::ParseError => "ParseError",
            Self::Text => "string",
            Self::CmeError => "CME ERROR",
            Self::CmsError => "CMS ERROR",
            Self::Cpin => "CPIN",
            Self::Cpinr => "CPINR",
            Self::Crsm => "CRSM",
            Self::Cfun => "CFUN",
            Self::Creg => "CREG",
            Self::Cereg => "CEREG",
            Self::Cgreg => "CGREG",
            Self::Ctec => "CTEC",
            Self::Cops => "COPS",
            Self::Wrmp => "WRMP",
            Self::Ccss => "CCSS",
            Self::Csq => "CSQ",
            Self::Clcc => "CLCC",
            Self::Ccfcu => "CCFCU",
            Self::Ccwa => "CCWA",
            Self::Cusatd => "CUSATD",
            Self::Cusatp => "CUSATP",
            Self::Cusate => "CUSATE",
            Self::Cusatt => "CUSATT",
            Self::Cusatend => "CUSATEND",
            Self::Cgdcont => "CGDCONT",
            Self::Cgcontrdp => "CGCONTRDP",
            Self::Clck => "CLCK",
            Self::Csim => "CSIM",
            Self::Cgla => "CGLA",
            Self::Cchc => "CCHC",
            Self::Clip => "CLIP",
            Self::Clir => "CLIR",
            Self::Cmut => "CMUT",
            Self::Wsos => "WSOS",
            Self::Csca => "CSCA",
            Self::Cscb => "CSCB",
            Self::Cmgs => "CMGS",
            Self::Cmgw => "CMGW",
            Self::Cmt => "CMT",
            Self::Cds => "CDS",
            Self::Ctzv => "CTZV",
            Self::Cgfpccfg => "CGFPCCFG",
            Self::Mbau => "MBAU",
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseKind {
    type Err = String;

    /// Accepts the tag case-insensitively, with or without a leading sigil.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().trim_start_matches(['+', '%', '^']);
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| format!("unknown response tag: {s}"))
    }
}
