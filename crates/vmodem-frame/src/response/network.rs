use crate::parser::{parse_int_prefix, Parser};

use super::unquote;

/// Sentinel for signal measurements the modem did not report.
pub const UNKNOWN: i32 = i32::MAX;

/// Registration state reported by `+CREG`, `+CGREG` and `+CEREG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum RegState {
    NotRegisteredNotSearching,
    Home,
    Searching,
    Denied,
    Unknown,
    Roaming,
    /// Emergency-only and vendor states, kept as sent.
    Other(i32),
}

impl RegState {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::NotRegisteredNotSearching,
            1 => Self::Home,
            2 => Self::Searching,
            3 => Self::Denied,
            4 => Self::Unknown,
            5 => Self::Roaming,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::NotRegisteredNotSearching => 0,
            Self::Home => 1,
            Self::Searching => 2,
            Self::Denied => 3,
            Self::Unknown => 4,
            Self::Roaming => 5,
            Self::Other(code) => code,
        }
    }

    pub fn is_registered(self) -> bool {
        matches!(self, Self::Home | Self::Roaming)
    }
}

/// Registration status shared by `+CREG`, `+CGREG` and `+CEREG`.
///
/// The field layout is selected by the number of commas:
/// - 0: `<stat>`
/// - 1: `<n>,<stat>`
/// - 3: `<stat>,"<lac>","<ci>",<AcT>`
/// - 4: `<n>,<stat>,"<lac>","<ci>",<AcT>`
///
/// Area code and cell id are hex; absent fields stay `-1`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Registration {
    pub state: RegState,
    pub area_code: i32,
    pub cell_id: i32,
    pub network_type: i32,
}

impl Default for Registration {
    fn default() -> Self {
        Self {
            state: RegState::NotRegisteredNotSearching,
            area_code: -1,
            cell_id: -1,
            network_type: -1,
        }
    }
}

impl Registration {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut reg = Self::default();
        let mut parser = Parser::new(payload);
        let mut unsol_mode = 0;
        let mut state = 0;
        let mut area_code_hex = "";
        let mut cell_id_hex = "";

        match payload.bytes().filter(|&b| b == b',').count() {
            0 => {
                parser.int(&mut state);
            }
            1 => {
                parser.int(&mut unsol_mode).skip(b',').int(&mut state);
            }
            3 => {
                parser.int(&mut state).skip(b',');
                location(&mut parser, &mut area_code_hex, &mut cell_id_hex)
                    .int(&mut reg.network_type);
            }
            4 => {
                parser
                    .int(&mut unsol_mode)
                    .skip(b',')
                    .int(&mut state)
                    .skip(b',');
                location(&mut parser, &mut area_code_hex, &mut cell_id_hex)
                    .int(&mut reg.network_type);
            }
            _ => return None,
        }

        if !parser.full_match() {
            return None;
        }

        if let Some((area_code, _)) = parse_int_prefix(area_code_hex.as_bytes(), 16) {
            reg.area_code = area_code;
        }
        if let Some((cell_id, _)) = parse_int_prefix(cell_id_hex.as_bytes(), 16) {
            reg.cell_id = cell_id;
        }
        reg.state = RegState::from_code(state);
        Some(reg)
    }
}

/// `"<lac>","<ci>",`
fn location<'p, 'a>(
    parser: &'p mut Parser<'a>,
    area_code: &mut &'a str,
    cell_id: &mut &'a str,
) -> &'p mut Parser<'a> {
    parser
        .skip(b'"')
        .field(b'"', area_code)
        .skip(b',')
        .skip(b'"')
        .field(b'"', cell_id)
        .skip(b',')
}

/// `+COPS` `<mode>` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum NetworkSelectionMode {
    #[default]
    Automatic,
    Manual,
    Deregister,
    SetFormat,
    ManualAutomatic,
    Other(i32),
}

impl NetworkSelectionMode {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Automatic,
            1 => Self::Manual,
            2 => Self::Deregister,
            3 => Self::SetFormat,
            4 => Self::ManualAutomatic,
            other => Self::Other(other),
        }
    }
}

/// `+COPS` operator `<stat>` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum OperatorState {
    #[default]
    Unknown,
    Available,
    Current,
    Forbidden,
}

impl OperatorState {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Available,
            2 => Self::Current,
            3 => Self::Forbidden,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OperatorInfo {
    pub state: OperatorState,
    pub long_name: String,
    pub short_name: String,
    pub numeric: String,
}

impl OperatorInfo {
    pub fn is_current(&self) -> bool {
        self.state == OperatorState::Current
    }

    /// Mobile country code: the first three digits of the numeric id.
    pub fn mcc(&self) -> &str {
        self.numeric.get(..3).unwrap_or(&self.numeric)
    }

    /// Mobile network code: whatever follows the country code.
    pub fn mnc(&self) -> &str {
        self.numeric.get(3..).unwrap_or("")
    }
}

/// `+COPS` in any of its shapes:
/// - `(stat,long,short,numeric),...` for a network scan
/// - `<mode>,2,<numeric>` for the numeric current operator
/// - `<mode>,0,0` for the selection mode only
/// - `0,0,<long>` / `0,1,<short>` / `0,2,<numeric>` on three lines for the current operator
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cops {
    pub operators: Vec<OperatorInfo>,
    pub numeric: String,
    pub selection_mode: NetworkSelectionMode,
}

impl Cops {
    /// `payload` still carries the `+COPS:` header of every line.
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut parser = Parser::new(payload);
        if !parser.skip_str("+COPS:").skip(b' ').has_more() {
            return None;
        }

        if parser.front() == Some(b'(') {
            return Self::parse_scan(&mut parser);
        }

        let mut mode = 0;
        let mut format = 0;
        let mut value = "";
        if !parser
            .int(&mut mode)
            .skip(b',')
            .int(&mut format)
            .skip(b',')
            .field(b'\r', &mut value)
            .match_so_far()
        {
            return None;
        }

        if format == 2 && parser.full_match() {
            return Some(Self {
                numeric: unquote(value).to_string(),
                selection_mode: NetworkSelectionMode::from_code(mode),
                ..Self::default()
            });
        } else if format != 0 {
            return None;
        } else if value == "0" && parser.full_match() {
            return Some(Self {
                selection_mode: NetworkSelectionMode::from_code(mode),
                ..Self::default()
            });
        }

        let mut short_name = "";
        let mut numeric = "";
        if !parser
            .skip_str("+COPS:")
            .skip(b' ')
            .skip_str("0,1,")
            .field(b'\r', &mut short_name)
            .skip_str("+COPS:")
            .skip(b' ')
            .skip_str("0,2,")
            .field(b'\r', &mut numeric)
            .full_match()
        {
            return None;
        }

        Some(Self {
            operators: vec![OperatorInfo {
                state: OperatorState::Current,
                long_name: unquote(value).to_string(),
                short_name: unquote(short_name).to_string(),
                numeric: unquote(numeric).to_string(),
            }],
            ..Self::default()
        })
    }

    fn parse_scan(parser: &mut Parser<'_>) -> Option<Self> {
        let mut operators = Vec::new();

        loop {
            let mut state = 0;
            let mut long_name = "";
            let mut short_name = "";
            let mut numeric = "";

            if !parser
                .skip(b'(')
                .int(&mut state)
                .skip(b',')
                .field(b',', &mut long_name)
                .field(b',', &mut short_name)
                .field(b')', &mut numeric)
                .match_so_far()
            {
                return None;
            }

            operators.push(OperatorInfo {
                state: OperatorState::from_code(state),
                long_name: unquote(long_name).to_string(),
                short_name: unquote(short_name).to_string(),
                numeric: unquote(numeric).to_string(),
            });

            if parser.front() == Some(b',') {
                parser.skip(b',');
            } else {
                break;
            }
        }

        Some(Self {
            operators,
            ..Self::default()
        })
    }

    /// The operator currently camped on, if the response names one.
    pub fn current(&self) -> Option<&OperatorInfo> {
        self.operators.iter().find(|op| op.is_current())
    }
}

/// CDMA roaming preference (0 home, 1 affiliated, 2 any): `+WRMP: <pref>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Wrmp {
    pub cdma_roaming_preference: i32,
}

impl Wrmp {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut pref = -1;
        Parser::new(payload)
            .int(&mut pref)
            .full_match()
            .then_some(Self {
                cdma_roaming_preference: pref,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GsmSignal {
    pub signal_strength: i32,
    pub bit_error_rate: i32,
    pub timing_advance: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CdmaSignal {
    pub dbm: i32,
    pub ecio: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EvdoSignal {
    pub dbm: i32,
    pub ecio: i32,
    pub signal_noise_ratio: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LteSignal {
    pub signal_strength: i32,
    pub rsrp: i32,
    pub rsrq: i32,
    pub rssnr: i32,
    pub cqi: i32,
    pub timing_advance: i32,
    pub cqi_table_index: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TdscdmaSignal {
    pub signal_strength: i32,
    pub bit_error_rate: i32,
    pub rscp: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WcdmaSignal {
    pub signal_strength: i32,
    pub bit_error_rate: i32,
    pub rscp: i32,
    pub ecno: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NrSignal {
    pub ss_rsrp: i32,
    pub ss_rsrq: i32,
    pub ss_sinr: i32,
    pub csi_rsrp: i32,
    pub csi_rsrq: i32,
    pub csi_sinr: i32,
    pub csi_cqi_table_index: i32,
    pub timing_advance: i32,
}

/// Signal strength across every technology: `+CSQ`.
///
/// The modem sends 12, 13, 14 or 22 values; measurements not covered by
/// the received count stay [`UNKNOWN`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Csq {
    pub gsm: GsmSignal,
    pub cdma: CdmaSignal,
    pub evdo: EvdoSignal,
    pub lte: LteSignal,
    pub tdscdma: TdscdmaSignal,
    pub wcdma: WcdmaSignal,
    pub nr: NrSignal,
}

impl Default for Csq {
    fn default() -> Self {
        Self {
            gsm: GsmSignal {
                signal_strength: UNKNOWN,
                bit_error_rate: UNKNOWN,
                timing_advance: UNKNOWN,
            },
            cdma: CdmaSignal {
                dbm: UNKNOWN,
                ecio: UNKNOWN,
            },
            evdo: EvdoSignal {
                dbm: UNKNOWN,
                ecio: UNKNOWN,
                signal_noise_ratio: UNKNOWN,
            },
            lte: LteSignal {
                signal_strength: UNKNOWN,
                rsrp: UNKNOWN,
                rsrq: UNKNOWN,
                rssnr: UNKNOWN,
                cqi: UNKNOWN,
                timing_advance: UNKNOWN,
                cqi_table_index: UNKNOWN,
            },
            tdscdma: TdscdmaSignal {
                signal_strength: UNKNOWN,
                bit_error_rate: UNKNOWN,
                rscp: UNKNOWN,
            },
            wcdma: WcdmaSignal {
                signal_strength: UNKNOWN,
                bit_error_rate: UNKNOWN,
                rscp: UNKNOWN,
                ecno: UNKNOWN,
            },
            nr: NrSignal {
                ss_rsrp: UNKNOWN,
                ss_rsrq: UNKNOWN,
                ss_sinr: UNKNOWN,
                csi_rsrp: UNKNOWN,
                csi_rsrq: UNKNOWN,
                csi_sinr: UNKNOWN,
                csi_cqi_table_index: UNKNOWN,
                timing_advance: UNKNOWN,
            },
        }
    }
}

impl Csq {
    const MAX_VALUES: usize = 22;

    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut values = [UNKNOWN; Self::MAX_VALUES];

        let mut parser = Parser::new(payload);
        if !parser.int(&mut values[0]).match_so_far() {
            return None;
        }

        let mut count = 1;
        while parser.has_more() && count < Self::MAX_VALUES {
            if !parser.skip(b',').int(&mut values[count]).match_so_far() {
                return None;
            }
            count += 1;
        }

        if !parser.full_match() {
            return None;
        }
        if !matches!(count, 12 | 13 | 14 | 22) {
            tracing::debug!(count, "unexpected signal strength value count");
            return None;
        }

        let mut csq = Self::default();
        if count == 22 {
            csq.wcdma.signal_strength = values[14];
            if csq.wcdma.signal_strength != UNKNOWN {
                csq.wcdma.rscp = 42;
                csq.wcdma.ecno = 19;
            }
            csq.wcdma.bit_error_rate = values[15];
            csq.nr.ss_rsrp = values[16];
            csq.nr.ss_rsrq = values[17];
            csq.nr.ss_sinr = values[18];
            csq.nr.csi_rsrp = values[19];
            csq.nr.csi_rsrq = values[20];
            csq.nr.csi_sinr = values[21];
        }
        if count >= 14 {
            csq.tdscdma.rscp = values[13];
        }
        if count >= 13 {
            csq.lte.timing_advance = values[12];
        }

        csq.gsm.signal_strength = values[0];
        csq.gsm.bit_error_rate = values[1];
        csq.cdma.dbm = values[2];
        csq.cdma.ecio = values[3];
        csq.evdo.dbm = values[4];
        csq.evdo.ecio = values[5];
        csq.evdo.signal_noise_ratio = values[6];
        csq.lte.signal_strength = values[7];
        csq.lte.rsrp = values[8];
        csq.lte.rsrq = values[9];
        csq.lte.rssnr = values[10];
        csq.lte.cqi = values[11];

        Some(csq)
    }
}
