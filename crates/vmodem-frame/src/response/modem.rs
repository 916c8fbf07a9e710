use crate::parser::Parser;

/// Radio power as reported by `+CFUN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum RadioState {
    Off,
    On,
}

/// `+CFUN: <fun>`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cfun {
    pub state: RadioState,
}

impl Cfun {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut fun = 0;
        if !Parser::new(payload).int(&mut fun).full_match() {
            return None;
        }

        let state = if fun != 0 {
            RadioState::On
        } else {
            RadioState::Off
        };
        Some(Self { state })
    }
}

/// Radio access technology families, in bit order of the `+CTEC` masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ModemTechnology {
    Gsm = 0,
    Wcdma = 1,
    Cdma = 2,
    Evdo = 3,
    Tdscdma = 4,
    Lte = 5,
    Nr = 6,
}

impl ModemTechnology {
    pub const ALL: [ModemTechnology; 7] = [
        Self::Gsm,
        Self::Wcdma,
        Self::Cdma,
        Self::Evdo,
        Self::Tdscdma,
        Self::Lte,
        Self::Nr,
    ];

    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }
}

/// `+CTEC: ...`, the current and preferred technology, the supported list or `DONE`.
///
/// Values are kept as sent; the different shapes are told apart by the
/// request that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Ctec {
    pub values: Vec<String>,
}

impl Ctec {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        Some(Self {
            values: payload.split(',').map(str::to_string).collect(),
        })
    }

    /// `+CTEC: DONE`, the acknowledgement of a technology change.
    pub fn is_done(&self) -> bool {
        self.values.len() == 1 && self.values[0] == "DONE"
    }

    /// The technology named by the lowest set bit of the first value, for
    /// the `current[,preferred]` shape.
    pub fn current_modem_technology(&self) -> Option<ModemTechnology> {
        if self.values.is_empty() || self.values.len() > 2 || self.is_done() {
            return None;
        }

        let mask: i32 = self.values[0].parse().ok()?;
        ModemTechnology::ALL
            .into_iter()
            .find(|&tech| mask & (1 << tech as i32) != 0)
    }
}

/// Network time zone update: `%CTZV: yy/MM/dd:hh:mm:ss±tz:dst:name`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Ctzv {
    pub tz_name: String,
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub is_daylight_saving: bool,
    /// Offset from UTC in quarter hours.
    pub tz_offset_15m: i8,
}

impl Ctzv {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let (mut yy, mut month, mut day) = (0, 0, 0);
        let (mut hh, mut mm, mut ss) = (0, 0, 0);
        let mut tz_sign = ' ';
        let mut tz_offset = 0;
        let mut daylight = ' ';

        let mut parser = Parser::new(payload);
        parser
            .skip(b' ')
            .int(&mut yy)
            .skip(b'/')
            .int(&mut month)
            .skip(b'/')
            .int(&mut day)
            .skip(b':')
            .int(&mut hh)
            .skip(b':')
            .int(&mut mm)
            .skip(b':')
            .int(&mut ss)
            .char(&mut tz_sign)
            .int(&mut tz_offset)
            .skip(b':')
            .char(&mut daylight)
            .skip(b':');
        if !parser.match_so_far() {
            return None;
        }

        let tz_offset = match tz_sign {
            '+' => tz_offset,
            '-' => -tz_offset,
            _ => return None,
        };

        Some(Self {
            tz_name: parser.remaining().to_string(),
            year: u16::try_from(yy + 2000).ok()?,
            month: u8::try_from(month).ok()?,
            day: u8::try_from(day).ok()?,
            hour: u8::try_from(hh).ok()?,
            minute: u8::try_from(mm).ok()?,
            second: u8::try_from(ss).ok()?,
            is_daylight_saving: daylight != '0',
            tz_offset_15m: i8::try_from(tz_offset).ok()?,
        })
    }

    /// The update rendered back in NITZ form, e.g. `24/11/05:17:01:32-32:0:America!Los_Angeles`.
    pub fn nitz_string(&self) -> String {
        format!(
            "{:02}/{:02}/{:02}:{:02}:{:02}:{:02}{:+}:{}:{}",
            self.year % 100,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.tz_offset_15m,
            u8::from(self.is_daylight_saving),
            self.tz_name
        )
    }
}

/// Physical channel config: `%CGFPCCFG: status,bandwidth,mtech,freq,cid`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cgfpccfg {
    /// Cell connection status code (0 none, 1 primary, 2 secondary).
    pub status: i32,
    pub bandwidth: i32,
    /// Raw technology index; see [`Cgfpccfg::modem_technology`].
    pub mtech: i32,
    pub freq: i32,
    pub context_id: i32,
}

impl Cgfpccfg {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut cfg = Self {
            status: -1,
            bandwidth: -1,
            mtech: -1,
            freq: -1,
            context_id: -1,
        };

        Parser::new(payload)
            .int(&mut cfg.status)
            .skip(b',')
            .int(&mut cfg.bandwidth)
            .skip(b',')
            .int(&mut cfg.mtech)
            .skip(b',')
            .int(&mut cfg.freq)
            .skip(b',')
            .int(&mut cfg.context_id)
            .full_match()
            .then_some(cfg)
    }

    pub fn modem_technology(&self) -> Option<ModemTechnology> {
        ModemTechnology::from_code(self.mtech)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cfun_nonzero_is_on() {
        assert_eq!(Cfun::parse("1").unwrap().state, RadioState::On);
        assert_eq!(Cfun::parse("4").unwrap().state, RadioState::On);
        assert_eq!(Cfun::parse("0").unwrap().state, RadioState::Off);
        assert!(Cfun::parse("1,0").is_none());
    }

    #[test]
    fn ctec_current_technology_is_lowest_bit() {
        let ctec = Ctec::parse("32,1f").unwrap();
        assert_eq!(ctec.values, vec!["32".to_string(), "1f".to_string()]);
        assert_eq!(ctec.current_modem_technology(), Some(ModemTechnology::Lte));

        let ctec = Ctec::parse("96").unwrap();
        assert_eq!(ctec.current_modem_technology(), Some(ModemTechnology::Lte));
    }

    #[test]
    fn ctec_done_and_lists() {
        let done = Ctec::parse("DONE").unwrap();
        assert!(done.is_done());
        assert_eq!(done.current_modem_technology(), None);

        let supported = Ctec::parse("1,2,4").unwrap();
        assert!(!supported.is_done());
        assert_eq!(supported.current_modem_technology(), None);

        assert_eq!(Ctec::parse("0").unwrap().current_modem_technology(), None);
        assert_eq!(Ctec::parse("x").unwrap().current_modem_technology(), None);
    }

    #[test]
    fn ctzv_parses_and_renders_nitz() {
        let ctzv = Ctzv::parse("24/11/05:17:01:32-32:0:America!Los_Angeles").unwrap();
        assert_eq!(ctzv.year, 2024);
        assert_eq!((ctzv.month, ctzv.day), (11, 5));
        assert_eq!((ctzv.hour, ctzv.minute, ctzv.second), (17, 1, 32));
        assert_eq!(ctzv.tz_offset_15m, -32);
        assert!(!ctzv.is_daylight_saving);
        assert_eq!(ctzv.tz_name, "America!Los_Angeles");
        assert_eq!(
            ctzv.nitz_string(),
            "24/11/05:17:01:32-32:0:America!Los_Angeles"
        );
    }

    #[test]
    fn ctzv_positive_offset_with_dst() {
        let ctzv = Ctzv::parse(" 25/03/30:02:00:00+8:1:Europe!Berlin").unwrap();
        assert_eq!(ctzv.tz_offset_15m, 8);
        assert!(ctzv.is_daylight_saving);
        assert_eq!(ctzv.nitz_string(), "25/03/30:02:00:00+8:1:Europe!Berlin");
    }

    #[test]
    fn ctzv_rejects_bad_sign() {
        assert!(Ctzv::parse("24/11/05:17:01:32*32:0:UTC").is_none());
        assert!(Ctzv::parse("24/11/05").is_none());
    }

    #[test]
    fn cgfpccfg_fields() {
        let cfg = Cgfpccfg::parse("1,5000,5,0,1").unwrap();
        assert_eq!(cfg.status, 1);
        assert_eq!(cfg.bandwidth, 5000);
        assert_eq!(cfg.modem_technology(), Some(ModemTechnology::Lte));
        assert_eq!(cfg.freq, 0);
        assert_eq!(cfg.context_id, 1);
        assert!(Cgfpccfg::parse("1,5000,5,0").is_none());
    }
}
