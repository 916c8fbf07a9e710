use crate::parser::Parser;

/// One configured PDP context.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PdpContext {
    pub index: i32,
    /// `IP`, `IPV6` or `IPV4V6`.
    pub pdp_type: String,
    pub apn: String,
    pub addr: String,
    pub d_comp: i32,
    pub h_comp: i32,
}

/// `+CGDCONT: <cid>,"<type>","<apn>",<addr>,<d_comp>,<h_comp>` per context.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cgdcont {
    pub contexts: Vec<PdpContext>,
}

impl Cgdcont {
    /// `payload` still carries the `+CGDCONT:` header of every line.
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut contexts = Vec::new();

        let mut parser = Parser::new(payload);
        while parser.has_more() {
            let mut context = PdpContext {
                index: -1,
                pdp_type: String::new(),
                apn: String::new(),
                addr: String::new(),
                d_comp: 0,
                h_comp: 0,
            };

            if !parser
                .skip_str("+CGDCONT:")
                .skip(b' ')
                .int(&mut context.index)
                .skip(b',')
                .skip(b'"')
                .string(b'"', &mut context.pdp_type)
                .skip(b',')
                .skip(b'"')
                .string(b'"', &mut context.apn)
                .skip(b',')
                .string(b',', &mut context.addr)
                .int(&mut context.d_comp)
                .skip(b',')
                .int(&mut context.h_comp)
                .skip(b' ')
                .match_so_far()
            {
                return None;
            }

            contexts.push(context);
        }

        Some(Self { contexts })
    }
}

/// `+CGCONTRDP: <cid>,<bearer>,"<apn>",<local addr>[/<prefix>],<gw>,<dns1>[,<dns2>]`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cgcontrdp {
    pub cid: i32,
    pub bearer: i32,
    pub apn: String,
    pub local_addr: String,
    /// Prefix length when the local address carries one, else 0.
    pub local_addr_size: i32,
    pub gw_addr: String,
    pub dns1: String,
    pub dns2: String,
}

impl Cgcontrdp {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let mut cid = -1;
        let mut bearer = -1;
        let mut apn = "";
        let mut local = "";
        let mut gw_addr = "";

        let mut parser = Parser::new(payload);
        if !parser
            .int(&mut cid)
            .skip(b',')
            .int(&mut bearer)
            .skip(b',')
            .skip(b'"')
            .field(b'"', &mut apn)
            .skip(b',')
            .field(b',', &mut local)
            .field(b',', &mut gw_addr)
            .match_so_far()
        {
            return None;
        }
        let dns = parser.remaining();
        let (dns1, dns2) = dns.split_once(',').unwrap_or((dns, ""));

        let mut addr = "";
        let mut prefix = 0;
        let (local_addr, local_addr_size) = if Parser::new(local)
            .field(b'/', &mut addr)
            .int(&mut prefix)
            .full_match()
        {
            (addr, prefix)
        } else {
            (local, 0)
        };

        Some(Self {
            cid,
            bearer,
            apn: apn.to_string(),
            local_addr: local_addr.to_string(),
            local_addr_size,
            gw_addr: gw_addr.to_string(),
            dns1: dns1.to_string(),
            dns2: dns2.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cgdcont_contexts() {
        let cgdcont = Cgdcont::parse(
            "+CGDCONT: 1,\"IPV6\",\"fast.t-mobile.com\",,0,0\r+CGDCONT: 2,\"IP\",\"ims\",10.0.2.15,1,1\r",
        )
        .unwrap();

        assert_eq!(cgdcont.contexts.len(), 2);
        let first = &cgdcont.contexts[0];
        assert_eq!(first.index, 1);
        assert_eq!(first.pdp_type, "IPV6");
        assert_eq!(first.apn, "fast.t-mobile.com");
        assert_eq!(first.addr, "");
        let second = &cgdcont.contexts[1];
        assert_eq!(second.addr, "10.0.2.15");
        assert_eq!((second.d_comp, second.h_comp), (1, 1));
    }

    #[test]
    fn cgdcont_rejects_missing_apn() {
        assert!(Cgdcont::parse("+CGDCONT: 1,\"IP\"\r").is_none());
    }

    #[test]
    fn cgcontrdp_with_prefix() {
        let rdp = Cgcontrdp::parse("1,5,\"epc.tmobile.com\",10.0.2.15/24,10.0.2.2,10.0.2.3")
            .unwrap();
        assert_eq!((rdp.cid, rdp.bearer), (1, 5));
        assert_eq!(rdp.apn, "epc.tmobile.com");
        assert_eq!(rdp.local_addr, "10.0.2.15");
        assert_eq!(rdp.local_addr_size, 24);
        assert_eq!(rdp.gw_addr, "10.0.2.2");
        assert_eq!(rdp.dns1, "10.0.2.3");
        assert_eq!(rdp.dns2, "");
    }

    #[test]
    fn cgcontrdp_without_prefix_and_two_dns() {
        let rdp =
            Cgcontrdp::parse("1,5,\"epc\",10.0.2.15,10.0.2.2,10.0.2.3,8.8.8.8").unwrap();
        assert_eq!(rdp.local_addr, "10.0.2.15");
        assert_eq!(rdp.local_addr_size, 0);
        assert_eq!(rdp.dns1, "10.0.2.3");
        assert_eq!(rdp.dns2, "8.8.8.8");
    }

    #[test]
    fn cgcontrdp_rejects_short() {
        assert!(Cgcontrdp::parse("1,5,\"epc\"").is_none());
    }
}
