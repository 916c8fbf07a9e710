/// Error category a `+CME ERROR` code maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum RadioError {
    OperationNotAllowed,
    RequestNotSupported,
    SimAbsent,
    SimPin2,
    SimPuk2,
    SimBusy,
    PasswordIncorrect,
    SimFull,
    InvalidArguments,
    NoSuchElement,
    NoNetworkFound,
    NetworkReject,
    GenericFailure,
}

impl RadioError {
    /// Map a numeric `+CME ERROR` code (27.007 §9.2) to its category.
    pub fn from_cme_code(code: &str) -> Self {
        match code {
            "3" => Self::OperationNotAllowed,
            "4" => Self::RequestNotSupported,
            "10" => Self::SimAbsent,
            "11" => Self::SimPin2,
            "12" => Self::SimPuk2,
            "14" => Self::SimBusy,
            "16" => Self::PasswordIncorrect,
            "20" => Self::SimFull,
            "21" | "50" => Self::InvalidArguments,
            "22" => Self::NoSuchElement,
            "30" => Self::NoNetworkFound,
            "32" | "53" => Self::NetworkReject,
            _ => Self::GenericFailure,
        }
    }
}

/// Equipment error: `+CME ERROR: <code>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CmeError {
    pub code: String,
    pub error: RadioError,
}

impl CmeError {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        Some(Self {
            code: payload.to_string(),
            error: RadioError::from_cme_code(payload),
        })
    }
}

/// SMS service error: `+CMS ERROR: <message>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CmsError {
    pub message: String,
}

impl CmsError {
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        Some(Self {
            message: payload.to_string(),
        })
    }
}
