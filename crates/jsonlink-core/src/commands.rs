use serde::{Deserialize, Serialize};

// Request envelope understood by the controller firmware: the numeric "T"
// field selects the command, e.g. {"T":65}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "T")]
    pub code: u16,
}

impl Request {
    pub fn new(code: u16) -> Self {
        Self { code }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceQuery {
    WifiInfo,
    PowerInfo,
    ImuInfo,
    DeviceInfo,
}

impl DeviceQuery {
    pub const ALL: [DeviceQuery; 4] = [
        DeviceQuery::WifiInfo,
        DeviceQuery::PowerInfo,
        DeviceQuery::ImuInfo,
        DeviceQuery::DeviceInfo,
    ];

    pub const fn code(&self) -> u16 {
        match self {
            DeviceQuery::WifiInfo => 65,
            DeviceQuery::PowerInfo => 70,
            DeviceQuery::ImuInfo => 71,
            DeviceQuery::DeviceInfo => 74,
        }
    }

    /// Response field printed alongside the full payload.
    pub const fn summary_field(&self) -> &'static str {
        match self {
            DeviceQuery::WifiInfo => "AP_NAME",
            DeviceQuery::PowerInfo => "load_V",
            DeviceQuery::ImuInfo => "temp",
            DeviceQuery::DeviceInfo => "MAC",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            DeviceQuery::WifiInfo => "to get wifi info",
            DeviceQuery::PowerInfo => "to get power info",
            DeviceQuery::ImuInfo => "to get imu info",
            DeviceQuery::DeviceInfo => "to get device info",
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.code() == code)
    }

    pub fn request(&self) -> Request {
        Request::new(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_uppercase_t() {
        assert_eq!(DeviceQuery::WifiInfo.request().to_json().unwrap(), r#"{"T":65}"#);
        assert_eq!(DeviceQuery::DeviceInfo.request().to_json().unwrap(), r#"{"T":74}"#);
    }

    #[test]
    fn request_parses_back_from_device_echo() {
        let req: Request = serde_json::from_str(r#"{"T":70}"#).unwrap();
        assert_eq!(req, DeviceQuery::PowerInfo.request());
    }

    #[test]
    fn from_code_finds_known_queries_only() {
        assert_eq!(DeviceQuery::from_code(71), Some(DeviceQuery::ImuInfo));
        assert_eq!(DeviceQuery::from_code(66), None);
    }

    #[test]
    fn codes_are_unique() {
        for (i, a) in DeviceQuery::ALL.iter().enumerate() {
            for b in &DeviceQuery::ALL[i + 1..] {
                assert_ne!(a.code(), b.code());
            }
        }
    }
}
