/// Which kind of device a runtime should select.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DeviceKind {
    /// A discrete GPU.
    #[serde(rename = "discrete")]
    Discrete,
    /// An integrated GPU.
    #[serde(rename = "integrated")]
    Integrated,
    /// A virtual GPU.
    #[serde(rename = "virtual")]
    Virtual,
    /// A software rasterizer.
    #[serde(rename = "cpu")]
    Cpu,
    /// Whatever the runtime considers the best device.
    #[default]
    #[serde(rename = "default")]
    Default,
}

impl DeviceKind {
    /// Parse the value of an environment variable.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "discrete" => Some(Self::Discrete),
            "integrated" => Some(Self::Integrated),
            "virtual" => Some(Self::Virtual),
            "cpu" => Some(Self::Cpu),
            "default" => Some(Self::Default),
            _ => None,
        }
    }
}

/// Device selection.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct DeviceConfig {
    /// The kind of device to use.
    #[serde(default)]
    pub kind: DeviceKind,
}
