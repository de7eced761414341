//! Supported Windows Server image tags and the facts that differ between them.

use crate::error::HarnessError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;


/// Version identifier of the base image under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Tag {
    V1709,
    V1803,
    V2019,
}

impl Tag {
    pub const ALL: [Tag; 3] = [Tag::V1709, Tag::V1803, Tag::V2019];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::V1709 => "1709",
            Tag::V1803 => "1803",
            Tag::V2019 => "2019",
        }
    }

    /// Release key of the .NET Framework 4.x shipped with this OS build.
    ///
    /// See <https://docs.microsoft.com/en-us/dotnet/framework/migration-guide/release-keys-and-os-versions>.
    pub fn dotnet_release(&self) -> &'static str {
        match self {
            // 4.7.1 on Windows Server, version 1709
            Tag::V1709 => "461308",
            // 4.7.2 on Windows Server, version 1803
            Tag::V1803 => "461808",
            // 4.7.2 on all other Windows operating systems
            Tag::V2019 => "461814",
        }
    }

    /// Visual C++ runtime DLLs that must be present in System32
    pub fn required_vc_runtime_dlls(&self) -> &'static [&'static str] {
        match self {
            Tag::V1709 | Tag::V1803 => &["msvcp140.dll", "vcruntime140.dll"],
            Tag::V2019 => &["msvcp140.dll", "vcruntime140.dll", "vcruntime140_1.dll"],
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s.trim())
            .ok_or_else(|| HarnessError::UnknownTag(s.to_string()))
    }
}

impl TryFrom<String> for Tag {
    type Error = HarnessError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.as_str().to_string()
    }
}
