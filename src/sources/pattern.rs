use std::{ops::Deref, str::FromStr};

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Regular expression usable in tool definitions ('regex' doesn't support serde)
#[derive(Debug, Clone)]
pub struct Pattern(pub Regex);

impl Pattern {
    /// Text matched by the first capture group, or by the whole pattern if it has none
    pub fn extract_all<'a>(&'a self, haystack: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .captures_iter(haystack)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
            .map(|m| m.as_str())
    }
}

impl Deref for Pattern {
    type Target = Regex;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl Serialize for Pattern {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let buf = String::deserialize(deserializer)?;
        Regex::new(&buf).map(Self).map_err(serde::de::Error::custom)
    }
}

impl FromStr for Pattern {
    type Err = regex::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Regex::new(s).map(Self)
    }
}
