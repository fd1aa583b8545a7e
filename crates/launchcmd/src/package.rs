// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Package names, versions and the tags combining them.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, TAG_SEPARATOR};

#[cfg(test)]
#[path = "./package_test.rs"]
mod package_test;

static PACKAGE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("valid package name regex"));

static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+$").expect("valid version regex"));

/// Validated package name, ASCII letters and digits only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageName(String);

impl PackageName {
    pub fn new<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();
        if !PACKAGE_NAME_RE.is_match(&name) {
            return Err(Error::InvalidPackageName(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of this package's module descriptor.
    pub fn module_filename(&self) -> String {
        format!("{}.{}", self.0, crate::MODULE_EXTENSION)
    }

    /// File name of this package's release manifest.
    pub fn manifest_filename(&self) -> String {
        format!("{}.{}", self.0, crate::MANIFEST_EXTENSION)
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PackageName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for PackageName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PackageName> for String {
    fn from(value: PackageName) -> Self {
        value.0
    }
}

/// Which component of a version to increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bump {
    Major,
    Minor,
    Patch,
}

/// A `MAJOR.MINOR.PATCH` release version.
///
/// Components keep the digits they were written with, so a version always
/// renders back to the tag and directory name it came from. Ordering is
/// numeric per component, so `1.10.0` sorts after `1.9.0`, and components
/// may be arbitrarily large.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    major: String,
    minor: String,
    patch: String,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major: major.to_string(),
            minor: minor.to_string(),
            patch: patch.to_string(),
        }
    }

    pub fn parse(version: &str) -> Result<Self> {
        if !VERSION_RE.is_match(version) {
            return Err(Error::InvalidVersion(version.to_string()));
        }
        let mut parts = version.split('.').map(String::from);
        // the regex guarantees exactly three components
        let (Some(major), Some(minor), Some(patch)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::InvalidVersion(version.to_string()));
        };
        Ok(Self {
            major,
            minor,
            patch,
        })
    }

    /// The next version after this one, resetting lower components.
    pub fn bump(&self, bump: Bump) -> Self {
        let zero = || "0".to_string();
        match bump {
            Bump::Major => Self {
                major: increment(&self.major),
                minor: zero(),
                patch: zero(),
            },
            Bump::Minor => Self {
                major: self.major.clone(),
                minor: increment(&self.minor),
                patch: zero(),
            },
            Bump::Patch => Self {
                major: self.major.clone(),
                minor: self.minor.clone(),
                patch: increment(&self.patch),
            },
        }
    }

    fn components(&self) -> [&str; 3] {
        [&self.major, &self.minor, &self.patch]
    }
}

/// Add one to a decimal digit string, dropping leading zeros.
fn increment(digits: &str) -> String {
    let mut bytes: Vec<u8> = digits.trim_start_matches('0').bytes().collect();
    let mut carry = true;
    for byte in bytes.iter_mut().rev() {
        if *byte == b'9' {
            *byte = b'0';
        } else {
            *byte += 1;
            carry = false;
            break;
        }
    }
    if carry {
        bytes.insert(0, b'1');
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Numeric order of two digit strings, ties broken by their spelling.
fn compare_digits(a: &str, b: &str) -> Ordering {
    let (trimmed_a, trimmed_b) = (a.trim_start_matches('0'), b.trim_start_matches('0'));
    trimmed_a
        .len()
        .cmp(&trimmed_b.len())
        .then_with(|| trimmed_a.cmp(trimmed_b))
        .then_with(|| a.cmp(b))
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components()
            .iter()
            .zip(other.components())
            .map(|(a, b)| compare_digits(a, b))
            .find(|order| order.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}

/// A `<package>#<version>` pair, used both as git tag and installed tag name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReleaseTag {
    pub package: PackageName,
    pub version: Version,
}

impl ReleaseTag {
    pub fn new(package: PackageName, version: Version) -> Self {
        Self { package, version }
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.package, TAG_SEPARATOR, self.version)
    }
}

impl FromStr for ReleaseTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (package, version) = s
            .split_once(TAG_SEPARATOR)
            .ok_or_else(|| Error::InvalidTag(s.to_string()))?;
        let package = PackageName::new(package).map_err(|_| Error::InvalidTag(s.to_string()))?;
        let version = Version::parse(version).map_err(|_| Error::InvalidTag(s.to_string()))?;
        Ok(Self::new(package, version))
    }
}
