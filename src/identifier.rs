//! Namespaced resource identifiers, `namespace:path`.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::cache::{CodecCache, Derive};
use crate::codec::Codec;
use crate::error::{BuildError, CodecError};
use crate::ops::{NodeKind, Operations};
use crate::result::CodecResult;

static NAMESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid regex"));
static PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_/\\.]*$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("identifier `{0}` has no `:` separator")]
    MissingSeparator(String),
    #[error("namespace `{0}` is illegal")]
    InvalidNamespace(String),
    #[error("path `{0}` is illegal")]
    InvalidPath(String),
    #[error("identifier `{0}` already has an extension")]
    ExtensionPresent(Identifier),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    namespace: String,
    path: String,
}

impl Identifier {
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Result<Self, IdentifierError> {
        let namespace = namespace.into();
        let path = path.into();
        validate_namespace(&namespace)?;
        validate_path(&path)?;
        Ok(Self { namespace, path })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Everything after the last `/`, or the whole path.
    pub fn filename(&self) -> &str {
        match self.path.rfind('/') {
            Some(index) => &self.path[index + 1..],
            None => &self.path,
        }
    }

    /// Everything before the last `/`, if there is one.
    pub fn directory(&self) -> Option<&str> {
        self.path.rfind('/').map(|index| &self.path[..index])
    }

    /// `None` for `ns:file`, `Some("")` for `ns:file.`.
    pub fn extension(&self) -> Option<&str> {
        let filename = self.filename();
        filename.rfind('.').map(|index| &filename[index + 1..])
    }

    pub fn with_extension(&self, extension: &str) -> Result<Self, IdentifierError> {
        if self.extension().is_some() {
            return Err(IdentifierError::ExtensionPresent(self.clone()));
        }
        self.append(&format!(".{extension}"))
    }

    /// `prefix/path`
    pub fn prefix_path(&self, prefix: &str) -> Result<Self, IdentifierError> {
        validate_path(prefix)?;
        Self::new(self.namespace.clone(), format!("{prefix}/{}", self.path))
    }

    pub fn append(&self, suffix: &str) -> Result<Self, IdentifierError> {
        Self::new(self.namespace.clone(), format!("{}{suffix}", self.path))
    }

    /// `prefix/path suffix`, e.g. `shader/basic` + `.json`.
    pub fn normalize(&self, prefix: &str, suffix: &str) -> Result<Self, IdentifierError> {
        Self::new(self.namespace.clone(), format!("{prefix}/{}{suffix}", self.path))
    }
}

fn validate_namespace(namespace: &str) -> Result<(), IdentifierError> {
    if NAMESPACE.is_match(namespace) {
        Ok(())
    } else {
        Err(IdentifierError::InvalidNamespace(namespace.to_owned()))
    }
}

fn validate_path(path: &str) -> Result<(), IdentifierError> {
    if PATH.is_match(path) {
        Ok(())
    } else {
        Err(IdentifierError::InvalidPath(path.to_owned()))
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, path) = s
            .split_once(':')
            .ok_or_else(|| IdentifierError::MissingSeparator(s.to_owned()))?;
        Self::new(namespace, path)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

/// String codec for [`Identifier`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierCodec;

impl Codec for IdentifierCodec {
    type Value = Identifier;

    fn decode<O: Operations>(&self, ops: &O, input: &O::Node) -> CodecResult<Identifier> {
        ops.to_string(input).flat_map(|s| match s.parse::<Identifier>() {
            Ok(id) => CodecResult::success(id),
            Err(_) => CodecResult::error(move || format!("\"{s}\" is not a valid identifier")),
        })
    }

    fn encode_onto<O: Operations>(
        &self,
        ops: &O,
        value: &Identifier,
        prefix: O::Node,
    ) -> CodecResult<O::Node> {
        let found = ops.kind(&prefix);
        if found != NodeKind::Blank {
            return CodecResult::fail(CodecError::UnsupportedPrefix {
                type_name: "Identifier",
                found,
            });
        }
        CodecResult::success(ops.from_string(&value.to_string()))
    }

    fn type_name(&self) -> &'static str {
        "Identifier"
    }
}

impl Derive for Identifier {
    type Codec = IdentifierCodec;

    fn derive(_: &CodecCache) -> Result<IdentifierCodec, BuildError> {
        Ok(IdentifierCodec)
    }
}
