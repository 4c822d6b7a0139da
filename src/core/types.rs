//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`ContainerId`] - Identifier of the container view a stack is hosted in
//! - [`ScreenType`] - Validated type identifier used to re-instantiate a screen
//! - [`ScreenKey`] - Identity of one live screen instance
//! - [`ViewRef`] - Opaque identity of a view taking part in a shared-element transition
//! - [`TransitionId`] - Transition resource identifier (`0` means none)
//! - [`Blob`] - Opaque payload (arguments, saved state) persisted as hex
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use backstack::core::types::{Blob, ContainerId, ScreenType};
//!
//! let container = ContainerId::new(16908290);
//! let screen_type = ScreenType::new("app.screens.Detail").unwrap();
//! let args = Blob::from("item=42");
//!
//! assert_eq!(container.get(), 16908290);
//! assert_eq!(screen_type.as_str(), "app.screens.Detail");
//! assert_eq!(args.to_hex(), "6974656d3d3432");
//!
//! // Invalid constructions fail at creation time
//! assert!(ScreenType::new("").is_err());
//! assert!(Blob::from_hex("not hex").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid screen type: {0}")]
    InvalidScreenType(String),

    #[error("invalid blob encoding: {0}")]
    InvalidBlob(String),
}

/// Identifier of the container a back-stack lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(i32);

impl ContainerId {
    /// Create a container id.
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// The raw integer id.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A validated screen type identifier.
///
/// This is whatever the host needs to build a fresh instance of the
/// screen, typically a fully-qualified type name. It must not be empty
/// and must not contain control characters.
///
/// # Example
///
/// ```
/// use backstack::core::types::ScreenType;
///
/// let ty = ScreenType::new("app.screens.Home").unwrap();
/// assert_eq!(ty.to_string(), "app.screens.Home");
///
/// assert!(ScreenType::new("   ").is_err());
/// assert!(ScreenType::new("bad\nname").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScreenType(String);

impl ScreenType {
    /// Create a new validated screen type.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidScreenType` if the name is blank or
    /// contains control characters.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TypeError::InvalidScreenType(
                "screen type cannot be empty".into(),
            ));
        }
        if name.chars().any(|c| c.is_control()) {
            return Err(TypeError::InvalidScreenType(
                "screen type cannot contain control characters".into(),
            ));
        }
        Ok(Self(name))
    }

    /// Get the type identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ScreenType {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScreenType> for String {
    fn from(value: ScreenType) -> Self {
        value.0
    }
}

impl std::fmt::Display for ScreenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a single screen instance.
///
/// Two [`Screen`](crate::core::screen::Screen) handles refer to the same
/// instance exactly when their keys are equal. A screen reconstructed from
/// a stack entry is a new instance and gets a new key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScreenKey(Uuid);

impl ScreenKey {
    /// Generate a fresh key.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScreenKey {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScreenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to a view in the host's view hierarchy.
///
/// Only identity matters: the host hands these out and resolves them
/// when wiring shared-element transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewRef(u64);

impl ViewRef {
    /// Wrap a host-defined view identity.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw identity.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Identifier of a transition (animation) resource.
///
/// `TransitionId::NONE` (0) means "no custom transition".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionId(i32);

impl TransitionId {
    /// No custom transition.
    pub const NONE: Self = Self(0);

    /// Wrap a host-defined resource id.
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// The raw resource id.
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Whether this is [`TransitionId::NONE`].
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// An opaque byte payload.
///
/// Used for screen arguments and captured reconstruction state. The
/// contents are never interpreted by this crate. Serialized as a
/// lowercase hex string.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Blob(Vec<u8>);

impl Blob {
    /// Wrap raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Decode a hex string.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBlob` if the input is not valid hex.
    pub fn from_hex(encoded: &str) -> Result<Self, TypeError> {
        hex::decode(encoded)
            .map(Self)
            .map_err(|e| TypeError::InvalidBlob(e.to_string()))
    }

    /// Encode as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Blob {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Blob {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl TryFrom<String> for Blob {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Blob> for String {
    fn from(value: Blob) -> Self {
        value.to_hex()
    }
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(text) => write!(f, "Blob({text:?})"),
            Err(_) => write!(f, "Blob(0x{})", self.to_hex()),
        }
    }
}
