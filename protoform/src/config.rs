//! Behavior switches shared by every codec built from one registry.

/// What the decoder does when a known field arrives with a wire type its
/// descriptor cannot accept.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MismatchPolicy {
    /// Skip the payload like an unknown field and leave the field unset.
    #[default]
    Skip,
    /// Fail the decode with [`DecodeErrorKind::WireTypeMismatch`].
    ///
    /// [`DecodeErrorKind::WireTypeMismatch`]: crate::error::DecodeErrorKind::WireTypeMismatch
    Reject,
}

/// Configuration for a [`Registry`](crate::registry::Registry) and the codecs it builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Handling of known fields with an unexpected wire type.
    pub(crate) wire_type_mismatch: MismatchPolicy,

    /// Omit singular scalars holding their zero value.
    pub(crate) omit_default_scalars: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wire_type_mismatch: MismatchPolicy::Skip,
            omit_default_scalars: false,
        }
    }
}

impl Config {
    /// Create a new Config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how the decoder treats a known field with the wrong wire type.
    pub fn wire_type_mismatch(&mut self, policy: MismatchPolicy) -> &mut Self {
        self.wire_type_mismatch = policy;
        self
    }

    /// Omit singular (non-`Option`) scalars that hold zero or `false`.
    ///
    /// Off by default, in which case every singular scalar is written. Fields
    /// stored as `Option` are always written when `Some`.
    pub fn omit_default_scalars(&mut self, omit: bool) -> &mut Self {
        self.omit_default_scalars = omit;
        self
    }

    pub fn mismatch_policy(&self) -> MismatchPolicy {
        self.wire_type_mismatch
    }

    pub fn omits_default_scalars(&self) -> bool {
        self.omit_default_scalars
    }
}
