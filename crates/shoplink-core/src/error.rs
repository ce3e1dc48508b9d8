//! # Error Types
//!
//! Domain-specific error types for shoplink-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shoplink-core errors (this file)                                      │
//! │  └── CoreError        - Codec and domain errors                        │
//! │                                                                         │
//! │  shoplink-api errors (separate crate)                                  │
//! │  └── ApiError         - Transport + classified remote failures         │
//! │                                                                         │
//! │  shoplink-session errors (separate crate)                              │
//! │  └── SessionError     - What the command surface sees                  │
//! │                                                                         │
//! │  Flow: CoreError → SessionError → chat feedback                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (key path, slot index, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent codec failures or domain invariant violations.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A JSON node could not be decoded into a tag value.
    ///
    /// ## When This Occurs
    /// - A `null` appears inside a tag document
    /// - A number does not fit any supported numeric kind
    ///
    /// The `path` names the offending node, e.g. `Display.Lore[2]`.
    #[error("Cannot decode tag node at '{path}': {reason}")]
    Parse { path: String, reason: String },

    /// An item record violated a structural invariant.
    ///
    /// ## When This Occurs
    /// - A record is constructed with `count == 0` (empty slots carry no
    ///   record at all; a zero-count record is always a bug upstream)
    #[error("Invalid item record for {item_id}: {reason}")]
    InvalidRecord { item_id: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::Parse {
            path: "Display.Lore[2]".to_string(),
            reason: "null is not a tag value".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot decode tag node at 'Display.Lore[2]': null is not a tag value"
        );

        let err = CoreError::InvalidRecord {
            item_id: "minecraft:stone".to_string(),
            reason: "count must be > 0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid item record for minecraft:stone: count must be > 0"
        );
    }
}
