//! Utility modules for macro-replay.

pub mod cancel;

pub use cancel::CancelToken;
