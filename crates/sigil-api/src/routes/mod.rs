//! # API Route Modules
//!
//! - `proof`: Groth16 proof generation for a payload hash or field element.
//! - `share`: Share link / payload decoding.
//! - `receipt`: Proof verification with cached receipts.

pub mod proof;
pub mod receipt;
pub mod share;
