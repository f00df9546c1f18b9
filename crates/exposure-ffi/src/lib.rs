//! UniFFI bindings crate for the exposure library
//!
//! This crate wraps the exposure crate for UniFFI library mode binding
//! generation. It re-exports the FFI module and UniFFI scaffolding.
//!
//! ## Building for Swift
//!
//! 1. Build the library for Apple platforms:
//!    ```bash
//!    cargo build --release -p exposure-ffi --target aarch64-apple-ios
//!    cargo build --release -p exposure-ffi --target aarch64-apple-ios-sim
//!    ```
//!
//! 2. Generate Swift bindings:
//!    ```bash
//!    cargo run -p exposure-ffi --features bindgen --bin uniffi-bindgen generate \
//!        --library target/aarch64-apple-ios/release/libexposure_ffi.dylib \
//!        --language swift \
//!        --out-dir generated/swift
//!    ```
//!
//! Kotlin works the same way with `--language kotlin`.

pub use exposure::ffi::*;

// Library mode needs the scaffolding re-exported from the crate that defines it
exposure::uniffi_reexport_scaffolding!();
