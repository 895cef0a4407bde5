//! Build script for chirp-proto.
//!
//! Compiles the protobuf definitions into Rust code using tonic-prost-build.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo::rerun-if-changed=../../proto/chirp/v1/chirp.proto");

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .emit_rerun_if_changed(true)
        .compile_protos(&["../../proto/chirp/v1/chirp.proto"], &["../../proto"])?;

    Ok(())
}
