use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Fall back to the bundled protoc when none is provided by the environment.
    if std::env::var_os("PROTOC").is_none() {
        let protoc = protoc_bin_vendored::protoc_bin_path()?;
        // SAFETY: build scripts run single-threaded.
        unsafe { std::env::set_var("PROTOC", protoc) };
    }

    let well_known: PathBuf = protoc_bin_vendored::include_path()?;
    let proto_dir = PathBuf::from("proto");

    println!("cargo:rerun-if-changed=proto/todos.proto");

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&[proto_dir.join("todos.proto")], &[proto_dir, well_known])?;

    Ok(())
}
