fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::path::PathBuf;

    // Proto files are relative to workspace root
    let proto_dir = PathBuf::from("../../proto");
    let protos = [proto_dir.join("immurest.proto")];

    for proto in &protos {
        if !proto.exists() {
            panic!("Proto file not found: {}", proto.display());
        }
    }

    // Use the vendored protoc so builds don't depend on a system install
    std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path().unwrap());

    // Server stubs back the in-process test backend
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&protos, &[&proto_dir])?;

    for proto in &protos {
        println!("cargo:rerun-if-changed={}", proto.display());
    }
    println!("cargo:rerun-if-changed=build.rs");

    Ok(())
}
