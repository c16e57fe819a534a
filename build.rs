fn main() {
    // Declared here because `tauri_build::build()` is skipped for core-only builds.
    println!("cargo:rustc-check-cfg=cfg(desktop)");
    println!("cargo:rustc-check-cfg=cfg(mobile)");

    // Without the `app` feature there is no `tauri` crate and no `DEP_TAURI_*`
    // env for the build helper to read.
    if std::env::var_os("CARGO_FEATURE_APP").is_some() {
        tauri_build::build()
    }
}
