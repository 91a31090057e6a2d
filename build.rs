// build.rs

fn main() {
    // --- Link against Xlib ---
    // pkg-config is tried first. If it cannot find the library (no .pc file,
    // pkg-config missing) we fall back to plain linker flags.
    println!("cargo:rerun-if-changed=build.rs");

    if pkg_config::probe_library("x11").is_err() {
        eprintln!("pkg-config failed for library 'x11'. Falling back to manual linking.");
        println!("cargo:rustc-link-lib=X11");
        println!("cargo:rustc-link-search=/usr/lib");
        eprintln!("Manual linking flags applied. Ensure the X11 development library is installed.");
    } else {
        eprintln!("pkg-config successfully found libX11. Linking configured automatically.");
    }
}
