use std::{env, path::PathBuf};

fn main() {
    println!("cargo::rustc-check-cfg=cfg(vc_mmal)");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=VC_SDK_DIR");

    let target = env::var("TARGET").unwrap();

    if !(target.contains("linux") && (target.starts_with("arm") || target.starts_with("aarch64"))) {
        println!("cargo:warning=Building without MMAL (not a Raspberry Pi target), using software ISP");
        return;
    }

    let sdk_dir = PathBuf::from(env::var("VC_SDK_DIR").unwrap_or_else(|_| "/opt/vc".to_string()));
    let include_dir = sdk_dir.join("include");

    if !include_dir.join("interface/mmal/mmal.h").exists() {
        println!(
            "cargo:warning=MMAL headers not found under {}, using software ISP",
            include_dir.display()
        );
        return;
    }

    println!("cargo:rustc-cfg=vc_mmal");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Link VideoCore userland libraries
    println!("cargo:rustc-link-search=native={}", sdk_dir.join("lib").display());
    println!("cargo:rustc-link-lib=dylib=bcm_host");
    println!("cargo:rustc-link-lib=dylib=vcos");
    println!("cargo:rustc-link-lib=dylib=mmal_core");
    println!("cargo:rustc-link-lib=dylib=mmal_util");
    println!("cargo:rustc-link-lib=dylib=mmal_vc_client");

    //
    // ---- Generate MMAL bindings ----
    //
    let bindings = bindgen::Builder::default()
        .header_contents("mmal_wrapper.h", r#"
            #include <bcm_host.h>
            #include <interface/mmal/mmal.h>
            #include <interface/mmal/util/mmal_component_wrapper.h>
        "#)
        .clang_arg(format!("-I{}", include_dir.display()))
        .clang_arg(format!("-I{}", include_dir.join("interface/vcos/pthreads").display()))
        .clang_arg(format!("-I{}", include_dir.join("interface/vmcs_host/linux").display()))
        // Host init
        .allowlist_function("bcm_host_init")
        // Component wrapper
        .allowlist_function("mmal_wrapper_create")
        .allowlist_function("mmal_wrapper_destroy")
        .allowlist_function("mmal_wrapper_port_enable")
        .allowlist_function("mmal_wrapper_port_disable")
        .allowlist_function("mmal_wrapper_buffer_get_empty")
        .allowlist_function("mmal_wrapper_buffer_get_full")
        // Ports and buffers
        .allowlist_function("mmal_port_format_commit")
        .allowlist_function("mmal_port_send_buffer")
        .allowlist_function("mmal_buffer_header_release")
        // Types
        .allowlist_type("MMAL_WRAPPER_T")
        .allowlist_type("MMAL_PORT_T")
        .allowlist_type("MMAL_BUFFER_HEADER_T")
        .allowlist_type("MMAL_ES_FORMAT_T")
        .allowlist_type("MMAL_VIDEO_FORMAT_T")
        .allowlist_type("MMAL_STATUS_T")
        // Flag values for the wrapper calls and for buffer headers
        .allowlist_var("MMAL_WRAPPER_FLAG_.*")
        .allowlist_var("MMAL_BUFFER_HEADER_FLAG_.*")
        .raw_line("// Mark extern blocks as unsafe for Rust 2024")
        .generate()
        .expect("Unable to generate MMAL bindings");

    let out_path = out_dir.join("mmal_bindings.rs");
    bindings
        .write_to_file(&out_path)
        .expect("Couldn't write MMAL bindings!");

    // Read the generated file and add unsafe to extern blocks
    let contents = std::fs::read_to_string(&out_path).unwrap();
    let fixed = contents.replace("extern \"C\" {", "unsafe extern \"C\" {");
    std::fs::write(&out_path, fixed).unwrap();
}
