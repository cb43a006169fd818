use std::env;
use std::path::PathBuf;

/// Print FFmpeg discovery hints for Windows builds.
///
/// `ffmpeg-sys-next` finds FFmpeg through `FFMPEG_DIR` or pkg-config; on
/// Windows neither is usually set up, so point at a vcpkg install if one
/// exists.
fn main() {
    for variable in ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    let is_windows = env::var("CARGO_CFG_TARGET_OS").is_ok_and(|os| os == "windows");
    if !is_windows || env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!(
            "cargo:warning=vid2train needs FFmpeg: set FFMPEG_DIR, or install FFmpeg with vcpkg and set VCPKG_ROOT."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let ffmpeg_dir = PathBuf::from(vcpkg_root).join("installed").join(triplet);

    if ffmpeg_dir.exists() {
        println!(
            "cargo:warning=Found vcpkg FFmpeg at {0}; set FFMPEG_DIR={0} to use it explicitly.",
            ffmpeg_dir.display()
        );
    } else {
        println!(
            "cargo:warning=VCPKG_ROOT is set but {} does not exist.",
            ffmpeg_dir.display()
        );
    }
}
