//! Turning an object file into an executable with the system toolchain.

use std::{ffi::OsString, path::Path, process::Command};

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

/// Compiler drivers tried in order; each pulls in the C runtime for us.
#[cfg(unix)]
const DRIVERS: &[&str] = &["cc", "gcc", "clang"];

/// Link `obj` against the C library into `out_exe`.
pub fn link_executable(obj: &Path, out_exe: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        let sdk = String::from_utf8(
            Command::new("xcrun")
                .args(["--sdk", "macosx", "--show-sdk-path"])
                .output()
                .context("running xcrun")?
                .stdout,
        )?
        .trim()
        .to_string();
        let prod = String::from_utf8(Command::new("sw_vers").arg("-productVersion").output()?.stdout)?;
        let mut parts = prod.trim().split('.');
        let platform_ver = format!("{}.{}", parts.next().unwrap_or("13"), parts.next().unwrap_or("0"));
        let arch = if cfg!(target_arch = "aarch64") { "arm64" } else { "x86_64" };

        if let Some(driver) = find_driver() {
            return run_linker(Command::new(driver).arg(obj).arg("-o").arg(out_exe), "cc");
        }
        return run_linker(
            Command::new("ld")
                .arg("-o")
                .arg(out_exe)
                .args(["-arch", arch, "-platform_version", "macos", &platform_ver, &platform_ver])
                .args(["-syslibroot", &sdk, "-e", "_main"])
                .arg(obj)
                .arg("-lSystem"),
            "ld",
        );
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        if let Some(driver) = find_driver() {
            return run_linker(Command::new(driver).arg(obj).arg("-o").arg(out_exe), "cc");
        }
        let linker = which::which("ld.lld")
            .map(OsString::from)
            .unwrap_or_else(|_| OsString::from("ld"));
        return run_linker(Command::new(linker).arg(obj).arg("-o").arg(out_exe).arg("-lc"), "ld");
    }

    #[cfg(windows)]
    {
        let mut out_flag = OsString::from("/OUT:");
        out_flag.push(out_exe);
        return run_linker(
            Command::new("link.exe")
                .arg(obj)
                .arg(out_flag)
                .args(["msvcrt.lib", "legacy_stdio_definitions.lib"]),
            "link.exe",
        );
    }

    #[cfg(not(any(unix, windows)))]
    compile_error!("Unsupported OS: jam links executables on Unix-likes and Windows only.");
}

/// First C compiler driver found on `PATH`.
#[cfg(unix)]
pub fn find_driver() -> Option<OsString> {
    DRIVERS
        .iter()
        .find_map(|name| which::which(name).ok())
        .map(OsString::from)
}

fn run_linker(command: &mut Command, what: &str) -> Result<()> {
    debug!(command = ?command, "invoking linker");
    let status = command
        .status()
        .with_context(|| format!("failed to start {what}"))?;
    if !status.success() {
        bail!("{what} link failed ({status})");
    }
    info!(linker = what, "linked executable");
    Ok(())
}
