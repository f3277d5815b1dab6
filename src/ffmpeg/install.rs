use crate::config::{EncoderConfig, InstallConfig};
use anyhow::{Context, Result};
use std::process::{Command, Stdio};

/// Check if the encoder can be run (`<encoder> -version` succeeds)
pub fn is_available(binary: &str) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Make sure the encoder is present, installing it through the package manager if not
pub fn ensure_encoder(encoder: &EncoderConfig, install: &InstallConfig) -> Result<()> {
    if is_available(&encoder.binary) {
        tracing::debug!("{} found", encoder.binary);
        return Ok(());
    }

    println!(
        "📦 {} not found, installing via {}...",
        encoder.binary, install.package_manager
    );

    install_package(install).with_context(|| {
        format!(
            "Failed to install {}. Please install it manually:\n   {}",
            install.package,
            manual_install_hint(&install.package)
        )
    })
}

/// Run `<package_manager> install <package>` with output streamed to the console
fn install_package(install: &InstallConfig) -> Result<()> {
    tracing::debug!(
        "running {} install {}",
        install.package_manager,
        install.package
    );

    let status = Command::new(&install.package_manager)
        .arg("install")
        .arg(&install.package)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("Failed to execute {}", install.package_manager))?;

    if !status.success() {
        anyhow::bail!("{} install exited with {}", install.package_manager, status);
    }

    Ok(())
}

/// Platform-specific install command shown when automatic install fails
pub fn manual_install_hint(package: &str) -> String {
    if cfg!(target_os = "macos") {
        format!("brew install {}", package)
    } else if cfg!(target_os = "windows") {
        format!("choco install {}", package)
    } else if cfg!(target_os = "linux") {
        format!("sudo apt-get install {}", package)
    } else {
        "Install FFmpeg from https://ffmpeg.org/download.html".to_string()
    }
}
