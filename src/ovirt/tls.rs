//! Trust anchor loading
//!
//! Reads every `*.pem` / `*.crt` file in a directory, parses the certificates
//! it holds and checks that each one is usable as a root before it reaches
//! the HTTP client.

use crate::error::{Error, Result};
use reqwest::Certificate;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File patterns considered trust anchors
const ANCHOR_PATTERNS: [&str; 2] = ["*.pem", "*.crt"];

/// Certificates loaded from a trust anchor directory
pub struct TrustAnchors {
    certificates: Vec<Certificate>,
    sources: Vec<PathBuf>,
}

impl TrustAnchors {
    /// Load all certificates found in `dir`.
    ///
    /// Fails when the directory is unreadable, a matching file holds no
    /// certificate or a malformed one, or no certificate is found at all.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::Configuration(format!(
                "Trust anchor directory {} does not exist",
                dir.display()
            )));
        }

        let files = anchor_files(dir)?;
        let mut certificates = Vec::new();
        for path in &files {
            let loaded = load_file(path)?;
            debug!("Loaded {} trust anchors from {}", loaded.len(), path.display());
            certificates.extend(loaded);
        }

        let anchors = Self {
            certificates,
            sources: files,
        };
        if anchors.is_empty() {
            return Err(Error::Configuration(format!(
                "No PEM trust anchors found in {}",
                dir.display()
            )));
        }

        info!(
            "Loaded {} trust anchors from {} files in {}",
            anchors.len(),
            anchors.sources.len(),
            dir.display()
        );
        Ok(anchors)
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub fn into_certificates(self) -> Vec<Certificate> {
        self.certificates
    }
}

impl std::fmt::Debug for TrustAnchors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustAnchors")
            .field("certificates", &self.certificates.len())
            .field("sources", &self.sources)
            .finish()
    }
}

/// Matching files in `dir`, sorted
fn anchor_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let base = dir
        .to_str()
        .ok_or_else(|| Error::Configuration(format!("Non UTF-8 path: {}", dir.display())))?;
    let base = glob::Pattern::escape(base.trim_end_matches('/'));

    let mut files = Vec::new();
    for pattern in ANCHOR_PATTERNS {
        let entries = glob::glob(&format!("{}/{}", base, pattern))
            .map_err(|e| Error::Configuration(format!("Bad trust anchor pattern: {}", e)))?;
        for entry in entries {
            let path = entry.map_err(|e| Error::Io(e.into()))?;
            if path.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Parse one PEM file and reject certificates that cannot serve as roots
fn load_file(path: &Path) -> Result<Vec<Certificate>> {
    let mut reader = BufReader::new(std::fs::File::open(path)?);
    let ders = rustls_pemfile::certs(&mut reader).map_err(|e| {
        Error::Tls(format!("Failed to parse PEM in {}: {}", path.display(), e))
    })?;
    if ders.is_empty() {
        return Err(Error::Tls(format!(
            "{} contains no PEM certificate",
            path.display()
        )));
    }

    let mut roots = rustls::RootCertStore::empty();
    let mut certificates = Vec::with_capacity(ders.len());
    for der in ders {
        roots.add(&rustls::Certificate(der.clone())).map_err(|e| {
            Error::Tls(format!("Invalid certificate in {}: {}", path.display(), e))
        })?;
        let cert = Certificate::from_der(&der).map_err(|e| {
            Error::Tls(format!("Invalid certificate in {}: {}", path.display(), e))
        })?;
        certificates.push(cert);
    }
    Ok(certificates)
}
