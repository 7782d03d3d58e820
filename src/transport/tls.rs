//! # TLS Transport Layer
//!
//! Client-side TLS establishment for connections to MHUX servers.
//!
//! Verification is on by default using the platform's root certificates,
//! with two opt-outs for development and private deployments:
//! - a trusted CA file, for servers with self-signed or private-CA
//!   certificates
//! - insecure mode, which skips verification entirely and may be combined
//!   with SHA-256 certificate pinning
//!
//! ## Responsibilities
//! - Build a `rustls` client configuration from the options above
//! - Establish the TCP + TLS connection handed to the framed session

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use rustls::{Certificate, ClientConfig, RootCertStore, ServerName};
use rustls_pemfile::certs;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, instrument, warn};

use crate::error::{ProtocolError, Result};

/// TLS Client Configuration
pub struct TlsClientConfig {
    server_name: String,
    /// Optional PEM file of additional trusted root certificates
    ca_file: Option<String>,
    insecure: bool,
    /// Optional certificate hash to pin (SHA-256 fingerprint)
    pinned_cert_hash: Option<Vec<u8>>,
}

impl TlsClientConfig {
    /// Create a new TLS client configuration
    pub fn new<S: Into<String>>(server_name: S) -> Self {
        Self {
            server_name: server_name.into(),
            ca_file: None,
            insecure: false,
            pinned_cert_hash: None,
        }
    }

    /// Trust the certificates in a PEM file in addition to the platform
    /// root store
    pub fn with_ca_file<S: Into<String>>(mut self, path: S) -> Self {
        self.ca_file = Some(path.into());
        self
    }

    /// Allow insecure connections (skip certificate verification)
    ///
    /// # WARNING: Security Risk
    /// This mode disables certificate verification entirely and should ONLY
    /// be used for development and testing, or on internal networks with
    /// certificate pinning enabled via `with_pinned_cert_hash()`.
    pub fn insecure(mut self) -> Self {
        warn!("INSECURE MODE ENABLED: Certificate verification is disabled. This should only be used for development/testing.");
        self.insecure = true;
        self
    }

    /// Pin a certificate by its SHA-256 hash/fingerprint
    ///
    /// Only servers presenting the exact certificate matching this hash are
    /// accepted. Can be combined with insecure mode for deployments that
    /// skip standard CA verification but still verify a specific cert.
    pub fn with_pinned_cert_hash(mut self, hash: Vec<u8>) -> Self {
        if hash.len() != 32 {
            warn!(
                "Certificate hash has unexpected length: {} (expected 32 bytes for SHA-256)",
                hash.len()
            );
        }
        self.pinned_cert_hash = Some(hash);
        self
    }

    /// Calculate SHA-256 hash for a certificate to use with pinning
    pub fn calculate_cert_hash(cert: &Certificate) -> Vec<u8> {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(&cert.0);
        hasher.finalize().to_vec()
    }

    /// Load the TLS client configuration
    pub fn load_client_config(&self) -> Result<ClientConfig> {
        if !self.insecure {
            // SECURE MODE: platform roots, plus any configured CA file
            let mut root_store = RootCertStore::empty();
            let native_certs = rustls_native_certs::load_native_certs()
                .map_err(|e| ProtocolError::Tls(format!("Failed to load native certs: {e}")))?;

            for cert in native_certs {
                root_store.add(&Certificate(cert.0)).map_err(|e| {
                    ProtocolError::Tls(format!("Failed to add cert to root store: {e}"))
                })?;
            }

            if let Some(ca_path) = &self.ca_file {
                let ca_cert_file = File::open(ca_path)
                    .map_err(|e| ProtocolError::Tls(format!("Failed to open CA file: {e}")))?;
                let mut ca_reader = BufReader::new(ca_cert_file);
                let ca_certs = certs(&mut ca_reader)
                    .map_err(|_| ProtocolError::Tls("Failed to parse CA file".into()))?;

                if ca_certs.is_empty() {
                    return Err(ProtocolError::Tls(format!(
                        "No certificates found in CA file {ca_path}"
                    )));
                }

                for cert in ca_certs {
                    root_store.add(&Certificate(cert)).map_err(|e| {
                        ProtocolError::Tls(format!("Failed to add CA cert: {e}"))
                    })?;
                }
                debug!(path = %ca_path, "Added trusted CA certificates");
            }

            Ok(ClientConfig::builder()
                .with_safe_defaults()
                .with_root_certificates(root_store)
                .with_no_client_auth())
        } else {
            // INSECURE MODE: custom certificate verifier (pinning or accept any)
            let builder = ClientConfig::builder().with_safe_defaults();

            let custom_builder = if let Some(hash) = &self.pinned_cert_hash {
                // Certificate pinning
                struct CertificateFingerprint {
                    fingerprint: Vec<u8>,
                }

                impl rustls::client::ServerCertVerifier for CertificateFingerprint {
                    fn verify_server_cert(
                        &self,
                        end_entity: &Certificate,
                        _intermediates: &[Certificate],
                        _server_name: &ServerName,
                        _scts: &mut dyn Iterator<Item = &[u8]>,
                        _ocsp_response: &[u8],
                        _now: std::time::SystemTime,
                    ) -> std::result::Result<rustls::client::ServerCertVerified, rustls::Error>
                    {
                        let hash = TlsClientConfig::calculate_cert_hash(end_entity);
                        if hash.as_slice() == self.fingerprint.as_slice() {
                            Ok(rustls::client::ServerCertVerified::assertion())
                        } else {
                            Err(rustls::Error::General(
                                "Pinned certificate hash mismatch".into(),
                            ))
                        }
                    }
                }

                let verifier = Arc::new(CertificateFingerprint {
                    fingerprint: hash.clone(),
                });

                builder.with_custom_certificate_verifier(verifier)
            } else {
                // Accept any server certificate
                struct AcceptAnyServerCert;

                impl rustls::client::ServerCertVerifier for AcceptAnyServerCert {
                    fn verify_server_cert(
                        &self,
                        _end_entity: &Certificate,
                        _intermediates: &[Certificate],
                        _server_name: &ServerName,
                        _scts: &mut dyn Iterator<Item = &[u8]>,
                        _ocsp_response: &[u8],
                        _now: std::time::SystemTime,
                    ) -> std::result::Result<rustls::client::ServerCertVerified, rustls::Error>
                    {
                        Ok(rustls::client::ServerCertVerified::assertion())
                    }
                }

                builder.with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert))
            };

            Ok(custom_builder.with_no_client_auth())
        }
    }

    /// Get the server name as a rustls::ServerName
    pub fn server_name(&self) -> Result<ServerName> {
        ServerName::try_from(self.server_name.as_str())
            .map_err(|_| ProtocolError::Tls("Invalid server name".into()))
    }
}

/// Connect to a TLS server
#[instrument(skip(config), fields(address = %addr))]
pub async fn connect(addr: &str, config: &TlsClientConfig) -> Result<TlsStream<TcpStream>> {
    let tls_config = Arc::new(config.load_client_config()?);
    let connector = TlsConnector::from(tls_config);

    let stream = TcpStream::connect(addr).await?;
    let domain = config.server_name()?;

    let tls_stream = connector
        .connect(domain, stream)
        .await
        .map_err(|e| ProtocolError::Tls(format!("TLS connection failed: {e}")))?;

    debug!("TLS connection established");
    Ok(tls_stream)
}
