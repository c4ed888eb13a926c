//! Server certificate policy.
//!
//! Core Lightning serves a leaf signed by its own CA, so the CA becomes the
//! only trust root. LND serves the self-signed `tls.cert` itself, which is
//! marked as a CA and therefore cannot pass path validation as an end
//! entity; that certificate is pinned byte for byte instead.

use std::sync::Arc;

use reqwest::{Certificate, ClientBuilder};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, ClientConfig, DigitallySignedStruct, SignatureScheme};

use crate::auth::AuthReport;

/// How the server's certificate is checked.
pub(crate) enum Trust {
    /// Validate the chain up to this CA.
    Authority(Certificate),
    /// Accept exactly this certificate.
    Pinned(CertificateDer<'static>),
}

/// Apply the TLS policy: use `trust` when loaded, otherwise accept any
/// certificate only if `insecure` allows it.
pub(crate) fn configure_tls(
    builder: ClientBuilder,
    trust: Option<Trust>,
    https: bool,
    insecure: bool,
    report: &mut AuthReport,
) -> Result<ClientBuilder, rustls::Error> {
    match trust {
        Some(Trust::Authority(ca)) => Ok(builder
            .add_root_certificate(ca)
            .tls_built_in_root_certs(false)),
        Some(Trust::Pinned(cert)) => Ok(builder.use_preconfigured_tls(pinned_config(cert)?)),
        None if https && insecure => {
            report.mark_insecure();
            Ok(builder.danger_accept_invalid_certs(true))
        }
        None => Ok(builder),
    }
}

/// A CA certificate for chain validation.
pub(crate) fn authority(bytes: Vec<u8>) -> Result<Trust, String> {
    require_pem(&bytes)?;
    Certificate::from_pem(&bytes)
        .map(Trust::Authority)
        .map_err(|e| e.to_string())
}

/// The first certificate of a PEM file, for pinning.
pub(crate) fn pinned(bytes: Vec<u8>) -> Result<Trust, String> {
    require_pem(&bytes)?;
    CertificateDer::from_pem_slice(&bytes)
        .map(Trust::Pinned)
        .map_err(|e| e.to_string())
}

fn require_pem(bytes: &[u8]) -> Result<(), String> {
    if String::from_utf8_lossy(bytes).contains("-----BEGIN CERTIFICATE-----") {
        Ok(())
    } else {
        Err("no PEM certificate found".to_string())
    }
}

fn pinned_config(cert: CertificateDer<'static>) -> Result<ClientConfig, rustls::Error> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let verifier = PinnedCertVerifier {
        pinned: cert,
        provider: Arc::clone(&provider),
    };
    Ok(ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth())
}

/// Accepts a server only if it presents the pinned certificate. Handshake
/// signatures are still checked against that certificate's key.
#[derive(Debug)]
struct PinnedCertVerifier {
    pinned: CertificateDer<'static>,
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for PinnedCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        if end_entity.as_ref() == self.pinned.as_ref() {
            Ok(ServerCertVerified::assertion())
        } else {
            Err(rustls::Error::InvalidCertificate(
                CertificateError::ApplicationVerificationFailure,
            ))
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
