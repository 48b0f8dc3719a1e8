// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Inbound transport server: TCP+TLS or UDP envelope acceptor.
//!
//! Analogue of `original_source/node/transport.go`'s `TCPTransport`/
//! `UDPTransport`: a long-lived accept loop (TCP) or datagram loop (UDP)
//! that decodes inbound envelopes and hands them to the router. TLS uses
//! `tokio_rustls`/`rustls`, matching the ecosystem convention seen in
//! `aptos-core/network/netcore`. Client-certificate verification is
//! explicitly disabled: peer authentication happens at the envelope
//! signature layer (§4.1), not at the TLS layer, matching the upstream's
//! own `InsecureSkipVerify` posture.

use std::sync::Arc;

use futures::StreamExt;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::danger::{ClientCertVerified, ClientCertVerifier};
use rustls::{DistinguishedName, ServerConfig, SignatureScheme};
use thiserror::Error;
use tokio::net::{TcpListener, UdpSocket};
use tokio_util::codec::{FramedRead, LengthDelimitedCodec};
use tracing::{error, info, warn};

use crate::router::{RouterHandles, TrustedPeers};
use crate::wire;

/// Transport-layer errors (fatal at startup, per spec.md §7).
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to bind or load TLS material.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to load a PEM certificate or key.
    #[error("invalid TLS material at {path}")]
    Tls {
        /// Path that failed to parse.
        path: String,
    },
}

/// A verifier that accepts any client certificate without validation,
/// because authentication happens at the envelope-signature layer instead.
#[derive(Debug)]
struct AllowAnyClientCert;

impl ClientCertVerifier for AllowAnyClientCert {
    fn root_hint_subjects(&self) -> &[DistinguishedName] {
        &[]
    }

    fn verify_client_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<ClientCertVerified, rustls::Error> {
        Ok(ClientCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ED25519,
        ]
    }
}

fn load_certs(path: &str) -> Result<Vec<CertificateDer<'static>>, TransportError> {
    let bytes = std::fs::read(path)?;
    rustls_pemfile::certs(&mut bytes.as_slice())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| TransportError::Tls {
            path: path.to_string(),
        })
}

fn load_private_key(path: &str) -> Result<PrivateKeyDer<'static>, TransportError> {
    let bytes = std::fs::read(path)?;
    rustls_pemfile::private_key(&mut bytes.as_slice())
        .map_err(|_| TransportError::Tls {
            path: path.to_string(),
        })?
        .ok_or_else(|| TransportError::Tls {
            path: path.to_string(),
        })
}

/// Build the server-side TLS acceptor from `certs/server.pem`/`server.key`.
pub fn server_tls_acceptor(
    cert_path: &str,
    key_path: &str,
) -> Result<tokio_rustls::TlsAcceptor, TransportError> {
    let certs = load_certs(cert_path)?;
    let key = load_private_key(key_path)?;
    let config = ServerConfig::builder()
        .with_client_cert_verifier(Arc::new(AllowAnyClientCert))
        .with_single_cert(certs, key)
        .map_err(|_| TransportError::Tls {
            path: cert_path.to_string(),
        })?;
    Ok(tokio_rustls::TlsAcceptor::from(Arc::new(config)))
}

/// Build the client-side TLS connector from `certs/client.pem`/`client.key`.
///
/// Server certificate verification is also disabled client-side, matching
/// the upstream `tls.Config{InsecureSkipVerify: true}` posture.
pub fn client_tls_connector(
    cert_path: &str,
    key_path: &str,
) -> Result<tokio_rustls::TlsConnector, TransportError> {
    let certs = load_certs(cert_path)?;
    let key = load_private_key(key_path)?;
    let config = ClientConfigBuilder::build(certs, key)?;
    Ok(tokio_rustls::TlsConnector::from(Arc::new(config)))
}

struct ClientConfigBuilder;

impl ClientConfigBuilder {
    fn build(
        certs: Vec<CertificateDer<'static>>,
        key: PrivateKeyDer<'static>,
    ) -> Result<rustls::ClientConfig, TransportError> {
        #[derive(Debug)]
        struct NoServerVerification;

        impl rustls::client::danger::ServerCertVerifier for NoServerVerification {
            fn verify_server_cert(
                &self,
                _end_entity: &CertificateDer<'_>,
                _intermediates: &[CertificateDer<'_>],
                _server_name: &rustls::pki_types::ServerName<'_>,
                _ocsp_response: &[u8],
                _now: rustls::pki_types::UnixTime,
            ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
                Ok(rustls::client::danger::ServerCertVerified::assertion())
            }

            fn verify_tls12_signature(
                &self,
                _message: &[u8],
                _cert: &CertificateDer<'_>,
                _dss: &rustls::DigitallySignedStruct,
            ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
                Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
            }

            fn verify_tls13_signature(
                &self,
                _message: &[u8],
                _cert: &CertificateDer<'_>,
                _dss: &rustls::DigitallySignedStruct,
            ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
                Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
            }

            fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
                vec![
                    SignatureScheme::RSA_PKCS1_SHA256,
                    SignatureScheme::ECDSA_NISTP256_SHA256,
                    SignatureScheme::ECDSA_NISTP384_SHA384,
                    SignatureScheme::ED25519,
                ]
            }
        }

        let builder = rustls::ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoServerVerification));
        builder
            .with_client_auth_cert(certs, key)
            .map_err(|_| TransportError::Tls {
                path: "client cert/key".to_string(),
            })
    }
}

/// Serve inbound TCP+TLS connections forever, routing decoded envelopes.
pub async fn serve_tcp(
    addr: &str,
    acceptor: tokio_rustls::TlsAcceptor,
    handles: RouterHandles,
    trusted: TrustedPeers,
) -> Result<(), TransportError> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr, "TCP+TLS transport listening");
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(v) => v,
            Err(err) => {
                error!(%err, "accept failed");
                continue;
            }
        };
        let acceptor = acceptor.clone();
        let handles = handles.clone();
        let trusted = trusted.clone();
        tokio::spawn(async move {
            let tls_stream = match acceptor.accept(stream).await {
                Ok(s) => s,
                Err(err) => {
                    warn!(%peer, %err, "TLS handshake failed");
                    return;
                }
            };
            serve_tcp_connection(tls_stream, handles, trusted).await;
        });
    }
}

async fn serve_tcp_connection(
    stream: tokio_rustls::server::TlsStream<tokio::net::TcpStream>,
    handles: RouterHandles,
    trusted: TrustedPeers,
) {
    // `wire::encode`'s 4-byte big-endian length prefix is exactly
    // `LengthDelimitedCodec`'s default frame header, so decoding can use the
    // stock codec instead of a hand-rolled read loop.
    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(wire::MAX_ENVELOPE_BYTES)
        .new_codec();
    let mut framed = FramedRead::new(stream, codec);
    while let Some(frame) = framed.next().await {
        let body = match frame {
            Ok(body) => body,
            Err(err) => {
                warn!(%err, "frame read failed, dropping connection");
                return;
            }
        };
        match wire::decode_body(&body) {
            Ok(envelope) => crate::router::verify_and_route(&handles, &trusted, envelope).await,
            Err(err) => warn!(%err, "failed to decode envelope, dropping"),
        }
    }
}

/// Serve inbound UDP datagrams forever, routing decoded envelopes.
pub async fn serve_udp(
    addr: &str,
    handles: RouterHandles,
    trusted: TrustedPeers,
) -> Result<(), TransportError> {
    let socket = UdpSocket::bind(addr).await?;
    info!(addr, "UDP transport listening");
    let mut buf = vec![0u8; wire::MAX_ENVELOPE_BYTES];
    loop {
        let (n, peer) = match socket.recv_from(&mut buf).await {
            Ok(v) => v,
            Err(err) => {
                warn!(%err, "recv failed");
                continue;
            }
        };
        match wire::decode_body(&buf[..n]) {
            Ok(envelope) => crate::router::verify_and_route(&handles, &trusted, envelope).await,
            Err(err) => warn!(%peer, %err, "failed to decode udp datagram, dropping"),
        }
    }
}
