use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose,
    IsCa, KeyPair, KeyUsagePurpose, PKCS_RSA_SHA256,
};
use rsa::pkcs8::EncodePrivateKey;
use rsa::RsaPrivateKey;
use rustls::pki_types::PrivatePkcs8KeyDer;

use crate::error::{Error, Result};

const RSA_KEY_BITS: usize = 2048;

/// A freshly generated certificate and private key, PEM-encoded.
pub struct GeneratedIdentity {
    pub cert_pem: String,
    pub key_pem: String,
}

/// Generate an RSA-2048 key pair and a self-signed server certificate.
///
/// The certificate is its own issuer and CA, valid for one year from now,
/// with SANs for localhost and both loopback addresses.
pub fn generate() -> Result<GeneratedIdentity> {
    let key = RsaPrivateKey::new(&mut rand::rngs::OsRng, RSA_KEY_BITS)
        .map_err(|e| Error::KeyGen(e.to_string()))?;
    let key_der = key
        .to_pkcs8_der()
        .map_err(|e| Error::KeyGen(format!("PKCS#8 encoding failed: {e}")))?;
    let key_pair = KeyPair::from_pkcs8_der_and_sign_algo(
        &PrivatePkcs8KeyDer::from(key_der.as_bytes()),
        &PKCS_RSA_SHA256,
    )
    .map_err(|e| Error::KeyGen(e.to_string()))?;

    let mut params = CertificateParams::new(vec![
        "localhost".to_string(),
        "127.0.0.1".to_string(),
        "::1".to_string(),
    ])
    .map_err(|e| Error::CertGen(e.to_string()))?;

    let mut dn = DistinguishedName::new();
    dn.push(DnType::CountryName, "CH");
    dn.push(DnType::OrganizationName, "None");
    dn.push(DnType::OrganizationalUnitName, "None");
    params.distinguished_name = dn;

    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyEncipherment,
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyCertSign,
    ];
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];

    params.not_before = time::OffsetDateTime::now_utc();
    params.not_after = one_year_after(params.not_before);

    let cert = params
        .self_signed(&key_pair)
        .map_err(|e| Error::CertGen(e.to_string()))?;

    Ok(GeneratedIdentity {
        cert_pem: cert.pem(),
        key_pem: key_pair.serialize_pem(),
    })
}

/// Same calendar date one year later; Feb 29 rolls over to Mar 1.
fn one_year_after(t: time::OffsetDateTime) -> time::OffsetDateTime {
    match t.replace_year(t.year() + 1) {
        Ok(next) => next,
        Err(_) => {
            let next_day = t + time::Duration::days(1);
            next_day
                .replace_year(next_day.year() + 1)
                .unwrap_or(next_day)
        }
    }
}
