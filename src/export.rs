//! Signed SVG export of the captured scene.
//!
//! The document is plain text: an SVG carrying one polyline per stroke
//! segment, a metadata comment block with the full profile snapshot and
//! the raw sample log serialized as TOML, and optionally a trailing
//! signature comment block. Signatures are Ed25519 over the serialized
//! document bytes, with a SHA-256 content digest recorded alongside.

use chrono::{DateTime, Utc};
use ed25519_dalek::{Signer, SigningKey};
use sha2::{Digest, Sha256};

use serde::Serialize;

use crate::device::DeviceProfile;
use crate::error::{PadError, Result};
use crate::protocol::pen::PenSample;
use crate::stroke::StrokeSegment;

/// The one supported signature algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    #[default]
    Ed25519,
}

#[derive(Default)]
pub struct SigningOptions {
    /// 32-byte Ed25519 secret key. Generated ad hoc when absent.
    pub signing_key: Option<Vec<u8>>,
    /// External certificate or key reference to record instead of the raw
    /// public key.
    pub certificate: Option<String>,
    pub algorithm: SignatureAlgorithm,
}

#[derive(Serialize)]
struct ExportMetadata<'a> {
    captured_at: String,
    profile: &'a DeviceProfile,
    samples: &'a [PenSample],
}

/// Render the unsigned document: header, vector scene, metadata block.
pub fn render_document(
    profile: &DeviceProfile,
    samples: &[PenSample],
    segments: &[StrokeSegment],
    captured_at: DateTime<Utc>,
) -> Result<String> {
    let (w, h) = (profile.display_width, profile.display_height);

    let mut doc = String::new();
    doc.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    doc.push_str(&format!(
        "<!-- sigpad capture {} | {} fw {} serial {} -->\n",
        captured_at.to_rfc3339(),
        profile.name,
        profile.firmware,
        profile.serial
    ));
    doc.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n"
    ));
    doc.push_str(&format!(
        "  <rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n",
        profile.background
    ));
    for segment in segments {
        let points: Vec<String> =
            segment.points.iter().map(|p| format!("{},{}", p.x, p.y)).collect();
        doc.push_str(&format!(
            "  <polyline fill=\"none\" stroke=\"{}\" stroke-width=\"{:.2}\" \
             stroke-linecap=\"round\" stroke-linejoin=\"round\" points=\"{}\"/>\n",
            segment.color,
            segment.width,
            points.join(" ")
        ));
    }
    doc.push_str("</svg>\n");

    let metadata = ExportMetadata {
        captured_at: captured_at.to_rfc3339(),
        profile,
        samples,
    };
    let metadata = toml::to_string(&metadata).map_err(|e| {
        PadError::InvalidParameter(format!("metadata serialization failed: {}", e))
    })?;
    doc.push_str("<!-- sigpad:metadata\n");
    doc.push_str(&metadata);
    doc.push_str("-->\n");

    Ok(doc)
}

/// Render the document and, when requested, append the signature block.
pub fn export(
    profile: &DeviceProfile,
    samples: &[PenSample],
    segments: &[StrokeSegment],
    signing: Option<&SigningOptions>,
) -> Result<String> {
    let mut doc = render_document(profile, samples, segments, Utc::now())?;
    if let Some(options) = signing {
        doc.push_str(&signature_block(doc.as_bytes(), options)?);
    }
    Ok(doc)
}

fn signature_block(body: &[u8], options: &SigningOptions) -> Result<String> {
    let SignatureAlgorithm::Ed25519 = options.algorithm;

    let key = match &options.signing_key {
        Some(bytes) => {
            let bytes: &[u8; 32] = bytes.as_slice().try_into().map_err(|_| {
                PadError::SigningError(format!(
                    "ed25519 signing key must be 32 bytes, got {}",
                    bytes.len()
                ))
            })?;
            SigningKey::from_bytes(bytes)
        }
        None => {
            log::debug!("No signing key supplied, generating an ad hoc one");
            SigningKey::generate(&mut rand::rngs::OsRng)
        }
    };

    let signature = key.sign(body);
    let digest = Sha256::digest(body);

    let mut block = String::from("<!-- sigpad:signature\n");
    block.push_str("algorithm = \"ed25519\"\n");
    block.push_str(&format!("digest_sha256 = \"{}\"\n", hex::encode(digest)));
    match &options.certificate {
        Some(reference) => block.push_str(&format!("certificate = \"{}\"\n", reference)),
        None => block.push_str(&format!(
            "public_key = \"{}\"\n",
            hex::encode(key.verifying_key().to_bytes())
        )),
    }
    block.push_str(&format!("signature = \"{}\"\n", hex::encode(signature.to_bytes())));
    block.push_str("-->\n");
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::pen::tests::profile;
    use crate::protocol::pen::StatusLayout;
    use crate::stroke::Point;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    fn scene() -> (Vec<PenSample>, Vec<StrokeSegment>) {
        let samples = vec![PenSample {
            proximity: true,
            contact: true,
            pressure_raw: 512,
            pressure: 0.5,
            x: 5000,
            y: 2500,
            px: 200,
            py: 100,
            timestamp: Some(10),
            seq: Some(1),
        }];
        let segments = vec![StrokeSegment {
            points: vec![Point { x: 200, y: 100 }, Point { x: 201, y: 101 }],
            width: 2.0,
            color: crate::device::Rgb::BLACK,
        }];
        (samples, segments)
    }

    #[test]
    fn test_unsigned_document_structure() {
        let p = profile(StatusLayout::Timing);
        let (samples, segments) = scene();
        let doc = export(&p, &samples, &segments, None).unwrap();
        assert!(doc.starts_with("<?xml"));
        assert_eq!(doc.matches("<polyline").count(), 1);
        assert!(doc.contains("points=\"200,100 201,101\""));
        assert!(doc.contains("sigpad:metadata"));
        assert!(doc.contains("serial = \"A004\""));
        assert!(!doc.contains("sigpad:signature"));
    }

    #[test]
    fn test_signature_verifies() {
        let p = profile(StatusLayout::Timing);
        let (samples, segments) = scene();
        let options = SigningOptions {
            signing_key: Some(vec![7u8; 32]),
            ..Default::default()
        };
        let doc = export(&p, &samples, &segments, Some(&options)).unwrap();

        let (body, block) = doc.split_at(doc.find("<!-- sigpad:signature").unwrap());
        let field = |name: &str| -> Vec<u8> {
            let line = block.lines().find(|l| l.starts_with(name)).unwrap();
            hex::decode(line.split('"').nth(1).unwrap()).unwrap()
        };

        let key = VerifyingKey::from_bytes(&field("public_key").try_into().unwrap()).unwrap();
        let signature = Signature::from_bytes(&field("signature").try_into().unwrap());
        key.verify(body.as_bytes(), &signature).unwrap();
        assert_eq!(field("digest_sha256"), Sha256::digest(body.as_bytes()).to_vec());
    }

    #[test]
    fn test_invalid_key_is_signing_error() {
        let p = profile(StatusLayout::Timing);
        let (samples, segments) = scene();
        let options = SigningOptions {
            signing_key: Some(vec![1, 2, 3]),
            ..Default::default()
        };
        assert!(matches!(
            export(&p, &samples, &segments, Some(&options)),
            Err(PadError::SigningError(_))
        ));
    }

    #[test]
    fn test_certificate_reference_recorded() {
        let p = profile(StatusLayout::Timing);
        let (samples, segments) = scene();
        let options = SigningOptions {
            signing_key: Some(vec![9u8; 32]),
            certificate: Some("corp-ca/pads/0042".into()),
            ..Default::default()
        };
        let doc = export(&p, &samples, &segments, Some(&options)).unwrap();
        assert!(doc.contains("certificate = \"corp-ca/pads/0042\""));
        assert!(!doc.contains("public_key"));
    }
}
