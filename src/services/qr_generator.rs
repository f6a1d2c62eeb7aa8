use chrono::NaiveDate;
use qrcode::render::svg;
use qrcode::QrCode;
use serde::{Deserialize, Serialize};

use crate::models::{club::Club, credential::Credential, person::Person};
use crate::services::{signature, status};

#[derive(thiserror::Error, Debug)]
pub enum QrGenerationError {
    #[error("QR code generation failed: {0}")]
    QrCodeError(#[from] qrcode::types::QrError),

    #[error("JSON serialization failed: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("PNG encoding failed: {0}")]
    ImageError(#[from] image::ImageError),
}

/// Contents of the QR code printed on a federation credential card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialCardPayload {
    pub credential_id: String,
    pub card_number: String,
    pub holder: HolderInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub club: Option<String>,
    pub issue_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    pub state: String,
    /// Remaining-time label at the moment the card was rendered
    pub status_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolderInfo {
    pub name: String,
    pub document_number: String,
}

#[derive(Serialize)]
struct SignedPayload<'a> {
    #[serde(flatten)]
    card: &'a CredentialCardPayload,
    signature: &'a str,
}

impl CredentialCardPayload {
    pub fn new(
        credential: &Credential,
        person: &Person,
        club: Option<&Club>,
        today: NaiveDate,
    ) -> Self {
        Self {
            credential_id: credential.id.to_string(),
            card_number: credential.card_number.clone(),
            holder: HolderInfo {
                name: person.full_name(),
                document_number: person.document_number.clone(),
            },
            club: club.map(|c| c.name.clone()),
            issue_date: credential.issue_date,
            expiry_date: credential.expiry_date,
            state: credential.state.as_str().to_string(),
            status_label: status::remaining_label(credential, today),
        }
    }

    fn to_signing_string(&self) -> Result<String, QrGenerationError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Signs the payload and returns the hex signature
    pub fn sign(&self, signing_key: &[u8]) -> Result<String, QrGenerationError> {
        Ok(signature::sign(&self.to_signing_string()?, signing_key))
    }

    /// Checks a signature produced by [`CredentialCardPayload::sign`]
    pub fn verify(&self, sig: &str, signing_key: &[u8]) -> bool {
        self.to_signing_string()
            .map(|s| signature::verify(&s, sig, signing_key))
            .unwrap_or(false)
    }

    fn encode(&self, sig: &str) -> Result<QrCode, QrGenerationError> {
        let json_str = serde_json::to_string(&SignedPayload {
            card: self,
            signature: sig,
        })?;

        Ok(QrCode::new(json_str.as_bytes())?)
    }
}

/// Renders a signed payload as an SVG QR code
pub fn generate_qr_svg(
    payload: &CredentialCardPayload,
    signature: &str,
) -> Result<String, QrGenerationError> {
    let code = payload.encode(signature)?;

    let svg = code.render::<svg::Color>().min_dimensions(200, 200).build();

    Ok(svg)
}

/// Renders a signed payload as a PNG QR code
pub fn generate_qr_png(
    payload: &CredentialCardPayload,
    signature: &str,
) -> Result<Vec<u8>, QrGenerationError> {
    use image::{ImageBuffer, Luma};

    let code = payload.encode(signature)?;

    let module_size = 10u32;
    let width = code.width() as u32;
    let img_size = width * module_size;

    let mut img = ImageBuffer::<Luma<u8>, Vec<u8>>::new(img_size, img_size);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let module_x = (x / module_size) as usize;
        let module_y = (y / module_size) as usize;
        *pixel = match code[(module_x, module_y)] {
            qrcode::types::Color::Dark => Luma([0u8]),
            qrcode::types::Color::Light => Luma([255u8]),
        };
    }

    let mut png_data = Vec::new();
    image::DynamicImage::ImageLuma8(img).write_to(
        &mut std::io::Cursor::new(&mut png_data),
        image::ImageFormat::Png,
    )?;

    Ok(png_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::credential::CredentialState;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_payload() -> CredentialCardPayload {
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let person = Person {
            id: Uuid::new_v4(),
            document_number: "30111222".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Pereyra".to_string(),
            birth_date: None,
            email: None,
            phone: None,
            club_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let credential = Credential {
            id: Uuid::new_v4(),
            person_id: person.id,
            card_number: "FVB-000042".to_string(),
            issue_date: today,
            expiry_date: NaiveDate::from_ymd_opt(2024, 2, 19),
            state: CredentialState::Active,
            suspension_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        CredentialCardPayload::new(&credential, &person, None, today)
    }

    #[test]
    fn test_payload_creation() {
        let payload = sample_payload();

        assert_eq!(payload.holder.name, "Ana Pereyra");
        assert_eq!(payload.state, "ACTIVE");
        assert_eq!(payload.status_label, "1 month");
        assert!(payload.club.is_none());
    }

    #[test]
    fn test_payload_signing() {
        let payload = sample_payload();
        let key = b"test-signing-key";
        let signature = payload.sign(key).unwrap();

        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(payload.verify(&signature, key));

        let mut tampered = payload.clone();
        tampered.card_number = "FVB-999999".to_string();
        assert!(!tampered.verify(&signature, key));
    }

    #[test]
    fn test_qr_svg_generation() {
        let payload = sample_payload();
        let signature = payload.sign(b"test-signing-key").unwrap();
        let svg_str = generate_qr_svg(&payload, &signature).unwrap();

        assert!(svg_str.contains("<svg"));
        assert!(svg_str.contains("</svg>"));
    }

    #[test]
    fn test_qr_png_generation() {
        let payload = sample_payload();
        let signature = payload.sign(b"test-signing-key").unwrap();
        let png = generate_qr_png(&payload, &signature).unwrap();

        assert_eq!(&png[1..4], b"PNG");
    }
}
