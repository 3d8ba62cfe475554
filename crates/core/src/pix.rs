//! Pix "copia e cola" payloads (BR Code, EMV QRCPS-MPM).
//!
//! The payload is a sequence of `ID(2) LEN(2) VALUE` fields ending with a
//! CRC16-CCITT (poly `0x1021`, init `0xFFFF`) over everything before it,
//! including the `6304` header of the CRC field itself.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::round_money;

const PIX_GUI: &str = "br.gov.bcb.pix";
const MAX_KEY_LENGTH: usize = 77;
const MAX_MERCHANT_NAME_LENGTH: usize = 25;
const MAX_MERCHANT_CITY_LENGTH: usize = 15;
const MAX_TXID_LENGTH: usize = 25;
const MAX_AMOUNT_LENGTH: usize = 13;

/// Errors building a Pix payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PixError {
    #[error("pix key cannot be empty")]
    EmptyKey,
    #[error("pix key must be at most {MAX_KEY_LENGTH} characters")]
    KeyTooLong,
    #[error("merchant name cannot be empty")]
    EmptyMerchantName,
    #[error("merchant city cannot be empty")]
    EmptyMerchantCity,
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("amount {0} is too large for a pix payload")]
    AmountTooLarge(Decimal),
    #[error("txid must be 1-{MAX_TXID_LENGTH} ASCII letters or digits")]
    InvalidTxid,
}

/// A Pix charge to encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixCharge {
    pub key: String,
    pub merchant_name: String,
    pub merchant_city: String,
    pub amount: Decimal,
    /// Transaction reference; `***` is used when absent.
    pub txid: Option<String>,
}

impl PixCharge {
    /// Render the BR Code payload.
    ///
    /// Merchant name and city are reduced to printable ASCII and truncated to
    /// the 25/15 character limits of the format.
    ///
    /// # Errors
    ///
    /// Returns [`PixError`] for empty or oversized fields, a non-positive
    /// amount, or a malformed txid.
    pub fn payload(&self) -> Result<String, PixError> {
        let key = self.key.trim();
        if key.is_empty() {
            return Err(PixError::EmptyKey);
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(PixError::KeyTooLong);
        }

        let name = sanitize(&self.merchant_name, MAX_MERCHANT_NAME_LENGTH);
        if name.is_empty() {
            return Err(PixError::EmptyMerchantName);
        }
        let city = sanitize(&self.merchant_city, MAX_MERCHANT_CITY_LENGTH);
        if city.is_empty() {
            return Err(PixError::EmptyMerchantCity);
        }

        let amount = round_money(self.amount);
        if amount <= Decimal::ZERO {
            return Err(PixError::NonPositiveAmount);
        }
        let amount_str = format!("{amount:.2}");
        if amount_str.len() > MAX_AMOUNT_LENGTH {
            return Err(PixError::AmountTooLarge(amount));
        }

        let txid = match self.txid.as_deref() {
            None => "***",
            Some(txid)
                if !txid.is_empty()
                    && txid.len() <= MAX_TXID_LENGTH
                    && txid.chars().all(|c| c.is_ascii_alphanumeric()) =>
            {
                txid
            }
            Some(_) => return Err(PixError::InvalidTxid),
        };

        let account = field("00", PIX_GUI) + &field("01", key);

        let mut payload = String::with_capacity(160);
        payload.push_str(&field("00", "01"));
        payload.push_str(&field("26", &account));
        payload.push_str(&field("52", "0000"));
        payload.push_str(&field("53", "986"));
        payload.push_str(&field("54", &amount_str));
        payload.push_str(&field("58", "BR"));
        payload.push_str(&field("59", &name));
        payload.push_str(&field("60", &city));
        payload.push_str(&field("62", &field("05", txid)));
        payload.push_str("6304");

        let crc = crc16_ccitt(payload.as_bytes());
        payload.push_str(&format!("{crc:04X}"));
        Ok(payload)
    }
}

/// Encode one `ID LEN VALUE` field. Values are ASCII and at most 99 bytes.
fn field(id: &str, value: &str) -> String {
    format!("{id}{:02}{value}", value.len())
}

fn sanitize(value: &str, max: usize) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(fold_accent)
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(max)
        .collect();
    cleaned.trim_end().to_string()
}

const fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        other => other,
    }
}

/// CRC16-CCITT-FALSE.
#[must_use]
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 == 0 {
                crc << 1
            } else {
                (crc << 1) ^ 0x1021
            };
        }
    }
    crc
}

/// Request body of `POST /api/cart/pix-qr`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixQrRequest {
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total: Decimal,
}

/// Response body of `POST /api/cart/pix-qr`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixQrResponse {
    /// The "copia e cola" payload.
    pub qr_code: String,
    /// Image URL rendering `qr_code`.
    pub qr_code_url: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,
    pub merchant_name: String,
    pub pix_key: String,
}
