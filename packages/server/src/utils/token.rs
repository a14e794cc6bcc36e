use rand::Rng;

/// 32 lowercase hex characters from 128 random bits.
pub fn random_hex_token() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}
