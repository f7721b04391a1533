/// Replacement telemetry identifiers.
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

/// 32 bytes from the OS random source, as 64 lowercase hex characters.
pub fn generate_machine_id() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Random UUIDv4 in lowercase hyphenated form.
pub fn generate_device_id() -> String {
    Uuid::new_v4().hyphenated().to_string()
}
