use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use eyre::{eyre, Result};
use log::warn;
use sha2::Sha256;

const PBKDF2_SHA256: &str = "pbkdf2:sha256";
const PBKDF2_DEFAULT_ITERATIONS: u32 = 600_000;

/// Argon2id hash in PHC string form.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| eyre!("Failed to hash password: {}", err))?;
    Ok(hash.to_string())
}

/// Checks against an Argon2 PHC string or a werkzeug
/// `pbkdf2:sha256[:<iterations>]$<salt>$<hex>` hash. An unreadable hash
/// never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    if hash.starts_with(PBKDF2_SHA256) {
        return verify_pbkdf2(password, hash).unwrap_or_else(|| {
            warn!("Unreadable pbkdf2 password hash");
            false
        });
    }
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            warn!("Unreadable password hash: {}", err);
            false
        }
    }
}

/// Whether a matching hash should be replaced by a fresh Argon2 one.
pub fn needs_rehash(hash: &str) -> bool {
    !hash.starts_with("$argon2")
}

fn verify_pbkdf2(password: &str, hash: &str) -> Option<bool> {
    let mut parts = hash.splitn(3, '$');
    let method = parts.next()?;
    let salt = parts.next()?;
    let expected = hex::decode(parts.next()?).ok()?;

    let iterations = match method.strip_prefix(PBKDF2_SHA256)? {
        "" => PBKDF2_DEFAULT_ITERATIONS,
        rest => rest.strip_prefix(':')?.parse().ok()?,
    };
    if iterations == 0 || expected.is_empty() {
        return None;
    }

    let mut actual = vec![0u8; expected.len()];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut actual);
    Some(
        actual
            .iter()
            .zip(&expected)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0,
    )
}
