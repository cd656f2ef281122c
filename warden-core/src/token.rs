//! HTTP Basic credentials and generated passwords

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{seq::SliceRandom, Rng};

const BASIC_PREFIX: &str = "Basic ";

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const SPECIAL: &[u8] = b"~=+%^*()[]{}!@#$?|";

/// Build an `Authorization` header value for HTTP Basic authentication
pub fn basic_token(user: &str, password: &str) -> String {
    format!(
        "{}{}",
        BASIC_PREFIX,
        STANDARD.encode(format!("{}:{}", user, password))
    )
}

/// Extract user and password from a Basic `Authorization` header value
pub fn read_basic_token(token: &str) -> Option<(String, String)> {
    let encoded = token.trim().strip_prefix(BASIC_PREFIX)?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

/// Generate a random password of `len` characters.
///
/// With `special_chars`, at least one character is drawn from a set of symbols.
pub fn random_password(len: usize, special_chars: bool) -> String {
    let mut rng = rand::thread_rng();
    let mut pool = ALPHANUMERIC.to_vec();
    if special_chars {
        pool.extend_from_slice(SPECIAL);
    }

    let mut password: Vec<u8> = (0..len)
        .map(|_| pool[rng.gen_range(0..pool.len())])
        .collect();

    if special_chars && len > 0 && !password.iter().any(|c| SPECIAL.contains(c)) {
        let slot = rng.gen_range(0..len);
        password[slot] = SPECIAL[rng.gen_range(0..SPECIAL.len())];
    }
    password.shuffle(&mut rng);

    // every byte comes from an ASCII table
    password.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_token_round_trip() {
        let token = basic_token("ab.cd", "1234");
        assert_eq!(token, "Basic YWIuY2Q6MTIzNA==");
        assert_eq!(
            read_basic_token(&token),
            Some(("ab.cd".to_string(), "1234".to_string()))
        );
    }

    #[test]
    fn test_password_may_contain_colons() {
        let token = basic_token("svc", "pa:ss");
        let (user, password) = read_basic_token(&token).unwrap();
        assert_eq!(user, "svc");
        assert_eq!(password, "pa:ss");
    }

    #[test]
    fn test_read_basic_token_rejects_garbage() {
        assert_eq!(read_basic_token("Bearer abc"), None);
        assert_eq!(read_basic_token("Basic !!!"), None);
        // "nocolon" base64 encoded
        assert_eq!(read_basic_token("Basic bm9jb2xvbg=="), None);
    }

    #[test]
    fn test_random_password() {
        let password = random_password(50, true);
        assert_eq!(password.len(), 50);
        assert!(password.bytes().any(|c| SPECIAL.contains(&c)));

        let plain = random_password(20, false);
        assert_eq!(plain.len(), 20);
        assert!(plain.bytes().all(|c| c.is_ascii_alphanumeric()));

        assert!(random_password(0, true).is_empty());
    }
}
