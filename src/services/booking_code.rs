use rand::Rng;

/// No 0/O, 1/I, so codes survive being read out loud.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// A fresh `XXXX-XXXX` code.
pub fn new_code() -> String {
    let mut rng = rand::thread_rng();
    let mut code = String::with_capacity(9);
    for i in 0..8 {
        if i == 4 {
            code.push('-');
        }
        let idx = rng.gen_range(0..ALPHABET.len());
        code.push(ALPHABET[idx] as char);
    }
    code
}

/// Keeps ASCII letters and digits, upper-cased. Used for every code comparison.
pub fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_code_shape() {
        for _ in 0..50 {
            let code = new_code();
            assert_eq!(code.len(), 9);
            assert_eq!(&code[4..5], "-");
            assert!(code
                .chars()
                .filter(|c| *c != '-')
                .all(|c| ALPHABET.contains(&(c as u8))));
        }
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("ab12-cd34"), "AB12CD34");
        assert_eq!(normalize_code(" AB12–CD34 "), "AB12CD34");
        assert_eq!(normalize_code("--"), "");
    }
}
