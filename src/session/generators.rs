use async_trait::async_trait;
use rand::Rng;
use std::sync::Mutex;

pub const CODE_LENGTH: usize = 8;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Trait for generating join codes
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    async fn generate(&self) -> String;
}

/// Uniform random 8-character codes over [A-Z0-9]
pub struct RandomCodeGenerator;

impl RandomCodeGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RandomCodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CodeGenerator for RandomCodeGenerator {
    async fn generate(&self) -> String {
        let mut rng = rand::rng();
        (0..CODE_LENGTH)
            .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
            .collect()
    }
}

/// Hands out a fixed sequence of codes, then repeats the last one
pub struct ScriptedCodeGenerator {
    codes: Mutex<Vec<String>>,
}

impl ScriptedCodeGenerator {
    pub fn new(codes: &[&str]) -> Self {
        Self {
            codes: Mutex::new(codes.iter().rev().map(|c| c.to_string()).collect()),
        }
    }
}

#[async_trait]
impl CodeGenerator for ScriptedCodeGenerator {
    async fn generate(&self) -> String {
        let mut codes = self.codes.lock().unwrap_or_else(|p| p.into_inner());
        match codes.len() {
            0 => String::new(),
            1 => codes[0].clone(),
            _ => codes.pop().unwrap_or_default(),
        }
    }
}

/// Uppercases user input; `None` unless it is exactly 8 characters of [A-Z0-9]
pub fn normalize_code(input: &str) -> Option<String> {
    let code = input.trim().to_ascii_uppercase();
    let valid = code.len() == CODE_LENGTH && code.bytes().all(|b| CODE_ALPHABET.contains(&b));
    valid.then_some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_random_code_generator() {
        let generator = RandomCodeGenerator::new();
        for _ in 0..20 {
            let code = generator.generate().await;
            assert_eq!(code.len(), CODE_LENGTH);
            assert_eq!(normalize_code(&code), Some(code.clone()));
        }
    }

    #[tokio::test]
    async fn test_scripted_generator_repeats_last() {
        let generator = ScriptedCodeGenerator::new(&["AAAA1111", "BBBB2222"]);
        assert_eq!(generator.generate().await, "AAAA1111");
        assert_eq!(generator.generate().await, "BBBB2222");
        assert_eq!(generator.generate().await, "BBBB2222");
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(" abcd1234 "), Some("ABCD1234".to_string()));
        assert_eq!(normalize_code("ABCD123"), None);
        assert_eq!(normalize_code("ABCD-234"), None);
        assert_eq!(normalize_code("ÀBCD1234"), None);
    }
}
