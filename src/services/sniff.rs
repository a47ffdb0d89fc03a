use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{NNError, Result};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Java,
    JavaScript,
    Cpp,
    Plaintext,
}

/// Checked in order against the lower-cased source; first hit wins.
const RULES: &[(Language, &[&str])] = &[
    (Language::Python, &["def ", "import ", "print("]),
    (Language::Java, &["public class", "system.out.println"]),
    (Language::JavaScript, &["function", "console.log"]),
    (Language::Cpp, &["#include", "int main"]),
];

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
            Language::JavaScript => "javascript",
            Language::Cpp => "cpp",
            Language::Plaintext => "plaintext",
        }
    }

    /// Judge0 language id, `None` for languages the service can't run.
    pub fn judge_id(&self) -> Option<u32> {
        match self {
            Language::Python => Some(71),     // Python (3.8.1)
            Language::JavaScript => Some(63), // JavaScript (Node.js 12.14.0)
            Language::Java => Some(62),       // Java (OpenJDK 13.0.1)
            Language::Cpp => Some(54),        // C++ (GCC 9.2.0)
            Language::Plaintext => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = NNError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "python" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "javascript" => Ok(Language::JavaScript),
            "cpp" => Ok(Language::Cpp),
            "plaintext" => Ok(Language::Plaintext),
            _ => Err(NNError::UnsupportedLanguage(s.to_string())),
        }
    }
}

pub fn detect_language(code: &str) -> Language {
    let code = code.to_lowercase();
    RULES
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| code.contains(n)))
        .map(|(lang, _)| *lang)
        .unwrap_or(Language::Plaintext)
}
