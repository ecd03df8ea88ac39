use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Columns of leading whitespace per depth level in plain trees.
    pub tree_indent: usize,
    /// `label: value` pairs with a longer value open a section instead.
    pub kv_value_limit: usize,
    pub sign_keywords: SignKeywords,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            tree_indent: 3,
            kv_value_limit: 20,
            sign_keywords: SignKeywords::default(),
        }
    }
}

impl ParseOptions {
    pub fn from_json(text: &str) -> Result<Self> {
        let opts: ParseOptions =
            serde_json::from_str(text).map_err(|e| Error::Options(e.to_string()))?;
        if opts.tree_indent == 0 {
            return Err(Error::Options("tree_indent must be at least 1".to_string()));
        }
        Ok(opts)
    }
}

/// Words that flip the sign of a compare result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignKeywords {
    pub surplus: Vec<String>,
    pub shortage: Vec<String>,
}

impl Default for SignKeywords {
    fn default() -> Self {
        Self {
            surplus: vec!["잉여".to_string()],
            shortage: vec!["부족".to_string()],
        }
    }
}

impl SignKeywords {
    /// Left results read as positive when they carry a `+` or a surplus word.
    pub fn left_positive(&self, result: &str) -> bool {
        result.contains('+') || self.surplus.iter().any(|k| result.contains(k.as_str()))
    }

    /// Right results read as positive unless they carry a `-` or a shortage word.
    pub fn right_positive(&self, result: &str) -> bool {
        !(result.contains('-') || self.shortage.iter().any(|k| result.contains(k.as_str())))
    }
}
